//! Per-platform user actions.
//!
//! Each platform module exposes a command catalog, an `Action` enum built
//! from a [`CommandInvocation`], and a `run` function that issues the calls,
//! normalizes the responses and returns an [`Output`].

pub mod discord;
pub mod linkedin;
pub mod reddit;

use tabled::Tabled;

use crate::client::ApiClient;
use crate::envelope::{self, Envelope, Records};
use crate::error::CliError;
use crate::invocation::Flag;
use crate::platform::Platform;
use crate::record::DomainRecord;
use crate::request::RequestSpec;

/// One entry in a platform's command catalog.
#[derive(Debug, Clone, Copy, Tabled)]
pub struct CommandSpec {
    #[tabled(rename = "Command")]
    pub name: &'static str,

    #[tabled(rename = "Arguments")]
    pub args: &'static str,

    #[tabled(rename = "Description")]
    pub summary: &'static str,

    #[tabled(skip)]
    pub flags: &'static [Flag],
}

impl CommandSpec {
    pub const fn new(
        name: &'static str,
        args: &'static str,
        summary: &'static str,
        flags: &'static [Flag],
    ) -> Self {
        Self {
            name,
            args,
            summary,
            flags,
        }
    }
}

/// Command catalog for `platform`.
pub fn catalog(platform: Platform) -> &'static [CommandSpec] {
    match platform {
        Platform::Discord => discord::CATALOG,
        Platform::LinkedIn => linkedin::CATALOG,
        Platform::Reddit => reddit::CATALOG,
    }
}

/// Look a command up by name.
pub fn find(platform: Platform, name: &str) -> Option<&'static CommandSpec> {
    catalog(platform).iter().find(|spec| spec.name == name)
}

/// Error for a name that parsed but has no action behind it.
fn unknown_command(name: &str) -> CliError {
    CliError::invalid("command", name, "not a known command")
}

/// Issue `spec` and unwrap the response with `envelope`.
pub(crate) async fn fetch(
    client: &ApiClient,
    spec: RequestSpec,
    envelope: Envelope,
) -> Result<Records, CliError> {
    let raw = client.execute(spec).await?.into_json();
    envelope::normalize(client.platform(), envelope, raw)
}

/// Issue `spec` and return the single object it yields.
pub(crate) async fn fetch_one(
    client: &ApiClient,
    spec: RequestSpec,
    wrapped: bool,
) -> Result<DomainRecord, CliError> {
    fetch(client, spec, Envelope::Object { wrapped })
        .await?
        .next()
        .ok_or_else(|| CliError::malformed(client.platform(), "single object", "no record"))
}

/// Children sharing one parent, headed by the parent when it was listed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    /// Parent reference; empty for entries without a parent.
    pub parent_id: String,
    pub category: Option<DomainRecord>,
    pub channels: Vec<DomainRecord>,
}

impl ChannelGroup {
    fn new(parent_id: impl Into<String>, category: Option<DomainRecord>) -> Self {
        Self {
            parent_id: parent_id.into(),
            category,
            channels: Vec::new(),
        }
    }
}

/// Build category → children buckets from a flat list.
///
/// The parentless bucket comes first, then one bucket per category in
/// listing order (kept even when empty), then buckets for parent ids that
/// were not listed as categories.
pub fn group_by_parent<F>(entries: Vec<DomainRecord>, is_category: F, parent_field: &str) -> Vec<ChannelGroup>
where
    F: Fn(&DomainRecord) -> bool,
{
    let (categories, children): (Vec<_>, Vec<_>) = entries.into_iter().partition(|entry| is_category(entry));

    let mut groups = vec![ChannelGroup::new("", None)];
    for category in categories {
        let id = category.id().unwrap_or_default().to_string();
        groups.push(ChannelGroup::new(id, Some(category)));
    }

    for child in children {
        let parent = child.str(parent_field).unwrap_or_default().to_string();
        match groups.iter_mut().find(|group| group.parent_id == parent) {
            Some(group) => group.channels.push(child),
            None => {
                let mut group = ChannelGroup::new(parent, None);
                group.channels.push(child);
                groups.push(group);
            }
        }
    }

    groups
}
