//! Command dispatch.
//!
//! A call flows: catalog lookup, grammar parse, action build, credential
//! resolution, client build, action run. Credentials are only touched once
//! the command and its arguments are known to be valid, so help and usage
//! errors never require a configured account.

use tracing::debug;

use crate::actions::{self, discord, linkedin, reddit};
use crate::client::ApiClient;
use crate::config::{ConfigSource, Env};
use crate::credentials;
use crate::error::CliError;
use crate::invocation::CommandInvocation;
use crate::output::Output;
use crate::platform::Platform;

/// What a dispatch produced.
#[derive(Debug)]
pub enum Dispatch {
    /// No command, or one the catalog does not list.
    Help,
    Ran(Output),
}

/// A parsed, validated action for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformAction {
    Discord(discord::Action),
    LinkedIn(linkedin::Action),
    Reddit(reddit::Action),
}

impl PlatformAction {
    /// Build the action named by `tokens`. `None` means help.
    pub fn parse(platform: Platform, tokens: &[String]) -> Result<Option<Self>, CliError> {
        let Some(spec) = tokens.first().and_then(|name| actions::find(platform, name)) else {
            return Ok(None);
        };
        let invocation = CommandInvocation::parse(tokens, spec.flags)?;

        let action = match platform {
            Platform::Discord => Self::Discord(discord::Action::from_invocation(&invocation)?),
            Platform::LinkedIn => Self::LinkedIn(linkedin::Action::from_invocation(&invocation)?),
            Platform::Reddit => Self::Reddit(reddit::Action::from_invocation(&invocation)?),
        };
        Ok(Some(action))
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::Discord(_) => Platform::Discord,
            Self::LinkedIn(_) => Platform::LinkedIn,
            Self::Reddit(_) => Platform::Reddit,
        }
    }

    /// Run against `client`, which must be bound to the same platform.
    pub async fn run(self, client: &ApiClient) -> Result<Output, CliError> {
        match self {
            Self::Discord(action) => discord::run(action, client).await,
            Self::LinkedIn(action) => linkedin::run(action, client).await,
            Self::Reddit(action) => reddit::run(action, client).await,
        }
    }
}

/// Dispatch one command line (command name first) for `platform`.
pub async fn dispatch(
    platform: Platform,
    tokens: &[String],
    config: &ConfigSource,
    env: &dyn Env,
) -> Result<Dispatch, CliError> {
    let Some(action) = PlatformAction::parse(platform, tokens)? else {
        debug!(%platform, command = tokens.first().map(String::as_str), "No runnable command");
        return Ok(Dispatch::Help);
    };

    let credentials = credentials::resolve(platform, config, env)?;
    let client = ApiClient::new(&credentials)?;
    action.run(&client).await.map(Dispatch::Ran)
}
