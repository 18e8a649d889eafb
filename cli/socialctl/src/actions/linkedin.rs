//! LinkedIn member actions over the Voyager API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::error::CliError;
use crate::invocation::{CommandInvocation, Flag};
use crate::output::Output;
use crate::record::{truncate, DomainRecord};
use crate::request::{encode_segment, RequestSpec};

use super::{fetch, fetch_one, unknown_command, CommandSpec};

const FEED_UPDATE: &str = "com.linkedin.voyager.feed.render.UpdateV2";
const SEARCH_PROFILE: &str = "com.linkedin.voyager.search.SearchProfile";

/// Where an update's text can live; reshares carry it one level down.
const UPDATE_TEXT: &[&str] = &[
    "commentary.text.text",
    "resharedUpdate.commentary.text.text",
];

const PROFILE_PREFIXES: [&str; 4] = [
    "https://www.linkedin.com/in/",
    "https://linkedin.com/in/",
    "www.linkedin.com/in/",
    "linkedin.com/in/",
];

const FEED_LIMIT: u32 = 20;
const SEARCH_LIMIT: u32 = 25;
const UPDATE_WIDTH: usize = 150;
const PREVIEW_WIDTH: usize = 50;

const LIMIT: &[Flag] = &[Flag::value("limit")];

pub const CATALOG: &[CommandSpec] = &[
    CommandSpec::new("me", "", "View your profile", &[]),
    CommandSpec::new("profile", "<username_or_url>", "View someone's profile", &[]),
    CommandSpec::new("feed", "[--limit N]", "View your feed", LIMIT),
    CommandSpec::new("post", "<text>", "Post an update", &[]),
    CommandSpec::new("comment", "<post_urn> <text>", "Comment on a post", &[]),
    CommandSpec::new("like", "<post_urn>", "Like a post", &[]),
    CommandSpec::new("search", "<query> [--limit N]", "Search people", LIMIT),
    CommandSpec::new("connect", "<profile_id> [message]", "Send a connection request", &[]),
    CommandSpec::new("message", "<profile_id> <text>", "Send a message", &[]),
];

/// A LinkedIn action with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Me,
    Profile { username: String },
    Feed { limit: u32 },
    Post { text: String },
    Comment { post_urn: String, text: String },
    Like { post_urn: String },
    Search { query: String, limit: u32 },
    Connect { profile_id: String, message: Option<String> },
    Message { profile_id: String, text: String },
}

impl Action {
    pub fn from_invocation(inv: &CommandInvocation) -> Result<Self, CliError> {
        let action = match inv.command.as_str() {
            "me" => Self::Me,
            "profile" => Self::Profile {
                username: profile_slug(inv.require(0, "username_or_url")?),
            },
            "feed" => Self::Feed {
                limit: inv.flag_or("limit", FEED_LIMIT)?,
            },
            "post" => Self::Post {
                text: inv.require_text(0, "text")?,
            },
            "comment" => Self::Comment {
                post_urn: inv.require(0, "post_urn")?.to_string(),
                text: inv.require_text(1, "text")?,
            },
            "like" => Self::Like {
                post_urn: inv.require(0, "post_urn")?.to_string(),
            },
            "search" => Self::Search {
                query: inv.require_text(0, "query")?,
                limit: inv.flag_or("limit", SEARCH_LIMIT)?,
            },
            "connect" => Self::Connect {
                profile_id: inv.require(0, "profile_id")?.to_string(),
                message: inv.text_from(1),
            },
            "message" => Self::Message {
                profile_id: inv.require(0, "profile_id")?.to_string(),
                text: inv.require_text(1, "text")?,
            },
            other => return Err(unknown_command(other)),
        };
        Ok(action)
    }
}

/// Run a LinkedIn action.
pub async fn run(action: Action, client: &ApiClient) -> Result<Output, CliError> {
    match action {
        Action::Me => {
            let profile = fetch_one(client, RequestSpec::get("/me"), true).await?;
            Ok(Output::listing(full_name(&profile), vec![profile], render_profile))
        }
        Action::Profile { username } => {
            let profile = fetch_one(
                client,
                RequestSpec::get(format!("/identity/profiles/{}", encode_segment(&username))),
                true,
            )
            .await?;
            Ok(Output::listing(full_name(&profile), vec![profile], render_profile))
        }
        Action::Feed { limit } => {
            let updates = fetch(
                client,
                RequestSpec::get("/feed/updatesV2")
                    .query("count", limit)
                    .query("q", "relevance")
                    .query("sortBy", "RELEVANCE"),
                Envelope::Tagged {
                    type_tag: FEED_UPDATE,
                    text: UPDATE_TEXT,
                },
            )
            .await?;
            Ok(Output::listing("Your Feed", updates.collect(), render_update))
        }
        Action::Post { text } => {
            let response = client
                .execute(
                    RequestSpec::post("/shares").json(json!({
                        "commentary": text,
                        "visibility": "ANYONE",
                    })),
                )
                .await?
                .into_json();
            let detail = response
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or("Check your profile")
                .to_string();
            Ok(Output::done_with(
                "Posted successfully!",
                Some(detail),
                DomainRecord::from_value(response),
            ))
        }
        Action::Comment { post_urn, text } => {
            client
                .execute(RequestSpec::post("/socialActions/comments").json(json!({
                    "threadUrn": post_urn,
                    "message": { "text": text },
                })))
                .await?;
            Ok(Output::done("Comment posted!"))
        }
        Action::Like { post_urn } => {
            client
                .execute(RequestSpec::post(format!(
                    "/socialActions/{}/like",
                    encode_segment(&post_urn)
                )))
                .await?;
            Ok(Output::done("Liked!"))
        }
        Action::Search { query, limit } => {
            let people = fetch(
                client,
                RequestSpec::get("/search/blended")
                    .query("keywords", &query)
                    .query("count", limit)
                    .query("start", 0),
                Envelope::Tagged {
                    type_tag: SEARCH_PROFILE,
                    text: &[],
                },
            )
            .await?;
            Ok(Output::listing(format!("Search: \"{query}\""), people.collect(), render_person))
        }
        Action::Connect {
            profile_id,
            message,
        } => {
            let mut body = json!({
                "trackingId": tracking_id(),
                "inviteeProfileId": profile_id,
            });
            if let Some(message) = message {
                body["message"] = Value::String(message);
            }
            client
                .execute(RequestSpec::post("/relationships/invitations").json(body))
                .await?;
            Ok(Output::done("Connection request sent!"))
        }
        // TODO: create the conversation through /messaging/conversations once
        // the event payload for member-to-member threads is pinned down.
        Action::Message { profile_id, text } => Ok(Output::notice(format!(
            "Messaging requires a conversation lookup; use LinkedIn directly for now. Would message {profile_id}: {}...",
            truncate(&text, PREVIEW_WIDTH)
        ))),
    }
}

/// Reduce a profile URL to its public identifier.
fn profile_slug(raw: &str) -> String {
    let slug = PROFILE_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    slug.trim_end_matches('/').to_string()
}

/// Invitation tracking id: the current epoch milliseconds, base64 encoded.
fn tracking_id() -> String {
    STANDARD.encode(Utc::now().timestamp_millis().to_string())
}

fn full_name(profile: &DomainRecord) -> String {
    format!("{} {}", profile.text("firstName"), profile.text("lastName"))
        .trim()
        .to_string()
}

fn render_profile(profile: &DomainRecord) -> Vec<String> {
    let mut lines = vec![
        format!("   Headline: {}", profile.str("headline").unwrap_or("N/A")),
        format!("   Location: {}", profile.str("geoLocationName").unwrap_or("N/A")),
        format!(
            "   ID: {}",
            profile
                .first_str(&["entityUrn", "publicIdentifier"])
                .unwrap_or("unknown")
        ),
    ];
    if let Some(public_id) = profile.str("publicIdentifier") {
        lines.push(format!("   linkedin.com/in/{public_id}"));
    }
    lines
}

fn render_update(update: &DomainRecord) -> Vec<String> {
    let text = update.first_str(UPDATE_TEXT).unwrap_or_default();
    let cut = truncate(text, UPDATE_WIDTH);
    let ellipsis = if cut.len() < text.len() { "..." } else { "" };
    vec![
        update.str("actor.name.text").unwrap_or("Unknown").to_string(),
        format!("   {cut}{ellipsis}"),
        format!(
            "   URN: {}",
            update.first_str(&["socialDetail.urn", "urn"]).unwrap_or_default()
        ),
        String::new(),
    ]
}

fn render_person(person: &DomainRecord) -> Vec<String> {
    vec![
        person.str("title.text").unwrap_or("Unknown").to_string(),
        format!("   {}", person.text("headline.text")),
        format!("   {}", person.text("subline.text")),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(line: &str, flags: &[Flag]) -> CommandInvocation {
        let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
        CommandInvocation::parse(&tokens, flags).unwrap()
    }

    #[test]
    fn profile_urls_reduce_to_slugs() {
        assert_eq!(profile_slug("https://www.linkedin.com/in/ada-lovelace/"), "ada-lovelace");
        assert_eq!(profile_slug("linkedin.com/in/grace"), "grace");
        assert_eq!(profile_slug("alan"), "alan");
    }

    #[test]
    fn connect_message_is_optional() {
        let bare = Action::from_invocation(&invocation("connect ACoAA", &[])).unwrap();
        assert_eq!(
            bare,
            Action::Connect {
                profile_id: "ACoAA".to_string(),
                message: None,
            }
        );

        let with_note = Action::from_invocation(&invocation("connect ACoAA great meeting you", &[])).unwrap();
        assert_eq!(
            with_note,
            Action::Connect {
                profile_id: "ACoAA".to_string(),
                message: Some("great meeting you".to_string()),
            }
        );
    }

    #[test]
    fn search_query_spans_words() {
        let action = Action::from_invocation(&invocation("search rust --limit 3 engineer", LIMIT)).unwrap();
        assert_eq!(
            action,
            Action::Search {
                query: "rust engineer".to_string(),
                limit: 3,
            }
        );
    }

    #[test]
    fn tracking_id_is_base64_of_a_timestamp() {
        let decoded = STANDARD.decode(tracking_id()).unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert!(text.parse::<i64>().is_ok());
    }

    #[test]
    fn reshared_text_is_used_when_top_level_is_absent() {
        let update = DomainRecord::from_value(json!({
            "actor": { "name": { "text": "Ada" } },
            "resharedUpdate": { "commentary": { "text": { "text": "worth reading" } } },
            "urn": "urn:li:activity:1"
        }))
        .unwrap();

        let lines = render_update(&update);
        assert_eq!(lines[0], "Ada");
        assert_eq!(lines[1], "   worth reading");
        assert_eq!(lines[2], "   URN: urn:li:activity:1");
    }
}
