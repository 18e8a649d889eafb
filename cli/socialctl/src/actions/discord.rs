//! Discord user actions.

use chrono::{DateTime, Local};
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::error::CliError;
use crate::invocation::{CommandInvocation, Flag};
use crate::output::Output;
use crate::record::{truncate, DomainRecord};
use crate::request::{encode_segment, RequestSpec};

use super::{fetch, fetch_one, group_by_parent, unknown_command, ChannelGroup, CommandSpec};

/// Discord snowflakes count milliseconds from 2015-01-01.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

const CATEGORY_CHANNEL: i64 = 4;
const TEXT_CHANNEL: i64 = 0;
const VOICE_CHANNEL: i64 = 2;

const READ_LIMIT: u32 = 50;
const SEARCH_LIMIT: u32 = 25;
const MESSAGE_WIDTH: usize = 200;
const SEARCH_HIT_WIDTH: usize = 150;

const INVITE_PREFIXES: [&str; 4] = [
    "https://discord.gg/",
    "discord.gg/",
    "https://discord.com/invite/",
    "discord.com/invite/",
];

const LIMIT: &[Flag] = &[Flag::value("limit")];

pub const CATALOG: &[CommandSpec] = &[
    CommandSpec::new("servers", "", "List your servers", &[]),
    CommandSpec::new("channels", "<server_id>", "List channels in a server", &[]),
    CommandSpec::new("read", "<channel_id> [--limit N]", "Read recent messages", LIMIT),
    CommandSpec::new("send", "<channel_id> <message>", "Send a message", &[]),
    CommandSpec::new("reply", "<channel_id> <msg_id> <text>", "Reply to a message", &[]),
    CommandSpec::new("react", "<channel_id> <msg_id> <emoji>", "React to a message", &[]),
    CommandSpec::new("dm", "<user_id> <message>", "Send a direct message", &[]),
    CommandSpec::new("join", "<invite_code>", "Join a server", &[]),
    CommandSpec::new("search", "<server_id> <query> [--limit N]", "Search messages", LIMIT),
    CommandSpec::new("user", "<user_id>", "Get user info", &[]),
    CommandSpec::new("me", "", "Get your info", &[]),
];

/// A Discord action with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Servers,
    Channels {
        server_id: String,
    },
    Read {
        channel_id: String,
        limit: u32,
    },
    Send {
        channel_id: String,
        content: String,
        reply_to: Option<String>,
    },
    React {
        channel_id: String,
        message_id: String,
        emoji: String,
    },
    Dm {
        user_id: String,
        content: String,
    },
    Join {
        invite: String,
    },
    Search {
        server_id: String,
        query: String,
        limit: u32,
    },
    User {
        user_id: String,
    },
    Me,
}

impl Action {
    pub fn from_invocation(inv: &CommandInvocation) -> Result<Self, CliError> {
        let action = match inv.command.as_str() {
            "servers" => Self::Servers,
            "channels" => Self::Channels {
                server_id: inv.require(0, "server_id")?.to_string(),
            },
            "read" => Self::Read {
                channel_id: inv.require(0, "channel_id")?.to_string(),
                limit: inv.flag_or("limit", READ_LIMIT)?,
            },
            "send" => Self::Send {
                channel_id: inv.require(0, "channel_id")?.to_string(),
                content: inv.require_text(1, "message")?,
                reply_to: None,
            },
            "reply" => Self::Send {
                channel_id: inv.require(0, "channel_id")?.to_string(),
                reply_to: Some(inv.require(1, "msg_id")?.to_string()),
                content: inv.require_text(2, "text")?,
            },
            "react" => Self::React {
                channel_id: inv.require(0, "channel_id")?.to_string(),
                message_id: inv.require(1, "msg_id")?.to_string(),
                emoji: inv.require(2, "emoji")?.to_string(),
            },
            "dm" => Self::Dm {
                user_id: inv.require(0, "user_id")?.to_string(),
                content: inv.require_text(1, "message")?,
            },
            "join" => Self::Join {
                invite: invite_code(inv.require(0, "invite_code")?),
            },
            "search" => Self::Search {
                server_id: inv.require(0, "server_id")?.to_string(),
                query: inv.require_text(1, "query")?,
                limit: inv.flag_or("limit", SEARCH_LIMIT)?,
            },
            "user" => Self::User {
                user_id: inv.require(0, "user_id")?.to_string(),
            },
            "me" => Self::Me,
            other => return Err(unknown_command(other)),
        };
        Ok(action)
    }
}

/// Run a Discord action.
pub async fn run(action: Action, client: &ApiClient) -> Result<Output, CliError> {
    match action {
        Action::Servers => {
            let guilds = fetch(client, RequestSpec::get("/users/@me/guilds"), Envelope::Array).await?;
            Ok(Output::listing("Your Servers", guilds.collect(), render_guild))
        }
        Action::Channels { server_id } => {
            let channels = fetch(
                client,
                RequestSpec::get(format!("/guilds/{}/channels", encode_segment(&server_id))),
                Envelope::Array,
            )
            .await?;
            let groups = group_by_parent(
                channels.collect(),
                |channel| channel.i64("type") == Some(CATEGORY_CHANNEL),
                "parent_id",
            );
            Ok(channel_listing(groups))
        }
        Action::Read { channel_id, limit } => {
            let messages = fetch(
                client,
                RequestSpec::get(format!("/channels/{}/messages", encode_segment(&channel_id)))
                    .query("limit", limit),
                Envelope::Array,
            )
            .await?;
            // The API returns newest first.
            Ok(Output::listing("Messages", messages.rev().collect(), render_message))
        }
        Action::Send {
            channel_id,
            content,
            reply_to,
        } => {
            let message = send(client, &channel_id, &content, reply_to.as_deref()).await?;
            let id = message.text("id");
            Ok(Output::done_with(format!("Sent message: {id}"), None, Some(message)))
        }
        Action::React {
            channel_id,
            message_id,
            emoji,
        } => {
            let path = format!(
                "/channels/{}/messages/{}/reactions/{}/@me",
                encode_segment(&channel_id),
                encode_segment(&message_id),
                encode_segment(&emoji)
            );
            client.execute(RequestSpec::put(path)).await?;
            Ok(Output::done(format!("Reacted with {emoji}")))
        }
        Action::Dm { user_id, content } => {
            let channel = fetch_one(
                client,
                RequestSpec::post("/users/@me/channels").json(json!({ "recipient_id": user_id })),
                false,
            )
            .await?;
            let channel_id = channel
                .id()
                .ok_or_else(|| CliError::malformed(client.platform(), "DM channel", "no channel id"))?;

            let message = send(client, channel_id, &content, None).await?;
            let id = message.text("id");
            Ok(Output::done_with(format!("Sent DM: {id}"), None, Some(message)))
        }
        Action::Join { invite } => {
            let response = client
                .execute(RequestSpec::post(format!("/invites/{}", encode_segment(&invite))))
                .await?
                .into_json();
            let guild = response
                .get("guild")
                .and_then(|guild| guild.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            Ok(Output::done_with(
                format!("Joined server: {guild}"),
                None,
                DomainRecord::from_value(response),
            ))
        }
        Action::Search {
            server_id,
            query,
            limit,
        } => {
            let hits = fetch(
                client,
                RequestSpec::get(format!("/guilds/{}/messages/search", encode_segment(&server_id)))
                    .query("content", &query)
                    .query("limit", limit),
                Envelope::SearchHits,
            )
            .await?;
            Ok(Output::listing(format!("Search: \"{query}\""), hits.collect(), render_hit))
        }
        Action::User { user_id } => {
            let user = fetch_one(
                client,
                RequestSpec::get(format!("/users/{}", encode_segment(&user_id))),
                false,
            )
            .await?;
            Ok(Output::listing(user_heading(&user), vec![user], render_user))
        }
        Action::Me => {
            let user = fetch_one(client, RequestSpec::get("/users/@me"), false).await?;
            Ok(Output::listing(user_heading(&user), vec![user], render_self))
        }
    }
}

/// Post `content` into a channel, optionally as a reply.
async fn send(
    client: &ApiClient,
    channel_id: &str,
    content: &str,
    reply_to: Option<&str>,
) -> Result<DomainRecord, CliError> {
    let mut body = json!({ "content": content });
    if let Some(message_id) = reply_to {
        body["message_reference"] = json!({ "message_id": message_id });
    }

    fetch_one(
        client,
        RequestSpec::post(format!("/channels/{}/messages", encode_segment(channel_id))).json(body),
        false,
    )
    .await
}

fn invite_code(raw: &str) -> String {
    let code = INVITE_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    code.trim_end_matches('/').to_string()
}

/// Account creation time encoded in a snowflake id.
fn snowflake_date(id: &str) -> Option<String> {
    let snowflake: u64 = id.parse().ok()?;
    let millis = i64::try_from((snowflake >> 22) + DISCORD_EPOCH_MS).ok()?;
    DateTime::from_timestamp_millis(millis).map(|at| at.format("%Y-%m-%d").to_string())
}

fn local_time(timestamp: &str, pattern: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|at| at.with_timezone(&Local).format(pattern).to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

fn user_heading(user: &DomainRecord) -> String {
    match user.str("discriminator") {
        Some(tag) if tag != "0" => format!("{}#{tag}", user.text("username")),
        _ => user.text("username"),
    }
}

fn channel_listing(groups: Vec<ChannelGroup>) -> Output {
    let mut lines = Vec::new();
    let mut records = Vec::new();

    for group in groups {
        if let Some(category) = &group.category {
            lines.push(String::new());
            lines.push(format!("[{}]", category.text("name")));
        }
        for channel in &group.channels {
            let icon = match channel.i64("type") {
                Some(TEXT_CHANNEL) => "#",
                Some(VOICE_CHANNEL) => "~",
                _ => "*",
            };
            lines.push(format!("   {icon} {} ({})", channel.text("name"), channel.text("id")));
        }

        let record = json!({
            "id": group.parent_id,
            "category": group.category,
            "channels": group.channels,
        });
        records.extend(DomainRecord::from_value(record));
    }

    Output::Listing {
        heading: "Channels".to_string(),
        records,
        lines,
    }
}

fn render_guild(guild: &DomainRecord) -> Vec<String> {
    let owner = if guild.flag("owner") { " | Owner" } else { "" };
    vec![
        guild.text("name"),
        format!("   ID: {}{owner}", guild.text("id")),
    ]
}

fn render_message(message: &DomainRecord) -> Vec<String> {
    let time = local_time(&message.text("timestamp"), "%H:%M:%S");
    let content = message.text("content");
    let mut lines = vec![format!(
        "[{time}] {}: {}",
        message.text("author.username"),
        truncate(&content, MESSAGE_WIDTH)
    )];
    let attachments = message.len_of("attachments");
    if attachments > 0 {
        lines.push(format!("   {attachments} attachment(s)"));
    }
    lines
}

fn render_hit(hit: &DomainRecord) -> Vec<String> {
    let date = local_time(&hit.text("timestamp"), "%Y-%m-%d");
    let content = hit.text("content");
    vec![
        format!("[{date}] #{} | {}:", hit.text("channel_id"), hit.text("author.username")),
        format!("   {}", truncate(&content, SEARCH_HIT_WIDTH)),
        format!("   ID: {}", hit.text("id")),
        String::new(),
    ]
}

fn render_user(user: &DomainRecord) -> Vec<String> {
    let id = user.text("id");
    vec![
        format!("   ID: {id}"),
        format!("   Bot: {}", if user.flag("bot") { "yes" } else { "no" }),
        format!(
            "   Created: {}",
            snowflake_date(&id).unwrap_or_else(|| "unknown".to_string())
        ),
    ]
}

/// The self view also exposes account-private fields.
fn render_self(user: &DomainRecord) -> Vec<String> {
    vec![
        format!("   ID: {}", user.text("id")),
        format!("   Email: {}", user.str("email").unwrap_or("N/A")),
        format!("   Verified: {}", if user.flag("verified") { "yes" } else { "no" }),
    ]
}
