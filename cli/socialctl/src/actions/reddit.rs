//! Reddit user actions.

use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

use crate::client::ApiClient;
use crate::envelope::{check_embedded_errors, normalize, Envelope, ThreadPart};
use crate::error::CliError;
use crate::invocation::{CommandInvocation, Flag};
use crate::output::Output;
use crate::record::{truncate, DomainRecord};
use crate::request::{encode_segment, RequestSpec};

use super::{fetch, fetch_one, unknown_command, CommandSpec};

const POST_KIND: &str = "t3";
const COMMENT_KIND: &str = "t1";

const BROWSE_LIMIT: u32 = 25;
const SEARCH_LIMIT: u32 = 25;
const THREAD_DEPTH: u32 = 3;
const THREAD_LIMIT: u32 = 50;
const SHOWN_COMMENTS: usize = 10;

const TITLE_WIDTH: usize = 70;
const SEARCH_TITLE_WIDTH: usize = 60;
const URL_WIDTH: usize = 50;
const COMMENT_WIDTH: usize = 200;
const INBOX_WIDTH: usize = 100;

const BROWSE_FLAGS: &[Flag] = &[Flag::value("sort"), Flag::value("limit")];
const POST_FLAGS: &[Flag] = &[Flag::value("title"), Flag::value("text"), Flag::value("url")];
const SEARCH_FLAGS: &[Flag] = &[
    Flag::value("subreddit"),
    Flag::value("sort"),
    Flag::value("time"),
    Flag::value("limit"),
];
const INBOX_FLAGS: &[Flag] = &[Flag::toggle("unread")];

pub const CATALOG: &[CommandSpec] = &[
    CommandSpec::new("browse", "[subreddit] [--sort hot|new|top] [--limit N]", "Browse a subreddit", BROWSE_FLAGS),
    CommandSpec::new("read", "<post_id_or_url>", "Read a post and its top comments", &[]),
    CommandSpec::new("post", "<subreddit> --title T [--text B | --url U]", "Submit a post", POST_FLAGS),
    CommandSpec::new("comment", "<post_id> <text>", "Comment on a post", &[]),
    CommandSpec::new("reply", "<comment_id> <text>", "Reply to a comment", &[]),
    CommandSpec::new("upvote", "<id>", "Upvote a post or comment", &[]),
    CommandSpec::new("downvote", "<id>", "Downvote a post or comment", &[]),
    CommandSpec::new("unvote", "<id>", "Clear your vote", &[]),
    CommandSpec::new(
        "search",
        "<query> [--subreddit X] [--sort relevance|top] [--time hour|day|week|month|year|all] [--limit N]",
        "Search posts",
        SEARCH_FLAGS,
    ),
    CommandSpec::new("inbox", "[--unread]", "Show your inbox", INBOX_FLAGS),
    CommandSpec::new("me", "", "Show your account", &[]),
    CommandSpec::new("user", "<username>", "Show a user", &[]),
];

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
    Clear,
}

impl Vote {
    fn dir(self) -> &'static str {
        match self {
            Self::Up => "1",
            Self::Down => "-1",
            Self::Clear => "0",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Up => "Upvoted",
            Self::Down => "Downvoted",
            Self::Clear => "Unvoted",
        }
    }
}

/// What a submission links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Link(String),
    SelfText(Option<String>),
}

/// A Reddit action with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Browse {
        subreddit: String,
        sort: String,
        limit: u32,
    },
    Read {
        post_id: String,
    },
    Post {
        subreddit: String,
        title: String,
        submission: Submission,
    },
    Comment {
        thing_id: String,
        text: String,
    },
    Vote {
        thing_id: String,
        vote: Vote,
    },
    Search {
        query: String,
        subreddit: Option<String>,
        sort: String,
        time: String,
        limit: u32,
    },
    Inbox {
        unread: bool,
    },
    Me,
    User {
        username: String,
    },
}

impl Action {
    pub fn from_invocation(inv: &CommandInvocation) -> Result<Self, CliError> {
        let vote = |vote: Vote| -> Result<Self, CliError> {
            Ok(Self::Vote {
                thing_id: inv.require(0, "id")?.to_string(),
                vote,
            })
        };

        let action = match inv.command.as_str() {
            "browse" => Self::Browse {
                subreddit: subreddit_name(inv.positional(0).unwrap_or("all")),
                sort: inv.flag("sort").unwrap_or("hot").to_string(),
                limit: inv.flag_or("limit", BROWSE_LIMIT)?,
            },
            "read" => Self::Read {
                post_id: post_id(inv.require(0, "post_id_or_url")?),
            },
            "post" => {
                let subreddit = subreddit_name(inv.require(0, "subreddit")?);
                let title = inv.flag("title").ok_or_else(|| CliError::MissingArgument {
                    command: inv.command.clone(),
                    argument: "--title",
                })?;
                let submission = match inv.flag("url") {
                    Some(url) => Submission::Link(url.to_string()),
                    None => Submission::SelfText(inv.flag("text").map(String::from)),
                };
                Self::Post {
                    subreddit,
                    title: title.to_string(),
                    submission,
                }
            }
            "comment" => Self::Comment {
                thing_id: inv.require(0, "post_id")?.to_string(),
                text: inv.require_text(1, "text")?,
            },
            "reply" => Self::Comment {
                thing_id: inv.require(0, "comment_id")?.to_string(),
                text: inv.require_text(1, "text")?,
            },
            "upvote" => vote(Vote::Up)?,
            "downvote" => vote(Vote::Down)?,
            "unvote" => vote(Vote::Clear)?,
            "search" => Self::Search {
                query: inv.require_text(0, "query")?,
                subreddit: inv.flag("subreddit").map(subreddit_name),
                sort: inv.flag("sort").unwrap_or("relevance").to_string(),
                time: inv.flag("time").unwrap_or("all").to_string(),
                limit: inv.flag_or("limit", SEARCH_LIMIT)?,
            },
            "inbox" => Self::Inbox {
                unread: inv.has_flag("unread"),
            },
            "me" => Self::Me,
            "user" => Self::User {
                username: inv.require(0, "username")?.trim_start_matches("u/").to_string(),
            },
            other => return Err(unknown_command(other)),
        };
        Ok(action)
    }
}

/// Run a Reddit action.
pub async fn run(action: Action, client: &ApiClient) -> Result<Output, CliError> {
    match action {
        Action::Browse {
            subreddit,
            sort,
            limit,
        } => {
            let posts = fetch(
                client,
                RequestSpec::get(format!(
                    "/r/{}/{}",
                    encode_segment(&subreddit),
                    encode_segment(&sort)
                ))
                .query("limit", limit),
                Envelope::Listing { kind: None },
            )
            .await?;
            Ok(Output::listing(format!("r/{subreddit} - {sort}"), posts.collect(), render_post))
        }
        Action::Read { post_id } => {
            let raw = client
                .execute(
                    RequestSpec::get(format!("/comments/{}", encode_segment(&post_id)))
                        .query("depth", THREAD_DEPTH)
                        .query("limit", THREAD_LIMIT),
                )
                .await?
                .into_json();

            let root = Envelope::Thread {
                part: ThreadPart::Root,
                kind: Some(POST_KIND),
            };
            let replies = Envelope::Thread {
                part: ThreadPart::Replies,
                kind: Some(COMMENT_KIND),
            };
            let post = normalize(client.platform(), root, raw.clone())?
                .next()
                .ok_or_else(|| CliError::malformed(client.platform(), "comment tree", "no post in thread"))?;
            let comments: Vec<_> = normalize(client.platform(), replies, raw)?
                .take(SHOWN_COMMENTS)
                .collect();

            Ok(thread_output(post, comments))
        }
        Action::Post {
            subreddit,
            title,
            submission,
        } => {
            let mut form = vec![
                ("sr", subreddit),
                ("title", title),
                ("api_type", "json".to_string()),
            ];
            match submission {
                Submission::Link(url) => {
                    form.push(("kind", "link".to_string()));
                    form.push(("url", url));
                }
                Submission::SelfText(text) => {
                    form.push(("kind", "self".to_string()));
                    form.extend(text.map(|text| ("text", text)));
                }
            }

            let response = client.execute(RequestSpec::post("/api/submit").form(form)).await?;
            let result = check_embedded_errors(client.platform(), response)?;
            let url = result
                .pointer("/json/data/url")
                .and_then(Value::as_str)
                .unwrap_or("Check your profile")
                .to_string();
            Ok(Output::done_with("Posted successfully!", Some(url), None))
        }
        Action::Comment { thing_id, text } => {
            let form = [
                ("thing_id", fullname(&thing_id)),
                ("text", text),
                ("api_type", "json".to_string()),
            ];
            let response = client.execute(RequestSpec::post("/api/comment").form(form)).await?;
            check_embedded_errors(client.platform(), response)?;
            Ok(Output::done("Comment posted!"))
        }
        Action::Vote { thing_id, vote } => {
            let form = [("id", fullname(&thing_id)), ("dir", vote.dir().to_string())];
            client.execute(RequestSpec::post("/api/vote").form(form)).await?;
            Ok(Output::done(format!("{} {thing_id}", vote.verb())))
        }
        Action::Search {
            query,
            subreddit,
            sort,
            time,
            limit,
        } => {
            let spec = match &subreddit {
                Some(subreddit) => {
                    RequestSpec::get(format!("/r/{}/search", encode_segment(subreddit)))
                        .query("restrict_sr", "on")
                }
                None => RequestSpec::get("/search"),
            };
            let spec = spec
                .query("q", &query)
                .query("sort", &sort)
                .query("t", &time)
                .query("limit", limit);

            let posts = fetch(client, spec, Envelope::Listing { kind: None }).await?;
            Ok(Output::listing(format!("Search: \"{query}\""), posts.collect(), render_hit))
        }
        Action::Inbox { unread } => {
            let (path, heading) = if unread {
                ("/message/unread", "Unread")
            } else {
                ("/message/inbox", "Inbox")
            };
            let messages = fetch(client, RequestSpec::get(path), Envelope::Listing { kind: None }).await?;
            Ok(Output::listing(heading, messages.collect(), render_inbox))
        }
        Action::Me => {
            let account = fetch_one(client, RequestSpec::get("/api/v1/me"), false).await?;
            Ok(Output::listing(format!("u/{}", account.text("name")), vec![account], render_self))
        }
        Action::User { username } => {
            let user = fetch_one(
                client,
                RequestSpec::get(format!("/user/{}/about", encode_segment(&username))),
                true,
            )
            .await?;
            Ok(Output::listing(format!("u/{}", user.text("name")), vec![user], render_user))
        }
    }
}

fn subreddit_name(raw: &str) -> String {
    raw.trim_start_matches('/').trim_start_matches("r/").to_string()
}

/// Post id from a bare id or a post URL.
fn post_id(raw: &str) -> String {
    static COMMENTS_PATH: OnceLock<Option<Regex>> = OnceLock::new();

    if !raw.contains("reddit.com") {
        return raw.to_string();
    }
    COMMENTS_PATH
        .get_or_init(|| Regex::new(r"comments/([a-z0-9]+)").ok())
        .as_ref()
        .and_then(|regex| regex.captures(raw))
        .and_then(|captures| captures.get(1))
        .map_or_else(|| raw.to_string(), |id| id.as_str().to_string())
}

/// Fullname (`t3_abc`) for a thing id; bare ids are taken as posts.
fn fullname(id: &str) -> String {
    let bytes = id.as_bytes();
    let typed = bytes.len() > 3 && bytes[0] == b't' && (b'1'..=b'6').contains(&bytes[1]) && bytes[2] == b'_';
    if typed {
        id.to_string()
    } else {
        format!("{POST_KIND}_{id}")
    }
}

fn created(record: &DomainRecord) -> String {
    record
        .f64("created_utc")
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .map_or_else(|| "unknown".to_string(), |at| at.format("%Y-%m-%d").to_string())
}

fn thread_output(post: DomainRecord, comments: Vec<DomainRecord>) -> Output {
    let mut lines = vec![
        format!(
            "   u/{} | {} up | {} comments",
            post.text("author"),
            post.text("score"),
            post.text("num_comments")
        ),
        String::new(),
        post.first_str(&["selftext", "url"]).unwrap_or_default().to_string(),
        String::new(),
        "─".repeat(60),
        "Comments:".to_string(),
        String::new(),
    ];
    for comment in &comments {
        let body = comment.text("body");
        lines.push(format!("[{} up] u/{}:", comment.text("score"), comment.text("author")));
        lines.push(format!("   {}", truncate(&body, COMMENT_WIDTH).replace('\n', "\n   ")));
        lines.push(String::new());
    }

    let heading = post.text("title");
    let mut records = Vec::with_capacity(comments.len() + 1);
    records.push(post);
    records.extend(comments);

    Output::Listing {
        heading,
        records,
        lines,
    }
}

fn render_post(post: &DomainRecord) -> Vec<String> {
    let title = post.text("title");
    let url = post.text("url");
    let link = if url.is_empty() { "self" } else { truncate(&url, URL_WIDTH) };
    vec![
        format!(
            "[{:>5} up {:>4} comments] {}",
            post.text("score"),
            post.text("num_comments"),
            truncate(&title, TITLE_WIDTH)
        ),
        format!("   └─ {} | u/{} | {link}", post.text("id"), post.text("author")),
    ]
}

fn render_hit(post: &DomainRecord) -> Vec<String> {
    let title = post.text("title");
    vec![
        format!("[{:>5} up] {}", post.text("score"), truncate(&title, SEARCH_TITLE_WIDTH)),
        format!(
            "   └─ r/{} | u/{} | {}",
            post.text("subreddit"),
            post.text("author"),
            post.text("id")
        ),
    ]
}

fn render_inbox(message: &DomainRecord) -> Vec<String> {
    let marker = if message.flag("new") { "*" } else { " " };
    let origin = message
        .str("subreddit")
        .map_or_else(|| "DM".to_string(), |subreddit| format!("r/{subreddit}"));
    let body = message.text("body");
    vec![
        format!("{marker} {}", message.text("subject")),
        format!("   From: u/{} | {origin}", message.text("author")),
        format!("   {}...", truncate(&body, INBOX_WIDTH)),
        String::new(),
    ]
}

fn render_user(user: &DomainRecord) -> Vec<String> {
    vec![
        format!(
            "   Karma: {} link | {} comment",
            user.text("link_karma"),
            user.text("comment_karma")
        ),
        format!("   Created: {}", created(user)),
    ]
}

/// The self view adds the account's verification state.
fn render_self(account: &DomainRecord) -> Vec<String> {
    let mut lines = render_user(account);
    lines.push(format!(
        "   Verified: {}",
        if account.flag("verified") { "yes" } else { "no" }
    ));
    lines
}
