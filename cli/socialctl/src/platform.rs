//! The three platforms socialctl can act on.

use std::fmt;

/// Desktop Chrome user agent presented to LinkedIn and Reddit.
const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Discord's web client sends a shorter WebKit agent.
const WEBKIT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// A social platform reachable through its private web API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Discord,
    LinkedIn,
    Reddit,
}

impl Platform {
    /// Base URL that relative endpoint paths are joined to.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/api/v10",
            Self::LinkedIn => "https://www.linkedin.com/voyager/api",
            Self::Reddit => "https://oauth.reddit.com",
        }
    }

    pub fn user_agent(self) -> &'static str {
        match self {
            Self::Discord => WEBKIT_USER_AGENT,
            Self::LinkedIn | Self::Reddit => CHROME_USER_AGENT,
        }
    }

    /// Accept header value the web client sends.
    pub fn accept(self) -> &'static str {
        match self {
            Self::LinkedIn => "application/vnd.linkedin.normalized+json+2.1",
            Self::Discord | Self::Reddit => "application/json",
        }
    }

    /// Lowercase name used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::LinkedIn => "linkedin",
            Self::Reddit => "reddit",
        }
    }

    /// How to supply credentials, shown when none could be resolved.
    pub fn remediation(self) -> &'static str {
        match self {
            Self::Discord => {
                "Add `token: `...`` under \"### Discord (User)\" in TOOLS.md or set DISCORD_USER_TOKEN."
            }
            Self::LinkedIn => {
                "Add li_at and JSESSIONID to TOOLS.md or set LINKEDIN_LI_AT (and LINKEDIN_JSESSIONID)."
            }
            Self::Reddit => {
                "Add access_token or reddit_session to TOOLS.md (token_v2 is optional) or set REDDIT_ACCESS_TOKEN or REDDIT_SESSION."
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discord => "Discord",
            Self::LinkedIn => "LinkedIn",
            Self::Reddit => "Reddit",
        };
        f.write_str(name)
    }
}
