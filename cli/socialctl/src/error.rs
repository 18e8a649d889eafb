//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

use crate::platform::Platform;

/// Longest slice of a response body echoed back to the terminal.
const BODY_SNIPPET_CHARS: usize = 200;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No {platform} credentials found.")]
    MissingCredentials { platform: Platform },

    #[error("{platform} API error {status}: {}", snippet(body))]
    Api {
        platform: Platform,
        status: u16,
        body: String,
    },

    #[error("{platform} returned a payload that is not a {expected}: {detail}")]
    MalformedResponse {
        platform: Platform,
        expected: &'static str,
        detail: String,
    },

    #[error("Missing <{argument}> for `{command}`")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidArgument {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error from response details.
    pub fn api(platform: Platform, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            platform,
            status,
            body: body.into(),
        }
    }

    pub fn malformed(platform: Platform, expected: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            platform,
            expected,
            detail: detail.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::MissingCredentials { platform } => {
                eprintln!("\n{}", format!("Hint: {}", platform.remediation()).yellow());
            }
            CliError::Api {
                platform, status, ..
            } if *status == 401 => {
                eprintln!(
                    "\n{}",
                    format!("Hint: Your {platform} session may have expired. Refresh the stored credentials.")
                        .yellow()
                );
            }
            CliError::Api { status, .. } if *status == 403 => {
                eprintln!(
                    "\n{}",
                    "Hint: The account may not have permission for this operation.".yellow()
                );
            }
            CliError::MissingArgument { command, .. } => {
                eprintln!(
                    "\n{}",
                    format!("Hint: Run the platform without a command to list usage for `{command}`.")
                        .yellow()
                );
            }
            CliError::Network(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check your network connection.".yellow()
                );
            }
            _ => {}
        }
    }
}
