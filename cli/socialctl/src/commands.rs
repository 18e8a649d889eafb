//! CLI entry surface.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::actions;
use crate::config::{self, ConfigSource, ProcessEnv};
use crate::dispatch::{self, Dispatch};
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use crate::platform::Platform;

const FORMAT_OPTION: &str = "--format";
const CONFIG_OPTION: &str = "--config";
const END_OF_OPTIONS: &str = "--";

/// socialctl - drive Discord, LinkedIn and Reddit as your own user account.
#[derive(Debug, Parser)]
#[command(name = "socialctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json).
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Path to the credentials document.
    #[arg(long, global = true, env = "SOCIALCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discord, using a user token.
    Discord(PlatformArgs),

    /// LinkedIn, using session cookies.
    Linkedin(PlatformArgs),

    /// Reddit, using an OAuth token or session cookies.
    Reddit(PlatformArgs),

    /// Show CLI version.
    Version,
}

/// Everything after the platform name, passed through unparsed.
#[derive(Debug, Args)]
struct PlatformArgs {
    /// Command name followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

/// Global options written after the command name.
#[derive(Debug, Default, PartialEq, Eq)]
struct TrailingOptions {
    format: Option<String>,
    config: Option<PathBuf>,
}

impl PlatformArgs {
    /// Remove `--format` and `--config` (with their values) from the
    /// command tokens. Tokens after `--` are left alone.
    fn take_global_options(&mut self) -> Result<TrailingOptions, CliError> {
        let mut options = TrailingOptions::default();
        let mut kept = Vec::with_capacity(self.tokens.len());
        let mut tokens = std::mem::take(&mut self.tokens).into_iter();

        while let Some(token) = tokens.next() {
            if token == END_OF_OPTIONS {
                kept.push(token);
                kept.extend(tokens.by_ref());
                break;
            }

            let (name, inline) = match token.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(value.to_string())),
                None => (token.clone(), None),
            };
            if name != FORMAT_OPTION && name != CONFIG_OPTION {
                kept.push(token);
                continue;
            }

            let value = match inline {
                Some(value) => value,
                None => tokens
                    .next()
                    .ok_or_else(|| CliError::invalid(name.as_str(), "", "expected a value"))?,
            };
            if name == FORMAT_OPTION {
                options.format = Some(value);
            } else {
                options.config = Some(PathBuf::from(value));
            }
        }

        self.tokens = kept;
        Ok(options)
    }
}

fn output_format(name: &str) -> OutputFormat {
    match name {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let (platform, mut args) = match self.command {
            Commands::Discord(args) => (Platform::Discord, args),
            Commands::Linkedin(args) => (Platform::LinkedIn, args),
            Commands::Reddit(args) => (Platform::Reddit, args),
            Commands::Version => {
                println!("socialctl {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
        };

        // Options after the command name are captured with the tokens.
        let trailing = args.take_global_options()?;
        let format = output_format(trailing.format.as_deref().unwrap_or(&self.format));

        let path = trailing
            .config
            .or(self.config)
            .or_else(config::default_config_path);
        let source = ConfigSource::load(path.as_deref())?;

        match dispatch::dispatch(platform, &args.tokens, &source, &ProcessEnv).await? {
            Dispatch::Help => output::print_catalog(platform, actions::catalog(platform)),
            Dispatch::Ran(result) => output::print_output(&result, format),
        }
        Ok(())
    }
}
