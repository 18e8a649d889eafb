//! Output formatting for CLI commands.

use colored::Colorize;
use serde_json::{json, Value};
use tabled::settings::Style;
use tabled::Table;

use crate::actions::CommandSpec;
use crate::platform::Platform;
use crate::record::DomainRecord;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Normalized records as JSON.
    Json,
}

/// Result of one action, ready to be projected.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Records plus their text projection.
    Listing {
        heading: String,
        records: Vec<DomainRecord>,
        lines: Vec<String>,
    },
    /// A write went through.
    Done {
        message: String,
        detail: Option<String>,
        record: Option<DomainRecord>,
    },
    /// Informational result with no network effect.
    Notice { message: String },
}

impl Output {
    /// Build a listing, rendering each record with `render`.
    pub fn listing<F>(heading: impl Into<String>, records: Vec<DomainRecord>, render: F) -> Self
    where
        F: Fn(&DomainRecord) -> Vec<String>,
    {
        let lines = records.iter().flat_map(|record| render(record)).collect();
        Self::Listing {
            heading: heading.into(),
            records,
            lines,
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::Done {
            message: message.into(),
            detail: None,
            record: None,
        }
    }

    pub fn done_with(message: impl Into<String>, detail: Option<String>, record: Option<DomainRecord>) -> Self {
        Self::Done {
            message: message.into(),
            detail,
            record,
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }

    /// Records carried by this output.
    pub fn records(&self) -> &[DomainRecord] {
        match self {
            Self::Listing { records, .. } => records,
            Self::Done {
                record: Some(record),
                ..
            } => std::slice::from_ref(record),
            Self::Done { record: None, .. } | Self::Notice { .. } => &[],
        }
    }
}

/// Print an action result in the requested format.
pub fn print_output(output: &Output, format: OutputFormat) {
    match format {
        OutputFormat::Text => print_text(output),
        OutputFormat::Json => println!("{}", format_json(&json_value(output))),
    }
}

fn print_text(output: &Output) {
    match output {
        Output::Listing {
            heading,
            records,
            lines,
        } => {
            println!("\n{}\n", heading.bold());
            if records.is_empty() {
                println!("{}", "No items found.".dimmed());
            }
            for line in lines {
                println!("{line}");
            }
        }
        Output::Done { message, detail, .. } => {
            print_success(message);
            if let Some(detail) = detail {
                println!("   {detail}");
            }
        }
        Output::Notice { message } => print_info(message),
    }
}

/// JSON projection of an output.
pub fn json_value(output: &Output) -> Value {
    match output {
        Output::Listing { records, .. } => json!(records),
        Output::Done {
            message,
            detail,
            record,
        } => json!({
            "ok": true,
            "message": message,
            "detail": detail,
            "record": record,
        }),
        Output::Notice { message } => json!({ "ok": true, "notice": message }),
    }
}

fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Print the command catalog for a platform.
pub fn print_catalog(platform: Platform, catalog: &[CommandSpec]) {
    println!(
        "{}\n",
        format!("{platform} as your own user account").bold()
    );
    let mut table = Table::new(catalog);
    table.with(Style::blank());
    println!("{table}");
    println!(
        "\n{}",
        format!(
            "Usage: socialctl {} <command> [args...]   (`--` ends flag parsing)",
            platform.slug()
        )
        .dimmed()
    );
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> DomainRecord {
        DomainRecord::from_value(value).unwrap()
    }

    #[test]
    fn listing_renders_every_record() {
        let output = Output::listing(
            "Servers",
            vec![record(json!({ "id": "1", "name": "a" })), record(json!({ "id": "2", "name": "b" }))],
            |r| vec![r.text("name"), format!("   ID: {}", r.text("id"))],
        );

        match &output {
            Output::Listing { lines, .. } => {
                assert_eq!(lines, &vec!["a", "   ID: 1", "b", "   ID: 2"]);
            }
            other => panic!("unexpected output: {other:?}"),
        }
        assert_eq!(output.records().len(), 2);
    }

    #[test]
    fn json_listing_is_the_record_array() {
        let output = Output::listing("x", vec![record(json!({ "id": "1" }))], |_| Vec::new());
        assert_eq!(json_value(&output), json!([{ "id": "1" }]));
    }

    #[test]
    fn json_done_carries_message_and_record() {
        let output = Output::done_with("Sent message: 9", None, Some(record(json!({ "id": "9" }))));
        assert_eq!(
            json_value(&output),
            json!({ "ok": true, "message": "Sent message: 9", "detail": null, "record": { "id": "9" } })
        );
    }
}
