//! Command token grammar.
//!
//! `command positional... [--flag value]... [--toggle] [-- literal...]`
//!
//! Only flags a command declares are recognized; any other token, including
//! an unknown `--word`, is positional. After a bare `--` every token is
//! positional, so free text can contain a literal `--limit`.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::CliError;

/// Ends flag recognition.
const END_OF_FLAGS: &str = "--";

/// How a flag consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Takes the following token as its value.
    Value,
    /// Presence alone switches it on.
    Toggle,
}

/// A flag a command accepts, named without the leading dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    pub name: &'static str,
    pub kind: FlagKind,
}

impl Flag {
    pub const fn value(name: &'static str) -> Self {
        Self {
            name,
            kind: FlagKind::Value,
        }
    }

    pub const fn toggle(name: &'static str) -> Self {
        Self {
            name,
            kind: FlagKind::Toggle,
        }
    }
}

/// One parsed command line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    pub positionals: Vec<String>,
    /// Flag name to value; toggles map to `None`.
    pub flags: BTreeMap<String, Option<String>>,
}

impl CommandInvocation {
    /// Split `tokens` (command name first) into positionals and `flags`.
    ///
    /// A repeated flag keeps its last value.
    pub fn parse(tokens: &[String], flags: &[Flag]) -> Result<Self, CliError> {
        let Some((command, rest)) = tokens.split_first() else {
            return Err(CliError::invalid("command", "", "no command given"));
        };

        let mut positionals = Vec::new();
        let mut parsed = BTreeMap::new();
        let mut tokens = rest.iter();

        while let Some(token) = tokens.next() {
            if token == END_OF_FLAGS {
                positionals.extend(tokens.by_ref().cloned());
                break;
            }

            let flag = token
                .strip_prefix("--")
                .and_then(|name| flags.iter().find(|flag| flag.name == name));

            match flag {
                Some(Flag {
                    name,
                    kind: FlagKind::Toggle,
                }) => {
                    parsed.insert((*name).to_string(), None);
                }
                Some(Flag {
                    name,
                    kind: FlagKind::Value,
                }) => {
                    let value = tokens.next().ok_or_else(|| {
                        CliError::invalid(format!("--{name}"), "", "expected a value")
                    })?;
                    parsed.insert((*name).to_string(), Some(value.clone()));
                }
                None => positionals.push(token.clone()),
            }
        }

        Ok(Self {
            command: command.clone(),
            positionals,
            flags: parsed,
        })
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }

    /// Positional `index`, or a missing-argument error naming it.
    pub fn require(&self, index: usize, argument: &'static str) -> Result<&str, CliError> {
        self.positional(index)
            .ok_or_else(|| CliError::MissingArgument {
                command: self.command.clone(),
                argument,
            })
    }

    /// Positionals from `index` on, joined by single spaces.
    pub fn text_from(&self, index: usize) -> Option<String> {
        let words = self.positionals.get(index..)?;
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }

    /// Like [`Self::text_from`] but required.
    pub fn require_text(&self, index: usize, argument: &'static str) -> Result<String, CliError> {
        self.text_from(index).ok_or_else(|| CliError::MissingArgument {
            command: self.command.clone(),
            argument,
        })
    }

    /// Value given for flag `name`.
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|value| value.as_deref())
    }

    /// Whether flag `name` appeared at all.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Parse flag `name`, falling back to `default` when absent.
    pub fn flag_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, CliError> {
        match self.flag(name) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                CliError::invalid(format!("--{name}"), raw, "expected a number")
            }),
        }
    }
}
