//! socialctl - drive Discord, LinkedIn and Reddit as your own user account.
//!
//! The crate is split along the path a command takes: [`invocation`] parses
//! the command tokens, [`credentials`] resolves the account from the config
//! source and environment, [`client`] issues the authenticated requests,
//! [`envelope`] unwraps the platform payloads into [`record::DomainRecord`]s
//! and [`actions`] ties those together per platform. [`dispatch`] runs one
//! command end to end.

pub mod actions;
pub mod client;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod invocation;
pub mod output;
pub mod platform;
pub mod record;
pub mod request;
