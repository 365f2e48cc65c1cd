//! Manage SW360 OAuth2 API clients and admin users, and mint ORT connector configuration.
//!
//! Every operation takes its connection [`config::Settings`] explicitly; nothing is read from
//! globals once the binary has started.

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod output;
pub mod token;
pub mod user;

pub use error::{Error, Result};
