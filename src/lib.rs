//! Community Discord bot: Codenames games, base64 helpers and a duplicate link check.

pub mod codenames;
pub mod commands;
pub mod component;
pub mod config;
mod defaults;
mod error;
pub mod links;
pub mod paths;
pub mod wiki;

pub use error::{Error, Result};
