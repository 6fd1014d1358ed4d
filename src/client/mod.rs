//! Client entry point.
//!
//! [`GenAiClient`] wires configuration, dialect, transport and credentials into
//! one request engine and hands out the services built on it.

mod builder;
mod client;

pub use builder::GenAiClientBuilder;
pub use client::GenAiClient;
