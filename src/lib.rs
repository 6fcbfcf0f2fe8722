//! Lowkey is a streaming chat client for a travel-recommendation assistant.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state: the [`core::session::ChatSession`]
//!   status machine, the streaming transport in [`core::chat_stream`], the
//!   pure transcript projection, input gating, and configuration.
//! - [`api`] defines the JSON payload posted to the chat endpoint.
//! - [`cli`] is a terminal front end that drives [`core::client::ChatClient`]
//!   the way any presentation layer would.
//! - [`utils`] holds endpoint URL handling and the transcript log.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
