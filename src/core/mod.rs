pub mod chat_stream;
pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod message;
pub mod projection;
pub mod session;
pub mod suggestions;
