//! External backup channel for vitalog.
//!
//! A thin Telegram Bot API client: the service pushes backup artifacts as
//! messages/documents to a chat and pulls the most recent document back
//! during recovery. Every failure is a [`ChannelError`]; callers decide
//! whether to surface or swallow it.

mod client;
mod error;
mod types;

pub use client::{ChannelClient, DEFAULT_API_BASE};
pub use error::ChannelError;
pub use types::DocumentRef;
