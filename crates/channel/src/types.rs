//! Wire types for the Telegram Bot API, limited to what the backup flow
//! needs.

use serde::Deserialize;

/// Standard Telegram response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    #[allow(dead_code)]
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

impl Update {
    /// Either chat form carries the document the same way.
    pub fn into_message(self) -> Option<Message> {
        self.message.or(self.channel_post)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub date: i64,
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileInfo {
    pub file_path: Option<String>,
}

/// A document attachment found on the channel, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub file_id: String,
    pub file_name: String,
    /// Unix timestamp of the carrying message.
    pub date: i64,
}
