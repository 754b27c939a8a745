//! Telegram Bot API client.

use serde::de::DeserializeOwned;

use crate::error::ChannelError;
use crate::types::{ApiEnvelope, DocumentRef, FileInfo, Update};

/// Production Telegram endpoint; tests point the client elsewhere.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Request timeout. All channel calls are best-effort and must never hold
/// up the request path for long.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Client for the backup channel.
pub struct ChannelClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl ChannelClient {
    /// Creates a client for the given bot token and target chat.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// failure).
    pub fn new(token: String, chat_id: String) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::ClientInit(e.to_string()))?;
        Ok(Self { client, base_url: DEFAULT_API_BASE.to_owned(), token, chat_id })
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ChannelError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ChannelError::HttpStatus { code: status.as_u16(), body });
        }
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| ChannelError::JsonParse {
                context: context.to_owned(),
                source: e,
            })?;
        if !envelope.ok {
            return Err(ChannelError::Rejected(
                envelope.description.unwrap_or_else(|| "no description".to_owned()),
            ));
        }
        envelope.result.ok_or_else(|| {
            ChannelError::Rejected(format!("{context}: ok response without result"))
        })
    }

    /// Sends a plain text message to the backup chat.
    pub async fn send_message(&self, text: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await?;
        let _: serde_json::Value = Self::unwrap_envelope(response, "sendMessage").await?;
        Ok(())
    }

    /// Uploads a document to the backup chat.
    pub async fn send_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ChannelError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", part);
        let response =
            self.client.post(self.method_url("sendDocument")).multipart(form).send().await?;
        let _: serde_json::Value = Self::unwrap_envelope(response, "sendDocument").await?;
        tracing::debug!(file_name, "document pushed to backup channel");
        Ok(())
    }

    /// Scans recent channel messages for document attachments, most recent
    /// first.
    pub async fn recent_documents(
        &self,
        limit: usize,
    ) -> Result<Vec<DocumentRef>, ChannelError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("limit", "100")])
            .send()
            .await?;
        let updates: Vec<Update> = Self::unwrap_envelope(response, "getUpdates").await?;

        let mut docs: Vec<DocumentRef> = updates
            .into_iter()
            .filter_map(Update::into_message)
            .filter_map(|msg| {
                let doc = msg.document?;
                Some(DocumentRef {
                    file_id: doc.file_id,
                    file_name: doc.file_name.unwrap_or_default(),
                    date: msg.date,
                })
            })
            .collect();
        docs.sort_by_key(|d| std::cmp::Reverse(d.date));
        docs.truncate(limit);
        Ok(docs)
    }

    /// Downloads an attachment's bytes by file id.
    pub async fn fetch_document(&self, file_id: &str) -> Result<Vec<u8>, ChannelError> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?;
        let info: FileInfo = Self::unwrap_envelope(response, "getFile").await?;
        let file_path = info
            .file_path
            .ok_or_else(|| ChannelError::MissingAttachment(file_id.to_owned()))?;

        let url = format!("{}/file/bot{}/{file_path}", self.base_url, self.token);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::HttpStatus {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
