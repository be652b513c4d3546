//! Mail reader for the Microsoft Graph REST API.
//!
//! Fetches the first page of a mailbox's messages and reduces each one to
//! its sender address and body preview.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Microsoft Graph v1.0 endpoint.
const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Errors that can occur during mail operations.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The request could not be sent or the response could not be read.
    #[error("Mail fetch failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The mail API answered with a non-success status.
    #[error("Mail fetch failed with HTTP {status}: {body}")]
    FetchFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response does not have the expected message list shape.
    #[error("Malformed mail response: {reason}")]
    Malformed {
        /// Parser message naming the offending field.
        reason: String,
        /// Raw response payload.
        payload: Value,
    },

    /// The configured endpoint cannot be turned into a request URL.
    #[error("Invalid mail endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type for mail operations.
pub type MailResult<T> = std::result::Result<T, MailError>;

/// Sender and preview of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Sender address.
    pub sender_email: String,
    /// Body preview with surrounding whitespace removed.
    pub body_preview: String,
}

/// Output collaborator receiving fetched messages.
pub trait MessageSink {
    /// Shows one message.
    fn show_message(&self, message: &MessageSummary);
}

/// Message listing endpoint of a mail API.
pub trait MailTransport {
    /// Lists messages of `mailbox` with `access_token` as bearer credential.
    ///
    /// Returns the parsed JSON body of the first page.
    fn list_messages(
        &self,
        mailbox: &str,
        access_token: &str,
    ) -> impl Future<Output = MailResult<Value>> + Send;
}

/// HTTP client for Graph mail endpoints.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
}

impl GraphClient {
    /// Creates a client for the public Graph v1.0 endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(GRAPH_BASE)
    }

    /// Creates a client for another Graph-compatible endpoint.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `{base}/users/{mailbox}/messages`, with the mailbox encoded as one segment.
    fn messages_url(&self, mailbox: &str) -> MailResult<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| MailError::InvalidEndpoint(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| MailError::InvalidEndpoint(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["users", mailbox, "messages"]);
        Ok(url)
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MailTransport for GraphClient {
    async fn list_messages(&self, mailbox: &str, access_token: &str) -> MailResult<Value> {
        let url = self.messages_url(mailbox)?;
        debug!("Graph: listing messages for {}", mailbox);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::FetchFailed { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MailError::Malformed {
            reason: e.to_string(),
            payload: Value::String(body),
        })
    }
}

#[derive(Deserialize)]
struct GraphMessageList {
    value: Vec<GraphMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    sender: GraphRecipient,
    body_preview: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRecipient {
    email_address: GraphEmailAddress,
}

#[derive(Deserialize)]
struct GraphEmailAddress {
    address: String,
}

impl From<GraphMessage> for MessageSummary {
    fn from(message: GraphMessage) -> Self {
        Self {
            sender_email: message.sender.email_address.address,
            body_preview: message.body_preview.trim().to_owned(),
        }
    }
}

/// Messages from one fetch, in the order the mail API returned them.
///
/// Single pass: iterating again requires another fetch.
#[derive(Debug)]
pub struct Messages {
    inner: std::vec::IntoIter<MessageSummary>,
}

impl Iterator for Messages {
    type Item = MessageSummary;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Messages {}

/// Reduces a message listing to summaries.
///
/// The whole page is validated first; one bad message fails the lot.
fn parse_messages(payload: Value) -> MailResult<Vec<MessageSummary>> {
    let list: GraphMessageList =
        serde_json::from_value(payload.clone()).map_err(|e| MailError::Malformed {
            reason: e.to_string(),
            payload,
        })?;
    Ok(list.value.into_iter().map(MessageSummary::from).collect())
}

/// Fetches the first page of messages for `mailbox`.
///
/// # Errors
///
/// Returns `MailError::Request`/`MailError::FetchFailed` if the transport
/// fails, or `MailError::Malformed` if the listing or any message in it lacks
/// `sender.emailAddress.address` or `bodyPreview`.
pub async fn fetch_messages<M: MailTransport>(
    transport: &M,
    mailbox: &str,
    access_token: &str,
) -> MailResult<Messages> {
    let payload = transport.list_messages(mailbox, access_token).await?;
    let summaries = parse_messages(payload)?;
    info!("Fetched {} messages from {}", summaries.len(), mailbox);
    Ok(Messages {
        inner: summaries.into_iter(),
    })
}
