//! Scripted collaborators shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::{Value, json};

use mailpeek_core::credentials::StoreResult;
use mailpeek_core::service::MailResult;
use mailpeek_core::{CredentialRecord, CredentialStore, MailTransport, MessageSink, MessageSummary};
use mailpeek_oauth::{DeviceAuthorization, DevicePrompt, IdentityTransport, TokenGrant};

/// Identity provider that replays canned responses in order.
pub struct ScriptedIdentity {
    device: Value,
    tokens: Mutex<VecDeque<Value>>,
    device_requests: AtomicU32,
    token_requests: AtomicU32,
    grant_types: Mutex<Vec<&'static str>>,
    unreachable: bool,
}

impl ScriptedIdentity {
    pub fn new(tokens: impl IntoIterator<Item = Value>) -> Self {
        Self {
            device: device_session(),
            tokens: Mutex::new(tokens.into_iter().collect()),
            device_requests: AtomicU32::new(0),
            token_requests: AtomicU32::new(0),
            grant_types: Mutex::new(Vec::new()),
            unreachable: false,
        }
    }

    /// Token endpoint that answers every request with a non-JSON body.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn device_requests(&self) -> u32 {
        self.device_requests.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> u32 {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn grant_types(&self) -> Vec<&'static str> {
        self.grant_types.lock().unwrap().clone()
    }
}

impl IdentityTransport for ScriptedIdentity {
    async fn request_device_code(
        &self,
        _client_id: &str,
        _scope: &str,
    ) -> mailpeek_oauth::Result<Value> {
        self.device_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.device.clone())
    }

    async fn request_token(&self, grant: &TokenGrant<'_>) -> mailpeek_oauth::Result<Value> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        self.grant_types.lock().unwrap().push(grant.grant_type());
        if self.unreachable {
            return Err(mailpeek_oauth::Error::InvalidResponse {
                reason: "HTTP 502 with non-JSON body".into(),
                payload: Value::String("<html>Bad Gateway</html>".into()),
            });
        }
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({"error": "script_exhausted"})))
    }
}

/// In-memory credential store that counts saves.
pub struct MemoryStore {
    record: Mutex<Option<CredentialRecord>>,
    saves: AtomicU32,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new(record: CredentialRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            saves: AtomicU32::new(0),
            fail_saves: false,
        }
    }

    pub fn failing(record: CredentialRecord) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(record)
        }
    }

    pub fn current(&self) -> CredentialRecord {
        self.record.lock().unwrap().clone().unwrap()
    }

    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryStore {
    async fn load(&self) -> StoreResult<CredentialRecord> {
        Ok(self.current())
    }

    async fn save(&self, record: &CredentialRecord) -> StoreResult<()> {
        if self.fail_saves {
            return Err(mailpeek_core::StoreError::StorageWrite {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }
}

/// Mail API stub returning a fixed body and recording requests.
pub struct StubMail {
    body: Value,
    requests: Mutex<Vec<(String, String)>>,
}

impl StubMail {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `(mailbox, access_token)` of each request.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl MailTransport for StubMail {
    async fn list_messages(&self, mailbox: &str, access_token: &str) -> MailResult<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((mailbox.to_owned(), access_token.to_owned()));
        Ok(self.body.clone())
    }
}

/// Output collaborator that records everything it is shown.
#[derive(Default)]
pub struct RecordingUi {
    pub prompts: Mutex<Vec<(String, String)>>,
    pub waits: Mutex<Vec<u32>>,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl DevicePrompt for RecordingUi {
    fn verification_required(&self, auth: &DeviceAuthorization) {
        self.prompts
            .lock()
            .unwrap()
            .push((auth.verification_uri.clone(), auth.user_code.clone()));
    }

    fn waiting_for_approval(&self, attempt: u32) {
        self.waits.lock().unwrap().push(attempt);
    }
}

impl MessageSink for RecordingUi {
    fn show_message(&self, message: &MessageSummary) {
        self.messages
            .lock()
            .unwrap()
            .push((message.sender_email.clone(), message.body_preview.clone()));
    }
}

pub fn device_session() -> Value {
    json!({
        "device_code": "DEVICE-1",
        "user_code": "ABCD-EFGH",
        "verification_uri": "https://microsoft.com/devicelogin",
        "expires_in": 900,
        "interval": 5
    })
}

pub fn pending() -> Value {
    json!({"error": "authorization_pending"})
}

pub fn issued(access: &str, refresh: &str) -> Value {
    json!({"token_type": "Bearer", "access_token": access, "refresh_token": refresh})
}

pub fn fresh_record() -> CredentialRecord {
    CredentialRecord::new(
        "client-1",
        "tenant-1",
        "offline_access https://graph.microsoft.com/Mail.Read",
        "me@contoso.com",
    )
}
