//! Device flow and refresh grant tests against a scripted transport.
//!
//! The tests run on a paused tokio clock so the poll interval costs no
//! wall time and the elapsed virtual time can be asserted.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;

use mailpeek_oauth::{
    DeviceAuthorization, DeviceFlow, DevicePrompt, Error, IdentityTransport, PollPolicy,
    RefreshOutcome, Result, TokenGrant, TokenPair, refresh,
};

/// Transport that replays canned token responses in order.
struct ScriptedTransport {
    device: Value,
    tokens: Mutex<VecDeque<Value>>,
    token_requests: AtomicU32,
    grants: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    fn new(device: Value, tokens: impl IntoIterator<Item = Value>) -> Self {
        Self {
            device,
            tokens: Mutex::new(tokens.into_iter().collect()),
            token_requests: AtomicU32::new(0),
            grants: Mutex::new(Vec::new()),
        }
    }

    fn token_requests(&self) -> u32 {
        self.token_requests.load(Ordering::SeqCst)
    }
}

impl IdentityTransport for ScriptedTransport {
    async fn request_device_code(&self, _client_id: &str, _scope: &str) -> Result<Value> {
        Ok(self.device.clone())
    }

    async fn request_token(&self, grant: &TokenGrant<'_>) -> Result<Value> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        self.grants.lock().unwrap().push(
            grant
                .form_params()
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        );
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({"error": "script_exhausted"})))
    }
}

#[derive(Default)]
struct RecordingPrompt {
    shown: Mutex<Vec<(String, String)>>,
    waits: Mutex<Vec<u32>>,
}

impl DevicePrompt for RecordingPrompt {
    fn verification_required(&self, auth: &DeviceAuthorization) {
        self.shown
            .lock()
            .unwrap()
            .push((auth.verification_uri.clone(), auth.user_code.clone()));
    }

    fn waiting_for_approval(&self, attempt: u32) {
        self.waits.lock().unwrap().push(attempt);
    }
}

fn device_session() -> Value {
    json!({
        "device_code": "DEVICE-1",
        "user_code": "ABCD-EFGH",
        "verification_uri": "https://microsoft.com/devicelogin"
    })
}

fn pending() -> Value {
    json!({"error": "authorization_pending", "error_description": "waiting"})
}

fn issued(access: &str, refresh: &str) -> Value {
    json!({"token_type": "Bearer", "access_token": access, "refresh_token": refresh})
}

#[tokio::test(start_paused = true)]
async fn test_polls_until_approved() {
    const PENDING: u32 = 3;
    let mut script: Vec<Value> = (0..PENDING).map(|_| pending()).collect();
    script.push(issued("at-1", "rt-1"));
    let transport = ScriptedTransport::new(device_session(), script);
    let prompt = RecordingPrompt::default();

    let started = Instant::now();
    let tokens = DeviceFlow::new(&transport, "client")
        .authorize("offline_access Mail.Read", &prompt)
        .await
        .unwrap();

    assert_eq!(tokens, TokenPair::new("at-1", "rt-1"));
    assert_eq!(transport.token_requests(), PENDING + 1);
    assert_eq!(*prompt.waits.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(
        *prompt.shown.lock().unwrap(),
        vec![(
            "https://microsoft.com/devicelogin".to_owned(),
            "ABCD-EFGH".to_owned()
        )]
    );
    assert_eq!(started.elapsed(), Duration::from_secs(5) * PENDING);
}

#[tokio::test(start_paused = true)]
async fn test_poll_sends_device_code_grant() {
    let transport = ScriptedTransport::new(device_session(), [issued("at", "rt")]);

    DeviceFlow::new(&transport, "client-42")
        .authorize("Mail.Read", &())
        .await
        .unwrap();

    let grants = transport.grants.lock().unwrap();
    assert_eq!(
        grants[0],
        vec![
            ("client_id".to_owned(), "client-42".to_owned()),
            (
                "grant_type".to_owned(),
                "urn:ietf:params:oauth:grant-type:device_code".to_owned()
            ),
            ("device_code".to_owned(), "DEVICE-1".to_owned()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_stops_polling() {
    let transport = ScriptedTransport::new(
        device_session(),
        [json!({"error": "invalid_grant", "error_description": "bad code"}), issued("x", "y")],
    );

    let err = DeviceFlow::new(&transport, "client")
        .authorize("Mail.Read", &())
        .await
        .unwrap_err();

    let Error::AuthDenied(provider) = err else {
        panic!("expected AuthDenied, got {err:?}");
    };
    assert_eq!(provider.error, "invalid_grant");
    assert_eq!(provider.payload["error_description"], "bad code");
    assert_eq!(transport.token_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_max_attempts_bounds_loop() {
    let transport = ScriptedTransport::new(device_session(), (0..10).map(|_| pending()));
    let policy = PollPolicy::default().with_max_attempts(Some(4));

    let err = DeviceFlow::new(&transport, "client")
        .with_policy(policy)
        .authorize("Mail.Read", &())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PollTimeout { attempts: 4 }));
    assert_eq!(transport.token_requests(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_device_code_lifetime_bounds_loop() {
    let mut session = device_session();
    session["expires_in"] = json!(12);
    let transport = ScriptedTransport::new(session, (0..10).map(|_| pending()));

    let err = DeviceFlow::new(&transport, "client")
        .with_policy(PollPolicy::default().with_max_attempts(None))
        .authorize("Mail.Read", &())
        .await
        .unwrap_err();

    // Polls at t=0s, 5s, 10s; the next one would land past the 12s lifetime.
    assert!(matches!(err, Error::PollTimeout { attempts: 3 }));
}

#[tokio::test(start_paused = true)]
async fn test_provider_interval_wins_when_longer() {
    let mut session = device_session();
    session["interval"] = json!(9);
    let transport = ScriptedTransport::new(session, [pending(), issued("at", "rt")]);

    let started = Instant::now();
    DeviceFlow::new(&transport, "client")
        .authorize("Mail.Read", &())
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_unrepresentable_lifetime_means_no_deadline() {
    let mut session = device_session();
    session["expires_in"] = json!(u64::MAX);
    let transport = ScriptedTransport::new(session, [pending(), pending(), issued("at", "rt")]);

    let started = Instant::now();
    let tokens = DeviceFlow::new(&transport, "client")
        .with_policy(PollPolicy::default().with_max_attempts(None))
        .authorize("Mail.Read", &())
        .await
        .unwrap();

    assert_eq!(tokens, TokenPair::new("at", "rt"));
    assert_eq!(transport.token_requests(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test]
async fn test_device_request_missing_fields() {
    let transport = ScriptedTransport::new(json!({"user_code": "X"}), Vec::new());

    let err = DeviceFlow::new(&transport, "client")
        .authorize("Mail.Read", &())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuthRequestFailed { .. }));
    assert_eq!(transport.token_requests(), 0);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let transport = ScriptedTransport::new(Value::Null, [issued("at-2", "rt-2")]);

    let outcome = refresh(&transport, "client", "rt-1", "Mail.Read")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RefreshOutcome::Refreshed(TokenPair::new("at-2", "rt-2"))
    );
    let grants = transport.grants.lock().unwrap();
    assert!(grants[0].contains(&("grant_type".to_owned(), "refresh_token".to_owned())));
    assert!(grants[0].contains(&("refresh_token".to_owned(), "rt-1".to_owned())));
    assert!(grants[0].contains(&("scope".to_owned(), "Mail.Read".to_owned())));
}

#[tokio::test]
async fn test_refresh_keeps_unrotated_refresh_token() {
    let transport = ScriptedTransport::new(Value::Null, [json!({"access_token": "at-2"})]);

    let outcome = refresh(&transport, "client", "rt-1", "Mail.Read")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RefreshOutcome::Refreshed(TokenPair::new("at-2", "rt-1"))
    );
}

#[tokio::test]
async fn test_refresh_rejected() {
    let transport = ScriptedTransport::new(
        Value::Null,
        [json!({"error": "invalid_grant", "error_description": "AADSTS70008: expired"})],
    );

    let outcome = refresh(&transport, "client", "rt-1", "Mail.Read")
        .await
        .unwrap();

    let RefreshOutcome::Rejected(err) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(err.error, "invalid_grant");
}

#[tokio::test]
async fn test_refresh_pending_keeps_provider_body() {
    let transport = ScriptedTransport::new(Value::Null, [pending()]);

    let outcome = refresh(&transport, "client", "rt-1", "Mail.Read")
        .await
        .unwrap();

    let RefreshOutcome::Rejected(err) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(err.error, "authorization_pending");
    assert_eq!(err.payload, pending());
}
