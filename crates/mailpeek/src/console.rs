//! Terminal output for the device prompt and fetched messages.

use mailpeek_core::{MessageSink, MessageSummary};
use mailpeek_oauth::{DeviceAuthorization, DevicePrompt};
use tracing::warn;

/// Writes prompts and messages to stdout.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    open_browser: bool,
}

impl ConsoleUi {
    pub const fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl DevicePrompt for ConsoleUi {
    fn verification_required(&self, auth: &DeviceAuthorization) {
        println!(
            "Log in at {} and enter the code: {}",
            auth.verification_uri, auth.user_code
        );
        if self.open_browser
            && let Err(e) = opener::open(&auth.verification_uri)
        {
            warn!("Could not open browser: {}", e);
        }
    }

    fn waiting_for_approval(&self, _attempt: u32) {
        println!("Waiting for user to sign in...");
    }
}

impl MessageSink for ConsoleUi {
    fn show_message(&self, message: &MessageSummary) {
        println!("{}", render_message(message));
    }
}

/// Sender line, preview, then blank lines separating the next message.
fn render_message(message: &MessageSummary) -> String {
    format!(
        "Sender: {}\n{}\n\n\n",
        message.sender_email, message.body_preview
    )
}
