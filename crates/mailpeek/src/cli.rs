//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Show sender and preview of the messages in a Microsoft 365 mailbox.
#[derive(Parser, Debug)]
#[command(name = "mailpeek", version, about)]
pub struct Cli {
    /// Credential record to read and update
    /// [default: ./config.json, else <config dir>/mailpeek/config.json]
    #[arg(short, long, env = "MAILPEEK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds between token polls while waiting for sign-in
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub poll_interval: u64,

    /// Give up waiting for sign-in after this many polls (0 waits until the code expires)
    #[arg(long, value_name = "N", default_value_t = 180)]
    pub max_attempts: u32,

    /// Start a new device sign-in when the stored refresh token is rejected
    #[arg(long)]
    pub reauthorize: bool,

    /// Open the verification page in the default browser
    #[arg(long)]
    pub open: bool,
}

impl Cli {
    /// Attempt cap for the poll policy; `None` when unbounded.
    pub const fn max_attempts(&self) -> Option<u32> {
        match self.max_attempts {
            0 => None,
            n => Some(n),
        }
    }
}
