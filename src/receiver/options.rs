//! Types defining the options of a receiver.

use crate::stored;
use std::time::Duration;

/// Options for configuring a [`Receiver`](super::Receiver).
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// The pause between polls.
    pub(super) interval: Duration,
    /// Re-arm notifications every this many polls.
    pub(super) rearm_every: u32,
    /// Fetch stored messages every this many polls.
    pub(super) fetch_every: u32,
    /// The command that enables new-message notifications.
    pub(super) notification_command: String,
    /// The status of the stored messages to fetch.
    pub(super) stored_status: String,
}

impl ReceiveOptions {
    /// Create a blank set of options ready for configuration.
    ///
    /// Equivalent to [`default`](ReceiveOptions::default).
    pub fn new() -> Self {
        ReceiveOptions {
            interval: Duration::from_secs(5),
            rearm_every: 10,
            fetch_every: 4,
            notification_command: "AT+CNMI=2,2,0,0,0".to_string(),
            stored_status: stored::DEFAULT_STATUS.to_string(),
        }
    }

    /// Set the pause between polls.
    ///
    /// The default is 5 seconds.
    pub fn interval(&mut self, interval: Duration) -> &mut Self {
        self.interval = interval;
        self
    }

    /// Set how many polls pass between re-arming new-message notifications,
    /// in case the modem forgot about them (after a power cycle, say).
    ///
    /// Notifications are always armed on the first poll. Zero disables
    /// re-arming entirely. The default is 10.
    pub fn rearm_every(&mut self, polls: u32) -> &mut Self {
        self.rearm_every = polls;
        self
    }

    /// Set how many polls pass between fetching stored messages, which
    /// catches messages the modem didn't announce.
    ///
    /// Stored messages are always fetched on the first poll. Zero disables
    /// fetching entirely. The default is 4.
    pub fn fetch_every(&mut self, polls: u32) -> &mut Self {
        self.fetch_every = polls;
        self
    }

    /// Set the command that enables new-message notifications.
    ///
    /// The default is `AT+CNMI=2,2,0,0,0`.
    pub fn notification_command<S: Into<String>>(&mut self, command: S) -> &mut Self {
        self.notification_command = command.into();
        self
    }

    /// Set the status of the stored messages to fetch.
    ///
    /// The default is `REC UNREAD`.
    pub fn stored_status<S: Into<String>>(&mut self, status: S) -> &mut Self {
        self.stored_status = status.into();
        self
    }
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        ReceiveOptions::new()
    }
}
