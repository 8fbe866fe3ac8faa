//! Background delivery of incoming messages.
//!
//! A [`Receiver`] periodically polls a [`Modem`] so that new-message
//! notifications are picked up, occasionally re-arms those notifications and
//! fetches stored messages the modem failed to announce, and hands every
//! completed message to a callback.
//!
//! ## Example
//!
//! ```rust
//! # use gsmlink::{Modem, ReceiveOptions};
//! # use std::sync::Arc;
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let modem = Arc::new(Modem::open("/dev/ttyUSB0")?);
//! let handle = Modem::receive(
//!     &modem,
//!     |msg| {
//!         println!("{} says {}", msg.sender(), msg.text());
//!         Ok(())
//!     },
//!     &ReceiveOptions::new(),
//! )?;
//! // The modem can still be used to send messages in the meantime.
//! modem.send_sms("+15551234567", "Listening")?;
//! let error = handle.join().expect("receiver panicked");
//! # Ok(())
//! # }
//! ```

mod options;

use crate::{
	backend::Backend, error::ModemError, inbox::Inbox, message::IncomingMessage, Modem,
};
pub use options::ReceiveOptions;
use std::{
	collections::VecDeque,
	io,
	sync::Arc,
	thread::{self, JoinHandle},
};

/// The error a receive callback may return.
///
/// It is logged and otherwise ignored.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Polls a modem and delivers incoming messages to a callback.
pub struct Receiver<B, F> {
	modem: Arc<Modem<B>>,
	callback: F,
	options: ReceiveOptions,
	/// The number of completed polls.
	polled: u32,
}

impl<B: Backend, F> std::fmt::Debug for Receiver<B, F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Receiver")
			.field("modem", &self.modem)
			.field("options", &self.options)
			.field("polled", &self.polled)
			.finish_non_exhaustive()
	}
}

fn is_due(polled: u32, every: u32) -> bool {
	polled.checked_rem(every) == Some(0)
}

/// Messages taken from the inbox but not handed to the callback yet.
///
/// Whatever is left when this is dropped goes back to the inbox, so a
/// panicking callback only loses the message it was given.
struct Undelivered<'a> {
	inbox: &'a Inbox,
	messages: VecDeque<IncomingMessage>,
}

impl Drop for Undelivered<'_> {
	fn drop(&mut self) {
		if !self.messages.is_empty() {
			self.inbox.requeue(self.messages.drain(..).collect());
		}
	}
}

impl<B, F> Receiver<B, F>
where
	B: Backend,
	F: FnMut(IncomingMessage) -> Result<(), CallbackError>,
{
	/// Create a receiver. Nothing happens until it is polled.
	pub fn new(modem: Arc<Modem<B>>, callback: F, options: &ReceiveOptions) -> Self {
		Receiver {
			modem,
			callback,
			options: options.clone(),
			polled: 0,
		}
	}

	/// The number of completed polls.
	pub fn polled(&self) -> u32 {
		self.polled
	}

	/// Run a single poll.
	///
	/// The modem is pinged (`AT`), which also collects any pending
	/// notifications. Notifications are re-armed and stored messages fetched
	/// when due. Then every message in the inbox is delivered to the
	/// callback, in order.
	///
	/// Only a failure to ping the modem is returned. Failures to re-arm or
	/// fetch are logged, as are callback failures, which don't stop the
	/// remaining messages from being delivered. If the callback panics, the
	/// messages it has not been given yet stay in the inbox.
	pub fn poll_once(&mut self) -> Result<(), ModemError> {
		let label = self.modem.label().to_string();
		self.modem.command("AT")?;

		if is_due(self.polled, self.options.rearm_every) {
			// Best effort: the modem may not support the notification mode.
			self.modem.try_command(&self.options.notification_command);
		}
		if is_due(self.polled, self.options.fetch_every) {
			if let Err(e) = self
				.modem
				.fetch_stored_messages_with_status(&self.options.stored_status)
			{
				log::warn!("{label} couldn't fetch stored messages: {e}");
			}
		}

		let mut batch = Undelivered {
			inbox: self.modem.inbox(),
			messages: self.modem.inbox().take_all().into(),
		};
		while let Some(message) = batch.messages.pop_front() {
			let sender = message.sender().to_string();
			if let Err(e) = (self.callback)(message) {
				log::error!("{label} error in callback for a message from {sender}: {e}");
			}
		}
		self.polled = self.polled.wrapping_add(1);
		Ok(())
	}

	/// Poll forever, sleeping between polls.
	///
	/// Only returns if the modem stops responding to pings.
	pub fn run(mut self) -> ModemError {
		loop {
			if let Err(e) = self.poll_once() {
				log::error!("{} receiver stopped: {e}", self.modem.label());
				return e;
			}
			thread::sleep(self.options.interval);
		}
	}
}

impl<B, F> Receiver<B, F>
where
	B: Backend + Send + 'static,
	F: FnMut(IncomingMessage) -> Result<(), CallbackError> + Send + 'static,
{
	/// Run the receiver on a new thread named `receiver`.
	///
	/// The thread ends, returning the error, if the modem stops responding to
	/// pings.
	pub fn spawn(self) -> io::Result<JoinHandle<ModemError>> {
		thread::Builder::new()
			.name("receiver".to_string())
			.spawn(move || self.run())
	}
}

impl<B: Backend + Send + 'static> Modem<B> {
	/// Start delivering incoming messages to `callback` on a background thread.
	///
	/// See [`Receiver`] for details.
	pub fn receive<F>(
		modem: &Arc<Modem<B>>,
		callback: F,
		options: &ReceiveOptions,
	) -> io::Result<JoinHandle<ModemError>>
	where
		F: FnMut(IncomingMessage) -> Result<(), CallbackError> + Send + 'static,
	{
		Receiver::new(Arc::clone(modem), callback, options).spawn()
	}
}
