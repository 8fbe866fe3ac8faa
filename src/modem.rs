//! The AT command engine.
//!
//! A [`Modem`] owns the connection to a single GSM modem and exposes it as a
//! set of synchronous calls that may be made from any number of threads:
//!
//! * [`execute`](Modem::execute) issues a single command and returns its
//!   response, transparently waiting out "busy" (`+CMS ERROR: 515`) replies.
//! * [`command`](Modem::command) additionally retries failed commands with
//!   exponential backoff and, as a last resort, hard resets the modem.
//! * [`send_sms`](Modem::send_sms) performs the two stage `AT+CMGS`
//!   handshake.
//!
//! New-message notifications that the modem slips into any response are
//! removed from it, acknowledged and collected in the modem's [`Inbox`],
//! from which a [`Receiver`](crate::Receiver) can deliver them.
//!
//! ## Example
//!
//! ```rust
//! # use gsmlink::Modem;
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let modem = Modem::open("/dev/ttyUSB0")?;
//! println!("signal strength: {:?}", modem.signal_strength()?);
//! modem.send_sms("+15551234567", "Hello from gsmlink")?;
//! # Ok(())
//! # }
//! ```

mod network;
mod options;
#[cfg(test)]
mod test;

use crate::{
	backend::{Backend, Serial},
	error::{
		MessageFrozenError, ModemError, ProtocolError, ReservedRecipientError, ResetError,
	},
	inbox::Inbox,
	lock::{ExclusiveGuard, ExclusiveLock},
	message::OutgoingMessage,
	port::{self, Port, COMMAND_TERMINATOR, CTRL_Z, DEFAULT_TERMINATOR, ESC, PROMPT},
	stored,
	unsolicited::{self, Assembler},
};
pub use network::*;
pub(crate) use options::Policy;
pub use options::ModemOptions;
use std::{thread, time::Duration};

/// Messages addressed here are never sent. The number is reserved for
/// injecting test messages.
pub const LOOPBACK_RECIPIENT: &str = "+123456789";

/// Unsolicited status lines that are never part of a command's response.
const STATUS_NOISE: [&str; 3] = ["+WIND:", "+CREG:", "+CGREG:"];

/// Everything guarded by the modem's exclusive lock.
pub(crate) struct Session<B> {
	port: Port<B>,
	assembler: Assembler,
}

/// A GSM modem.
///
/// See the [crate level documentation](crate) for an overview.
///
/// A `Modem` is `Sync` (for `Send` backends) and is typically shared between
/// threads in an [`Arc`](std::sync::Arc).
pub struct Modem<B> {
	/// The port and multi-part buffers, one user at a time.
	session: ExclusiveLock<Session<B>>,
	/// Completed incoming messages.
	inbox: Inbox,
	/// The retry/reset policy.
	policy: Policy,
	/// Identifies this modem in logs.
	label: String,
}

impl<B: Backend> std::fmt::Debug for Modem<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Modem")
			.field("label", &self.label)
			.field("policy", &self.policy)
			.field("inbox", &self.inbox.len())
			.finish_non_exhaustive()
	}
}

impl Modem<Serial> {
	/// Open and initialize the modem on the serial port at the specified
	/// path using the default options.
	///
	/// Alternatively, use [`Modem::options`] to customize how the modem is opened.
	pub fn open(path: &str) -> Result<Modem<Serial>, ModemError> {
		ModemOptions::new().open(path)
	}

	/// Open and initialize the first modem found on one of the usual serial
	/// devices, using the default options.
	///
	/// See [`ModemOptions::open_auto`].
	pub fn open_auto() -> Result<Modem<Serial>, ModemError> {
		ModemOptions::new().open_auto()
	}

	/// Get an [`ModemOptions`] to customize how a modem is opened.
	pub fn options() -> ModemOptions {
		ModemOptions::new()
	}
}

impl<B: Backend> Modem<B> {
	/// Initialize the modem connected to `backend` using the default options.
	pub fn new(backend: B) -> Result<Self, ModemError> {
		ModemOptions::new().open_backend(backend)
	}

	pub(crate) fn from_backend(
		backend: B,
		label: Option<String>,
		read_timeout: Duration,
		byte_timeout: Duration,
		policy: Policy,
	) -> Result<Self, ModemError> {
		let port = Port::new(backend, label, read_timeout, byte_timeout)?;
		let modem = Modem {
			label: port.name().to_string(),
			session: ExclusiveLock::new(Session {
				port,
				assembler: Assembler::new(),
			}),
			inbox: Inbox::new(),
			policy,
		};
		modem.initialize()?;
		Ok(modem)
	}

	/// Bring the modem into a known state.
	fn initialize(&self) -> Result<(), ModemError> {
		log::debug!("{} initializing", self.label);
		// Nice to have, but not every modem supports them.
		self.try_command("ATE0"); // echo off
		self.try_command("AT+CMEE=1"); // numeric error codes
		self.try_command("AT+WIND=0"); // no vendor indications

		// Only text mode is supported.
		self.command("AT+CMGF=1")?;
		log::info!("{} initialized", self.label);
		Ok(())
	}

	fn lock(&self) -> ExclusiveGuard<'_, Session<B>> {
		self.session.lock(&self.label)
	}

	/// Issue a single command and return its response.
	///
	/// Blank lines, unsolicited status lines and new-message notifications
	/// are removed from the response. If the modem reports that it is busy
	/// (`+CMS ERROR: 515`), the command is transparently re-issued. Any other
	/// failure is returned as is; see [`command`](Modem::command) for a
	/// version that retries.
	pub fn execute(&self, command: &str) -> Result<Vec<String>, ModemError> {
		self.execute_with(command, &[DEFAULT_TERMINATOR], COMMAND_TERMINATOR)
	}

	/// Like [`execute`](Modem::execute) but with custom response line
	/// terminators and command terminator.
	///
	/// Other threads may use the modem while this one waits for a busy modem.
	pub fn execute_with(
		&self,
		command: &str,
		terminators: &[&str],
		write_terminator: &str,
	) -> Result<Vec<String>, ModemError> {
		let lines = loop {
			let result = {
				let mut session = self.lock();
				self.exchange(&mut session, command, terminators, write_terminator)
			};
			match result {
				Ok(lines) => break lines,
				Err(ModemError::Cms(e)) if e.is_busy() => self.wait_until_idle(command),
				Err(e) => return Err(e),
			}
		};
		// Modems are slow and get confused easily.
		thread::sleep(self.policy.command_delay);
		Ok(lines)
	}

	/// Like [`execute_with`](Modem::execute_with), for a caller that already
	/// holds the session and keeps it while waiting for a busy modem.
	fn execute_locked(
		&self,
		session: &mut Session<B>,
		command: &str,
		terminators: &[&str],
		write_terminator: &str,
	) -> Result<Vec<String>, ModemError> {
		loop {
			match self.exchange(session, command, terminators, write_terminator) {
				Err(ModemError::Cms(e)) if e.is_busy() => self.wait_until_idle(command),
				result => return result,
			}
		}
	}

	/// Write `command` once and collect the cleaned up response.
	fn exchange(
		&self,
		session: &mut Session<B>,
		command: &str,
		terminators: &[&str],
		write_terminator: &str,
	) -> Result<Vec<String>, ModemError> {
		session.port.write_command(command, write_terminator)?;
		let lines = session.port.wait(terminators)?;
		Ok(self.clean(session, lines))
	}

	fn wait_until_idle(&self, command: &str) {
		log::info!(
			"{} modem busy, re-issuing {command} in {:?}",
			self.label,
			self.policy.busy_retry_delay
		);
		thread::sleep(self.policy.busy_retry_delay);
	}

	/// Remove blank lines and unsolicited data from a response.
	fn clean(&self, session: &mut Session<B>, mut lines: Vec<String>) -> Vec<String> {
		lines.retain(|line| {
			!line.is_empty() && !STATUS_NOISE.iter().any(|noise| line.starts_with(noise))
		});
		let Session { port, assembler } = session;
		unsolicited::intercept(&mut lines, assembler, &self.inbox, || {
			acknowledge(&mut *port)
		});
		lines
	}

	/// Issue a command, retrying it if it fails.
	///
	/// A failed command is retried up to the retry limit, sleeping with
	/// exponential backoff in between. If every attempt fails and resetting
	/// is enabled, the modem is hard reset and the command is attempted one
	/// final time. The error of the last attempt is returned, even if the
	/// reset itself failed.
	pub fn command(&self, command: &str) -> Result<Vec<String>, ModemError> {
		self.command_with(command, &[DEFAULT_TERMINATOR])
	}

	/// Like [`command`](Modem::command) but with custom response line terminators.
	pub fn command_with(
		&self,
		command: &str,
		terminators: &[&str],
	) -> Result<Vec<String>, ModemError> {
		let mut failures = 0;
		let mut reset = false;
		loop {
			log::debug!(
				"{} command {command} (attempt {} of {})",
				self.label,
				failures + 1,
				self.policy.retry_limit + 1
			);
			let err = match self.execute_with(command, terminators, COMMAND_TERMINATOR) {
				Ok(lines) => return Ok(lines),
				Err(err) => err,
			};
			failures += 1;
			if failures <= self.policy.retry_limit {
				let delay = self.policy.backoff(failures);
				log::info!("{} {command} failed ({err}), retrying in {delay:?}", self.label);
				thread::sleep(delay);
				continue;
			}
			if self.policy.reset_on_failure && !reset {
				reset = true;
				log::warn!("{} {command} failed ({err}), resetting the modem", self.label);
				match self.reset() {
					Ok(()) => continue,
					Err(e) => log::error!("{} {e}", self.label),
				}
			}
			return Err(err);
		}
	}

	/// Issue a command that is allowed to fail.
	///
	/// Behaves like [`command`](Modem::command) but returns `None` instead of
	/// an error.
	pub fn try_command(&self, command: &str) -> Option<Vec<String>> {
		match self.command(command) {
			Ok(lines) => Some(lines),
			Err(e) => {
				log::debug!("{} ignoring failure of {command}: {e}", self.label);
				None
			}
		}
	}

	/// Issue a command that answers with exactly one line (followed by `OK`)
	/// and return that line.
	///
	/// Any other response is a [`ProtocolError`].
	pub fn query(&self, command: &str) -> Result<String, ModemError> {
		let lines = self.command(command)?;
		match lines.as_slice() {
			[line, ok] if ok == "OK" => Ok(line.clone()),
			_ => Err(ProtocolError::new(format!("invalid response to {command}"), &lines).into()),
		}
	}

	/// Hard reset the modem (`AT+CFUN=1`).
	///
	/// The command is issued once, without retries.
	pub fn reset(&self) -> Result<(), ResetError> {
		log::info!("{} resetting", self.label);
		self.execute("AT+CFUN=1")
			.map(drop)
			.map_err(ResetError::new)
	}

	/// Send an SMS message.
	///
	/// The modem is reserved for the whole exchange. If any step fails, the
	/// modem is taken out of prompt mode and the exchange is retried like
	/// [`command`](Modem::command) retries (without the reset).
	///
	/// Messages to [`LOOPBACK_RECIPIENT`] are refused with a
	/// [`ReservedRecipientError`] without touching the modem.
	pub fn send_sms(&self, recipient: &str, text: &str) -> Result<(), ModemError> {
		if recipient == LOOPBACK_RECIPIENT {
			log::info!("{} not sending test message: {text:?}", self.label);
			return Err(ReservedRecipientError::new(recipient).into());
		}
		let mut session = self.lock();
		let mut failures = 0;
		loop {
			log::debug!(
				"{} sending SMS to {recipient} (attempt {} of {})",
				self.label,
				failures + 1,
				self.policy.retry_limit + 1
			);
			let err = match self.submit(&mut session, recipient, text) {
				Ok(()) => {
					log::info!("{} sent SMS to {recipient}: {text:?}", self.label);
					return Ok(());
				}
				Err(err) => err,
			};
			// Otherwise the modem may read everything that follows as
			// message text.
			if let Err(e) = session.port.write(&[ESC]) {
				log::warn!("{} couldn't leave prompt mode: {e}", self.label);
			}
			failures += 1;
			if failures > self.policy.retry_limit {
				return Err(err);
			}
			let delay = self.policy.backoff(failures);
			log::info!("{} SMS to {recipient} failed ({err}), retrying in {delay:?}", self.label);
			thread::sleep(delay);
		}
	}

	/// The `AT+CMGS` exchange itself.
	fn submit(
		&self,
		session: &mut Session<B>,
		recipient: &str,
		text: &str,
	) -> Result<(), ModemError> {
		self.execute_locked(
			session,
			&format!("AT+CMGS=\"{recipient}\""),
			&[DEFAULT_TERMINATOR, PROMPT],
			COMMAND_TERMINATOR,
		)?;
		let mut body = port::encode(text);
		body.push(CTRL_Z);
		session.port.write(&body)?;
		let lines = session.port.wait(&[DEFAULT_TERMINATOR])?;
		self.clean(session, lines);
		Ok(())
	}

	/// Send an SMS message, returning whether it succeeded.
	///
	/// See [`send_sms`](Modem::send_sms).
	pub fn try_send_sms(&self, recipient: &str, text: &str) -> bool {
		match self.send_sms(recipient, text) {
			Ok(()) => true,
			Err(e) => {
				log::warn!("{} couldn't send SMS to {recipient}: {e}", self.label);
				false
			}
		}
	}

	/// Send a message and freeze it.
	///
	/// A message that has already been sent is refused with a
	/// [`MessageFrozenError`].
	pub fn send(&self, message: &mut OutgoingMessage) -> Result<(), ModemError> {
		if message.is_sent() {
			return Err(MessageFrozenError.into());
		}
		self.send_sms(message.recipient(), message.text())?;
		message.mark_sent();
		Ok(())
	}

	/// Move the messages stored on the SIM (unread ones) to the inbox.
	///
	/// Returns the number of messages added.
	pub fn fetch_stored_messages(&self) -> Result<usize, ModemError> {
		self.fetch_stored_messages_with_status(stored::DEFAULT_STATUS)
	}

	/// Move the messages stored on the SIM with the given status (such as
	/// `"REC UNREAD"` or `"ALL"`) to the inbox.
	///
	/// Returns the number of messages added. If the listing can't be
	/// parsed, nothing is added.
	pub fn fetch_stored_messages_with_status(&self, status: &str) -> Result<usize, ModemError> {
		let lines = self.command(&format!("AT+CMGL=\"{status}\""))?;
		let messages = stored::parse_listing(&lines)?;
		let count = messages.len();
		for message in messages {
			self.inbox.push(message);
		}
		log::debug!("{} fetched {count} stored message(s)", self.label);
		Ok(count)
	}

	/// The queue of completed incoming messages.
	pub fn inbox(&self) -> &Inbox {
		&self.inbox
	}

	/// The label identifying this modem in logs.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// The name of the thread currently using the modem, if any.
	///
	/// This is only a hint for diagnostics.
	pub fn lock_owner(&self) -> Option<String> {
		self.session.owner()
	}

	/// How many times a failed command is retried.
	pub fn retry_limit(&self) -> u32 {
		self.policy.retry_limit
	}

	/// Whether the modem is reset once a command's retries are exhausted.
	pub fn reset_on_failure(&self) -> bool {
		self.policy.reset_on_failure
	}

	/// The pause after every command.
	pub fn command_delay(&self) -> Duration {
		self.policy.command_delay
	}

	/// How long to wait for each line of a response.
	pub fn read_timeout(&self) -> Duration {
		self.lock().port.read_timeout()
	}

	/// Change how long to wait for each line of a response.
	pub fn set_read_timeout(&self, timeout: Duration) {
		self.lock().port.set_read_timeout(timeout);
	}
}

/// Acknowledge a new-message notification (`AT+CNMA`).
///
/// Only notifications from the acknowledgement's own response are kept,
/// so they can be processed in turn.
fn acknowledge<B: Backend>(port: &mut Port<B>) -> Result<Vec<String>, ModemError> {
	port.write_command("AT+CNMA", COMMAND_TERMINATOR)?;
	let lines = port.wait(&[DEFAULT_TERMINATOR])?;
	Ok(unsolicited::notifications(lines))
}
