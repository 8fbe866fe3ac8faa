//! Incoming and outgoing SMS messages.

use chrono::{DateTime, FixedOffset, Local};

use crate::error::MessageFrozenError;

/// A complete message received by the modem.
///
/// Multi-part messages are only represented once every part has arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncomingMessage {
	sender: String,
	sent_at: DateTime<FixedOffset>,
	received_at: DateTime<Local>,
	text: String,
}

impl IncomingMessage {
	/// Create a message that was received just now.
	pub fn new<S, T>(sender: S, sent_at: DateTime<FixedOffset>, text: T) -> Self
	where
		S: Into<String>,
		T: Into<String>,
	{
		IncomingMessage {
			sender: sender.into(),
			sent_at,
			received_at: Local::now(),
			text: text.into(),
		}
	}

	/// The phone number (or short code) that sent the message.
	pub fn sender(&self) -> &str {
		&self.sender
	}

	/// When the service centre says the message was sent, in the sender's
	/// time zone.
	pub fn sent_at(&self) -> DateTime<FixedOffset> {
		self.sent_at
	}

	/// When the message was completed locally.
	pub fn received_at(&self) -> DateTime<Local> {
		self.received_at
	}

	/// The message text.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Alias for [`sender`](IncomingMessage::sender), so incoming and outgoing
	/// messages can be logged the same way.
	pub fn number(&self) -> &str {
		&self.sender
	}
}

/// A message to be sent with [`Modem::send`](crate::Modem::send).
///
/// The message can be modified freely until it has been sent. After that it
/// is frozen and every setter returns a [`MessageFrozenError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutgoingMessage {
	recipient: String,
	text: String,
	sent_at: Option<DateTime<Local>>,
}

impl OutgoingMessage {
	/// Create a new, unsent message.
	pub fn new<R, T>(recipient: R, text: T) -> Self
	where
		R: Into<String>,
		T: Into<String>,
	{
		OutgoingMessage {
			recipient: recipient.into(),
			text: text.into(),
			sent_at: None,
		}
	}

	/// The phone number the message is addressed to.
	pub fn recipient(&self) -> &str {
		&self.recipient
	}

	/// The message text.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// When the modem accepted the message, if it has been sent.
	pub fn sent_at(&self) -> Option<DateTime<Local>> {
		self.sent_at
	}

	/// Whether the message has been sent (and is therefore frozen).
	pub fn is_sent(&self) -> bool {
		self.sent_at.is_some()
	}

	/// Alias for [`recipient`](OutgoingMessage::recipient), so incoming and
	/// outgoing messages can be logged the same way.
	pub fn number(&self) -> &str {
		&self.recipient
	}

	/// Change the recipient.
	pub fn set_recipient<R: Into<String>>(&mut self, recipient: R) -> Result<(), MessageFrozenError> {
		self.ensure_unsent()?;
		self.recipient = recipient.into();
		Ok(())
	}

	/// Change the text.
	pub fn set_text<T: Into<String>>(&mut self, text: T) -> Result<(), MessageFrozenError> {
		self.ensure_unsent()?;
		self.text = text.into();
		Ok(())
	}

	fn ensure_unsent(&self) -> Result<(), MessageFrozenError> {
		if self.is_sent() {
			Err(MessageFrozenError)
		} else {
			Ok(())
		}
	}

	/// Record that the message was accepted by the modem.
	pub(crate) fn mark_sent(&mut self) {
		self.sent_at = Some(Local::now());
	}
}
