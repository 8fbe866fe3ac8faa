//! The queue of completed incoming messages.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::message::IncomingMessage;

/// An unbounded, thread safe queue of incoming messages.
///
/// Messages are appended by the command engine as they complete and taken,
/// all at once, by whoever consumes them.
#[derive(Debug, Default)]
pub struct Inbox {
	queue: Mutex<VecDeque<IncomingMessage>>,
}

impl Inbox {
	/// Create an empty inbox.
	pub fn new() -> Self {
		Inbox::default()
	}

	fn queue(&self) -> MutexGuard<'_, VecDeque<IncomingMessage>> {
		self.queue.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Append a completed message.
	pub fn push(&self, message: IncomingMessage) {
		self.queue().push_back(message);
	}

	/// Remove and return every queued message, oldest first.
	///
	/// Messages pushed after this returns are kept for the next call.
	pub fn take_all(&self) -> Vec<IncomingMessage> {
		self.queue().drain(..).collect()
	}

	/// Put messages back at the front of the queue, keeping their order.
	pub(crate) fn requeue(&self, messages: Vec<IncomingMessage>) {
		let mut queue = self.queue();
		for message in messages.into_iter().rev() {
			queue.push_front(message);
		}
	}

	/// The number of queued messages.
	pub fn len(&self) -> usize {
		self.queue().len()
	}

	/// Whether there are no queued messages.
	pub fn is_empty(&self) -> bool {
		self.queue().is_empty()
	}
}
