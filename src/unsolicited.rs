//! Interception of new-message notifications (`+CMT:`) embedded in command
//! responses, including reassembly of multi-part messages.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ModemError;
use crate::inbox::Inbox;
use crate::message::IncomingMessage;
use crate::timestamp;

static HEADER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"^\+CMT: "(.+?)",.*?,"(.+?)".*?$"#).expect("valid regex"));

/// Marks the text of a message that is one part of a concatenated message.
const PART_MARKER: char = '\u{82}';
/// Present at [`FINAL_PART_FLAG_INDEX`] of the last part.
const FINAL_PART_FLAG: char = '\u{AD}';
const FINAL_PART_FLAG_INDEX: usize = 5;
/// The length of the concatenation header preceding each fragment.
const PART_HEADER_LEN: usize = 7;

/// The outcome of feeding one message text to an [`Assembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Assembly {
	/// A part of a larger message; `part` parts from this sender are now held.
	Partial { part: usize },
	/// The complete message text.
	Complete(String),
}

/// Buffers the fragments of multi-part messages until the last one arrives.
///
/// Each sender has at most one message in flight.
#[derive(Debug, Default)]
pub(crate) struct Assembler {
	parts: HashMap<String, Vec<String>>,
}

impl Assembler {
	pub fn new() -> Self {
		Assembler::default()
	}

	/// Whether fragments from `sender` are being held.
	#[cfg(test)]
	pub fn is_pending(&self, sender: &str) -> bool {
		self.parts.contains_key(sender)
	}

	/// Accept the text of a message from `sender`.
	pub fn accept(&mut self, sender: &str, text: &str) -> Assembly {
		let chars: Vec<char> = text.chars().collect();
		if chars.first() != Some(&PART_MARKER) || chars.get(1) != Some(&'@') {
			return Assembly::Complete(text.to_string());
		}
		let fragment: String = chars.iter().skip(PART_HEADER_LEN).collect();
		let parts = self.parts.entry(sender.to_string()).or_default();
		parts.push(fragment);
		let part = parts.len();
		log::debug!("received part {part} of a message from {sender}");
		if chars.get(FINAL_PART_FLAG_INDEX) != Some(&FINAL_PART_FLAG) {
			return Assembly::Partial { part };
		}
		let parts = self.parts.remove(sender).unwrap_or_default();
		Assembly::Complete(parts.concat())
	}
}

/// What to do after looking at one notification.
#[derive(Debug)]
enum Step {
	/// The notification was unusable and has been dropped.
	Skip,
	/// The notification held part of a message that is not complete yet.
	Continue,
	/// A message is complete.
	Complete(IncomingMessage),
}

fn scan<A>(header: &str, text: Option<&str>, assembler: &mut Assembler, acknowledge: A) -> Step
where
	A: FnOnce() -> Result<(), ModemError>,
{
	let Some(caps) = HEADER.captures(header) else {
		log::warn!("couldn't parse CMT data: {header}");
		return Step::Skip;
	};
	let Some(text) = text else {
		log::warn!("CMT data without message text: {header}");
		return Step::Skip;
	};
	let (sender, sent) = (&caps[1], &caps[2]);

	// The network is told before anyone can see the message.
	if let Err(e) = acknowledge() {
		log::warn!("receipt acknowledgement (CNMA) was rejected: {e}");
	}

	let text = match assembler.accept(sender, text) {
		Assembly::Partial { .. } => return Step::Continue,
		Assembly::Complete(text) => text,
	};
	match timestamp::parse(sent) {
		Ok(sent_at) => {
			log::info!("received message from {sender}: {text:?}");
			Step::Complete(IncomingMessage::new(sender, sent_at, text))
		}
		Err(e) => {
			log::warn!("dropping message from {sender}: {e}");
			Step::Skip
		}
	}
}

/// Remove every notification (and the line of text following it) from
/// `lines`, queueing each completed message in `inbox`.
///
/// `acknowledge` is called once per notification, before the message is
/// queued. Its failure is logged and otherwise ignored. Any notifications it
/// returns are processed after the ones already in `lines`.
pub(crate) fn intercept<A>(
	lines: &mut Vec<String>,
	assembler: &mut Assembler,
	inbox: &Inbox,
	mut acknowledge: A,
) where
	A: FnMut() -> Result<Vec<String>, ModemError>,
{
	let mut n = 0;
	while n < lines.len() {
		if !lines[n].starts_with("+CMT:") {
			n += 1;
			continue;
		}
		let end = (n + 2).min(lines.len());
		let mut consumed = lines.drain(n..end);
		let header = consumed.next().unwrap_or_default();
		let text = consumed.next();
		drop(consumed);
		let text = text.map(|t| t.trim_matches(|c: char| c.is_ascii_whitespace()).to_string());

		let mut late = Vec::new();
		let step = scan(&header, text.as_deref(), assembler, || {
			late = acknowledge()?;
			Ok(())
		});
		lines.append(&mut late);
		match step {
			Step::Complete(message) => inbox.push(message),
			Step::Continue | Step::Skip => {}
		}
		// The next unchecked line is now at `n`.
	}
}

/// Keep only the notifications (and their text lines) from a response.
pub(crate) fn notifications(lines: Vec<String>) -> Vec<String> {
	let mut kept = Vec::new();
	let mut lines = lines.into_iter();
	while let Some(line) = lines.next() {
		if line.starts_with("+CMT:") {
			kept.push(line);
			kept.extend(lines.next());
		}
	}
	kept
}
