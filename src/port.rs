//! The line oriented reader/writer that sits between a [`Backend`] and the
//! command engine.
//!
//! Modems speak a text protocol, but messages may carry arbitrary octets (the
//! concatenation headers of multi-part messages, for instance). Bytes are
//! therefore mapped one-to-one onto `char`s (Latin-1) in both directions so
//! no information is lost.

use crate::backend::{Backend, UNKNOWN_BACKEND_NAME};
use crate::error::{
	CmeError, CmsError, ModemError, ReadError, RejectedError, TimeoutError, WriteError,
};
use regex::Regex;
use std::{
	io,
	sync::LazyLock,
	time::{Duration, Instant},
};

/// The terminator used for response lines.
pub(crate) const DEFAULT_TERMINATOR: &str = "\r\n";
/// The terminator written after each command.
pub(crate) const COMMAND_TERMINATOR: &str = "\r";
/// The prompt a modem emits when it is waiting for a message body.
pub(crate) const PROMPT: &str = "> ";
/// Ends a message body and submits it.
pub(crate) const CTRL_Z: u8 = 26;
/// Abandons a message body and leaves prompt mode.
pub(crate) const ESC: u8 = 27;

static CODED_ERROR: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\+(CM[ES]) ERROR: (.+)$").expect("valid regex"));

/// The result of looking at a single response line.
#[derive(Debug)]
enum Line {
	/// The response is not finished yet.
	More,
	/// The response is complete.
	Done,
	/// The modem reported a failure.
	Failed(ModemError),
}

fn classify(line: &str) -> Line {
	if let Some(caps) = CODED_ERROR.captures(line) {
		return match caps[2].trim().parse::<u16>() {
			Ok(code) if &caps[1] == "CME" => Line::Failed(CmeError::new(code).into()),
			Ok(code) => Line::Failed(CmsError::new(code).into()),
			// Verbose (textual) error reports carry no usable code.
			Err(_) => Line::Failed(RejectedError::new(line).into()),
		};
	}
	match line {
		"ERROR" => Line::Failed(RejectedError::new(line).into()),
		"OK" | ">" => Line::Done,
		// Some commands never answer with OK, even on success.
		_ if line.starts_with("+CPIN: ") && line.len() > "+CPIN: ".len() => Line::Done,
		_ => Line::More,
	}
}

/// Encode text as Latin-1. Characters outside of it are replaced by `?`.
pub(crate) fn encode(text: &str) -> Vec<u8> {
	text.chars()
		.map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
		.collect()
}

/// Render bytes for the traffic log, escaping anything unprintable.
fn printable(bytes: &[u8]) -> String {
	bytes.iter().copied().map(char::from).fold(
		String::with_capacity(bytes.len()),
		|mut out, c| {
			if c.is_ascii_graphic() || c == ' ' {
				out.push(c);
			} else {
				out.extend(c.escape_default());
			}
			out
		},
	)
}

/// A line oriented view of a [`Backend`].
pub(crate) struct Port<B> {
	/// The underlying backend
	backend: B,
	/// The name used in traffic logs.
	name: String,
	/// How long to wait for a complete line.
	read_timeout: Duration,
}

impl<B: Backend> std::fmt::Debug for Port<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Port")
			.field("name", &self.name)
			.field("read_timeout", &self.read_timeout)
			.finish_non_exhaustive()
	}
}

impl<B: Backend> Port<B> {
	/// Wrap the backend.
	///
	/// `byte_timeout` bounds each individual read from the backend so that
	/// the overall `read_timeout` can be enforced.
	pub fn new(
		mut backend: B,
		name: Option<String>,
		read_timeout: Duration,
		byte_timeout: Duration,
	) -> Result<Self, io::Error> {
		backend.set_read_timeout(Some(byte_timeout))?;
		let name = name
			.or_else(|| backend.name())
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string());
		Ok(Port {
			backend,
			name,
			read_timeout,
		})
	}

	/// The name used in log lines.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Get the time allowed for each response line.
	pub fn read_timeout(&self) -> Duration {
		self.read_timeout
	}

	/// Set the time allowed for each response line.
	pub fn set_read_timeout(&mut self, timeout: Duration) {
		self.read_timeout = timeout;
	}

	/// Write raw bytes to the modem.
	pub fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
		log::debug!("{} TX:   {}", self.name, printable(bytes));
		io::Write::write_all(&mut self.backend, bytes)
			.and_then(|()| io::Write::flush(&mut self.backend))
			.map_err(WriteError::new)
	}

	/// Write a command followed by its terminator.
	pub fn write_command(&mut self, command: &str, terminator: &str) -> Result<(), WriteError> {
		let mut bytes = encode(command);
		bytes.extend(encode(terminator));
		self.write(&bytes)
	}

	/// Read characters until the buffer ends with one of the `terminators`.
	///
	/// Every terminator is checked after each character. The returned line
	/// has its surrounding whitespace removed.
	pub fn read_line(&mut self, terminators: &[&str]) -> Result<String, ModemError> {
		let deadline = Instant::now() + self.read_timeout;
		let mut buffer = String::new();
		let mut byte = [0u8; 1];
		loop {
			if Instant::now() >= deadline {
				log::debug!("{} RECV: <timeout> {}", self.name, printable(&encode(&buffer)));
				return Err(TimeoutError::new(self.read_timeout).into());
			}
			match io::Read::read(&mut self.backend, &mut byte) {
				Ok(0) => return Err(ReadError::end_of_stream().into()),
				Ok(_) => {
					buffer.push(char::from(byte[0]));
					if terminators.iter().any(|term| buffer.ends_with(term)) {
						let line = buffer
							.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
							.to_string();
						log::debug!("{} RECV: {}", self.name, printable(&encode(&line)));
						return Ok(line);
					}
				}
				Err(e)
					if matches!(
						e.kind(),
						io::ErrorKind::TimedOut
							| io::ErrorKind::WouldBlock
							| io::ErrorKind::Interrupted
					) => {}
				Err(e) => return Err(ReadError::new(e).into()),
			}
		}
	}

	/// Collect response lines until the modem signals the end of the response.
	///
	/// The terminating line is included in the returned lines. If the modem
	/// reports an error, the lines read so far are discarded.
	pub fn wait(&mut self, terminators: &[&str]) -> Result<Vec<String>, ModemError> {
		let mut lines = Vec::new();
		loop {
			let line = self.read_line(terminators)?;
			match classify(&line) {
				Line::Failed(err) => {
					log::debug!("{} response failed: {}", self.name, err);
					return Err(err);
				}
				Line::Done => {
					lines.push(line);
					return Ok(lines);
				}
				Line::More => lines.push(line),
			}
		}
	}
}
