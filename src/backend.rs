//! Types that can exchange (read/write) bytes with a modem.
//!
//! The [`Backend`] trait represents all such types.

use std::io;
use std::time::Duration;

use serialport as sp;

#[cfg(windows)]
use sp::COMPort as ExternSerial;
use sp::SerialPort;
#[cfg(unix)]
use sp::TTYPort as ExternSerial;

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// Types that allow reading and writing bytes with a connected modem.
pub trait Backend: io::Read + io::Write + private::Sealed {
	/// Set the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error>;

	/// Get the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error>;

	/// Get the "name" of the backend.
	///
	/// This can be in any format, but should uniquely identify the backend
	/// instance.
	fn name(&self) -> Option<String>;
}

impl<C: Backend + ?Sized> Backend for Box<C> {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

impl<C: Backend + ?Sized> Backend for &mut C {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
}

/// Modems exposed over the network by a serial-to-TCP bridge.
impl Backend for std::net::TcpStream {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		std::net::TcpStream::set_read_timeout(self, timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		std::net::TcpStream::read_timeout(self)
	}
	fn name(&self) -> Option<String> {
		self.peer_addr().map(|addr| format!("{addr}")).ok()
	}
}

/// A platform agnostic serial port backend.
//
// `serialport` exposes a different native port type on windows and unix. The
// one for the current platform is picked at compile time and wrapped here so
// the rest of the crate never names either of them.
#[derive(Debug)]
pub struct Serial(pub(crate) ExternSerial);

impl io::Read for Serial {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.0.read(buf)
	}
}

impl io::Write for Serial {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.0.flush()
	}
}

impl Backend for Serial {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		// serialport has no notion of an infinite timeout, but Duration::MAX
		// is close enough.
		Ok(self.0.set_timeout(timeout.unwrap_or(Duration::MAX))?)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(Some(self.0.timeout()))
	}
	fn name(&self) -> Option<String> {
		self.0.name()
	}
}

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
pub use mock::{Mock, Request, Script};

#[cfg(any(test, feature = "mock"))]
mod mock {
	use super::{io, Backend, Duration};
	use std::collections::VecDeque;
	use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

	/// Something written to a [`Mock`] and terminated by one of the bytes a
	/// modem reacts to.
	#[derive(Debug, Clone, PartialEq, Eq, Hash)]
	pub enum Request {
		/// A command line, terminated by a carriage return.
		Command(String),
		/// A message body, terminated by Ctrl-Z.
		Body(String),
		/// A message body that was abandoned with Escape.
		Cancel(String),
	}

	impl Request {
		/// Get the text of the request, without its terminator.
		pub fn text(&self) -> &str {
			match self {
				Request::Command(text) | Request::Body(text) | Request::Cancel(text) => text,
			}
		}
	}

	/// The function a [`Mock`] uses to answer requests.
	///
	/// The returned bytes are made available for reading.
	pub type Script = Box<dyn FnMut(&Request) -> Vec<u8> + Send>;

	struct State {
		/// Bytes available for reading.
		incoming: VecDeque<u8>,
		/// Bytes written since the last terminator.
		pending: Vec<u8>,
		/// Everything written so far, in order.
		requests: Vec<Request>,
		script: Script,
		/// The error to surface on the next read, if any. It is only surfaced once.
		read_error: Option<io::Error>,
		/// The error to surface on the next write, if any. It is only surfaced once.
		write_error: Option<io::Error>,
		/// Once closed, requests go unanswered and reads report the end of
		/// the stream.
		closed: bool,
		/// The read timeout, which is ignored.
		ignored_read_timeout: Option<Duration>,
	}

	/// A scripted modem for use in testing.
	///
	/// It has the following features:
	///   * Commands, message bodies and cancellations written to it are
	///     recorded and passed to a [`Script`], whose answer can then be read.
	///   * Unsolicited data can be pushed for reading at any time.
	///   * Specific errors can be inserted for calls to `read` and `write`.
	///
	/// Clones share the same state, so a test can keep a handle to a mock that
	/// it has given away.
	#[derive(Clone)]
	pub struct Mock {
		state: Arc<Mutex<State>>,
	}

	impl std::fmt::Debug for Mock {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			f.debug_struct("Mock")
				.field("requests", &self.lock().requests.len())
				.finish_non_exhaustive()
		}
	}

	impl Mock {
		/// Create a mock that answers every command and message body with `OK`.
		pub fn new() -> Self {
			Mock::with_script(|_| ok())
		}

		/// Create a mock that answers requests with the given script.
		pub fn with_script<F>(script: F) -> Self
		where
			F: FnMut(&Request) -> Vec<u8> + Send + 'static,
		{
			Mock {
				state: Arc::new(Mutex::new(State {
					incoming: VecDeque::new(),
					pending: Vec::new(),
					requests: Vec::new(),
					script: Box::new(script),
					read_error: None,
					write_error: None,
					closed: false,
					ignored_read_timeout: Some(Duration::ZERO),
				})),
			}
		}

		fn lock(&self) -> MutexGuard<'_, State> {
			self.state.lock().unwrap_or_else(PoisonError::into_inner)
		}

		/// Append data to the read buffer.
		///
		/// The data is not validated in any way.
		pub fn push<T: AsRef<[u8]>>(&self, bytes: T) {
			self.lock().incoming.extend(bytes.as_ref());
		}

		/// Whether the mock has any data available or not.
		pub fn is_empty(&self) -> bool {
			self.lock().incoming.is_empty()
		}

		/// Get everything written to the mock so far.
		pub fn requests(&self) -> Vec<Request> {
			self.lock().requests.clone()
		}

		/// Get the text of every command written to the mock so far.
		pub fn commands(&self) -> Vec<String> {
			self.lock()
				.requests
				.iter()
				.filter_map(|request| match request {
					Request::Command(text) => Some(text.clone()),
					_ => None,
				})
				.collect()
		}

		/// Set the error for the next `read`, if any.
		pub fn read_error(&self, err: Option<io::Error>) {
			self.lock().read_error = err;
		}

		/// Set the error for the next `write`, if any.
		pub fn write_error(&self, err: Option<io::Error>) {
			self.lock().write_error = err;
		}

		/// Disconnect the mock.
		///
		/// Requests written afterwards are still recorded but never answered,
		/// and reads report the end of the stream once the data already
		/// available has been consumed.
		pub fn close(&self) {
			self.lock().closed = true;
		}
	}

	impl Default for Mock {
		fn default() -> Self {
			Self::new()
		}
	}

	/// The final result code of a successful command.
	pub(crate) fn ok() -> Vec<u8> {
		b"\r\nOK\r\n".to_vec()
	}

	fn latin1(bytes: &[u8]) -> String {
		bytes.iter().copied().map(char::from).collect()
	}

	impl Backend for Mock {
		fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
			self.lock().ignored_read_timeout = timeout;
			Ok(())
		}

		fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
			Ok(self.lock().ignored_read_timeout)
		}

		fn name(&self) -> Option<String> {
			Some(format!("<mock 0x{:x}>", Arc::as_ptr(&self.state) as usize))
		}
	}

	impl io::Read for Mock {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			let mut state = self.lock();
			if let Some(err) = state.read_error.take() {
				return Err(err);
			}
			if state.incoming.is_empty() {
				if state.closed {
					return Ok(0);
				}
				drop(state);
				// A real device would block until its timeout elapsed. Yield
				// briefly so other threads can write in the meantime.
				std::thread::sleep(Duration::from_millis(1));
				return Err(io::Error::new(
					io::ErrorKind::TimedOut,
					"Simulated timeout error",
				));
			}
			let mut count = 0;
			while count < buf.len() {
				match state.incoming.pop_front() {
					Some(byte) => {
						buf[count] = byte;
						count += 1;
					}
					None => break,
				}
			}
			Ok(count)
		}
	}

	impl io::Write for Mock {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			let mut guard = self.lock();
			let state = &mut *guard;
			if let Some(err) = state.write_error.take() {
				return Err(err);
			}
			for &byte in buf {
				let request = match byte {
					b'\r' => Request::Command(latin1(&state.pending)),
					0x1A => Request::Body(latin1(&state.pending)),
					0x1B => Request::Cancel(latin1(&state.pending)),
					_ => {
						state.pending.push(byte);
						continue;
					}
				};
				state.pending.clear();
				// A disconnected modem hears nothing.
				if !state.closed {
					let answer = (state.script)(&request);
					state.incoming.extend(answer);
				}
				state.requests.push(request);
			}
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}
}

mod private {
	pub trait Sealed {}

	impl Sealed for super::Serial {}
	impl Sealed for std::net::TcpStream {}
	#[cfg(any(test, feature = "mock"))]
	impl Sealed for super::Mock {}
	impl<C: super::Backend + ?Sized> Sealed for Box<C> {}
	impl<C: super::Backend + ?Sized> Sealed for &mut C {}
}
