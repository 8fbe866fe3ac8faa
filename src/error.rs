//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! Every fallible operation on a [`Modem`](crate::Modem) returns the higher
//! level [`ModemError`] enum, which all of the concrete error types convert
//! into, allowing them to be used with `?`:
//!
//! ```
//! use gsmlink::error::{ModemError, TimeoutError};
//!
//! fn foo() -> Result<(), TimeoutError> {
//!     // ...
//! # unimplemented!();
//! }
//!
//! fn bar() -> Result<(), ModemError> {
//!     foo()?;
//!     // ...
//! # Ok(())
//! }
//! ```
//!
//! Errors reported by the modem itself (`+CME ERROR: <code>` and
//! `+CMS ERROR: <code>`) carry their numeric code, which is resolved to a
//! human readable description via the [`cme_code`] and [`cms_code`] tables.
//! Callers that only care about the broad category of a failure can branch
//! on [`ModemError::kind`].

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
    (
        $name:path,
        $self:ident =>
        $display:literal
        $(,
            $($arg:expr),+
        )?
    ) => {
        impl std::error::Error for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    $display
                    $(,
                        $($arg),+
                    )?
                )
            }
        }
    };
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and it's underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
///
/// ```compile_fail
/// # // This fails to compile because the macro is not exported.
/// error_enum!{
///     // This defines the enum and From/TryFrom between ThisError and A and B.
///     #[non_exhaustive]
///     pub enum ThisError {
///         VariantA(A),
///         VariantB(B),
///         // ...
///     }
/// }
/// ```
macro_rules! error_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $variant:ident($inner:path)
            ),+
            $(,)?
        }
    ) => {
        // Define the error enum itself
        $(
            #[$attr]
        )*
        #[allow(missing_docs)]
        pub enum $name {
            $(
                $variant($inner)
            ),+
        }

        impl std::error::Error for $name {}

        // Defer the display to the inner error type
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$variant(e) => e.fmt(f)
                    ),+
                }
            }
        }

        // Conversions with underlying errors
        $(
            impl From<$inner> for $name {
                fn from(other: $inner) -> Self {
                    $name::$variant(other)
                }
            }

            impl TryFrom<$name> for $inner {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $name::$variant(value) => Ok(value),
                        value => Err(value)
                    }
                }
            }
        )+
    };
}

mod code;
pub use code::*;

use std::{io, time::Duration};

/// The broad category of a [`ModemError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The modem reported a mobile equipment error (`+CME ERROR`).
    Cme,
    /// The modem reported a message service error (`+CMS ERROR`).
    Cms,
    /// The modem replied with a bare `ERROR`, without a code.
    Rejected,
    /// No complete response arrived in time.
    Timeout,
    /// The transport could not be written to.
    Write,
    /// The transport could not be read from.
    Read,
    /// A hard reset of the modem failed.
    Reset,
    /// No modem could be found on any of the usual serial devices.
    AutoDetect,
    /// A response did not match the expected grammar.
    Protocol,
    /// A message was addressed to the reserved loopback recipient.
    ReservedRecipient,
    /// An outgoing message was modified after it was sent.
    Frozen,
    /// The serial device is disconnected or in use by another process.
    SerialDeviceInUseOrDisconnected,
    /// Any other I/O failure while opening or configuring a transport.
    Io,
}

/// The modem reported a mobile equipment error (`+CME ERROR: <code>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CmeError(u16);

impl_error_display! {
    CmeError,
    self => "+CME ERROR {}: {}", self.0, self.description()
}

impl CmeError {
    /// Create a new error from the code reported by the modem.
    pub const fn new(code: u16) -> Self {
        CmeError(code)
    }

    /// Get the error code.
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get a human readable description of the error code.
    pub fn description(&self) -> String {
        describe("CME", self.0, cme_code::description(self.0))
    }
}

/// The modem reported a message service error (`+CMS ERROR: <code>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CmsError(u16);

impl_error_display! {
    CmsError,
    self => "+CMS ERROR {}: {}", self.0, self.description()
}

impl CmsError {
    /// Create a new error from the code reported by the modem.
    pub const fn new(code: u16) -> Self {
        CmsError(code)
    }

    /// Get the error code.
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get a human readable description of the error code.
    pub fn description(&self) -> String {
        describe("CMS", self.0, cms_code::description(self.0))
    }

    /// Whether the modem asked us to wait and try again (code `515`).
    pub const fn is_busy(&self) -> bool {
        self.0 == cms_code::PLEASE_WAIT
    }
}

fn describe(kind: &str, code: u16, known: Option<&'static str>) -> String {
    known.map_or_else(|| format!("unknown error [{kind}] [{code}]"), String::from)
}

/// The modem replied with a bare `ERROR`, or an error line it did not
/// attach a numeric code to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RejectedError(Box<str>);

impl_error_display! {
    RejectedError,
    self => "the modem rejected the command: {}", self.0
}

impl RejectedError {
    pub(crate) fn new<S: AsRef<str>>(line: S) -> Self {
        RejectedError(Box::from(line.as_ref()))
    }

    /// Get the line the modem replied with.
    pub fn line(&self) -> &str {
        &self.0
    }
}

/// No terminator was received within the read timeout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimeoutError(Duration);

impl_error_display! {
    TimeoutError,
    self => "the command timed out after {:?}", self.0
}

impl TimeoutError {
    pub(crate) const fn new(timeout: Duration) -> Self {
        TimeoutError(timeout)
    }

    /// Get the timeout that elapsed.
    pub const fn timeout(&self) -> Duration {
        self.0
    }
}

/// The modem couldn't be written to. It may have crashed or been unplugged.
#[derive(Debug)]
pub struct WriteError(io::Error);

impl_error_display! {
    WriteError,
    self => "the modem couldn't be written to, it may have crashed or been unplugged: {}", self.0
}

impl WriteError {
    pub(crate) const fn new(error: io::Error) -> Self {
        WriteError(error)
    }
}

impl AsRef<io::Error> for WriteError {
    fn as_ref(&self) -> &io::Error {
        &self.0
    }
}

/// The modem couldn't be read from. It may have crashed or been unplugged.
///
/// If there is no underlying I/O error, the transport reached the end of its
/// stream.
#[derive(Debug)]
pub struct ReadError(Option<io::Error>);

impl_error_display! {
    ReadError,
    self => "the modem couldn't be read from, it may have crashed or been unplugged: {}",
    self.0.as_ref().map_or_else(|| "end of stream".to_string(), ToString::to_string)
}

impl ReadError {
    pub(crate) const fn new(error: io::Error) -> Self {
        ReadError(Some(error))
    }

    pub(crate) const fn end_of_stream() -> Self {
        ReadError(None)
    }

    /// Get the underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        self.0.as_ref()
    }
}

/// The modem could not be reset.
#[derive(Debug)]
pub struct ResetError(Box<ModemError>);

impl_error_display! {
    ResetError,
    self => "the modem could not be reset: {}", self.0
}

impl ResetError {
    pub(crate) fn new(cause: ModemError) -> Self {
        ResetError(Box::new(cause))
    }

    /// Get the failure that prevented the reset.
    pub fn cause(&self) -> &ModemError {
        &self.0
    }
}

/// No modem could be auto-detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AutoDetectError;

impl_error_display! {
    AutoDetectError,
    self => "no modem could be auto-detected"
}

/// A response did not match any known grammar.
///
/// This is a local compatibility problem rather than a fault reported by
/// the modem. The raw response is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolError {
    message: Box<str>,
    response: Box<[String]>,
}

impl_error_display! {
    ProtocolError,
    self => "{}: {:?}", self.message, self.response
}

impl ProtocolError {
    pub(crate) fn new<S: AsRef<str>>(message: S, response: &[String]) -> Self {
        ProtocolError {
            message: Box::from(message.as_ref()),
            response: Box::from(response),
        }
    }

    /// Get a summary of what was wrong with the response.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the raw response lines.
    pub fn response(&self) -> &[String] {
        &self.response
    }
}

/// The message was addressed to the reserved loopback recipient and was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReservedRecipientError(Box<str>);

impl_error_display! {
    ReservedRecipientError,
    self => "not sending a message to the reserved recipient {}", self.0
}

impl ReservedRecipientError {
    pub(crate) fn new<S: AsRef<str>>(recipient: S) -> Self {
        ReservedRecipientError(Box::from(recipient.as_ref()))
    }
}

/// An outgoing message cannot be modified once it has been sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MessageFrozenError;

impl_error_display! {
    MessageFrozenError,
    self => "the message has already been sent and can no longer be modified"
}

/// The specified device is either disconnected or already in use by another process.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SerialDeviceInUseOrDisconnectedError(Box<str>);

impl_error_display! {
    SerialDeviceInUseOrDisconnectedError,
    self =>
    "the specified device is either disconnected or already in use by another process: {}", self.0
}

error_enum! {
    /// Any error returned by this library.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum ModemError {
        Cme(CmeError),
        Cms(CmsError),
        Rejected(RejectedError),
        Timeout(TimeoutError),
        Write(WriteError),
        Read(ReadError),
        Reset(ResetError),
        AutoDetect(AutoDetectError),
        Protocol(ProtocolError),
        ReservedRecipient(ReservedRecipientError),
        Frozen(MessageFrozenError),
        SerialDeviceInUseOrDisconnected(SerialDeviceInUseOrDisconnectedError),
        Io(std::io::Error),
    }
}

impl ModemError {
    /// Get the broad category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModemError::Cme(_) => ErrorKind::Cme,
            ModemError::Cms(_) => ErrorKind::Cms,
            ModemError::Rejected(_) => ErrorKind::Rejected,
            ModemError::Timeout(_) => ErrorKind::Timeout,
            ModemError::Write(_) => ErrorKind::Write,
            ModemError::Read(_) => ErrorKind::Read,
            ModemError::Reset(_) => ErrorKind::Reset,
            ModemError::AutoDetect(_) => ErrorKind::AutoDetect,
            ModemError::Protocol(_) => ErrorKind::Protocol,
            ModemError::ReservedRecipient(_) => ErrorKind::ReservedRecipient,
            ModemError::Frozen(_) => ErrorKind::Frozen,
            ModemError::SerialDeviceInUseOrDisconnected(_) => {
                ErrorKind::SerialDeviceInUseOrDisconnected
            }
            ModemError::Io(_) => ErrorKind::Io,
        }
    }

    /// Get the numeric code reported by the modem, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            ModemError::Cme(e) => Some(e.code()),
            ModemError::Cms(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Get a human readable description of the error.
    ///
    /// For modem reported errors this is the description of the error code,
    /// otherwise it is the error's display text.
    pub fn description(&self) -> String {
        match self {
            ModemError::Cme(e) => e.description(),
            ModemError::Cms(e) => e.description(),
            ModemError::Rejected(_) => "unknown error (unrecognized command?)".to_string(),
            other => other.to_string(),
        }
    }

    /// A convenience function for determining if the error is due to the
    /// modem not responding in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ModemError::Timeout(_))
    }

    /// Whether the modem itself reported the failure (as opposed to a
    /// transport or local failure).
    pub fn is_modem_reported(&self) -> bool {
        matches!(
            self,
            ModemError::Cme(_) | ModemError::Cms(_) | ModemError::Rejected(_)
        )
    }
}

impl From<serialport::Error> for ModemError {
    fn from(other: serialport::Error) -> Self {
        match other.kind() {
            serialport::ErrorKind::NoDevice => ModemError::SerialDeviceInUseOrDisconnected(
                SerialDeviceInUseOrDisconnectedError(other.description.into_boxed_str()),
            ),
            serialport::ErrorKind::InvalidInput => ModemError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                other.description,
            )),
            serialport::ErrorKind::Unknown => {
                ModemError::Io(io::Error::new(io::ErrorKind::Other, other.description))
            }
            serialport::ErrorKind::Io(kind) => ModemError::Io(io::Error::new(kind, other.description)),
        }
    }
}
