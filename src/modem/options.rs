//! Types defining the different options when opening a modem.

use super::Modem;
use crate::{
    backend::{Backend, Serial},
    error::{AutoDetectError, ModemError},
};
use serialport as sp;
use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

/// The device name prefixes tried, in order, by [`ModemOptions::open_auto`].
const AUTO_DETECT_PREFIXES: [&str; 3] = ["/dev/ttyS", "/dev/ttyUSB", "/dev/ttyACM"];
/// The highest device number tried by [`ModemOptions::open_auto`].
const AUTO_DETECT_MAX_INDEX: u8 = 8;

/// How hard a [`Modem`] tries before giving up on a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Policy {
    pub command_delay: Duration,
    pub retry_limit: u32,
    pub reset_on_failure: bool,
    pub backoff_unit: Duration,
    pub busy_retry_delay: Duration,
}

impl Policy {
    /// The sleep before retry number `attempt` (starting at 1): half of
    /// `2^attempt` backoff units.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
            / 2
    }
}

/// Options for configuring and opening a modem.
///
/// ## Example
///
/// ```rust
/// # use gsmlink::ModemOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let modem = ModemOptions::new()
///     .read_timeout(Duration::from_secs(5))
///     .retry_limit(2)
///     .label("front desk")
///     .open("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModemOptions {
    /// The custom baud rate
    baud_rate: u32,
    /// How long to wait for each response line.
    read_timeout: Duration,
    /// How long each individual read from the backend may block.
    byte_timeout: Duration,
    /// Retry, reset and delay settings.
    policy: Policy,
    /// The session label used in logs.
    label: Option<String>,
}

impl ModemOptions {
    /// The default baud rate: 9,600.
    pub const DEFAULT_BAUD_RATE: u32 = 9_600;

    /// Create a blank set of options ready for configuration.
    ///
    /// Equivalent to [`default`](ModemOptions::default).
    pub fn new() -> Self {
        ModemOptions {
            baud_rate: ModemOptions::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(10),
            byte_timeout: Duration::from_millis(100),
            policy: Policy {
                command_delay: Duration::from_millis(100),
                retry_limit: 4,
                reset_on_failure: true,
                backoff_unit: Duration::from_secs(1),
                busy_retry_delay: Duration::from_secs(2),
            },
            label: None,
        }
    }

    /// Set a custom baud rate.
    ///
    /// The default is 9,600.
    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set how long to wait for each line of a response.
    ///
    /// The default is 10 seconds.
    pub fn read_timeout(&mut self, duration: Duration) -> &mut Self {
        self.read_timeout = duration;
        self
    }

    /// Set how long a single read from the backend may block.
    ///
    /// This only affects how promptly the read timeout is noticed. The
    /// default is 100 milliseconds.
    pub fn byte_timeout(&mut self, duration: Duration) -> &mut Self {
        self.byte_timeout = duration;
        self
    }

    /// Set the pause after every command, which gives the modem time to settle.
    ///
    /// The default is 100 milliseconds.
    pub fn command_delay(&mut self, duration: Duration) -> &mut Self {
        self.policy.command_delay = duration;
        self
    }

    /// Set how many times a failed command is retried.
    ///
    /// The default is 4 (so 5 attempts in total).
    pub fn retry_limit(&mut self, limit: u32) -> &mut Self {
        self.policy.retry_limit = limit;
        self
    }

    /// Set whether the modem is hard reset (`AT+CFUN=1`) once the retries of
    /// a command are exhausted.
    ///
    /// The default is `true`.
    pub fn reset_on_failure(&mut self, reset: bool) -> &mut Self {
        self.policy.reset_on_failure = reset;
        self
    }

    /// Set the unit of the exponential backoff between retries.
    ///
    /// Retry `n` waits `unit * 2^n / 2`. The default is 1 second.
    pub fn backoff_unit(&mut self, unit: Duration) -> &mut Self {
        self.policy.backoff_unit = unit;
        self
    }

    /// Set the pause before re-issuing a command the modem was too busy for
    /// (`+CMS ERROR: 515`).
    ///
    /// The default is 2 seconds.
    pub fn busy_retry_delay(&mut self, duration: Duration) -> &mut Self {
        self.policy.busy_retry_delay = duration;
        self
    }

    /// Set the label that identifies this modem in log messages.
    ///
    /// The default is the backend's name.
    pub fn label<S: Into<String>>(&mut self, label: S) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Open a [`Serial`] port at the specified path.
    fn open_serial_port(&self, path: &str) -> Result<Serial, ModemError> {
        // The baud rate passed to `new` is ignored by some platforms, so it
        // is also set explicitly below.
        sp::new(path, ModemOptions::DEFAULT_BAUD_RATE)
            .data_bits(sp::DataBits::Eight)
            .parity(sp::Parity::None)
            .flow_control(sp::FlowControl::None)
            .stop_bits(sp::StopBits::One)
            .timeout(self.byte_timeout)
            .baud_rate(self.baud_rate)
            .open_native()
            .map(Serial)
            .map_err(Into::into)
    }

    /// Open and initialize the modem on the serial port at the specified path.
    pub fn open(&self, path: &str) -> Result<Modem<Serial>, ModemError> {
        self.open_backend(self.open_serial_port(path)?)
    }

    /// Open and initialize the modem on the serial port at the specified path.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch.
    /// [`ModemOptions::open`] should generally be used instead, except when
    /// the type of the underlying backend may not be known at compile time.
    pub fn open_dyn(&self, path: &str) -> Result<Modem<Box<dyn Backend + Send>>, ModemError> {
        self.open_backend(Box::new(self.open_serial_port(path)?) as Box<dyn Backend + Send>)
    }

    /// Open and initialize the first modem found on one of the usual serial
    /// devices.
    ///
    /// `/dev/ttyS<n>`, `/dev/ttyUSB<n>` and `/dev/ttyACM<n>` are tried for
    /// `n` from 0 to 8. The first device that can be opened is used, whether
    /// or not a modem is actually attached to it.
    pub fn open_auto(&self) -> Result<Modem<Serial>, ModemError> {
        for n in 0..=AUTO_DETECT_MAX_INDEX {
            for prefix in AUTO_DETECT_PREFIXES {
                let path = format!("{prefix}{n}");
                match self.open_serial_port(&path) {
                    Ok(port) => {
                        log::info!("auto-detected a serial device at {path}");
                        return self.open_backend(port);
                    }
                    Err(e) => log::debug!("{path}: {e}"),
                }
            }
        }
        Err(AutoDetectError.into())
    }

    /// Open and initialize a modem exposed by a serial-to-TCP bridge.
    pub fn open_tcp<A: ToSocketAddrs>(&self, address: A) -> Result<Modem<TcpStream>, ModemError> {
        self.open_backend(TcpStream::connect(address)?)
    }

    /// Initialize the modem connected to an already open backend.
    pub fn open_backend<B: Backend>(&self, backend: B) -> Result<Modem<B>, ModemError> {
        Modem::from_backend(
            backend,
            self.label.clone(),
            self.read_timeout,
            self.byte_timeout,
            self.policy,
        )
    }
}

impl Default for ModemOptions {
    fn default() -> Self {
        ModemOptions::new()
    }
}
