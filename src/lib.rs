//! A library for sending and receiving SMS messages through GSM modems.
//!
//! Modems are driven over a serial port (or a serial-to-TCP bridge) using
//! the text mode AT command set. A [`Modem`] takes care of the protocol's
//! rough edges: unsolicited status lines mixed into responses, modems that
//! are busy or silently hang, new-message notifications that arrive in the
//! middle of unrelated commands and messages that are split into several
//! parts. Failed commands are retried with exponential backoff and, as a
//! last resort, the modem is reset.
//!
//! A modem can be shared between threads. Commands from different threads
//! are serialized so that every response is returned to the thread that
//! issued the command.
//!
//! ## Example
//!
//! ```rust
//! # use gsmlink::{Modem, ReceiveOptions};
//! # use std::sync::Arc;
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let modem = Arc::new(Modem::open("/dev/ttyUSB0")?);
//! modem.wait_for_network()?;
//!
//! // Deliver incoming messages on a background thread.
//! Modem::receive(
//!     &modem,
//!     |msg| {
//!         println!("{} at {}: {}", msg.sender(), msg.sent_at(), msg.text());
//!         Ok(())
//!     },
//!     &ReceiveOptions::new(),
//! )?;
//!
//! modem.send_sms("+15551234567", "Hello!")?;
//! # Ok(())
//! # }
//! ```
//!
//! Errors reported by the modem keep their numeric code and a description,
//! see the [`error`] module.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(all(doc, feature = "doc_cfg"), feature(doc_cfg))]

pub mod backend;
pub mod error;
mod inbox;
mod lock;
mod message;
mod modem;
mod port;
mod receiver;
mod stored;
pub mod timestamp;
mod unsolicited;

pub use inbox::Inbox;
pub use message::{IncomingMessage, OutgoingMessage};
pub use modem::{Band, BandArea, HardwareInfo, Modem, ModemOptions, LOOPBACK_RECIPIENT};
pub use receiver::{CallbackError, ReceiveOptions, Receiver};
