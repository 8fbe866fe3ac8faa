//! Queries about the modem, its SIM and the network it is attached to.

use super::Modem;
use crate::{
	backend::Backend,
	error::{ModemError, ProtocolError},
};
use regex::Regex;
use std::{sync::LazyLock, thread, time::Duration};

static BANDS_AVAILABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\+WMBS: \(([\d,]+)\),").expect("valid regex"));
static BAND: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\+WMBS: (\d+),").expect("valid regex"));
static SIGNAL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\+CSQ: (\d+),").expect("valid regex"));

/// `+CSQ` reports this (or more) when the strength is not known.
const SIGNAL_UNKNOWN: u8 = 99;

/// Information about the physical modem.
///
/// The contents of each field are entirely manufacturer dependent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HardwareInfo {
	/// As reported by `AT+CGMI`.
	pub manufacturer: String,
	/// As reported by `AT+CGMM`.
	pub model: String,
	/// As reported by `AT+CGMR`.
	pub revision: String,
	/// As reported by `AT+CGSN`.
	pub serial: String,
}

/// A frequency band (or pair of bands), as used by `AT+WMBS`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Band {
	/// 850 MHz
	Mhz850,
	/// 900 MHz
	Mhz900,
	/// 1800 MHz
	Mhz1800,
	/// 1900 MHz
	Mhz1900,
	/// 850 and 1900 MHz
	Mhz850And1900,
	/// Extended 900 and 1800 MHz
	Mhz900EAnd1800,
	/// Extended 900 and 1900 MHz
	Mhz900EAnd1900,
}

impl Band {
	const ALL: [Band; 7] = [
		Band::Mhz850,
		Band::Mhz900,
		Band::Mhz1800,
		Band::Mhz1900,
		Band::Mhz850And1900,
		Band::Mhz900EAnd1800,
		Band::Mhz900EAnd1900,
	];

	/// Get the band with the given `AT+WMBS` code.
	pub fn from_code(code: u8) -> Option<Band> {
		Band::ALL.get(usize::from(code)).copied()
	}

	/// Get the `AT+WMBS` code of the band.
	pub fn code(self) -> u8 {
		match self {
			Band::Mhz850 => 0,
			Band::Mhz900 => 1,
			Band::Mhz1800 => 2,
			Band::Mhz1900 => 3,
			Band::Mhz850And1900 => 4,
			Band::Mhz900EAnd1800 => 5,
			Band::Mhz900EAnd1900 => 6,
		}
	}

	/// Get the name of the band in MHz, such as `"900E/1800"`.
	pub fn name(self) -> &'static str {
		match self {
			Band::Mhz850 => "850",
			Band::Mhz900 => "900",
			Band::Mhz1800 => "1800",
			Band::Mhz1900 => "1900",
			Band::Mhz850And1900 => "850/1900",
			Band::Mhz900EAnd1800 => "900E/1800",
			Band::Mhz900EAnd1900 => "900E/1900",
		}
	}

	/// Get the band with the given name, such as `"850/1900"`.
	pub fn from_name(name: &str) -> Option<Band> {
		Band::ALL.into_iter().find(|band| band.name() == name)
	}
}

impl std::fmt::Display for Band {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} MHz", self.name())
	}
}

/// Regions of the world and the band used there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BandArea {
	/// The United States.
	Usa,
	/// Africa.
	Africa,
	/// Europe.
	Europe,
	/// Asia.
	Asia,
	/// The Middle East.
	MiddleEast,
}

impl BandArea {
	/// Get the band used in the area.
	pub fn band(self) -> Band {
		match self {
			BandArea::Usa => Band::Mhz850And1900,
			BandArea::Africa | BandArea::Europe | BandArea::Asia | BandArea::MiddleEast => {
				Band::Mhz900EAnd1800
			}
		}
	}
}

impl From<BandArea> for Band {
	fn from(other: BandArea) -> Self {
		other.band()
	}
}

fn unexpected(what: &str, line: String) -> ModemError {
	ProtocolError::new(format!("not {what} data"), &[line]).into()
}

impl<B: Backend> Modem<B> {
	/// Get information about the physical modem.
	pub fn hardware(&self) -> Result<HardwareInfo, ModemError> {
		Ok(HardwareInfo {
			manufacturer: self.query("AT+CGMI")?,
			model: self.query("AT+CGMM")?,
			revision: self.query("AT+CGMR")?,
			serial: self.query("AT+CGSN")?,
		})
	}

	/// Get the bands the modem supports.
	///
	/// Codes the modem reports that don't correspond to a known [`Band`] are
	/// left out.
	pub fn bands_available(&self) -> Result<Vec<Band>, ModemError> {
		let line = self.query("AT+WMBS=?")?;
		let Some(caps) = BANDS_AVAILABLE.captures(&line) else {
			return Err(unexpected("WMBS", line));
		};
		Ok(caps[1]
			.split(',')
			.filter_map(|code| code.parse().ok().and_then(Band::from_code))
			.collect())
	}

	/// Get the band currently used by the modem.
	///
	/// Returns `None` if the modem reports a band that isn't known.
	pub fn band(&self) -> Result<Option<Band>, ModemError> {
		let line = self.query("AT+WMBS?")?;
		let Some(caps) = BAND.captures(&line) else {
			return Err(unexpected("WMBS", line));
		};
		Ok(caps[1].parse().ok().and_then(Band::from_code))
	}

	/// Switch the modem to another band, immediately.
	///
	/// A [`BandArea`] may be given in place of a band.
	pub fn set_band<T: Into<Band>>(&self, band: T) -> Result<(), ModemError> {
		let band = band.into();
		log::info!("{} switching to the {band} band", self.label);
		self.command(&format!("AT+WMBS={},1", band.code()))
			.map(drop)
	}

	/// Whether the SIM is waiting for a PIN.
	pub fn pin_required(&self) -> Result<bool, ModemError> {
		let lines = self.command("AT+CPIN?")?;
		Ok(!lines.iter().any(|line| line == "+CPIN: READY"))
	}

	/// Provide the SIM PIN, if it is required.
	///
	/// Returns whether the SIM is now unlocked. A PIN the modem rejects is
	/// not an error.
	pub fn use_pin(&self, pin: &str) -> Result<bool, ModemError> {
		if !self.pin_required()? {
			return Ok(true);
		}
		match self.command(&format!("AT+CPIN={pin}")) {
			Ok(_) => Ok(true),
			Err(e) if e.is_modem_reported() => {
				log::warn!("{} PIN rejected: {e}", self.label);
				Ok(false)
			}
			Err(e) => Err(e),
		}
	}

	/// Get the signal strength of the network (0 to 98), or `None` if it
	/// isn't known.
	pub fn signal_strength(&self) -> Result<Option<u8>, ModemError> {
		let line = self.query("AT+CSQ")?;
		let Some(caps) = SIGNAL.captures(&line) else {
			return Err(unexpected("CSQ", line));
		};
		Ok(caps[1]
			.parse::<u8>()
			.ok()
			.filter(|&strength| strength < SIGNAL_UNKNOWN))
	}

	/// Block until the modem reports a signal strength, and return it.
	///
	/// It's a good idea to call this before trying to send or receive
	/// anything.
	pub fn wait_for_network(&self) -> Result<u8, ModemError> {
		loop {
			if let Some(strength) = self.signal_strength()? {
				return Ok(strength);
			}
			log::debug!("{} waiting for the network", self.label);
			thread::sleep(Duration::from_secs(1));
		}
	}
}
