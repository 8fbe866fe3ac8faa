//! Parsing of the timestamps modems attach to messages.
//!
//! A modem reports the time a message was sent by the service centre as
//! `YY/MM/DD,HH:MM:SS±ZZ`, where `ZZ` is the offset from UTC in *quarter
//! hours*. The offset is reduced to whole hours, dropping any remainder.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::ProtocolError;

const LAYOUT: &str = "%y/%m/%d,%H:%M:%S";
const SECONDS_PER_HOUR: i32 = 60 * 60;
const QUARTER_HOURS_PER_HOUR: i32 = 4;
/// The largest offset in the world is +14:00.
const MAX_QUARTER_HOURS: i32 = 14 * QUARTER_HOURS_PER_HOUR;

/// Parse a modem timestamp, such as `09/03/04,21:59:31-20`.
///
/// The trailing offset is interpreted in quarter hours and truncated to
/// whole hours, so the example above is five hours behind UTC and `+22` is
/// five hours ahead. A timestamp without an offset is taken to be in UTC.
/// Offsets further than 14 hours from UTC are rejected.
pub fn parse(timestamp: &str) -> Result<DateTime<FixedOffset>, ProtocolError> {
	let invalid = |why: &str| {
		ProtocolError::new(
			format!("invalid timestamp ({why})"),
			&[timestamp.to_string()],
		)
	};
	let timestamp = timestamp.trim();
	let (local, offset) = match timestamp.rfind(['+', '-']) {
		Some(index) => timestamp.split_at(index),
		None => (timestamp, "+0"),
	};
	let local = NaiveDateTime::parse_from_str(local, LAYOUT).map_err(|_| invalid("layout"))?;
	let quarter_hours: i32 = offset
		.trim_start_matches('+')
		.parse()
		.map_err(|_| invalid("offset"))?;
	if quarter_hours.abs() > MAX_QUARTER_HOURS {
		return Err(invalid("offset out of range"));
	}
	let hours = quarter_hours / QUARTER_HOURS_PER_HOUR;
	let offset = FixedOffset::east_opt(hours * SECONDS_PER_HOUR)
		.ok_or_else(|| invalid("offset out of range"))?;
	local
		.and_local_timezone(offset)
		.single()
		.ok_or_else(|| invalid("ambiguous"))
}
