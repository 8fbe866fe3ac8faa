//! Parsing of stored message listings (`AT+CMGL`).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProtocolError;
use crate::message::IncomingMessage;
use crate::timestamp;

static METADATA: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"^\+CMGL: (\d+),"(.+?)","(.+?)",*?,"(.+?)".*?$"#).expect("valid regex")
});

const METADATA_PREFIX: &str = "+CMGL:";

/// The status filter used when listing stored messages unless another is
/// configured.
pub const DEFAULT_STATUS: &str = "REC UNREAD";

/// Split a listing into messages.
///
/// Each `+CMGL:` metadata line is followed by the lines of its message body,
/// which runs until the next metadata line or the end of the listing. A
/// trailing `OK` is ignored. Unlike new-message notifications, any line that
/// can't be parsed fails the whole listing.
pub(crate) fn parse_listing(lines: &[String]) -> Result<Vec<IncomingMessage>, ProtocolError> {
	let lines = match lines.split_last() {
		Some((last, rest)) if last == "OK" => rest,
		_ => lines,
	};
	let mut messages = Vec::new();
	let mut n = 0;
	while n < lines.len() {
		let Some(caps) = METADATA.captures(&lines[n]) else {
			return Err(ProtocolError::new(
				format!("couldn't parse CMGL data: {}", lines[n]),
				lines,
			));
		};
		let end = lines[n + 1..]
			.iter()
			.position(|line| line.starts_with(METADATA_PREFIX))
			.map_or(lines.len(), |offset| n + 1 + offset);
		let text = lines[n + 1..end].join("\n");
		let text = text.trim();
		let sender = &caps[3];
		let sent_at = timestamp::parse(&caps[4])?;
		log::info!(
			"fetched stored message {} ({}) from {sender}: {text:?}",
			&caps[1],
			&caps[2]
		);
		messages.push(IncomingMessage::new(sender, sent_at, text));
		n = end;
	}
	Ok(messages)
}

#[cfg(test)]
mod test {
	use super::*;

	fn lines(raw: &[&str]) -> Vec<String> {
		raw.iter().map(ToString::to_string).collect()
	}

	#[test]
	fn bodies_run_until_the_next_metadata_line() {
		let listing = lines(&[
			"+CMGL: 0,\"REC UNREAD\",\"+13364130840\",,\"09/03/04,21:59:31-20\"",
			"line1",
			"line2",
			"+CMGL: 1,\"REC UNREAD\",\"+13364130841\",,\"09/03/04,22:00:00-20\"",
			"line3",
			"OK",
		]);
		let messages = parse_listing(&listing).unwrap();
		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0].sender(), "+13364130840");
		assert_eq!(messages[0].text(), "line1\nline2");
		assert_eq!(messages[1].sender(), "+13364130841");
		assert_eq!(messages[1].text(), "line3");
	}

	#[test]
	fn empty_listing() {
		assert!(parse_listing(&lines(&["OK"])).unwrap().is_empty());
		assert!(parse_listing(&[]).unwrap().is_empty());
	}

	#[test]
	fn message_without_body() {
		let listing = lines(&[
			"+CMGL: 4,\"REC READ\",\"+1555\",,\"09/03/04,21:59:31+00\"",
			"OK",
		]);
		let messages = parse_listing(&listing).unwrap();
		assert_eq!(messages[0].text(), "");
	}

	#[test]
	fn unparseable_lines_fail_the_listing() {
		let err = parse_listing(&lines(&["garbage", "OK"])).unwrap_err();
		assert_eq!(err.response(), &["garbage".to_string()]);

		let listing = lines(&["+CMGL: 0,\"REC UNREAD\",\"+1555\",,\"yesterday\"", "hi"]);
		assert!(parse_listing(&listing).is_err());
	}
}
