use super::*;
use crate::{
	backend::{Mock, Request},
	error::ErrorKind,
	message::IncomingMessage,
	receiver::{ReceiveOptions, Receiver},
};
use std::{
	io,
	sync::{mpsc, Arc, Mutex},
	time::Duration,
};

static_assertions::assert_impl_all!(Modem<Mock>: Send, Sync);

const INIT: [&str; 4] = ["ATE0", "AT+CMEE=1", "AT+WIND=0", "AT+CMGF=1"];

/// Encode response lines the way a modem frames them.
fn reply(lines: &[&str]) -> Vec<u8> {
	lines
		.iter()
		.flat_map(|line| port::encode(&format!("\r\n{line}\r\n")))
		.collect()
}

fn ok() -> Vec<u8> {
	reply(&["OK"])
}

/// Options that never sleep and give up on silence quickly.
fn options() -> ModemOptions {
	let mut options = ModemOptions::new();
	options
		.read_timeout(Duration::from_millis(200))
		.byte_timeout(Duration::ZERO)
		.command_delay(Duration::ZERO)
		.backoff_unit(Duration::ZERO)
		.busy_retry_delay(Duration::ZERO)
		.label("test");
	options
}

/// Answers the message submission handshake, and everything else with OK.
fn sms_script(request: &Request) -> Vec<u8> {
	match request {
		Request::Command(cmd) if cmd.starts_with("AT+CMGS=") => b"\r\n> ".to_vec(),
		Request::Body(_) => reply(&["+CMGS: 7", "OK"]),
		Request::Cancel(_) => Vec::new(),
		Request::Command(_) => ok(),
	}
}

/// The commands written after initialization.
fn commands_after_init(mock: &Mock) -> Vec<String> {
	mock.commands().split_off(INIT.len())
}

fn requests_after_init(mock: &Mock) -> Vec<Request> {
	mock.requests().split_off(INIT.len())
}

fn cmd(text: &str) -> Request {
	Request::Command(text.to_string())
}

#[test]
fn initialization_sequence() {
	let mock = Mock::new();
	let modem = options().open_backend(mock.clone()).unwrap();
	assert_eq!(mock.commands(), INIT);
	assert_eq!(modem.label(), "test");
	assert_eq!(modem.retry_limit(), 4);
	assert!(modem.reset_on_failure());
}

#[test]
fn optional_setup_commands_may_fail() {
	let mock = Mock::with_script(|request| match request.text() {
		"ATE0" | "AT+WIND=0" => reply(&["ERROR"]),
		_ => ok(),
	});
	let mut options = options();
	options.retry_limit(0).reset_on_failure(false);
	options.open_backend(mock.clone()).unwrap();
	assert_eq!(mock.commands(), INIT);
}

#[test]
fn text_mode_is_mandatory() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CMGF=1" => reply(&["+CMS ERROR: 303"]),
		_ => ok(),
	});
	let mut options = options();
	options.retry_limit(1).reset_on_failure(false);
	let err = options.open_backend(mock.clone()).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Cms);
	assert_eq!(err.code(), Some(303));
	assert_eq!(
		mock.commands(),
		vec!["ATE0", "AT+CMEE=1", "AT+WIND=0", "AT+CMGF=1", "AT+CMGF=1"]
	);
}

#[test]
fn modem_reported_errors_are_classified() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CLCK" => reply(&["+CME ERROR: 11"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	let err = modem.execute("AT+CLCK").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Cme);
	assert_eq!(err.code(), Some(11));
	assert_eq!(err.description(), "SIM PIN required");
}

#[test]
fn busy_modem_is_waited_out() {
	let mut busy = 2;
	let mock = Mock::with_script(move |request| match request.text() {
		"AT+CMGD=1" if busy > 0 => {
			busy -= 1;
			reply(&["+CMS ERROR: 515"])
		}
		_ => ok(),
	});
	let mut options = options();
	options.retry_limit(0).reset_on_failure(false);
	let modem = options.open_backend(mock.clone()).unwrap();
	assert_eq!(modem.execute("AT+CMGD=1").unwrap(), vec!["OK"]);
	assert_eq!(commands_after_init(&mock), vec!["AT+CMGD=1"; 3]);
}

fn always_failing() -> Mock {
	Mock::with_script(|request| match request.text() {
		"AT+FAIL" => reply(&["ERROR"]),
		_ => ok(),
	})
}

#[test]
fn failed_commands_are_retried_then_the_modem_is_reset() {
	let mock = always_failing();
	let modem = options().open_backend(mock.clone()).unwrap();
	let err = modem.command("AT+FAIL").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Rejected);
	let mut expected = vec!["AT+FAIL"; 5];
	expected.push("AT+CFUN=1");
	expected.push("AT+FAIL");
	assert_eq!(commands_after_init(&mock), expected);
}

#[test]
fn failed_commands_without_reset() {
	let mock = always_failing();
	let mut options = options();
	options.reset_on_failure(false);
	let modem = options.open_backend(mock.clone()).unwrap();
	assert!(modem.command("AT+FAIL").is_err());
	assert_eq!(commands_after_init(&mock), vec!["AT+FAIL"; 5]);
}

#[test]
fn failed_reset_returns_the_original_error() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+FAIL" => reply(&["+CME ERROR: 30"]),
		"AT+CFUN=1" => reply(&["ERROR"]),
		_ => ok(),
	});
	let mut options = options();
	options.retry_limit(1);
	let modem = options.open_backend(mock.clone()).unwrap();
	let err = modem.command("AT+FAIL").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Cme);
	assert_eq!(err.code(), Some(30));
	assert_eq!(
		commands_after_init(&mock),
		vec!["AT+FAIL", "AT+FAIL", "AT+CFUN=1"]
	);

	let err = ModemError::from(modem.reset().unwrap_err());
	assert_eq!(err.kind(), ErrorKind::Reset);
}

#[test]
fn command_recovers_after_a_transient_failure() {
	let mut failures = 2;
	let mock = Mock::with_script(move |request| match request.text() {
		"AT+FLAKY" if failures > 0 => {
			failures -= 1;
			reply(&["ERROR"])
		}
		_ => ok(),
	});
	let modem = options().open_backend(mock.clone()).unwrap();
	assert_eq!(modem.command("AT+FLAKY").unwrap(), vec!["OK"]);
	assert_eq!(commands_after_init(&mock), vec!["AT+FLAKY"; 3]);
}

#[test]
fn try_command_never_fails() {
	let mock = always_failing();
	for (retries, reset) in [(0, false), (2, false), (1, true)] {
		let mut options = options();
		options.retry_limit(retries).reset_on_failure(reset);
		let modem = options.open_backend(mock.clone()).unwrap();
		assert_eq!(modem.try_command("AT+FAIL"), None);
		assert_eq!(modem.try_command("AT+FAIL"), None);
	}
}

#[test]
fn query_requires_a_single_line() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CSQ" => reply(&["+CSQ: 23,0", "OK"]),
		"AT+CGMI" => reply(&["Acme", "Modems", "OK"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	assert_eq!(modem.query("AT+CSQ").unwrap(), "+CSQ: 23,0");
	assert_eq!(modem.signal_strength().unwrap(), Some(23));

	let err = modem.query("AT+CGMI").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Protocol);
	let err = ProtocolError::try_from(err).unwrap();
	assert_eq!(err.response(), &["Acme", "Modems", "OK"]);

	let err = modem.query("AT").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn unknown_signal_strength() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CSQ" => reply(&["+CSQ: 99,99", "OK"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	assert_eq!(modem.signal_strength().unwrap(), None);
}

#[test]
fn hardware_and_bands() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CGMI" => reply(&["Multitech", "OK"]),
		"AT+CGMM" => reply(&["MTCBA-G-F4", "OK"]),
		"AT+CGMR" => reply(&["123456789", "OK"]),
		"AT+CGSN" => reply(&["ABCD", "OK"]),
		"AT+WMBS=?" => reply(&["+WMBS: (0,3,4,9),(0-1)", "OK"]),
		"AT+WMBS?" => reply(&["+WMBS: 5,0", "OK"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock.clone()).unwrap();
	assert_eq!(
		modem.hardware().unwrap(),
		HardwareInfo {
			manufacturer: "Multitech".to_string(),
			model: "MTCBA-G-F4".to_string(),
			revision: "123456789".to_string(),
			serial: "ABCD".to_string(),
		}
	);
	assert_eq!(
		modem.bands_available().unwrap(),
		vec![Band::Mhz850, Band::Mhz1900, Band::Mhz850And1900]
	);
	assert_eq!(modem.band().unwrap(), Some(Band::Mhz900EAnd1800));
	modem.set_band(BandArea::Usa).unwrap();
	assert_eq!(mock.commands().last().unwrap(), "AT+WMBS=4,1");
}

#[test]
fn unexpected_band_data() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+WMBS?" => reply(&["+WMBS: none", "OK"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	assert_eq!(modem.band().unwrap_err().kind(), ErrorKind::Protocol);
}

#[test]
fn sim_pin() {
	let state = Arc::new(Mutex::new(false));
	let mock = Mock::with_script(move |request| {
		let mut unlocked = state.lock().unwrap();
		match request.text() {
			// The modem never sends OK after the PIN status.
			"AT+CPIN?" if *unlocked => reply(&["+CPIN: READY"]),
			"AT+CPIN?" => reply(&["+CPIN: SIM PIN"]),
			"AT+CPIN=0000" => reply(&["+CME ERROR: 16"]),
			"AT+CPIN=1234" => {
				*unlocked = true;
				ok()
			}
			_ => ok(),
		}
	});
	let mut options = options();
	options.retry_limit(0).reset_on_failure(false);
	let modem = options.open_backend(mock.clone()).unwrap();
	assert!(modem.pin_required().unwrap());
	assert!(!modem.use_pin("0000").unwrap());
	assert!(modem.use_pin("1234").unwrap());
	assert!(!modem.pin_required().unwrap());
	assert!(modem.use_pin("1234").unwrap());
	assert_eq!(
		commands_after_init(&mock),
		vec![
			"AT+CPIN?",
			"AT+CPIN?",
			"AT+CPIN=0000",
			"AT+CPIN?",
			"AT+CPIN=1234",
			"AT+CPIN?",
			"AT+CPIN?",
		]
	);
}

#[test]
fn notifications_are_removed_from_responses() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT" => reply(&[
			"+CREG: 1",
			"+CMT: \"+15550001\",,\"09/03/04,21:59:31-20\"",
			"hello",
			"+WIND: 4",
			"OK",
		]),
		_ => ok(),
	});
	let modem = options().open_backend(mock.clone()).unwrap();
	assert_eq!(modem.execute("AT").unwrap(), vec!["OK"]);
	assert_eq!(commands_after_init(&mock), vec!["AT", "AT+CNMA"]);
	let messages = modem.inbox().take_all();
	assert_eq!(messages.len(), 1);
	assert_eq!(messages[0].sender(), "+15550001");
	assert_eq!(messages[0].text(), "hello");
	assert_eq!(messages[0].sent_at().offset().local_minus_utc(), -5 * 3600);
}

#[test]
fn rejected_acknowledgement_is_not_fatal() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT" => reply(&["+CMT: \"+15550001\",,\"09/03/04,21:59:31+00\"", "hi", "OK"]),
		"AT+CNMA" => reply(&["+CMS ERROR: 340"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	assert_eq!(modem.execute("AT").unwrap(), vec!["OK"]);
	assert_eq!(modem.inbox().len(), 1);
}

#[test]
fn multipart_messages_across_responses() {
	let mut part = 0;
	let mock = Mock::with_script(move |request| match request.text() {
		"AT" => {
			part += 1;
			let header = "+CMT: \"+15550001\",,\"09/03/04,21:59:31+00\"";
			match part {
				1 => reply(&[header, "\u{82}@\u{0}\u{3}\u{2}\u{0}\u{1}Hello, ", "OK"]),
				_ => reply(&[header, "\u{82}@\u{0}\u{3}\u{2}\u{ad}\u{2}world", "OK"]),
			}
		}
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	modem.execute("AT").unwrap();
	assert!(modem.inbox().is_empty());
	modem.execute("AT").unwrap();
	let messages = modem.inbox().take_all();
	assert_eq!(messages.len(), 1);
	// The trailing space of the first fragment is not part of the line.
	assert_eq!(messages[0].text(), "Hello,world");
}

#[test]
fn stored_messages_are_fetched() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+CMGL=\"REC UNREAD\"" => reply(&[
			"+CMGL: 0,\"REC UNREAD\",\"+13364130840\",,\"09/03/04,21:59:31-20\"",
			"line1",
			"line2",
			"+CMGL: 1,\"REC UNREAD\",\"+13364130841\",,\"09/03/04,22:00:00-20\"",
			"line3",
			"OK",
		]),
		"AT+CMGL=\"ALL\"" => reply(&["+CMGL: nonsense", "OK"]),
		_ => ok(),
	});
	let modem = options().open_backend(mock).unwrap();
	assert_eq!(modem.fetch_stored_messages().unwrap(), 2);
	let texts: Vec<_> = modem
		.inbox()
		.take_all()
		.into_iter()
		.map(|m| m.text().to_string())
		.collect();
	assert_eq!(texts, vec!["line1\nline2", "line3"]);

	let err = modem.fetch_stored_messages_with_status("ALL").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Protocol);
	assert!(modem.inbox().is_empty());
}

#[test]
fn send_sms() {
	let mock = Mock::with_script(sms_script);
	let modem = options().open_backend(mock.clone()).unwrap();
	modem.send_sms("+15550001", "hello").unwrap();
	assert_eq!(
		requests_after_init(&mock),
		vec![
			cmd("AT+CMGS=\"+15550001\""),
			Request::Body("hello".to_string()),
		]
	);
}

#[test]
fn failed_submission_leaves_prompt_mode_and_retries() {
	let mut failures = 1;
	let mock = Mock::with_script(move |request| match request {
		Request::Body(_) if failures > 0 => {
			failures -= 1;
			reply(&["+CMS ERROR: 500"])
		}
		other => sms_script(other),
	});
	let modem = options().open_backend(mock.clone()).unwrap();
	assert!(modem.try_send_sms("+15550001", "hello"));
	assert_eq!(
		requests_after_init(&mock),
		vec![
			cmd("AT+CMGS=\"+15550001\""),
			Request::Body("hello".to_string()),
			Request::Cancel(String::new()),
			cmd("AT+CMGS=\"+15550001\""),
			Request::Body("hello".to_string()),
		]
	);
}

#[test]
fn submission_gives_up_after_the_retry_limit() {
	let mock = Mock::with_script(|request| match request {
		Request::Command(cmd) if cmd.starts_with("AT+CMGS=") => reply(&["+CMS ERROR: 330"]),
		other => sms_script(other),
	});
	let mut options = options();
	options.retry_limit(2);
	let modem = options.open_backend(mock.clone()).unwrap();
	let err = modem.send_sms("+15550001", "hello").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Cms);
	assert_eq!(err.code(), Some(330));
	let attempt = [cmd("AT+CMGS=\"+15550001\""), Request::Cancel(String::new())];
	assert_eq!(
		requests_after_init(&mock),
		[attempt.clone(), attempt.clone(), attempt].concat()
	);
	assert!(!modem.try_send_sms("+15550001", "hello"));
}

#[test]
fn silent_prompt_times_out_and_is_escaped() {
	let mock = Mock::with_script(|request| match request {
		Request::Command(cmd) if cmd.starts_with("AT+CMGS=") => Vec::new(),
		other => sms_script(other),
	});
	let mut options = options();
	options.retry_limit(0);
	let modem = options.open_backend(mock.clone()).unwrap();
	let err = modem.send_sms("+15550001", "hello").unwrap_err();
	assert!(err.is_timeout());
	assert_eq!(
		requests_after_init(&mock),
		vec![cmd("AT+CMGS=\"+15550001\""), Request::Cancel(String::new())]
	);
}

#[test]
fn loopback_recipient_is_never_sent_to() {
	let mock = Mock::with_script(sms_script);
	let modem = options().open_backend(mock.clone()).unwrap();
	let err = modem.send_sms(LOOPBACK_RECIPIENT, "test").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ReservedRecipient);
	assert!(!modem.try_send_sms(LOOPBACK_RECIPIENT, "test"));
	assert!(requests_after_init(&mock).is_empty());
}

#[test]
fn outgoing_message_is_frozen_once_sent() {
	let mock = Mock::with_script(sms_script);
	let modem = options().open_backend(mock).unwrap();
	let mut message = OutgoingMessage::new("+15550001", "hi");
	message.set_text("hello").unwrap();
	modem.send(&mut message).unwrap();
	assert!(message.sent_at().is_some());
	assert_eq!(message.set_text("again"), Err(MessageFrozenError));
	let err = modem.send(&mut message).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Frozen);
}

#[test]
fn transport_failures() {
	let mock = Mock::with_script(|request| match request.text() {
		"AT+HANG" => Vec::new(),
		_ => ok(),
	});
	let mut options = options();
	options.retry_limit(0).reset_on_failure(false);
	let modem = options.open_backend(mock.clone()).unwrap();

	let err = modem.execute("AT+HANG").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Timeout);

	mock.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
	assert_eq!(modem.execute("AT").unwrap_err().kind(), ErrorKind::Write);

	mock.close();
	assert_eq!(modem.execute("AT+HANG").unwrap_err().kind(), ErrorKind::Read);
}

#[test]
fn concurrent_callers_never_interleave() {
	let mock = Mock::with_script(sms_script);
	let modem = Arc::new(options().open_backend(mock.clone()).unwrap());
	let sender = {
		let modem = Arc::clone(&modem);
		std::thread::spawn(move || {
			for _ in 0..20 {
				modem.send_sms("+15550001", "ping").unwrap();
			}
		})
	};
	let poller = {
		let modem = Arc::clone(&modem);
		std::thread::spawn(move || {
			for _ in 0..20 {
				assert_eq!(modem.execute("AT").unwrap(), vec!["OK"]);
			}
		})
	};
	sender.join().unwrap();
	poller.join().unwrap();

	let requests = requests_after_init(&mock);
	assert_eq!(requests.len(), 60);
	for (n, request) in requests.iter().enumerate() {
		if request.text().starts_with("AT+CMGS=") {
			assert_eq!(requests[n + 1], Request::Body("ping".to_string()));
		}
	}
	assert_eq!(modem.lock_owner(), None);
}

type Delivered = Arc<Mutex<Vec<String>>>;

fn collect(delivered: &Delivered) -> impl FnMut(IncomingMessage) -> Result<(), crate::CallbackError> {
	let delivered = Arc::clone(delivered);
	move |message: IncomingMessage| -> Result<(), crate::CallbackError> {
		delivered.lock().unwrap().push(message.text().to_string());
		if message.text() == "bad" {
			Err("handler failed".into())
		} else {
			Ok(())
		}
	}
}

fn notification(text: &str) -> Vec<u8> {
	reply(&["+CMT: \"+15550001\",,\"09/03/04,21:59:31+00\"", text])
}

#[test]
fn receiver_poll_cycle() {
	let mock = Mock::new();
	let modem = Arc::new(options().open_backend(mock.clone()).unwrap());
	let delivered = Delivered::default();
	let mut options = ReceiveOptions::new();
	options.rearm_every(2).fetch_every(3);
	let mut receiver = Receiver::new(Arc::clone(&modem), collect(&delivered), &options);

	mock.push(notification("bad"));
	mock.push(notification("good"));
	receiver.poll_once().unwrap();
	assert_eq!(*delivered.lock().unwrap(), vec!["bad", "good"]);
	assert!(modem.inbox().is_empty());
	assert_eq!(
		commands_after_init(&mock),
		vec![
			"AT",
			"AT+CNMA",
			"AT+CNMA",
			"AT+CNMI=2,2,0,0,0",
			"AT+CMGL=\"REC UNREAD\"",
		]
	);

	receiver.poll_once().unwrap();
	receiver.poll_once().unwrap();
	receiver.poll_once().unwrap();
	assert_eq!(receiver.polled(), 4);
	assert_eq!(
		commands_after_init(&mock).split_off(5),
		vec![
			"AT",
			"AT",
			"AT+CNMI=2,2,0,0,0",
			"AT",
			"AT+CMGL=\"REC UNREAD\"",
		]
	);
}

#[test]
fn receiver_stops_when_the_modem_stops_answering() {
	let mock = Mock::new();
	let mut options = options();
	options.retry_limit(0).reset_on_failure(false);
	let modem = Arc::new(options.open_backend(mock.clone()).unwrap());

	let (tx, rx) = mpsc::channel();
	let tx = Mutex::new(tx);
	let mut receive_options = ReceiveOptions::new();
	receive_options.interval(Duration::from_millis(10));
	let handle = Modem::receive(
		&modem,
		move |message| {
			let thread = std::thread::current().name().map(ToString::to_string);
			tx.lock().unwrap().send((thread, message.text().to_string()))?;
			Ok(())
		},
		&receive_options,
	)
	.unwrap();

	mock.push(notification("hello"));
	let (thread, text) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
	assert_eq!(thread.as_deref(), Some("receiver"));
	assert_eq!(text, "hello");

	mock.close();
	let err = handle.join().unwrap();
	assert_eq!(err.kind(), ErrorKind::Read);
}

#[test]
fn busy_wait_lets_other_callers_in() {
	let mut busy = true;
	let mock = Mock::with_script(move |request| match request.text() {
		"AT+BUSY" if busy => {
			busy = false;
			reply(&["+CMS ERROR: 515"])
		}
		_ => ok(),
	});
	let mut options = options();
	options.busy_retry_delay(Duration::from_millis(300));
	let modem = Arc::new(options.open_backend(mock.clone()).unwrap());

	let waiting = {
		let modem = Arc::clone(&modem);
		std::thread::spawn(move || modem.execute("AT+BUSY"))
	};
	while !mock.commands().iter().any(|command| command == "AT+BUSY") {
		std::thread::sleep(Duration::from_millis(1));
	}
	assert_eq!(modem.execute("AT+OTHER").unwrap(), vec!["OK"]);
	assert_eq!(waiting.join().unwrap().unwrap(), vec!["OK"]);
	assert_eq!(
		commands_after_init(&mock),
		vec!["AT+BUSY", "AT+OTHER", "AT+BUSY"]
	);
}

#[test]
fn panicking_callback_keeps_the_rest_queued() {
	let mock = Mock::new();
	let modem = Arc::new(options().open_backend(mock.clone()).unwrap());
	let mut receiver = Receiver::new(
		Arc::clone(&modem),
		|message: IncomingMessage| -> Result<(), crate::CallbackError> {
			if message.text() == "fatal" {
				panic!("handler crashed");
			}
			Ok(())
		},
		&ReceiveOptions::new(),
	);

	mock.push(notification("fatal"));
	mock.push(notification("next"));
	mock.push(notification("last"));
	let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| receiver.poll_once()));
	assert!(result.is_err());
	let texts: Vec<_> = modem
		.inbox()
		.take_all()
		.into_iter()
		.map(|m| m.text().to_string())
		.collect();
	assert_eq!(texts, vec!["next", "last"]);
}
