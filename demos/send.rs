//! Demo: send an SMS message through a GSM modem.

use gsmlink::{Modem, OutgoingMessage};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(recipient)) = (args.next(), args.next()) else {
        return Err("usage: send <serial port> <recipient> [text]".into());
    };
    let text = args.next().unwrap_or_else(|| "Hello from gsmlink".to_string());

    let modem = Modem::options().retry_limit(2).open(&path)?;
    let hardware = modem.hardware()?;
    println!("{} {} (rev. {})", hardware.manufacturer, hardware.model, hardware.revision);
    modem.wait_for_network()?;

    let mut message = OutgoingMessage::new(recipient, text);
    modem.send(&mut message)?;
    if let Some(sent_at) = message.sent_at() {
        println!("sent at {sent_at}");
    }
    Ok(())
}
