//! Demo: receive SMS messages from a GSM modem.

use gsmlink::{ModemOptions, ReceiveOptions};
use simple_logger::SimpleLogger;
use std::{sync::Arc, time::Duration};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    // Find a modem and wait until it is attached to a network.
    let modem = Arc::new(ModemOptions::new().label("demo").open_auto()?);
    if !modem.use_pin("0000")? {
        return Err("the SIM PIN was rejected".into());
    }
    let strength = modem.wait_for_network()?;
    println!("signal strength: {strength}");

    // Echo every incoming message back to its sender.
    let replier = Arc::clone(&modem);
    let mut options = ReceiveOptions::new();
    options.interval(Duration::from_secs(2));
    let handle = gsmlink::Modem::receive(
        &modem,
        move |msg| {
            println!("{} ({}): {}", msg.sender(), msg.sent_at(), msg.text());
            replier.send_sms(msg.sender(), &format!("You said: {}", msg.text()))?;
            Ok(())
        },
        &options,
    )?;

    // Only returns once the modem stops answering.
    let error = handle.join().expect("receiver panicked");
    Err(error.into())
}
