// CAN segmented messaging node: operator console, receiver loop, loopback demo.

mod config;
mod console;

use std::time::Duration;

use canmsg_core::{
    Bitrate, LinkDriver, LoopbackBus, MessageSender, OperatingMode, OscillatorFreq, ReceiverNode,
    Reassembler, RxEvent, TargetId, ThreadDelay,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("canmsg-node {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load();
    let node_id = TargetId::new(cfg.node_id)
        .map_err(|e| format!("config node_id invalid: {e}"))?;

    println!("=== CAN Segmented Messaging Node ===");
    println!("Receiver id {} (bus id 0x{:03X})", node_id, node_id.bus_id());
    println!("Loopback bus demo: sent messages addressed to this node echo back.\n");

    // One shared in-memory bus stands in for the CAN wire. Two endpoints:
    // the console sender and the receiver polling loop.
    let bus = LoopbackBus::new();
    let mut tx_link = bus.endpoint();
    let mut rx_link = bus.endpoint();
    for link in [&mut tx_link, &mut rx_link] {
        link.configure(Bitrate::Kbps500, OscillatorFreq::Mhz16)?;
        link.set_operating_mode(OperatingMode::Loopback)?;
    }

    let poll_idle = Duration::from_millis(cfg.poll_idle_ms);
    let rx_id = cfg.node_id;
    let capacity = cfg.capacity;
    std::thread::spawn(move || {
        let mut node =
            ReceiverNode::with_reassembler(node_id, Reassembler::with_capacity(capacity));
        loop {
            match node.poll(&mut rx_link) {
                Some(RxEvent::Message(message)) => console::print_received(rx_id, &message),
                Some(RxEvent::Progress { received, expected }) => {
                    println!("  .. assembling {received}/{expected} bytes");
                }
                Some(RxEvent::Dropped(err)) => println!("Message dropped: {err}"),
                Some(RxEvent::UnknownFrame { magic }) => {
                    println!("Unknown frame magic 0x{magic:02X}");
                }
                Some(RxEvent::Foreign { .. }) => {}
                None => std::thread::sleep(poll_idle),
            }
        }
    });

    let mut sender = MessageSender::with_policy(tx_link, ThreadDelay, cfg.send_policy());
    loop {
        let Some(target) = console::prompt_target_id()? else {
            break;
        };
        let Some(text) = console::prompt_message()? else {
            break;
        };

        println!(
            "Sending {} bytes to receiver {}: \"{}\"",
            text.len(),
            target,
            text
        );
        match sender.send(target, text.as_bytes()) {
            Ok(()) => println!("Message sent.\n"),
            // Errors are local to this send; prompt for the next one.
            Err(e) => println!("Send failed: {e}\n"),
        }
    }
    Ok(())
}
