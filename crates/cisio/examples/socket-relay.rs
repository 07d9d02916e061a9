//! Relays lines between two Unix socket channels: a producer thread writes
//! to `upstream`, the main thread prints and forwards each line to
//! `downstream`, and a consumer thread collects what arrives.
//!
//! Run with:
//!   cargo run --example socket-relay

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;
    use std::thread;

    use cisio::channel::{SocketSink, SocketSource};
    use cisio::{ChannelConfig, ChannelRegistry, LineInput, LineOutput};

    let dir = std::env::temp_dir().join(format!("cisio-socket-relay-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    let upstream = dir.join("upstream.sock");
    let downstream = dir.join("downstream.sock");

    let registry = ChannelRegistry::from_vars([
        ("CISIO_CHANNEL_UPSTREAM", format!("unix:{}", upstream.display())),
        ("CISIO_CHANNEL_DOWNSTREAM", format!("unix:{}", downstream.display())),
    ])?;
    let config = ChannelConfig::default();

    // Both inputs bind before anyone connects.
    let mut consumer_in = LineInput::with_config(
        "downstream",
        SocketSource::bind(&downstream, &config)?,
        &config,
    );
    let mut relay_in = registry.open_line_input("upstream")?;

    let consumer = thread::spawn(move || {
        let mut received = Vec::new();
        for line in consumer_in.lines() {
            match line {
                Ok(line) => received.push(line),
                Err(err) => {
                    eprintln!("consumer: {err}");
                    break;
                }
            }
        }
        received
    });

    let producer_path = upstream.clone();
    let producer = thread::spawn(move || -> Result<(), cisio::ChannelError> {
        let sink = SocketSink::connect(&producer_path, &ChannelConfig::default())?;
        let mut out = LineOutput::new("upstream", sink);
        for line in ["Hello from the producer\n", "second line\n", "last line\n"] {
            out.send_line(line)?;
        }
        out.close()
    });

    let mut relay_out = registry.open_line_output("downstream")?;
    for line in relay_in.lines() {
        let line = line?;
        print!("relay: {line}");
        relay_out.send_line(&line)?;
    }
    println!("No more input.");
    relay_out.close()?;

    producer.join().map_err(|_| "producer panicked")??;
    let received = consumer.join().map_err(|_| "consumer panicked")?;
    println!("consumer received {} lines", received.len());

    drop(relay_in);
    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("socket-relay needs Unix domain sockets");
}
