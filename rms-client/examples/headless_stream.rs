//! Headless stream client example - connect and log decoded frames.
//!
//! Usage:
//!   cargo run --example headless_stream -- 10.11.99.1[:2001]
//!
//! This example demonstrates:
//! - Creating a client configuration
//! - Connecting to a streaming device
//! - Counting decoded frames and measuring throughput
//! - Graceful shutdown

use rms_client::{ClientBuilder, Config, StreamEvent};
use std::env;
use std::time::{Duration, Instant};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <host>[:<port>]", args[0]);
        eprintln!("Example: {} 10.11.99.1:2001", args[0]);
        std::process::exit(1);
    }

    let (host, port) = parse_device_address(&args[1]);
    info!("Connecting to {}:{}", host, port);

    let config = Config::builder().host(&host).port(port).build()?;

    let client = match ClientBuilder::new(config).connect().await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to connect: {}", e);
            return Err(e.into());
        }
    };

    let handle = client.handle();

    // Terminate after a fixed observation window.
    let stop_handle = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        let _ = stop_handle.terminate();
    });

    let mut frame_count = 0u64;
    let mut started: Option<Instant> = None;

    while let Ok(event) = handle.events().recv_async().await {
        match event {
            StreamEvent::Connected { width, height } => {
                info!("Streaming {}x{} RGBA", width, height);
                started = Some(Instant::now());
            }
            StreamEvent::FrameReady { raster } => {
                frame_count += 1;
                if frame_count % 25 == 0 {
                    let elapsed = started.map(|t| t.elapsed()).unwrap_or_default();
                    info!(
                        "{} frames ({} bytes each) in {:.1}s",
                        frame_count,
                        raster.len(),
                        elapsed.as_secs_f64()
                    );
                }
            }
            StreamEvent::Fault {
                class,
                message,
                retryable,
            } => {
                error!(
                    "stream fault: {:?} (retryable={}): {}",
                    class, retryable, message
                );
            }
            StreamEvent::Closed => {
                info!("stream closed after {} frames", frame_count);
                break;
            }
        }
    }

    client.join().await?;
    Ok(())
}

fn parse_device_address(addr: &str) -> (String, u16) {
    match addr.split_once(':') {
        Some((host, port)) => (
            host.to_string(),
            port.parse().expect("invalid port number"),
        ),
        None => (addr.to_string(), 2001),
    }
}
