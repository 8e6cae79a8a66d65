//! Poll the sensor and identify any finger placed on it

use std::time::Duration;

use r309::{Device, IdentifyOutcome, ScanOutcome};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::var("FINGERPRINT_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = Device::new(&port, 57600);
    device.connect().await?;
    println!("✓ Connected to {}", port);

    println!("Security level (1-5): {}", device.security_level()?);
    println!("Storage capacity: {}", device.storage_capacity()?);
    println!("Next template number: {}", device.next_template_number().await?);

    loop {
        match device.scan_finger().await? {
            ScanOutcome::FingerDetected => match device.identify().await? {
                IdentifyOutcome::Matched { page, score } => {
                    println!("Template #{} identified (score {}).", page, score);
                }
                IdentifyOutcome::NotMatched => {
                    println!("Template not identified.");
                }
                rejected => {
                    println!("{}", rejected);
                }
            },
            ScanOutcome::NoFinger => {
                print!(".");
            }
            outcome => {
                println!("{}", outcome);
            }
        }

        sleep(Duration::from_secs(3)).await;
    }
}
