//! Read and adjust device configuration registers

use r309::{Device, SecurityLevel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let port = std::env::var("FINGERPRINT_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = Device::new(&port, 57600);
    device.connect().await?;

    let params = device.sys_params().expect("connected");
    println!("{}", params);
    println!("Packet length: {} bytes", device.packet_length()?);

    println!("Raising security level to 5...");
    device.set_security_level(SecurityLevel::Level5).await?;
    println!("Security level is now {}", device.security_level()?);

    device.disconnect().await?;

    Ok(())
}
