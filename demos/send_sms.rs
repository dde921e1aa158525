use std::io;
use std::sync::Arc;

use fitsms::{GatewayClient, GatewayConfig, SendOptions, SmsMessage, TracingLogger};

fn required_env(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig {
        username: Some(required_env("FITSMS_USERNAME")?),
        password: Some(required_env("FITSMS_PASSWORD")?),
        default_intl_prefix: std::env::var("FITSMS_INTL_PREFIX")
            .unwrap_or_else(|_| "49".to_owned())
            .into(),
        from: std::env::var("FITSMS_FROM").ok(),
        ..Default::default()
    };
    let recipient = required_env("FITSMS_PHONE")?;
    let text = std::env::var("FITSMS_MESSAGE")
        .unwrap_or_else(|_| "Hello from the fitsms demo.".to_owned());

    // Test delivery unless FITSMS_LIVE is set.
    let debug = std::env::var_os("FITSMS_LIVE").is_none();
    let client = GatewayClient::builder(config.into_options(debug)?)
        .logger(Arc::new(TracingLogger))
        .build()?;

    let message = SmsMessage::new(recipient, text);
    println!("parts: {}", message.part_count());

    let sent = client.send(&message, SendOptions::default()).await?;
    println!(
        "sent: {sent}, successes: {}, failures: {}",
        client.success_count(),
        client.failure_count()
    );

    Ok(())
}
