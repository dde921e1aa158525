//! Typed Rust client for the FitSMS HTTP gateway.
//!
//! The crate is split into a domain layer of validated types (phone numbers, sender,
//! ISO-8859-1 message text, options), a transport layer for the wire format (form
//! encoding, XML replies) and a small client layer orchestrating a send.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fitsms::{GatewayClient, GatewayConfig, SendOptions, SmsMessage, TracingLogger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fitsms::GatewayError> {
//!     let config = GatewayConfig {
//!         username: Some("user".to_owned()),
//!         password: Some("secret".to_owned()),
//!         default_intl_prefix: "49".into(),
//!         ..Default::default()
//!     };
//!     let client = GatewayClient::builder(config.into_options(false)?)
//!         .logger(Arc::new(TracingLogger))
//!         .build()?;
//!     let message = SmsMessage::new("0170 1234567", "hello");
//!     let sent = client.send(&message, SendOptions::default()).await?;
//!     println!("sent: {sent}");
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod domain;
pub mod logging;
mod transport;

pub use client::{
    DEFAULT_GATEWAY_URI, DEFAULT_TIMEOUT, GatewayClient, GatewayClientBuilder, GatewayError,
};
pub use config::GatewayConfig;
pub use domain::{
    FailureReason, GatewayOptions, GatewayResponse, MessageText, OptionKey, PhoneNumber,
    Recipient, SendOptions, Sender, SmsMessage, ValidationError,
};
pub use logging::{GatewayLogger, TracingLogger};
