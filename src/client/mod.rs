//! Client layer: validates messages, drives the transport and keeps send statistics.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;

use crate::domain::{
    GatewayOptions, GatewayResponse, OptionKey, PhoneNumber, SendOptions, Sender, SmsMessage,
    ValidationError,
};
use crate::logging::GatewayLogger;
use crate::transport::{
    REQUEST_ID_FIELD, encode_send_sms_form, request_id, serialize_form,
};

/// Production endpoint of the FitSMS HTTP gateway.
pub const DEFAULT_GATEWAY_URI: &str = "https://gateway.fitsms.de/sms/http2sms.jsp";

/// Request timeout applied unless [`GatewayClientBuilder::timeout`] overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

trait HttpTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        body: String,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        body: String,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body)
                .send()
                .await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response.bytes().await?.to_vec();
            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`GatewayClient`].
///
/// Only caller mistakes end up here. A gateway that cannot be reached or that rejects
/// a message makes [`GatewayClient::send`] return `Ok(false)` instead.
pub enum GatewayError {
    /// Invalid option, recipient, sender or message text.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The configuration record is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Clone)]
/// Builder for [`GatewayClient`].
///
/// Use this when you need to customize the timeout, user-agent or logger.
pub struct GatewayClientBuilder {
    options: GatewayOptions,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    logger: Option<Arc<dyn GatewayLogger>>,
}

impl GatewayClientBuilder {
    pub fn new(options: GatewayOptions) -> Self {
        Self {
            options,
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: None,
            logger: None,
        }
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait for the gateway as long as it takes.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Report send outcomes to `logger`.
    pub fn logger(mut self, logger: Arc<dyn GatewayLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build a [`GatewayClient`].
    pub fn build(self) -> Result<GatewayClient, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| GatewayError::Transport(Box::new(err)))?;

        Ok(GatewayClient::with_transport(
            self.options,
            Arc::new(ReqwestTransport { client }),
            self.logger,
        ))
    }
}

/// Client for the FitSMS HTTP gateway.
///
/// [`GatewayClient::send`] only needs `&self`, so one client can be shared between
/// tasks through an [`Arc`]; the success and failure counters are atomic.
pub struct GatewayClient {
    options: GatewayOptions,
    http: Arc<dyn HttpTransport>,
    logger: Option<Arc<dyn GatewayLogger>>,
    success_count: AtomicU64,
    failure_count: AtomicU64,
}

impl GatewayClient {
    /// Create a client with the default timeout and no logger.
    pub fn new(options: GatewayOptions) -> Result<Self, GatewayError> {
        GatewayClientBuilder::new(options).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(options: GatewayOptions) -> GatewayClientBuilder {
        GatewayClientBuilder::new(options)
    }

    fn with_transport(
        options: GatewayOptions,
        http: Arc<dyn HttpTransport>,
        logger: Option<Arc<dyn GatewayLogger>>,
    ) -> Self {
        Self {
            options,
            http,
            logger,
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Replace all options, see [`GatewayOptions::set_options`].
    pub fn set_options<I, K>(&mut self, options: I) -> Result<(), GatewayError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        Ok(self.options.set_options(options)?)
    }

    pub fn set_option(&mut self, key: &str, value: Value) -> Result<(), GatewayError> {
        let key = key.parse::<OptionKey>()?;
        Ok(self.options.set_option(key, value)?)
    }

    pub fn get_option(&self, key: &str) -> Result<Value, GatewayError> {
        let key = key.parse::<OptionKey>()?;
        Ok(self.options.get_option(key))
    }

    /// The value `value` would be stored as for `key`.
    pub fn check_option(&self, key: &str, value: Value) -> Result<Value, GatewayError> {
        let key = key.parse::<OptionKey>()?;
        Ok(self.options.check_option(key, value)?)
    }

    /// Number of SMS parts `message` occupies.
    pub fn sms_part_count(message: &SmsMessage) -> usize {
        message.part_count()
    }

    /// Sends accepted by the gateway since this client was created.
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Sends that failed in transport or were rejected by the gateway.
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Send `message` through the gateway.
    ///
    /// Returns `Ok(true)` when the gateway accepted the message and `Ok(false)` when the
    /// gateway could not be reached or rejected it; details go to the logger.
    ///
    /// Errors (nothing is sent):
    /// - [`ValidationError::Empty`] when there is no recipient,
    /// - [`ValidationError::InvalidPhoneNumber`] for a malformed recipient,
    /// - [`ValidationError::EmptyMessageText`] for empty text,
    /// - [`ValidationError::MessageTooLong`] when `max_sms_part_count` is exceeded,
    /// - [`ValidationError::InvalidSender`] for an unusable `from` override,
    /// - [`ValidationError::Empty`] when `username` or `password` is missing.
    pub async fn send(
        &self,
        message: &SmsMessage,
        overrides: SendOptions,
    ) -> Result<bool, GatewayError> {
        let prefix = self.options.default_intl_prefix();
        let recipients = message
            .recipient()
            .numbers()
            .into_iter()
            .map(|number| PhoneNumber::normalize(number, prefix))
            .collect::<Result<Vec<_>, _>>()?;
        if recipients.is_empty() {
            return Err(ValidationError::Empty {
                field: PhoneNumber::FIELD,
            }
            .into());
        }

        let text = message.text();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessageText.into());
        }

        if let Some(max) = self.options.max_sms_part_count() {
            let parts = text.part_count();
            if parts > usize::from(max) {
                return Err(ValidationError::MessageTooLong { parts, max }.into());
            }
        }

        let from = match overrides.from.as_deref() {
            Some(from) => Some(Sender::parse(from, prefix)?),
            None => self.options.from().cloned(),
        };

        require_credential("username", self.options.username())?;
        require_credential("password", self.options.password())?;

        let mut params = encode_send_sms_form(
            &self.options,
            &recipients,
            text,
            from.as_ref(),
            overrides.time,
        );

        let message_id = self.options.tracking().then(|| {
            let id = request_id(&params, &chrono::Local::now());
            params.push((REQUEST_ID_FIELD, id.clone().into_bytes()));
            id
        });

        tracing::debug!(
            recipients = recipients.len(),
            parts = text.part_count(),
            message_id = ?message_id,
            "posting SMS to gateway"
        );

        let uri = self.options.gateway_uri();
        let sent = match self.http.post_form(uri, serialize_form(&params)).await {
            Ok(response) if (200..=299).contains(&response.status) => {
                let parsed = GatewayResponse::parse_with_content_type(
                    &response.body,
                    response.content_type.as_deref(),
                );
                self.report(&parsed, message_id.as_deref())
            }
            Ok(response) => {
                self.log(|logger| {
                    logger.warn(&format!(
                        "The FitSMS gateway server at \"{uri}\" answered with HTTP status {}.",
                        response.status
                    ));
                });
                false
            }
            Err(err) => {
                self.log(|logger| {
                    logger.warn(&format!(
                        "Failed to connect to the FitSMS gateway server at \"{uri}\". ({err})"
                    ));
                });
                false
            }
        };

        let counter = if sent {
            &self.success_count
        } else {
            &self.failure_count
        };
        counter.fetch_add(1, Ordering::Relaxed);

        Ok(sent)
    }

    fn report(&self, response: &GatewayResponse, message_id: Option<&str>) -> bool {
        let id = message_id
            .map(|id| format!(", message ID: {id}"))
            .unwrap_or_default();

        if response.is_failure() {
            self.log(|logger| {
                logger.error(&format!("Failed to send SMS{id}. ({})", response.message()));
            });
            return false;
        }

        let mode = if response.is_test() {
            " in test mode"
        } else {
            ""
        };
        self.log(|logger| {
            logger.info(&format!(
                "SMS has been sent successfully{mode}{id}. ({})",
                response.message()
            ));
        });
        true
    }

    fn log(&self, emit: impl FnOnce(&dyn GatewayLogger)) {
        if let Some(logger) = self.logger.as_deref() {
            emit(logger);
        }
    }
}

fn require_credential(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(ValidationError::Empty { field }),
    }
}
