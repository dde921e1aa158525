use chrono::NaiveDateTime;

use crate::domain::value::MessageText;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One or more recipient numbers, as given by the caller.
///
/// Values are kept verbatim; splitting and normalization happen when sending.
pub enum Recipient {
    /// A single number or a comma separated list of numbers.
    One(String),
    /// An ordered list of numbers.
    Many(Vec<String>),
}

impl Recipient {
    /// The individual, not yet normalized numbers.
    pub fn numbers(&self) -> Vec<&str> {
        match self {
            Self::One(value) => value.split(',').collect(),
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Recipient {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Recipient {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for Recipient {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipient {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.into_iter().map(str::to_owned).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A message ready to be handed to [`crate::GatewayClient::send`].
pub struct SmsMessage {
    recipient: Recipient,
    text: MessageText,
}

impl SmsMessage {
    pub fn new(recipient: impl Into<Recipient>, text: impl AsRef<str>) -> Self {
        Self {
            recipient: recipient.into(),
            text: MessageText::new(text),
        }
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn text(&self) -> &MessageText {
        &self.text
    }

    /// Number of SMS parts this message occupies, see [`MessageText::part_count`].
    pub fn part_count(&self) -> usize {
        self.text.part_count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Per-send overrides.
pub struct SendOptions {
    /// Sender for this message only. Sanitized like the `from` option and takes
    /// precedence over it.
    pub from: Option<String>,
    /// Deliver at the given gateway-local time instead of immediately.
    pub time: Option<NaiveDateTime>,
}
