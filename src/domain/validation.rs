use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    UnsupportedOption { keys: Vec<String> },
    InvalidPhoneNumber { input: String, reason: &'static str },
    EmptyMessageText,
    MessageTooLong { parts: usize, max: u8 },
    InvalidSender { input: String },
    InvalidOptionValue { key: &'static str, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::UnsupportedOption { keys } => write!(
                f,
                "the gateway does not support the following options: \"{}\"",
                keys.join("\", \"")
            ),
            Self::InvalidPhoneNumber { input, reason } => {
                write!(f, "invalid phone number {input:?}: {reason}")
            }
            Self::EmptyMessageText => write!(f, "an SMS must contain text"),
            Self::MessageTooLong { parts, max } => write!(
                f,
                "the SMS needs {parts} parts which exceeds the maximum of {max} parts"
            ),
            Self::InvalidSender { input } => write!(
                f,
                "invalid sender {input:?}: neither a sender name nor a phone number"
            ),
            Self::InvalidOptionValue { key, reason } => {
                write!(f, "invalid value for option {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
