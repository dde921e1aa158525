use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::domain::validation::ValidationError;
use crate::domain::value::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// The closed set of gateway option keys.
pub enum OptionKey {
    Debug,
    DebugTest,
    GatewayUri,
    MaxSmsPartCount,
    DefaultIntlPrefix,
    Tracking,
    Username,
    Password,
    Numlock,
    Iplock,
    From,
}

impl OptionKey {
    pub const ALL: [Self; 11] = [
        Self::Debug,
        Self::DebugTest,
        Self::GatewayUri,
        Self::MaxSmsPartCount,
        Self::DefaultIntlPrefix,
        Self::Tracking,
        Self::Username,
        Self::Password,
        Self::Numlock,
        Self::Iplock,
        Self::From,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::DebugTest => "debug_test",
            Self::GatewayUri => "gateway_uri",
            Self::MaxSmsPartCount => "max_sms_part_count",
            Self::DefaultIntlPrefix => "default_intl_prefix",
            Self::Tracking => "tracking",
            Self::Username => "username",
            Self::Password => "password",
            Self::Numlock => "numlock",
            Self::Iplock => "iplock",
            Self::From => "from",
        }
    }
}

impl FromStr for OptionKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedOption {
                keys: vec![s.to_owned()],
            })
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Gateway configuration.
///
/// Every value passes through the same sanitization no matter whether it is set in
/// bulk ([`GatewayOptions::set_options`]) or one by one ([`GatewayOptions::set_option`]).
pub struct GatewayOptions {
    debug: bool,
    debug_test: bool,
    gateway_uri: String,
    max_sms_part_count: Option<u8>,
    default_intl_prefix: String,
    tracking: bool,
    username: Option<String>,
    password: Option<String>,
    numlock: Option<bool>,
    iplock: Option<bool>,
    from: Option<Sender>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            debug: false,
            debug_test: true,
            gateway_uri: String::new(),
            max_sms_part_count: None,
            default_intl_prefix: String::new(),
            tracking: true,
            username: None,
            password: None,
            numlock: None,
            iplock: None,
            from: None,
        }
    }
}

impl GatewayOptions {
    /// Lowest accepted `max_sms_part_count`.
    pub const MIN_PART_COUNT: u8 = 1;
    /// Highest accepted `max_sms_part_count`.
    pub const MAX_PART_COUNT: u8 = 6;

    /// Defaults with `options` applied, see [`GatewayOptions::set_options`].
    pub fn from_options<I, K>(options: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut this = Self::default();
        this.set_options(options)?;
        Ok(this)
    }

    /// Reset to defaults and apply `options`.
    ///
    /// Unknown keys do not stop the scan; once all keys have been looked at they are
    /// reported together as [`ValidationError::UnsupportedOption`].
    /// `default_intl_prefix` is applied before the other keys so a numeric `from`
    /// given in the same call is normalized with it.
    pub fn set_options<I, K>(&mut self, options: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        *self = Self::default();

        let mut known = Vec::new();
        let mut unsupported = Vec::new();
        for (key, value) in options {
            match key.as_ref().parse::<OptionKey>() {
                Ok(key) => known.push((key, value)),
                Err(_) => unsupported.push(key.as_ref().to_owned()),
            }
        }

        known.sort_by_key(|(key, _)| *key != OptionKey::DefaultIntlPrefix);
        for (key, value) in known {
            self.set_option(key, value)?;
        }

        if unsupported.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedOption { keys: unsupported })
        }
    }

    /// Sanitize and store a single option.
    pub fn set_option(&mut self, key: OptionKey, value: Value) -> Result<(), ValidationError> {
        match key {
            OptionKey::Debug => self.debug = truthy(&value),
            OptionKey::DebugTest => self.debug_test = truthy(&value),
            OptionKey::Tracking => self.tracking = truthy(&value),
            OptionKey::GatewayUri => {
                self.gateway_uri = string_value(key, &value)?.unwrap_or_default();
            }
            OptionKey::DefaultIntlPrefix => {
                self.default_intl_prefix = string_value(key, &value)?.unwrap_or_default();
            }
            OptionKey::Username => self.username = string_value(key, &value)?,
            OptionKey::Password => self.password = string_value(key, &value)?,
            OptionKey::MaxSmsPartCount => self.max_sms_part_count = part_count_value(&value),
            OptionKey::Numlock => self.numlock = Some(truthy(&value)),
            OptionKey::Iplock => self.iplock = Some(truthy(&value)),
            OptionKey::From => {
                self.from = string_value(key, &value)?
                    .map(|from| Sender::parse(&from, &self.default_intl_prefix))
                    .transpose()?;
            }
        }
        Ok(())
    }

    /// The stored value of `key` in its loosely typed form.
    ///
    /// `numlock` and `iplock` come back as the `"1"`/`"0"` flags sent to the gateway.
    pub fn get_option(&self, key: OptionKey) -> Value {
        match key {
            OptionKey::Debug => Value::Bool(self.debug),
            OptionKey::DebugTest => Value::Bool(self.debug_test),
            OptionKey::Tracking => Value::Bool(self.tracking),
            OptionKey::GatewayUri => Value::from(self.gateway_uri.as_str()),
            OptionKey::DefaultIntlPrefix => Value::from(self.default_intl_prefix.as_str()),
            OptionKey::MaxSmsPartCount => self.max_sms_part_count.map_or(Value::Null, Value::from),
            OptionKey::Username => self.username.as_deref().map_or(Value::Null, Value::from),
            OptionKey::Password => self.password.as_deref().map_or(Value::Null, Value::from),
            OptionKey::Numlock => self.numlock.map_or(Value::Null, |on| lock_flag(on).into()),
            OptionKey::Iplock => self.iplock.map_or(Value::Null, |on| lock_flag(on).into()),
            OptionKey::From => self
                .from
                .as_ref()
                .map_or(Value::Null, |from| from.as_str().into()),
        }
    }

    /// What `value` would be stored as for `key`, without changing anything.
    pub fn check_option(&self, key: OptionKey, value: Value) -> Result<Value, ValidationError> {
        let mut scratch = self.clone();
        scratch.set_option(key, value)?;
        Ok(scratch.get_option(key))
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn debug_test(&self) -> bool {
        self.debug_test
    }

    /// Whether requests ask the gateway for test mode (`debug` and `debug_test`).
    pub fn test_mode(&self) -> bool {
        self.debug && self.debug_test
    }

    pub fn gateway_uri(&self) -> &str {
        &self.gateway_uri
    }

    pub fn max_sms_part_count(&self) -> Option<u8> {
        self.max_sms_part_count
    }

    pub fn default_intl_prefix(&self) -> &str {
        &self.default_intl_prefix
    }

    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn numlock(&self) -> Option<bool> {
        self.numlock
    }

    pub fn iplock(&self) -> Option<bool> {
        self.iplock
    }

    pub fn from(&self) -> Option<&Sender> {
        self.from.as_ref()
    }
}

/// Wire representation of a lock option.
pub(crate) fn lock_flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn string_value(key: OptionKey, value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            Err(ValidationError::InvalidOptionValue {
                key: key.as_str(),
                reason: "expected a string or a number",
            })
        }
    }
}

fn part_count_value(value: &Value) -> Option<u8> {
    let count = match value {
        Value::Null => return None,
        Value::Bool(flag) => i64::from(*flag),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n as i64))
            .unwrap_or(i64::MAX),
        Value::String(text) => text.trim().parse::<i64>().unwrap_or(0),
        Value::Array(_) | Value::Object(_) => 0,
    };
    let clamped = count.clamp(
        i64::from(GatewayOptions::MIN_PART_COUNT),
        i64::from(GatewayOptions::MAX_PART_COUNT),
    );
    Some(u8::try_from(clamped).unwrap_or(GatewayOptions::MAX_PART_COUNT))
}
