//! Deserializable gateway configuration with the defaults of a typical deployment.

use serde::Deserialize;
use serde_json::Value;

use crate::client::{DEFAULT_GATEWAY_URI, GatewayError};
use crate::domain::GatewayOptions;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Gateway settings as read from a configuration file.
///
/// `username` and `password` are required; everything else has a default.
/// `max_sms_part_count` and `default_intl_prefix` accept any scalar and are sanitized
/// like the corresponding options.
/// Turn it into [`GatewayOptions`] with [`GatewayConfig::into_options`].
pub struct GatewayConfig {
    pub debug_test: bool,
    pub gateway_uri: String,
    pub max_sms_part_count: Value,
    pub default_intl_prefix: Value,
    pub tracking: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub numlock: bool,
    pub iplock: bool,
    pub from: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            debug_test: true,
            gateway_uri: DEFAULT_GATEWAY_URI.to_owned(),
            max_sms_part_count: Value::from(GatewayOptions::MAX_PART_COUNT),
            default_intl_prefix: Value::from(1),
            tracking: true,
            username: None,
            password: None,
            numlock: false,
            iplock: false,
            from: None,
        }
    }
}

impl GatewayConfig {
    /// Check the mandatory credentials and build sanitized [`GatewayOptions`].
    ///
    /// `debug` is the application's debug switch; together with `debug_test` it asks
    /// the gateway for test delivery.
    pub fn into_options(self, debug: bool) -> Result<GatewayOptions, GatewayError> {
        let username = required("username", self.username)?;
        let password = required("password", self.password)?;

        let options = GatewayOptions::from_options([
            ("debug", Value::Bool(debug)),
            ("debug_test", Value::Bool(self.debug_test)),
            ("gateway_uri", Value::String(self.gateway_uri)),
            ("max_sms_part_count", self.max_sms_part_count),
            ("default_intl_prefix", self.default_intl_prefix),
            ("tracking", Value::Bool(self.tracking)),
            ("username", Value::String(username)),
            ("password", Value::String(password)),
            ("numlock", Value::Bool(self.numlock)),
            ("iplock", Value::Bool(self.iplock)),
            ("from", self.from.map_or(Value::Null, Value::String)),
        ])?;
        Ok(options)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, GatewayError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GatewayError::Config(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{ "username": "user", "password": "secret" }"#).unwrap();
        let options = config.into_options(false).unwrap();

        assert_eq!(options.gateway_uri(), DEFAULT_GATEWAY_URI);
        assert_eq!(options.max_sms_part_count(), Some(6));
        assert_eq!(options.default_intl_prefix(), "1");
        assert!(options.tracking());
        assert!(options.debug_test());
        assert!(!options.test_mode());
        assert_eq!(options.numlock(), Some(false));
        assert_eq!(options.iplock(), Some(false));
        assert_eq!(options.from(), None);
    }

    #[test]
    fn config_values_are_sanitized() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{
                "username": "user",
                "password": "secret",
                "default_intl_prefix": "49",
                "max_sms_part_count": 9,
                "from": "0170 1234567"
            }"#,
        )
        .unwrap();
        let options = config.into_options(true).unwrap();

        assert_eq!(options.max_sms_part_count(), Some(6));
        assert_eq!(options.from().map(|from| from.as_str()), Some("00491701234567"));
        assert!(options.test_mode());
    }

    #[test]
    fn scalar_values_are_accepted() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{
                "username": "user",
                "password": "secret",
                "default_intl_prefix": 49,
                "max_sms_part_count": 300
            }"#,
        )
        .unwrap();
        let options = config.into_options(false).unwrap();

        assert_eq!(options.default_intl_prefix(), "49");
        assert_eq!(options.max_sms_part_count(), Some(6));

        let config: GatewayConfig = serde_json::from_str(
            r#"{ "username": "user", "password": "secret", "max_sms_part_count": "2" }"#,
        )
        .unwrap();
        assert_eq!(config.into_options(false).unwrap().max_sms_part_count(), Some(2));
    }

    #[test]
    fn non_scalar_prefix_is_rejected() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{ "username": "user", "password": "secret", "default_intl_prefix": [49] }"#,
        )
        .unwrap();
        assert!(matches!(
            config.into_options(false),
            Err(GatewayError::Validation(ValidationError::InvalidOptionValue {
                key: "default_intl_prefix",
                ..
            }))
        ));
    }

    #[test]
    fn credentials_are_required() {
        let config: GatewayConfig = serde_json::from_str(r#"{ "username": "user" }"#).unwrap();
        let err = config.into_options(false).unwrap_err();
        assert!(matches!(err, GatewayError::Config(message) if message == "password is required"));

        let config = GatewayConfig {
            username: Some(String::new()),
            password: Some("secret".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            config.into_options(false),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<GatewayConfig>(
            r#"{ "username": "user", "password": "secret", "sender": "x" }"#,
        );
        assert!(result.is_err());
    }
}
