use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDateTime, TimeZone};
use sha2::{Digest, Sha256};

use crate::domain::{GatewayOptions, MessageText, PhoneNumber, Sender, lock_flag};

/// Form parameters in wire order. Values are raw octets; `content` is ISO-8859-1.
pub type FormParams = Vec<(&'static str, Vec<u8>)>;

pub const REQUEST_ID_FIELD: &str = "requestid";

const TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const REQUEST_ID_HASH_OFFSET: usize = 3;
const REQUEST_ID_HASH_LEN: usize = 14;

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn encode_send_sms_form(
    options: &GatewayOptions,
    recipients: &[PhoneNumber],
    text: &MessageText,
    from: Option<&Sender>,
    time: Option<NaiveDateTime>,
) -> FormParams {
    let to = recipients
        .iter()
        .map(PhoneNumber::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut params: FormParams = vec![
        ("username", options.username().unwrap_or_default().into()),
        ("password", options.password().unwrap_or_default().into()),
        ("type", b"text".to_vec()),
        (PhoneNumber::FIELD, to.into_bytes()),
        (MessageText::FIELD, text.latin1_bytes()),
    ];

    if let Some(iplock) = options.iplock() {
        params.push(("iplock", lock_flag(iplock).into()));
    }
    if let Some(numlock) = options.numlock() {
        params.push(("numlock", lock_flag(numlock).into()));
    }
    if let Some(from) = from {
        params.push((Sender::FIELD, from.as_str().into()));
    }
    if let Some(time) = time {
        params.push(("time", time.format(TIME_FORMAT).to_string().into_bytes()));
    }
    if options.test_mode() {
        params.push(("test", b"1".to_vec()));
    }

    params
}

/// Synthesize a tracking id: `<%Y%m%d>-<%H%M%S>-<14 hex chars>`.
///
/// The hex part is cut from a SHA-256 digest over the parameter values, the
/// timestamp and a process wide sequence number, so two calls never share an id.
pub fn request_id<Tz>(params: &[(&'static str, Vec<u8>)], now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut hasher = Sha256::new();
    for (_, value) in params {
        hasher.update(value);
    }
    hasher.update(now.to_rfc2822().as_bytes());
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(
        REQUEST_SEQUENCE
            .fetch_add(1, Ordering::Relaxed)
            .to_le_bytes(),
    );

    let digest = hex::encode(hasher.finalize());
    let fragment =
        &digest[REQUEST_ID_HASH_OFFSET..REQUEST_ID_HASH_OFFSET + REQUEST_ID_HASH_LEN];
    format!("{}-{fragment}", now.format("%Y%m%d-%H%M%S"))
}

/// Serialize parameters as an `application/x-www-form-urlencoded` body.
///
/// Every octet outside the unreserved set is percent-encoded and spaces become `+`,
/// so the ISO-8859-1 payload reaches the gateway unchanged.
pub fn serialize_form(params: &[(&'static str, Vec<u8>)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", form_encode(key.as_bytes()), form_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn form_encode(bytes: &[u8]) -> String {
    url::form_urlencoded::byte_serialize(bytes).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};
    use serde_json::json;

    use super::*;

    fn options(extra: &[(&str, serde_json::Value)]) -> GatewayOptions {
        let mut pairs = vec![
            ("username", json!("user name")),
            ("password", json!("p&ss")),
            ("default_intl_prefix", json!("49")),
        ];
        pairs.extend(extra.iter().cloned());
        GatewayOptions::from_options(pairs).unwrap()
    }

    fn recipients() -> Vec<PhoneNumber> {
        vec![
            PhoneNumber::normalize("+491701234567", "49").unwrap(),
            PhoneNumber::normalize("0151 7654321", "49").unwrap(),
        ]
    }

    #[test]
    fn encode_mandatory_params_in_order() {
        let params = encode_send_sms_form(
            &options(&[]),
            &recipients(),
            &MessageText::new("hello"),
            None,
            None,
        );

        assert_eq!(
            params,
            vec![
                ("username", b"user name".to_vec()),
                ("password", b"p&ss".to_vec()),
                ("type", b"text".to_vec()),
                ("to", b"00491701234567,00491517654321".to_vec()),
                ("content", b"hello".to_vec()),
            ]
        );
    }

    #[test]
    fn encode_optional_params() {
        let options = options(&[
            ("iplock", json!(true)),
            ("numlock", json!(false)),
            ("debug", json!(true)),
        ]);
        let sender = Sender::parse("ACME", "49").unwrap();
        let time = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 0))
            .unwrap();

        let params = encode_send_sms_form(
            &options,
            &recipients()[..1],
            &MessageText::new("hi"),
            Some(&sender),
            Some(time),
        );

        assert_eq!(
            &params[5..],
            &[
                ("iplock", b"1".to_vec()),
                ("numlock", b"0".to_vec()),
                ("from", b"ACME".to_vec()),
                ("time", b"20240309070500".to_vec()),
                ("test", b"1".to_vec()),
            ]
        );
    }

    #[test]
    fn test_flag_needs_debug_and_debug_test() {
        let options = options(&[("debug", json!(true)), ("debug_test", json!(false))]);
        let params = encode_send_sms_form(
            &options,
            &recipients(),
            &MessageText::new("hi"),
            None,
            None,
        );
        assert!(!params.iter().any(|(key, _)| *key == "test"));
    }

    #[test]
    fn serialize_percent_encodes_latin1_content() {
        let params = encode_send_sms_form(
            &options(&[]),
            &recipients()[..1],
            &MessageText::new("Grüße & mehr"),
            None,
            None,
        );

        assert_eq!(
            serialize_form(&params),
            "username=user+name&password=p%26ss&type=text&to=00491701234567\
             &content=Gr%FC%DFe+%26+mehr"
        );
    }

    #[test]
    fn request_id_has_date_time_and_fragment() {
        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .unwrap();
        let params: FormParams = vec![("to", b"00491701234567".to_vec())];

        let id = request_id(&params, &now);
        assert_eq!(id.len(), 30);
        assert!(id.starts_with("20240309-070501-"));
        assert!(id[16..].chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(request_id(&params, &now), id);
    }
}
