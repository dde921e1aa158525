use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use roxmltree::Node;

use crate::domain::{FailureReason, GatewayResponse};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid XML response: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unparseable deliverDate: {value}")]
    DeliverDate { value: String },

    #[error("cannot encode warnings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Warnings starting with this code only signal that the gateway ran in test mode.
const TEST_MODE_WARNING: &str = "510";

const DELIVER_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d%H%M%S",
    "%d.%m.%Y %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
];

/// Character set labels that name ISO-8859-1.
const LATIN1_LABELS: &[&str] = &["iso-8859-1", "iso8859-1", "iso_8859-1", "latin1", "l1"];

impl GatewayResponse {
    /// Classify a raw gateway reply.
    ///
    /// Never fails: an empty body becomes `"Empty response"`, anything that is not the
    /// expected XML document becomes `"Unexpected response"`. The body is read as
    /// ISO-8859-1 when its XML declaration says so or when it is not valid UTF-8.
    pub fn parse(body: &[u8]) -> Self {
        Self::parse_with_content_type(body, None)
    }

    /// Like [`GatewayResponse::parse`], with the `Content-Type` header of the reply.
    ///
    /// A `charset` parameter in `content_type` takes precedence over the XML declaration.
    pub fn parse_with_content_type(body: &[u8], content_type: Option<&str>) -> Self {
        let charset = content_type
            .and_then(content_type_charset)
            .or_else(|| declared_encoding(body));
        let text = decode_body(body, charset);
        let text = text.trim();
        if text.is_empty() {
            return Self::failure(FailureReason::EmptyResponse, "Empty response");
        }

        decode_gateway_response_xml(text).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "discarding unexpected gateway response");
            Self::failure(FailureReason::UnexpectedResponse, "Unexpected response")
        })
    }
}

fn is_latin1_label(label: &str) -> bool {
    LATIN1_LABELS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(label))
}

fn decode_body<'a>(body: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    if !charset.is_some_and(is_latin1_label) {
        if let Ok(text) = std::str::from_utf8(body) {
            return Cow::Borrowed(text);
        }
    }
    Cow::Owned(body.iter().map(|&byte| char::from(byte)).collect())
}

fn content_type_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// The `encoding` pseudo-attribute of a leading `<?xml ... ?>` declaration.
fn declared_encoding(body: &[u8]) -> Option<&str> {
    let start = body.iter().position(|byte| !byte.is_ascii_whitespace())?;
    let rest = body.get(start..)?.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|pair| pair == b"?>")?;
    let declaration = std::str::from_utf8(rest.get(..end)?).ok()?;
    let (_, value) = declaration.split_once("encoding")?;
    let value = value.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &value[1..];
    value.find(quote).map(|close| &value[..close])
}

fn decode_gateway_response_xml(xml: &str) -> Result<GatewayResponse, TransportError> {
    let document = roxmltree::Document::parse(xml)?;
    let root = document.root_element();

    let is_error = child_text(root, "result")
        .is_some_and(|result| result.trim().eq_ignore_ascii_case("error"));
    if is_error {
        let message = child_text(root, "error").unwrap_or_default().trim();
        return Ok(GatewayResponse::failure(FailureReason::Gateway, message));
    }

    let recipients = child(root, "recipients").map_or(0, |node| {
        node.children()
            .filter(|item| item.has_tag_name("recipient"))
            .count()
    });
    let mut message = format!("Recipients: {recipients}");

    let deliver_date = child_text(root, "deliverDate")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse_deliver_date)
        .transpose()?;
    if let Some(date) = deliver_date {
        message.push_str(&format!(", delivered: {}", date.format("%Y.%m.%d %H:%M:%S")));
    }

    let mut test = false;
    let mut warnings = Vec::new();
    let warning_nodes = child(root, "warnings")
        .into_iter()
        .flat_map(|node| node.children())
        .filter(|item| item.has_tag_name("warning"));
    for node in warning_nodes {
        let warning = node.text().unwrap_or_default().trim();
        if warning.starts_with(TEST_MODE_WARNING) {
            test = true;
        } else {
            warnings.push(warning.to_owned());
        }
    }
    if !warnings.is_empty() {
        message.push_str(&format!(
            ", warnings: {} {}",
            warnings.len(),
            serde_json::to_string(&warnings)?
        ));
    }

    Ok(GatewayResponse::Success {
        test,
        recipients,
        deliver_date,
        warnings,
        message,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|item| item.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|item| item.text())
}

fn parse_deliver_date(value: &str) -> Result<NaiveDateTime, TransportError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.naive_local());
    }
    DELIVER_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| TransportError::DeliverDate {
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GatewayResponse {
        GatewayResponse::parse(body.as_bytes())
    }

    #[test]
    fn ok_response_counts_recipients() {
        let response = parse(
            "<response><result>OK</result><recipients><recipient/></recipients></response>",
        );
        assert!(!response.is_failure());
        assert!(!response.is_test());
        assert_eq!(response.message(), "Recipients: 1");
    }

    #[test]
    fn missing_recipients_count_as_zero() {
        let response = parse("<response><result>ok</result></response>");
        assert_eq!(response.message(), "Recipients: 0");
    }

    #[test]
    fn error_result_is_case_insensitive() {
        let response = parse(
            "<response><result>Error</result><error>Invalid login</error></response>",
        );
        assert_eq!(
            response,
            GatewayResponse::Failure {
                reason: FailureReason::Gateway,
                message: "Invalid login".to_owned(),
            }
        );
    }

    #[test]
    fn empty_body_is_a_failure() {
        for body in ["", "  \n\t"] {
            let response = parse(body);
            assert_eq!(
                response,
                GatewayResponse::failure(FailureReason::EmptyResponse, "Empty response")
            );
        }
    }

    #[test]
    fn malformed_xml_is_an_unexpected_response() {
        for body in ["not xml", "<response><result>OK</result>", "<a></b>"] {
            let response = parse(body);
            assert_eq!(
                response,
                GatewayResponse::failure(FailureReason::UnexpectedResponse, "Unexpected response")
            );
        }
    }

    #[test]
    fn deliver_date_is_reformatted() {
        let response = parse(
            "<response><result>OK</result>\
             <recipients><recipient>00491701234567</recipient><recipient>00491517654321</recipient></recipients>\
             <deliverDate>2024-03-09 07:05:00</deliverDate></response>",
        );
        assert_eq!(
            response.message(),
            "Recipients: 2, delivered: 2024.03.09 07:05:00"
        );
    }

    #[test]
    fn unparseable_deliver_date_is_an_unexpected_response() {
        let response = parse(
            "<response><result>OK</result><deliverDate>soon</deliverDate></response>",
        );
        assert!(response.is_failure());
        assert_eq!(response.message(), "Unexpected response");
    }

    #[test]
    fn test_mode_warning_sets_flag_and_is_hidden() {
        let response = parse(
            "<response><result>OK</result><recipients><recipient/></recipients>\
             <warnings><warning>510 test mode</warning></warnings></response>",
        );
        assert!(response.is_test());
        assert_eq!(response.message(), "Recipients: 1");
    }

    #[test]
    fn remaining_warnings_are_listed_as_json() {
        let response = parse(
            "<response><result>OK</result><recipients><recipient/></recipients>\
             <warnings><warning>510 test mode</warning><warning>302 sender replaced</warning>\
             </warnings></response>",
        );
        assert!(response.is_test());
        assert_eq!(
            response.message(),
            r#"Recipients: 1, warnings: 1 ["302 sender replaced"]"#
        );
        match response {
            GatewayResponse::Success { warnings, .. } => {
                assert_eq!(warnings, vec!["302 sender replaced".to_owned()]);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn latin1_declaration_decodes_error_text() {
        let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <response><result>ERROR</result><error>Empf\xE4nger ung\xFCltig</error></response>";
        let response = GatewayResponse::parse(body);
        assert_eq!(response.message(), "Empfänger ungültig");
    }

    #[test]
    fn content_type_charset_decodes_warnings() {
        let body = b"<response><result>OK</result><recipients><recipient/></recipients>\
            <warnings><warning>302 Absender gek\xFCrzt</warning></warnings></response>";
        let response = GatewayResponse::parse_with_content_type(
            body,
            Some("text/xml; charset=\"ISO-8859-1\""),
        );
        assert_eq!(
            response.message(),
            r#"Recipients: 1, warnings: 1 ["302 Absender gekürzt"]"#
        );
    }

    #[test]
    fn invalid_utf8_without_charset_is_read_as_latin1() {
        let body = b"<response><result>error</result><error>Ung\xFCltiger Login</error></response>";
        assert_eq!(GatewayResponse::parse(body).message(), "Ungültiger Login");
    }

    #[test]
    fn utf8_body_is_kept() {
        let body = "<?xml version='1.0' encoding='UTF-8'?>\
            <response><result>ERROR</result><error>Empfänger ungültig</error></response>";
        assert_eq!(parse(body).message(), "Empfänger ungültig");
    }

    #[test]
    fn charset_parameter_is_found() {
        assert_eq!(
            content_type_charset("text/xml;Charset=iso-8859-1"),
            Some("iso-8859-1")
        );
        assert_eq!(content_type_charset("text/xml"), None);
        assert_eq!(
            declared_encoding(b"  <?xml version=\"1.0\" encoding = 'latin1' ?><a/>"),
            Some("latin1")
        );
        assert_eq!(declared_encoding(b"<response/>"), None);
    }
}
