use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Phone number in the canonical international form the gateway expects (`00<cc><number>`).
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Form field name used by the gateway for recipients (`to`).
    pub const FIELD: &'static str = "to";

    /// Validate a phone number and bring it into `00<cc><number>` form.
    ///
    /// Accepted input is an optional leading `+` followed by digits, whitespace and
    /// dashes. A `+` becomes `00`. Numbers that already carry an international prefix
    /// must continue with a three digit country code pattern whose first digit is
    /// `1`-`9`. Numbers without prefix lose their leading zeros and get
    /// `00` + `default_intl_prefix` prepended.
    pub fn normalize(input: &str, default_intl_prefix: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let (has_plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let well_formed = rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '-');
        if !well_formed || !rest.chars().any(|c| c.is_ascii_digit()) {
            return Err(invalid(
                input,
                "expected digits, spaces, dashes and an optional leading plus sign",
            ));
        }

        let digits = rest.chars().filter(char::is_ascii_digit).collect::<String>();
        let number = if has_plus {
            format!("00{digits}")
        } else {
            digits
        };

        if let Some(international) = number.strip_prefix("00") {
            if !starts_with_country_code(international) {
                return Err(invalid(
                    input,
                    "does not follow international phone numbering standards",
                ));
            }
            return Ok(Self(number));
        }

        let national = number.trim_start_matches('0');
        if national.is_empty() {
            return Err(invalid(input, "no subscriber number after leading zeros"));
        }
        Ok(Self(format!("00{default_intl_prefix}{national}")))
    }

    /// Canonical value as sent to the gateway.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn starts_with_country_code(digits: &str) -> bool {
    matches!(
        digits.as_bytes(),
        [b'1'..=b'9', b'0'..=b'9', b'0'..=b'9', ..]
    )
}

fn invalid(input: &str, reason: &'static str) -> ValidationError {
    ValidationError::InvalidPhoneNumber {
        input: input.to_owned(),
        reason,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sender shown to the recipient (`from`).
pub enum Sender {
    /// Alphanumeric sender name, at most [`Sender::MAX_NAME_LEN`] characters.
    Name(String),
    /// Numeric sender, normalized like a recipient number.
    Number(PhoneNumber),
}

impl Sender {
    /// Form field name used by the gateway (`from`).
    pub const FIELD: &'static str = "from";

    /// Longest sender name the gateway accepts; longer names are truncated.
    pub const MAX_NAME_LEN: usize = 30;

    /// Classify and sanitize a sender value.
    ///
    /// Anything containing an ASCII letter is a sender name and is truncated to
    /// [`Sender::MAX_NAME_LEN`] characters. Everything else must be a valid phone number.
    pub fn parse(input: &str, default_intl_prefix: &str) -> Result<Self, ValidationError> {
        if input.chars().any(|c| c.is_ascii_alphabetic()) {
            return Ok(Self::Name(input.chars().take(Self::MAX_NAME_LEN).collect()));
        }

        PhoneNumber::normalize(input, default_intl_prefix)
            .map(Self::Number)
            .map_err(|_| ValidationError::InvalidSender {
                input: input.to_owned(),
            })
    }

    /// Value as sent to the gateway.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Number(number) => number.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
/// SMS text restricted to the ISO-8859-1 repertoire (`content`).
///
/// The gateway only understands ISO-8859-1. ASCII whitespace and NUL are trimmed and every character
/// outside U+0000..=U+00FF is replaced by [`MessageText::SUBSTITUTE`]. Text that is
/// empty after trimming is kept as empty; sending rejects it later.
pub struct MessageText {
    text: String,
    lossless: bool,
}

impl MessageText {
    /// Form field name used by the gateway (`content`).
    pub const FIELD: &'static str = "content";

    /// Replacement for characters ISO-8859-1 cannot represent.
    pub const SUBSTITUTE: char = '?';

    /// Characters that fit into a single SMS.
    pub const SINGLE_PART_LEN: usize = 160;

    /// Usable characters per part once a message is split into several parts.
    pub const CONCAT_PART_LEN: usize = 153;

    /// Characters stripped from both ends of the input. U+00A0 is a real ISO-8859-1
    /// character and is kept.
    const TRIMMED: &'static [char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

    pub fn new(value: impl AsRef<str>) -> Self {
        let mut lossless = true;
        let text = value
            .as_ref()
            .trim_matches(Self::TRIMMED)
            .chars()
            .map(|c| {
                if u32::from(c) <= 0xFF {
                    c
                } else {
                    lossless = false;
                    Self::SUBSTITUTE
                }
            })
            .collect();
        Self { text, lossless }
    }

    /// The transcoded text. Every character is within U+0000..=U+00FF.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The text as ISO-8859-1 octets.
    pub fn latin1_bytes(&self) -> Vec<u8> {
        self.text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect()
    }

    /// Length in ISO-8859-1 octets, which equals the number of characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// `false` if at least one character had to be substituted.
    pub fn is_lossless(&self) -> bool {
        self.lossless
    }

    /// Number of SMS parts needed to transmit this text.
    ///
    /// Up to 160 characters fit into one part. Longer texts are split into parts of
    /// 153 characters each because of the concatenation header. Empty text needs 0 parts.
    pub fn part_count(&self) -> usize {
        let len = self.len();
        let per_part = if len > Self::SINGLE_PART_LEN {
            Self::CONCAT_PART_LEN
        } else {
            Self::SINGLE_PART_LEN
        };
        len.div_ceil(per_part)
    }
}
