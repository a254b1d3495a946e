//! OHTTP media types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const OHTTP_REQUEST: &str = "message/ohttp-req";
pub const OHTTP_RESPONSE: &str = "message/ohttp-res";

/// The two message types a relay carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaType {
    /// `message/ohttp-req`
    Request,
    /// `message/ohttp-res`
    Response,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Request => OHTTP_REQUEST,
            MediaType::Response => OHTTP_RESPONSE,
        }
    }

    /// Recognize a `Content-Type` value.
    ///
    /// Matching is ASCII case-insensitive on the whole value after trimming
    /// whitespace. Parameters are not accepted.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(OHTTP_REQUEST) {
            Some(MediaType::Request)
        } else if value.eq_ignore_ascii_case(OHTTP_RESPONSE) {
            Some(MediaType::Response)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized media type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMediaType(pub String);

impl fmt::Display for UnknownMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized OHTTP media type: {}", self.0)
    }
}

impl std::error::Error for UnknownMediaType {}

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s).ok_or_else(|| UnknownMediaType(s.to_string()))
    }
}

impl TryFrom<String> for MediaType {
    type Error = UnknownMediaType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaType> for String {
    fn from(media_type: MediaType) -> Self {
        media_type.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognized() {
        assert_eq!(MediaType::parse("message/ohttp-req"), Some(MediaType::Request));
        assert_eq!(MediaType::parse("message/ohttp-res"), Some(MediaType::Response));
        assert_eq!(MediaType::parse(" Message/OHTTP-Req "), Some(MediaType::Request));
    }

    #[test]
    fn test_parse_rejects_others() {
        assert_eq!(MediaType::parse("application/octet-stream"), None);
        assert_eq!(MediaType::parse("message/ohttp-req; charset=utf-8"), None);
        assert_eq!(MediaType::parse("message/ohttp-chunked-req"), None);
        assert_eq!(MediaType::parse(""), None);
    }

    #[test]
    fn test_deserialize_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            types: Vec<MediaType>,
        }

        let parsed: Wrapper = toml::from_str(r#"types = ["message/ohttp-req"]"#).unwrap();
        assert_eq!(parsed.types, vec![MediaType::Request]);

        let bad: Result<Wrapper, _> = toml::from_str(r#"types = ["text/plain"]"#);
        assert!(bad.is_err());
    }
}
