use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use crate::errors::DecodeError;

/// base64 token of the default embed host.
pub const DEFAULT_HOST_TOKEN: &str = "YXV0b2VtYmVkLmNj";

/// decodes an obfuscated host token back into a hostname.
///
/// the token is plain base64 over the ascii hostname; anything that does not
/// decode to a plausible hostname is rejected.
pub fn decode_host(token: &str) -> Result<String, DecodeError> {
    let bytes = BASE64_STANDARD.decode(token.trim())?;
    let host = String::from_utf8(bytes)?;

    let valid = !host.is_empty()
        && host.len() <= 253
        && !host.starts_with(['.', '-'])
        && !host.ends_with(['.', '-'])
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));

    if !valid {
        return Err(DecodeError::InvalidHostname(host));
    }

    Ok(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_host(host: &str) -> String {
        BASE64_STANDARD.encode(host.as_bytes())
    }

    #[test]
    fn decodes_default_token() {
        assert_eq!(decode_host(DEFAULT_HOST_TOKEN).unwrap(), "autoembed.cc");
    }

    #[test]
    fn encode_and_decode_are_inverse() {
        let token = encode_host("viet.example.org");
        assert_eq!(decode_host(&token).unwrap(), "viet.example.org");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_host("not base64!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn rejects_values_that_are_not_hostnames() {
        let token = encode_host("evil.com/path?x=1");
        let err = decode_host(&token).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHostname(_)));

        let err = decode_host("").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHostname(_)));
    }

    #[test]
    fn rejects_non_utf8_payloads() {
        let token = BASE64_STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = decode_host(&token).unwrap_err();
        assert!(matches!(err, DecodeError::Utf8(_)));
    }
}
