//! Session token payload decoding
//!
//! Tokens are issued and verified by the gateway. The portal only reads the
//! payload segment to pre-fill display fields, so nothing here checks the
//! signature or the expiry. A decoded [`Claims`] value is a display hint,
//! never proof of identity; authorization decisions rely on fields the
//! gateway reported directly.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};
use tracing::debug;

/// Standard alphabet, padding optional, lenient trailing bits
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Unverified claims extracted from a token payload
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    inner: Map<String, Value>,
}

impl Claims {
    /// Gets a claim value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Gets a claim as text. Numbers are rendered, other types are ignored.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.inner.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// User identifier: `sub`, then `userId`, then `id`
    pub fn subject(&self) -> Option<String> {
        ["sub", "userId", "id"]
            .iter()
            .find_map(|key| self.get_text(key))
    }

    pub fn email(&self) -> Option<String> {
        self.get_text("email")
    }

    /// Display name: `name`, then `username`
    pub fn display_name(&self) -> Option<String> {
        self.get_text("name").or_else(|| self.get_text("username"))
    }

    /// Gets the underlying mapping
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }
}

/// Decode the payload of a three-part dot-separated token.
///
/// Returns `None` on any malformed input: fewer than three segments,
/// invalid base64, bytes that are not UTF-8, or a payload that is not a
/// JSON object.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            debug!("Token does not have three segments");
            return None;
        }
    };

    let standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE
        .decode(standard)
        .map_err(|e| debug!("Token payload is not valid base64: {}", e))
        .ok()?;
    let text = String::from_utf8(bytes)
        .map_err(|e| debug!("Token payload is not valid UTF-8: {}", e))
        .ok()?;

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(inner)) => Some(Claims { inner }),
        Ok(_) => {
            debug!("Token payload is not a JSON object");
            None
        }
        Err(e) => {
            debug!("Token payload is not valid JSON: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::json;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decodes_payload_into_claims() {
        let token = token_with_payload(r#"{"sub":"u1","email":"a@b.com","iat":1700000000}"#);
        let claims = decode_claims(&token).expect("claims");

        assert_eq!(claims.subject().as_deref(), Some("u1"));
        assert_eq!(claims.email().as_deref(), Some("a@b.com"));
        assert_eq!(claims.get("iat"), Some(&json!(1700000000)));
        assert_eq!(
            Value::Object(claims.as_map().clone()),
            json!({"sub":"u1","email":"a@b.com","iat":1700000000})
        );
    }

    #[test]
    fn test_recovers_non_ascii_text() {
        let token = token_with_payload(r#"{"sub":"u2","name":"João Conceição"}"#);
        let claims = decode_claims(&token).expect("claims");
        assert_eq!(claims.display_name().as_deref(), Some("João Conceição"));
    }

    #[test]
    fn test_accepts_url_safe_and_padded_payloads() {
        // "?>?" encodes to "Pz4/" in the standard alphabet, "Pz4_" url-safe
        let payload = r#"{"note":"?>?"}"#;
        let padded = format!("h.{}.s", STANDARD.encode(payload));
        let url_safe = token_with_payload(payload);

        assert!(url_safe.contains('_') || url_safe.contains('-'));
        assert_eq!(decode_claims(&padded), decode_claims(&url_safe));
        assert!(decode_claims(&padded).is_some());
    }

    #[test]
    fn test_subject_fallbacks() {
        let by_user_id = decode_claims(&token_with_payload(r#"{"userId":7}"#)).unwrap();
        assert_eq!(by_user_id.subject().as_deref(), Some("7"));

        let by_id = decode_claims(&token_with_payload(r#"{"id":"c-9","username":"ana"}"#)).unwrap();
        assert_eq!(by_id.subject().as_deref(), Some("c-9"));
        assert_eq!(by_id.display_name().as_deref(), Some("ana"));

        let none = decode_claims(&token_with_payload(r#"{"email":"x@y.z"}"#)).unwrap();
        assert_eq!(none.subject(), None);
    }

    #[test]
    fn test_malformed_tokens_decode_to_none() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"u1"}"#);

        assert_eq!(decode_claims(""), None);
        assert_eq!(decode_claims("no-dots"), None);
        assert_eq!(decode_claims(&format!("header.{}", payload)), None);
        assert_eq!(decode_claims("header.!!!not-base64!!!.sig"), None);
        assert_eq!(decode_claims(&token_with_payload("not json")), None);
        assert_eq!(decode_claims(&token_with_payload("[1,2,3]")), None);
        assert_eq!(
            decode_claims(&format!("h.{}.s", URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0x7b]))),
            None
        );
    }
}
