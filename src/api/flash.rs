//! One-shot status messages carried in a signed cookie.
//!
//! A redirect sets the cookie; the next rendered page reads it and clears it.
//! The value is `base64url(json).base64url(hmac-sha256)` keyed by the configured
//! secret, so clients cannot forge or alter a status.

use crate::gateway::Status;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt::Write as _;
use thiserror::Error;

pub const FLASH_COOKIE_NAME: &str = "portier_flash";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid signing key")]
    Key,
    #[error("invalid cookie header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

#[derive(Clone)]
pub struct Flash {
    key: SecretString,
    secure: bool,
}

impl std::fmt::Debug for Flash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flash")
            .field("key", &"***")
            .field("secure", &self.secure)
            .finish()
    }
}

impl Flash {
    #[must_use]
    pub const fn new(key: SecretString, secure: bool) -> Self {
        Self { key, secure }
    }

    fn mac(&self) -> Result<HmacSha256, FlashError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()).map_err(|_| FlashError::Key)
    }

    /// Serialize and sign a status.
    ///
    /// # Errors
    /// Returns an error if the status cannot be serialized.
    pub fn encode(&self, status: &Status) -> Result<String, FlashError> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(status)?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and deserialize a cookie value. Anything tampered or malformed is `None`.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<Status> {
        let (payload, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// `Set-Cookie` value carrying `status` to the next page.
    ///
    /// # Errors
    /// Returns an error if the status cannot be encoded into a header.
    pub fn set_cookie(&self, status: &Status) -> Result<HeaderValue, FlashError> {
        let value = self.encode(status)?;
        self.cookie(&value, None)
    }

    /// `Set-Cookie` value that expires the flash cookie.
    ///
    /// # Errors
    /// Returns an error if the header cannot be built.
    pub fn clear_cookie(&self) -> Result<HeaderValue, FlashError> {
        self.cookie("", Some(0))
    }

    fn cookie(&self, value: &str, max_age: Option<u32>) -> Result<HeaderValue, FlashError> {
        let mut cookie = format!("{FLASH_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax");
        if let Some(max_age) = max_age {
            let _ = write!(cookie, "; Max-Age={max_age}");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Read the pending status from request cookies.
    ///
    /// The second value is true when a flash cookie was present at all, valid or
    /// not, meaning the response should clear it.
    #[must_use]
    pub fn take(&self, headers: &HeaderMap) -> (Option<Status>, bool) {
        match extract_flash_cookie(headers) {
            Some(value) => (self.decode(&value), true),
            None => (None, false),
        }
    }
}

fn extract_flash_cookie(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == FLASH_COOKIE_NAME && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Category, MSG_INVALID_CREDENTIALS, MSG_REGISTERED};

    fn flash() -> Flash {
        Flash::new(SecretString::from("0123456789abcdef0123456789abcdef".to_string()), false)
    }

    fn cookie_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(COOKIE, value);
        }
        headers
    }

    #[test]
    fn signed_status_decodes() -> Result<(), FlashError> {
        let flash = flash();
        let status = Status::success(MSG_REGISTERED);
        let value = flash.encode(&status)?;
        assert_eq!(flash.decode(&value), Some(status));
        Ok(())
    }

    #[test]
    fn tampered_payload_is_ignored() -> Result<(), FlashError> {
        let flash = flash();
        let value = flash.encode(&Status::danger(MSG_INVALID_CREDENTIALS))?;
        let (_, signature) = value.split_once('.').unwrap_or_default();

        let forged = URL_SAFE_NO_PAD.encode(br#"{"category":"success","message":"Logged in"}"#);
        assert_eq!(flash.decode(&format!("{forged}.{signature}")), None);
        assert_eq!(flash.decode("garbage"), None);
        assert_eq!(flash.decode(""), None);
        Ok(())
    }

    #[test]
    fn other_key_cannot_decode() -> Result<(), FlashError> {
        let value = flash().encode(&Status::success(MSG_REGISTERED))?;
        let other = Flash::new(SecretString::from("another-secret-key-of-some-length".to_string()), false);
        assert_eq!(other.decode(&value), None);
        Ok(())
    }

    #[test]
    fn set_cookie_attributes() -> Result<(), FlashError> {
        let header = flash().set_cookie(&Status::success(MSG_REGISTERED))?;
        let header = header.to_str().unwrap_or_default();
        assert!(header.starts_with("portier_flash="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
        assert!(!header.contains("Max-Age"));

        let secure = Flash::new(SecretString::from("0123456789abcdef".to_string()), true);
        let header = secure.clear_cookie()?;
        let header = header.to_str().unwrap_or_default();
        assert_eq!(
            header,
            "portier_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
        Ok(())
    }

    #[test]
    fn take_reads_cookie_among_others() -> Result<(), FlashError> {
        let flash = flash();
        let value = flash.encode(&Status::danger(MSG_INVALID_CREDENTIALS))?;
        let headers = cookie_header(&format!("theme=dark; portier_flash={value}; lang=en"));

        let (status, present) = flash.take(&headers);
        assert!(present);
        assert_eq!(
            status.map(|status| status.category),
            Some(Category::Danger)
        );
        Ok(())
    }

    #[test]
    fn take_without_cookie() {
        let (status, present) = flash().take(&HeaderMap::new());
        assert_eq!(status, None);
        assert!(!present);

        let (status, present) = flash().take(&cookie_header("portier_flash=bogus"));
        assert_eq!(status, None);
        assert!(present);
    }
}
