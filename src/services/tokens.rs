use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, NaiveDateTime};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Issues and verifies bearer tokens of the form
/// `base64(user_id|expires_unix).base64(hmac)`.
///
/// The identity provider exchange that precedes issuance happens upstream;
/// this service only binds an already-known user id to a signed expiry.
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    fn mac(&self) -> anyhow::Result<HmacSha1> {
        HmacSha1::new_from_slice(&self.secret).map_err(|e| anyhow::anyhow!("invalid token secret: {e}"))
    }

    pub fn issue(&self, user_id: &str, now: NaiveDateTime) -> anyhow::Result<String> {
        let expires = (now + self.ttl).and_utc().timestamp();
        let payload = format!("{user_id}|{expires}");

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Returns the user id for a well-formed, correctly signed, unexpired token.
    pub fn verify(&self, token: &str, now: NaiveDateTime) -> Option<String> {
        let (payload_b64, signature_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;

        let payload = String::from_utf8(payload).ok()?;
        let (user_id, expires) = payload.rsplit_once('|')?;
        let expires: i64 = expires.parse().ok()?;
        if now.and_utc().timestamp() >= expires || user_id.is_empty() {
            return None;
        }
        Some(user_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-06-16 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret", 72);
        let token = tokens.issue("user-1", now()).unwrap();
        assert_eq!(tokens.verify(&token, now()), Some("user-1".to_string()));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", 1);
        let token = tokens.issue("user-1", now()).unwrap();
        assert!(tokens.verify(&token, now() + Duration::minutes(59)).is_some());
        assert!(tokens.verify(&token, now() + Duration::hours(1)).is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = TokenService::new("secret", 72).issue("user-1", now()).unwrap();
        assert!(TokenService::new("other", 72).verify(&issued, now()).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = TokenService::new("secret", 72);
        let token = tokens.issue("user-1", now()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{signature}", URL_SAFE_NO_PAD.encode("admin|99999999999"));
        assert!(tokens.verify(&forged, now()).is_none());
        assert!(tokens.verify("garbage", now()).is_none());
    }
}
