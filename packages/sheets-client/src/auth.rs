//! Service-account access tokens (OAuth 2.0 JWT bearer grant).

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, SheetsError};
use crate::types::{GrantClaims, ServiceAccountKey, TokenResponse};

pub(crate) const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before Google's expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches access tokens for one service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)
            .map_err(|e| SheetsError::Credentials(format!("invalid key file: {}", e)))?;
        Self::new(key)
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed assertion for the token endpoint.
    pub(crate) fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?)
    }

    /// A valid access token, fetching a fresh one when the cache is stale.
    pub async fn access_token(&self, http: &Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at > now {
                return Ok(token.value.clone());
            }
        }

        let body = format!(
            "grant_type={}&assertion={}",
            urlencoding::encode(GRANT_TYPE),
            urlencoding::encode(&self.assertion(now)?)
        );

        let response = http
            .post(&self.key.token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = serde_json::from_str(&response.text().await?)?;
        debug!(
            account = %self.key.client_email,
            expires_in = token.expires_in,
            "Fetched Sheets access token"
        );

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in - EXPIRY_MARGIN_SECS),
        });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_file() {
        let err = TokenProvider::from_file("/nonexistent/service-account.json")
            .err()
            .unwrap();
        assert!(matches!(err, SheetsError::Credentials(_)));
    }

    #[test]
    fn test_rejects_non_pem_private_key() {
        let key = ServiceAccountKey {
            client_email: "bot@project.iam.gserviceaccount.com".to_string(),
            private_key: "not a key".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        };
        assert!(matches!(TokenProvider::new(key), Err(SheetsError::Jwt(_))));
    }
}
