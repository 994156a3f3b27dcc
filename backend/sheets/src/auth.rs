use std::fmt;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SheetsError::{self, MissingCredential};

pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccount {
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: restore_newlines(private_key),
        }
    }

    pub fn claims(&self, token_url: &str, issued_at: i64) -> Claims {
        Claims {
            iss: self.client_email.clone(),
            scope: READONLY_SCOPE.to_string(),
            aud: token_url.to_string(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Signed JWT presented to the token endpoint.
    pub fn assertion(&self, token_url: &str, issued_at: i64) -> Result<String, SheetsError> {
        if self.client_email.is_empty() {
            return Err(MissingCredential("service account email"));
        }

        if self.private_key.is_empty() {
            return Err(MissingCredential("service account private key"));
        }

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;

        Ok(encode(
            &Header::new(Algorithm::RS256),
            &self.claims(token_url, issued_at),
            &key,
        )?)
    }
}

// never print the key
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

pub fn restore_newlines(key: &str) -> String {
    key.replace("\\n", "\n")
}

pub async fn fetch_access_token(
    http: &Client,
    account: &ServiceAccount,
    token_url: &str,
) -> Result<String, SheetsError> {
    let assertion = account.assertion(token_url, Utc::now().timestamp())?;

    debug!("Requesting access token for {}", account.client_email);

    let response = http
        .post(token_url)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let body = ensure_success(response).await?.text().await?;
    let token: TokenResponse = serde_json::from_str(&body)?;

    Ok(token.access_token)
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    Err(SheetsError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_newlines() {
        assert_eq!(
            restore_newlines("-----BEGIN-----\\nabc\\ndef\\n-----END-----\\n"),
            "-----BEGIN-----\nabc\ndef\n-----END-----\n"
        );
        assert_eq!(restore_newlines("already\nfine"), "already\nfine");
        assert_eq!(restore_newlines(""), "");
    }

    #[test]
    fn test_claims_window() {
        let account = ServiceAccount::new("reader@project.iam.gserviceaccount.com", "key");
        let claims = account.claims(TOKEN_URL, 1_700_000_000);

        assert_eq!(claims.iss, "reader@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, READONLY_SCOPE);
        assert_eq!(claims.aud, TOKEN_URL);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_missing_email() {
        let account = ServiceAccount::new("", "key");
        let err = account.assertion(TOKEN_URL, 0).unwrap_err();

        assert!(matches!(err, MissingCredential("service account email")));
    }

    #[test]
    fn test_missing_key() {
        let account = ServiceAccount::new("reader@project.iam.gserviceaccount.com", "");
        let err = account.assertion(TOKEN_URL, 0).unwrap_err();

        assert!(matches!(err, MissingCredential("service account private key")));
    }

    #[test]
    fn test_garbage_key() {
        let account = ServiceAccount::new("reader@project.iam.gserviceaccount.com", "not a pem");
        let err = account.assertion(TOKEN_URL, 0).unwrap_err();

        assert!(matches!(err, SheetsError::Key(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let account = ServiceAccount::new("reader@project.iam.gserviceaccount.com", "secret");
        let printed = format!("{account:?}");

        assert!(printed.contains("reader@project"));
        assert!(!printed.contains("secret"));
    }
}
