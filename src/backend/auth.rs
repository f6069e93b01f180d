//! Wallet session tokens and the request extractors built on them.
//!
//! A token is `<wallet>.<expires_unix>.<hex hmac-sha256>` signed with the
//! configured secret. Handlers ask for [`WalletSession`], [`MemberAccess`]
//! or [`AdminAccess`] and axum rejects the request with a 401 before the
//! handler runs when the caller does not qualify.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{DateTime, TimeZone, Utc};
use ring::hmac;
use serde::Serialize;

use crate::backend::AppState;
use crate::database::models::{Member, Role, WalletAddress};
use crate::error::SaccoError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, wallet: &WalletAddress, now: DateTime<Utc>) -> Result<IssuedToken, SaccoError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| SaccoError::internal(format!("token lifetime out of range: {e}")))?;
        let expires_at = now + ttl;
        let payload = format!("{}.{}", wallet, expires_at.timestamp());
        let tag = hmac::sign(&self.key, payload.as_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", payload, hex::encode(tag.as_ref())),
            expires_at,
        })
    }

    /// Returns the wallet the token was issued to.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<WalletAddress, SaccoError> {
        let invalid = || SaccoError::unauthorized("Invalid authentication token");

        let mut parts = token.trim().splitn(3, '.');
        let (Some(wallet), Some(expires), Some(signature)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let signature = hex::decode(signature).map_err(|_| invalid())?;
        let payload = format!("{wallet}.{expires}");
        hmac::verify(&self.key, payload.as_bytes(), &signature).map_err(|_| invalid())?;

        let expires: i64 = expires.parse().map_err(|_| invalid())?;
        let expires_at = Utc.timestamp_opt(expires, 0).single().ok_or_else(invalid)?;
        if expires_at <= now {
            return Err(invalid());
        }

        WalletAddress::parse(wallet).map_err(|_| invalid())
    }
}

/// `Authorization: Bearer <token>` first, then the `auth_token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

/// First hop of `x-forwarded-for`, recorded in admin logs.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct WalletSession {
    pub wallet: WalletAddress,
}

impl FromRequestParts<AppState> for WalletSession {
    type Rejection = SaccoError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| SaccoError::unauthorized("No authentication token"))?;
        let wallet = state.tokens.verify(&token, Utc::now()).map_err(|err| {
            tracing::debug!(%err, "rejected session token");
            err
        })?;
        Ok(Self { wallet })
    }
}

/// An approved, active member.
#[derive(Debug, Clone)]
pub struct MemberAccess {
    pub member: Member,
}

impl FromRequestParts<AppState> for MemberAccess {
    type Rejection = SaccoError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = WalletSession::from_request_parts(parts, state).await?;
        let member = state
            .sacco
            .member_by_wallet(&session.wallet)
            .await?
            .filter(Member::in_good_standing)
            .ok_or_else(|| SaccoError::unauthorized("Not an approved member"))?;
        Ok(Self { member })
    }
}

/// A member holding the `ADMIN` or `SUPER_ADMIN` role.
#[derive(Debug, Clone)]
pub struct AdminAccess {
    pub admin: Member,
}

impl AdminAccess {
    pub fn is_super_admin(&self) -> bool {
        self.admin.role == Role::SuperAdmin
    }
}

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = SaccoError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MemberAccess { member } = MemberAccess::from_request_parts(parts, state).await?;
        if !member.role.is_admin() {
            tracing::warn!(wallet = %member.wallet_address.shortened(), "non-admin hit an admin route");
            return Err(SaccoError::unauthorized("Not an admin"));
        }
        Ok(Self { admin: member })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_verifies() {
        let now = Utc::now();
        let issued = signer().issue(&wallet(), now).unwrap();
        assert_eq!(signer().verify(&issued.token, now).unwrap(), wallet());
        assert_eq!(issued.expires_at.timestamp(), now.timestamp() + 3600);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let now = Utc::now();
        let issued = signer().issue(&wallet(), now).unwrap();
        let forged = issued
            .token
            .replacen("0x1111", "0x2222", 1);
        assert!(signer().verify(&forged, now).is_err());

        let other = TokenSigner::new("another-secret", Duration::from_secs(3600));
        assert!(other.verify(&issued.token, now).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let issued = signer().issue(&wallet(), now).unwrap();
        let later = now + chrono::Duration::seconds(3601);
        let err = signer().verify(&issued.token, later).unwrap_err();
        assert_eq!(err.to_string(), "Invalid authentication token");
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let now = Utc::now();
        for token in ["", "abc", "0x11.123", "0x11.abc.zz", "..."] {
            assert!(signer().verify(token, now).is_err(), "{token:?} should be rejected");
        }
    }

    #[test]
    fn token_is_read_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=from-cookie"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.7"));
    }
}
