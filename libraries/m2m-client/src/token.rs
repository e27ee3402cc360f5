//! Access token state and expiry.

use crate::error::{M2mClientError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer};

/// Source of the current time, injectable so expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A bearer token together with the moment it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    /// Token validity in seconds
    pub expires_in: i64,
    pub issued_at: DateTime<Utc>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

impl AccessToken {
    /// Build a token from a parsed token endpoint response.
    pub fn from_response(value: &serde_json::Value, issued_at: DateTime<Utc>) -> Result<Self> {
        let response = TokenResponse::deserialize(value).map_err(|e| {
            M2mClientError::Parse(format!("Failed to parse token response: {}", e))
        })?;

        Ok(Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
            issued_at,
            token_type: response.token_type,
            scope: response.scope,
        })
    }

    /// Last instant at which the token is still valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
            .unwrap_or(if self.expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// Expired strictly after `issued_at + expires_in`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "number_or_string")]
    expires_in: i64,
    token_type: Option<String>,
    scope: Option<String>,
}

/// The token endpoint has been seen returning `expires_in` as a string, and
/// lifetimes may arrive as whole-valued floats (`3600.0`).
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(n) => Ok(n),
        Raw::Float(f) => whole_seconds(f).map_err(serde::de::Error::custom),
        Raw::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => Ok(n),
                Err(_) => s
                    .parse::<f64>()
                    .map_err(|_| format!("invalid expires_in: {:?}", s))
                    .and_then(whole_seconds)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

fn whole_seconds(value: f64) -> std::result::Result<i64, String> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Ok(value as i64)
    } else {
        Err(format!("expires_in is not a whole number of seconds: {}", value))
    }
}
