use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use super::types::Role;
use crate::models::Ownership;

/// Identity claims carried in the session token's payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "userId")]
    pub id: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bearer token attached to gateway calls
///
/// The token is issued and verified server-side; the payload is decoded
/// here only to learn who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: Option<SessionUser>,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let user = decode_claims(&token);
        Self { token, user }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Owner recorded on listings created in this session
    pub fn ownership(&self) -> Ownership {
        match &self.user {
            Some(user) if !user.id.is_empty() => Ownership::Owned(user.id.clone()),
            _ => Ownership::Anonymous,
        }
    }
}

/// Owner for a possibly-absent session.
pub fn ownership_of(session: Option<&Session>) -> Ownership {
    session.map_or(Ownership::Anonymous, Session::ownership)
}

fn decode_claims(token: &str) -> Option<SessionUser> {
    let payload = token.split('.').nth(1)?;
    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Session token payload is not base64: {}", e);
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("Session token payload has no usable claims: {}", e);
            None
        }
    }
}
