// crates/signon-client/src/token.rs
// ============================================================================
// Module: Token Sources
// Description: Bearer token providers for the remote API.
// Purpose: Decouple request signing from how access tokens are obtained.
// Dependencies: async-trait, tokio
// ============================================================================

//! ## Overview
//! Every request carries a bearer token obtained from a [`TokenSource`].
//! Static and environment-backed sources cover pre-issued tokens;
//! [`CachedTokenSource`] wraps a [`TokenFetcher`] and refreshes the token
//! under a mutex shortly before it expires. Tokens are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ClientError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Refresh window applied before a cached token expires.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Token Source
// ============================================================================

/// Provider of bearer tokens for outgoing requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a bearer token valid for at least the next request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Token`] when no token can be produced.
    async fn bearer_token(&self) -> Result<String, ClientError>;
}

/// Token source returning a fixed token.
pub struct StaticTokenSource {
    /// Pre-issued access token.
    token: String,
}

impl StaticTokenSource {
    /// Creates a static token source.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<String, ClientError> {
        if self.token.trim().is_empty() {
            return Err(ClientError::Token("static token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// Token source reading an environment variable on every call.
pub struct EnvTokenSource {
    /// Environment variable holding the access token.
    var: String,
}

impl EnvTokenSource {
    /// Creates a token source reading `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
        }
    }
}

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn bearer_token(&self) -> Result<String, ClientError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            Ok(_) => Err(ClientError::Token(format!("{} is empty", self.var))),
            Err(_) => Err(ClientError::Token(format!("{} is not set", self.var))),
        }
    }
}

// ============================================================================
// SECTION: Cached Token Source
// ============================================================================

/// Token issued by a [`TokenFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Access token value.
    pub access_token: String,
    /// Lifetime reported by the issuer.
    pub expires_in: Duration,
}

/// Backend that issues fresh access tokens.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Issues a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the issuer refuses or is unreachable.
    async fn fetch(&self) -> Result<IssuedToken, ClientError>;
}

/// Cached token with its refresh deadline.
struct CachedToken {
    /// Access token value.
    access_token: String,
    /// Instant after which the token is refreshed.
    refresh_at: Instant,
}

/// Token source caching tokens from a [`TokenFetcher`].
///
/// # Invariants
/// - At most one refresh runs at a time.
pub struct CachedTokenSource<F> {
    /// Token issuer.
    fetcher: F,
    /// Current token, if any.
    cached: Mutex<Option<CachedToken>>,
}

impl<F: TokenFetcher> CachedTokenSource<F> {
    /// Creates an empty cache over `fetcher`.
    #[must_use]
    pub const fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cached: Mutex::const_new(None),
        }
    }
}

#[async_trait]
impl<F: TokenFetcher> TokenSource for CachedTokenSource<F> {
    async fn bearer_token(&self) -> Result<String, ClientError> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref()
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.access_token.clone());
        }
        let issued = self.fetcher.fetch().await?;
        let refresh_at = Instant::now() + issued.expires_in.saturating_sub(REFRESH_MARGIN);
        let token = issued.access_token.clone();
        *guard = Some(CachedToken {
            access_token: issued.access_token,
            refresh_at,
        });
        Ok(token)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
