//! Bearer-token credentials read from the process environment.

use catsync_core::Platform;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A bearer token.
///
/// The token is zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wraps a token. Returns `None` for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token.trim().to_string()))
        }
    }

    /// Returns the raw token.
    ///
    /// # Security
    ///
    /// Don't log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value of an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Environment variable holding each platform's token.
pub fn token_variable(platform: Platform) -> &'static str {
    match platform {
        Platform::NetSuite => "NETSUITE_ACCESS_TOKEN",
        Platform::Shopify => "SHOPIFY_ACCESS_TOKEN",
        Platform::Zoey => "ZOEY_API_KEY",
    }
}

/// One optional token per platform.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    netsuite: Option<ApiToken>,
    shopify: Option<ApiToken>,
    zoey: Option<ApiToken>,
}

impl Credentials {
    /// No credentials at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Reads every token from the environment. Empty values count as absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every token through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |platform| lookup(token_variable(platform)).and_then(ApiToken::new);
        Self {
            netsuite: read(Platform::NetSuite),
            shopify: read(Platform::Shopify),
            zoey: read(Platform::Zoey),
        }
    }

    /// Sets the token for `platform`.
    #[must_use]
    pub fn with_token(mut self, platform: Platform, token: impl Into<String>) -> Self {
        let token = ApiToken::new(token);
        match platform {
            Platform::NetSuite => self.netsuite = token,
            Platform::Shopify => self.shopify = token,
            Platform::Zoey => self.zoey = token,
        }
        self
    }

    /// Token for `platform`, if configured.
    pub fn token(&self, platform: Platform) -> Option<&ApiToken> {
        match platform {
            Platform::NetSuite => self.netsuite.as_ref(),
            Platform::Shopify => self.shopify.as_ref(),
            Platform::Zoey => self.zoey.as_ref(),
        }
    }
}
