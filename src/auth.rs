//! Bearer-token credential providers.
//!
//! Stores behind an authenticating proxy require an `authorization`
//! header on every request. Token minting itself is out of scope for this
//! crate; implement [`TokenProvider`] over whatever identity mechanism
//! the deployment uses, or use one of the bundled providers.

use std::env;

use crate::error::{Error, Result};

/// Supplies the bearer token attached to every request.
///
/// The provider is consulted once per request, so implementations are
/// free to rotate or refresh tokens between calls.
pub trait TokenProvider: Send + Sync {
    /// Produce the current bearer token.
    fn token(&self) -> Result<String>;
}

/// A fixed token known at construction time.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a literal token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request, so a
/// token rotated by the platform is picked up without restarting.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Read the token from `var` at request time.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvToken {
    fn token(&self) -> Result<String> {
        env::var(&self.var)
            .map_err(|_| Error::Auth(format!("environment variable {} is not set", self.var)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn static_token_returns_value() {
        let provider = StaticToken::new("secret");
        assert_eq!(provider.token().unwrap(), "secret");
    }

    #[test]
    #[serial]
    fn env_token_reads_variable() {
        env::set_var("KVDB_TEST_TOKEN", "from-env");
        let provider = EnvToken::new("KVDB_TEST_TOKEN");
        assert_eq!(provider.token().unwrap(), "from-env");
        env::remove_var("KVDB_TEST_TOKEN");
    }

    #[test]
    #[serial]
    fn env_token_missing_variable_fails() {
        env::remove_var("KVDB_TEST_TOKEN");
        let err = EnvToken::new("KVDB_TEST_TOKEN").token().unwrap_err();
        match err {
            Error::Auth(msg) => assert!(msg.contains("KVDB_TEST_TOKEN")),
            e => panic!("Expected Auth error, got: {:?}", e),
        }
    }
}
