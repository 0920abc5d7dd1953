//! Caller authentication boundary
//!
//! Token resolution belongs to the hosted auth service; the server only
//! asks "which owner does this bearer token belong to". The static
//! implementation reads a token table from configuration.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::Result;

/// Resolves a bearer token to an owner id
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Some(owner) for a valid token, None for an unknown one
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Config-backed token table
pub struct StaticTokenAuth {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            tokens: config.tokens.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.tokens.get(token).copied())
    }

    fn name(&self) -> &str {
        "static"
    }
}
