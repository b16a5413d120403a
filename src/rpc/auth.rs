use crate::error::{SearchError, SearchResult};
use crate::query::types::Caller;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Turns the token carried by a request into the caller's identity and
/// access groups.
#[async_trait]
pub trait AccessResolver: Send + Sync {
    /// `None` means the request carried no credentials and yields an
    /// anonymous caller. A token that cannot be resolved is an
    /// `Authorization` error.
    async fn resolve(&self, token: Option<&str>) -> SearchResult<Caller>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub user: String,
    #[serde(default)]
    pub access_groups: Vec<i64>,
}

/// Fixed token table, loaded from a JSON object mapping token to grant.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, TokenGrant>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, TokenGrant>) -> Self {
        Self { tokens }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let tokens: HashMap<String, TokenGrant> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file {}", path.display()))?;

        tracing::info!("Loaded {} tokens from {}", tokens.len(), path.display());
        Ok(Self::new(tokens))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AccessResolver for StaticTokens {
    async fn resolve(&self, token: Option<&str>) -> SearchResult<Caller> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(Caller::anonymous());
        };

        let grant = self
            .tokens
            .get(token)
            .ok_or_else(|| SearchError::Authorization("Token is not recognised".to_string()))?;
        Ok(Caller::user(&grant.user, grant.access_groups.iter().copied()))
    }
}
