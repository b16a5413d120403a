//! Node configuration.
//!
//! Every option can be given on the command line or through the matching
//! `RELATION_ENGINE_*` environment variable.

use crate::registry::loader::load_types_dir;
use crate::registry::registry::TypeRegistry;
use crate::rpc::auth::{AccessResolver, StaticTokens};
use crate::rpc::router::router;
use crate::search::service::{DEFAULT_MAX_PAGE_SIZE, SearchService};
use crate::storage::coordinator::{DEFAULT_MAX_QUEUE_SIZE, IndexerCoordinator};
use crate::storage::memory::MemoryIndex;
use crate::storage::protocol::IndexObjectRequest;

use anyhow::{Context, anyhow};
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "relation_engine")]
#[command(about = "Search and indexing service behind the KBaseRelationEngine interface")]
#[command(version)]
pub struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "RELATION_ENGINE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory of JSON type definitions loaded at startup
    #[arg(long, env = "RELATION_ENGINE_TYPES_DIR")]
    pub types_dir: Option<PathBuf>,

    /// JSON array of objects indexed at startup
    #[arg(long, env = "RELATION_ENGINE_OBJECTS")]
    pub objects: Option<PathBuf>,

    /// JSON object mapping access tokens to users and access groups
    #[arg(long, env = "RELATION_ENGINE_TOKENS")]
    pub tokens: Option<PathBuf>,

    /// Upper bound on pagination.count
    #[arg(long, env = "RELATION_ENGINE_MAX_PAGE_SIZE", default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: i64,

    /// Milliseconds between indexer coordinator cycles
    #[arg(long, env = "RELATION_ENGINE_EVENT_INTERVAL_MS", default_value_t = 1000)]
    pub event_interval_ms: u64,

    /// Most status events held in the ordered queue at once
    #[arg(long, env = "RELATION_ENGINE_MAX_EVENT_QUEUE", default_value_t = DEFAULT_MAX_QUEUE_SIZE)]
    pub max_event_queue: usize,
}

/// Builds the registry, index and resolver described by `cli`, starts the
/// indexer coordinator and returns the router serving them.
pub async fn build_router(cli: &Cli) -> anyhow::Result<Router> {
    anyhow::ensure!(cli.max_event_queue >= 1, "--max-event-queue must be at least 1");

    let types = match &cli.types_dir {
        Some(dir) => load_types_dir(dir)?,
        None => Vec::new(),
    };
    let registry = TypeRegistry::with_types(types)?;

    let index = Arc::new(MemoryIndex::new());
    if let Some(path) = &cli.objects {
        let objects = load_objects(path)?;
        let snapshot = registry.snapshot().await;
        for object in objects {
            let schema = snapshot.get(&object.object_type).ok_or_else(|| {
                anyhow!(
                    "Object {} has unregistered type {}",
                    object.guid,
                    object.object_type
                )
            })?;
            let guid = object.guid.clone();
            index
                .index_object(schema, object)
                .with_context(|| format!("Failed to index object {}", guid))?;
        }
        tracing::info!("Indexed {} objects from {}", index.len(), path.display());
    }

    let resolver: Arc<dyn AccessResolver> = match &cli.tokens {
        Some(path) => Arc::new(StaticTokens::from_file(path)?),
        None => {
            tracing::warn!("No token file given, every caller is anonymous");
            Arc::new(StaticTokens::default())
        }
    };

    let coordinator =
        IndexerCoordinator::new(registry.clone(), index.clone(), cli.max_event_queue);
    coordinator
        .clone()
        .start(Duration::from_millis(cli.event_interval_ms));

    let service = Arc::new(
        SearchService::new(registry, index.clone()).with_max_page_size(cli.max_page_size),
    );
    Ok(router(service, resolver, index, coordinator))
}

pub fn load_objects(path: &Path) -> anyhow::Result<Vec<IndexObjectRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read objects file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse objects file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["relation_engine"]).unwrap();

        assert_eq!(cli.bind, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert!(cli.types_dir.is_none());
        assert_eq!(cli.max_event_queue, DEFAULT_MAX_QUEUE_SIZE);
    }

    #[tokio::test]
    async fn test_build_router_rejects_empty_event_queue() {
        let cli = Cli::try_parse_from(["relation_engine", "--max-event-queue", "0"]).unwrap();
        assert!(build_router(&cli).await.is_err());
    }

    #[tokio::test]
    async fn test_build_router_loads_types_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let types_dir = dir.path().join("types");
        std::fs::create_dir(&types_dir).unwrap();
        std::fs::write(
            types_dir.join("genome.json"),
            json!({"type_name": "Genome", "keys": [{"key_name": "features", "key_value_type": "integer"}]})
                .to_string(),
        )
        .unwrap();
        let objects = dir.path().join("objects.json");
        std::fs::write(
            &objects,
            json!([{
                "guid": "WS:1/1/1",
                "object_type": "Genome",
                "object_name": "E. coli",
                "timestamp": 1,
                "key_props": {"features": 4300},
                "is_public": true
            }])
            .to_string(),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "relation_engine",
            "--types-dir",
            types_dir.to_str().unwrap(),
            "--objects",
            objects.to_str().unwrap(),
        ])
        .unwrap();
        let app = build_router(&cli).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status["type_count"], 1);
        assert_eq!(status["object_count"], 1);
    }

    #[tokio::test]
    async fn test_build_router_rejects_object_of_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let objects = dir.path().join("objects.json");
        std::fs::write(
            &objects,
            json!([{"guid": "WS:1/1/1", "object_type": "Genome", "timestamp": 1}]).to_string(),
        )
        .unwrap();

        let cli =
            Cli::try_parse_from(["relation_engine", "--objects", objects.to_str().unwrap()])
                .unwrap();
        assert!(build_router(&cli).await.is_err());
    }
}
