use super::assembler::assemble;
use super::executor::QueryExecutor;
use super::types::{
    GetObjectsInput, GetObjectsOutput, ListTypesInput, ListTypesOutput, SearchObjectsInput,
    SearchObjectsOutput, SearchTypesInput, SearchTypesOutput, StatusOutput,
};
use crate::error::{SearchError, SearchResult};
use crate::query::compiler::{Visibility, compile};
use crate::query::guid::Guid;
use crate::query::types::Caller;
use crate::registry::registry::TypeRegistry;
use crate::storage::protocol::ObjectIndex;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;

/// The five operations of the relation engine interface.
pub struct SearchService {
    registry: Arc<TypeRegistry>,
    index: Arc<dyn ObjectIndex>,
    executor: QueryExecutor,
    max_page_size: i64,
    started: Instant,
}

impl SearchService {
    pub fn new(registry: Arc<TypeRegistry>, index: Arc<dyn ObjectIndex>) -> Self {
        Self {
            registry,
            executor: QueryExecutor::new(index.clone()),
            index,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            started: Instant::now(),
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size.max(0);
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub async fn list_types(&self, input: ListTypesInput) -> SearchResult<ListTypesOutput> {
        let types = self.registry.list_types(input.type_name.as_deref()).await?;
        Ok(ListTypesOutput { types })
    }

    /// Counts matches per registered type. Types whose keyword schema cannot
    /// express the filter are skipped; if every type rejects it, the first
    /// rejection is returned.
    pub async fn search_types(
        &self,
        input: SearchTypesInput,
        caller: &Caller,
    ) -> SearchResult<SearchTypesOutput> {
        let started = Instant::now();
        let snapshot = self.registry.snapshot().await;
        let access = input.access_filter.unwrap_or_default();

        let mut plans = Vec::new();
        let mut first_rejection = None;
        for descriptor in snapshot.types() {
            match compile(
                &snapshot,
                &descriptor.type_name,
                &input.match_filter,
                &access,
                caller,
            ) {
                Ok(plan) => plans.push(plan),
                Err(SearchError::InvalidArgument(msg)) => {
                    tracing::debug!("Skipping type {}: {}", descriptor.type_name, msg);
                    first_rejection.get_or_insert(SearchError::InvalidArgument(msg));
                }
                Err(e) => return Err(e),
            }
        }
        if plans.is_empty()
            && let Some(rejection) = first_rejection
        {
            return Err(rejection);
        }

        let mut type_to_count = BTreeMap::new();
        for plan in &plans {
            let count = self.executor.count(plan).await?;
            if count > 0 {
                type_to_count.insert(plan.object_type().to_string(), count);
            }
        }

        Ok(SearchTypesOutput {
            type_to_count,
            search_time: started.elapsed().as_millis() as u64,
        })
    }

    pub async fn search_objects(
        &self,
        input: SearchObjectsInput,
        caller: &Caller,
    ) -> SearchResult<SearchObjectsOutput> {
        let snapshot = self.registry.snapshot().await;
        let access = input.access_filter.unwrap_or_default();
        let pagination = input
            .pagination
            .unwrap_or_default()
            .effective(self.max_page_size)?;
        let sorting_rules = input.sorting_rules.unwrap_or_default();
        let post = input.post_processing.unwrap_or_default();

        let plan = compile(
            &snapshot,
            &input.object_type,
            &input.match_filter,
            &access,
            caller,
        )?;
        let hits = self
            .executor
            .execute(&plan, &sorting_rules, pagination)
            .await?;

        Ok(SearchObjectsOutput {
            pagination,
            sorting_rules,
            objects: assemble(&hits.objects, &post),
            total: hits.total,
            search_time: hits.elapsed_ms,
        })
    }

    /// Direct lookup in request order. Unknown, deleted and invisible GUIDs
    /// are omitted, duplicates are kept, and one malformed GUID fails the call.
    pub async fn get_objects(
        &self,
        input: GetObjectsInput,
        caller: &Caller,
    ) -> SearchResult<GetObjectsOutput> {
        let started = Instant::now();
        let guids = input
            .guids
            .iter()
            .map(|g| Guid::parse(g))
            .collect::<SearchResult<Vec<_>>>()?;
        let post = input.post_processing.unwrap_or_default();

        let found: Vec<_> = self
            .index
            .lookup(&guids, &Visibility::for_caller(caller))
            .await?
            .into_iter()
            .flatten()
            .collect();
        tracing::debug!("Looked up {} GUIDs, {} visible", guids.len(), found.len());

        Ok(GetObjectsOutput {
            objects: assemble(&found, &post),
            search_time: started.elapsed().as_millis() as u64,
        })
    }

    /// Health descriptor. An unavailable index degrades the state rather
    /// than failing the call.
    pub async fn status(&self) -> StatusOutput {
        let snapshot = self.registry.snapshot().await;
        let (state, message, object_count) = match self.index.object_count().await {
            Ok(count) => ("OK", "Service is running".to_string(), count),
            Err(e) => {
                tracing::warn!("Status check could not reach the index: {}", e);
                ("DEGRADED", e.message().to_string(), 0)
            }
        };

        StatusOutput {
            state: state.to_string(),
            message,
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: snapshot.version(),
            type_count: snapshot.len(),
            object_count,
            uptime_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}
