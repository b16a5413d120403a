//! Query Executor
//!
//! Runs a compiled plan against the index, then orders and windows the hits.

use crate::error::{SearchError, SearchResult};
use crate::query::compiler::QueryPlan;
use crate::query::types::{Pagination, SortKey, SortingRule};
use crate::storage::protocol::ObjectIndex;
use crate::storage::types::IndexedObject;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// One page of an ordered result set.
#[derive(Debug, Clone)]
pub struct SearchHits {
    pub objects: Vec<IndexedObject>,
    /// Matches before windowing.
    pub total: u64,
    pub elapsed_ms: u64,
}

struct ResolvedRule {
    key: SortKey,
    descending: bool,
}

pub struct QueryExecutor {
    index: Arc<dyn ObjectIndex>,
}

impl QueryExecutor {
    pub fn new(index: Arc<dyn ObjectIndex>) -> Self {
        Self { index }
    }

    /// Evaluates `plan`, sorts by `rules` (GUID breaks remaining ties) and
    /// returns the `pagination` window. `pagination` must already be validated.
    pub async fn execute(
        &self,
        plan: &QueryPlan,
        rules: &[SortingRule],
        pagination: Pagination,
    ) -> SearchResult<SearchHits> {
        let started = Instant::now();
        let rules = resolve_rules(plan, rules)?;

        let mut objects = self.index.search(plan).await?;
        objects.sort_by(|a, b| compare(a, b, &rules));

        let total = objects.len();
        let start = usize::try_from(pagination.start).unwrap_or(usize::MAX);
        let count = usize::try_from(pagination.count).unwrap_or(0);
        let window: Vec<IndexedObject> = if start >= total {
            Vec::new()
        } else {
            objects.into_iter().skip(start).take(count).collect()
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            "Search on {} (schema version {}, {} predicates) matched {} objects, returning {} ({} ms)",
            plan.object_type(),
            plan.schema_version(),
            plan.predicates().len(),
            total,
            window.len(),
            elapsed_ms
        );

        Ok(SearchHits {
            objects: window,
            total: total as u64,
            elapsed_ms,
        })
    }

    /// Number of objects matching `plan`.
    pub async fn count(&self, plan: &QueryPlan) -> SearchResult<u64> {
        Ok(self.index.search(plan).await?.len() as u64)
    }
}

fn resolve_rules(plan: &QueryPlan, rules: &[SortingRule]) -> SearchResult<Vec<ResolvedRule>> {
    rules
        .iter()
        .map(|rule| {
            let key = rule.sort_key()?;
            if let SortKey::Key(name) = &key
                && plan.schema().key(name).is_none()
            {
                return Err(SearchError::invalid(format!(
                    "Unknown sort key {} for type {}",
                    name,
                    plan.object_type()
                )));
            }
            Ok(ResolvedRule {
                key,
                descending: rule.descending,
            })
        })
        .collect()
}

fn compare(a: &IndexedObject, b: &IndexedObject, rules: &[ResolvedRule]) -> Ordering {
    for rule in rules {
        let ordering = match &rule.key {
            SortKey::Timestamp => directed(a.timestamp.cmp(&b.timestamp), rule.descending),
            SortKey::ObjectName => directed(
                compare_names(&a.object_name, &b.object_name),
                rule.descending,
            ),
            SortKey::Key(name) => match (a.key_props.get(name), b.key_props.get(name)) {
                (Some(x), Some(y)) => directed(x.compare(y), rule.descending),
                // Objects without the key go last in either direction.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.guid.cmp(&b.guid)
}

/// Case-insensitive, with the raw names breaking ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}
