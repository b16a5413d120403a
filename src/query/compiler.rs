//! Match Compiler
//!
//! Turns a declarative `MatchFilter` plus `AccessFilter` into a `QueryPlan`:
//! an ordered list of predicates checked against the keyword schema of one
//! object type. Compilation does not touch the index. The plan keeps the
//! registry snapshot it was compiled against, so later registry writes cannot
//! change what an in-flight query means.

use super::guid::Guid;
use super::tokenizer::tokenize_query;
use super::types::{AccessFilter, Caller, KeyValue, MatchFilter, MatchValue, Range};
use crate::error::{SearchError, SearchResult};
use crate::registry::registry::RegistrySnapshot;
use crate::registry::types::{KeyDescription, KeyValueType, TypeDescriptor};
use crate::storage::types::IndexedObject;

use std::collections::BTreeSet;
use std::sync::Arc;

/// Test applied to a single keyword value.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(KeyValue),
    IntRange(Range<i64>),
    DoubleRange(Range<f64>),
}

impl Condition {
    pub fn test(&self, value: &KeyValue) -> bool {
        match (self, value) {
            (Condition::Equals(expected), actual) => expected == actual,
            (Condition::IntRange(range), KeyValue::Integer(v)) => range.contains(*v),
            (Condition::DoubleRange(range), KeyValue::Double(v)) => range.contains(*v),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Object lives in, or is shared into, this access group.
    AccessGroup(i64),
    ParentGuid(Guid),
    /// Every token appears in the object name.
    ObjectName(Vec<String>),
    Timestamp(Range<i64>),
    /// Every token appears somewhere in the object's indexed text.
    FullText(Vec<String>),
    Key { key_name: String, condition: Condition },
}

impl Predicate {
    pub fn test(&self, object: &IndexedObject) -> bool {
        match self {
            Predicate::AccessGroup(group) => object.in_group(*group),
            Predicate::ParentGuid(guid) => object.parent_guid.as_ref() == Some(guid),
            Predicate::ObjectName(tokens) => tokens.iter().all(|t| object.name_tokens.contains(t)),
            Predicate::Timestamp(range) => range.contains(object.timestamp),
            Predicate::FullText(tokens) => tokens.iter().all(|t| object.tokens.contains(t)),
            Predicate::Key {
                key_name,
                condition,
            } => object
                .key_props
                .get(key_name)
                .is_some_and(|value| condition.test(value)),
        }
    }
}

/// Which objects the caller may see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    /// Groups admitted through private access; `None` when private data was not requested.
    pub private_groups: Option<BTreeSet<i64>>,
    pub public: bool,
}

impl Visibility {
    /// Builds the visibility scope of a search.
    ///
    /// Requesting neither private nor public data is a legitimate empty scope.
    /// Requesting only private data without credentials is an authorization
    /// failure rather than an empty result.
    pub fn for_search(access: &AccessFilter, caller: &Caller) -> SearchResult<Self> {
        if !access.with_private && !access.with_public {
            return Ok(Self::default());
        }
        if access.with_private && !access.with_public && !caller.is_authenticated() {
            return Err(SearchError::Authorization(
                "Private data requested without credentials".to_string(),
            ));
        }

        Ok(Self {
            private_groups: access.with_private.then(|| caller.access_groups.clone()),
            public: access.with_public,
        })
    }

    /// Everything the caller can see, privately or publicly.
    pub fn for_caller(caller: &Caller) -> Self {
        Self {
            private_groups: Some(caller.access_groups.clone()),
            public: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.private_groups.is_none() && !self.public
    }

    pub fn admits(&self, object: &IndexedObject) -> bool {
        let private = self
            .private_groups
            .as_ref()
            .is_some_and(|groups| object.in_any_group(groups));
        private || (self.public && object.is_publicly_visible())
    }
}

/// Compiled, side-effect free description of a search against one type.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    schema: Arc<TypeDescriptor>,
    schema_version: u64,
    visibility: Visibility,
    latest_only: bool,
    predicates: Vec<Predicate>,
}

impl QueryPlan {
    pub fn object_type(&self) -> &str {
        &self.schema.type_name
    }

    pub fn schema(&self) -> &TypeDescriptor {
        &self.schema
    }

    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Only the latest version of each object lineage is considered.
    pub fn latest_only(&self) -> bool {
        self.latest_only
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when no object can ever match, e.g. neither private nor public data requested.
    pub fn matches_nothing(&self) -> bool {
        self.visibility.is_empty()
    }

    /// Evaluates the plan against a single object. The latest-version
    /// restriction spans several objects and is applied by the index.
    pub fn matches(&self, object: &IndexedObject) -> bool {
        object.object_type == self.schema.type_name
            && !object.deleted
            && self.visibility.admits(object)
            && self.predicates.iter().all(|p| p.test(object))
    }
}

pub fn compile(
    snapshot: &RegistrySnapshot,
    object_type: &str,
    filter: &MatchFilter,
    access: &AccessFilter,
    caller: &Caller,
) -> SearchResult<QueryPlan> {
    let schema = snapshot
        .get(object_type)
        .cloned()
        .ok_or_else(|| SearchError::NotFound(format!("No type {} found", object_type)))?;

    let visibility = Visibility::for_search(access, caller)?;
    let mut predicates = Vec::new();

    if let Some(group) = filter.access_group_id {
        predicates.push(Predicate::AccessGroup(group));
    }

    if let Some(parent) = &filter.parent_guid {
        predicates.push(Predicate::ParentGuid(Guid::parse(parent)?));
    }

    if let Some(name) = &filter.object_name {
        let tokens = tokenize_query(name);
        if !tokens.is_empty() {
            predicates.push(Predicate::ObjectName(tokens));
        }
    }

    if let Some(timestamp) = &filter.timestamp {
        predicates.push(Predicate::Timestamp(timestamp_range(timestamp)?));
    }

    if let Some(text) = &filter.full_text_in_all {
        let tokens = tokenize_query(text);
        if !tokens.is_empty() {
            predicates.push(Predicate::FullText(tokens));
        }
    }

    if let Some(lookups) = &filter.lookup_in_keys {
        for (key_name, value) in lookups {
            let key = schema.key(key_name).ok_or_else(|| {
                SearchError::invalid(format!(
                    "Unknown key {} for type {}",
                    key_name, schema.type_name
                ))
            })?;
            predicates.push(Predicate::Key {
                key_name: key_name.clone(),
                condition: key_condition(key, value)?,
            });
        }
    }

    tracing::debug!(
        "Compiled plan for {} with {} predicates (schema version {})",
        schema.type_name,
        predicates.len(),
        snapshot.version()
    );

    Ok(QueryPlan {
        schema,
        schema_version: snapshot.version(),
        visibility,
        latest_only: !access.with_all_history,
        predicates,
    })
}

fn timestamp_range(value: &MatchValue) -> SearchResult<Range<i64>> {
    match value {
        MatchValue::Int(ms) => Ok(Range::exact(*ms)),
        MatchValue::IntRange(range) | MatchValue::DateRange(range) => Ok(*range),
        other => Err(SearchError::invalid(format!(
            "Timestamp constraint must be an integer or a date range, got {}",
            other.describe()
        ))),
    }
}

fn key_condition(key: &KeyDescription, value: &MatchValue) -> SearchResult<Condition> {
    let condition = match (key.key_value_type, value) {
        (KeyValueType::String, MatchValue::Text(s)) => {
            Condition::Equals(KeyValue::String(s.clone()))
        }
        (KeyValueType::Integer, MatchValue::Int(i)) => Condition::Equals(KeyValue::Integer(*i)),
        (KeyValueType::Integer, MatchValue::IntRange(range)) => Condition::IntRange(*range),
        (KeyValueType::Double, MatchValue::Double(d)) => Condition::Equals(KeyValue::Double(*d)),
        (KeyValueType::Double, MatchValue::DoubleRange(range)) => Condition::DoubleRange(*range),
        (KeyValueType::Boolean, MatchValue::Bool(b)) => Condition::Equals(KeyValue::Boolean(*b)),
        (declared, value) => {
            return Err(SearchError::invalid(format!(
                "Key {} has type {} and cannot be matched with a {}",
                key.key_name,
                declared,
                value.describe()
            )));
        }
    };
    Ok(condition)
}
