use crate::error::{SearchError, SearchResult};
use crate::registry::types::KeyValueType;
use crate::wire;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// A typed keyword value stored with an indexed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl KeyValue {
    pub fn value_type(&self) -> KeyValueType {
        match self {
            KeyValue::Boolean(_) => KeyValueType::Boolean,
            KeyValue::Integer(_) => KeyValueType::Integer,
            KeyValue::Double(_) => KeyValueType::Double,
            KeyValue::String(_) => KeyValueType::String,
        }
    }

    /// Converts the value to the declared key type, widening integers to doubles.
    pub fn coerce(self, declared: KeyValueType) -> Option<KeyValue> {
        match (self, declared) {
            (KeyValue::Integer(i), KeyValueType::Double) => Some(KeyValue::Double(i as f64)),
            (value, declared) if value.value_type() == declared => Some(value),
            _ => None,
        }
    }

    /// Text form used in `ObjectData::key_props`.
    pub fn to_display_string(&self) -> String {
        match self {
            KeyValue::Boolean(b) => b.to_string(),
            KeyValue::Integer(i) => i.to_string(),
            KeyValue::Double(d) => d.to_string(),
            KeyValue::String(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyValue::Boolean(_) => 0,
            KeyValue::Integer(_) => 1,
            KeyValue::Double(_) => 2,
            KeyValue::String(_) => 3,
        }
    }

    /// Total order used for sorting. Values of one key share a type, so the
    /// cross-type rank only matters for malformed data.
    pub fn compare(&self, other: &KeyValue) -> Ordering {
        match (self, other) {
            (KeyValue::Boolean(a), KeyValue::Boolean(b)) => a.cmp(b),
            (KeyValue::Integer(a), KeyValue::Integer(b)) => a.cmp(b),
            (KeyValue::Double(a), KeyValue::Double(b)) => a.total_cmp(b),
            (KeyValue::String(a), KeyValue::String(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Inclusive range; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn exact(value: T) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Constraint on a single field: exactly one exact value or one range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchValue", into = "RawMatchValue")]
pub enum MatchValue {
    Text(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    IntRange(Range<i64>),
    DateRange(Range<i64>),
    DoubleRange(Range<f64>),
}

impl MatchValue {
    pub fn int_range(min: Option<i64>, max: Option<i64>) -> Self {
        MatchValue::IntRange(Range { min, max })
    }

    pub fn date_range(min: Option<i64>, max: Option<i64>) -> Self {
        MatchValue::DateRange(Range { min, max })
    }

    pub fn double_range(min: Option<f64>, max: Option<f64>) -> Self {
        MatchValue::DoubleRange(Range { min, max })
    }

    pub fn describe(&self) -> &'static str {
        match self {
            MatchValue::Text(_) => "string value",
            MatchValue::Int(_) => "integer value",
            MatchValue::Double(_) => "double value",
            MatchValue::Bool(_) => "boolean value",
            MatchValue::IntRange(_) => "integer range",
            MatchValue::DateRange(_) => "date range",
            MatchValue::DoubleRange(_) => "double range",
        }
    }
}

/// Flat wire form of `MatchValue`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMatchValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(
        default,
        deserialize_with = "wire::opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_int: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_int: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_double: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_double: Option<f64>,
}

fn checked_range<T: PartialOrd + Copy>(
    min: Option<T>,
    max: Option<T>,
    what: &str,
) -> SearchResult<Range<T>> {
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(SearchError::invalid(format!(
            "MatchValue {} has min greater than max",
            what
        )));
    }
    Ok(Range { min, max })
}

impl TryFrom<RawMatchValue> for MatchValue {
    type Error = SearchError;

    fn try_from(raw: RawMatchValue) -> Result<Self, Self::Error> {
        let mut kinds = Vec::new();
        if let Some(v) = raw.value {
            kinds.push(MatchValue::Text(v));
        }
        if let Some(v) = raw.int_value {
            kinds.push(MatchValue::Int(v));
        }
        if let Some(v) = raw.double_value {
            if v.is_nan() {
                return Err(SearchError::invalid("MatchValue double_value is NaN"));
            }
            kinds.push(MatchValue::Double(v));
        }
        if let Some(v) = raw.bool_value {
            kinds.push(MatchValue::Bool(v));
        }
        if raw.min_int.is_some() || raw.max_int.is_some() {
            kinds.push(MatchValue::IntRange(checked_range(
                raw.min_int,
                raw.max_int,
                "integer range",
            )?));
        }
        if raw.min_date.is_some() || raw.max_date.is_some() {
            kinds.push(MatchValue::DateRange(checked_range(
                raw.min_date,
                raw.max_date,
                "date range",
            )?));
        }
        if raw.min_double.is_some() || raw.max_double.is_some() {
            if raw.min_double.is_some_and(f64::is_nan) || raw.max_double.is_some_and(f64::is_nan)
            {
                return Err(SearchError::invalid("MatchValue double range bound is NaN"));
            }
            kinds.push(MatchValue::DoubleRange(checked_range(
                raw.min_double,
                raw.max_double,
                "double range",
            )?));
        }

        match kinds.len() {
            0 => Err(SearchError::invalid("MatchValue has no value populated")),
            1 => Ok(kinds.remove(0)),
            _ => Err(SearchError::invalid(format!(
                "MatchValue is ambiguous: {} kinds of value populated",
                kinds.len()
            ))),
        }
    }
}

impl From<MatchValue> for RawMatchValue {
    fn from(value: MatchValue) -> Self {
        let mut raw = RawMatchValue::default();
        match value {
            MatchValue::Text(v) => raw.value = Some(v),
            MatchValue::Int(v) => raw.int_value = Some(v),
            MatchValue::Double(v) => raw.double_value = Some(v),
            MatchValue::Bool(v) => raw.bool_value = Some(v),
            MatchValue::IntRange(r) => {
                raw.min_int = r.min;
                raw.max_int = r.max;
            }
            MatchValue::DateRange(r) => {
                raw.min_date = r.min;
                raw.max_date = r.max;
            }
            MatchValue::DoubleRange(r) => {
                raw.min_double = r.min;
                raw.max_double = r.max;
            }
        }
        raw
    }
}

/// Constraints on object properties. Every populated constraint must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text_in_all: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<MatchValue>,
    #[serde(
        rename = "lookupInKeys",
        alias = "lookup_in_keys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lookup_in_keys: Option<BTreeMap<String, MatchValue>>,
}

impl MatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_text(text: &str) -> Self {
        Self {
            full_text_in_all: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_lookup_in_key(mut self, key_name: &str, value: MatchValue) -> Self {
        self.lookup_in_keys
            .get_or_insert_with(BTreeMap::new)
            .insert(key_name.to_string(), value);
        self
    }

    pub fn with_timestamp(mut self, value: MatchValue) -> Self {
        self.timestamp = Some(value);
        self
    }

    pub fn with_object_name(mut self, name: &str) -> Self {
        self.object_name = Some(name.to_string());
        self
    }

    pub fn with_parent_guid(mut self, guid: &str) -> Self {
        self.parent_guid = Some(guid.to_string());
        self
    }

    pub fn with_access_group(mut self, access_group_id: i64) -> Self {
        self.access_group_id = Some(access_group_id);
        self
    }
}

/// Visibility scope of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessFilter {
    /// Data in access groups the caller belongs to.
    #[serde(
        default = "wire::default_true",
        deserialize_with = "wire::flag_default_true"
    )]
    pub with_private: bool,
    /// Data in public access groups.
    #[serde(default, deserialize_with = "wire::flag")]
    pub with_public: bool,
    /// Every version instead of only the latest one of each object.
    #[serde(default, deserialize_with = "wire::flag")]
    pub with_all_history: bool,
}

impl Default for AccessFilter {
    fn default() -> Self {
        Self {
            with_private: true,
            with_public: false,
            with_all_history: false,
        }
    }
}

impl AccessFilter {
    pub fn new(with_private: bool, with_public: bool) -> Self {
        Self {
            with_private,
            with_public,
            with_all_history: false,
        }
    }

    pub fn with_all_history(mut self, all_history: bool) -> Self {
        self.with_all_history = all_history;
        self
    }
}

/// Property selected by a sorting rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Key(String),
    Timestamp,
    ObjectName,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortingRule {
    #[serde(default, deserialize_with = "wire::flag")]
    pub is_timestamp: bool,
    #[serde(default, deserialize_with = "wire::flag")]
    pub is_object_name: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub descending: bool,
}

impl SortingRule {
    pub fn by_key(key_name: &str) -> Self {
        Self {
            key_name: Some(key_name.to_string()),
            ..Self::default()
        }
    }

    pub fn by_timestamp() -> Self {
        Self {
            is_timestamp: true,
            ..Self::default()
        }
    }

    pub fn by_object_name() -> Self {
        Self {
            is_object_name: true,
            ..Self::default()
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// The single property this rule sorts on.
    pub fn sort_key(&self) -> SearchResult<SortKey> {
        let selected = [self.key_name.is_some(), self.is_timestamp, self.is_object_name]
            .iter()
            .filter(|s| **s)
            .count();
        if selected != 1 {
            return Err(SearchError::invalid(
                "Sorting rule must set exactly one of key_name, is_timestamp or is_object_name",
            ));
        }

        Ok(match &self.key_name {
            Some(key) => SortKey::Key(key.clone()),
            None if self.is_timestamp => SortKey::Timestamp,
            None => SortKey::ObjectName,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_page_size")]
    pub count: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            start: 0,
            count: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(start: i64, count: i64) -> Self {
        Self { start, count }
    }

    /// Validates the window and caps `count` at `max_count`.
    pub fn effective(&self, max_count: i64) -> SearchResult<Pagination> {
        if self.start < 0 {
            return Err(SearchError::invalid(format!(
                "Pagination start must be non-negative, got {}",
                self.start
            )));
        }
        if self.count < 0 {
            return Err(SearchError::invalid(format!(
                "Pagination count must be non-negative, got {}",
                self.count
            )));
        }
        Ok(Pagination {
            start: self.start,
            count: self.count.min(max_count),
        })
    }
}

/// What to return about each found object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostProcessing {
    /// Only the GUID; overrides every other option.
    #[serde(default, deserialize_with = "wire::flag")]
    pub ids_only: bool,
    /// Omit guid, parent_guid, object_name and timestamp.
    #[serde(default, deserialize_with = "wire::flag")]
    pub skip_info: bool,
    /// Omit key_props.
    #[serde(default, deserialize_with = "wire::flag")]
    pub skip_keys: bool,
    /// Omit data and parent_data.
    #[serde(default, deserialize_with = "wire::flag")]
    pub skip_data: bool,
    /// Dotted paths of the data fields to keep; empty keeps everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_includes: Option<Vec<String>>,
}

impl PostProcessing {
    pub fn ids_only() -> Self {
        Self {
            ids_only: true,
            ..Self::default()
        }
    }
}

/// Identity and access rights of whoever issued the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user: Option<String>,
    pub access_groups: BTreeSet<i64>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(name: &str, access_groups: impl IntoIterator<Item = i64>) -> Self {
        Self {
            user: Some(name.to_string()),
            access_groups: access_groups.into_iter().collect(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
