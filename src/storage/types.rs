use crate::query::guid::Guid;
use crate::query::tokenizer::{tokenize_document, tokenize_text};
use crate::query::types::KeyValue;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// An object as held by the index.
///
/// `access_group_id` is the group the object lives in; `shared_groups` are
/// the extra groups it has been shared into. An object is public when it was
/// published itself or when it is shared into at least one public group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedObject {
    pub guid: Guid,
    pub object_type: String,
    pub parent_guid: Option<Guid>,
    pub object_name: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub data: Value,
    pub parent_data: Option<Value>,
    pub key_props: BTreeMap<String, KeyValue>,
    pub access_group_id: i64,
    pub shared_groups: BTreeSet<i64>,
    pub public_groups: BTreeSet<i64>,
    pub is_public: bool,
    pub deleted: bool,
    #[serde(skip)]
    pub tokens: HashSet<String>,
    #[serde(skip)]
    pub name_tokens: HashSet<String>,
}

impl IndexedObject {
    /// Rebuilds the full-text token sets from name, keyword values and data.
    pub fn refresh_tokens(&mut self) {
        self.name_tokens = tokenize_text(&self.object_name);

        let mut tokens = self.name_tokens.clone();
        for value in self.key_props.values() {
            tokens.extend(tokenize_text(&value.to_display_string()));
        }
        tokenize_document(&self.data, &mut tokens);
        self.tokens = tokens;
    }

    pub fn in_group(&self, access_group_id: i64) -> bool {
        self.access_group_id == access_group_id || self.shared_groups.contains(&access_group_id)
    }

    pub fn in_any_group(&self, groups: &BTreeSet<i64>) -> bool {
        groups.iter().any(|g| self.in_group(*g))
    }

    pub fn is_publicly_visible(&self) -> bool {
        self.is_public || !self.public_groups.is_empty()
    }
}
