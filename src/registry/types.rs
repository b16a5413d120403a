use crate::error::{SearchError, SearchResult};
use crate::wire;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Declared value type of a keyword.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyValueType {
    String,
    Integer,
    Double,
    Boolean,
}

impl fmt::Display for KeyValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValueType::String => write!(f, "string"),
            KeyValueType::Integer => write!(f, "integer"),
            KeyValueType::Double => write!(f, "double"),
            KeyValueType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Description of a searchable keyword of an object type.
///
/// A `hidden` keyword supplies values for other keywords (typically through
/// `link_key`) and is not meant to be displayed, but it can still be filtered
/// and sorted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyDescription {
    pub key_name: String,
    #[serde(default)]
    pub key_ui_title: String,
    pub key_value_type: KeyValueType,
    #[serde(default, deserialize_with = "wire::flag")]
    pub hidden: bool,
    /// Another keyword of the same type providing the GUID used to build an external URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_key: Option<String>,
}

impl KeyDescription {
    pub fn new(key_name: &str, key_value_type: KeyValueType) -> Self {
        Self {
            key_name: key_name.to_string(),
            key_ui_title: key_name.to_string(),
            key_value_type,
            hidden: false,
            link_key: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_link_key(mut self, link_key: &str) -> Self {
        self.link_key = Some(link_key.to_string());
        self
    }
}

/// Description of a searchable object type and its keyword schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDescriptor {
    pub type_name: String,
    #[serde(default)]
    pub type_ui_title: String,
    #[serde(default)]
    pub keys: Vec<KeyDescription>,
}

impl TypeDescriptor {
    pub fn new(type_name: &str, keys: Vec<KeyDescription>) -> Self {
        Self {
            type_name: type_name.to_string(),
            type_ui_title: type_name.to_string(),
            keys,
        }
    }

    pub fn key(&self, key_name: &str) -> Option<&KeyDescription> {
        self.keys.iter().find(|k| k.key_name == key_name)
    }

    /// Checks the descriptor invariants: non-empty names, unique key names and
    /// link keys pointing at keys of this same type.
    pub fn validate(&self) -> SearchResult<()> {
        if self.type_name.trim().is_empty() {
            return Err(SearchError::invalid("type_name must not be empty"));
        }

        let mut seen = HashSet::new();
        for key in &self.keys {
            if key.key_name.trim().is_empty() {
                return Err(SearchError::invalid(format!(
                    "type {} has a key with an empty name",
                    self.type_name
                )));
            }
            if !seen.insert(key.key_name.as_str()) {
                return Err(SearchError::invalid(format!(
                    "type {} declares key {} more than once",
                    self.type_name, key.key_name
                )));
            }
        }

        for key in &self.keys {
            if let Some(link_key) = &key.link_key
                && !seen.contains(link_key.as_str())
            {
                return Err(SearchError::invalid(format!(
                    "key {} of type {} links to unknown key {}",
                    key.key_name, self.type_name, link_key
                )));
            }
        }

        Ok(())
    }
}
