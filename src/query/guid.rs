//! Global object identifiers.
//!
//! A GUID looks like `<source>:<reference>[:<subtype>/<subid>]`, for example
//! `WS:2/1/3` or `WS:2/1/3:feature/b0001`. The reference is up to three
//! `/`-separated segments: access group, object and version. Dropping the
//! version yields the lineage shared by every version of one object.

use crate::error::{SearchError, SearchResult};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Guid {
    text: String,
    source: String,
    segments: Vec<String>,
    version: Option<u64>,
    sub_object: Option<(String, String)>,
}

impl Guid {
    pub fn parse(text: &str) -> SearchResult<Self> {
        let malformed = |reason: &str| {
            SearchError::invalid(format!("Malformed GUID \"{}\": {}", text, reason))
        };

        if text.chars().any(char::is_whitespace) {
            return Err(malformed("whitespace is not allowed"));
        }

        let (source, rest) = text
            .split_once(':')
            .ok_or_else(|| malformed("missing source code"))?;
        if source.is_empty() || source.contains('/') {
            return Err(malformed("invalid source code"));
        }

        let (reference, sub) = match rest.split_once(':') {
            Some((reference, sub)) => (reference, Some(sub)),
            None => (rest, None),
        };

        let segments: Vec<String> = reference.split('/').map(str::to_string).collect();
        if segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(malformed("reference must be 1 to 3 non-empty segments"));
        }

        let version = match segments.get(2) {
            Some(v) => Some(
                v.parse::<u64>()
                    .map_err(|_| malformed("version must be a non-negative integer"))?,
            ),
            None => None,
        };

        let sub_object = match sub {
            Some(sub) => {
                let (sub_type, sub_id) = sub
                    .split_once('/')
                    .ok_or_else(|| malformed("sub-object must be <subtype>/<subid>"))?;
                if sub_type.is_empty() || sub_id.is_empty() || sub_id.contains(':') {
                    return Err(malformed("sub-object must be <subtype>/<subid>"));
                }
                Some((sub_type.to_string(), sub_id.to_string()))
            }
            None => None,
        };

        Ok(Self {
            text: text.to_string(),
            source: source.to_string(),
            segments,
            version,
            sub_object,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Access group encoded in the first reference segment, when numeric.
    pub fn access_group_id(&self) -> Option<i64> {
        self.segments.first().and_then(|s| s.parse().ok())
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Identity of the object regardless of version.
    pub fn lineage(&self) -> String {
        let reference = self
            .segments
            .iter()
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
            .join("/");
        match &self.sub_object {
            Some((sub_type, sub_id)) => {
                format!("{}:{}:{}/{}", self.source, reference, sub_type, sub_id)
            }
            None => format!("{}:{}", self.source, reference),
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Guid {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Guid::parse(s)
    }
}

impl PartialEq for Guid {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Guid {}

impl std::hash::Hash for Guid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for Guid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Guid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Guid::parse(&text).map_err(serde::de::Error::custom)
    }
}
