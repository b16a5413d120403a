//! Serde helpers for the RPC wire format.
//!
//! The interface declares `boolean` as an integer (0 = false, anything else =
//! true), while JSON clients usually send real booleans. Both are accepted.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

fn read_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}

/// Boolean flag, `false` when null.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(read_flag(deserializer)?.unwrap_or(false))
}

/// Boolean flag, `true` when null.
pub fn flag_default_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(read_flag(deserializer)?.unwrap_or(true))
}

pub fn default_true() -> bool {
    true
}

/// Boolean flag that stays `None` when absent or null.
pub fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    read_flag(deserializer)
}
