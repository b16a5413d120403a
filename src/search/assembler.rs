//! Result Assembler
//!
//! Shapes index hits into `ObjectData` records. Pure: inputs are never
//! modified and output order follows input order.

use super::types::ObjectData;
use crate::query::types::PostProcessing;
use crate::storage::types::IndexedObject;

use serde_json::{Map, Value};

pub fn assemble(objects: &[IndexedObject], post: &PostProcessing) -> Vec<ObjectData> {
    let includes: Vec<Vec<&str>> = post
        .data_includes
        .iter()
        .flatten()
        .filter(|path| !path.is_empty())
        .map(|path| path.split('.').collect())
        .collect();

    objects
        .iter()
        .map(|object| assemble_one(object, post, &includes))
        .collect()
}

fn assemble_one(object: &IndexedObject, post: &PostProcessing, includes: &[Vec<&str>]) -> ObjectData {
    let mut out = ObjectData {
        guid: Some(object.guid.to_string()),
        ..ObjectData::default()
    };
    if post.ids_only {
        return out;
    }

    if post.skip_info {
        out.guid = None;
    } else {
        out.parent_guid = object.parent_guid.as_ref().map(ToString::to_string);
        out.object_name = Some(object.object_name.clone());
        out.timestamp = Some(object.timestamp);
    }

    if !post.skip_keys {
        out.key_props = Some(
            object
                .key_props
                .iter()
                .map(|(name, value)| (name.clone(), value.to_display_string()))
                .collect(),
        );
    }

    if !post.skip_data {
        out.data = Some(project(&object.data, includes));
        out.parent_data = object
            .parent_data
            .as_ref()
            .map(|parent| project(parent, includes));
    }

    out
}

/// Keeps only the dotted paths in `includes`; everything when empty.
fn project(document: &Value, includes: &[Vec<&str>]) -> Value {
    if includes.is_empty() {
        return document.clone();
    }

    let mut projected = Value::Object(Map::new());
    for path in includes {
        if let Some(value) = lookup(document, path) {
            insert(&mut projected, path, value.clone());
        }
    }
    projected
}

fn lookup<'a>(document: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(document, |current, segment| current.as_object()?.get(*segment))
}

fn insert(target: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let Value::Object(fields) = current else {
            return;
        };
        current = fields
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Value::Object(fields) = current {
        fields.insert(last.to_string(), value);
    }
}
