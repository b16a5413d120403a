//! Shared fixtures for unit tests: a small genome catalogue spread over
//! three access groups, one of them public.

use crate::query::types::{Caller, KeyValue};
use crate::registry::registry::TypeRegistry;
use crate::registry::types::{KeyDescription, KeyValueType, TypeDescriptor};
use crate::storage::memory::MemoryIndex;
use crate::storage::protocol::IndexObjectRequest;

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn genome_type() -> TypeDescriptor {
    TypeDescriptor::new(
        "Genome",
        vec![
            KeyDescription::new("features", KeyValueType::Integer),
            KeyDescription::new("domain", KeyValueType::String),
            KeyDescription::new("gc_content", KeyValueType::Double),
            KeyDescription::new("complete", KeyValueType::Boolean),
        ],
    )
}

pub fn narrative_type() -> TypeDescriptor {
    TypeDescriptor::new(
        "Narrative",
        vec![KeyDescription::new("cells", KeyValueType::Integer)],
    )
}

pub fn alice() -> Caller {
    Caller::user("alice", [1, 2])
}

pub fn bob() -> Caller {
    Caller::user("bob", [2])
}

pub fn genome(
    guid: &str,
    name: &str,
    timestamp: i64,
    features: i64,
    domain: &str,
    data: Value,
) -> IndexObjectRequest {
    let mut key_props = BTreeMap::new();
    key_props.insert("features".to_string(), KeyValue::Integer(features));
    key_props.insert("domain".to_string(), KeyValue::String(domain.to_string()));

    IndexObjectRequest {
        guid: guid.to_string(),
        object_type: "Genome".to_string(),
        parent_guid: None,
        object_name: name.to_string(),
        timestamp,
        data,
        parent_data: None,
        key_props,
        access_group_id: None,
        is_public: false,
    }
}

/// Genomes:
/// - `WS:1/1/1` and `WS:1/1/2`: two versions of E. coli K-12, group 1.
/// - `WS:1/2/1`: B. subtilis, group 1.
/// - `WS:2/1/1`: S. cerevisiae, group 2.
/// - `WS:3/1/1`: E. coli O157, group 3, public.
///
/// Narratives:
/// - `WS:1/5/1`: group 1.
pub fn sample_catalogue() -> (Arc<TypeRegistry>, Arc<MemoryIndex>) {
    let registry = TypeRegistry::with_types(vec![genome_type(), narrative_type()])
        .expect("fixture types are valid");
    let index = Arc::new(MemoryIndex::new());
    let genome_schema = genome_type();

    let mut k12_v1 = genome(
        "WS:1/1/1",
        "Escherichia coli K-12",
        1000,
        4300,
        "Bacteria",
        json!({"scientific_name": "Escherichia coli", "assembly": {"contigs": 1, "source": "RefSeq"}}),
    );
    k12_v1
        .key_props
        .insert("gc_content".to_string(), KeyValue::Double(50.7));
    let mut k12_v2 = genome(
        "WS:1/1/2",
        "Escherichia coli K-12",
        2000,
        4400,
        "Bacteria",
        json!({"scientific_name": "Escherichia coli", "assembly": {"contigs": 1, "source": "RefSeq"}}),
    );
    k12_v2
        .key_props
        .insert("gc_content".to_string(), KeyValue::Double(50.8));
    k12_v2
        .key_props
        .insert("complete".to_string(), KeyValue::Boolean(true));
    let mut subtilis = genome(
        "WS:1/2/1",
        "Bacillus subtilis 168",
        1500,
        4200,
        "Bacteria",
        json!({"scientific_name": "Bacillus subtilis", "assembly": {"contigs": 3, "source": "GenBank"}}),
    );
    subtilis
        .key_props
        .insert("gc_content".to_string(), KeyValue::Double(43.5));
    let yeast = genome(
        "WS:2/1/1",
        "Saccharomyces cerevisiae S288C",
        3000,
        6000,
        "Eukaryota",
        json!({"scientific_name": "Saccharomyces cerevisiae", "assembly": {"contigs": 17, "source": "RefSeq"}}),
    );
    let mut o157 = genome(
        "WS:3/1/1",
        "Escherichia coli O157",
        2500,
        5400,
        "Bacteria",
        json!({"scientific_name": "Escherichia coli", "assembly": {"contigs": 2, "source": "GenBank"}}),
    );
    o157.is_public = true;

    for request in [k12_v1, k12_v2, subtilis, yeast, o157] {
        index
            .index_object(&genome_schema, request)
            .expect("fixture genome is valid");
    }

    let mut narrative_props = BTreeMap::new();
    narrative_props.insert("cells".to_string(), KeyValue::Integer(12));
    index
        .index_object(
            &narrative_type(),
            IndexObjectRequest {
                guid: "WS:1/5/1".to_string(),
                object_type: "Narrative".to_string(),
                parent_guid: None,
                object_name: "Escherichia growth narrative".to_string(),
                timestamp: 1200,
                data: json!({"title": "Growth curves"}),
                parent_data: None,
                key_props: narrative_props,
                access_group_id: None,
                is_public: false,
            },
        )
        .expect("fixture narrative is valid");

    (registry, index)
}
