//! Query Module Tests
//!
//! ## Test Scopes
//! - **GUID**: Parsing, lineage and rejection of malformed identifiers.
//! - **Wire types**: MatchValue decoding and flag leniency.
//! - **Tokenizer**: Normalization shared by indexing and querying.
//! - **Compiler**: Schema checks, visibility rules and predicate evaluation.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::query::compiler::{Predicate, Visibility, compile};
    use crate::query::guid::Guid;
    use crate::query::tokenizer::{tokenize_query, tokenize_text};
    use crate::query::types::{
        AccessFilter, Caller, MatchFilter, MatchValue, Pagination, SortKey, SortingRule,
    };
    use crate::registry::registry::TypeRegistry;
    use crate::testing::{alice, genome_type, narrative_type};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> Arc<TypeRegistry> {
        TypeRegistry::with_types(vec![genome_type(), narrative_type()]).unwrap()
    }

    // ============================================================
    // GUID TESTS
    // ============================================================

    #[test]
    fn test_guid_parse_full() {
        let guid = Guid::parse("WS:2/14/3:feature/b0001").unwrap();

        assert_eq!(guid.to_string(), "WS:2/14/3:feature/b0001");
        assert_eq!(guid.access_group_id(), Some(2));
        assert_eq!(guid.version(), Some(3));
        assert_eq!(guid.lineage(), "WS:2/14:feature/b0001");
    }

    #[test]
    fn test_guid_lineage_ignores_version() {
        let v1 = Guid::parse("WS:2/14/1").unwrap();
        let v2 = Guid::parse("WS:2/14/2").unwrap();

        assert_ne!(v1, v2);
        assert_eq!(v1.lineage(), v2.lineage());
        assert_eq!(v1.lineage(), "WS:2/14");
    }

    #[test]
    fn test_guid_rejects_malformed() {
        for text in [
            "",
            "WS",
            ":2/1/1",
            "WS:",
            "WS:2//1",
            "WS:1/2/3/4",
            "WS:1/2/x",
            "WS:1/2/3:feature",
            "WS:1 /2",
        ] {
            let err = Guid::parse(text).unwrap_err();
            assert!(
                matches!(err, SearchError::InvalidArgument(ref m) if m.contains("Malformed GUID")),
                "expected {:?} to be rejected",
                text
            );
        }
    }

    #[test]
    fn test_guid_serializes_as_string() {
        let guid: Guid = serde_json::from_value(json!("WS:1/2/3")).unwrap();
        assert_eq!(serde_json::to_value(&guid).unwrap(), json!("WS:1/2/3"));
    }

    // ============================================================
    // WIRE TYPE TESTS
    // ============================================================

    #[test]
    fn test_match_value_decodes_single_kind() {
        let value: MatchValue = serde_json::from_value(json!({"min_int": 5})).unwrap();
        assert_eq!(value, MatchValue::int_range(Some(5), None));

        let value: MatchValue = serde_json::from_value(json!({"bool_value": 1})).unwrap();
        assert_eq!(value, MatchValue::Bool(true));
    }

    #[test]
    fn test_match_value_rejects_ambiguous_and_empty() {
        assert!(serde_json::from_value::<MatchValue>(json!({"value": "x", "int_value": 1})).is_err());
        assert!(serde_json::from_value::<MatchValue>(json!({})).is_err());
        assert!(serde_json::from_value::<MatchValue>(json!({"min_int": 9, "max_int": 1})).is_err());
    }

    #[test]
    fn test_access_filter_defaults_and_int_flags() {
        let access: AccessFilter = serde_json::from_value(json!({})).unwrap();
        assert_eq!(access, AccessFilter::default());

        let access: AccessFilter =
            serde_json::from_value(json!({"with_private": 0, "with_public": 1})).unwrap();
        assert_eq!(access, AccessFilter::new(false, true));
    }

    #[test]
    fn test_match_filter_accepts_both_lookup_spellings() {
        let camel: MatchFilter =
            serde_json::from_value(json!({"lookupInKeys": {"domain": {"value": "Bacteria"}}}))
                .unwrap();
        let snake: MatchFilter =
            serde_json::from_value(json!({"lookup_in_keys": {"domain": {"value": "Bacteria"}}}))
                .unwrap();

        assert_eq!(camel, snake);
        assert_eq!(
            camel,
            MatchFilter::new().with_lookup_in_key("domain", MatchValue::Text("Bacteria".into()))
        );
    }

    #[test]
    fn test_sorting_rule_needs_exactly_one_selector() {
        assert_eq!(SortingRule::by_timestamp().sort_key().unwrap(), SortKey::Timestamp);
        assert!(SortingRule::default().sort_key().is_err());

        let mut both = SortingRule::by_key("features");
        both.is_object_name = true;
        assert!(both.sort_key().is_err());
    }

    #[test]
    fn test_pagination_effective() {
        assert_eq!(
            Pagination::new(10, 5000).effective(1000).unwrap(),
            Pagination::new(10, 1000)
        );
        assert!(Pagination::new(-1, 10).effective(1000).is_err());
        assert!(Pagination::new(0, -1).effective(1000).is_err());
    }

    // ============================================================
    // TOKENIZER TESTS
    // ============================================================

    #[test]
    fn test_tokenizer_is_case_and_punctuation_insensitive() {
        let tokens = tokenize_text("Escherichia coli K-12, str. MG1655");

        for expected in ["escherichia", "coli", "k", "12", "str", "mg1655"] {
            assert!(tokens.contains(expected), "missing {}", expected);
        }
        assert_eq!(tokenize_query("Coli coli  COLI"), vec!["coli"]);
    }

    #[test]
    fn test_tokenizer_handles_unicode_letters() {
        assert_eq!(tokenize_query("Straße"), vec!["straße"]);
    }

    // ============================================================
    // COMPILER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_compile_unknown_type() {
        let snapshot = registry().snapshot().await;
        let err = compile(
            &snapshot,
            "Protein",
            &MatchFilter::new(),
            &AccessFilter::default(),
            &alice(),
        )
        .unwrap_err();

        assert_eq!(err, SearchError::NotFound("No type Protein found".to_string()));
    }

    #[tokio::test]
    async fn test_compile_unknown_key() {
        let snapshot = registry().snapshot().await;
        let filter = MatchFilter::new().with_lookup_in_key("color", MatchValue::Text("red".into()));

        let err = compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice())
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(ref m) if m.contains("color")));
    }

    #[tokio::test]
    async fn test_compile_type_mismatch() {
        let snapshot = registry().snapshot().await;
        let filter = MatchFilter::new().with_lookup_in_key("features", MatchValue::Text("x".into()));

        assert!(matches!(
            compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice()),
            Err(SearchError::InvalidArgument(_))
        ));

        let filter = MatchFilter::new().with_lookup_in_key(
            "gc_content",
            MatchValue::int_range(Some(1), Some(2)),
        );
        assert!(matches!(
            compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice()),
            Err(SearchError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_compile_timestamp_accepts_date_range() {
        let snapshot = registry().snapshot().await;
        let filter = MatchFilter::new().with_timestamp(MatchValue::date_range(Some(1), None));

        let plan =
            compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice()).unwrap();
        assert_eq!(plan.predicates().len(), 1);
        assert!(matches!(plan.predicates()[0], Predicate::Timestamp(_)));

        let filter = MatchFilter::new().with_timestamp(MatchValue::Text("yesterday".into()));
        assert!(compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice()).is_err());
    }

    #[tokio::test]
    async fn test_compile_rejects_malformed_parent_guid() {
        let snapshot = registry().snapshot().await;
        let filter = MatchFilter::new().with_parent_guid("not a guid");

        assert!(matches!(
            compile(&snapshot, "Genome", &filter, &AccessFilter::default(), &alice()),
            Err(SearchError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_compile_blank_full_text_adds_no_predicate() {
        let snapshot = registry().snapshot().await;
        let plan = compile(
            &snapshot,
            "Genome",
            &MatchFilter::full_text("  ,;  "),
            &AccessFilter::default(),
            &alice(),
        )
        .unwrap();

        assert!(plan.predicates().is_empty());
    }

    #[tokio::test]
    async fn test_plan_keeps_its_schema_snapshot() {
        let registry = registry();
        let snapshot = registry.snapshot().await;
        let plan = compile(
            &snapshot,
            "Genome",
            &MatchFilter::new(),
            &AccessFilter::default(),
            &alice(),
        )
        .unwrap();

        registry.remove("Genome").await.unwrap();

        assert_eq!(plan.object_type(), "Genome");
        assert_eq!(plan.schema_version(), snapshot.version());
        assert!(plan.schema().key("features").is_some());
    }

    // ============================================================
    // VISIBILITY TESTS
    // ============================================================

    #[test]
    fn test_visibility_private_only_requires_credentials() {
        let err = Visibility::for_search(&AccessFilter::new(true, false), &Caller::anonymous())
            .unwrap_err();
        assert!(matches!(err, SearchError::Authorization(_)));
    }

    #[test]
    fn test_visibility_nothing_requested_is_empty() {
        let visibility =
            Visibility::for_search(&AccessFilter::new(false, false), &Caller::anonymous()).unwrap();
        assert!(visibility.is_empty());
    }

    #[test]
    fn test_visibility_anonymous_public_is_allowed() {
        let visibility =
            Visibility::for_search(&AccessFilter::new(true, true), &Caller::anonymous()).unwrap();

        assert!(visibility.public);
        assert_eq!(visibility.private_groups, Some(Default::default()));
    }
}
