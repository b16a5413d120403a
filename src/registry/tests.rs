//! Registry Module Tests
//!
//! ## Test Scopes
//! - **Descriptors**: Key uniqueness and link-key invariants.
//! - **Registry**: Listing, registration, removal and snapshot isolation.
//! - **Loader**: Reading type files from disk.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::registry::loader::load_types_dir;
    use crate::registry::registry::TypeRegistry;
    use crate::registry::types::{KeyDescription, KeyValueType, TypeDescriptor};

    fn genome_type() -> TypeDescriptor {
        TypeDescriptor::new(
            "Genome",
            vec![
                KeyDescription::new("features", KeyValueType::Integer),
                KeyDescription::new("assembly_guid", KeyValueType::String).hidden(),
                KeyDescription::new("assembly", KeyValueType::String)
                    .with_link_key("assembly_guid"),
            ],
        )
    }

    // ============================================================
    // DESCRIPTOR TESTS
    // ============================================================

    #[test]
    fn test_descriptor_valid() {
        assert!(genome_type().validate().is_ok());
    }

    #[test]
    fn test_descriptor_rejects_dangling_link_key() {
        let descriptor = TypeDescriptor::new(
            "Genome",
            vec![KeyDescription::new("assembly", KeyValueType::String).with_link_key("missing")],
        );

        let err = descriptor.validate().unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(ref msg) if msg.contains("missing")));
    }

    #[test]
    fn test_descriptor_rejects_duplicate_keys() {
        let descriptor = TypeDescriptor::new(
            "Genome",
            vec![
                KeyDescription::new("id", KeyValueType::String),
                KeyDescription::new("id", KeyValueType::Integer),
            ],
        );

        assert!(matches!(
            descriptor.validate(),
            Err(SearchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_descriptor_rejects_empty_name() {
        let descriptor = TypeDescriptor::new("  ", vec![]);
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_descriptor_deserializes_integer_booleans() {
        let json = r#"{
            "type_name": "Feature",
            "type_ui_title": "Feature",
            "keys": [
                {"key_name": "contig_guid", "key_ui_title": "Contig", "key_value_type": "string", "hidden": 1},
                {"key_name": "length", "key_ui_title": "Length", "key_value_type": "integer", "hidden": 0}
            ]
        }"#;

        let descriptor: TypeDescriptor = serde_json::from_str(json).unwrap();
        assert!(descriptor.key("contig_guid").unwrap().hidden);
        assert!(!descriptor.key("length").unwrap().hidden);
        assert_eq!(
            descriptor.key("length").unwrap().key_value_type,
            KeyValueType::Integer
        );
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_list_types_empty_registry() {
        let registry = TypeRegistry::new();
        let types = registry.list_types(None).await.unwrap();
        assert!(types.is_empty());
    }

    #[tokio::test]
    async fn test_list_types_unknown_name() {
        let registry = TypeRegistry::new();
        let result = registry.list_types(Some("Genome")).await;
        assert!(matches!(result, Err(SearchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let registry = TypeRegistry::new();
        registry.register(genome_type()).await.unwrap();
        registry
            .register(TypeDescriptor::new("Assembly", vec![]))
            .await
            .unwrap();

        let all = registry.list_types(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let one = registry.list_types(Some("Genome")).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one["Genome"], genome_type());
    }

    #[tokio::test]
    async fn test_register_invalid_type_is_rejected() {
        let registry = TypeRegistry::new();
        let bad = TypeDescriptor::new(
            "Bad",
            vec![KeyDescription::new("a", KeyValueType::String).with_link_key("b")],
        );

        assert!(registry.register(bad).await.is_err());
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_bumps_version() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.snapshot().await.version(), 0);

        let v1 = registry.register(genome_type()).await.unwrap();
        let v2 = registry.register(genome_type()).await.unwrap();

        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        assert_eq!(registry.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_unaffected_by_later_writes() {
        let registry = TypeRegistry::new();
        registry.register(genome_type()).await.unwrap();

        let before = registry.snapshot().await;
        registry.remove("Genome").await.unwrap();

        assert!(before.get("Genome").is_some());
        assert!(registry.snapshot().await.get("Genome").is_none());
        assert!(registry.snapshot().await.version() > before.version());
    }

    #[tokio::test]
    async fn test_remove_unknown_type() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.remove("Nope").await,
            Err(SearchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_with_types_validates() {
        let ok = TypeRegistry::with_types(vec![genome_type()]).unwrap();
        assert_eq!(ok.snapshot().await.len(), 1);
        assert_eq!(ok.snapshot().await.version(), 1);

        let bad = TypeRegistry::with_types(vec![TypeDescriptor::new("", vec![])]);
        assert!(bad.is_err());
    }

    // ============================================================
    // LOADER TESTS
    // ============================================================

    #[test]
    fn test_load_types_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("genome.json"),
            serde_json::to_string(&genome_type()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a type").unwrap();

        let types = load_types_dir(dir.path()).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].type_name, "Genome");
    }

    #[test]
    fn test_load_types_dir_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_string(&genome_type()).unwrap();
        std::fs::write(dir.path().join("a.json"), &json).unwrap();
        std::fs::write(dir.path().join("b.json"), &json).unwrap();

        let err = load_types_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Multiple definitions"));
    }

    #[test]
    fn test_load_types_dir_rejects_invalid_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.json"),
            r#"{"type_name": "Bad", "keys": [{"key_name": "x", "key_value_type": "string", "link_key": "y"}]}"#,
        )
        .unwrap();

        assert!(load_types_dir(dir.path()).is_err());
    }
}
