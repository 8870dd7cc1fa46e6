//! Mapping engine
//!
//! Translates records between the two sides of a declaration.

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::declaration::MappingDeclaration;
use crate::side::Side;
use crate::transforms::TransformRegistry;
use crate::Record;

/// Engine for applying a mapping declaration to records
#[derive(Debug, Clone)]
pub struct MappingEngine {
    declaration: MappingDeclaration,
    transforms: TransformRegistry,
}

impl MappingEngine {
    /// Create an engine resolving transforms against the built-in registry
    #[must_use]
    pub fn new(declaration: MappingDeclaration) -> Self {
        Self::with_transforms(declaration, TransformRegistry::with_builtins())
    }

    /// Create an engine with a custom transform registry.
    ///
    /// Nothing is validated here; an unknown transform name only fails when
    /// a record reaches that field.
    #[must_use]
    pub fn with_transforms(declaration: MappingDeclaration, transforms: TransformRegistry) -> Self {
        debug!(
            name = %declaration.name,
            fields = declaration.fields.len(),
            "Initialized mapping engine"
        );
        Self {
            declaration,
            transforms,
        }
    }

    #[must_use]
    pub fn declaration(&self) -> &MappingDeclaration {
        &self.declaration
    }

    /// Map `record`, expressed on side `from`, to a new record on side `to`.
    ///
    /// Fields that are absent, `null` or the empty string are left out of
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a field transform fails or is not registered.
    pub fn map_to(&self, record: &Record, from: Side, to: Side) -> crate::Result<Record> {
        let mut result = Record::new();

        for field in &self.declaration.fields {
            let from_key = &field.side(from).name;
            let target = field.side(to);

            trace!("from {} to {}", from_key, target.name);

            let Some(value) = record.get(from_key) else {
                trace!(
                    key = %from_key,
                    available = ?record.keys().collect::<Vec<_>>(),
                    "Key not found in source record"
                );
                continue;
            };

            if is_empty(value) {
                continue;
            }

            let mut converted = to.convert(value.clone());

            if let Some(transform) = &target.transform {
                let transformed = self
                    .transforms
                    .apply(transform, converted)
                    .map_err(|e| e.in_field(target.name.clone()))?;
                converted = to.convert(transformed);
            }

            result.insert(target.name.clone(), to.convert(converted));
        }

        debug!(
            name = %self.declaration.name,
            %from,
            %to,
            fields = result.len(),
            "Mapped record"
        );

        Ok(result)
    }

    /// Key carrying the record identifier on `side`.
    ///
    /// The first field marked as identifier wins. Returns `None` when the
    /// declaration has no identifier field.
    #[must_use]
    pub fn id_key_for(&self, side: Side) -> Option<&str> {
        match self.declaration.identifier_field() {
            Some(field) => Some(field.side(side).name.as_str()),
            None => {
                warn!(
                    name = %self.declaration.name,
                    "No identifier field in mapping declaration"
                );
                None
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::FieldMapping;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected object"),
        }
    }

    fn engine() -> MappingEngine {
        MappingEngine::new(MappingDeclaration::new(
            "test",
            vec![
                FieldMapping::new("id", "id")
                    .identifier()
                    .with_transform(Side::B, "parse_int"),
                FieldMapping::new("firstname", "prenom"),
                FieldMapping::new("school", "etablissement"),
                FieldMapping::new("phone", "telephone"),
            ],
        ))
    }

    #[test]
    fn test_renames_fields() {
        let mapped = engine()
            .map_to(
                &record(json!({"id": 1, "firstname": "Ada"})),
                Side::A,
                Side::B,
            )
            .unwrap();

        assert_eq!(mapped, record(json!({"id": 1, "prenom": "Ada"})));
    }

    #[test]
    fn test_omits_empty_null_and_missing() {
        let mapped = engine()
            .map_to(
                &record(json!({"id": 1, "firstname": "", "school": null})),
                Side::A,
                Side::B,
            )
            .unwrap();

        assert_eq!(mapped.len(), 1);
        assert!(!mapped.contains_key("prenom"));
        assert!(!mapped.contains_key("etablissement"));
        assert!(!mapped.contains_key("telephone"));
    }

    #[test]
    fn test_ignores_undeclared_keys() {
        let mapped = engine()
            .map_to(
                &record(json!({"firstname": "Ada", "nickname": "A"})),
                Side::A,
                Side::B,
            )
            .unwrap();

        assert_eq!(mapped, record(json!({"prenom": "Ada"})));
    }

    #[test]
    fn test_structured_values_cross_sides() {
        let engine = engine();
        let native = engine
            .map_to(
                &record(json!({"school": "{\"id\":418,\"nom\":\"Turlu tutu\"}"})),
                Side::A,
                Side::B,
            )
            .unwrap();
        assert_eq!(
            native["etablissement"],
            json!({"id": 418, "nom": "Turlu tutu"})
        );

        let text = engine.map_to(&native, Side::B, Side::A).unwrap();
        assert_eq!(text["school"], json!("{\"id\":418,\"nom\":\"Turlu tutu\"}"));
    }

    #[test]
    fn test_transform_runs_for_target_side() {
        let engine = engine();
        let mapped = engine
            .map_to(&record(json!({"id": "4015"})), Side::A, Side::B)
            .unwrap();
        // B-side conversion already parsed the string, parse_int passes it through
        assert_eq!(mapped["id"], json!(4015));

        let back = engine
            .map_to(&record(json!({"id": "x4015"})), Side::B, Side::A)
            .unwrap();
        assert_eq!(back["id"], json!("x4015"));
    }

    #[test]
    fn test_transform_error_propagates() {
        let mut registry = TransformRegistry::new();
        registry.register("fail", |_| {
            Err(crate::Error::Transform("boom".to_string()))
        });
        let engine = MappingEngine::with_transforms(
            MappingDeclaration::new(
                "failing",
                vec![FieldMapping::new("phone", "telephone").with_transform(Side::B, "fail")],
            ),
            registry,
        );

        let err = engine
            .map_to(&record(json!({"phone": "0600"})), Side::A, Side::B)
            .unwrap_err();
        match err {
            crate::Error::Field { field, source } => {
                assert_eq!(field, "telephone");
                assert!(matches!(*source, crate::Error::Transform(_)));
            }
            other => panic!("Expected Field error, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_output_is_reconverted() {
        let mut registry = TransformRegistry::new();
        registry.register("wrap", |value| Ok(json!({ "value": value })));
        let engine = MappingEngine::with_transforms(
            MappingDeclaration::new(
                "wrapping",
                vec![FieldMapping::new("tag", "tag").with_transform(Side::A, "wrap")],
            ),
            registry,
        );

        let mapped = engine
            .map_to(&record(json!({"tag": "x"})), Side::B, Side::A)
            .unwrap();
        assert_eq!(mapped["tag"], json!("{\"value\":\"x\"}"));
    }

    #[test]
    fn test_unknown_transform_fails_lazily() {
        let engine = MappingEngine::with_transforms(
            MappingDeclaration::new(
                "lazy",
                vec![FieldMapping::new("tag", "tag").with_transform(Side::B, "missing")],
            ),
            TransformRegistry::new(),
        );

        assert!(engine.map_to(&Record::new(), Side::A, Side::B).unwrap().is_empty());
        assert!(engine
            .map_to(&record(json!({"tag": "x"})), Side::A, Side::B)
            .is_err());
    }

    #[test]
    fn test_id_key_for() {
        let engine = MappingEngine::new(MappingDeclaration::new(
            "ids",
            vec![
                FieldMapping::new("email", "mail"),
                FieldMapping::new("contact_id", "ext_id").identifier(),
            ],
        ));

        assert_eq!(engine.id_key_for(Side::A), Some("contact_id"));
        assert_eq!(engine.id_key_for(Side::B), Some("ext_id"));
    }

    #[test]
    fn test_id_key_for_without_identifier() {
        let engine = MappingEngine::new(MappingDeclaration::new(
            "no_ids",
            vec![FieldMapping::new("email", "mail")],
        ));

        assert_eq!(engine.id_key_for(Side::B), None);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MappingEngine>();
    }
}
