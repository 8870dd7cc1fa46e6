//! Mapping declarations
//!
//! A declaration is plain data: field names per side plus transform names that
//! are resolved against a [`TransformRegistry`] when a record is mapped.

use serde::{Deserialize, Serialize};

use crate::side::Side;
use crate::transforms::TransformRegistry;

/// A complete mapping declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingDeclaration {
    /// Declaration name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Field correspondences, processed in order
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// One correspondence between a field on side A and a field on side B
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    /// Marks the field carrying the record identifier
    #[serde(default, alias = "id", skip_serializing_if = "std::ops::Not::not")]
    pub identifier: bool,

    pub a: SideField,

    pub b: SideField,
}

/// Field name and optional transform on one side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SideField {
    pub name: String,

    /// Transform applied to values arriving on this side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformRef>,
}

/// Reference to registered transforms, by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TransformRef {
    /// A single transform
    Named(String),

    /// Transforms applied left to right
    Chain(Vec<String>),
}

impl TransformRef {
    /// Names referenced, in application order
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            TransformRef::Named(name) => std::slice::from_ref(name),
            TransformRef::Chain(names) => names,
        }
    }
}

impl SideField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, name: impl Into<String>) -> Self {
        self.transform = Some(TransformRef::Named(name.into()));
        self
    }
}

impl FieldMapping {
    /// Map field `a` on side A to field `b` on side B
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            identifier: false,
            a: SideField::new(a),
            b: SideField::new(b),
        }
    }

    #[must_use]
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, side: Side, name: impl Into<String>) -> Self {
        match side {
            Side::A => self.a = self.a.with_transform(name),
            Side::B => self.b = self.b.with_transform(name),
        }
        self
    }

    /// The field definition on `side`
    #[must_use]
    pub fn side(&self, side: Side) -> &SideField {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

impl MappingDeclaration {
    pub fn new(name: impl Into<String>, fields: Vec<FieldMapping>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// First field marked as identifier
    #[must_use]
    pub fn identifier_field(&self) -> Option<&FieldMapping> {
        self.fields.iter().find(|field| field.identifier)
    }

    /// Check the declaration against a transform registry.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty field name, a second identifier field,
    /// or a transform name the registry does not know.
    pub fn validate(&self, registry: &TransformRegistry) -> crate::Result<()> {
        let mut identifier: Option<&FieldMapping> = None;

        for (index, field) in self.fields.iter().enumerate() {
            for side in [Side::A, Side::B] {
                let side_field = field.side(side);
                if side_field.name.trim().is_empty() {
                    return Err(crate::Error::Validation(format!(
                        "field #{index} has an empty name on side {side}"
                    )));
                }
                if let Some(transform) = &side_field.transform {
                    if let Some(missing) = transform
                        .names()
                        .iter()
                        .find(|name| !registry.contains(name.as_str()))
                    {
                        return Err(crate::Error::UnknownTransform(missing.clone())
                            .in_field(side_field.name.clone()));
                    }
                }
            }

            if field.identifier {
                if let Some(first) = identifier {
                    return Err(crate::Error::DuplicateIdentifier {
                        first: first.a.name.clone(),
                        second: field.a.name.clone(),
                    });
                }
                identifier = Some(field);
            }
        }

        Ok(())
    }
}

/// YAML front-end for mapping declarations
pub struct MappingDsl;

impl MappingDsl {
    /// Parse a declaration from YAML
    ///
    /// # Errors
    ///
    /// Returns an error when YAML parsing fails.
    pub fn parse(yaml: &str) -> crate::Result<MappingDeclaration> {
        serde_yaml::from_str(yaml).map_err(|e| crate::Error::Parse {
            message: format!("Failed to parse DSL: {e}"),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
        })
    }

    /// Parse a declaration from a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn parse_file(path: &std::path::Path) -> crate::Result<MappingDeclaration> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Serialize a declaration to YAML
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_yaml(declaration: &MappingDeclaration) -> crate::Result<String> {
        serde_yaml::to_string(declaration).map_err(|e| crate::Error::Parse {
            message: format!("Failed to serialize: {e}"),
            line: None,
            column: None,
        })
    }
}
