//! # fieldmap-mapping
//!
//! Declarative, bidirectional field mappings between two record schemas.
//!
//! A [`MappingDeclaration`] lists field correspondences between side A and
//! side B. A [`MappingEngine`] built from it translates a [`Record`] from one
//! side to the other and answers which key carries the record identifier.

pub mod declaration;
pub mod engine;
pub mod side;
pub mod transforms;

pub use declaration::{FieldMapping, MappingDeclaration, MappingDsl, SideField, TransformRef};
pub use engine::MappingEngine;
pub use side::Side;
pub use transforms::TransformRegistry;

use thiserror::Error;

/// A flat record keyed by field name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while loading or applying mappings
#[derive(Error, Debug)]
pub enum Error {
    #[error("DSL parse error: {message}")]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown side '{0}', expected 'a' or 'b'")]
    UnknownSide(String),

    #[error("Transform '{0}' is not registered")]
    UnknownTransform(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Fields '{first}' and '{second}' are both marked as identifier")]
    DuplicateIdentifier { first: String, second: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Wrap an error with the name of the field being mapped.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
