//! Error types for odata-proxygen

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during proxy generation
#[derive(Error, Debug)]
pub enum ProxyGenError {
    #[error("Failed to read metadata file: {path}")]
    MetadataReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata document: {message}")]
    MetadataParseError {
        message: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Document is not valid OData metadata: {message}")]
    NotValidMetadata { message: String },

    #[error("Metadata document declares no schemas")]
    NoSchemas,

    #[error("Entity type {entity_type} declares key '{key}' but has no matching property")]
    KeyNotFound { entity_type: String, key: String },

    #[error("Cyclic inheritance detected walking base types from {type_name}")]
    CyclicInheritance { type_name: String },

    #[error("Schema {namespace} has no entity container")]
    MissingEntityContainer { namespace: String },

    #[error("Failed to write generated file: {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No generator options header found in {path}")]
    NoOptionsHeader { path: PathBuf },

    #[error("Invalid generator options header: {message}")]
    InvalidOptionsHeader { message: String },
}

/// Non-fatal conditions recorded during a resolution run.
///
/// Offending items are skipped from attachment but the run completes;
/// callers decide whether to report these to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// Unbalanced `Collection(` syntax, treated as a non-collection type
    MalformedTypeString { raw: String },
    /// Bound operation whose binding parameter matches no entity type or set
    DanglingBinding { operation: String, target: String },
    /// Entity set or singleton referencing an undeclared entity type
    UnknownEntityType { referrer: String, entity_type: String },
    /// Function or action import referencing an undeclared operation
    UnknownOperation { import: String, operation: String },
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionWarning::MalformedTypeString { raw } => {
                write!(f, "malformed collection type syntax '{}'", raw)
            }
            ResolutionWarning::DanglingBinding { operation, target } => {
                write!(
                    f,
                    "bound operation '{}' has no matching owner for binding type '{}'",
                    operation, target
                )
            }
            ResolutionWarning::UnknownEntityType {
                referrer,
                entity_type,
            } => {
                write!(
                    f,
                    "'{}' references unknown entity type '{}'",
                    referrer, entity_type
                )
            }
            ResolutionWarning::UnknownOperation { import, operation } => {
                write!(
                    f,
                    "import '{}' references unknown operation '{}'",
                    import, operation
                )
            }
        }
    }
}
