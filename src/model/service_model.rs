//! Resolved service model representation

use crate::error::ResolutionWarning;

use super::{ComplexType, EntityType, Operation, Schema, TypeRef};

/// The complete resolved model of one metadata document.
///
/// Types and operations live in flat catalogs shared across schemas;
/// schemas and entity sets reference them by index. Every resolution run
/// builds a fresh model, so the graph is immutable once returned.
#[derive(Debug, Clone, Default)]
pub struct ServiceModel {
    /// Resolved schemas in document order
    pub schemas: Vec<Schema>,
    /// All complex types across all schemas
    pub complex_types: Vec<ComplexType>,
    /// All entity types across all schemas
    pub entity_types: Vec<EntityType>,
    /// All actions across all schemas, bound and unbound
    pub actions: Vec<Operation>,
    /// All functions across all schemas, bound and unbound
    pub functions: Vec<Operation>,
    /// Non-fatal conditions recorded during resolution
    pub warnings: Vec<ResolutionWarning>,
}

impl ServiceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a type by its fully qualified name across both catalogs
    pub fn find_type(&self, full_name: &str) -> Option<TypeRef> {
        if let Some(i) = self.complex_types.iter().position(|c| c.full_name == full_name) {
            return Some(TypeRef::Complex(i));
        }
        self.entity_types
            .iter()
            .position(|e| e.full_name == full_name)
            .map(TypeRef::Entity)
    }

    /// Look up an entity type index by its fully qualified name
    pub fn find_entity_type(&self, full_name: &str) -> Option<usize> {
        self.entity_types.iter().position(|e| e.full_name == full_name)
    }

    /// The base-type reference of a resolved type
    pub fn base_of(&self, type_ref: TypeRef) -> Option<TypeRef> {
        match type_ref {
            TypeRef::Complex(i) => self.complex_types[i].base_type,
            TypeRef::Entity(i) => self.entity_types[i].base_type,
        }
    }

    /// The fully qualified name of a resolved type
    pub fn full_name_of(&self, type_ref: TypeRef) -> &str {
        match type_ref {
            TypeRef::Complex(i) => &self.complex_types[i].full_name,
            TypeRef::Entity(i) => &self.entity_types[i].full_name,
        }
    }

    /// Total number of declared types, the bound for base-chain walks
    pub fn type_count(&self) -> usize {
        self.complex_types.len() + self.entity_types.len()
    }
}
