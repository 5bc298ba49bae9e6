//! Resolved service model element types
//!
//! Cross-references between elements are non-owning indices into the flat
//! catalogs held by [`ServiceModel`](super::ServiceModel): a base type's
//! lifetime is independent of any derived type, so derived types carry a
//! [`TypeRef`] rather than an owning pointer.

use crate::model::type_name::TypeDescriptor;

/// Index of a resolved type in the model's flat catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Complex(usize),
    Entity(usize),
}

/// A structural or navigation property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub ty: TypeDescriptor,
    pub nullable: bool,
}

/// A complex type declaration
#[derive(Debug, Clone)]
pub struct ComplexType {
    pub namespace: String,
    pub name: String,
    pub full_name: String,
    pub properties: Vec<Property>,
    /// Unresolved base-type name as declared; kept for diagnostics
    pub base_type_full_name: Option<String>,
    /// Populated exactly once by inheritance resolution
    pub base_type: Option<TypeRef>,
    pub open_type: bool,
}

/// An entity type declaration
#[derive(Debug, Clone)]
pub struct EntityType {
    pub namespace: String,
    pub name: String,
    pub full_name: String,
    pub properties: Vec<Property>,
    pub base_type_full_name: Option<String>,
    pub base_type: Option<TypeRef>,
    pub open_type: bool,
    /// Resolved from the first declared key reference
    pub key: Option<Property>,
    pub navigation_properties: Vec<Property>,
    /// Instance-bound actions attached by the operation binder
    pub actions: Vec<Operation>,
    /// Instance-bound functions attached by the operation binder
    pub functions: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Action,
    Function,
}

/// How an operation is bound. The payload carries the unwrapped
/// binding-parameter descriptor where one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBinding {
    Unbound,
    /// Callable on a single instance of the named entity type
    Instance(TypeDescriptor),
    /// Callable on an entity set of the named entity type
    Collection(TypeDescriptor),
}

/// An action or function
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub full_name: String,
    pub kind: OperationKind,
    pub binding: OperationBinding,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeDescriptor,
}

impl Operation {
    pub fn is_bound(&self) -> bool {
        !matches!(self.binding, OperationBinding::Unbound)
    }

    pub fn is_bound_to_collection(&self) -> bool {
        matches!(self.binding, OperationBinding::Collection(_))
    }
}

/// An operation parameter; optional facets pass through from the declaration
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
    pub nullable: Option<bool>,
    pub unicode: Option<bool>,
    pub max_length: Option<String>,
    pub precision: Option<String>,
    pub scale: Option<String>,
    pub srid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPropertyBinding {
    pub path: String,
    pub target: String,
}

/// An entity set within a container
#[derive(Debug, Clone)]
pub struct EntitySet {
    pub name: String,
    pub full_name: String,
    pub namespace: String,
    /// Index into the model's entity-type catalog
    pub entity_type: usize,
    pub navigation_property_bindings: Vec<NavigationPropertyBinding>,
    /// Collection-bound actions attached by the operation binder
    pub actions: Vec<Operation>,
    /// Collection-bound functions attached by the operation binder
    pub functions: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Singleton {
    pub name: String,
    /// Index into the model's entity-type catalog
    pub entity_type: usize,
}

#[derive(Debug, Clone)]
pub struct FunctionImport {
    pub name: String,
    /// Index into the model's unbound function catalog
    pub function: usize,
    pub entity_set: Option<String>,
    pub include_in_service_document: bool,
}

#[derive(Debug, Clone)]
pub struct ActionImport {
    pub name: String,
    /// Index into the model's unbound action catalog
    pub action: usize,
    pub entity_set: Option<String>,
}

/// The aggregate of sets, singletons, and imports exposed by one schema
#[derive(Debug, Clone)]
pub struct EntityContainer {
    pub namespace: String,
    pub name: String,
    pub full_name: String,
    pub entity_sets: Vec<EntitySet>,
    pub singletons: Vec<Singleton>,
    pub function_imports: Vec<FunctionImport>,
    pub action_imports: Vec<ActionImport>,
}

/// One resolved schema namespace
#[derive(Debug, Clone)]
pub struct Schema {
    pub namespace: String,
    /// Indices into the model's complex-type catalog
    pub complex_types: Vec<usize>,
    /// Indices into the model's entity-type catalog
    pub entity_types: Vec<usize>,
    pub enum_types: Vec<EnumType>,
    pub entity_container: Option<EntityContainer>,
}

impl Schema {
    /// The schema's container, for consumers that require one
    pub fn require_container(&self) -> Result<&EntityContainer, crate::error::ProxyGenError> {
        self.entity_container
            .as_ref()
            .ok_or_else(|| crate::error::ProxyGenError::MissingEntityContainer {
                namespace: self.namespace.clone(),
            })
    }
}
