//! Build a resolved service model from raw schema fragments
//!
//! Resolution is a single synchronous run over one complete document:
//!
//! 1. Catalog pass: every schema's types and operations go into flat
//!    global catalogs, base-type names left unresolved.
//! 2. Inheritance pass over the union of all catalogs, so a base type
//!    declared in a later schema still resolves.
//! 3. Instance-bound operations attach to their owning entity types.
//! 4. Containers assemble entity sets, singletons, and imports.
//! 5. Collection-bound operations attach to the assembled entity sets.
//!
//! Dangling references to a single item are recorded as warnings and the
//! item is skipped; a missing key property or a base-type cycle aborts
//! the run.

use anyhow::Result;

use crate::error::{ProxyGenError, ResolutionWarning};
use crate::metadata::{
    RawComplexType, RawEntityContainer, RawEntityType, RawOperation, RawParameter, RawSchema,
};
use crate::model::type_name::{self, TypeDescriptor};

use super::{
    ActionImport, ComplexType, EntityContainer, EntitySet, EntityType, EnumMember, EnumType,
    FunctionImport, NavigationPropertyBinding, Operation, OperationBinding, OperationKind,
    Parameter, Property, Schema, ServiceModel, Singleton, TypeRef,
};

/// Resolve raw schema fragments into a fully cross-referenced model
pub fn build_model(raw_schemas: &[RawSchema]) -> Result<ServiceModel> {
    if raw_schemas.is_empty() {
        return Err(ProxyGenError::NoSchemas.into());
    }

    let mut model = ServiceModel::new();

    // Pass 1: per-schema catalogs, concatenated into the global catalogs.
    // Nothing is resolved yet; types in one schema may depend on schemas
    // processed later.
    for raw in raw_schemas {
        let mut schema = Schema {
            namespace: raw.namespace.clone(),
            complex_types: Vec::new(),
            entity_types: Vec::new(),
            enum_types: raw
                .enum_types
                .iter()
                .map(|e| EnumType {
                    name: e.name.clone(),
                    members: e
                        .members
                        .iter()
                        .map(|m| EnumMember {
                            key: m.name.clone(),
                            value: m.value.clone(),
                        })
                        .collect(),
                })
                .collect(),
            entity_container: None,
        };

        for raw_type in &raw.complex_types {
            schema.complex_types.push(model.complex_types.len());
            let complex = build_complex_type(&raw.namespace, raw_type, &mut model.warnings);
            model.complex_types.push(complex);
        }
        for raw_type in &raw.entity_types {
            schema.entity_types.push(model.entity_types.len());
            let entity = build_entity_type(&raw.namespace, raw_type, &mut model.warnings)?;
            model.entity_types.push(entity);
        }
        for raw_op in &raw.actions {
            let op = build_operation(&raw.namespace, raw_op, OperationKind::Action, &mut model.warnings);
            model.actions.push(op);
        }
        for raw_op in &raw.functions {
            let op =
                build_operation(&raw.namespace, raw_op, OperationKind::Function, &mut model.warnings);
            model.functions.push(op);
        }

        model.schemas.push(schema);
    }

    // Pass 2: inheritance across the union of all schemas
    resolve_inheritance(&mut model)?;

    // Pass 3: instance-bound operations attach to entity types
    bind_instance_operations(&mut model);

    // Pass 4: containers (sets, singletons, imports)
    for (i, raw) in raw_schemas.iter().enumerate() {
        if let Some(raw_container) = &raw.container {
            let mut warnings = Vec::new();
            let container = build_container(&raw.namespace, raw_container, &model, &mut warnings);
            model.schemas[i].entity_container = Some(container);
            model.warnings.extend(warnings);
        }
    }

    // Pass 5: collection-bound operations attach to the assembled sets
    bind_collection_operations(&mut model);

    Ok(model)
}

/// Parse a type reference, recording unbalanced collection syntax
fn descriptor(raw: &str, warnings: &mut Vec<ResolutionWarning>) -> TypeDescriptor {
    if type_name::is_malformed_collection(raw) {
        warnings.push(ResolutionWarning::MalformedTypeString {
            raw: raw.to_string(),
        });
    }
    TypeDescriptor::parse(raw)
}

fn build_complex_type(
    namespace: &str,
    raw: &RawComplexType,
    warnings: &mut Vec<ResolutionWarning>,
) -> ComplexType {
    ComplexType {
        namespace: namespace.to_string(),
        name: raw.name.clone(),
        full_name: format!("{}.{}", namespace, raw.name),
        properties: raw
            .properties
            .iter()
            .map(|p| Property {
                name: p.name.clone(),
                ty: descriptor(&p.type_name, warnings),
                nullable: p.nullable,
            })
            .collect(),
        base_type_full_name: raw.base_type.clone(),
        base_type: None,
        open_type: raw.open_type,
    }
}

fn build_entity_type(
    namespace: &str,
    raw: &RawEntityType,
    warnings: &mut Vec<ResolutionWarning>,
) -> Result<EntityType> {
    let full_name = format!("{}.{}", namespace, raw.name);

    let properties: Vec<Property> = raw
        .properties
        .iter()
        .map(|p| Property {
            name: p.name.clone(),
            ty: descriptor(&p.type_name, warnings),
            nullable: p.nullable,
        })
        .collect();

    // Only the first declared key reference is supported; it must name a
    // declared property.
    let key = match &raw.key {
        Some(key_name) => Some(
            properties
                .iter()
                .find(|p| &p.name == key_name)
                .cloned()
                .ok_or_else(|| ProxyGenError::KeyNotFound {
                    entity_type: full_name.clone(),
                    key: key_name.clone(),
                })?,
        ),
        None => None,
    };

    let navigation_properties = raw
        .navigation_properties
        .iter()
        .map(|p| Property {
            name: p.name.clone(),
            ty: descriptor(&p.type_name, warnings),
            // navigation properties are always nullable
            nullable: true,
        })
        .collect();

    Ok(EntityType {
        namespace: namespace.to_string(),
        name: raw.name.clone(),
        full_name,
        properties,
        base_type_full_name: raw.base_type.clone(),
        base_type: None,
        open_type: raw.open_type,
        key,
        navigation_properties,
        actions: Vec::new(),
        functions: Vec::new(),
    })
}

fn build_operation(
    namespace: &str,
    raw: &RawOperation,
    kind: OperationKind,
    warnings: &mut Vec<ResolutionWarning>,
) -> Operation {
    let parameters: Vec<Parameter> = raw
        .parameters
        .iter()
        .map(|p| build_parameter(p, warnings))
        .collect();

    // The binding parameter is always parameter index 0 of the raw
    // declaration. A bound declaration without parameters has nothing to
    // bind to and is treated as unbound. Classification reuses the built
    // parameter's descriptor; each type string is parsed exactly once.
    let binding = match (raw.is_bound, parameters.first()) {
        (true, Some(p)) if p.ty.is_collection => OperationBinding::Collection(p.ty.clone()),
        (true, Some(p)) => OperationBinding::Instance(p.ty.clone()),
        _ => OperationBinding::Unbound,
    };

    Operation {
        name: raw.name.clone(),
        full_name: format!("{}.{}", namespace, raw.name),
        kind,
        binding,
        parameters,
        return_type: raw
            .return_type
            .as_deref()
            .map(|t| descriptor(t, warnings))
            .unwrap_or_else(TypeDescriptor::void),
    }
}

fn build_parameter(raw: &RawParameter, warnings: &mut Vec<ResolutionWarning>) -> Parameter {
    Parameter {
        name: raw.name.clone(),
        ty: descriptor(&raw.type_name, warnings),
        nullable: raw.nullable,
        unicode: raw.unicode,
        max_length: raw.max_length.clone(),
        precision: raw.precision.clone(),
        scale: raw.scale.clone(),
        srid: raw.srid.clone(),
    }
}

/// Resolve every declared base-type name against the union of all
/// catalogs, then verify no chain cycles.
fn resolve_inheritance(model: &mut ServiceModel) -> Result<()> {
    for i in 0..model.complex_types.len() {
        if let Some(base) = model.complex_types[i].base_type_full_name.clone() {
            model.complex_types[i].base_type = model.find_type(&base);
        }
    }
    for i in 0..model.entity_types.len() {
        if let Some(base) = model.entity_types[i].base_type_full_name.clone() {
            model.entity_types[i].base_type = model.find_type(&base);
        }
    }

    // A chain longer than the total type count can only mean a declaration
    // cycle; downstream consumers walk base chains and must not loop.
    let bound = model.type_count();
    let starts: Vec<TypeRef> = (0..model.complex_types.len())
        .map(TypeRef::Complex)
        .chain((0..model.entity_types.len()).map(TypeRef::Entity))
        .collect();

    for start in starts {
        let mut steps = 0usize;
        let mut current = model.base_of(start);
        while let Some(next) = current {
            steps += 1;
            if steps > bound {
                return Err(ProxyGenError::CyclicInheritance {
                    type_name: model.full_name_of(start).to_string(),
                }
                .into());
            }
            current = model.base_of(next);
        }
    }

    Ok(())
}

/// Attach every instance-bound operation to the entity type its binding
/// parameter names, trimmed and with the owner's key parameter injected.
fn bind_instance_operations(model: &mut ServiceModel) {
    let mut attachments: Vec<(usize, Operation)> = Vec::new();
    let mut warnings: Vec<ResolutionWarning> = Vec::new();

    for op in model.actions.iter().chain(model.functions.iter()) {
        let target = match &op.binding {
            OperationBinding::Instance(desc) => desc,
            _ => continue,
        };
        match model.find_entity_type(&target.qualified_name) {
            Some(idx) => {
                let key = find_key(model, idx);
                attachments.push((idx, trim_instance_bound(op, key.as_ref())));
            }
            None => warnings.push(ResolutionWarning::DanglingBinding {
                operation: op.full_name.clone(),
                target: target.qualified_name.clone(),
            }),
        }
    }

    for (idx, op) in attachments {
        let entity_type = &mut model.entity_types[idx];
        match op.kind {
            OperationKind::Action => entity_type.actions.push(op),
            OperationKind::Function => entity_type.functions.push(op),
        }
    }
    model.warnings.extend(warnings);
}

/// Attach every collection-bound operation to each entity set whose entity
/// type matches the unwrapped binding type, trimmed with no key injected.
fn bind_collection_operations(model: &mut ServiceModel) {
    let mut attachments: Vec<(usize, usize, Operation)> = Vec::new();
    let mut warnings: Vec<ResolutionWarning> = Vec::new();

    for op in model.actions.iter().chain(model.functions.iter()) {
        let target = match &op.binding {
            OperationBinding::Collection(desc) => desc,
            _ => continue,
        };
        let mut matched = false;
        for (s, schema) in model.schemas.iter().enumerate() {
            let Some(container) = &schema.entity_container else {
                continue;
            };
            for (i, set) in container.entity_sets.iter().enumerate() {
                if model.entity_types[set.entity_type].full_name == target.qualified_name {
                    matched = true;
                    attachments.push((s, i, trim_collection_bound(op)));
                }
            }
        }
        if !matched {
            warnings.push(ResolutionWarning::DanglingBinding {
                operation: op.full_name.clone(),
                target: target.qualified_name.clone(),
            });
        }
    }

    for (s, i, op) in attachments {
        if let Some(container) = model.schemas[s].entity_container.as_mut() {
            let set = &mut container.entity_sets[i];
            match op.kind {
                OperationKind::Action => set.actions.push(op),
                OperationKind::Function => set.functions.push(op),
            }
        }
    }
    model.warnings.extend(warnings);
}

/// The key of an entity type, walking the base chain when the type itself
/// declares none. Chains are cycle-checked before binding runs.
fn find_key(model: &ServiceModel, entity_type: usize) -> Option<Property> {
    let mut current = TypeRef::Entity(entity_type);
    loop {
        if let TypeRef::Entity(i) = current {
            if let Some(key) = &model.entity_types[i].key {
                return Some(key.clone());
            }
        }
        current = model.base_of(current)?;
    }
}

/// Trimmed copy for an instance-bound attachment: binding parameter
/// dropped, owner's key parameter injected at position 0.
fn trim_instance_bound(op: &Operation, key: Option<&Property>) -> Operation {
    let mut parameters = Vec::with_capacity(op.parameters.len());
    if let Some(key) = key {
        parameters.push(Parameter {
            name: key.name.clone(),
            ty: key.ty.clone(),
            nullable: Some(false),
            unicode: None,
            max_length: None,
            precision: None,
            scale: None,
            srid: None,
        });
    }
    parameters.extend(op.parameters.iter().skip(1).cloned());
    Operation {
        parameters,
        ..op.clone()
    }
}

/// Trimmed copy for a collection-bound attachment: binding parameter
/// dropped, nothing injected.
fn trim_collection_bound(op: &Operation) -> Operation {
    Operation {
        parameters: op.parameters.iter().skip(1).cloned().collect(),
        ..op.clone()
    }
}

/// Assemble one schema's container against the fully built catalogs
fn build_container(
    namespace: &str,
    raw: &RawEntityContainer,
    model: &ServiceModel,
    warnings: &mut Vec<ResolutionWarning>,
) -> EntityContainer {
    let mut container = EntityContainer {
        namespace: namespace.to_string(),
        name: raw.name.clone(),
        full_name: format!("{}.{}", namespace, raw.name),
        entity_sets: Vec::new(),
        singletons: Vec::new(),
        function_imports: Vec::new(),
        action_imports: Vec::new(),
    };

    for raw_set in &raw.entity_sets {
        match model.find_entity_type(&raw_set.entity_type) {
            Some(idx) => container.entity_sets.push(EntitySet {
                name: raw_set.name.clone(),
                full_name: format!("{}.{}", namespace, raw_set.name),
                namespace: namespace.to_string(),
                entity_type: idx,
                navigation_property_bindings: raw_set
                    .navigation_property_bindings
                    .iter()
                    .map(|b| NavigationPropertyBinding {
                        path: b.path.clone(),
                        target: b.target.clone(),
                    })
                    .collect(),
                actions: Vec::new(),
                functions: Vec::new(),
            }),
            None => warnings.push(ResolutionWarning::UnknownEntityType {
                referrer: raw_set.name.clone(),
                entity_type: raw_set.entity_type.clone(),
            }),
        }
    }

    for raw_singleton in &raw.singletons {
        match model.find_entity_type(&raw_singleton.type_name) {
            Some(idx) => container.singletons.push(Singleton {
                name: raw_singleton.name.clone(),
                entity_type: idx,
            }),
            None => warnings.push(ResolutionWarning::UnknownEntityType {
                referrer: raw_singleton.name.clone(),
                entity_type: raw_singleton.type_name.clone(),
            }),
        }
    }

    for raw_import in &raw.function_imports {
        match find_unbound(&model.functions, &raw_import.function) {
            Some(idx) => container.function_imports.push(FunctionImport {
                name: raw_import.name.clone(),
                function: idx,
                entity_set: raw_import.entity_set.clone(),
                include_in_service_document: raw_import.include_in_service_document,
            }),
            None => warnings.push(ResolutionWarning::UnknownOperation {
                import: raw_import.name.clone(),
                operation: raw_import.function.clone(),
            }),
        }
    }

    for raw_import in &raw.action_imports {
        match find_unbound(&model.actions, &raw_import.action) {
            Some(idx) => container.action_imports.push(ActionImport {
                name: raw_import.name.clone(),
                action: idx,
                entity_set: raw_import.entity_set.clone(),
            }),
            None => warnings.push(ResolutionWarning::UnknownOperation {
                import: raw_import.name.clone(),
                operation: raw_import.action.clone(),
            }),
        }
    }

    container
}

/// Imports target unbound operations by namespace-qualified name
fn find_unbound(operations: &[Operation], full_name: &str) -> Option<usize> {
    operations
        .iter()
        .position(|op| op.full_name == full_name && !op.is_bound())
}
