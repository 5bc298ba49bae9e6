//! Unit tests for the service model resolution engine
//!
//! These tests drive `build_model` with hand-built raw schema fragments,
//! covering catalog construction, cross-schema inheritance, operation
//! binding, and container assembly.

use pretty_assertions::assert_eq;

use odata_proxygen::error::{ProxyGenError, ResolutionWarning};
use odata_proxygen::metadata::{
    RawEntityContainer, RawEntitySet, RawEntityType, RawEnumMember, RawEnumType,
    RawFunctionImport, RawOperation, RawParameter, RawProperty, RawSchema, RawSingleton,
};
use odata_proxygen::model::{build_model, OperationBinding, TypeRef};

fn schema(namespace: &str) -> RawSchema {
    RawSchema {
        namespace: namespace.to_string(),
        ..Default::default()
    }
}

fn prop(name: &str, type_name: &str, nullable: bool) -> RawProperty {
    RawProperty {
        name: name.to_string(),
        type_name: type_name.to_string(),
        nullable,
    }
}

fn entity(name: &str, key: Option<&str>, properties: Vec<RawProperty>) -> RawEntityType {
    RawEntityType {
        name: name.to_string(),
        base_type: None,
        open_type: false,
        key: key.map(String::from),
        properties,
        navigation_properties: Vec::new(),
    }
}

fn param(name: &str, type_name: &str) -> RawParameter {
    RawParameter {
        name: name.to_string(),
        type_name: type_name.to_string(),
        ..Default::default()
    }
}

fn bound_op(name: &str, binding_type: &str, return_type: Option<&str>) -> RawOperation {
    RawOperation {
        name: name.to_string(),
        is_bound: true,
        parameters: vec![param("bindingParameter", binding_type)],
        return_type: return_type.map(String::from),
    }
}

fn entity_set(name: &str, entity_type: &str) -> RawEntitySet {
    RawEntitySet {
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        navigation_property_bindings: Vec::new(),
    }
}

fn order_entity() -> RawEntityType {
    entity(
        "Order",
        Some("Id"),
        vec![prop("Id", "Edm.Int32", false), prop("Note", "Edm.String", true)],
    )
}

// ============================================================================
// Catalog Building
// ============================================================================

#[test]
fn test_round_trip_without_inheritance_or_bound_operations() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.complex_types.push(odata_proxygen::metadata::RawComplexType {
        name: "Address".to_string(),
        base_type: None,
        open_type: false,
        properties: vec![prop("Street", "Edm.String", true)],
    });

    let model = build_model(&[s]).unwrap();

    assert_eq!(model.entity_types.len(), 1);
    assert_eq!(model.complex_types.len(), 1);
    assert!(model.entity_types[0].base_type.is_none());
    assert!(model.complex_types[0].base_type.is_none());
    assert!(model.entity_types[0].actions.is_empty());
    assert!(model.entity_types[0].functions.is_empty());
    assert!(model.warnings.is_empty());
}

#[test]
fn test_key_is_resolved_against_properties() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());

    let model = build_model(&[s]).unwrap();
    let key = model.entity_types[0].key.as_ref().unwrap();
    assert_eq!(key.name, "Id");
    assert_eq!(key.ty.qualified_name, "Edm.Int32");
    assert!(!key.nullable);
}

#[test]
fn test_key_not_found_fails() {
    let mut s = schema("Orders");
    s.entity_types
        .push(entity("Order", Some("Missing"), vec![prop("Id", "Edm.Int32", false)]));

    let err = build_model(&[s]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProxyGenError>(),
        Some(ProxyGenError::KeyNotFound { key, .. }) if key == "Missing"
    ));
}

#[test]
fn test_navigation_properties_are_always_nullable() {
    let mut s = schema("Orders");
    let mut order = order_entity();
    order
        .navigation_properties
        .push(odata_proxygen::metadata::RawNavigationProperty {
            name: "Items".to_string(),
            type_name: "Collection(Orders.Item)".to_string(),
        });
    s.entity_types.push(order);
    s.entity_types.push(entity("Item", Some("Sku"), vec![prop("Sku", "Edm.String", false)]));

    let model = build_model(&[s]).unwrap();
    let nav = &model.entity_types[0].navigation_properties[0];
    assert!(nav.nullable);
    assert!(nav.ty.is_collection);
    assert_eq!(nav.ty.qualified_name, "Orders.Item");
}

#[test]
fn test_enum_members_copied_verbatim() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.enum_types.push(RawEnumType {
        name: "Status".to_string(),
        members: vec![
            RawEnumMember {
                name: "Open".to_string(),
                value: Some("0".to_string()),
            },
            RawEnumMember {
                name: "Closed".to_string(),
                value: None,
            },
        ],
    });

    let model = build_model(&[s]).unwrap();
    let status = &model.schemas[0].enum_types[0];
    assert_eq!(status.name, "Status");
    assert_eq!(status.members[0].key, "Open");
    assert_eq!(status.members[0].value.as_deref(), Some("0"));
    assert_eq!(status.members[1].value, None);
}

#[test]
fn test_empty_document_fails() {
    let err = build_model(&[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProxyGenError>(),
        Some(ProxyGenError::NoSchemas)
    ));
}

#[test]
fn test_malformed_collection_syntax_warns_and_degrades() {
    let mut s = schema("Orders");
    s.entity_types.push(entity(
        "Order",
        Some("Id"),
        vec![
            prop("Id", "Edm.Int32", false),
            prop("Tags", "Collection(Edm.String", true),
        ],
    ));

    let model = build_model(&[s]).unwrap();
    assert!(model
        .warnings
        .iter()
        .any(|w| matches!(w, ResolutionWarning::MalformedTypeString { raw } if raw == "Collection(Edm.String")));
    assert!(!model.entity_types[0].properties[1].ty.is_collection);
}

// ============================================================================
// Inheritance Resolution
// ============================================================================

#[test]
fn test_base_type_declared_in_later_schema_resolves() {
    let mut orders = schema("Orders");
    let mut order = order_entity();
    order.base_type = Some("Core.Document".to_string());
    orders.entity_types.push(order);

    let mut core = schema("Core");
    core.entity_types
        .push(entity("Document", None, vec![prop("CreatedAt", "Edm.DateTimeOffset", true)]));

    // Core is processed after Orders; resolution must not depend on order
    let model = build_model(&[orders, core]).unwrap();

    let base = model.entity_types[0].base_type.expect("base should resolve");
    assert_eq!(model.full_name_of(base), "Core.Document");
    assert!(matches!(base, TypeRef::Entity(_)));
}

#[test]
fn test_dangling_base_type_stays_unresolved() {
    let mut s = schema("Orders");
    let mut order = order_entity();
    order.base_type = Some("Nope.Missing".to_string());
    s.entity_types.push(order);

    let model = build_model(&[s]).unwrap();
    assert!(model.entity_types[0].base_type.is_none());
    assert_eq!(
        model.entity_types[0].base_type_full_name.as_deref(),
        Some("Nope.Missing")
    );
}

#[test]
fn test_cyclic_inheritance_fails() {
    let mut s = schema("Orders");
    let mut a = entity("A", Some("Id"), vec![prop("Id", "Edm.Int32", false)]);
    a.base_type = Some("Orders.B".to_string());
    let mut b = entity("B", Some("Id"), vec![prop("Id", "Edm.Int32", false)]);
    b.base_type = Some("Orders.A".to_string());
    s.entity_types.push(a);
    s.entity_types.push(b);

    let err = build_model(&[s]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProxyGenError>(),
        Some(ProxyGenError::CyclicInheritance { .. })
    ));
}

// ============================================================================
// Operation Binding
// ============================================================================

#[test]
fn test_instance_bound_function_attaches_with_key_injected() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    let mut get_total = bound_op("GetTotal", "Orders.Order", Some("Edm.Decimal"));
    get_total.parameters.push(param("includeTax", "Edm.Boolean"));
    s.functions.push(get_total);

    let model = build_model(&[s]).unwrap();

    let order = &model.entity_types[0];
    assert!(order.actions.is_empty());
    assert_eq!(order.functions.len(), 1);

    let attached = &order.functions[0];
    assert_eq!(attached.name, "GetTotal");
    // binding parameter replaced by the owner's key parameter
    assert_eq!(attached.parameters.len(), 2);
    assert_eq!(attached.parameters[0].name, "Id");
    assert_eq!(attached.parameters[0].ty.qualified_name, "Edm.Int32");
    assert_eq!(attached.parameters[0].nullable, Some(false));
    assert_eq!(attached.parameters[1].name, "includeTax");

    // the global catalog keeps the untrimmed declaration
    assert_eq!(model.functions[0].parameters.len(), 2);
    assert_eq!(model.functions[0].parameters[0].name, "bindingParameter");
}

#[test]
fn test_inherited_key_is_injected_for_derived_type() {
    let mut core = schema("Core");
    core.entity_types.push(entity(
        "Document",
        Some("Id"),
        vec![prop("Id", "Edm.Guid", false)],
    ));

    let mut orders = schema("Orders");
    let mut order = entity("Order", None, vec![prop("Note", "Edm.String", true)]);
    order.base_type = Some("Core.Document".to_string());
    orders.entity_types.push(order);
    orders.actions.push(bound_op("Archive", "Orders.Order", None));

    let model = build_model(&[core, orders]).unwrap();

    let order = model
        .entity_types
        .iter()
        .find(|e| e.full_name == "Orders.Order")
        .unwrap();
    assert_eq!(order.actions.len(), 1);
    assert_eq!(order.actions[0].parameters[0].name, "Id");
}

#[test]
fn test_collection_bound_action_attaches_to_every_matching_set() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.actions
        .push(bound_op("ArchiveAll", "Collection(Orders.Order)", None));
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        entity_sets: vec![
            entity_set("OrderSet", "Orders.Order"),
            entity_set("ArchivedOrders", "Orders.Order"),
        ],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();

    // not attached to the entity type
    assert!(model.entity_types[0].actions.is_empty());

    let container = model.schemas[0].entity_container.as_ref().unwrap();
    for set in &container.entity_sets {
        assert_eq!(set.actions.len(), 1, "set {} should carry the action", set.name);
        let attached = &set.actions[0];
        assert_eq!(attached.name, "ArchiveAll");
        // binding parameter removed, no key injected
        assert!(attached.parameters.is_empty());
        assert!(attached.return_type.is_void);
    }
}

#[test]
fn test_dangling_binding_parameter_warns_but_keeps_operation() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.functions.push(bound_op("Orphan", "Orders.Missing", None));

    let model = build_model(&[s]).unwrap();

    assert!(model.entity_types[0].functions.is_empty());
    // still retrievable from the global catalog
    assert_eq!(model.functions[0].name, "Orphan");
    assert!(model.warnings.iter().any(|w| matches!(
        w,
        ResolutionWarning::DanglingBinding { operation, target }
            if operation == "Orders.Orphan" && target == "Orders.Missing"
    )));
}

#[test]
fn test_collection_bound_dangling_binding_warns_but_keeps_operation() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.actions
        .push(bound_op("PurgeAll", "Collection(Orders.Missing)", None));
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        entity_sets: vec![entity_set("OrderSet", "Orders.Order")],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();

    let container = model.schemas[0].entity_container.as_ref().unwrap();
    assert!(container.entity_sets[0].actions.is_empty());
    // still retrievable from the global catalog
    assert_eq!(model.actions[0].name, "PurgeAll");
    assert!(model.warnings.iter().any(|w| matches!(
        w,
        ResolutionWarning::DanglingBinding { operation, target }
            if operation == "Orders.PurgeAll" && target == "Orders.Missing"
    )));
}

#[test]
fn test_malformed_binding_type_warns_once() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.actions
        .push(bound_op("Broken", "Collection(Orders.Order", None));

    let model = build_model(&[s]).unwrap();

    let count = model
        .warnings
        .iter()
        .filter(|w| matches!(
            w,
            ResolutionWarning::MalformedTypeString { raw } if raw == "Collection(Orders.Order"
        ))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_unbound_operation_is_classified_unbound() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.functions.push(RawOperation {
        name: "TopOrders".to_string(),
        is_bound: false,
        parameters: vec![param("count", "Edm.Int32")],
        return_type: Some("Collection(Orders.Order)".to_string()),
    });

    let model = build_model(&[s]).unwrap();
    assert_eq!(model.functions[0].binding, OperationBinding::Unbound);
    assert!(model.functions[0].return_type.is_collection);
    assert!(model.entity_types[0].functions.is_empty());
}

// ============================================================================
// Container Assembly
// ============================================================================

#[test]
fn test_entity_set_resolves_to_entity_type() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    let mut set = entity_set("OrderSet", "Orders.Order");
    set.navigation_property_bindings
        .push(odata_proxygen::metadata::RawNavigationPropertyBinding {
            path: "Items".to_string(),
            target: "ItemSet".to_string(),
        });
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        entity_sets: vec![set],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    assert_eq!(container.full_name, "Orders.Container");

    let set = &container.entity_sets[0];
    assert_eq!(set.full_name, "Orders.OrderSet");
    assert_eq!(model.entity_types[set.entity_type].full_name, "Orders.Order");
    assert_eq!(set.navigation_property_bindings[0].path, "Items");
    assert_eq!(set.navigation_property_bindings[0].target, "ItemSet");
}

#[test]
fn test_unknown_entity_type_in_set_is_skipped_with_warning() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        entity_sets: vec![entity_set("Ghosts", "Orders.Ghost")],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    assert!(container.entity_sets.is_empty());
    assert!(model.warnings.iter().any(|w| matches!(
        w,
        ResolutionWarning::UnknownEntityType { referrer, entity_type }
            if referrer == "Ghosts" && entity_type == "Orders.Ghost"
    )));
}

#[test]
fn test_singleton_resolves_to_entity_type() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        singletons: vec![RawSingleton {
            name: "LatestOrder".to_string(),
            type_name: "Orders.Order".to_string(),
        }],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    let singleton = &container.singletons[0];
    assert_eq!(model.entity_types[singleton.entity_type].full_name, "Orders.Order");
}

#[test]
fn test_unknown_singleton_type_is_skipped_with_warning() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        singletons: vec![RawSingleton {
            name: "Phantom".to_string(),
            type_name: "Orders.Ghost".to_string(),
        }],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    assert!(container.singletons.is_empty());
    assert!(model.warnings.iter().any(|w| matches!(
        w,
        ResolutionWarning::UnknownEntityType { referrer, entity_type }
            if referrer == "Phantom" && entity_type == "Orders.Ghost"
    )));
}

#[test]
fn test_function_import_resolves_unbound_operation() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.functions.push(RawOperation {
        name: "TopOrders".to_string(),
        is_bound: false,
        parameters: vec![param("count", "Edm.Int32")],
        return_type: Some("Collection(Orders.Order)".to_string()),
    });
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        entity_sets: vec![entity_set("OrderSet", "Orders.Order")],
        function_imports: vec![RawFunctionImport {
            name: "TopOrders".to_string(),
            function: "Orders.TopOrders".to_string(),
            entity_set: Some("OrderSet".to_string()),
            include_in_service_document: true,
        }],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    let import = &container.function_imports[0];
    assert_eq!(model.functions[import.function].full_name, "Orders.TopOrders");
    assert!(import.include_in_service_document);
    assert_eq!(import.entity_set.as_deref(), Some("OrderSet"));
}

#[test]
fn test_unknown_operation_import_is_skipped_with_warning() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());
    s.container = Some(RawEntityContainer {
        name: "Container".to_string(),
        function_imports: vec![RawFunctionImport {
            name: "Nope".to_string(),
            function: "Orders.Nope".to_string(),
            entity_set: None,
            include_in_service_document: false,
        }],
        ..Default::default()
    });

    let model = build_model(&[s]).unwrap();
    let container = model.schemas[0].entity_container.as_ref().unwrap();
    assert!(container.function_imports.is_empty());
    assert!(model.warnings.iter().any(|w| matches!(
        w,
        ResolutionWarning::UnknownOperation { import, .. } if import == "Nope"
    )));
}

#[test]
fn test_require_container_reports_missing_container() {
    let mut s = schema("Orders");
    s.entity_types.push(order_entity());

    let model = build_model(&[s]).unwrap();
    let err = model.schemas[0].require_container().unwrap_err();
    assert!(matches!(
        err,
        ProxyGenError::MissingEntityContainer { namespace } if namespace == "Orders"
    ));
}
