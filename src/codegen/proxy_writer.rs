//! TypeScript proxy emission from the resolved model
//!
//! One module per schema namespace (dots stripped from the file name) plus
//! a Base module with the shared declarations. The resolved model is
//! consumed read-only; emission decides nothing about resolution.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::ProxyGenError;
use crate::model::type_name::{collapse_qualified_name, flatten_namespace, TypeDescriptor};
use crate::model::{
    ComplexType, EntityContainer, EntityType, EnumType, Operation, Parameter, Schema, ServiceModel,
};

use super::header::{create_header, GeneratorSettings, Modularity};

/// Emit the proxy modules for a resolved model. Returns the written paths.
pub fn emit_proxy(
    model: &ServiceModel,
    settings: &GeneratorSettings,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| ProxyGenError::OutputWriteError {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let header = create_header(settings)?;
    let mut written = Vec::new();

    let base_path = out_dir.join("Base.ts");
    write_file(&base_path, &format!("{}{}", header, base_module(settings.modularity)))?;
    written.push(base_path);

    for schema in &model.schemas {
        let path = out_dir.join(format!("{}.ts", flatten_namespace(&schema.namespace)));
        let module = render_schema(model, schema, settings.modularity);
        write_file(&path, &format!("{}{}", header, module))?;
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| {
        ProxyGenError::OutputWriteError {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

/// Shared declarations every schema module builds on
fn base_module(modularity: Modularity) -> String {
    let mut decls = String::new();
    decls.push_str("export interface ODataContext {\n");
    decls.push_str("  readonly address: string;\n");
    decls.push_str("}\n\n");
    decls.push_str("export interface EntitySet<T> {\n");
    decls.push_str("  get(key: unknown): Promise<T>;\n");
    decls.push_str("  all(): Promise<T[]>;\n");
    decls.push_str("}\n");

    match modularity {
        Modularity::Modular => decls,
        Modularity::Ambient => wrap_namespace("Base", &decls),
    }
}

fn render_schema(model: &ServiceModel, schema: &Schema, modularity: Modularity) -> String {
    let mut decls = String::new();

    for enum_type in &schema.enum_types {
        decls.push_str(&render_enum(enum_type));
        decls.push('\n');
    }

    for &idx in &schema.complex_types {
        decls.push_str(&render_complex_type(&schema.namespace, &model.complex_types[idx], model));
        decls.push('\n');
    }

    for &idx in &schema.entity_types {
        decls.push_str(&render_entity_type(&schema.namespace, &model.entity_types[idx], model));
        decls.push('\n');
    }

    if let Some(container) = &schema.entity_container {
        decls.push_str(&render_container(&schema.namespace, container, model));
    }

    match modularity {
        Modularity::Modular => {
            let mut imports = String::from("import * as Base from \"./Base\";\n");
            for module in foreign_modules(model, schema) {
                imports.push_str(&format!("import * as {} from \"./{}\";\n", module, module));
            }
            format!("{}\n{}", imports, decls)
        }
        Modularity::Ambient => wrap_namespace(&flatten_namespace(&schema.namespace), &decls),
    }
}

/// Other schema modules a schema's declarations reference, as flattened
/// module names in deterministic order. Each one needs an import line in
/// modular output.
fn foreign_modules(model: &ServiceModel, schema: &Schema) -> Vec<String> {
    let mut namespaces = BTreeSet::new();

    for &idx in &schema.complex_types {
        let complex = &model.complex_types[idx];
        if let Some(base) = complex.base_type {
            note_qualified(model.full_name_of(base), &mut namespaces);
        }
        for property in &complex.properties {
            note_descriptor(&property.ty, &mut namespaces);
        }
    }
    for &idx in &schema.entity_types {
        let entity = &model.entity_types[idx];
        if let Some(base) = entity.base_type {
            note_qualified(model.full_name_of(base), &mut namespaces);
        }
        for property in entity
            .properties
            .iter()
            .chain(entity.navigation_properties.iter())
        {
            note_descriptor(&property.ty, &mut namespaces);
        }
        for op in entity.actions.iter().chain(entity.functions.iter()) {
            note_operation(op, &mut namespaces);
        }
    }
    if let Some(container) = &schema.entity_container {
        for set in &container.entity_sets {
            note_qualified(&model.entity_types[set.entity_type].full_name, &mut namespaces);
            for op in set.actions.iter().chain(set.functions.iter()) {
                note_operation(op, &mut namespaces);
            }
        }
        for singleton in &container.singletons {
            note_qualified(
                &model.entity_types[singleton.entity_type].full_name,
                &mut namespaces,
            );
        }
        for import in &container.function_imports {
            note_operation(&model.functions[import.function], &mut namespaces);
        }
        for import in &container.action_imports {
            note_operation(&model.actions[import.action], &mut namespaces);
        }
    }

    namespaces
        .into_iter()
        .filter(|ns| ns != &schema.namespace)
        .filter(|ns| model.schemas.iter().any(|s| &s.namespace == ns))
        .map(|ns| flatten_namespace(&ns))
        .collect()
}

fn note_operation(op: &Operation, namespaces: &mut BTreeSet<String>) {
    for param in &op.parameters {
        note_descriptor(&param.ty, namespaces);
    }
    note_descriptor(&op.return_type, namespaces);
}

fn note_descriptor(desc: &TypeDescriptor, namespaces: &mut BTreeSet<String>) {
    if desc.is_void || ts_primitive(&desc.qualified_name).is_some() {
        return;
    }
    note_qualified(&desc.qualified_name, namespaces);
}

fn note_qualified(qualified: &str, namespaces: &mut BTreeSet<String>) {
    if let Some((namespace, _)) = qualified.rsplit_once('.') {
        namespaces.insert(namespace.to_string());
    }
}

fn render_enum(enum_type: &EnumType) -> String {
    let mut out = format!("export enum {} {{\n", enum_type.name);
    for member in &enum_type.members {
        match &member.value {
            Some(value) => out.push_str(&format!("  {} = {},\n", member.key, value)),
            None => out.push_str(&format!("  {},\n", member.key)),
        }
    }
    out.push_str("}\n");
    out
}

fn render_complex_type(namespace: &str, complex: &ComplexType, model: &ServiceModel) -> String {
    let mut out = format!("export interface {}", complex.name);
    if let Some(base) = complex.base_type {
        out.push_str(&format!(
            " extends {}",
            display_type_name(namespace, model.full_name_of(base))
        ));
    }
    out.push_str(" {\n");
    for property in &complex.properties {
        out.push_str(&render_property(namespace, property.name.as_str(), &property.ty, property.nullable));
    }
    out.push_str("}\n");
    out
}

fn render_entity_type(namespace: &str, entity: &EntityType, model: &ServiceModel) -> String {
    let mut out = format!("export interface {}", entity.name);
    if let Some(base) = entity.base_type {
        out.push_str(&format!(
            " extends {}",
            display_type_name(namespace, model.full_name_of(base))
        ));
    }
    out.push_str(" {\n");
    for property in &entity.properties {
        out.push_str(&render_property(namespace, property.name.as_str(), &property.ty, property.nullable));
    }
    for property in &entity.navigation_properties {
        out.push_str(&render_property(namespace, property.name.as_str(), &property.ty, property.nullable));
    }
    for op in entity.actions.iter().chain(entity.functions.iter()) {
        out.push_str(&format!("  {}\n", render_method(namespace, op)));
    }
    out.push_str("}\n");
    out
}

fn render_container(namespace: &str, container: &EntityContainer, model: &ServiceModel) -> String {
    let mut out = String::new();

    // Sets with attached collection-bound operations get their own
    // interface; plain sets are typed directly.
    for set in &container.entity_sets {
        if set.actions.is_empty() && set.functions.is_empty() {
            continue;
        }
        let entity = display_type_name(namespace, &model.entity_types[set.entity_type].full_name);
        out.push_str(&format!(
            "export interface {} extends Base.EntitySet<{}> {{\n",
            set.name, entity
        ));
        for op in set.actions.iter().chain(set.functions.iter()) {
            out.push_str(&format!("  {}\n", render_method(namespace, op)));
        }
        out.push_str("}\n\n");
    }

    out.push_str(&format!("export interface {} extends Base.ODataContext {{\n", container.name));
    for set in &container.entity_sets {
        if set.actions.is_empty() && set.functions.is_empty() {
            let entity =
                display_type_name(namespace, &model.entity_types[set.entity_type].full_name);
            out.push_str(&format!("  readonly {}: Base.EntitySet<{}>;\n", set.name, entity));
        } else {
            out.push_str(&format!("  readonly {}: {};\n", set.name, set.name));
        }
    }
    for singleton in &container.singletons {
        let entity =
            display_type_name(namespace, &model.entity_types[singleton.entity_type].full_name);
        out.push_str(&format!("  readonly {}: {};\n", singleton.name, entity));
    }
    for import in &container.function_imports {
        out.push_str(&format!("  {}\n", render_method(namespace, &model.functions[import.function])));
    }
    for import in &container.action_imports {
        out.push_str(&format!("  {}\n", render_method(namespace, &model.actions[import.action])));
    }
    out.push_str("}\n");
    out
}

fn render_property(namespace: &str, name: &str, ty: &TypeDescriptor, nullable: bool) -> String {
    let marker = if nullable { "?" } else { "" };
    format!("  {}{}: {};\n", name, marker, ts_type(namespace, ty))
}

fn render_method(namespace: &str, op: &Operation) -> String {
    let params: Vec<String> = op.parameters.iter().map(|p| render_parameter(namespace, p)).collect();
    format!(
        "{}({}): Promise<{}>;",
        op.name,
        params.join(", "),
        ts_type(namespace, &op.return_type)
    )
}

fn render_parameter(namespace: &str, param: &Parameter) -> String {
    let marker = if param.nullable == Some(true) { "?" } else { "" };
    format!("{}{}: {}", param.name, marker, ts_type(namespace, &param.ty))
}

/// Map a descriptor to a TypeScript type expression
fn ts_type(namespace: &str, desc: &TypeDescriptor) -> String {
    let base = if desc.is_void {
        "void".to_string()
    } else if let Some(primitive) = ts_primitive(&desc.qualified_name) {
        primitive.to_string()
    } else {
        display_type_name(namespace, &desc.qualified_name)
    };

    if desc.is_collection {
        format!("{}[]", base)
    } else {
        base
    }
}

fn ts_primitive(qualified: &str) -> Option<&'static str> {
    match qualified {
        "Edm.String" | "Edm.Guid" | "Edm.Duration" | "Edm.Binary" => Some("string"),
        "Edm.Int16" | "Edm.Int32" | "Edm.Int64" | "Edm.Double" | "Edm.Single" | "Edm.Decimal"
        | "Edm.Byte" | "Edm.SByte" => Some("number"),
        "Edm.Boolean" => Some("boolean"),
        "Edm.Date" | "Edm.DateTimeOffset" | "Edm.TimeOfDay" => Some("Date"),
        _ => None,
    }
}

/// Display name for a qualified type, local to the module being rendered
/// when the type lives in the current namespace.
fn display_type_name(current_namespace: &str, qualified: &str) -> String {
    let display = collapse_qualified_name(qualified);
    let prefix = format!("{}.", flatten_namespace(current_namespace));
    match display.strip_prefix(&prefix) {
        Some(local) => local.to_string(),
        None => display,
    }
}

fn wrap_namespace(name: &str, decls: &str) -> String {
    let mut out = format!("declare namespace {} {{\n", name);
    for line in decls.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("}\n");
    out
}
