//! Parser for CSDL/EDMX metadata documents
//!
//! Converts the XML document into typed raw declaration structs. Tag names
//! are matched without their namespace prefix (`edmx:DataServices` and
//! `DataServices` are equivalent), since services disagree on prefixes.

use anyhow::Result;
use roxmltree::{Document, Node};

use crate::error::ProxyGenError;

/// One `<Schema>` fragment of the metadata document
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub namespace: String,
    pub entity_types: Vec<RawEntityType>,
    pub complex_types: Vec<RawComplexType>,
    pub enum_types: Vec<RawEnumType>,
    pub actions: Vec<RawOperation>,
    pub functions: Vec<RawOperation>,
    pub container: Option<RawEntityContainer>,
}

#[derive(Debug, Clone)]
pub struct RawEntityType {
    pub name: String,
    pub base_type: Option<String>,
    pub open_type: bool,
    /// Name of the first declared `<PropertyRef>` under `<Key>`
    pub key: Option<String>,
    pub properties: Vec<RawProperty>,
    pub navigation_properties: Vec<RawNavigationProperty>,
}

#[derive(Debug, Clone)]
pub struct RawComplexType {
    pub name: String,
    pub base_type: Option<String>,
    pub open_type: bool,
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone)]
pub struct RawProperty {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct RawNavigationProperty {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct RawEnumType {
    pub name: String,
    pub members: Vec<RawEnumMember>,
}

#[derive(Debug, Clone)]
pub struct RawEnumMember {
    pub name: String,
    pub value: Option<String>,
}

/// An `<Action>` or `<Function>` declaration
#[derive(Debug, Clone)]
pub struct RawOperation {
    pub name: String,
    pub is_bound: bool,
    pub parameters: Vec<RawParameter>,
    pub return_type: Option<String>,
}

/// Facet attributes pass through unmodified from the declaration
#[derive(Debug, Clone, Default)]
pub struct RawParameter {
    pub name: String,
    pub type_name: String,
    pub nullable: Option<bool>,
    pub unicode: Option<bool>,
    pub max_length: Option<String>,
    pub precision: Option<String>,
    pub scale: Option<String>,
    pub srid: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEntityContainer {
    pub name: String,
    pub entity_sets: Vec<RawEntitySet>,
    pub singletons: Vec<RawSingleton>,
    pub function_imports: Vec<RawFunctionImport>,
    pub action_imports: Vec<RawActionImport>,
}

#[derive(Debug, Clone)]
pub struct RawEntitySet {
    pub name: String,
    /// Fully qualified entity type name
    pub entity_type: String,
    pub navigation_property_bindings: Vec<RawNavigationPropertyBinding>,
}

#[derive(Debug, Clone)]
pub struct RawNavigationPropertyBinding {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct RawSingleton {
    pub name: String,
    /// Fully qualified entity type name
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct RawFunctionImport {
    pub name: String,
    /// Fully qualified name of the target function
    pub function: String,
    pub entity_set: Option<String>,
    pub include_in_service_document: bool,
}

#[derive(Debug, Clone)]
pub struct RawActionImport {
    pub name: String,
    /// Fully qualified name of the target action
    pub action: String,
    pub entity_set: Option<String>,
}

/// Parse an EDMX metadata document into its schema fragments
pub fn parse_edmx(content: &str) -> Result<Vec<RawSchema>> {
    let doc = Document::parse(content).map_err(|e| ProxyGenError::MetadataParseError {
        message: e.to_string(),
        source: e,
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Edmx" {
        return Err(ProxyGenError::NotValidMetadata {
            message: format!("root element is <{}>, expected <edmx:Edmx>", root.tag_name().name()),
        }
        .into());
    }

    let data_services = child_elements(&root, "DataServices")
        .into_iter()
        .next()
        .ok_or_else(|| ProxyGenError::NotValidMetadata {
            message: "missing <edmx:DataServices> element".to_string(),
        })?;

    let schemas: Vec<RawSchema> = child_elements(&data_services, "Schema")
        .iter()
        .map(parse_schema)
        .collect::<Result<_>>()?;

    if schemas.is_empty() {
        return Err(ProxyGenError::NoSchemas.into());
    }

    Ok(schemas)
}

fn parse_schema(node: &Node) -> Result<RawSchema> {
    let namespace = req_attr(node, "Namespace")?;
    let mut schema = RawSchema {
        namespace,
        ..Default::default()
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "EntityType" => schema.entity_types.push(parse_entity_type(&child)?),
            "ComplexType" => schema.complex_types.push(parse_complex_type(&child)?),
            "EnumType" => schema.enum_types.push(parse_enum_type(&child)?),
            "Action" => schema.actions.push(parse_operation(&child)?),
            "Function" => schema.functions.push(parse_operation(&child)?),
            "EntityContainer" => schema.container = Some(parse_container(&child)?),
            _ => {}
        }
    }

    Ok(schema)
}

fn parse_entity_type(node: &Node) -> Result<RawEntityType> {
    let key = child_elements(node, "Key")
        .into_iter()
        .next()
        .and_then(|k| child_elements(&k, "PropertyRef").into_iter().next())
        .and_then(|pr| pr.attribute("Name").map(str::to_string));

    Ok(RawEntityType {
        name: req_attr(node, "Name")?,
        base_type: node.attribute("BaseType").map(str::to_string),
        open_type: bool_attr(node, "OpenType"),
        key,
        properties: parse_properties(node)?,
        navigation_properties: child_elements(node, "NavigationProperty")
            .iter()
            .map(|n| {
                Ok(RawNavigationProperty {
                    name: req_attr(n, "Name")?,
                    type_name: req_attr(n, "Type")?,
                })
            })
            .collect::<Result<_>>()?,
    })
}

fn parse_complex_type(node: &Node) -> Result<RawComplexType> {
    Ok(RawComplexType {
        name: req_attr(node, "Name")?,
        base_type: node.attribute("BaseType").map(str::to_string),
        open_type: bool_attr(node, "OpenType"),
        properties: parse_properties(node)?,
    })
}

fn parse_properties(node: &Node) -> Result<Vec<RawProperty>> {
    child_elements(node, "Property")
        .iter()
        .map(|n| {
            Ok(RawProperty {
                name: req_attr(n, "Name")?,
                type_name: req_attr(n, "Type")?,
                // Nullable defaults to true unless declared false
                nullable: n.attribute("Nullable") != Some("false"),
            })
        })
        .collect()
}

fn parse_enum_type(node: &Node) -> Result<RawEnumType> {
    Ok(RawEnumType {
        name: req_attr(node, "Name")?,
        members: child_elements(node, "Member")
            .iter()
            .map(|n| {
                Ok(RawEnumMember {
                    name: req_attr(n, "Name")?,
                    value: n.attribute("Value").map(str::to_string),
                })
            })
            .collect::<Result<_>>()?,
    })
}

fn parse_operation(node: &Node) -> Result<RawOperation> {
    Ok(RawOperation {
        name: req_attr(node, "Name")?,
        is_bound: bool_attr(node, "IsBound"),
        parameters: child_elements(node, "Parameter")
            .iter()
            .map(parse_parameter)
            .collect::<Result<_>>()?,
        return_type: child_elements(node, "ReturnType")
            .into_iter()
            .next()
            .and_then(|n| n.attribute("Type").map(str::to_string)),
    })
}

fn parse_parameter(node: &Node) -> Result<RawParameter> {
    Ok(RawParameter {
        name: req_attr(node, "Name")?,
        type_name: req_attr(node, "Type")?,
        nullable: node.attribute("Nullable").map(|v| v != "false"),
        unicode: node.attribute("Unicode").map(|v| v != "false"),
        max_length: node.attribute("MaxLength").map(str::to_string),
        precision: node.attribute("Precision").map(str::to_string),
        scale: node.attribute("Scale").map(str::to_string),
        srid: node.attribute("SRID").map(str::to_string),
    })
}

fn parse_container(node: &Node) -> Result<RawEntityContainer> {
    let mut container = RawEntityContainer {
        name: req_attr(node, "Name")?,
        ..Default::default()
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "EntitySet" => container.entity_sets.push(RawEntitySet {
                name: req_attr(&child, "Name")?,
                entity_type: req_attr(&child, "EntityType")?,
                navigation_property_bindings: child_elements(&child, "NavigationPropertyBinding")
                    .iter()
                    .map(|n| {
                        Ok(RawNavigationPropertyBinding {
                            path: req_attr(n, "Path")?,
                            target: req_attr(n, "Target")?,
                        })
                    })
                    .collect::<Result<_>>()?,
            }),
            "Singleton" => container.singletons.push(RawSingleton {
                name: req_attr(&child, "Name")?,
                type_name: req_attr(&child, "Type")?,
            }),
            "FunctionImport" => container.function_imports.push(RawFunctionImport {
                name: req_attr(&child, "Name")?,
                function: req_attr(&child, "Function")?,
                entity_set: child.attribute("EntitySet").map(str::to_string),
                include_in_service_document: bool_attr(&child, "IncludeInServiceDocument"),
            }),
            "ActionImport" => container.action_imports.push(RawActionImport {
                name: req_attr(&child, "Name")?,
                action: req_attr(&child, "Action")?,
                entity_set: child.attribute("EntitySet").map(str::to_string),
            }),
            _ => {}
        }
    }

    Ok(container)
}

/// Child elements matching a local tag name, ignoring namespace prefixes
fn child_elements<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

fn req_attr(node: &Node, name: &str) -> Result<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| {
            ProxyGenError::NotValidMetadata {
                message: format!(
                    "<{}> element is missing required attribute '{}'",
                    node.tag_name().name(),
                    name
                ),
            }
            .into()
        })
}

fn bool_attr(node: &Node, name: &str) -> bool {
    node.attribute(name) == Some("true")
}
