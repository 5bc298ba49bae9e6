//! Type-reference string handling
//!
//! Raw type references arrive either as a plain qualified name
//! (`Orders.Order`, `Edm.Int32`) or wrapped in a collection marker
//! (`Collection(Orders.Order)`). Display names collapse multi-part
//! namespaces so generated identifiers stay valid in languages that
//! forbid dots (`Company.Sub.Order` becomes `CompanySub.Order`).

use once_cell::sync::Lazy;
use regex::Regex;

static COLLECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Collection\((.+)\)$").expect("Invalid collection regex"));

/// Literal name of the void return type
pub const VOID_TYPE: &str = "void";

/// A normalized type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Display name with the namespace collapsed
    pub name: String,
    /// Fully qualified name with the collection wrapper removed
    pub qualified_name: String,
    pub is_collection: bool,
    pub is_void: bool,
}

impl TypeDescriptor {
    /// Parse a raw type-reference string.
    ///
    /// Any string is accepted; unbalanced collection syntax is treated as a
    /// non-collection type (callers may record a warning via
    /// [`is_malformed_collection`]).
    pub fn parse(raw: &str) -> TypeDescriptor {
        let (qualified, is_collection) = match COLLECTION_RE.captures(raw) {
            Some(caps) => (caps[1].to_string(), true),
            None => (raw.to_string(), false),
        };

        TypeDescriptor {
            name: collapse_qualified_name(&qualified),
            is_void: qualified == VOID_TYPE,
            qualified_name: qualified,
            is_collection,
        }
    }

    /// Descriptor for an operation with no declared return type
    pub fn void() -> TypeDescriptor {
        TypeDescriptor {
            name: VOID_TYPE.to_string(),
            qualified_name: VOID_TYPE.to_string(),
            is_collection: false,
            is_void: true,
        }
    }
}

/// True when a string opens a collection wrapper that the anchored pattern
/// does not accept (e.g. a missing closing parenthesis).
pub fn is_malformed_collection(raw: &str) -> bool {
    raw.starts_with("Collection(") && !COLLECTION_RE.is_match(raw)
}

/// Collapse a dotted qualified name into the target naming convention:
/// all namespace segments concatenated, joined to the final segment with a
/// single dot. Names with at most one dot pass through unchanged.
pub fn collapse_qualified_name(qualified: &str) -> String {
    let segments: Vec<&str> = qualified.split('.').collect();
    if segments.len() <= 2 {
        return qualified.to_string();
    }
    let (type_name, namespace) = segments.split_last().expect("non-empty split");
    format!("{}.{}", namespace.concat(), type_name)
}

/// Concatenate every segment of a namespace (`Company.Sub` -> `CompanySub`),
/// used for module names derived from schema namespaces.
pub fn flatten_namespace(namespace: &str) -> String {
    namespace.split('.').collect()
}
