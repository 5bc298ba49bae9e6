//! EDMX metadata document parsing

mod edmx_parser;

pub use edmx_parser::{
    parse_edmx, RawActionImport, RawComplexType, RawEntityContainer, RawEntitySet, RawEntityType,
    RawEnumMember, RawEnumType, RawFunctionImport, RawNavigationProperty,
    RawNavigationPropertyBinding, RawOperation, RawParameter, RawProperty, RawSchema, RawSingleton,
};
