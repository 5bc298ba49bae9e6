//! Service model building and resolution

mod builder;
mod elements;
mod service_model;
pub mod type_name;

pub use builder::build_model;
pub use elements::*;
pub use service_model::ServiceModel;
pub use type_name::{collapse_qualified_name, flatten_namespace, TypeDescriptor};
