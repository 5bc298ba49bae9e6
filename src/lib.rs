//! odata-proxygen: A fast Rust generator for OData service proxies
//!
//! This library resolves a CSDL/EDMX metadata document into a fully
//! cross-referenced service model and emits TypeScript proxy modules
//! from it.

pub mod codegen;
pub mod error;
pub mod metadata;
pub mod model;

use std::path::PathBuf;

use anyhow::Result;

pub use codegen::{GeneratorSettings, Modularity};
pub use error::ProxyGenError;

/// Options for generating a proxy
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Path to the metadata XML document
    pub metadata_path: PathBuf,
    /// Directory the generated modules are written to
    pub out_dir: PathBuf,
    /// Output style of the generated modules
    pub modularity: Modularity,
    /// Enable verbose output
    pub verbose: bool,
}

/// Generate proxy modules from a metadata document
pub fn generate_proxy(options: GenerateOptions) -> Result<Vec<PathBuf>> {
    if options.verbose {
        println!("Reading metadata: {}", options.metadata_path.display());
    }

    // Step 1: Parse the metadata document into raw schema fragments
    let content = std::fs::read_to_string(&options.metadata_path).map_err(|e| {
        ProxyGenError::MetadataReadError {
            path: options.metadata_path.clone(),
            source: e,
        }
    })?;
    let raw_schemas = metadata::parse_edmx(&content)?;

    if options.verbose {
        println!("Found {} schemas", raw_schemas.len());
    }

    // Step 2: Resolve the raw fragments into a cross-referenced model
    let service_model = model::build_model(&raw_schemas)?;

    if options.verbose {
        println!(
            "Resolved {} entity types, {} complex types, {} enums",
            service_model.entity_types.len(),
            service_model.complex_types.len(),
            service_model
                .schemas
                .iter()
                .map(|s| s.enum_types.len())
                .sum::<usize>()
        );
    }

    for warning in &service_model.warnings {
        eprintln!("warning: {}", warning);
    }

    // Step 3: Emit the proxy modules
    let settings = GeneratorSettings {
        source: options.metadata_path.display().to_string(),
        modularity: options.modularity,
    };
    let written = codegen::emit_proxy(&service_model, &settings, &options.out_dir)?;

    if options.verbose {
        println!(
            "Generated {} files in {}",
            written.len(),
            options.out_dir.display()
        );
    }

    Ok(written)
}
