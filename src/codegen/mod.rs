//! Proxy source emission

pub mod header;
mod proxy_writer;

pub use header::{create_header, settings_from_generated, GeneratorSettings, Modularity};
pub use proxy_writer::emit_proxy;
