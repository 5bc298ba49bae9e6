//! Generator options header embedded in emitted files
//!
//! Every generated file starts with a comment block carrying the generator
//! settings as JSON between marker lines. The `update` command reads the
//! blob back out of a previously generated file to regenerate the service
//! without re-entering options.

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProxyGenError;

const HEADER_BEGIN: &str = "#ODATAPROXYGENOPTIONS";
const HEADER_END: &str = "#ODATAPROXYGENOPTIONSEND";

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)#ODATAPROXYGENOPTIONS\n(.*?)\n#ODATAPROXYGENOPTIONSEND")
        .expect("Invalid header regex")
});

/// Output style of the generated modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modularity {
    /// Global namespace declarations, no module system required
    Ambient,
    /// ES modules with exported declarations
    Modular,
}

impl Default for Modularity {
    fn default() -> Self {
        Modularity::Modular
    }
}

impl FromStr for Modularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ambient" => Ok(Modularity::Ambient),
            "modular" => Ok(Modularity::Modular),
            _ => Err(format!("Unknown modularity: {}", s)),
        }
    }
}

/// Settings embedded into every generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Where the metadata document came from
    pub source: String,
    pub modularity: Modularity,
}

/// Render the header comment block, options blob included verbatim
pub fn create_header(settings: &GeneratorSettings) -> Result<String> {
    let blob = serde_json::to_string_pretty(settings)?;
    let mut header = String::from(
        "/**************************************************************************\n",
    );
    header.push_str("Created by odata-proxygen\n");
    header.push_str(&format!("Creation Time: {}\n", Local::now().to_rfc2822()));
    header.push_str("Run 'odata-proxygen update <this file>' to refresh the service.\n");
    header.push_str("DO NOT DELETE THIS HEADER IN ORDER TO UPDATE YOUR SERVICE\n");
    header.push_str(HEADER_BEGIN);
    header.push('\n');
    header.push_str(&blob);
    header.push('\n');
    header.push_str(HEADER_END);
    header.push_str(
        "\n**************************************************************************/\n\n",
    );
    Ok(header)
}

/// Extract the settings blob from a previously generated file
pub fn settings_from_generated(content: &str, path: &Path) -> Result<GeneratorSettings> {
    let caps = HEADER_RE
        .captures(content)
        .ok_or_else(|| ProxyGenError::NoOptionsHeader {
            path: path.to_path_buf(),
        })?;

    serde_json::from_str(&caps[1]).map_err(|e| {
        ProxyGenError::InvalidOptionsHeader {
            message: e.to_string(),
        }
        .into()
    })
}
