use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use odata_proxygen::{codegen, generate_proxy, GenerateOptions, Modularity};

#[derive(Parser)]
#[command(name = "odata-proxygen")]
#[command(author, version, about = "Fast Rust generator for OData service proxies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate TypeScript proxy modules from a metadata document
    Generate {
        /// Path to the EDMX metadata XML file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output directory for the generated modules
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Output style: modular (ES modules) or ambient (global namespaces)
        #[arg(long, default_value = "modular")]
        modularity: String,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Regenerate a service from the options header of a generated file
    Update {
        /// A previously generated .ts file carrying the options header
        #[arg(short, long)]
        file: PathBuf,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            metadata,
            out_dir,
            modularity,
            verbose,
        } => {
            let modularity: Modularity = modularity
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            generate_proxy(GenerateOptions {
                metadata_path: metadata,
                out_dir,
                modularity,
                verbose,
            })?;
        }
        Commands::Update { file, verbose } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read generated file: {}", file.display()))?;
            let settings = codegen::settings_from_generated(&content, &file)?;
            let out_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();

            generate_proxy(GenerateOptions {
                metadata_path: PathBuf::from(settings.source),
                out_dir,
                modularity: settings.modularity,
                verbose,
            })?;
        }
    }

    Ok(())
}
