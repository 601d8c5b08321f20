use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cantus_filter_core::{
    Attribute, ChoiceCatalog, CollectedValues, FieldKey, FilterDocument, FormParams,
    ParamSource, SelectionMode,
};

const DEFAULT_STATIC_DIR: &str = "static/filter";

#[derive(Parser, Debug)]
#[command(
    name = "cantus-filter",
    version,
    about = "Build PyCantus filter documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a document from attribute=value arguments.
    Build {
        #[arg(long)]
        name: String,
        #[arg(long = "include", value_parser = parse_assignment)]
        include: Vec<(Attribute, String)>,
        #[arg(long = "exclude", value_parser = parse_assignment)]
        exclude: Vec<(Attribute, String)>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Build a document from a URL-encoded body as posted by the web form.
    BuildForm {
        input: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// List reference choices loaded from the CSV tables.
    Choices {
        #[arg(
            long = "static-dir",
            env = "CANTUS_FILTER_STATIC_DIR",
            default_value = DEFAULT_STATIC_DIR
        )]
        static_dir: PathBuf,
        attribute: Option<Attribute>,
    },
    /// Validate an exported document and summarize it.
    Check { input: PathBuf },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            name,
            include,
            exclude,
            output,
        } => {
            let mut values = CollectedValues::new();
            for (mode, assignments) in [
                (SelectionMode::Include, include),
                (SelectionMode::Exclude, exclude),
            ] {
                for (attribute, value) in assignments {
                    values.insert(FieldKey::new(attribute, mode), value);
                }
            }
            let document = FilterDocument::build(&name, &values)?;
            emit_document(&document, output.as_deref())
        }
        Commands::BuildForm { input, output } => {
            let body = fs::read_to_string(&input)
                .with_context(|| format!("failed to read form body {}", input.display()))?;
            let params = parse_form_body(&body)?;
            let values = CollectedValues::collect(&params);
            let name = params
                .param("name")
                .ok_or_else(|| anyhow!("form body has no name field"))?;
            let document = FilterDocument::build(name, &values)?;
            emit_document(&document, output.as_deref())
        }
        Commands::Choices {
            static_dir,
            attribute,
        } => {
            let catalog = ChoiceCatalog::load(&static_dir);
            let attributes = match attribute {
                Some(attribute) => vec![attribute],
                None => Attribute::ALL.to_vec(),
            };
            for attribute in attributes {
                let choices = catalog.choices(attribute);
                println!("{} ({} choices)", attribute, choices.len());
                for choice in choices {
                    println!("  {choice}");
                }
            }
            Ok(())
        }
        Commands::Check { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let document = FilterDocument::from_yaml(&text)
                .with_context(|| format!("invalid filter document {}", input.display()))?;
            print_summary(&document);
            Ok(())
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(Attribute, String)> {
    let (attribute, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected attribute=value, got {raw}"))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("empty value for {attribute}"));
    }
    Ok((attribute.parse()?, value.to_string()))
}

fn parse_form_body(body: &str) -> Result<FormParams> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(body.trim()).context("invalid URL-encoded form body")?;
    Ok(FormParams::from_pairs(pairs))
}

/// Writes to stdout, to `output`, or into `output/{name}.yaml` when it is a directory.
fn emit_document(document: &FilterDocument, output: Option<&Path>) -> Result<()> {
    let yaml = document.to_yaml()?;
    match output {
        None => {
            io::stdout().write_all(yaml.as_bytes())?;
        }
        Some(path) => {
            let target = if path.is_dir() {
                let filename = document.filename();
                if filename.contains(|c: char| matches!(c, '/' | '\\')) {
                    bail!(
                        "filter name {:?} contains a path separator; pass a file path to --output",
                        document.name
                    );
                }
                path.join(filename)
            } else {
                path.to_path_buf()
            };
            fs::write(&target, yaml)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "wrote filter document");
        }
    }
    Ok(())
}

fn print_summary(document: &FilterDocument) {
    println!("[filter] Name:     {}", document.name);
    println!("[filter] File:     {}", document.filename());
    for mode in SelectionMode::ALL {
        let label = match mode {
            SelectionMode::Include => "Include:",
            SelectionMode::Exclude => "Exclude:",
        };
        let section = document.section(mode);
        if section.is_empty() {
            println!("[filter] {label:<9} (none)");
            continue;
        }
        for (attribute, values) in section {
            println!("[filter] {label:<9} {attribute} = {}", values.join(", "));
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
