use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use geoedit::{
    init_logging_with, Config, EditorSession, FeatureId, HeadlessEngine, LogFormat, PropertyValue,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "geoedit", version, about = "Inspect, normalize and export geospatial feature files")]
struct Cli {
    /// Configuration file (JSON or TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_log: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a JSON summary of a feature file.
    Info { input: PathBuf },
    /// Normalize a feature file and print the canonical GeoJSON.
    Normalize { input: PathBuf },
    /// Normalize a feature file, apply property edits and write GeoJSON.
    Export {
        input: PathBuf,
        output: PathBuf,
        /// Property edit as `<id>.<key>=<value>`; may be repeated
        #[arg(long = "set", value_name = "EDIT")]
        edits: Vec<String>,
    },
}

/// One `<id>.<key>=<value>` edit from the command line.
#[derive(Debug, PartialEq)]
struct PropertyEdit {
    id: FeatureId,
    key: String,
    text: String,
}

fn parse_edit(raw: &str) -> anyhow::Result<PropertyEdit> {
    let Some((target, text)) = raw.split_once('=') else {
        bail!("edit '{}' is missing '='", raw);
    };
    let Some((id, key)) = target.split_once('.') else {
        bail!("edit '{}' must look like <id>.<key>=<value>", raw);
    };
    if id.is_empty() || key.is_empty() {
        bail!("edit '{}' must name both a feature id and a property", raw);
    }
    let id = match id.parse::<i64>() {
        Ok(n) => FeatureId::Int(n),
        Err(_) => FeatureId::Str(id.to_string()),
    };
    Ok(PropertyEdit {
        id,
        key: key.to_string(),
        text: text.to_string(),
    })
}

async fn open(path: &Path, config: Config) -> anyhow::Result<EditorSession<HeadlessEngine>> {
    let mut session = EditorSession::new(HeadlessEngine::default(), config);
    session
        .import_file(path)
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok(session)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with(if cli.json_log {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })?;
    tracing::debug!("geoedit {} (built {})", geoedit::VERSION, geoedit::BUILD_DATE);

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Info { input } => {
            let session = open(&input, config).await?;
            println!("{}", serde_json::to_string_pretty(&session.summary())?);
        }
        Commands::Normalize { input } => {
            let session = open(&input, config).await?;
            println!("{}", session.export_document()?);
        }
        Commands::Export {
            input,
            output,
            edits,
        } => {
            let edits = edits
                .iter()
                .map(|raw| parse_edit(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut session = open(&input, config).await?;
            for edit in edits {
                let previous = session
                    .document()
                    .get(&edit.id)
                    .and_then(|f| f.property(&edit.key))
                    .cloned();
                let value = PropertyValue::from_edit(previous.as_ref(), &edit.text);
                session
                    .update_property(&edit.id, &edit.key, value)
                    .with_context(|| format!("failed to set {}.{}", edit.id, edit.key))?;
            }
            session
                .export_to_file(&output)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "Exported {} features to {}",
                session.document().len(),
                output.display()
            );
        }
    }

    Ok(())
}
