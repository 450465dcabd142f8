//! CLI logic for Muriel.
//!
//! The editing core never writes files; this crate is the exporter that
//! drives it headlessly and puts the results on disk.

mod args;

pub use args::{Args, Command};

use anyhow::{Context, Result};
use log::{info, warn};
use muriel_core::drawable::{Placement, Source};
use muriel_core::storage::FileStorage;
use muriel_core::{Catalog, DiagramRecord, Editor, EditorConfig, Storage, materialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run a command, writing human-readable output to `out`.
pub fn run(args: &Args, out: &mut dyn Write) -> Result<()> {
    match &args.command {
        Command::Export {
            catalog,
            diagram,
            config,
            output,
        } => export(catalog, diagram, config.as_deref(), output, out),
        Command::List { store } => list(store.clone(), out),
        Command::CheckCatalog { catalog } => check_catalog(catalog, out),
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EditorConfig::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

fn export(
    catalog: &Path,
    diagram: &Path,
    config: Option<&Path>,
    output: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    info!("Exporting {} to {}", diagram.display(), output.display());

    let config = load_config(config)?;
    let catalog = Catalog::load(catalog).context("Failed to load symbol catalog")?;
    let json = fs::read_to_string(diagram)
        .with_context(|| format!("Failed to read diagram {}", diagram.display()))?;
    let record = DiagramRecord::from_json(&json)
        .with_context(|| format!("Invalid diagram {}", diagram.display()))?;

    let mut editor = Editor::new(config, catalog);
    editor.load_record(record);
    let snapshot = editor.export_snapshot();

    let skipped = editor.elements().len() - editor.surface().len();
    if skipped > 0 {
        warn!("{} element(s) reference unknown symbols and were skipped", skipped);
    }

    fs::write(output, &snapshot.svg)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    writeln!(
        out,
        "Wrote {} ({}x{} px, {} elements)",
        output.display(),
        snapshot.width,
        snapshot.height,
        editor.surface().len()
    )?;
    Ok(())
}

fn list(store: Option<PathBuf>, out: &mut dyn Write) -> Result<()> {
    let storage = match store {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    }
    .context("Failed to open diagram store")?;

    let records = pollster::block_on(storage.list()).context("Failed to list diagrams")?;
    if records.is_empty() {
        writeln!(out, "No diagrams in {}", storage.base_path().display())?;
        return Ok(());
    }
    for record in records {
        writeln!(
            out,
            "{}\t{}\t{} elements\tupdated {}",
            record.id,
            record.name,
            record.elements.len(),
            record.updated_at
        )?;
    }
    Ok(())
}

fn check_catalog(path: &Path, out: &mut dyn Write) -> Result<()> {
    let catalog = Catalog::load(path).context("Failed to load symbol catalog")?;
    let mut fallbacks = 0;
    for symbol in catalog.iter() {
        let placement = Placement {
            center: Default::default(),
            rotation: 0.0,
            size: symbol.dimensions,
        };
        let drawable = materialize(symbol, &symbol.id, placement);
        let status = match drawable.source {
            Source::Markup => "ok",
            Source::Fallback => {
                fallbacks += 1;
                "fallback"
            }
        };
        writeln!(out, "{}\t{}\t{}", symbol.id, symbol.category.as_str(), status)?;
    }
    writeln!(
        out,
        "{} symbols, {} using fallback shapes",
        catalog.len(),
        fallbacks
    )?;
    Ok(())
}
