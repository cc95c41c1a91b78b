use crate::document::Document;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use runbook_core::config::RunbookConfig;
use runbook_core::defaults::FileDefaults;
use runbook_core::form::ParamKind;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum DefaultsSubcommand {
    /// Show remembered values for a document (secrets are masked)
    Show {
        /// Markdown document
        doc: PathBuf,
    },
    /// Forget every remembered value for a document
    Clear {
        /// Markdown document
        doc: PathBuf,
    },
}

pub fn run(config: &RunbookConfig, subcmd: DefaultsSubcommand, json: bool) -> anyhow::Result<()> {
    let path = config.defaults_path()?;
    let mut store = FileDefaults::open(&path)
        .with_context(|| format!("failed to open defaults {}", path.display()))?;

    match subcmd {
        DefaultsSubcommand::Show { doc } => show(&store, &doc, json),
        DefaultsSubcommand::Clear { doc } => clear(&mut store, &doc, json),
    }
}

fn show(store: &FileDefaults, doc: &Path, json: bool) -> anyhow::Result<()> {
    let document = Document::load(doc)?;
    let secrets: BTreeSet<&str> = document
        .blocks
        .iter()
        .flat_map(|b| &b.parameters)
        .filter(|p| p.kind == ParamKind::Secret)
        .map(|p| p.name.as_str())
        .collect();

    let values: Vec<(String, String)> = store
        .values_for(&document.path)
        .into_iter()
        .map(|(name, value)| {
            let shown = if secrets.contains(name.as_str()) {
                "****".to_string()
            } else {
                value
            };
            (name, shown)
        })
        .collect();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = values
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        return print_json(&map);
    }

    if values.is_empty() {
        println!("No remembered values for {}.", document.path.display());
        return Ok(());
    }
    let rows: Vec<Vec<String>> = values.into_iter().map(|(k, v)| vec![k, v]).collect();
    print_table(&["NAME", "VALUE"], &rows)
}

fn clear(store: &mut FileDefaults, doc: &Path, json: bool) -> anyhow::Result<()> {
    let doc = doc
        .canonicalize()
        .with_context(|| format!("cannot open {}", doc.display()))?;
    let removed = store.clear(&doc)?;

    if json {
        print_json(&serde_json::json!({ "document": doc, "removed": removed }))?;
    } else {
        println!("Removed {removed} remembered value(s) for {}.", doc.display());
    }
    Ok(())
}
