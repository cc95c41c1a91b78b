use crate::output::print_json;
use clap::Subcommand;
use runbook_core::config::{RunbookConfig, WarnLevel};
use runbook_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,
    /// Validate the config for common mistakes
    Validate,
}

pub fn run(
    config: &RunbookConfig,
    explicit: Option<&Path>,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config, explicit, json),
        ConfigSubcommand::Validate => validate(config, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config: &RunbookConfig, explicit: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let source = match explicit {
        Some(p) => p.to_path_buf(),
        None => paths::default_config_path()?,
    };
    let defaults = config.defaults_path()?;

    if json {
        let value = serde_json::json!({
            "source": source,
            "default_bash_shell": config.default_bash_shell,
            "script_root": config.script_root(),
            "defaults_file": defaults,
            "backend": config.backend.map(|b| b.as_str()),
        });
        return print_json(&value);
    }

    let exists = if source.exists() { "" } else { " (not found, using defaults)" };
    println!("Config file:   {}{exists}", source.display());
    println!("Bash shell:    {}", config.default_bash_shell);
    println!("Script root:   {}", config.script_root().display());
    println!("Defaults file: {}", defaults.display());
    println!(
        "Backend:       {}",
        config.backend.map(|b| b.as_str()).unwrap_or("auto")
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &RunbookConfig, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
