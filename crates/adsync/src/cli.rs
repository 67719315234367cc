//! Command-line surface. Thin glue over the app services; all real work
//! happens in [`crate::app`].

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;

use crate::app::config_edit::{self, ConfigDocument};
use crate::app::project::Project;
use crate::app::scan::Scanner;
use crate::domain::errors::AdsyncError;
use crate::domain::model::AssetRecord;
use crate::infra::config::Config;
use crate::infra::trigger::BuildRequest;

#[derive(Parser)]
#[command(name = "adsync", version, about = "Playable-ad asset and config synchronizer")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a project and report asset/module/usage state
    Scan {
        project_root: PathBuf,
        /// Emit records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Replace an asset's binary content and regenerate its base64 module
    Replace {
        project_root: PathBuf,
        /// Asset path relative to public/assets
        asset_path: String,
        /// Replacement file; must classify as the same category
        file: PathBuf,
    },
    /// Inspect or edit a JS config-object export
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Validate and print a build-trigger request payload
    BuildRequest {
        #[arg(long)]
        network: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        project_root: PathBuf,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the extracted config object
    Show { file: PathBuf },
    /// Set a dotted key path to a literal value and save in place
    Set {
        file: PathBuf,
        key_path: String,
        value: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => Ok(()),
        // User cancellation is a benign no-op, never an error.
        Err(err)
            if err
                .downcast_ref::<AdsyncError>()
                .is_some_and(AdsyncError::is_abort) =>
        {
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan { project_root, json } => scan(&project_root, json),
        Command::Replace {
            project_root,
            asset_path,
            file,
        } => replace(&project_root, &asset_path, &file),
        Command::Config { action } => match action {
            ConfigAction::Show { file } => config_show(&file),
            ConfigAction::Set {
                file,
                key_path,
                value,
            } => config_set(&file, &key_path, &value),
        },
        Command::BuildRequest {
            network,
            name,
            project_root,
        } => build_request(&network, &name, &project_root),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "adsync", &mut io::stdout());
            Ok(())
        }
    }
}

fn scan(project_root: &PathBuf, json: bool) -> Result<()> {
    let config = Config::load()?;
    let project = Project::open(project_root)?;
    let records = project.scan(&Scanner::new(&config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "{:<40} {:<8} {:<8} {:<6} {}",
        "ASSET", "CATEGORY", "BASE64", "IN-USE", "MODIFIED"
    );
    for record in &records {
        println!(
            "{:<40} {:<8} {:<8} {:<6} {}",
            record.file.relative_path,
            record.file.category,
            flag(record.has_base64),
            flag(record.in_use),
            modified_stamp(record),
        );
    }
    println!("{} assets", records.len());
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn modified_stamp(record: &AssetRecord) -> String {
    record
        .file
        .modified
        .and_then(|stamp| stamp.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_owned())
}

fn replace(project_root: &PathBuf, asset_path: &str, file: &PathBuf) -> Result<()> {
    let config = Config::load()?;
    let project = Project::open(project_root)?;
    let records = project.scan(&Scanner::new(&config))?;

    let Some(record) = records
        .iter()
        .find(|record| record.file.relative_path == asset_path)
    else {
        bail!("asset {asset_path} not found in {}", project_root.display());
    };

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", file.display()))?;

    let outcome = project.replace_asset(record, &bytes, file_name)?;
    println!(
        "regenerated {} (export {})",
        outcome.module_path, outcome.export_identifier
    );
    Ok(())
}

fn config_show(file: &PathBuf) -> Result<()> {
    let document = ConfigDocument::load(file)?;
    let keyword = match document.export_kind() {
        config_edit::ExportKind::Const => "const",
        config_edit::ExportKind::Let => "let",
        config_edit::ExportKind::Var => "var",
        config_edit::ExportKind::Default => "default",
    };
    println!("// export {keyword} {}", document.export_identifier());
    println!("{}", serde_json::to_string_pretty(document.value())?);
    Ok(())
}

fn config_set(file: &PathBuf, key_path: &str, value: &str) -> Result<()> {
    let mut document = ConfigDocument::load(file)?;
    // Interpret the value as a literal; anything that does not parse is
    // taken as a plain string.
    let value = config_edit::parse_literal(value)
        .unwrap_or_else(|_| Value::String(value.to_owned()));
    document.set_path(key_path, value)?;
    document.save_to(file)?;
    println!("updated {key_path} in {}", file.display());
    Ok(())
}

fn build_request(network: &str, name: &str, project_root: &PathBuf) -> Result<()> {
    let project = Project::open(project_root)?;
    let root = project
        .root()
        .root()
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", project_root.display()))?;
    let request = BuildRequest::new(network, name, &root.display().to_string())?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
