use std::{env, fs};

use anyhow::{Context, Result};

use super::super::{args::InitCommand, exit_status::ExitStatus};
use super::{CommandKind, CommandResult, CommandSummary, InitSummary};
use crate::config::{CONFIG_FILE_NAME, OutputFormat, default_config_json};

pub fn init(cmd: InitCommand) -> Result<CommandResult> {
    let root = match cmd.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to determine current directory")?,
    };
    let config_path = root.join(CONFIG_FILE_NAME);

    let created = !config_path.exists();
    if created {
        fs::write(&config_path, default_config_json()?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    Ok(CommandResult {
        kind: CommandKind::Init,
        summary: CommandSummary::Init(InitSummary {
            file_name: CONFIG_FILE_NAME.to_string(),
            created,
        }),
        format: OutputFormat::Table,
        issues: Vec::new(),
        status: if created {
            ExitStatus::Success
        } else {
            ExitStatus::Failure(1)
        },
    })
}
