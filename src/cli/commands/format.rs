use anyhow::{Context, Result};

use super::super::{args::FormatCommand, exit_status::ExitStatus};
use super::{
    CommandKind, CommandResult, CommandSummary, FormatSummary,
    helper::{finish, scope},
};
use crate::core::ScanContext;

pub fn format(cmd: FormatCommand) -> Result<CommandResult> {
    let ctx = ScanContext::new(&cmd.common)?;
    let renderer = ctx.renderer();
    let catalogs = ctx.catalogs();

    let mut catalog_count = 0;
    let mut changed = Vec::new();
    for (locale, package_key, _, file) in catalogs.catalog_files() {
        catalog_count += 1;
        let clean = renderer
            .check_format(&file.path, package_key, locale, !cmd.check)
            .with_context(|| format!("Failed to format {}", ctx.relative(&file.path)))?;
        if !clean {
            changed.push(ctx.relative(&file.path));
        }
    }

    let code = if cmd.check && !changed.is_empty() {
        ctx.config.exit_codes.dirty
    } else {
        ctx.config.exit_codes.success
    };

    let summary = FormatSummary {
        scope: scope(&ctx, cmd.check),
        check: cmd.check,
        catalog_count,
        changed,
    };

    Ok(finish(
        CommandKind::Format,
        CommandSummary::Format(summary),
        &ctx,
        Vec::new(),
        ExitStatus::from_code(code),
    ))
}
