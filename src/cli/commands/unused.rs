use anyhow::Result;

use super::super::{args::UnusedCommand, exit_status::ExitStatus};
use super::{
    CommandKind, CommandResult, CommandSummary, UnusedSummary,
    helper::{
        catalog_issues, duplicate_issues, finish, scope, write_failure_issues, write_summary,
    },
};
use crate::{
    core::{ScanContext, reconcile::find_unused},
    issues::{Issue, UnusedEntryIssue},
};

pub fn unused(cmd: UnusedCommand) -> Result<CommandResult> {
    let ctx = ScanContext::new(&cmd.common)?;
    let options = ctx.reconcile_options(&[])?;
    let references = ctx.references();
    let catalogs = ctx.catalogs();

    let entries = find_unused(references, catalogs, &options);

    let mut issues = catalog_issues(&ctx);
    issues.extend(duplicate_issues(&ctx));
    issues.extend(
        entries
            .iter()
            .map(|entry| Issue::UnusedEntry(UnusedEntryIssue::new(entry, &ctx.root_dir))),
    );

    let mut delete_failed = false;
    let delete = if cmd.delete && !entries.is_empty() {
        let outcome = ctx.writer(cmd.dry_run, true).delete_entries(&entries);
        write_failure_issues(&ctx, &outcome, &mut issues);
        delete_failed = !outcome.failures.is_empty();
        Some(write_summary(&ctx, entries.len(), cmd.dry_run, &outcome))
    } else {
        None
    };

    let codes = &ctx.config.exit_codes;
    let has_unused = !entries.is_empty() && !(cmd.delete && !cmd.dry_run);
    let code = if catalogs.has_errors() || delete_failed {
        codes.failure
    } else if has_unused {
        codes.unused
    } else {
        codes.success
    };

    let summary = UnusedSummary {
        scope: scope(&ctx, cmd.dry_run),
        duplicate_references: references.duplicate_count(),
        delete,
    };

    Ok(finish(
        CommandKind::Unused,
        CommandSummary::Unused(summary),
        &ctx,
        issues,
        ExitStatus::from_code(code),
    ))
}
