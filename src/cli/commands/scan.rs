use anyhow::{Context, Result};
use tracing::warn;

use super::super::{args::ScanCommand, exit_status::ExitStatus};
use super::{
    CommandKind, CommandResult, CommandSummary, ScanSummary,
    helper::{
        catalog_issues, duplicate_issues, finish, scope, write_failure_issues, write_summary,
    },
};
use crate::{
    core::{
        ScanContext,
        llm::{TranslationProvider, translate_mutations},
        mutation::{WriteOutcome, mutations_from_missing},
        reconcile::reconcile,
    },
    issues::{Issue, MissingTranslationIssue, PlaceholderMismatchIssue},
};

pub fn scan(cmd: ScanCommand) -> Result<CommandResult> {
    scan_with_provider(cmd, None)
}

/// Run a scan, letting `provider` fill in targets before `--update` writes.
pub fn scan_with_provider(
    cmd: ScanCommand,
    provider: Option<&dyn TranslationProvider>,
) -> Result<CommandResult> {
    let ctx = ScanContext::new(&cmd.common)?;
    let options = ctx.reconcile_options(&cmd.ids)?;
    let references = ctx.references();
    let catalogs = ctx.catalogs();

    let reconciliation = reconcile(references, catalogs, &options);

    let mut issues = catalog_issues(&ctx);
    issues.extend(duplicate_issues(&ctx));
    issues.extend(reconciliation.missing.iter().map(|missing| {
        Issue::MissingTranslation(MissingTranslationIssue::new(missing, &ctx.root_dir))
    }));
    if !cmd.ignore_placeholder_warnings {
        issues.extend(reconciliation.mismatches.iter().map(|mismatch| {
            Issue::PlaceholderMismatch(PlaceholderMismatchIssue::new(mismatch, &ctx.root_dir))
        }));
    }

    let mut write_failed = false;
    let write = if cmd.update {
        let mut mutations = mutations_from_missing(&reconciliation.missing);
        let llm = &ctx.config.llm;
        match provider {
            Some(provider) if !mutations.is_empty() => {
                let applied = translate_mutations(
                    provider,
                    &llm.system_prompt,
                    &reconciliation.missing,
                    &mut mutations,
                    llm.context_window_lines,
                )
                .context("Translation provider failed")?;
                if ctx.verbose {
                    eprintln!("Note: {} translation(s) generated by {}", applied, provider.name());
                }
            }
            None if llm.provider.is_some() => {
                warn!(
                    provider = llm.provider.as_deref().unwrap_or_default(),
                    "translation provider is not available, using fallback texts"
                );
            }
            _ => {}
        }

        let outcome = if mutations.is_empty() {
            WriteOutcome::default()
        } else {
            ctx.writer(cmd.dry_run, !cmd.no_needs_review)
                .write(&mutations, catalogs)
        };
        write_failure_issues(&ctx, &outcome, &mut issues);
        write_failed = !outcome.failures.is_empty();
        Some(write_summary(&ctx, mutations.len(), cmd.dry_run, &outcome))
    } else {
        None
    };

    let codes = &ctx.config.exit_codes;
    let code = if catalogs.has_errors() || write_failed {
        codes.failure
    } else if !reconciliation.missing.is_empty() {
        codes.missing
    } else {
        codes.success
    };

    let summary = ScanSummary {
        scope: scope(&ctx, cmd.dry_run),
        unique_references: references.unique_count(),
        duplicate_references: references.duplicate_count(),
        total_references: references.total_count(),
        write,
    };

    Ok(finish(
        CommandKind::Scan,
        CommandSummary::Scan(summary),
        &ctx,
        issues,
        ExitStatus::from_code(code),
    ))
}
