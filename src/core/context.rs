use std::{
    cell::OnceCell,
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use glob::Pattern;
use tracing::debug;

use crate::{
    cli::args::CommonArgs,
    config::{Config, load_config},
    core::{
        catalog::{path::is_catalog_file, writer::CatalogRenderer},
        catalog_index::{
            CatalogIndex, FallbackChainProvider, IndexFilters, build_index, load_catalogs,
        },
        collect::Collectors,
        file_scanner::{discovery_roots, relative_slash_path, scan_files},
        mutation::{CatalogWriter, UnitState, WriterSettings},
        reconcile::ReconcileOptions,
        reference_index::ReferenceIndex,
    },
    utils::normalize_list,
};

/// State of one command run.
///
/// Files are discovered up front. The reference and catalog indexes are
/// built on first access, so commands that only need one of them never pay
/// for the other.
///
/// Configuration priority, highest first:
/// 1. CLI arguments (e.g. `--locales de,fr`)
/// 2. `.l10nguy.json`
/// 3. Built-in defaults
pub struct ScanContext {
    // ============================================================
    // Basic data (set at initialization)
    // ============================================================
    /// Merged configuration (CLI args > config file > defaults).
    pub config: Config,

    /// Project root. Relative paths in config and output are based here.
    pub root_dir: PathBuf,

    /// Locale, package and source scope of the run.
    pub filters: IndexFilters,

    pub verbose: bool,

    /// PHP, Fusion and NodeType files, sorted.
    pub source_files: Vec<PathBuf>,

    /// `.xlf` files, sorted.
    pub catalog_files: Vec<PathBuf>,

    // ============================================================
    // Lazily built indexes
    // ============================================================
    references: OnceCell<ReferenceIndex>,
    catalogs: OnceCell<CatalogIndex>,
}

impl ScanContext {
    /// Load configuration, apply CLI overrides and discover files.
    pub fn new(common: &CommonArgs) -> Result<Self> {
        let verbose = common.verbose;

        // ============================================================
        // 1. Load config, searching upwards from --root or cwd
        // ============================================================
        let cwd = env::current_dir().context("Failed to determine current directory")?;
        let start_dir = common
            .root
            .as_ref()
            .map(|root| cwd.join(root))
            .unwrap_or_else(|| cwd.clone());
        let config_result = load_config(&start_dir)?;

        if verbose && !config_result.from_file() {
            eprintln!("Note: No .l10nguy.json found, using default configuration");
        }

        let root_dir = match (&common.root, &config_result.path) {
            (Some(_), _) => start_dir,
            (None, Some(path)) => path.parent().map(Path::to_path_buf).unwrap_or(cwd),
            (None, None) => cwd,
        };
        let mut config = config_result.config;

        // ============================================================
        // 2. Apply CLI overrides (CLI > config file > defaults)
        // ============================================================
        if !common.paths.is_empty() {
            config.paths = common.paths.clone();
        }
        let cli_locales = normalize_list(&common.locales);
        if !cli_locales.is_empty() {
            config.locales = cli_locales;
        }
        if let Some(format) = common.format {
            config.format = format;
        }

        let filters = IndexFilters {
            locales: config.locales.clone(),
            package: common
                .package
                .clone()
                .or_else(|| config.default_package.clone()),
            source: common.source.clone(),
        };

        // ============================================================
        // 3. Discover source and catalog files in parallel
        // ============================================================
        let roots = discovery_roots(&root_dir, &config.paths, filters.package.as_deref());
        let collectors = Collectors::default();
        let (source_scan, catalog_scan) = rayon::join(
            || {
                scan_files(
                    &root_dir,
                    &roots,
                    &config.includes,
                    &config.excludes,
                    |path| collectors.supports(path),
                )
            },
            || scan_files(&root_dir, &roots, &[], &config.excludes, is_catalog_file),
        );

        let skipped_count = source_scan.skipped_count.max(catalog_scan.skipped_count);
        if skipped_count > 0 {
            eprintln!(
                "Warning: {} path(s) skipped due to access errors{}",
                skipped_count,
                if verbose { "" } else { " (use -v for details)" }
            );
        }
        debug!(
            sources = source_scan.files.len(),
            catalogs = catalog_scan.files.len(),
            "discovered files"
        );

        Ok(Self {
            config,
            root_dir,
            filters,
            verbose,
            source_files: source_scan.files,
            catalog_files: catalog_scan.files,
            references: OnceCell::new(),
            catalogs: OnceCell::new(),
        })
    }

    /// Reference index over all source files (lazy initialization).
    pub fn references(&self) -> &ReferenceIndex {
        self.references.get_or_init(|| {
            let references = Collectors::default().collect_all(&self.source_files);
            ReferenceIndex::from_references(references)
        })
    }

    /// Catalog index for the filtered scope (lazy initialization).
    pub fn catalogs(&self) -> &CatalogIndex {
        self.catalogs.get_or_init(|| {
            let loaded = load_catalogs(&self.catalog_files, &self.filters);
            let provider = FallbackChainProvider::new(&loaded, &self.config.fallback_locales);
            build_index(&loaded, &self.filters, &provider)
        })
    }

    pub fn reconcile_options(&self, id_patterns: &[String]) -> Result<ReconcileOptions> {
        let id_patterns = id_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).with_context(|| format!("Invalid glob pattern in '--id': \"{}\"", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ReconcileOptions {
            locales: self.filters.locales.clone(),
            package: self.filters.package.clone(),
            source: self.filters.source.clone(),
            id_patterns,
        })
    }

    pub fn renderer(&self) -> CatalogRenderer {
        CatalogRenderer::new(self.config.tab_width, self.config.order_by_id)
    }

    /// Catalog writer configured from the state and LLM settings.
    pub fn writer(&self, dry_run: bool, needs_review: bool) -> CatalogWriter<'_> {
        let state = (self.config.set_needs_review && needs_review).then_some("needs-review");
        let llm = &self.config.llm;
        let settings = WriterSettings {
            renderer: self.renderer(),
            state: UnitState::new(state, self.config.new_state_qualifier.as_deref()),
            llm_state: UnitState::new(llm.new_state.as_deref(), llm.new_state_qualifier.as_deref()),
            llm_notes: llm.note_enabled,
            dry_run,
        };
        CatalogWriter::new(&self.root_dir, &self.config.paths, settings)
    }

    // ============================================================
    // Utility methods
    // ============================================================

    /// `path` relative to the project root, for display.
    pub fn relative(&self, path: &Path) -> String {
        relative_slash_path(&self.root_dir, path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::core::context::*;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let package = dir.path().join("DistributionPackages/Acme.Site");
        fs::create_dir_all(package.join("Classes")).unwrap();
        fs::create_dir_all(package.join("Resources/Private/Translations/de")).unwrap();
        fs::write(
            package.join("Classes/Card.php"),
            "<?php\n$t = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n",
        )
        .unwrap();
        fs::write(
            package.join("Resources/Private/Translations/de/Main.xlf"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2"><file original="" source-language="en" target-language="de" datatype="plaintext"><body>
<trans-unit id="cards.old"><source>Old</source></trans-unit>
</body></file></xliff>
"#,
        )
        .unwrap();
        fs::write(dir.path().join(".l10nguy.json"), r#"{ "locales": ["de"] }"#).unwrap();
        dir
    }

    fn args(dir: &TempDir) -> CommonArgs {
        CommonArgs {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_discovers_sources_and_catalogs() {
        let dir = project();
        let ctx = ScanContext::new(&args(&dir)).unwrap();

        assert_eq!(ctx.filters.locales, vec!["de"]);
        assert_eq!(ctx.source_files.len(), 1);
        assert_eq!(ctx.catalog_files.len(), 1);
        assert_eq!(
            ctx.relative(&ctx.catalog_files[0]),
            "DistributionPackages/Acme.Site/Resources/Private/Translations/de/Main.xlf"
        );
        assert_eq!(ctx.references().unique_count(), 1);
        assert_eq!(ctx.catalogs().entry_count(), 1);
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = project();
        let ctx = ScanContext::new(&CommonArgs {
            locales: vec!["fr, it".to_string()],
            package: Some("Acme.Site".to_string()),
            ..args(&dir)
        })
        .unwrap();

        assert_eq!(ctx.filters.locales, vec!["fr", "it"]);
        assert_eq!(ctx.filters.package.as_deref(), Some("Acme.Site"));
        assert_eq!(ctx.catalogs().entry_count(), 0);
    }

    #[test]
    fn test_invalid_id_pattern() {
        let dir = project();
        let ctx = ScanContext::new(&args(&dir)).unwrap();
        let err = ctx.reconcile_options(&["[x".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid glob pattern in '--id': \"[x\"");
    }
}
