use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of scanning files.
pub struct ScanResult {
    /// Matching files, sorted by path.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

/// Recursively collect files below `roots` whose extension is accepted by
/// `accept`.
///
/// `includes` and `excludes` are glob patterns matched against the path
/// relative to `base_dir`. An empty `includes` list accepts everything.
/// Roots that do not exist are skipped with a debug event.
pub fn scan_files(
    base_dir: &Path,
    roots: &[PathBuf],
    includes: &[String],
    excludes: &[String],
    accept: impl Fn(&Path) -> bool,
) -> ScanResult {
    let include_patterns = compile_patterns(includes);
    let exclude_patterns = compile_patterns(excludes);

    let mut files: Vec<PathBuf> = Vec::new();
    let mut skipped_count = 0;

    for root in roots {
        if !root.exists() {
            debug!(root = %root.display(), "scan root does not exist");
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped_count += 1;
                    debug!("cannot access path: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !accept(path) {
                continue;
            }

            let relative = relative_slash_path(base_dir, path);
            if exclude_patterns.iter().any(|p| p.matches(&relative)) {
                continue;
            }
            if !include_patterns.is_empty() && !include_patterns.iter().any(|p| p.matches(&relative))
            {
                continue;
            }

            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();

    ScanResult {
        files,
        skipped_count,
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("invalid glob pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Directories to walk for references and catalogs.
///
/// Configured paths are taken relative to `base_dir` (absolute ones as is).
/// Without any, the walk starts at `DistributionPackages`, narrowed to the
/// package directory when a package filter is set.
pub fn discovery_roots(base_dir: &Path, paths: &[String], package: Option<&str>) -> Vec<PathBuf> {
    if !paths.is_empty() {
        return paths.iter().map(|p| base_dir.join(p)).collect();
    }
    let packages = base_dir.join("DistributionPackages");
    match package {
        Some(package) => vec![packages.join(package)],
        None => vec![packages],
    }
}

/// Path of `path` relative to `base`, with `/` separators.
///
/// Falls back to the full path when `path` is outside `base`.
/// Used both for glob matching and for user-facing output.
pub fn relative_slash_path(base: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(base) else {
        return path.to_string_lossy().replace('\\', "/");
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// True for files with one of the given extensions (case-sensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
