//! Hierarchical script discovery.
//!
//! Walks a directory tree, deriving each script's composite version from
//! the version prefixes of its ancestors and its own filename, and returns
//! a flat, version-sorted script list.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::filter::ScriptFilter;
use crate::script::MigrationScript;
use crate::version::{parse_name, Version};

/// Discover migration scripts under `path`.
///
/// `path` may be a directory tree or a single script file. Entries whose
/// names carry no version prefix are skipped silently; two scripts that
/// resolve to the same composite version fail the whole scan. The result
/// is sorted ascending by version; an empty directory yields an empty
/// list, not an error.
pub fn load_scripts(path: &Path, filter: &dyn ScriptFilter) -> CoreResult<Vec<MigrationScript>> {
    let mut scripts: BTreeMap<Version, MigrationScript> = BTreeMap::new();

    if path.is_file() {
        add_file(&mut scripts, path, path, &Version::new(&[0, 0]), 0)?;
    } else if path.is_dir() {
        scan_dir(path, path, &Version::new(&[0, 0]), 0, filter, &mut scripts)?;
    } else {
        return Err(CoreError::ScriptsPathNotFound {
            path: path.display().to_string(),
        });
    }

    Ok(scripts.into_values().collect())
}

fn scan_dir(
    dir: &Path,
    root: &Path,
    current: &Version,
    level: usize,
    filter: &dyn ScriptFilter,
    scripts: &mut BTreeMap<Version, MigrationScript>,
) -> CoreResult<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| io_error(dir, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| io_error(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in &entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        add_file(scripts, &path, root, current, level)?;
    }

    for entry in &entries {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(parsed) = parse_name(name) else {
            continue;
        };

        let merged = current.merge(&parsed.version, level);
        if filter.matches(&parsed.name, &merged, level) {
            scan_dir(&path, root, &merged, level + parsed.parts, filter, scripts)?;
        } else {
            log::debug!("Filtered out {} (level {})", path.display(), level);
        }
    }

    Ok(())
}

fn add_file(
    scripts: &mut BTreeMap<Version, MigrationScript>,
    path: &Path,
    root: &Path,
    current: &Version,
    level: usize,
) -> CoreResult<()> {
    if !path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
    {
        return Ok(());
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(());
    };
    let Some(parsed) = parse_name(stem) else {
        return Ok(());
    };

    let version = current.merge(&parsed.version, level);
    let relative = relative_slash_path(root, path);
    let script = MigrationScript::from_file(version, parsed.name, relative, path);

    match scripts.entry(version) {
        Entry::Vacant(slot) => {
            slot.insert(script);
            Ok(())
        }
        Entry::Occupied(existing) => Err(CoreError::DuplicateVersion {
            version,
            first: existing.get().relative_path().to_string(),
            second: script.relative_path().to_string(),
        }),
    }
}

/// Path from the scan root, normalized to forward slashes.
fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let pieces: Vec<&str> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if pieces.is_empty() {
        // The scan root itself was a file.
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    } else {
        pieces.join("/")
    }
}

fn io_error(dir: &Path, source: std::io::Error) -> CoreError {
    CoreError::IoWithPath {
        path: dir.display().to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
