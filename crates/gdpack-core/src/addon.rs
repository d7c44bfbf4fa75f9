//! Locating an addon inside fetched source files and copying it into a
//! project.
//!
//! A repository or directory rarely *is* the addon. Godot addons are usually
//! published as a project with the addon under `addons/<name>/`, so the
//! directory to install is searched for in this order:
//! 1. the root itself, when it holds a `plugin.cfg` or a `*.gdextension` file
//! 2. `addons/<name>/`
//! 3. the only directory under `addons/`
//! 4. the root

use std::fs;
use std::path::{Path, PathBuf};

use crate::project::{ADDONS_DIR_NAME, JSON_MANIFEST_FILE_NAME, MANIFEST_FILE_NAME};
use crate::{Error, Result};

const PLUGIN_FILE_NAME: &str = "plugin.cfg";
const EXTENSION_SUFFIX: &str = ".gdextension";

/// Find the directory holding the addon `name` within `root`.
pub fn find_addon_dir(root: &Path, name: &str) -> Result<PathBuf> {
    if is_addon_root(root)? {
        return Ok(root.to_path_buf());
    }

    let addons = root.join(ADDONS_DIR_NAME);
    let named = addons.join(name);
    if named.is_dir() {
        return Ok(named);
    }

    if addons.is_dir() {
        let mut dirs = visible_entries(&addons)?
            .into_iter()
            .filter(|path| path.is_dir());
        if let (Some(only), None) = (dirs.next(), dirs.next()) {
            tracing::debug!(addon = name, dir = %only.display(), "using only addon directory");
            return Ok(only);
        }
    }

    Ok(root.to_path_buf())
}

/// Copy the addon at `src` into `dst`.
///
/// Hidden entries (names starting with `.`) and gdpack manifests are left
/// out. Symlinks to files are copied as files; symlinks to directories are
/// skipped.
pub fn copy_addon(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let name = entry.file_name();
        if is_excluded(&name.to_string_lossy()) {
            continue;
        }

        let from = entry.path();
        let to = dst.join(&name);
        let file_type = entry.file_type().map_err(|e| Error::io(&from, e))?;

        if file_type.is_dir() {
            copy_addon(&from, &to)?;
        } else if file_type.is_file() || fs::metadata(&from).is_ok_and(|m| m.is_file()) {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
        } else {
            tracing::debug!(path = %from.display(), "skipping symlinked directory");
        }
    }

    Ok(())
}

fn is_excluded(name: &str) -> bool {
    name.starts_with('.') || name == MANIFEST_FILE_NAME || name == JSON_MANIFEST_FILE_NAME
}

fn is_addon_root(dir: &Path) -> Result<bool> {
    Ok(visible_entries(dir)?.iter().any(|path| {
        path.is_file()
            && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                n == PLUGIN_FILE_NAME || (n.ends_with(EXTENSION_SUFFIX) && n != EXTENSION_SUFFIX)
            })
    }))
}

fn visible_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn root_with_plugin_cfg_is_the_addon() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("plugin.cfg"));
        touch(&temp.path().join("addons/other/plugin.cfg"));

        assert_eq!(find_addon_dir(temp.path(), "lib").unwrap(), temp.path());
    }

    #[test]
    fn root_with_extension_is_the_addon() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("lib.gdextension"));

        assert_eq!(find_addon_dir(temp.path(), "lib").unwrap(), temp.path());
    }

    #[test]
    fn named_addon_subfolder_wins() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("addons/lib/plugin.cfg"));
        touch(&temp.path().join("addons/lib_demo/plugin.cfg"));

        assert_eq!(
            find_addon_dir(temp.path(), "lib").unwrap(),
            temp.path().join("addons/lib")
        );
    }

    #[test]
    fn single_addon_subfolder_is_used() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("addons/dialogue_manager/plugin.cfg"));
        touch(&temp.path().join("project.godot"));

        assert_eq!(
            find_addon_dir(temp.path(), "dialogue").unwrap(),
            temp.path().join("addons/dialogue_manager")
        );
    }

    #[test]
    fn ambiguous_addons_fall_back_to_root() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("addons/a/plugin.cfg"));
        touch(&temp.path().join("addons/b/plugin.cfg"));

        assert_eq!(find_addon_dir(temp.path(), "lib").unwrap(), temp.path());
    }

    #[test]
    fn copy_skips_hidden_files_and_manifests() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("plugin.cfg"));
        touch(&src.join("scripts/main.gd"));
        touch(&src.join(".git/HEAD"));
        touch(&src.join(".gitignore"));
        touch(&src.join("scripts/.cache"));
        touch(&src.join("gdpack.toml"));

        let dst = temp.path().join("dst");
        copy_addon(&src, &dst).unwrap();

        assert!(dst.join("plugin.cfg").is_file());
        assert!(dst.join("scripts/main.gd").is_file());
        assert!(!dst.join(".git").exists());
        assert!(!dst.join(".gitignore").exists());
        assert!(!dst.join("scripts/.cache").exists());
        assert!(!dst.join("gdpack.toml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_does_not_follow_directory_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("plugin.cfg"));
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();
        std::os::unix::fs::symlink(src.join("plugin.cfg"), src.join("link.cfg")).unwrap();

        let dst = temp.path().join("dst");
        copy_addon(&src, &dst).unwrap();

        assert!(!dst.join("loop").exists());
        assert!(dst.join("link.cfg").is_file());
    }
}
