//! Manifest loaders for composer projects
//!
//! Two sources feed a [`Manifest`]:
//! - the generated classmap (`vendor/composer/autoload_classmap.php`)
//! - PSR-4 roots declared in `composer.json`, scanned for `.php` files

use crate::error::{ManifestError, ManifestResult};
use crate::manifest::Manifest;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Classmap location relative to the project root
pub const CLASSMAP_PATH: &str = "vendor/composer/autoload_classmap.php";

/// `'Name\\Space' => $baseDir . '/path.php',`
static CLASSMAP_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'((?:[^'\\]|\\.)+)'\s*=>\s*\$(vendorDir|baseDir)\s*\.\s*'([^']*)'")
        .expect("classmap entry pattern")
});

#[derive(Debug, Default, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    autoload: Autoload,
    #[serde(default, rename = "autoload-dev")]
    autoload_dev: Autoload,
}

#[derive(Debug, Default, Deserialize)]
struct Autoload {
    #[serde(default, rename = "psr-4")]
    psr4: IndexMap<String, Psr4Dirs>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Psr4Dirs {
    One(String),
    Many(Vec<String>),
}

impl Psr4Dirs {
    fn iter(&self) -> impl Iterator<Item = &str> {
        let dirs: Vec<&str> = match self {
            Self::One(dir) => vec![dir.as_str()],
            Self::Many(dirs) => dirs.iter().map(String::as_str).collect(),
        };
        dirs.into_iter()
    }
}

impl Manifest {
    /// Load composer's generated classmap
    ///
    /// `$vendorDir` expands to the directory holding `composer/`, and
    /// `$baseDir` to its parent.
    ///
    /// # Errors
    /// Returns [`ManifestError::Io`] if the file cannot be read.
    pub fn load_classmap(file: &Path) -> ManifestResult<Self> {
        let text =
            std::fs::read_to_string(file).map_err(|e| ManifestError::io_error(file, e))?;

        let vendor_dir = file
            .parent()
            .and_then(Path::parent)
            .map_or_else(PathBuf::new, Path::to_path_buf);
        let base_dir = vendor_dir
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let mut manifest = Self::new();
        for captures in CLASSMAP_ENTRY.captures_iter(&text) {
            let name = captures[1].replace("\\\\", "\\");
            let root = if &captures[2] == "vendorDir" {
                &vendor_dir
            } else {
                &base_dir
            };
            let relative = captures[3].trim_start_matches('/');
            manifest.insert(&name, root.join(relative));
        }

        tracing::debug!(file = %file.display(), entries = manifest.len(), "loaded classmap");
        Ok(manifest)
    }

    /// Scan the PSR-4 roots declared in `<root>/composer.json`
    ///
    /// Both `autoload` and `autoload-dev` sections are read. Every `.php`
    /// file under a declared directory maps to prefix + relative path.
    ///
    /// # Errors
    /// Returns [`ManifestError::MissingComposerJson`] without a
    /// `composer.json`, [`ManifestError::Json`] when it is malformed.
    pub fn scan_psr4(root: &Path) -> ManifestResult<Self> {
        let mut manifest = Self::new();
        manifest.extend_psr4(root, false)?;
        Ok(manifest)
    }

    /// Manifest for a composer project
    ///
    /// Uses the classmap when present, then adds PSR-4 entries that are not
    /// yet known (classes created since the last dump).
    ///
    /// # Errors
    /// Returns [`ManifestError::MissingComposerJson`] when the root has
    /// neither source.
    pub fn from_project(root: &Path) -> ManifestResult<Self> {
        let classmap = root.join(CLASSMAP_PATH);
        let has_classmap = classmap.is_file();
        let has_composer = root.join("composer.json").is_file();
        if !has_classmap && !has_composer {
            return Err(ManifestError::MissingComposerJson(root.to_path_buf()));
        }

        let mut manifest = if has_classmap {
            Self::load_classmap(&classmap)?
        } else {
            Self::new()
        };
        if has_composer {
            manifest.extend_psr4(root, true)?;
        }

        tracing::info!(root = %root.display(), entries = manifest.len(), "built class manifest");
        Ok(manifest)
    }

    fn extend_psr4(&mut self, root: &Path, keep_existing: bool) -> ManifestResult<()> {
        let composer_path = root.join("composer.json");
        if !composer_path.is_file() {
            return Err(ManifestError::MissingComposerJson(root.to_path_buf()));
        }
        let text = std::fs::read_to_string(&composer_path)
            .map_err(|e| ManifestError::io_error(&composer_path, e))?;
        let composer: ComposerJson =
            serde_json::from_str(&text).map_err(|source| ManifestError::Json {
                path: composer_path.clone(),
                source,
            })?;

        let sections = composer.autoload.psr4.iter().chain(composer.autoload_dev.psr4.iter());
        for (prefix, dirs) in sections {
            for dir in dirs.iter() {
                let base = root.join(dir);
                for (name, path) in scan_dir(prefix, &base) {
                    if keep_existing && self.contains(&name) {
                        continue;
                    }
                    self.insert(&name, path);
                }
            }
        }
        Ok(())
    }
}

/// Map every `.php` file under `base` to `prefix` + relative path
fn scan_dir(prefix: &str, base: &Path) -> Vec<(String, PathBuf)> {
    let prefix = prefix.trim_matches('\\');
    WalkDir::new(base)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "php")
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(base).ok()?.with_extension("");
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let local = segments.join("\\");
            let name = if prefix.is_empty() {
                local
            } else {
                format!("{prefix}\\{local}")
            };
            Some((name, entry.path().to_path_buf()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CLASSMAP: &str = r"<?php

// autoload_classmap.php @generated by Composer

$vendorDir = dirname(__DIR__);
$baseDir = dirname($vendorDir);

return array(
    'App\\Models\\User' => $baseDir . '/app/Models/User.php',
    'Composer\\InstalledVersions' => $vendorDir . '/composer/InstalledVersions.php',
);
";

    #[test]
    fn classmap_expands_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let composer_dir = dir.path().join("vendor/composer");
        fs::create_dir_all(&composer_dir).expect("mkdir");
        let file = composer_dir.join("autoload_classmap.php");
        fs::write(&file, CLASSMAP).expect("write");

        let manifest = Manifest::load_classmap(&file).expect("load");

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.get("App\\Models\\User"),
            Some(dir.path().join("app/Models/User.php").as_path())
        );
        assert_eq!(
            manifest.get("Composer\\InstalledVersions"),
            Some(dir.path().join("vendor/composer/InstalledVersions.php").as_path())
        );
    }

    #[test]
    fn classmap_missing_file() {
        let err = Manifest::load_classmap(Path::new("/nonexistent/classmap.php")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn psr4_scan_nested() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("composer.json"),
            r#"{"autoload": {"psr-4": {"App\\": "app/"}}, "autoload-dev": {"psr-4": {"Tests\\": ["tests/"]}}}"#,
        )
        .expect("write");
        fs::create_dir_all(dir.path().join("app/Models")).expect("mkdir");
        fs::create_dir_all(dir.path().join("tests")).expect("mkdir");
        fs::write(dir.path().join("app/Models/User.php"), "<?php").expect("write");
        fs::write(dir.path().join("app/readme.md"), "").expect("write");
        fs::write(dir.path().join("tests/UserTest.php"), "<?php").expect("write");

        let manifest = Manifest::scan_psr4(dir.path()).expect("scan");

        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains("App\\Models\\User"));
        assert!(manifest.contains("Tests\\UserTest"));
    }

    #[test]
    fn psr4_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("composer.json"), "{ not json").expect("write");

        let err = Manifest::scan_psr4(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Json { .. }));
    }

    #[test]
    fn project_without_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Manifest::from_project(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingComposerJson(_)));
    }
}
