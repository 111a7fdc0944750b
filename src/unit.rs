//! Discovery and parsing of the compilation unit the generator runs against.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::MiddlewarerError;
use crate::types::ModulePath;

const MANIFEST: &str = "Cargo.toml";
const MODULE_ROOTS: &[&str] = &["lib.rs", "main.rs", "mod.rs"];

/// A parsed Rust source file plus where it sits in its crate.
#[derive(Debug)]
pub struct CompilationUnit {
    /// Path of the source file.
    pub path: PathBuf,
    /// Module path of the file (`crate`, `crate::store`, ...) when derivable.
    pub module_path: Option<ModulePath>,
    /// Parsed syntax tree.
    pub file: syn::File,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<toml::Value>,
    lib: Option<Target>,
    #[serde(default)]
    bin: Vec<Target>,
}

#[derive(Debug, Deserialize)]
struct Target {
    path: Option<String>,
}

impl Manifest {
    fn lib_path(&self) -> &str {
        self.lib
            .as_ref()
            .and_then(|lib| lib.path.as_deref())
            .unwrap_or("src/lib.rs")
    }
}

impl CompilationUnit {
    /// True when the unit is a crate root (`lib.rs`, `main.rs`, a bin target or
    /// a custom `[lib] path`).
    pub fn is_crate_root(&self) -> bool {
        self.module_path
            .as_ref()
            .is_some_and(|path| path.segments() == ["crate"])
    }
}

/// Loads the single compilation unit found at `source`.
///
/// `source` may be a Rust file, a crate directory containing `Cargo.toml`, or a
/// module directory. Anything other than exactly one candidate file is rejected
/// with [`MiddlewarerError::AmbiguousUnit`].
pub fn load_unit(source: &Path) -> Result<CompilationUnit, MiddlewarerError> {
    let mut candidates = discover_candidates(source)?;
    debug!(source = %source.display(), candidates = candidates.len(), "discovered unit candidates");

    if candidates.len() != 1 {
        return Err(MiddlewarerError::AmbiguousUnit {
            found: candidates.len(),
            candidates,
        });
    }
    let path = candidates.remove(0);

    let input = fs::read_to_string(&path).map_err(|e| MiddlewarerError::LoadError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let file = syn::parse_file(&input).map_err(|e| {
        let start = e.span().start();
        MiddlewarerError::LoadError {
            path: path.clone(),
            message: format!("{e} at line {}, column {}", start.line, start.column + 1),
        }
    })?;

    let module_path = derive_module_path(&path);
    debug!(unit = %path.display(), module = ?module_path.as_ref().map(ToString::to_string), "loaded unit");

    Ok(CompilationUnit {
        path,
        module_path,
        file,
    })
}

fn discover_candidates(source: &Path) -> Result<Vec<PathBuf>, MiddlewarerError> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        return Err(MiddlewarerError::LoadError {
            path: source.to_path_buf(),
            message: "no such file or directory".to_string(),
        });
    }

    let manifest_path = source.join(MANIFEST);
    if manifest_path.is_file() {
        let manifest = read_manifest(&manifest_path)?;
        if manifest.package.is_none() {
            // Workspace-only manifest: no crate root of its own.
            return Ok(Vec::new());
        }
        return Ok([source.join(manifest.lib_path()), source.join("src/main.rs")]
            .into_iter()
            .filter(|p| p.is_file())
            .collect());
    }

    Ok(MODULE_ROOTS
        .iter()
        .map(|name| source.join(name))
        .filter(|p| p.is_file())
        .collect())
}

fn read_manifest(path: &Path) -> Result<Manifest, MiddlewarerError> {
    let text = fs::read_to_string(path).map_err(|e| MiddlewarerError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&text).map_err(|e| MiddlewarerError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Derives `crate` for any target root the manifest declares, and `crate::a::b`
/// for `a/b.rs` or `a/b/mod.rs` below the directory of the closest target root.
fn derive_module_path(path: &Path) -> Option<ModulePath> {
    let absolute = fs::canonicalize(path).ok()?;
    let crate_dir = absolute
        .ancestors()
        .skip(1)
        .find(|dir| dir.join(MANIFEST).is_file())?;
    let roots = target_roots(crate_dir);
    if roots.contains(&absolute) {
        return Some(ModulePath::new(vec!["crate".to_string()]));
    }
    let module_dir = roots
        .iter()
        .filter_map(|root| root.parent())
        .filter(|dir| absolute.starts_with(dir))
        .max_by_key(|dir| dir.components().count())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| crate_dir.join("src"));
    let relative = absolute.strip_prefix(&module_dir).ok()?;

    let mut segments = vec!["crate".to_string()];
    let components: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let (file_name, dirs) = components.split_last()?;
    segments.extend(dirs.iter().map(|d| d.to_string()));

    let stem = file_name.strip_suffix(".rs")?;
    match (stem, dirs.is_empty()) {
        ("lib" | "main", true) | ("mod", false) => {}
        ("mod", true) => return None,
        (stem, _) => segments.push(stem.to_string()),
    }
    if segments.iter().any(|s| s.contains('-') || s.contains('.')) {
        return None;
    }
    Some(ModulePath::new(segments))
}

/// Canonical paths of every target root of the crate in `crate_dir`: the
/// library, `src/main.rs`, `[[bin]]` paths and auto-discovered `src/bin` targets.
fn target_roots(crate_dir: &Path) -> Vec<PathBuf> {
    let Ok(manifest) = read_manifest(&crate_dir.join(MANIFEST)) else {
        return Vec::new();
    };
    if manifest.package.is_none() {
        return Vec::new();
    }

    let mut roots = vec![
        crate_dir.join(manifest.lib_path()),
        crate_dir.join("src/main.rs"),
    ];
    roots.extend(
        manifest
            .bin
            .iter()
            .filter_map(|bin| bin.path.as_deref())
            .map(|path| crate_dir.join(path)),
    );
    if let Ok(entries) = fs::read_dir(crate_dir.join("src/bin")) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                roots.push(path.join("main.rs"));
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                roots.push(path);
            }
        }
    }

    roots
        .into_iter()
        .filter_map(|root| fs::canonicalize(root).ok())
        .collect()
}
