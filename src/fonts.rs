//! Font discovery and family resolution.
//!
//! The catalog owns the Parley font collection for an editing session. The
//! glyph renderer draws every run with the face Parley shaped it with,
//! straight out of this collection, so the bytes behind a layout are also the
//! bytes that rasterize it. Discovery scans the usual OS font directories
//! once per session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::style::FontFamily;

/// Session-scoped font registry.
///
/// Dropping the catalog drops the collection and every registered face;
/// nothing about a session's fonts outlives it.
pub struct FontCatalog {
    font_ctx: parley::FontContext,
    /// Folded family name -> canonical name as the font metadata spells it.
    registered: BTreeMap<String, String>,
    system_loaded: bool,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCatalog {
    /// An empty catalog with a fresh Parley font context.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            registered: BTreeMap::new(),
            system_loaded: false,
        }
    }

    /// Register every family contained in `bytes`.
    ///
    /// Returns the canonical family names found. Registering a family again
    /// is harmless; the first spelling seen stays canonical.
    pub fn register_font_bytes(&mut self, bytes: Vec<u8>) -> UnderlayResult<Vec<String>> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        if families.is_empty() {
            return Err(UnderlayError::decode(
                "no font families registered from font bytes",
            ));
        }

        let mut names = Vec::with_capacity(families.len());
        for (family_id, _) in &families {
            let family_name = self
                .font_ctx
                .collection
                .family_name(*family_id)
                .ok_or_else(|| UnderlayError::decode("registered font family has no name"))?
                .to_string();
            self.registered
                .entry(fold_family_name(&family_name))
                .or_insert_with(|| family_name.clone());
            names.push(family_name);
        }
        Ok(names)
    }

    /// Read a font file and register its families.
    pub fn load_font_file(&mut self, path: &Path) -> UnderlayResult<Vec<String>> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file {}", path.display()))?;
        self.register_font_bytes(bytes)
    }

    /// Register every font file under `dir`, recursively.
    ///
    /// Unreadable or unparsable files are skipped. Returns how many files
    /// registered successfully.
    pub fn load_font_dir(&mut self, dir: &Path) -> usize {
        let mut loaded = 0;
        self.scan_dir(dir, &mut loaded);
        loaded
    }

    /// One-time discovery of OS-installed fonts.
    ///
    /// Idempotent: repeat calls after the first scan are no-ops. Returns how
    /// many font files the first scan registered.
    pub fn ensure_system_fonts(&mut self) -> usize {
        if self.system_loaded {
            return 0;
        }
        self.system_loaded = true;

        let mut loaded = 0;
        for dir in system_font_dirs() {
            self.scan_dir(&dir, &mut loaded);
        }
        tracing::debug!(
            registered = loaded,
            families = self.registered.len(),
            "system font scan"
        );
        loaded
    }

    /// Canonical names of every registered family, in stable order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.registered.values().map(String::as_str)
    }

    /// Return `true` when no faces are registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Canonical name for `family`, if a face for it is registered.
    pub fn resolve(&self, family: FontFamily) -> Option<&str> {
        self.registered
            .get(&fold_family_name(family.name()))
            .map(String::as_str)
    }

    /// Family to shape with: `family` itself, else another offered family,
    /// else any registered one.
    ///
    /// `None` only when the catalog is empty.
    pub fn resolve_or_fallback(&self, family: FontFamily) -> Option<&str> {
        if let Some(name) = self.resolve(family) {
            return Some(name);
        }
        for candidate in FontFamily::ALL {
            if let Some(name) = self.resolve(candidate) {
                return Some(name);
            }
        }
        self.registered.values().next().map(String::as_str)
    }

    pub(crate) fn font_ctx_mut(&mut self) -> &mut parley::FontContext {
        &mut self.font_ctx
    }

    fn scan_dir(&mut self, dir: &Path, loaded: &mut usize) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            // Never recurse through a symlink; system font dirs commonly
            // contain link cycles. Symlinked font files still load below.
            if entry.file_type().is_ok_and(|kind| kind.is_dir()) {
                self.scan_dir(&path, loaded);
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            if !matches!(ext.as_deref(), Some("ttf" | "otf" | "ttc")) {
                continue;
            }
            match self.load_font_file(&path) {
                Ok(_) => *loaded += 1,
                Err(err) => {
                    tracing::trace!(path = %path.display(), error = %err, "skipping font file");
                }
            }
        }
    }
}

fn fold_family_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }
    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(Path::new(&windir).join("Fonts"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(catalog: &mut FontCatalog, name: &str) {
        catalog
            .registered
            .insert(fold_family_name(name), name.to_owned());
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let catalog = FontCatalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.resolve(FontFamily::Roboto).is_none());
        assert!(catalog.resolve_or_fallback(FontFamily::Roboto).is_none());
        assert_eq!(catalog.families().count(), 0);
    }

    #[test]
    fn resolve_matches_family_names_case_insensitively() {
        let mut catalog = FontCatalog::new();
        seed(&mut catalog, "Open Sans");

        assert_eq!(catalog.resolve(FontFamily::OpenSans), Some("Open Sans"));
        assert!(catalog.resolve(FontFamily::Lato).is_none());
    }

    #[test]
    fn fallback_prefers_offered_families_over_arbitrary_faces() {
        let mut catalog = FontCatalog::new();
        seed(&mut catalog, "Zebra Display");
        assert_eq!(
            catalog.resolve_or_fallback(FontFamily::Roboto),
            Some("Zebra Display")
        );

        seed(&mut catalog, "Ubuntu");
        assert_eq!(
            catalog.resolve_or_fallback(FontFamily::Roboto),
            Some("Ubuntu")
        );

        seed(&mut catalog, "Roboto");
        assert_eq!(
            catalog.resolve_or_fallback(FontFamily::Roboto),
            Some("Roboto")
        );
    }

    #[test]
    fn register_rejects_non_font_bytes() {
        let mut catalog = FontCatalog::new();
        let err = catalog
            .register_font_bytes(b"not a font".to_vec())
            .unwrap_err();
        assert!(err.to_string().contains("decode error:"));
    }

    #[test]
    fn system_scan_is_idempotent() {
        let mut catalog = FontCatalog::new();
        catalog.ensure_system_fonts();
        let families_after_first = catalog.len();
        let second = catalog.ensure_system_fonts();
        assert_eq!(second, 0);
        assert_eq!(catalog.len(), families_after_first);
    }

    #[cfg(unix)]
    #[test]
    fn dir_scan_survives_symlink_cycles() {
        let root = std::env::temp_dir().join(format!(
            "underlay_fonts_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .subsec_nanos()
        ));
        let nested = root.join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::os::unix::fs::symlink(&root, nested.join("back")).unwrap();
        std::fs::write(nested.join("junk.ttf"), b"junk").unwrap();

        let mut catalog = FontCatalog::new();
        assert_eq!(catalog.load_font_dir(&root), 0);
        assert!(catalog.is_empty());

        std::fs::remove_dir_all(&root).ok();
    }
}
