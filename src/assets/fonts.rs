use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{MotionError, MotionResult};

/// Explicit font selection for text overlays.
///
/// The overlay sees `font_files`, the font files found in `font_dirs` and, when
/// `system_fonts` is set, the fonts installed on the host. `system_fonts` defaults to `true`
/// in JSON so a bare `{"family", "size_px"}` entry resolves against the host fonts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name to request (e.g. `"DejaVu Sans"`); generic names like `sans-serif` work.
    pub family: String,
    /// Font size in pixels.
    pub size_px: f32,
    /// Font files (`.ttf`, `.otf`, `.ttc`) to load.
    #[serde(default)]
    pub font_files: Vec<PathBuf>,
    /// Directories scanned (non-recursively) for font files.
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,
    /// Also load fonts installed on the system.
    #[serde(default = "default_system_fonts")]
    pub system_fonts: bool,
}

fn default_system_fonts() -> bool {
    true
}

impl FontSpec {
    /// Font spec backed by system fonts only.
    pub fn system(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
            font_files: Vec::new(),
            font_dirs: Vec::new(),
            system_fonts: true,
        }
    }

    /// Font spec backed by one font file.
    pub fn from_file(family: impl Into<String>, size_px: f32, path: impl Into<PathBuf>) -> Self {
        Self {
            family: family.into(),
            size_px,
            font_files: vec![path.into()],
            font_dirs: Vec::new(),
            system_fonts: false,
        }
    }

    pub(crate) fn validate(&self) -> MotionResult<()> {
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(MotionError::validation("font size_px must be positive"));
        }
        if self.family.trim().is_empty() {
            return Err(MotionError::validation("font family must not be empty"));
        }
        Ok(())
    }

    /// Build the font database this spec describes.
    ///
    /// Explicit font files must load; directory entries that fail to parse are skipped.
    pub fn load_fontdb(&self) -> MotionResult<Arc<usvg::fontdb::Database>> {
        let mut db = usvg::fontdb::Database::new();
        if self.system_fonts {
            db.load_system_fonts();
        }
        for file in &self.font_files {
            db.load_font_file(file)
                .with_context(|| format!("load font file '{}'", file.display()))?;
        }
        for dir in &self.font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(family = %self.family, faces = db.len(), "loaded overlay fonts");
        Ok(Arc::new(db))
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        let _ = db.load_font_file(&path);
    }
}

/// Resolver that prefers the requested family and falls back to any loaded face.
pub(crate) fn overlay_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
