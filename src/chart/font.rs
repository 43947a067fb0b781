//! Font registration for chart text.
//!
//! Text is rasterized from a TrueType file registered with plotters. Each
//! distinct font setting is registered once per process.

use crate::config::StyleConfig;
use crate::error::RenderError;
use once_cell::sync::Lazy;
use plotters::style::{register_font, FontStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Tried in order when no font is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "/Library/Fonts/Times New Roman.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
];

/// Configured font path and family name.
type FontKey = (Option<PathBuf>, String);

static REGISTERED: Lazy<Mutex<HashMap<FontKey, Option<&'static str>>>> =
    Lazy::new(Default::default);

/// Register the chart font and return its family name.
///
/// `Ok(None)` means no font was configured and none of the fallbacks exist;
/// the chart is then drawn without text. A configured font that cannot be
/// loaded is an error.
///
/// Results are cached per font path and family; failures are not cached.
pub fn load_font(style: &StyleConfig) -> Result<Option<&'static str>, RenderError> {
    let key = (style.font_path.clone(), style.font_family.clone());
    let mut registered = REGISTERED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(family) = registered.get(&key) {
        return Ok(*family);
    }

    let family = register(style)?.map(|name| -> &'static str { Box::leak(name.into_boxed_str()) });
    registered.insert(key, family);
    Ok(family)
}

fn register(style: &StyleConfig) -> Result<Option<String>, RenderError> {
    let path = match &style.font_path {
        Some(path) => path.clone(),
        None => match find_fallback() {
            Some(path) => path,
            None => {
                warn!("No font found; the chart will be drawn without text");
                return Ok(None);
            }
        },
    };

    let font_error = |reason: String| RenderError::Font {
        path: path.display().to_string(),
        reason,
    };

    let bytes = std::fs::read(&path).map_err(|e| font_error(e.to_string()))?;
    // plotters keeps registered font data for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(&style.font_family, FontStyle::Normal, bytes)
        .map_err(|_| font_error("not a valid TrueType font".to_string()))?;

    info!("Using font {} as {:?}", path.display(), style.font_family);
    Ok(Some(style.font_family.clone()))
}

fn find_fallback() -> Option<PathBuf> {
    FALLBACK_FONTS
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}
