use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::{
    ScorebandError, ScorebandResult,
    assets::{PreparedImage, decode::decode_image},
};

/// Maximum box a logo may occupy after scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitBox {
    pub max_width: u32,
    pub max_height: u32,
}

/// Filesystem-backed logo cache keyed by normalized relative handles.
///
/// Each handle is decoded at most once; fitted variants are derived from the
/// cached original on every request.
pub struct LogoStore {
    root: PathBuf,
    decoded: HashMap<String, PreparedImage>,
    decode_counts: HashMap<String, u64>,
}

impl LogoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            decoded: HashMap::new(),
            decode_counts: HashMap::new(),
        }
    }

    pub fn load_original(&mut self, handle: &str) -> ScorebandResult<PreparedImage> {
        let key = normalize_handle(handle)?;
        if let Some(img) = self.decoded.get(&key) {
            return Ok(img.clone());
        }

        let path = self.root.join(&key);
        let bytes = std::fs::read(&path)
            .map_err(|e| ScorebandError::asset(format!("read logo {}: {e}", path.display())))?;
        let img = decode_image(&bytes)?;

        *self.decode_counts.entry(key.clone()).or_insert(0) += 1;
        self.decoded.insert(key, img.clone());
        Ok(img)
    }

    /// Load a logo and scale it down to fit `fit`. Never upscales.
    pub fn load_scaled(&mut self, handle: &str, fit: FitBox) -> ScorebandResult<PreparedImage> {
        let original = self.load_original(handle)?;
        scale_to_fit(&original, fit)
    }

    pub fn decode_count(&self, handle: &str) -> u64 {
        normalize_handle(handle)
            .ok()
            .and_then(|key| self.decode_counts.get(&key).copied())
            .unwrap_or(0)
    }
}

/// Normalize and validate store-relative logo handles.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub fn normalize_handle(handle: &str) -> ScorebandResult<String> {
    let s = handle.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ScorebandError::validation("logo handles must be relative"));
    }
    if s.is_empty() {
        return Err(ScorebandError::validation("logo handle must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ScorebandError::validation(
                "logo handles must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ScorebandError::validation(
            "logo handle must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Downscale `img` preserving aspect ratio so it fits inside `fit`.
pub fn scale_to_fit(img: &PreparedImage, fit: FitBox) -> ScorebandResult<PreparedImage> {
    if img.width == 0 || img.height == 0 {
        return Err(ScorebandError::asset("logo image has a zero dimension"));
    }

    let sx = fit.max_width as f32 / img.width as f32;
    let sy = fit.max_height as f32 / img.height as f32;
    let scale = sx.min(sy);
    if scale >= 1.0 {
        return Ok(img.clone());
    }

    let target_w = ((img.width as f32 * scale).floor() as u32).max(1);
    let target_h = ((img.height as f32 * scale).floor() as u32).max(1);

    let src = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.as_ref().clone())
        .ok_or_else(|| ScorebandError::asset("logo buffer length mismatch"))?;
    // resampling premultiplied bytes keeps translucent edges halo-free
    let resized = image::imageops::resize(
        &src,
        target_w,
        target_h,
        image::imageops::FilterType::CatmullRom,
    );

    Ok(PreparedImage {
        width: target_w,
        height: target_h,
        rgba8_premul: Arc::new(resized.into_raw()),
    })
}
