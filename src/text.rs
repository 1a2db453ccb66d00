use std::borrow::Cow;

use crate::error::{ScorebandError, ScorebandResult};

/// RGBA8 brush color carried through Parley layouts into glyph fills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Shapes and measures text with one fixed face.
///
/// The face is registered once at construction; every layout and measurement
/// resolves against that family, so identical inputs produce identical
/// metrics for the lifetime of the shaper.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<BrushRgba8>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl TextShaper {
    pub fn from_font_bytes(font_bytes: &[u8]) -> ScorebandResult<Self> {
        let mut font_ctx = parley::FontContext::default();

        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ScorebandError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ScorebandError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
            0,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    /// Font handle for glyph rasterization, same bytes the layouts shape with.
    pub fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    pub fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: BrushRgba8,
    ) -> ScorebandResult<parley::Layout<BrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ScorebandError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<BrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Width and height of `text` at `size_px`, single line.
    pub fn measure(&mut self, text: &str, size_px: f32) -> ScorebandResult<(f32, f32)> {
        let layout = self.layout(text, size_px, BrushRgba8::default())?;
        Ok((layout.width(), layout.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_font() -> Vec<u8> {
        std::fs::read(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/fonts/DejaVuSans.ttf"
        ))
        .unwrap()
    }

    #[test]
    fn shaper_exposes_family_from_bytes() {
        let shaper = TextShaper::from_font_bytes(&fixture_font()).unwrap();
        assert!(!shaper.family_name().trim().is_empty());
    }

    #[test]
    fn shaper_rejects_non_font_bytes() {
        assert!(TextShaper::from_font_bytes(b"not a font").is_err());
    }

    #[test]
    fn measure_rejects_degenerate_sizes() {
        let mut shaper = TextShaper::from_font_bytes(&fixture_font()).unwrap();
        assert!(shaper.measure("7.4", 0.0).is_err());
        assert!(shaper.measure("7.4", -3.0).is_err());
        assert!(shaper.measure("7.4", f32::NAN).is_err());
    }

    #[test]
    fn measure_is_deterministic_and_scales_with_size() {
        let mut shaper = TextShaper::from_font_bytes(&fixture_font()).unwrap();

        let (w1, h1) = shaper.measure("7.4", 100.0).unwrap();
        let (w2, h2) = shaper.measure("7.4", 100.0).unwrap();
        assert_eq!((w1, h1), (w2, h2));
        assert!(w1 > 0.0 && h1 > 0.0);

        let (w_small, _) = shaper.measure("7.4", 50.0).unwrap();
        assert!(w_small < w1);
    }

    #[test]
    fn longer_text_measures_wider() {
        let mut shaper = TextShaper::from_font_bytes(&fixture_font()).unwrap();
        let (short, _) = shaper.measure("7.4", 64.0).unwrap();
        let (long, _) = shaper.measure("trakt: 7.4", 64.0).unwrap();
        assert!(long > short);
    }
}
