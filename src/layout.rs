use crate::{
    assets::{
        PreparedImage,
        logos::{FitBox, LogoStore, scale_to_fit},
    },
    core::{Band, Canvas, Rgba8},
    error::ScorebandResult,
    scores::Badge,
    text::TextShaper,
};

/// Tunable constants of the rating band.
///
/// Pixel constants (`text_spacing`, `logo_spacing`) are expressed at the
/// reference probe size and shrink with the fitted font; fractions are
/// relative to the canvas or band.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BandStyle {
    pub probe_font_px: f32,
    pub text_spacing: f32,
    pub logo_spacing: f32,
    pub left_margin_frac: f32,
    pub max_width_frac: f32,
    pub max_height_frac: f32,
    pub fill: Rgba8,
    pub text: Rgba8,
}

impl Default for BandStyle {
    fn default() -> Self {
        Self {
            probe_font_px: 1000.0,
            text_spacing: 40.0,
            logo_spacing: 20.0,
            left_margin_frac: 0.03,
            max_width_frac: 0.9,
            max_height_frac: 0.8,
            fill: Rgba8::new(0, 0, 0, 240),
            text: Rgba8::WHITE,
        }
    }
}

/// Output of the layout engine, consumed by the compositor.
#[derive(Clone, Debug)]
pub enum LayoutPlan {
    /// Degenerate input; the poster must stay untouched.
    Skip,
    Strip(StripPlan),
}

#[derive(Clone, Debug)]
pub struct StripPlan {
    pub font_px: u32,
    pub band: Band,
    pub items: Vec<PlacedBadge>,
}

#[derive(Clone, Debug)]
pub struct PlacedBadge {
    pub logo: Option<PlacedLogo>,
    pub text: PlacedText,
}

/// Logo position in band-local coordinates.
#[derive(Clone, Debug)]
pub struct PlacedLogo {
    pub x: u32,
    pub y: u32,
    pub image: PreparedImage,
}

/// Text position in band-local coordinates, vertically centered by the
/// compositor from its own layout height.
#[derive(Clone, Debug)]
pub struct PlacedText {
    pub x: u32,
    pub content: String,
    pub width: f32,
    pub height: f32,
}

struct MeasuredEntry {
    original_logo: Option<PreparedImage>,
    fitted_logo: Option<PreparedImage>,
    label_prefix_w: f32,
    score_w: f32,
    score_h: f32,
}

/// Two-pass fit of the badge strip into the bottom band.
///
/// Pass one measures everything at the probe size. If the probe totals
/// overflow the width or height budget, one rescale picks the largest font
/// satisfying both, logos are re-fitted to the adjusted text height, and
/// pass two places items left to right with spacings shrunk in proportion.
/// The final cursor is not re-validated; residual overflow is accepted.
#[tracing::instrument(skip(badges, style, shaper, logos), fields(badges = badges.len()))]
pub fn layout_badges(
    badges: &[Badge],
    canvas: Canvas,
    style: &BandStyle,
    shaper: &mut TextShaper,
    logos: &mut LogoStore,
) -> ScorebandResult<LayoutPlan> {
    let band = Band::of_canvas(canvas);
    if band.is_degenerate() {
        return Ok(LayoutPlan::Skip);
    }
    if badges.is_empty() {
        return Ok(LayoutPlan::Strip(StripPlan {
            font_px: style.probe_font_px.floor().max(1.0) as u32,
            band,
            items: Vec::new(),
        }));
    }

    // measurement pass, everything at the probe size
    let logo_box = FitBox {
        max_width: (band.width as f32 * style.max_width_frac) as u32,
        max_height: (band.height as f32 * style.max_height_frac) as u32,
    };

    let mut measured = Vec::with_capacity(badges.len());
    let mut total_w = 0.0f32;
    let mut rep_h = 0.0f32;
    let mut rep_score = "";

    for badge in badges {
        let (original_logo, fitted_logo) = match badge.logo.as_deref() {
            Some(handle) => match logos.load_original(handle) {
                Ok(orig) => {
                    let fitted = scale_to_fit(&orig, logo_box)?;
                    (Some(orig), Some(fitted))
                }
                Err(err) => {
                    tracing::debug!(
                        source = %badge.label,
                        error = %err,
                        "logo unavailable, falling back to label text"
                    );
                    (None, None)
                }
            },
            None => (None, None),
        };

        let label_prefix_w = if fitted_logo.is_none() {
            let (w, _) = shaper.measure(&format!("{}: ", badge.label), style.probe_font_px)?;
            w
        } else {
            0.0
        };
        let (score_w, score_h) = shaper.measure(&badge.score, style.probe_font_px)?;

        if score_w == 0.0 || score_h == 0.0 || (fitted_logo.is_none() && label_prefix_w == 0.0) {
            return Ok(LayoutPlan::Skip);
        }

        match &fitted_logo {
            Some(logo) => total_w += logo.width as f32 + style.logo_spacing,
            None => total_w += label_prefix_w + style.text_spacing,
        }
        total_w += score_w + style.text_spacing;
        rep_h = score_h;
        rep_score = &badge.score;

        measured.push(MeasuredEntry {
            original_logo,
            fitted_logo,
            label_prefix_w,
            score_w,
            score_h,
        });
    }

    // fit decision
    let max_w = canvas.width as f32 * style.max_width_frac;
    let max_h = band.height as f32 * style.max_height_frac;

    let (font_px, refit_box) = if total_w <= max_w && rep_h <= max_h {
        (style.probe_font_px.floor().max(1.0) as u32, None)
    } else {
        let scale = (max_w / total_w).min(max_h / rep_h);
        let font_px = ((style.probe_font_px * scale).floor() as u32).max(1);
        let (_, adj_h) = shaper.measure(rep_score, font_px as f32)?;
        let side = (adj_h.floor() as u32).max(1);
        // shrunk logos track the adjusted text height, not their probe box
        (
            font_px,
            Some(FitBox {
                max_width: side,
                max_height: side,
            }),
        )
    };

    // placement pass
    let spacing_scale = font_px as f32 / style.probe_font_px;
    let mut x = canvas.width as f32 * style.left_margin_frac;
    let mut items = Vec::with_capacity(badges.len());

    for (badge, m) in badges.iter().zip(measured.iter()) {
        let logo = match (&m.original_logo, refit_box) {
            (Some(orig), Some(fit)) => Some(scale_to_fit(orig, fit)?),
            (Some(_), None) => m.fitted_logo.clone(),
            (None, _) => None,
        };

        let placed_logo = if let Some(image) = logo {
            let lx = x as u32;
            let ly = band.height.saturating_sub(image.height) / 2;
            x += image.width as f32 + style.logo_spacing * spacing_scale;
            Some(PlacedLogo { x: lx, y: ly, image })
        } else {
            None
        };

        let content = if placed_logo.is_some() {
            badge.score.clone()
        } else {
            format!("{}: {}", badge.label, badge.score)
        };
        let (text_w, text_h) = shaper.measure(&content, font_px as f32)?;
        let tx = x as u32;
        x += text_w + style.text_spacing * spacing_scale;

        items.push(PlacedBadge {
            logo: placed_logo,
            text: PlacedText {
                x: tx,
                content,
                width: text_w,
                height: text_h,
            },
        });
    }

    Ok(LayoutPlan::Strip(StripPlan {
        font_px,
        band,
        items,
    }))
}
