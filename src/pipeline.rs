use crate::{
    assets::logos::LogoStore,
    band::composite_band,
    core::PosterRgba,
    error::ScorebandResult,
    layout::{BandStyle, LayoutPlan, layout_badges},
    scores::{SourceScore, badges_from_scores},
    text::TextShaper,
};

#[tracing::instrument(
    skip_all,
    fields(scores = scores.len(), width = poster.width, height = poster.height)
)]
pub fn annotate_poster(
    poster: &mut PosterRgba,
    scores: &[SourceScore],
    style: &BandStyle,
    shaper: &mut TextShaper,
    logos: &mut LogoStore,
) -> ScorebandResult<LayoutPlan> {
    let canvas = poster.canvas()?;
    let badges = badges_from_scores(scores);
    let plan = layout_badges(&badges, canvas, style, shaper, logos)?;
    composite_band(poster, &plan, style, shaper)?;
    Ok(plan)
}
