use crate::{
    ScorebandError, ScorebandResult,
    assets::PreparedImage,
    composite,
    core::PosterRgba,
    layout::{BandStyle, LayoutPlan, StripPlan},
    text::{BrushRgba8, TextShaper},
};

/// Render the planned strip and merge it onto the poster's band region.
///
/// A `Skip` plan leaves the poster untouched. Pixels outside the band region
/// are never written.
pub fn composite_band(
    poster: &mut PosterRgba,
    plan: &LayoutPlan,
    style: &BandStyle,
    shaper: &mut TextShaper,
) -> ScorebandResult<()> {
    let LayoutPlan::Strip(strip) = plan else {
        return Ok(());
    };

    if !poster.premultiplied {
        return Err(ScorebandError::validation(
            "composite_band requires a premultiplied poster buffer",
        ));
    }
    if strip.band.width != poster.width || strip.band.top + strip.band.height != poster.height {
        return Err(ScorebandError::layout(
            "layout plan does not match poster dimensions",
        ));
    }

    let band_pixmap = render_band(strip, style, shaper)?;
    let band_bytes = band_pixmap.data_as_u8_slice();
    let stride = strip.band.width as usize * 4;

    for row in 0..strip.band.height {
        let dst = poster.row_range(strip.band.top + row);
        let src = row as usize * stride..(row as usize + 1) * stride;
        composite::over_in_place(&mut poster.data[dst], &band_bytes[src])?;
    }
    Ok(())
}

fn render_band(
    strip: &StripPlan,
    style: &BandStyle,
    shaper: &mut TextShaper,
) -> ScorebandResult<vello_cpu::Pixmap> {
    let w: u16 = strip
        .band
        .width
        .try_into()
        .map_err(|_| ScorebandError::validation("band width exceeds u16"))?;
    let h: u16 = strip
        .band
        .height
        .try_into()
        .map_err(|_| ScorebandError::validation("band height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);

    // translucent backdrop across the full band
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        style.fill.r,
        style.fill.g,
        style.fill.b,
        style.fill.a,
    ));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(w),
        f64::from(h),
    ));

    let brush = BrushRgba8 {
        r: style.text.r,
        g: style.text.g,
        b: style.text.b,
        a: style.text.a,
    };

    for item in &strip.items {
        if let Some(logo) = &item.logo {
            let paint = image_paint(&logo.image)?;
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(logo.x),
                f64::from(logo.y),
            )));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(logo.image.width),
                f64::from(logo.image.height),
            ));
        }

        let layout = shaper.layout(&item.text.content, strip.font_px as f32, brush)?;
        let text_y = (strip.band.height as f32 - layout.height()) / 2.0;

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(item.text.x),
            f64::from(text_y),
        )));

        for line in layout.lines() {
            for positioned in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = positioned else {
                    continue;
                };

                let b = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(shaper.font_data())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap)
}

fn image_paint(img: &PreparedImage) -> ScorebandResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ScorebandResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ScorebandError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ScorebandError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ScorebandError::validation(
            "prepared image byte length mismatch",
        ));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
