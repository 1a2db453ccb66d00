use std::sync::Arc;

use anyhow::Context;

use crate::{ScorebandResult, assets::PreparedImage, core::PosterRgba};

pub fn decode_image(bytes: &[u8]) -> ScorebandResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn decode_poster(bytes: &[u8]) -> ScorebandResult<PosterRgba> {
    let dyn_img = image::load_from_memory(bytes).context("decode poster from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);

    PosterRgba::from_rgba8(width, height, data, true)
}

pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[0..3] {
            let v = u16::from(*c);
            *c = ((v * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Drop the alpha channel, assuming straight-alpha input over an opaque target.
pub fn strip_alpha_to_rgb8(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[0..3]);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_image_png_dimensions_and_premul() {
        let buf = png_bytes(1, 1, vec![100, 50, 200, 128]);

        let prepared = decode_image(&buf).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(prepared.height, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_poster_marks_buffer_premultiplied() {
        let buf = png_bytes(2, 2, vec![255u8; 16]);
        let poster = decode_poster(&buf).unwrap();
        assert_eq!((poster.width, poster.height), (2, 2));
        assert!(poster.premultiplied);
        assert_eq!(poster.data, vec![255u8; 16]);
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        assert!(decode_image(b"not an image").is_err());
        assert!(decode_poster(b"").is_err());
    }

    #[test]
    fn premultiply_then_unpremultiply_is_lossless_for_opaque() {
        let mut px = vec![13u8, 77, 201, 255];
        premultiply_rgba8_in_place(&mut px);
        unpremultiply_rgba8_in_place(&mut px);
        assert_eq!(px, vec![13, 77, 201, 255]);
    }

    #[test]
    fn unpremultiply_recovers_half_alpha_within_rounding() {
        let mut px = vec![100u8, 50, 200, 128];
        premultiply_rgba8_in_place(&mut px);
        unpremultiply_rgba8_in_place(&mut px);
        assert!((i16::from(px[0]) - 100).abs() <= 1);
        assert!((i16::from(px[1]) - 50).abs() <= 1);
        assert!((i16::from(px[2]) - 200).abs() <= 1);
        assert_eq!(px[3], 128);
    }

    #[test]
    fn strip_alpha_keeps_rgb_order() {
        let rgba = [1u8, 2, 3, 255, 4, 5, 6, 255];
        assert_eq!(strip_alpha_to_rgb8(&rgba), vec![1, 2, 3, 4, 5, 6]);
    }
}
