use crate::error::{ScorebandError, ScorebandResult};

/// Poster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ScorebandResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScorebandError::validation("Canvas dimensions must be >= 1"));
        }
        Ok(Self { width, height })
    }
}

/// Bottom strip of the canvas that receives the rating row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Band {
    pub width: u32,
    pub height: u32, // canvas.height / 10, truncated
    pub top: u32,
}

impl Band {
    pub fn of_canvas(canvas: Canvas) -> Self {
        let height = canvas.height / 10;
        Self {
            width: canvas.width,
            height,
            top: canvas.height - height,
        }
    }

    /// Canvases narrower than one pixel or shorter than ten collapse the band.
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Mutable poster bitmap, row-major RGBA8.
#[derive(Clone, Debug)]
pub struct PosterRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl PosterRgba {
    pub fn from_rgba8(
        width: u32,
        height: u32,
        data: Vec<u8>,
        premultiplied: bool,
    ) -> ScorebandResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ScorebandError::validation(format!(
                "PosterRgba buffer length {} does not match {}x{} rgba8",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied,
        })
    }

    pub fn new_opaque(width: u32, height: u32, rgb: [u8; 3]) -> ScorebandResult<Self> {
        let canvas = Canvas::new(width, height)?;
        let px = [rgb[0], rgb[1], rgb[2], 255];
        let mut data = Vec::with_capacity(canvas.width as usize * canvas.height as usize * 4);
        for _ in 0..canvas.width as u64 * canvas.height as u64 {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true, // opaque pixels are their own premultiplication
        })
    }

    pub fn canvas(&self) -> ScorebandResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Byte range of one full row inside the band region.
    pub fn row_range(&self, y: u32) -> std::ops::Range<usize> {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        start..start + stride
    }
}

/// Straight-alpha RGBA8 color value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_zero_dimensions() {
        assert!(Canvas::new(0, 100).is_err());
        assert!(Canvas::new(100, 0).is_err());
        assert!(Canvas::new(1, 1).is_ok());
    }

    #[test]
    fn band_is_tenth_of_canvas_pinned_to_bottom() {
        let band = Band::of_canvas(Canvas::new(1000, 1500).unwrap());
        assert_eq!(band.width, 1000);
        assert_eq!(band.height, 150);
        assert_eq!(band.top, 1350);
    }

    #[test]
    fn band_truncates_height_division() {
        let band = Band::of_canvas(Canvas::new(100, 99).unwrap());
        assert_eq!(band.height, 9);
        assert_eq!(band.top, 90);
    }

    #[test]
    fn band_collapses_on_short_canvas() {
        let band = Band::of_canvas(Canvas::new(100, 9).unwrap());
        assert_eq!(band.height, 0);
        assert!(band.is_degenerate());
    }

    #[test]
    fn poster_buffer_length_is_validated() {
        assert!(PosterRgba::from_rgba8(2, 2, vec![0u8; 16], true).is_ok());
        assert!(PosterRgba::from_rgba8(2, 2, vec![0u8; 15], true).is_err());
    }

    #[test]
    fn opaque_poster_is_premultiplied_by_construction() {
        let poster = PosterRgba::new_opaque(3, 2, [10, 20, 30]).unwrap();
        assert!(poster.premultiplied);
        assert_eq!(poster.data.len(), 24);
        assert_eq!(&poster.data[0..4], &[10, 20, 30, 255]);
    }
}
