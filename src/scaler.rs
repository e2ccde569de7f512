use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

use crate::{encode_png, CanvasSize, DataUri, Error, SourceImage};

/// Placement of the scaled image on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScaledRect {
    /// Integer placement used when rendering; never smaller than a pixel.
    fn pixel_bounds(self, canvas: CanvasSize) -> (i64, i64, u32, u32) {
        let width = (self.width.round() as u32).clamp(1, canvas.width.max(1));
        let height = (self.height.round() as u32).clamp(1, canvas.height.max(1));
        (self.x.round() as i64, self.y.round() as i64, width, height)
    }
}

/// Fits `width`x`height` into the canvas without cropping, centered on both axes.
pub fn letterbox(width: f32, height: f32, canvas: CanvasSize) -> ScaledRect {
    let (canvas_width, canvas_height) = (canvas.width as f32, canvas.height as f32);
    let aspect_ratio = width / height;

    let mut new_width = canvas_width;
    let mut new_height = canvas_width / aspect_ratio;
    if new_height > canvas_height {
        new_height = canvas_height;
        new_width = canvas_height * aspect_ratio;
    }

    ScaledRect {
        x: (canvas_width - new_width) / 2.0,
        y: (canvas_height - new_height) / 2.0,
        width: new_width,
        height: new_height,
    }
}

/// The source image drawn into a transparent canvas-sized buffer.
pub struct ScaledPhoto {
    pub rect: ScaledRect,
    pub display: RgbaImage,
    pub encoded: DataUri,
}

impl ScaledPhoto {
    pub fn render(source: &SourceImage, canvas: CanvasSize) -> Result<Self, Error> {
        let rect = letterbox(
            source.width().get() as f32,
            source.height().get() as f32,
            canvas,
        );
        let (x, y, width, height) = rect.pixel_bounds(canvas);

        let resized = imageops::resize(
            &source.image().to_rgba8(),
            width,
            height,
            FilterType::CatmullRom,
        );
        let mut display = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([0, 0, 0, 0]));
        imageops::overlay(&mut display, &resized, x, y);

        let encoded = encode_png(&display)?;
        Ok(Self {
            rect,
            display,
            encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;

    const CANVAS: CanvasSize = CanvasSize {
        width: 600,
        height: 400,
    };

    fn assert_contained_and_centered(rect: ScaledRect, aspect: f32, canvas: CanvasSize) {
        let (w, h) = (canvas.width as f32, canvas.height as f32);
        assert!((rect.width / rect.height - aspect).abs() < 1e-3, "{rect:?}");
        assert!(rect.width <= w + 1e-3 && rect.height <= h + 1e-3, "{rect:?}");
        assert!((rect.x - (w - rect.width) / 2.0).abs() < 1e-3);
        assert!((rect.y - (h - rect.height) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn wide_image_is_letterboxed() {
        let rect = letterbox(1200.0, 600.0, CANVAS);
        assert_eq!(
            rect,
            ScaledRect {
                x: 0.0,
                y: 50.0,
                width: 600.0,
                height: 300.0
            }
        );
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let rect = letterbox(300.0, 600.0, CANVAS);
        assert_eq!(
            rect,
            ScaledRect {
                x: 200.0,
                y: 0.0,
                width: 200.0,
                height: 400.0
            }
        );
    }

    #[test]
    fn many_aspect_ratios_stay_inside_canvas() {
        for (w, h) in [(1, 1), (3, 2), (2, 3), (1920, 1080), (7, 1000), (1000, 7), (601, 401)] {
            for canvas in [CANVAS, CanvasSize { width: 512, height: 512 }] {
                let rect = letterbox(w as f32, h as f32, canvas);
                assert_contained_and_centered(rect, w as f32 / h as f32, canvas);
            }
        }
    }

    #[test]
    fn render_places_pixels_inside_rect_only() {
        let source = SourceImage::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            120,
            60,
            Rgba([255, 0, 0, 255]),
        )))
        .unwrap();
        let photo = ScaledPhoto::render(&source, CANVAS).unwrap();
        assert_eq!(photo.display.dimensions(), (600, 400));
        assert_eq!(photo.display.get_pixel(300, 10)[3], 0);
        assert_eq!(photo.display.get_pixel(300, 200), &Rgba([255, 0, 0, 255]));
        assert_eq!(photo.display.get_pixel(300, 390)[3], 0);
    }

    #[test]
    fn render_is_deterministic() {
        let source = SourceImage::new(DynamicImage::new_rgb8(33, 17)).unwrap();
        let a = ScaledPhoto::render(&source, CANVAS).unwrap();
        let b = ScaledPhoto::render(&source, CANVAS).unwrap();
        assert_eq!(a.rect, b.rect);
        assert_eq!(a.encoded, b.encoded);
    }
}
