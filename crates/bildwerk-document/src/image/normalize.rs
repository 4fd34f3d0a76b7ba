// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page normalizer — flatten transparency onto white, then scale to fit the
// page geometry with the aspect ratio preserved.

use bildwerk_core::PageGeometry;
use bildwerk_core::error::{BildwerkError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, LumaA, Rgb, RgbImage, Rgba};
use tracing::{debug, instrument};

use super::raster::{IndexedPixels, Pixels, RasterImage};

/// An opaque RGB page that fits inside its page geometry.
///
/// Backed by an 8- or 16-bit RGB `DynamicImage`, depending on the depth of
/// the source.
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    image: DynamicImage,
    source_width: u32,
    source_height: u32,
}

impl NormalizedPage {
    /// Page width in pixels (one pixel per PDF point).
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Page height in pixels (one pixel per PDF point).
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Dimensions of the image this page was normalized from.
    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Borrow the page pixels.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the page and return 8-bit RGB pixels.
    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }
}

/// Flattens and scales decoded images into [`NormalizedPage`]s.
///
/// Holds nothing but the target geometry, so it is `Copy` and can be handed to
/// any number of worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageNormalizer {
    geometry: PageGeometry,
}

impl PageNormalizer {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    /// Normalize one image into a page.
    ///
    /// Fails with `DegenerateImage` for a zero-area input and with
    /// `UnsupportedColorMode` for colour layouts that cannot be flattened.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn normalize(&self, image: RasterImage) -> Result<NormalizedPage> {
        let (source_width, source_height) = (image.width(), image.height());
        if source_width == 0 || source_height == 0 {
            return Err(BildwerkError::DegenerateImage {
                width: source_width,
                height: source_height,
            });
        }
        let mode = image.color_mode()?;

        let opaque = flatten(image.into_pixels(), source_width, source_height)?;

        let (width, height) = fit_within(source_width, source_height, self.geometry);
        debug_assert!(self.geometry.contains(width, height));
        debug!(?mode, width, height, "Scaling to page bounds");

        let scaled = if (width, height) == (source_width, source_height) {
            opaque
        } else {
            opaque.resize_exact(width, height, FilterType::Lanczos3)
        };

        Ok(NormalizedPage {
            image: scaled,
            source_width,
            source_height,
        })
    }

    /// Centre a normalized page on a white canvas the size of the page
    /// geometry. Pages already at full size are returned unchanged.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn place_on_canvas(&self, page: NormalizedPage) -> NormalizedPage {
        let (canvas_w, canvas_h) = (self.geometry.width(), self.geometry.height());
        if (page.width(), page.height()) == (canvas_w, canvas_h) {
            return page;
        }

        let x = i64::from(canvas_w.saturating_sub(page.width()) / 2);
        let y = i64::from(canvas_h.saturating_sub(page.height()) / 2);
        debug!(x, y, canvas_w, canvas_h, "Centring page on canvas");

        let image = match page.image {
            DynamicImage::ImageRgb16(pixels) => {
                let mut canvas = ImageBuffer::from_pixel(canvas_w, canvas_h, Rgb([u16::MAX; 3]));
                imageops::overlay(&mut canvas, &pixels, x, y);
                DynamicImage::ImageRgb16(canvas)
            }
            other => {
                let pixels = other.into_rgb8();
                let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb([u8::MAX; 3]));
                imageops::overlay(&mut canvas, &pixels, x, y);
                DynamicImage::ImageRgb8(canvas)
            }
        };

        NormalizedPage {
            image,
            source_width: page.source_width,
            source_height: page.source_height,
        }
    }
}

/// Largest `(width, height)` with the source aspect ratio that fits inside
/// `geometry`: `scale = min(page_w / w, page_h / h)`, each side floored.
///
/// Evaluated in exact integer arithmetic, so the limiting side always lands
/// exactly on the page bound. Scale may exceed 1. Sides never drop below one
/// pixel.
pub fn fit_within(width: u32, height: u32, geometry: PageGeometry) -> (u32, u32) {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let (page_w, page_h) = (u64::from(geometry.width()), u64::from(geometry.height()));

    // page_w / w <= page_h / h  <=>  page_w * h <= page_h * w
    let (fit_w, fit_h) = if page_w * h <= page_h * w {
        (page_w, h * page_w / w)
    } else {
        (w * page_h / h, page_h)
    };

    (fit_w.max(1) as u32, fit_h.max(1) as u32)
}

// -- Alpha flattening ---------------------------------------------------------

/// Composite onto opaque white, or convert to RGB when there is no alpha.
fn flatten(pixels: Pixels, width: u32, height: u32) -> Result<DynamicImage> {
    match pixels {
        Pixels::Indexed(indexed) => Ok(DynamicImage::ImageRgb8(flatten_indexed(
            &indexed, width, height,
        ))),
        Pixels::Direct(image) => flatten_direct(image),
    }
}

fn flatten_direct(image: DynamicImage) -> Result<DynamicImage> {
    let flattened = match image {
        opaque @ (DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgb16(_)) => opaque,
        gray @ DynamicImage::ImageLuma8(_) => DynamicImage::ImageRgb8(gray.to_rgb8()),
        gray @ DynamicImage::ImageLuma16(_) => DynamicImage::ImageRgb16(gray.to_rgb16()),
        DynamicImage::ImageRgba8(rgba) => DynamicImage::ImageRgb8(ImageBuffer::from_fn(
            rgba.width(),
            rgba.height(),
            |x, y| {
                let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
                Rgb([over_white_u8(r, a), over_white_u8(g, a), over_white_u8(b, a)])
            },
        )),
        DynamicImage::ImageRgba16(rgba) => DynamicImage::ImageRgb16(ImageBuffer::from_fn(
            rgba.width(),
            rgba.height(),
            |x, y| {
                let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
                Rgb([over_white_u16(r, a), over_white_u16(g, a), over_white_u16(b, a)])
            },
        )),
        DynamicImage::ImageLumaA8(gray) => DynamicImage::ImageRgb8(ImageBuffer::from_fn(
            gray.width(),
            gray.height(),
            |x, y| {
                let LumaA([l, a]) = *gray.get_pixel(x, y);
                Rgb::from([over_white_u8(l, a); 3])
            },
        )),
        DynamicImage::ImageLumaA16(gray) => DynamicImage::ImageRgb16(ImageBuffer::from_fn(
            gray.width(),
            gray.height(),
            |x, y| {
                let LumaA([l, a]) = *gray.get_pixel(x, y);
                Rgb::from([over_white_u16(l, a); 3])
            },
        )),
        other => {
            return Err(BildwerkError::UnsupportedColorMode(format!(
                "{:?}",
                other.color()
            )));
        }
    };
    Ok(flattened)
}

fn flatten_indexed(indexed: &IndexedPixels, width: u32, height: u32) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    for (pixel, &index) in out.pixels_mut().zip(&indexed.indices) {
        let ([r, g, b], a) = indexed.lookup(index);
        *pixel = Rgb([over_white_u8(r, a), over_white_u8(g, a), over_white_u8(b, a)]);
    }
    out
}

/// `alpha * fg + (1 - alpha) * white` for 8-bit channels, rounded.
fn over_white_u8(fg: u8, alpha: u8) -> u8 {
    let (fg, alpha) = (u32::from(fg), u32::from(alpha));
    ((fg * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

/// `alpha * fg + (1 - alpha) * white` for 16-bit channels, rounded.
fn over_white_u16(fg: u16, alpha: u16) -> u16 {
    let (fg, alpha) = (u64::from(fg), u64::from(alpha));
    ((fg * alpha + 65_535 * (65_535 - alpha) + 32_767) / 65_535) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, GrayImage, Luma, Rgb32FImage, RgbaImage};
    use proptest::prelude::*;

    fn a4() -> PageNormalizer {
        PageNormalizer::new(PageGeometry::A4)
    }

    #[test]
    fn blend_extremes() {
        assert_eq!(over_white_u8(17, 255), 17);
        assert_eq!(over_white_u8(17, 0), 255);
        assert_eq!(over_white_u8(0, 128), 127);
        assert_eq!(over_white_u16(1234, u16::MAX), 1234);
        assert_eq!(over_white_u16(1234, 0), u16::MAX);
    }

    #[test]
    fn fit_locks_regression_fixtures() {
        // Wide photo: width-bound.
        assert_eq!(fit_within(4000, 3000, PageGeometry::A4), (595, 446));
        // Tall strip: height-bound.
        assert_eq!(fit_within(300, 900, PageGeometry::A4), (280, 842));
        // Exact A4 stays put.
        assert_eq!(fit_within(595, 842, PageGeometry::A4), (595, 842));
        // Small source scales up rather than being capped at 1.
        assert_eq!(fit_within(100, 100, PageGeometry::A4), (595, 595));
        // Extreme strip keeps at least one pixel.
        assert_eq!(fit_within(1, 1_000_000, PageGeometry::A4), (1, 842));
    }

    #[test]
    fn zero_width_or_height_is_degenerate() {
        for (w, h) in [(0, 10), (10, 0), (0, 0)] {
            let image = RasterImage::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(w, h)));
            let err = a4().normalize(image).unwrap_err();
            assert!(matches!(
                err,
                BildwerkError::DegenerateImage { width, height } if (width, height) == (w, h)
            ));
        }
    }

    #[test]
    fn float_image_is_unsupported() {
        let image = RasterImage::from_dynamic(DynamicImage::ImageRgb32F(Rgb32FImage::new(4, 4)));
        assert!(matches!(
            a4().normalize(image),
            Err(BildwerkError::UnsupportedColorMode(_))
        ));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::from_pixel(595, 842, Rgba([10, 20, 30, 255]));
        rgba.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgba8(rgba)))
            .unwrap();
        let rgb = page.into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(300, 400), &Rgb([10, 20, 30]));
    }

    #[test]
    fn gray_alpha_flattens_to_gray_rgb() {
        let gray = GrayAlphaImage::from_pixel(595, 842, LumaA([0, 0]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageLumaA8(gray)))
            .unwrap();
        assert!(matches!(page.as_dynamic(), DynamicImage::ImageRgb8(_)));
        assert_eq!(page.into_rgb8().get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn palette_transparency_is_flattened() {
        let indexed = RasterImage::indexed(
            595,
            842,
            [0u8, 1].repeat(595 * 421),
            vec![[200, 0, 0], [0, 0, 200]],
            Some(vec![0]),
        )
        .unwrap();
        let rgb = a4().normalize(indexed).unwrap().into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([0, 0, 200]));
    }

    #[test]
    fn opaque_input_at_page_size_is_untouched() {
        let rgb = RgbImage::from_fn(595, 842, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgb8(rgb.clone())))
            .unwrap();
        assert_eq!(page.into_rgb8(), rgb);
    }

    #[test]
    fn gray_input_keeps_its_values() {
        let gray = GrayImage::from_pixel(595, 842, Luma([77]));
        let rgb = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageLuma8(gray)))
            .unwrap()
            .into_rgb8();
        assert!(rgb.pixels().all(|p| *p == Rgb([77, 77, 77])));
    }

    #[test]
    fn half_transparent_rgba_blends_toward_white() {
        let rgba = RgbaImage::from_pixel(595, 842, Rgba([10, 20, 30, 128]));
        let rgb = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgba8(rgba)))
            .unwrap()
            .into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([132, 137, 142]));
        assert_eq!(rgb.get_pixel(594, 841), &Rgb([132, 137, 142]));
    }

    #[test]
    fn half_transparent_gray_alpha_blends_toward_white() {
        let mut gray = GrayAlphaImage::from_pixel(595, 842, LumaA([0, 128]));
        gray.put_pixel(1, 0, LumaA([90, 64]));
        let rgb = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageLumaA8(gray)))
            .unwrap()
            .into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([127, 127, 127]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([214, 214, 214]));
    }

    #[test]
    fn sixteen_bit_rgba_blends_at_full_depth() {
        let rgba = ImageBuffer::from_pixel(595, 842, Rgba([1000u16, 20000, u16::MAX, 32768]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgba16(rgba)))
            .unwrap();
        let DynamicImage::ImageRgb16(rgb) = page.as_dynamic() else {
            panic!("expected 16-bit RGB, got {:?}", page.as_dynamic().color());
        };
        assert_eq!(rgb.get_pixel(10, 10), &Rgb([33267, 42767, u16::MAX]));
    }

    #[test]
    fn sixteen_bit_gray_alpha_blends_at_full_depth() {
        let mut gray = ImageBuffer::from_pixel(595, 842, LumaA([0u16, 32768]));
        gray.put_pixel(1, 0, LumaA([4096, 16384]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageLumaA16(gray)))
            .unwrap();
        let DynamicImage::ImageRgb16(rgb) = page.as_dynamic() else {
            panic!("expected 16-bit RGB, got {:?}", page.as_dynamic().color());
        };
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([32767; 3]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([50175; 3]));
    }

    #[test]
    fn partial_palette_alpha_blends_toward_white() {
        let indexed = RasterImage::indexed(
            595,
            842,
            [0u8, 1].repeat(595 * 421),
            vec![[200, 0, 0], [10, 20, 30]],
            Some(vec![128]),
        )
        .unwrap();
        let rgb = a4().normalize(indexed).unwrap().into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([227, 127, 127]));
        // Entries past the tRNS table stay opaque.
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn sixteen_bit_depth_is_preserved() {
        let rgba = ImageBuffer::from_pixel(10, 10, Rgba([1000u16, 2000, 3000, u16::MAX]));
        let page = a4()
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgba16(rgba)))
            .unwrap();
        assert!(matches!(page.as_dynamic(), DynamicImage::ImageRgb16(_)));
        assert_eq!((page.width(), page.height()), (595, 595));
    }

    #[test]
    fn canvas_centres_on_white() {
        let normalizer = a4();
        let page = normalizer
            .normalize(RasterImage::from_dynamic(DynamicImage::ImageRgb8(
                RgbImage::from_pixel(300, 900, Rgb([0, 0, 0])),
            )))
            .unwrap();
        assert_eq!((page.width(), page.height()), (280, 842));

        let placed = normalizer.place_on_canvas(page);
        assert_eq!((placed.width(), placed.height()), (595, 842));
        assert_eq!(placed.source_dimensions(), (300, 900));
        let rgb = placed.into_rgb8();
        assert_eq!(rgb.get_pixel(0, 421), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(297, 421), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(594, 421), &Rgb([255, 255, 255]));
    }

    proptest! {
        #[test]
        fn fit_is_bounded_and_touches_an_edge(w in 1u32..20_000, h in 1u32..20_000) {
            let (out_w, out_h) = fit_within(w, h, PageGeometry::A4);
            prop_assert!(out_w <= 595 && out_h <= 842);
            prop_assert!(out_w == 595 || out_h == 842);
        }

        #[test]
        fn fit_preserves_aspect_ratio(w in 1u32..20_000, h in 1u32..20_000) {
            let (out_w, out_h) = fit_within(w, h, PageGeometry::A4);
            // Both sides are floored independently, so each side is within
            // one pixel of the exact scaled value.
            let scale = (595.0 / w as f64).min(842.0 / h as f64);
            prop_assert!((out_w as f64 - w as f64 * scale).abs() <= 1.0);
            prop_assert!((out_h as f64 - h as f64 * scale).abs() <= 1.0);
        }
    }
}
