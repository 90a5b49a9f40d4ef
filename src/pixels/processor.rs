//! Mutable 32-bit ARGB pixel buffer with ROI-scoped operations.
//!
//! The processor is the working surface for windowing and masking: LUT
//! application, linear contrast stretch, snapshot/restore, masked fill, and
//! channel plane extraction in both RGB and HSB spaces. All operations are
//! scoped to the current region of interest, which defaults to the full
//! image.
//!
//! Bounds discipline: pixel accessors are total (out-of-bounds get returns
//! 0, out-of-bounds put is a no-op), but structural argument errors (a mask
//! shorter than the ROI area, a pixel vector that does not match the
//! dimensions) are programmer errors and panic immediately.

use crate::error::FormatError;
use crate::tiff::decoder::{PixelFormat, RasterInfo};

use super::buffer::PixelBuffer;

// =============================================================================
// Roi
// =============================================================================

/// Rectangular region of interest, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Roi {
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }
}

// =============================================================================
// PixelProcessor
// =============================================================================

/// A mutable 32-bit ARGB raster.
#[derive(Debug, Clone)]
pub struct PixelProcessor {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    snapshot: Option<Vec<u32>>,
    roi: Roi,
    foreground: u32,
}

impl PixelProcessor {
    /// Marker value used by masked operations.
    pub const BLACK: u32 = 0xFF00_0000;

    /// Blank (black, opaque) processor of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_pixels(width, height, vec![Self::BLACK; width * height])
    }

    /// Wrap an existing ARGB buffer.
    ///
    /// # Panics
    /// Panics if `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixel buffer length does not match dimensions"
        );
        Self {
            width,
            height,
            pixels,
            snapshot: None,
            roi: Roi {
                x: 0,
                y: 0,
                width,
                height,
            },
            foreground: 0xFFFF_FFFF,
        }
    }

    /// Materialize a processor from a decoded raster.
    ///
    /// 8-bit data becomes ARGB through the decoded color table when one is
    /// present, through a neutral gray ramp otherwise; chunky and planar
    /// color data is already packed ARGB. 16- and 32-bit grayscale have no
    /// ARGB rendition here and are rejected.
    pub fn from_raster(info: &RasterInfo, buffer: &PixelBuffer) -> Result<Self, FormatError> {
        let width = info.width as usize;
        let height = info.height as usize;
        let pixels = match buffer {
            PixelBuffer::Argb(argb) => argb.clone(),
            PixelBuffer::Bytes(bytes) => {
                let lut = if info.pixel_format == PixelFormat::Color8 {
                    info.lut.as_ref()
                } else {
                    None
                };
                bytes
                    .iter()
                    .map(|&v| match lut {
                        Some(lut) => {
                            0xFF00_0000
                                | (lut.reds[v as usize] as u32) << 16
                                | (lut.greens[v as usize] as u32) << 8
                                | lut.blues[v as usize] as u32
                        }
                        None => 0xFF00_0000 | (v as u32) << 16 | (v as u32) << 8 | v as u32,
                    })
                    .collect()
            }
            PixelBuffer::Shorts(_) => {
                return Err(FormatError::UnsupportedPixelFormat("16-bit grayscale"))
            }
            PixelBuffer::Floats(_) => {
                return Err(FormatError::UnsupportedPixelFormat("32-bit grayscale"))
            }
        };
        Ok(Self::from_pixels(width, height, pixels))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Set the foreground color used by fill operations.
    pub fn set_color(&mut self, color: u32) {
        self.foreground = color | Self::BLACK;
    }

    // -------------------------------------------------------------------------
    // ROI
    // -------------------------------------------------------------------------

    #[inline]
    pub fn roi(&self) -> Roi {
        self.roi
    }

    /// Scope subsequent operations to a sub-rectangle.
    ///
    /// # Panics
    /// Panics if the rectangle does not fit inside the image.
    pub fn set_roi(&mut self, x: usize, y: usize, width: usize, height: usize) {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "region of interest out of bounds"
        );
        self.roi = Roi {
            x,
            y,
            width,
            height,
        };
    }

    /// Restore the ROI to the full image.
    pub fn reset_roi(&mut self) {
        self.roi = Roi {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        };
    }

    // -------------------------------------------------------------------------
    // Pixel access
    // -------------------------------------------------------------------------

    /// Bounds-checked read; out of bounds yields 0.
    #[inline]
    pub fn get_pixel(&self, x: i64, y: i64) -> u32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        self.pixels[y as usize * self.width + x as usize]
    }

    /// Bounds-checked write forcing opaque alpha; out of bounds is a no-op.
    #[inline]
    pub fn put_pixel(&mut self, x: i64, y: i64, value: u32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.pixels[y as usize * self.width + x as usize] = value | Self::BLACK;
    }

    /// Grayscale view: luminance of the pixel, 0.0 out of bounds.
    pub fn get_pixel_value(&self, x: i64, y: i64) -> f32 {
        let c = self.get_pixel(x, y);
        let r = (c >> 16) & 0xFF;
        let g = (c >> 8) & 0xFF;
        let b = c & 0xFF;
        0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
    }

    /// Grayscale write: the value is clamped to [0, 255], rounded, and set
    /// on all three channels.
    pub fn put_pixel_value(&mut self, x: i64, y: i64, value: f64) {
        let v = (value.clamp(0.0, 255.0) + 0.5) as u32;
        self.put_pixel(x, y, v << 16 | v << 8 | v);
    }

    // -------------------------------------------------------------------------
    // LUT application
    // -------------------------------------------------------------------------

    /// Remap every channel of every ROI pixel through a 256-entry table.
    pub fn apply_table(&mut self, lut: &[u8; 256]) {
        self.apply_table_channels(lut, 0b111);
    }

    /// Remap selected channels only: bit 2 = red, bit 1 = green, bit 0 = blue.
    pub fn apply_table_channels(&mut self, lut: &[u8; 256], channels: u8) {
        let roi = self.roi;
        for y in roi.y..roi.y + roi.height {
            let row = y * self.width;
            for x in roi.x..roi.x + roi.width {
                let c = self.pixels[row + x];
                let mut r = (c >> 16) & 0xFF;
                let mut g = (c >> 8) & 0xFF;
                let mut b = c & 0xFF;
                if channels & 0b100 != 0 {
                    r = lut[r as usize] as u32;
                }
                if channels & 0b010 != 0 {
                    g = lut[g as usize] as u32;
                }
                if channels & 0b001 != 0 {
                    b = lut[b as usize] as u32;
                }
                self.pixels[row + x] = (c & Self::BLACK) | r << 16 | g << 8 | b;
            }
        }
    }

    /// Linear contrast stretch: map [min, max] to [0, 255] on all channels.
    ///
    /// Starts from the snapshot when one exists, so repeated windowing
    /// composes against the original data rather than compounding.
    pub fn set_min_and_max(&mut self, min: f64, max: f64) {
        self.set_min_and_max_channels(min, max, 0b111);
    }

    /// Channel-restricted variant of [`Self::set_min_and_max`].
    pub fn set_min_and_max_channels(&mut self, min: f64, max: f64, channels: u8) {
        if max < min {
            return;
        }
        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let v = 256.0 * (i as f64 - min) / (max - min);
            *slot = v.clamp(0.0, 255.0) as u8;
        }
        self.reset();
        self.apply_table_channels(&lut, channels);
    }

    // -------------------------------------------------------------------------
    // Snapshot and fill
    // -------------------------------------------------------------------------

    /// Copy the pixel array aside for later [`Self::reset`].
    pub fn snapshot(&mut self) {
        self.snapshot = Some(self.pixels.clone());
    }

    /// Restore the array saved by [`Self::snapshot`]; no-op without one.
    pub fn reset(&mut self) {
        if let Some(saved) = &self.snapshot {
            self.pixels.copy_from_slice(saved);
        }
    }

    /// Restore only ROI pixels whose mask entry differs from [`Self::BLACK`].
    ///
    /// # Panics
    /// Panics if the mask is shorter than the ROI area.
    pub fn reset_masked(&mut self, mask: &[u32]) {
        assert!(mask.len() >= self.roi.area(), "mask shorter than ROI area");
        let saved = match &self.snapshot {
            Some(saved) => saved,
            None => return,
        };
        let roi = self.roi;
        for y in 0..roi.height {
            let row = (roi.y + y) * self.width + roi.x;
            let mask_row = y * roi.width;
            for x in 0..roi.width {
                if mask[mask_row + x] != Self::BLACK {
                    self.pixels[row + x] = saved[row + x];
                }
            }
        }
    }

    /// Set every ROI pixel to the foreground color.
    pub fn fill(&mut self) {
        let roi = self.roi;
        for y in roi.y..roi.y + roi.height {
            let row = y * self.width;
            self.pixels[row + roi.x..row + roi.x + roi.width].fill(self.foreground);
        }
    }

    /// Set only ROI pixels whose mask entry equals [`Self::BLACK`].
    ///
    /// # Panics
    /// Panics if the mask is shorter than the ROI area.
    pub fn fill_masked(&mut self, mask: &[u32]) {
        assert!(mask.len() >= self.roi.area(), "mask shorter than ROI area");
        let roi = self.roi;
        for y in 0..roi.height {
            let row = (roi.y + y) * self.width + roi.x;
            let mask_row = y * roi.width;
            for x in 0..roi.width {
                if mask[mask_row + x] == Self::BLACK {
                    self.pixels[row + x] = self.foreground;
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Channel planes
    // -------------------------------------------------------------------------

    /// Extract the three channel planes of the whole image.
    ///
    /// # Panics
    /// Panics if any plane is shorter than the image area.
    pub fn get_rgb(&self, r: &mut [u8], g: &mut [u8], b: &mut [u8]) {
        let n = self.width * self.height;
        assert!(
            r.len() >= n && g.len() >= n && b.len() >= n,
            "plane shorter than image area"
        );
        for (i, &c) in self.pixels.iter().enumerate() {
            r[i] = (c >> 16) as u8;
            g[i] = (c >> 8) as u8;
            b[i] = c as u8;
        }
    }

    /// Replace the pixel data from three channel planes.
    ///
    /// # Panics
    /// Panics if any plane is shorter than the image area.
    pub fn set_rgb(&mut self, r: &[u8], g: &[u8], b: &[u8]) {
        let n = self.width * self.height;
        assert!(
            r.len() >= n && g.len() >= n && b.len() >= n,
            "plane shorter than image area"
        );
        for i in 0..n {
            self.pixels[i] =
                Self::BLACK | (r[i] as u32) << 16 | (g[i] as u32) << 8 | b[i] as u32;
        }
    }

    /// Extract hue/saturation/brightness planes, each scaled to 0-255.
    ///
    /// # Panics
    /// Panics if any plane is shorter than the image area.
    pub fn get_hsb(&self, h: &mut [u8], s: &mut [u8], b: &mut [u8]) {
        let n = self.width * self.height;
        assert!(
            h.len() >= n && s.len() >= n && b.len() >= n,
            "plane shorter than image area"
        );
        for (i, &c) in self.pixels.iter().enumerate() {
            let (hue, saturation, brightness) =
                rgb_to_hsb((c >> 16) as u8, (c >> 8) as u8, c as u8);
            h[i] = (hue * 255.0) as u8;
            s[i] = (saturation * 255.0) as u8;
            b[i] = (brightness * 255.0) as u8;
        }
    }

    /// Replace the pixel data from hue/saturation/brightness planes.
    ///
    /// # Panics
    /// Panics if any plane is shorter than the image area.
    pub fn set_hsb(&mut self, h: &[u8], s: &[u8], b: &[u8]) {
        let n = self.width * self.height;
        assert!(
            h.len() >= n && s.len() >= n && b.len() >= n,
            "plane shorter than image area"
        );
        for i in 0..n {
            self.pixels[i] = hsb_to_rgb(
                h[i] as f32 / 255.0,
                s[i] as f32 / 255.0,
                b[i] as f32 / 255.0,
            );
        }
    }
}

// =============================================================================
// RGB <-> HSB conversion
// =============================================================================

/// Convert an RGB triple to hue/saturation/brightness, each in [0, 1].
pub fn rgb_to_hsb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let cmax = r.max(g).max(b) as f32;
    let cmin = r.min(g).min(b) as f32;

    let brightness = cmax / 255.0;
    let saturation = if cmax != 0.0 { (cmax - cmin) / cmax } else { 0.0 };
    if saturation == 0.0 {
        return (0.0, 0.0, brightness);
    }

    let span = cmax - cmin;
    let redc = (cmax - r as f32) / span;
    let greenc = (cmax - g as f32) / span;
    let bluec = (cmax - b as f32) / span;
    let raw = if r as f32 == cmax {
        bluec - greenc
    } else if g as f32 == cmax {
        2.0 + redc - bluec
    } else {
        4.0 + greenc - redc
    };
    let mut hue = raw / 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    (hue, saturation, brightness)
}

/// Convert hue/saturation/brightness in [0, 1] to a packed opaque ARGB pixel.
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> u32 {
    let (r, g, b) = if saturation == 0.0 {
        let v = brightness * 255.0 + 0.5;
        (v, v, v)
    } else {
        let h = (hue - hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match h as u32 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };
        (r * 255.0 + 0.5, g * 255.0 + 0.5, b * 255.0 + 0.5)
    };
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

// =============================================================================
// Tests
// =============================================================================
