use crate::{SyncError, SyncResult, VideoFrame};
use image::{ImageFormat, RgbImage};
use std::path::Path;

/// Channel order of a three-channel, 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Bgr,
    /// Hue in [0, 180), saturation and value in [0, 255]
    Hsv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Copy a platform frame into an RGB buffer.
    pub fn from_frame(frame: &VideoFrame) -> SyncResult<Self> {
        if frame.channels != 3 {
            return Err(SyncError::InvalidFrame(format!(
                "expected 3 channels, got {}",
                frame.channels
            )));
        }
        frame.validate().map_err(SyncError::InvalidFrame)?;

        Ok(Self {
            width: frame.width,
            height: frame.height,
            layout: PixelLayout::Rgb,
            data: frame.pixels.to_vec(),
        })
    }

    pub fn convert(&self, target: PixelLayout) -> SyncResult<PixelBuffer> {
        let data = match (self.layout, target) {
            (from, to) if from == to => self.data.clone(),
            (PixelLayout::Rgb, PixelLayout::Bgr) | (PixelLayout::Bgr, PixelLayout::Rgb) => {
                let mut data = self.data.clone();
                swap_red_blue(&mut data);
                data
            }
            (PixelLayout::Bgr, PixelLayout::Hsv) => bgr_to_hsv(&self.data),
            (PixelLayout::Rgb, PixelLayout::Hsv) => {
                let mut bgr = self.data.clone();
                swap_red_blue(&mut bgr);
                bgr_to_hsv(&bgr)
            }
            (from, to) => {
                return Err(SyncError::InvalidFrame(format!(
                    "unsupported conversion {:?} -> {:?}",
                    from, to
                )))
            }
        };

        Ok(PixelBuffer {
            width: self.width,
            height: self.height,
            layout: target,
            data,
        })
    }

    /// Image as it should be stored on disk.
    ///
    /// BGR and HSV buffers are written the way a BGR-native encoder would:
    /// the first channel lands in blue. BGR files therefore show true colours,
    /// and an HSV file stores (R, G, B) = (V, S, H).
    pub fn to_image(&self) -> SyncResult<RgbImage> {
        let data = match self.layout {
            PixelLayout::Bgr | PixelLayout::Hsv => {
                let mut data = self.data.clone();
                swap_red_blue(&mut data);
                data
            }
            PixelLayout::Rgb => self.data.clone(),
        };

        RgbImage::from_raw(self.width, self.height, data).ok_or_else(|| {
            SyncError::InvalidFrame(format!(
                "buffer too small for {}x{} image",
                self.width, self.height
            ))
        })
    }

    pub fn save_png(&self, path: &Path) -> SyncResult<()> {
        self.to_image()?.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

pub fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

/// 8-bit BGR to HSV with hue halved to fit a byte.
pub fn bgr_to_hsv(bgr: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bgr.len());
    for px in bgr.chunks_exact(3) {
        let (b, g, r) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let v = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = v - min;

        let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };
        let mut h = if delta == 0.0 {
            0.0
        } else if v == r {
            60.0 * (g - b) / delta
        } else if v == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        out.push(((h / 2.0).round() as u32 % 180) as u8);
        out.push(s.round() as u8);
        out.push(v as u8);
    }
    out
}
