use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use crate::{
    error::{FadedeckError, FadedeckResult},
    model::LoadState,
};

/// A decoded slide image.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Texture {
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> FadedeckResult<Self> {
        if width == 0 || height == 0 {
            return Err(FadedeckError::validation(
                "texture dimensions must be non-zero",
            ));
        }
        if rgba8.len() != (width as usize) * (height as usize) * 4 {
            return Err(FadedeckError::validation(
                "texture buffer length must be width*height*4",
            ));
        }
        let mut rgba8 = rgba8;
        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8),
        })
    }

    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

pub fn decode_texture(bytes: &[u8]) -> FadedeckResult<Texture> {
    let dyn_img = image::load_from_memory(bytes).context("decode slide image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(Texture {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[derive(Debug)]
struct Slot {
    source: String,
    state: LoadState,
    texture: Option<Arc<Texture>>,
}

/// Aggregates per-slide image loads into a single all-ready event.
///
/// Each slot resolves exactly once, to Ready or Failed. Readiness fires the
/// first time every slot has resolved; a Failed slot never blocks it. A
/// Failed slide's texture falls back to the nearest previous Ready sibling
/// (else the first Ready slide), so navigation to it still renders pixels.
#[derive(Debug)]
pub struct AssetReadinessTracker {
    slots: Vec<Slot>,
    ready_emitted: bool,
}

impl AssetReadinessTracker {
    pub fn new(sources: &[String]) -> FadedeckResult<Self> {
        if sources.is_empty() {
            return Err(FadedeckError::validation(
                "asset tracker needs at least one source",
            ));
        }
        Ok(Self {
            slots: sources
                .iter()
                .map(|source| Slot {
                    source: source.clone(),
                    state: LoadState::Pending,
                    texture: None,
                })
                .collect(),
            ready_emitted: false,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<LoadState> {
        self.slots.get(index).map(|s| s.state)
    }

    /// True once every slot has resolved, success or failure.
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|s| s.state != LoadState::Pending)
    }

    /// Deliver a decoded texture for `index`. Returns `true` exactly once,
    /// on the resolve that completes the set.
    pub fn resolve_ok(&mut self, index: usize, texture: Texture) -> FadedeckResult<bool> {
        let slot = self.slot_mut(index)?;
        if slot.state != LoadState::Pending {
            return Err(FadedeckError::asset(format!(
                "slide {index} already resolved"
            )));
        }
        slot.state = LoadState::Ready;
        slot.texture = Some(Arc::new(texture));
        debug!(index, source = %slot.source, "slide texture ready");
        Ok(self.check_all_ready())
    }

    /// Record a permanent load failure for `index`. Never fatal.
    pub fn resolve_err(&mut self, index: usize, err: &FadedeckError) -> FadedeckResult<bool> {
        let slot = self.slot_mut(index)?;
        if slot.state != LoadState::Pending {
            return Err(FadedeckError::asset(format!(
                "slide {index} already resolved"
            )));
        }
        slot.state = LoadState::Failed;
        warn!(index, source = %slot.source, error = %err, "slide texture failed, will fall back to sibling");
        Ok(self.check_all_ready())
    }

    /// Decode `bytes` and resolve `index` with the result. A decode error is
    /// recorded as a failed slot, not surfaced as an error.
    pub fn load_bytes(&mut self, index: usize, bytes: &[u8]) -> FadedeckResult<bool> {
        match decode_texture(bytes) {
            Ok(tex) => self.resolve_ok(index, tex),
            Err(err) => self.resolve_err(index, &err),
        }
    }

    /// Texture for `index`, applying the Failed-slide fallback. `None` only
    /// when no slide at all has a texture.
    pub fn texture(&self, index: usize) -> Option<&Arc<Texture>> {
        let slot = self.slots.get(index)?;
        if let Some(tex) = &slot.texture {
            return Some(tex);
        }
        self.slots[..index]
            .iter()
            .rev()
            .chain(self.slots.iter())
            .find_map(|s| s.texture.as_ref())
    }

    fn slot_mut(&mut self, index: usize) -> FadedeckResult<&mut Slot> {
        let total = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or_else(|| FadedeckError::asset(format!("slide index {index} out of range {total}")))
    }

    fn check_all_ready(&mut self) -> bool {
        if self.ready_emitted || !self.is_ready() {
            return false;
        }
        self.ready_emitted = true;
        debug!(slides = self.slots.len(), "all slide assets resolved");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn solid_png(r: u8, g: u8, b: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([r, g, b, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn sources(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("slide-{i}.png")).collect()
    }

    #[test]
    fn decode_premultiplies_alpha() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([100, 50, 200, 128]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let tex = decode_texture(&buf).unwrap();
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(
            tex.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128
            ]
        );
    }

    #[test]
    fn readiness_fires_exactly_once_when_all_resolve() {
        let mut tracker = AssetReadinessTracker::new(&sources(3)).unwrap();
        assert!(!tracker.load_bytes(0, &solid_png(255, 0, 0)).unwrap());
        assert!(!tracker.load_bytes(2, &solid_png(0, 0, 255)).unwrap());
        assert!(!tracker.is_ready());
        assert!(tracker.load_bytes(1, &solid_png(0, 255, 0)).unwrap());
        assert!(tracker.is_ready());
    }

    #[test]
    fn failed_slide_does_not_block_readiness() {
        let mut tracker = AssetReadinessTracker::new(&sources(3)).unwrap();
        tracker.load_bytes(0, &solid_png(255, 0, 0)).unwrap();
        tracker.load_bytes(1, b"not an image").unwrap();
        assert!(tracker.load_bytes(2, &solid_png(0, 0, 255)).unwrap());
        assert_eq!(tracker.state(1), Some(LoadState::Failed));
    }

    #[test]
    fn failed_slide_falls_back_to_previous_ready_sibling() {
        let mut tracker = AssetReadinessTracker::new(&sources(3)).unwrap();
        tracker.load_bytes(0, &solid_png(255, 0, 0)).unwrap();
        tracker.load_bytes(1, b"nope").unwrap();
        tracker.load_bytes(2, &solid_png(0, 0, 255)).unwrap();

        let fallback = tracker.texture(1).unwrap();
        assert_eq!(fallback.rgba8_premul[0], 255, "should use slide 0's pixels");
    }

    #[test]
    fn failed_first_slide_falls_back_to_first_ready() {
        let mut tracker = AssetReadinessTracker::new(&sources(2)).unwrap();
        tracker.load_bytes(0, b"nope").unwrap();
        tracker.load_bytes(1, &solid_png(0, 0, 255)).unwrap();

        let fallback = tracker.texture(0).unwrap();
        assert_eq!(fallback.rgba8_premul[2], 255, "should use slide 1's pixels");
    }

    #[test]
    fn all_failed_yields_no_texture() {
        let mut tracker = AssetReadinessTracker::new(&sources(2)).unwrap();
        tracker.load_bytes(0, b"a").unwrap();
        assert!(tracker.load_bytes(1, b"b").unwrap());
        assert!(tracker.texture(0).is_none());
    }

    #[test]
    fn double_resolve_is_rejected() {
        let mut tracker = AssetReadinessTracker::new(&sources(1)).unwrap();
        tracker.load_bytes(0, &solid_png(1, 2, 3)).unwrap();
        assert!(tracker.load_bytes(0, &solid_png(1, 2, 3)).is_err());
    }
}
