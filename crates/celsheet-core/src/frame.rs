use crate::error::Result;
use crate::model::Rect;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::path::Path;

/// Thread-safety required of frames: `Sync` with the `parallel` feature, nothing without it.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}

/// Thread-safety required of frames: `Sync` with the `parallel` feature, nothing without it.
#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// A source frame (animation cel) as seen by the packer.
///
/// The packer only reads frames: it asks for their size, compares them pixel-for-pixel
/// when deduplicating and asks for their opaque bounds when trimming. Frames only have to
/// be `Sync` when the crate is built with the `parallel` feature.
pub trait FrameSource: MaybeSync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Exact pixel-for-pixel equality (same size, same pixels).
    fn pixel_equals(&self, other: &Self) -> bool;
    /// Tight rectangle around every pixel whose alpha is above `threshold`, in frame-local
    /// coordinates. `None` when nothing is above the threshold.
    fn opaque_bounds(&self, threshold: u8) -> Option<Rect>;
}

impl FrameSource for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }
    fn height(&self) -> u32 {
        self.dimensions().1
    }
    fn pixel_equals(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.as_raw() == other.as_raw()
    }
    fn opaque_bounds(&self, threshold: u8) -> Option<Rect> {
        compute_trim_rect(self, threshold)
    }
}

/// Decoded frame with a caller-chosen key (e.g., filename).
#[derive(Debug, Clone)]
pub struct InputFrame {
    pub key: String,
    pub image: RgbaImage,
}

impl InputFrame {
    pub fn new(key: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            key: key.into(),
            image: image.to_rgba8(),
        }
    }

    /// Decodes the image at `path`, keyed by its path with forward slashes.
    pub fn open(path: &Path) -> Result<Self> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let key = path.to_string_lossy().replace('\\', "/");
        Ok(Self::new(key, image))
    }
}

impl FrameSource for InputFrame {
    fn width(&self) -> u32 {
        self.image.width()
    }
    fn height(&self) -> u32 {
        self.image.height()
    }
    fn pixel_equals(&self, other: &Self) -> bool {
        self.image.pixel_equals(&other.image)
    }
    fn opaque_bounds(&self, threshold: u8) -> Option<Rect> {
        compute_trim_rect(&self.image, threshold)
    }
}

/// Layout-only frame: a size with no pixels.
///
/// Two sized frames are "identical" only when both carry the same `content` id and size,
/// which lets callers that already hashed their pixels still get duplicate reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedFrame {
    pub w: u32,
    pub h: u32,
    pub content: Option<u64>,
}

impl SizedFrame {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h, content: None }
    }
    pub fn with_content(w: u32, h: u32, content: u64) -> Self {
        Self {
            w,
            h,
            content: Some(content),
        }
    }
}

impl FrameSource for SizedFrame {
    fn width(&self) -> u32 {
        self.w
    }
    fn height(&self) -> u32 {
        self.h
    }
    fn pixel_equals(&self, other: &Self) -> bool {
        self.w == other.w && self.h == other.h && self.content.is_some() && self.content == other.content
    }
    fn opaque_bounds(&self, _threshold: u8) -> Option<Rect> {
        if self.w == 0 || self.h == 0 {
            return None;
        }
        Some(Rect::sized(self.w, self.h))
    }
}

/// Computes the opaque bounds of `rgba`: each edge walks inward while its whole
/// column/row is at or below `threshold`.
pub fn compute_trim_rect(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let column_clear = |x: u32, y1: u32, y2: u32| (y1..=y2).all(|y| rgba.get_pixel(x, y)[3] <= threshold);
    let row_clear = |y: u32, x1: u32, x2: u32| (x1..=x2).all(|x| rgba.get_pixel(x, y)[3] <= threshold);

    let mut x1 = 0;
    let mut x2 = w - 1;
    let mut y1 = 0;
    let mut y2 = h - 1;
    // left
    while x1 < w && column_clear(x1, 0, h - 1) {
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    // right
    while x2 > x1 && column_clear(x2, 0, h - 1) {
        x2 -= 1;
    }
    // top
    while y1 < h && row_clear(y1, x1, x2) {
        y1 += 1;
    }
    // bottom
    while y2 > y1 && row_clear(y2, x1, x2) {
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}
