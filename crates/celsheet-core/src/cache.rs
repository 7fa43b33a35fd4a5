use crate::config::PackingSettings;
use crate::frame::FrameSource;
use crate::model::Rect;
use std::cmp::Ordering;
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-run memo of each frame's occupied rectangle.
///
/// Without trimming this is the full frame. With trimming it is the opaque bounds, which
/// costs a pixel scan, so every slot is computed at most once per packing run. Slots are
/// `OnceLock`s so one cache can be shared by parallel trial packs.
pub struct FrameSizeCache<'a, F> {
    frames: &'a [F],
    trim: bool,
    threshold: u8,
    slots: Vec<OnceLock<Rect>>,
}

impl<'a, F: FrameSource> FrameSizeCache<'a, F> {
    pub fn new(frames: &'a [F], settings: &PackingSettings) -> Self {
        Self {
            frames,
            trim: settings.trims_frames(),
            threshold: settings.trim_threshold,
            slots: (0..frames.len()).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Occupied rectangle of frame `index` in frame-local coordinates.
    /// A fully transparent frame trims to `(0, 0, 0, 0)`.
    pub fn area_of(&self, index: usize) -> Rect {
        *self.slots[index].get_or_init(|| {
            let frame = &self.frames[index];
            if self.trim {
                frame.opaque_bounds(self.threshold).unwrap_or_default()
            } else {
                Rect::sized(frame.width(), frame.height())
            }
        })
    }

    /// Computes every slot up front.
    pub fn prefill(&self, parallel: bool) {
        #[cfg(feature = "parallel")]
        {
            if parallel {
                (0..self.len()).into_par_iter().for_each(|i| {
                    self.area_of(i);
                });
                return;
            }
        }
        let _ = parallel;
        for i in 0..self.len() {
            self.area_of(i);
        }
    }

    /// Larger pixel area first.
    pub fn compare_area_desc(&self, a: usize, b: usize) -> Ordering {
        self.area_of(b).area().cmp(&self.area_of(a).area())
    }

    /// Frame indices ordered by descending area; equal areas keep input order.
    pub fn sorted_by_area_desc(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.compare_area_desc(a, b));
        order
    }
}
