use crate::cache::FrameSizeCache;
use crate::config::PackingSettings;
use crate::dedup::DuplicateFrameIndex;
use crate::frame::FrameSource;
use crate::model::Rect;

pub mod shelf;

/// A packer places rectangles onto a sheet that grows to fit them.
///
/// Implementations must never overlap two placements (padding included) and must keep
/// every placement plus its trailing padding inside `sheet_size()`.
pub trait Packer {
    fn place(&mut self, w: u32, h: u32) -> Rect;
    /// Current sheet extents, never smaller than 1x1.
    fn sheet_size(&self) -> (u32, u32);
}

/// Whether a pass is a throwaway trial of the width search or the authoritative final pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Trial,
    Final,
}

/// Frames prepared once per packing run and shared by every trial pass.
pub struct PackJob<'a, F> {
    pub cache: FrameSizeCache<'a, F>,
    /// Order in which frames are fed to the packer.
    pub order: Vec<usize>,
    pub duplicates: Option<DuplicateFrameIndex>,
    /// Fixed cell size when packing on a uniform grid.
    pub cell: Option<(u32, u32)>,
    pub settings: PackingSettings,
}

impl<'a, F: FrameSource> PackJob<'a, F> {
    pub fn prepare(frames: &'a [F], settings: &PackingSettings) -> Self {
        let cache = FrameSizeCache::new(frames, settings);
        cache.prefill(settings.parallel);

        let cell = if settings.use_uniform_grid {
            let w = frames.iter().map(|f| f.width()).max().unwrap_or(0);
            let h = frames.iter().map(|f| f.height()).max().unwrap_or(0);
            Some((w, h))
        } else {
            None
        };
        let order = if settings.allow_unordered_frames {
            cache.sorted_by_area_desc()
        } else {
            (0..frames.len()).collect()
        };
        let duplicates = if settings.reuse_identical_frames_area {
            Some(DuplicateFrameIndex::register_if_identical(
                frames,
                settings.parallel,
            ))
        } else {
            None
        };
        Self {
            cache,
            order,
            duplicates,
            cell,
            settings: settings.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Part of frame `index` copied onto the sheet, in frame-local coordinates.
    pub fn origin_of(&self, index: usize) -> Rect {
        match self.cell {
            Some((w, h)) => Rect::sized(w, h),
            None => self.cache.area_of(index),
        }
    }
}

/// Output of one shelf pass, indexed by input frame.
#[derive(Debug, Clone)]
pub struct Layout {
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub placements: Vec<Rect>,
    pub origins: Vec<Rect>,
    pub reuse_count: Vec<u32>,
    pub reuses: Vec<Option<usize>>,
}
