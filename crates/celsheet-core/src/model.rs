use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Rectangle anchored at the origin with the given size.
    pub fn sized(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn end_x(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn end_y(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Result of one packing run: the sheet size and, for every input frame (in input order),
/// where it lands on the sheet and which part of the frame is copied there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasResult {
    /// Sheet width in pixels (always >= 1).
    pub sheet_width: u32,
    /// Sheet height in pixels (always >= 1).
    pub sheet_height: u32,
    /// Destination rectangle on the sheet, one per input frame.
    pub placements: Vec<Rect>,
    /// Source rectangle in frame-local coordinates, one per input frame.
    pub origins: Vec<Rect>,
    /// For a duplicate group's representative: number of other frames drawing from its area.
    /// Zero for everything else.
    pub reuse_count: Vec<u32>,
    /// Per frame: index of the frame whose sheet area this frame reuses, if any.
    pub reuses: Vec<Option<usize>>,
    /// Total number of frames that were deduplicated away.
    pub reused_origin_count: usize,
    /// Maximum row width the width search settled on.
    pub chosen_row_width: u32,
}

impl AtlasResult {
    /// The degenerate result for zero frames: a 1x1 sheet with nothing on it.
    pub fn empty() -> Self {
        Self {
            sheet_width: 1,
            sheet_height: 1,
            placements: Vec::new(),
            origins: Vec::new(),
            reuse_count: Vec::new(),
            reuses: Vec::new(),
            reused_origin_count: 0,
            chosen_row_width: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// True if frame `index` draws from another frame's area instead of its own.
    pub fn is_reused(&self, index: usize) -> bool {
        self.reuses.get(index).is_some_and(|r| r.is_some())
    }

    /// Computes packing statistics for this result.
    pub fn stats(&self) -> SheetStats {
        let num_frames = self.placements.len();
        let mut used_area = 0u64;
        let mut unique_placements = 0usize;
        for (i, p) in self.placements.iter().enumerate() {
            if self.is_reused(i) {
                continue;
            }
            unique_placements += 1;
            used_area += p.area();
        }
        let sheet_area = (self.sheet_width as u64) * (self.sheet_height as u64);
        let occupancy = if sheet_area > 0 {
            used_area as f64 / sheet_area as f64
        } else {
            0.0
        };
        SheetStats {
            num_frames,
            unique_placements,
            reused_frames: self.reused_origin_count,
            sheet_width: self.sheet_width,
            sheet_height: self.sheet_height,
            sheet_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about sheet packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetStats {
    /// Number of input frames.
    pub num_frames: usize,
    /// Number of frames that received their own sheet area.
    pub unique_placements: usize,
    /// Number of frames drawing from a duplicate's area.
    pub reused_frames: usize,
    pub sheet_width: u32,
    pub sheet_height: u32,
    /// `sheet_width * sheet_height`.
    pub sheet_area: u64,
    /// Area covered by unique placements.
    pub used_area: u64,
    /// Occupancy ratio: used_area / sheet_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl SheetStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sheet: {}x{}, Frames: {} ({} placed, {} reused), Occupancy: {:.2}%, Used Area: {} px², Wasted: {} px²",
            self.sheet_width,
            self.sheet_height,
            self.num_frames,
            self.unique_placements,
            self.reused_frames,
            self.occupancy * 100.0,
            self.used_area,
            self.wasted_area(),
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.sheet_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.sheet_area > 0 {
            (self.wasted_area() as f64 / self.sheet_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
