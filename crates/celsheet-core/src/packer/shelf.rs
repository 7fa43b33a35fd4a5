use super::{Layout, PackJob, Packer, PassKind};
use crate::frame::FrameSource;
use crate::model::Rect;

/// Shelf packer with skyline lookback.
///
/// A cursor walks left to right and wraps to the left edge once the next frame would cross
/// `max_row_width`. Rows have no fixed height: each frame drops to just below the lowest
/// earlier placement that overlaps its padded column span, so short frames leave gaps that
/// later frames in the same columns can fill.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    max_row_width: u32,
    x_padding: u32,
    y_padding: u32,
    cursor_x: u32,
    placed: Vec<Rect>,
    sheet_w: u32,
    sheet_h: u32,
}

impl ShelfPacker {
    pub fn new(max_row_width: u32, x_padding: u32, y_padding: u32) -> Self {
        Self {
            max_row_width,
            x_padding,
            y_padding,
            cursor_x: x_padding,
            placed: Vec::new(),
            sheet_w: 0,
            sheet_h: 0,
        }
    }

    pub fn placed(&self) -> &[Rect] {
        &self.placed
    }

    /// Lowest y at which a `w`-wide frame at `x` clears every earlier placement in its columns.
    fn lowest_free_y(&self, x: u32, w: u32) -> u32 {
        let span_start = x - self.x_padding;
        let span_end = span_start + w + 2 * self.x_padding;
        self.placed
            .iter()
            .filter(|r| r.x < span_end && span_start < r.end_x())
            .map(|r| r.end_y() + self.y_padding)
            .fold(self.y_padding, u32::max)
    }
}

impl Packer for ShelfPacker {
    fn place(&mut self, w: u32, h: u32) -> Rect {
        // A frame wider than the row still lands at the left edge.
        if self.cursor_x + w > self.max_row_width {
            self.cursor_x = self.x_padding;
        }
        let x = self.cursor_x;
        let y = self.lowest_free_y(x, w);
        let rect = Rect::new(x, y, w, h);

        self.sheet_w = self.sheet_w.max(rect.end_x() + self.x_padding);
        self.sheet_h = self.sheet_h.max(rect.end_y() + self.y_padding);
        self.placed.push(rect);

        self.cursor_x = rect.end_x() + self.x_padding;
        if self.cursor_x > self.max_row_width {
            self.cursor_x = self.x_padding;
        }
        rect
    }

    fn sheet_size(&self) -> (u32, u32) {
        (self.sheet_w.max(1), self.sheet_h.max(1))
    }
}

/// Runs one shelf pass over `job` at `max_row_width`.
///
/// With duplicate reuse on, the first member of a group to be packed gets a fresh placement
/// and every later member copies its placement and origin without moving the cursor.
/// Reuse counts are only filled in on the final pass.
pub fn pack_frames<F: FrameSource>(job: &PackJob<'_, F>, max_row_width: u32, pass: PassKind) -> Layout {
    let n = job.len();
    let settings = &job.settings;
    let mut packer = ShelfPacker::new(max_row_width, settings.x_padding, settings.y_padding);
    let mut placements = vec![Rect::default(); n];
    let mut origins = vec![Rect::default(); n];
    let mut reuses: Vec<Option<usize>> = vec![None; n];
    // group representative -> frame holding the group's placement
    let mut owner_of_group: Vec<Option<usize>> = vec![None; n];

    for &idx in &job.order {
        if let Some(original) = job.duplicates.as_ref().and_then(|d| d.original_of(idx)) {
            if let Some(owner) = owner_of_group[original] {
                placements[idx] = placements[owner];
                origins[idx] = origins[owner];
                reuses[idx] = Some(owner);
                continue;
            }
            owner_of_group[original] = Some(idx);
        }
        let origin = job.origin_of(idx);
        placements[idx] = packer.place(origin.w, origin.h);
        origins[idx] = origin;
    }

    let mut reuse_count = vec![0u32; n];
    if pass == PassKind::Final {
        for owner in reuses.iter().flatten() {
            reuse_count[*owner] += 1;
        }
    }
    let (sheet_width, sheet_height) = packer.sheet_size();
    Layout {
        sheet_width,
        sheet_height,
        placements,
        origins,
        reuse_count,
        reuses,
    }
}
