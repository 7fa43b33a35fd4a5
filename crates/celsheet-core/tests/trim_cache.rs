use celsheet_core::cache::FrameSizeCache;
use celsheet_core::prelude::*;
use celsheet_core::compute_trim_rect;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicUsize, Ordering};

fn with_block(w: u32, h: u32, block: Rect, alpha: u8) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for y in block.y..block.end_y() {
        for x in block.x..block.end_x() {
            img.put_pixel(x, y, Rgba([200, 100, 50, alpha]));
        }
    }
    img
}

#[test]
fn trim_rect_is_tight_around_opaque_pixels() {
    let img = with_block(16, 16, Rect::new(4, 3, 6, 4), 255);
    assert_eq!(compute_trim_rect(&img, 0), Some(Rect::new(4, 3, 6, 4)));
}

#[test]
fn trim_rect_finds_each_edge_independently() {
    let mut img = RgbaImage::new(10, 10);
    img.put_pixel(2, 7, Rgba([0, 0, 0, 10]));
    img.put_pixel(8, 1, Rgba([0, 0, 0, 10]));
    assert_eq!(compute_trim_rect(&img, 0), Some(Rect::new(2, 1, 7, 7)));
}

#[test]
fn trim_threshold_treats_faint_pixels_as_transparent() {
    let mut img = with_block(12, 12, Rect::new(1, 1, 10, 10), 5);
    img.put_pixel(6, 6, Rgba([0, 0, 0, 255]));
    assert_eq!(compute_trim_rect(&img, 0), Some(Rect::new(1, 1, 10, 10)));
    assert_eq!(compute_trim_rect(&img, 5), Some(Rect::new(6, 6, 1, 1)));
}

#[test]
fn fully_transparent_frame_has_no_bounds() {
    let img = RgbaImage::new(8, 8);
    assert_eq!(compute_trim_rect(&img, 0), None);
}

#[test]
fn cache_uses_full_size_without_trimming() {
    let frames = vec![with_block(16, 16, Rect::new(4, 4, 2, 2), 255)];
    let cache = FrameSizeCache::new(&frames, &PackingSettings::default());
    assert_eq!(cache.area_of(0), Rect::new(0, 0, 16, 16));
}

#[test]
fn cache_trims_and_reports_empty_for_transparent() {
    let frames = vec![
        with_block(16, 16, Rect::new(4, 4, 2, 3), 255),
        RgbaImage::new(5, 5),
    ];
    let settings = PackingSettings::builder().trim(true).build();
    let cache = FrameSizeCache::new(&frames, &settings);
    assert_eq!(cache.area_of(0), Rect::new(4, 4, 2, 3));
    assert_eq!(cache.area_of(1), Rect::new(0, 0, 0, 0));
}

#[test]
fn area_comparator_sorts_descending_and_stable() {
    let frames = vec![
        SizedFrame::new(4, 4),
        SizedFrame::new(8, 8),
        SizedFrame::new(2, 8),
        SizedFrame::new(16, 1),
        SizedFrame::new(1, 16),
    ];
    let cache = FrameSizeCache::new(&frames, &PackingSettings::default());
    assert_eq!(cache.sorted_by_area_desc(), vec![1, 0, 2, 3, 4]);
}

struct CountingFrame {
    w: u32,
    h: u32,
    bounds: Rect,
    scans: AtomicUsize,
}

impl CountingFrame {
    fn new(w: u32, h: u32, bounds: Rect) -> Self {
        Self {
            w,
            h,
            bounds,
            scans: AtomicUsize::new(0),
        }
    }
}

impl FrameSource for CountingFrame {
    fn width(&self) -> u32 {
        self.w
    }
    fn height(&self) -> u32 {
        self.h
    }
    fn pixel_equals(&self, _other: &Self) -> bool {
        false
    }
    fn opaque_bounds(&self, _threshold: u8) -> Option<Rect> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        Some(self.bounds)
    }
}

#[test]
fn trimming_scans_each_frame_once_per_pack() {
    let frames: Vec<CountingFrame> = (0..12)
        .map(|i| CountingFrame::new(20 + i, 20, Rect::new(1, 2, 10 + i, 12)))
        .collect();
    let settings = PackingSettings::builder()
        .trim(true)
        .high_precision(true)
        .build();
    let out = pack(&frames, &settings).expect("pack");

    for (i, f) in frames.iter().enumerate() {
        assert_eq!(f.scans.load(Ordering::Relaxed), 1, "frame {}", i);
        assert_eq!(out.origins[i], f.bounds);
        assert_eq!((out.placements[i].w, out.placements[i].h), (f.bounds.w, f.bounds.h));
    }
}

#[test]
fn trimmed_pack_places_cropped_sizes() {
    let frames = vec![
        with_block(32, 32, Rect::new(10, 12, 8, 6), 255),
        with_block(20, 40, Rect::new(0, 0, 20, 40), 255),
    ];
    let settings = PackingSettings::builder().trim(true).build();
    let out = pack(&frames, &settings).expect("pack");
    assert_eq!(out.origins[0], Rect::new(10, 12, 8, 6));
    assert_eq!((out.placements[0].w, out.placements[0].h), (8, 6));
    assert_eq!(out.origins[1], Rect::new(0, 0, 20, 40));
}

#[test]
fn fully_transparent_frame_trims_to_empty_placement() {
    let frames = vec![RgbaImage::new(8, 8), with_block(8, 8, Rect::new(0, 0, 8, 8), 255)];
    let settings = PackingSettings::builder().trim(true).build();
    let out = pack(&frames, &settings).expect("pack");
    assert_eq!(out.origins[0], Rect::new(0, 0, 0, 0));
    assert!(out.placements[0].is_empty());
    assert_eq!((out.placements[1].w, out.placements[1].h), (8, 8));
    assert!(out.sheet_width >= 8 && out.sheet_height >= 8);
}

/// Single-threaded frame: the `Cell` makes it `!Sync`.
#[cfg(not(feature = "parallel"))]
struct LocalFrame {
    size: (u32, u32),
    scans: std::cell::Cell<usize>,
}

#[cfg(not(feature = "parallel"))]
impl FrameSource for LocalFrame {
    fn width(&self) -> u32 {
        self.size.0
    }
    fn height(&self) -> u32 {
        self.size.1
    }
    fn pixel_equals(&self, other: &Self) -> bool {
        self.size == other.size
    }
    fn opaque_bounds(&self, _threshold: u8) -> Option<Rect> {
        self.scans.set(self.scans.get() + 1);
        Some(Rect::new(1, 1, self.size.0 - 2, self.size.1 - 2))
    }
}

#[cfg(not(feature = "parallel"))]
#[test]
fn frames_need_not_be_sync_without_parallel_feature() {
    let frames: Vec<LocalFrame> = [(12, 12), (12, 12), (8, 20)]
        .into_iter()
        .map(|size| LocalFrame {
            size,
            scans: std::cell::Cell::new(0),
        })
        .collect();
    let settings = PackingSettings::builder().trim(true).build();
    let out = pack(&frames, &settings).expect("pack");

    assert_eq!(out.origins[0], Rect::new(1, 1, 10, 10));
    assert_eq!(out.placements[0], out.placements[1]);
    assert_eq!(out.reuse_count, vec![1, 0, 0]);
    for f in &frames {
        assert_eq!(f.scans.get(), 1);
    }
}
