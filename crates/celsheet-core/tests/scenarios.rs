use celsheet_core::prelude::*;
use image::{Rgba, RgbaImage};

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(rgba))
}

fn padded_overlap(a: &Rect, b: &Rect, px: u32, py: u32) -> bool {
    let apart = a.end_x() + px <= b.x
        || b.end_x() + px <= a.x
        || a.end_y() + py <= b.y
        || b.end_y() + py <= a.y;
    !apart
}

#[test]
fn identical_frames_share_one_placement() {
    let frames = vec![
        solid(10, 10, [255, 0, 0, 255]),
        solid(10, 10, [255, 0, 0, 255]),
        solid(20, 5, [0, 0, 255, 255]),
    ];
    let settings = PackingSettings::builder()
        .padding(0, 0)
        .reuse_identical(true)
        .build();

    let out = pack(&frames, &settings).expect("pack");
    assert_eq!(out.placements.len(), 3);
    assert_eq!(out.origins.len(), 3);
    assert_eq!(out.reuse_count.len(), 3);
    assert_eq!(out.placements[0], out.placements[1]);
    assert_eq!(out.origins[0], out.origins[1]);
    assert_eq!(out.reused_origin_count, 1);
    assert_eq!(out.reuse_count, vec![1, 0, 0]);
    assert_eq!(out.reuses, vec![None, Some(0), None]);

    // 20px rows: the 10x10 on top, the 20x5 strip below it.
    assert_eq!(out.placements[0], Rect::new(0, 0, 10, 10));
    assert_eq!(out.placements[2], Rect::new(0, 10, 20, 5));
    assert_eq!((out.sheet_width, out.sheet_height), (20, 15));
}

#[test]
fn padded_frames_stay_inside_and_apart() {
    let frames = vec![
        solid(50, 50, [10, 20, 30, 255]),
        solid(60, 40, [40, 50, 60, 255]),
    ];
    let settings = PackingSettings::builder()
        .padding(2, 2)
        .reuse_identical(false)
        .high_precision(true)
        .build();

    let out = pack(&frames, &settings).expect("pack");
    assert!(out.sheet_width <= 4096);
    let (a, b) = (&out.placements[0], &out.placements[1]);
    assert!(!padded_overlap(a, b, 2, 2), "{:?} vs {:?}", a, b);
    for r in &out.placements {
        assert!(r.x >= 2 && r.y >= 2);
        assert!(r.end_x() + 2 <= out.sheet_width);
        assert!(r.end_y() + 2 <= out.sheet_height);
    }
    assert_eq!(out.reused_origin_count, 0);
    assert_eq!(out.reuse_count, vec![0, 0]);
}

#[test]
fn empty_input_yields_one_pixel_sheet() {
    let frames: Vec<SizedFrame> = Vec::new();
    let out = pack(&frames, &PackingSettings::default()).expect("pack");
    assert_eq!(out.sheet_width, 1);
    assert_eq!(out.sheet_height, 1);
    assert!(out.placements.is_empty());
    assert!(out.origins.is_empty());
    assert!(out.reuse_count.is_empty());
    assert_eq!(out.reused_origin_count, 0);
    assert_eq!(out, AtlasResult::empty());

    let layout = pack_layout(&[], &PackingSettings::default()).expect("layout");
    assert_eq!((layout.sheet_width, layout.sheet_height), (1, 1));
}

#[test]
fn uniform_grid_cells_ignore_trimming() {
    // Distinct frames with a small opaque dot each; trimming would shrink them to 2x2.
    let frames: Vec<RgbaImage> = (0..4u32)
        .map(|i| {
            let mut img = RgbaImage::new(32, 32);
            for y in 0..2 {
                for x in 0..2 {
                    img.put_pixel(4 * i + x, 4 * i + y, Rgba([255, 255, 255, 255]));
                }
            }
            img
        })
        .collect();
    let settings = PackingSettings::builder()
        .uniform_grid(true)
        .trim(true)
        .build();

    let out = pack(&frames, &settings).expect("pack");
    assert_eq!(out.placements.len(), 4);
    for (p, o) in out.placements.iter().zip(&out.origins) {
        assert_eq!((p.w, p.h), (32, 32));
        assert_eq!(*o, Rect::new(0, 0, 32, 32));
    }
}

#[test]
fn uniform_grid_uses_largest_frame_extents() {
    let settings = PackingSettings::builder().uniform_grid(true).build();
    let out = pack_layout(&[(8, 30), (20, 4), (12, 12)], &settings).expect("pack");
    for p in &out.placements {
        assert_eq!((p.w, p.h), (20, 30));
    }
}

#[test]
fn ratio_closeness_can_beat_smaller_area() {
    // Width 10 stacks three frames into 10x30 (area 300); width 20 gives 20x20 (area 400)
    // which still wins because it is square.
    let out = pack_layout(&[(10, 10); 3], &PackingSettings::default()).expect("pack");
    assert_eq!((out.sheet_width, out.sheet_height), (20, 20));
    assert_eq!(out.chosen_row_width, 20);
    assert_eq!(out.placements[0], Rect::new(0, 0, 10, 10));
    assert_eq!(out.placements[1], Rect::new(10, 0, 10, 10));
    assert_eq!(out.placements[2], Rect::new(0, 10, 10, 10));
}

#[test]
fn skyline_nests_into_gaps_under_short_neighbours() {
    // At row width 30 the short frame and the tall one share the first row; the third frame
    // wraps and drops only below the short one, beside the tall one.
    let out = pack_layout(&[(10, 5), (20, 30), (10, 10)], &PackingSettings::default()).expect("pack");
    assert_eq!(out.chosen_row_width, 30);
    assert_eq!(out.placements[0], Rect::new(0, 0, 10, 5));
    assert_eq!(out.placements[1], Rect::new(10, 0, 20, 30));
    assert_eq!(out.placements[2], Rect::new(0, 5, 10, 10));
    assert_eq!((out.sheet_width, out.sheet_height), (30, 30));
}
