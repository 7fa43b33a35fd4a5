use celsheet_core::model::Rect;
use celsheet_core::packer::shelf::{ShelfPacker, pack_frames};
use celsheet_core::packer::{PackJob, Packer, PassKind};
use celsheet_core::{PackingSettings, SizedFrame};

#[test]
fn cursor_wraps_when_row_is_full() {
    let mut p = ShelfPacker::new(25, 0, 0);
    assert_eq!(p.place(10, 10), Rect::new(0, 0, 10, 10));
    assert_eq!(p.place(10, 4), Rect::new(10, 0, 10, 4));
    // 20 + 10 > 25: back to the left edge, below the first frame
    assert_eq!(p.place(10, 6), Rect::new(0, 10, 10, 6));
    // next to it, only the short frame is in these columns
    assert_eq!(p.place(10, 6), Rect::new(10, 4, 10, 6));
    assert_eq!(p.sheet_size(), (20, 16));
}

#[test]
fn padding_separates_neighbours_and_rows() {
    let mut p = ShelfPacker::new(40, 2, 3);
    assert_eq!(p.place(10, 10), Rect::new(2, 3, 10, 10));
    assert_eq!(p.place(10, 10), Rect::new(14, 3, 10, 10));
    assert_eq!(p.place(20, 5), Rect::new(2, 16, 20, 5));
    assert_eq!(p.sheet_size(), (26, 24));
}

#[test]
fn lookback_only_considers_overlapping_columns() {
    let mut p = ShelfPacker::new(30, 0, 0);
    p.place(10, 40);
    p.place(10, 2);
    p.place(10, 20);
    // wraps at x=0 and must clear the 40px frame
    assert_eq!(p.place(10, 5), Rect::new(0, 40, 10, 5));
    // x=10 only overlaps the 2px frame
    assert_eq!(p.place(10, 5), Rect::new(10, 2, 10, 5));
    assert_eq!(p.placed().len(), 5);
}

#[test]
fn oversized_frame_does_not_loop() {
    let mut p = ShelfPacker::new(8, 1, 1);
    assert_eq!(p.place(30, 4), Rect::new(1, 1, 30, 4));
    assert_eq!(p.place(30, 4), Rect::new(1, 6, 30, 4));
    assert_eq!(p.sheet_size(), (32, 11));
}

#[test]
fn empty_packer_reports_one_pixel_sheet() {
    let p = ShelfPacker::new(100, 4, 4);
    assert_eq!(p.sheet_size(), (1, 1));
}

#[test]
fn trial_pass_leaves_reuse_counts_empty() {
    let frames = vec![
        SizedFrame::with_content(6, 6, 1),
        SizedFrame::with_content(6, 6, 1),
        SizedFrame::new(6, 6),
    ];
    let job = PackJob::prepare(&frames, &PackingSettings::default());

    let trial = pack_frames(&job, 100, PassKind::Trial);
    assert_eq!(trial.reuse_count, vec![0, 0, 0]);
    assert_eq!(trial.placements[0], trial.placements[1]);

    let last = pack_frames(&job, 100, PassKind::Final);
    assert_eq!(last.reuse_count, vec![1, 0, 0]);
    assert_eq!(last.reuses, vec![None, Some(0), None]);
    assert_eq!((last.sheet_width, last.sheet_height), (12, 6));
    assert_eq!(last.placements, trial.placements);
}
