use crate::config::PackingSettings;
use crate::error::{CelSheetError, Result};
use crate::frame::{FrameSource, SizedFrame};
use crate::model::AtlasResult;
use crate::packer::PackJob;
use crate::progress::{PackControl, PackStage};
use crate::search::find_best_width_and_pack;
use tracing::{debug, instrument};

/// Packs `frames` into one sheet using `settings`.
///
/// Notes:
/// - The result lists one placement/origin per input frame, in input order.
/// - Zero frames is not an error: it yields a 1x1 sheet.
/// - Deterministic: the same frames and settings always give the same result.
pub fn pack<F: FrameSource>(frames: &[F], settings: &PackingSettings) -> Result<AtlasResult> {
    pack_with(frames, settings, &PackControl::default())
}

/// Like [`pack`], reporting progress to and honoring cancellation from `control`.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn pack_with<F: FrameSource>(
    frames: &[F],
    settings: &PackingSettings,
    control: &PackControl<'_>,
) -> Result<AtlasResult> {
    settings.validate()?;
    validate_frames(frames)?;

    if frames.is_empty() {
        return Ok(AtlasResult::empty());
    }
    control.check_cancelled()?;

    control.report(PackStage::Preparing, 0);
    let job = PackJob::prepare(frames, settings);
    if let Some(dups) = &job.duplicates {
        debug!(
            groups = dups.groups().len(),
            reused = dups.reused_count(),
            "duplicate frames registered"
        );
    }
    control.report(PackStage::Preparing, 100);

    let result = find_best_width_and_pack(&job, control)?;
    debug!(
        sheet_width = result.sheet_width,
        sheet_height = result.sheet_height,
        row_width = result.chosen_row_width,
        "sheet packed"
    );
    Ok(result)
}

// ---------------- Layout-only API ----------------

/// Packs bare `(width, height)` sizes without pixel data.
///
/// Trimming finds nothing to trim and no two sizes count as duplicates; use
/// [`SizedFrame::with_content`] with [`pack`] to get duplicate reuse from content ids.
pub fn pack_layout(sizes: &[(u32, u32)], settings: &PackingSettings) -> Result<AtlasResult> {
    let frames: Vec<SizedFrame> = sizes.iter().map(|&(w, h)| SizedFrame::new(w, h)).collect();
    pack(&frames, settings)
}

/// Rejects frames with a zero dimension.
pub fn validate_frames<F: FrameSource>(frames: &[F]) -> Result<()> {
    for (index, f) in frames.iter().enumerate() {
        let (width, height) = (f.width(), f.height());
        if width == 0 || height == 0 {
            return Err(CelSheetError::InvalidFrame {
                index,
                width,
                height,
            });
        }
    }
    Ok(())
}
