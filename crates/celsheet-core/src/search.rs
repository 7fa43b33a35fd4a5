use crate::error::Result;
use crate::frame::FrameSource;
use crate::model::AtlasResult;
use crate::packer::shelf::pack_frames;
use crate::packer::{PackJob, PassKind};
use crate::progress::{PackControl, PackStage};
use std::time::Instant;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Size figures over the prepared frame set that drive the width search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetrics {
    pub max_width: u32,
    pub max_height: u32,
    pub min_width: u32,
    pub total_width: u64,
}

impl FrameMetrics {
    pub fn measure<F: FrameSource>(job: &PackJob<'_, F>) -> Self {
        let mut m = FrameMetrics {
            max_width: 0,
            max_height: 0,
            min_width: u32::MAX,
            total_width: 0,
        };
        for i in 0..job.len() {
            let r = job.origin_of(i);
            m.max_width = m.max_width.max(r.w);
            m.max_height = m.max_height.max(r.h);
            m.min_width = m.min_width.min(r.w);
            m.total_width += r.w as u64;
        }
        if job.is_empty() {
            m.min_width = 0;
        }
        m
    }
}

/// Sheet size produced by one trial pack.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Trial {
    width: u32,
    sheet_w: u32,
    sheet_h: u32,
}

impl Trial {
    fn area(&self) -> u64 {
        (self.sheet_w as u64) * (self.sheet_h as u64)
    }
    fn ratio_distance(&self) -> f64 {
        (self.sheet_w as f64 / self.sheet_h as f64 - 1.0).abs()
    }
    fn wider_than_tall(&self) -> bool {
        self.sheet_w > self.sheet_h
    }
}

/// Best-so-far reducer. Ratio closeness can displace a smaller area even when optimizing
/// for area; with `favor_ratio` only ratio closeness counts.
struct BestWidth {
    favor_ratio: bool,
    best: Option<Trial>,
}

impl BestWidth {
    fn offer(&mut self, t: Trial) -> bool {
        let accept = match &self.best {
            None => true,
            Some(b) => {
                let ratio_closer = t.ratio_distance() < b.ratio_distance();
                let area_smaller = t.area() < b.area();
                if self.favor_ratio {
                    ratio_closer
                } else {
                    area_smaller || ratio_closer
                }
            }
        };
        if accept {
            self.best = Some(t);
        }
        accept
    }
}

pub(crate) fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

fn snap(pow2: bool, w: u32, h: u32) -> (u32, u32) {
    if pow2 {
        (next_pow2(w), next_pow2(h))
    } else {
        (w, h)
    }
}

fn run_trial<F: FrameSource>(job: &PackJob<'_, F>, width: u32) -> Trial {
    let layout = pack_frames(job, width, PassKind::Trial);
    let (sheet_w, sheet_h) = snap(
        job.settings.force_power_of_two,
        layout.sheet_width,
        layout.sheet_height,
    );
    Trial {
        width,
        sheet_w,
        sheet_h,
    }
}

/// Sweeps candidate row widths, keeps the best-scoring one and packs once more at that width.
///
/// Trial packs never leave anything behind; only the final pass becomes the result.
pub fn find_best_width_and_pack<F: FrameSource>(
    job: &PackJob<'_, F>,
    control: &PackControl<'_>,
) -> Result<AtlasResult> {
    if job.is_empty() {
        return Ok(AtlasResult::empty());
    }
    let settings = &job.settings;
    let metrics = FrameMetrics::measure(job);
    let width_cap = (settings.max_search_width as u64).min(metrics.total_width) as u32;
    let start_width = if settings.force_power_of_two {
        next_pow2(metrics.max_width)
    } else {
        metrics.max_width
    };
    let step = if settings.high_precision_width_search {
        1
    } else {
        (metrics.min_width / 2).max(1)
    };
    debug!(
        ?metrics,
        width_cap, start_width, step, "starting width search"
    );

    let mut best = BestWidth {
        favor_ratio: settings.favor_ratio_over_area,
        best: None,
    };

    #[cfg(feature = "parallel")]
    let searched_in_parallel = if settings.parallel {
        search_parallel(job, control, &mut best, start_width, width_cap, step)?;
        true
    } else {
        false
    };
    #[cfg(not(feature = "parallel"))]
    let searched_in_parallel = false;

    if !searched_in_parallel {
        search_sequential(job, control, &mut best, start_width, width_cap, step)?;
    }

    let best_width = best.best.map(|t| t.width).unwrap_or(start_width);
    debug!(best_width, best = ?best.best, "width search finished");
    control.report(PackStage::Searching, 100);

    control.check_cancelled()?;
    control.report(PackStage::Finalizing, 0);
    let layout = pack_frames(job, best_width, PassKind::Final);
    let (sheet_width, sheet_height) = snap(
        settings.force_power_of_two,
        layout.sheet_width,
        layout.sheet_height,
    );
    let reused_origin_count = layout.reuses.iter().filter(|r| r.is_some()).count();
    control.report(PackStage::Finalizing, 100);

    Ok(AtlasResult {
        sheet_width: sheet_width.max(1),
        sheet_height: sheet_height.max(1),
        placements: layout.placements,
        origins: layout.origins,
        reuse_count: layout.reuse_count,
        reuses: layout.reuses,
        reused_origin_count,
        chosen_row_width: best_width,
    })
}

/// Stage progress after a trial: the sweep position, or squareness when favoring ratio.
fn trial_progress(favor_ratio: bool, trial: &Trial, next_width: u32, width_cap: u32) -> u32 {
    let pct = if favor_ratio {
        trial.sheet_w as u64 * 100 / trial.sheet_h.max(1) as u64
    } else {
        next_width as u64 * 100 / width_cap.max(1) as u64
    };
    pct.min(100) as u32
}

fn search_sequential<F: FrameSource>(
    job: &PackJob<'_, F>,
    control: &PackControl<'_>,
    best: &mut BestWidth,
    start_width: u32,
    width_cap: u32,
    step: u32,
) -> Result<()> {
    let budget_ms = job.settings.search_time_budget_ms.unwrap_or(0);
    let started = Instant::now();
    let mut w = start_width;
    let mut trials = 0usize;
    while w < width_cap {
        control.check_cancelled()?;
        if budget_ms > 0 && best.best.is_some() && started.elapsed().as_millis() as u64 > budget_ms {
            debug!(trials, budget_ms, "width search time budget exhausted");
            break;
        }
        let trial = run_trial(job, w);
        trials += 1;
        let accepted = best.offer(trial);
        trace!(
            width = w,
            sheet_w = trial.sheet_w,
            sheet_h = trial.sheet_h,
            accepted,
            "trial pack"
        );
        w = w.saturating_add(step);
        control.report(
            PackStage::Searching,
            trial_progress(best.favor_ratio, &trial, w, width_cap),
        );
        if best.favor_ratio && trial.wider_than_tall() {
            break;
        }
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn search_parallel<F: FrameSource>(
    job: &PackJob<'_, F>,
    control: &PackControl<'_>,
    best: &mut BestWidth,
    start_width: u32,
    width_cap: u32,
    step: u32,
) -> Result<()> {
    let widths: Vec<u32> = std::iter::successors(Some(start_width), |w| w.checked_add(step))
        .take_while(|&w| w < width_cap)
        .collect();
    let cancel = control.cancel;
    let trials: Vec<Trial> = widths
        .par_iter()
        .map(|&w| {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(crate::error::CelSheetError::Cancelled);
            }
            Ok(run_trial(job, w))
        })
        .collect::<Result<Vec<_>>>()?;

    // reduce in width order so the pick matches the sequential sweep
    for trial in trials {
        let accepted = best.offer(trial);
        trace!(
            width = trial.width,
            sheet_w = trial.sheet_w,
            sheet_h = trial.sheet_h,
            accepted,
            "trial pack"
        );
        let next = trial.width.saturating_add(step);
        control.report(
            PackStage::Searching,
            trial_progress(best.favor_ratio, &trial, next, width_cap),
        );
        if best.favor_ratio && trial.wider_than_tall() {
            break;
        }
    }
    Ok(())
}
