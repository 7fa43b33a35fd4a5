use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Phases of a packing run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackStage {
    /// Measuring, trimming and deduplicating frames.
    Preparing,
    /// Trial packs over candidate row widths.
    Searching,
    /// The authoritative pack at the chosen width.
    Finalizing,
}

impl PackStage {
    pub fn label(self) -> &'static str {
        match self {
            PackStage::Preparing => "preparing frames",
            PackStage::Searching => "searching row width",
            PackStage::Finalizing => "packing sheet",
        }
    }

    // (start, span) of this stage within 0..=100 overall
    fn window(self) -> (u32, u32) {
        match self {
            PackStage::Preparing => (0, 10),
            PackStage::Searching => (10, 85),
            PackStage::Finalizing => (95, 5),
        }
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: PackStage,
    /// 0..=100 within `stage`.
    pub stage_progress: u8,
    /// 0..=100 across the whole run.
    pub total_progress: u8,
    pub label: String,
}

impl Progress {
    pub fn new(stage: PackStage, stage_progress: u32, label: impl Into<String>) -> Self {
        let stage_progress = stage_progress.min(100);
        let (start, span) = stage.window();
        Self {
            stage,
            stage_progress: stage_progress as u8,
            total_progress: (start + stage_progress * span / 100) as u8,
            label: label.into(),
        }
    }
}

/// Receives progress notifications. Fire-and-forget: the packer never looks at what the
/// observer does and an observer cannot affect the run.
pub trait ProgressSink {
    fn report(&self, progress: &Progress);
}

impl<T: Fn(&Progress)> ProgressSink for T {
    fn report(&self, progress: &Progress) {
        self(progress)
    }
}

/// Cooperative cancellation flag, checked between trial packs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Optional collaborators of a packing run.
#[derive(Default, Clone, Copy)]
pub struct PackControl<'p> {
    pub progress: Option<&'p dyn ProgressSink>,
    pub cancel: Option<&'p CancelToken>,
}

impl<'p> PackControl<'p> {
    pub fn with_progress(mut self, sink: &'p dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: &'p CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn report(&self, stage: PackStage, stage_progress: u32) {
        if let Some(sink) = self.progress {
            sink.report(&Progress::new(stage, stage_progress, stage.label()));
        }
    }

    pub(crate) fn check_cancelled(&self) -> crate::error::Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(crate::error::CelSheetError::Cancelled),
            _ => Ok(()),
        }
    }
}
