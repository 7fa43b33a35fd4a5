//! Core library for packing animation frames into a single sprite sheet.
//!
//! - Placement: shelf packing with skyline lookback (`packer::shelf`)
//! - Optimizer: sweeps the maximum row width and keeps the smallest (or squarest) sheet (`search`)
//! - Frame preparation: opaque-bounds trimming (`cache`), pixel-identical frame reuse (`dedup`)
//! - Results are plain serde-serializable data; composing the sheet image is up to the caller.
//!
//! Quick example:
//! ```ignore
//! use celsheet_core::{InputFrame, PackingSettings, pack};
//! # fn main() -> anyhow::Result<()> {
//! let frames = vec![
//!     InputFrame::open("walk_0.png".as_ref())?,
//!     InputFrame::open("walk_1.png".as_ref())?,
//! ];
//! let settings = PackingSettings::builder().padding(1, 1).trim(true).build();
//! let out = pack(&frames, &settings)?;
//! println!("sheet: {}x{}", out.sheet_width, out.sheet_height);
//! # Ok(()) }
//! ```

pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod frame;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod progress;
pub mod search;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use model::*;
pub use pipeline::*;
pub use progress::*;

/// Convenience prelude for common types and functions.
/// Importing `celsheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{PackingSettings, PackingSettingsBuilder};
    pub use crate::error::CelSheetError;
    pub use crate::frame::{FrameSource, InputFrame, SizedFrame};
    pub use crate::model::{AtlasResult, Rect, SheetStats};
    pub use crate::progress::{CancelToken, PackControl, PackStage, Progress, ProgressSink};
    pub use crate::{pack, pack_layout, pack_with};
}
