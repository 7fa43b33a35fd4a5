use serde::{Deserialize, Serialize};

/// Hard ceiling for candidate row widths during the width search.
pub const DEFAULT_MAX_SEARCH_WIDTH: u32 = 4096;

/// Packing configuration.
/// Key notes:
///   - `force_minimum_dimensions` trims frames to their opaque bounds; ignored with `use_uniform_grid`
///   - `favor_ratio_over_area` switches the width search objective from sheet area to squareness
///   - `search_time_budget_ms` and `parallel` only affect how the width search is run, not its scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingSettings {
    /// Pixels left of, right of and between frames.
    pub x_padding: u32,
    /// Pixels above, below and between frames.
    pub y_padding: u32,
    /// Snap sheet width/height up to the next power of two.
    pub force_power_of_two: bool,
    /// Trim transparent borders (alpha <= trim_threshold) before placement.
    pub force_minimum_dimensions: bool,
    pub trim_threshold: u8,
    /// Pixel-identical frames share one placement.
    pub reuse_identical_frames_area: bool,
    /// Pack frames in descending area order instead of input order.
    pub allow_unordered_frames: bool,
    /// Every cell takes the largest frame width/height of the set.
    pub use_uniform_grid: bool,
    /// Step candidate widths by 1px instead of half the narrowest frame.
    pub high_precision_width_search: bool,
    /// Minimize `|width / height - 1|` instead of sheet area.
    pub favor_ratio_over_area: bool,

    /// Candidate row widths never exceed this.
    pub max_search_width: u32,
    /// Optional time budget for the width search (milliseconds). None or 0 disables.
    pub search_time_budget_ms: Option<u64>,
    /// Run trial packs in parallel when feature "parallel" is on.
    pub parallel: bool,
}

impl Default for PackingSettings {
    fn default() -> Self {
        Self {
            x_padding: 0,
            y_padding: 0,
            force_power_of_two: false,
            force_minimum_dimensions: false,
            trim_threshold: 0,
            reuse_identical_frames_area: true,
            allow_unordered_frames: false,
            use_uniform_grid: false,
            high_precision_width_search: false,
            favor_ratio_over_area: false,
            max_search_width: DEFAULT_MAX_SEARCH_WIDTH,
            search_time_budget_ms: None,
            parallel: false,
        }
    }
}

impl PackingSettings {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the width search has no room to run. Any padding is accepted:
    /// padding wider than the search ceiling only means no trial width is tried.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::CelSheetError;

        if self.max_search_width == 0 {
            return Err(CelSheetError::InvalidConfig(
                "max_search_width must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// True when trimming actually applies (uniform grid cells ignore per-frame bounds).
    pub fn trims_frames(&self) -> bool {
        self.force_minimum_dimensions && !self.use_uniform_grid
    }

    /// Create a fluent builder for `PackingSettings`.
    pub fn builder() -> PackingSettingsBuilder {
        PackingSettingsBuilder::new()
    }
}

/// Builder for `PackingSettings` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackingSettingsBuilder {
    settings: PackingSettings,
}

impl PackingSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: PackingSettings::default(),
        }
    }
    pub fn padding(mut self, x: u32, y: u32) -> Self {
        self.settings.x_padding = x;
        self.settings.y_padding = y;
        self
    }
    pub fn x_padding(mut self, v: u32) -> Self {
        self.settings.x_padding = v;
        self
    }
    pub fn y_padding(mut self, v: u32) -> Self {
        self.settings.y_padding = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.settings.force_power_of_two = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.settings.force_minimum_dimensions = v;
        self
    }
    pub fn trim_threshold(mut self, v: u8) -> Self {
        self.settings.trim_threshold = v;
        self
    }
    pub fn reuse_identical(mut self, v: bool) -> Self {
        self.settings.reuse_identical_frames_area = v;
        self
    }
    pub fn allow_unordered(mut self, v: bool) -> Self {
        self.settings.allow_unordered_frames = v;
        self
    }
    pub fn uniform_grid(mut self, v: bool) -> Self {
        self.settings.use_uniform_grid = v;
        self
    }
    pub fn high_precision(mut self, v: bool) -> Self {
        self.settings.high_precision_width_search = v;
        self
    }
    pub fn favor_ratio(mut self, v: bool) -> Self {
        self.settings.favor_ratio_over_area = v;
        self
    }
    pub fn max_search_width(mut self, v: u32) -> Self {
        self.settings.max_search_width = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.settings.search_time_budget_ms = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.settings.parallel = v;
        self
    }
    pub fn build(self) -> PackingSettings {
        self.settings
    }
}
