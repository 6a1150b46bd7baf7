//! Two-handle price range slider.
//!
//! The handles are linked: moving one never lets it cross the other, and the
//! two always stay at least one unit apart.

/// Current state of the price filter slider, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRangeSlider {
    floor: i64,
    ceiling: i64,
    min: i64,
    max: i64,
}

impl PriceRangeSlider {
    /// Slider spanning `[floor, ceiling]` with both handles at the ends.
    ///
    /// A ceiling at or below the floor is widened to `floor + 1`.
    #[must_use]
    pub fn new(floor: i64, ceiling: i64) -> Self {
        let ceiling = ceiling.max(floor.saturating_add(1));
        Self {
            floor,
            ceiling,
            min: floor,
            max: ceiling,
        }
    }

    /// Slider with handles restored from request values.
    #[must_use]
    pub fn with_selection(floor: i64, ceiling: i64, min: Option<i64>, max: Option<i64>) -> Self {
        let mut slider = Self::new(floor, ceiling);
        if let Some(max) = max {
            slider.set_max(max);
        }
        if let Some(min) = min {
            slider.set_min(min);
        }
        slider
    }

    /// Move the lower handle; it stops one unit below the upper handle.
    pub fn set_min(&mut self, value: i64) {
        self.min = value.clamp(self.floor, self.max - 1);
    }

    /// Move the upper handle; it stops one unit above the lower handle.
    pub fn set_max(&mut self, value: i64) {
        self.max = value.clamp(self.min + 1, self.ceiling);
    }

    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i64 {
        self.max
    }

    #[must_use]
    pub const fn floor(&self) -> i64 {
        self.floor
    }

    #[must_use]
    pub const fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// Whether either handle has left its end stop.
    #[must_use]
    pub const fn is_narrowed(&self) -> bool {
        self.min > self.floor || self.max < self.ceiling
    }

    /// Bounds to send as filters; `None` for a handle still at its end stop.
    #[must_use]
    pub fn filter_bounds(&self) -> (Option<i64>, Option<i64>) {
        (
            (self.min > self.floor).then_some(self.min),
            (self.max < self.ceiling).then_some(self.max),
        )
    }
}
