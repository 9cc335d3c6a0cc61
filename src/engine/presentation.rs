//! Display scaling applied to raw scores after ranking is final.
//!
//! Raw composite scores are small (cosine similarities and match ratios sit around
//! 0.1-0.5), so each view stretches them onto a percentage scale. None of these
//! constants affect ranking order.

/// Multiplier and cap turning a raw score into a display percentage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    pub multiplier: f64,
    pub cap: f64,
}

impl DisplayScale {
    /// `raw * multiplier * 100`, clamped to `[0, cap]`
    pub fn percent(&self, raw: f64) -> f64 {
        (raw * self.multiplier * 100.0).clamp(0.0, self.cap)
    }
}

pub const NEXT_SWIPE_SCALE: DisplayScale = DisplayScale {
    multiplier: 1.0,
    cap: 100.0,
};

pub const COLD_START_SCALE: DisplayScale = DisplayScale {
    multiplier: 1.0,
    cap: 100.0,
};

/// "Why you liked this" view
pub const LIKED_BOOKS_SCALE: DisplayScale = DisplayScale {
    multiplier: 2.0,
    cap: 100.0,
};

pub const EXPLORE_SCALE: DisplayScale = DisplayScale {
    multiplier: 3.0,
    cap: 98.0,
};

/// Label for the cold-start pick made without any genre signal
pub const START_SWIPING_LABEL: &str = "Start Swiping";

pub fn match_label(percent: f64) -> String {
    format!("{:.1}% Match", percent)
}
