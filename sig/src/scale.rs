//! Sheet scaling information.
//!
//! All tunable gap constants are expressed in *interline fractions*: multiples of the vertical
//! distance between two staff lines.  This makes the tuning independent of image resolution.

use serde::{Deserialize, Serialize};

/// Scaling data for one sheet, reduced to the single datum this subsystem needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Number of pixels between two staff lines
    interline: f64,
}

impl Scale {
    pub fn new(interline: f64) -> Self {
        assert!(interline > 0.0, "interline must be positive");
        Self { interline }
    }

    pub fn interline(&self) -> f64 {
        self.interline
    }

    /// Convert a pixel distance to an interline fraction
    pub fn pixels_to_frac(&self, pixels: f64) -> f64 {
        pixels / self.interline
    }

    /// Convert an interline fraction to a pixel distance
    pub fn to_pixels(&self, frac: f64) -> f64 {
        frac * self.interline
    }
}
