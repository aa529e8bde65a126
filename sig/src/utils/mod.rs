use serde::{Deserialize, Serialize};

pub mod geom;

pub use geom::{Line2D, Point2D, Rectangle};

/// Which horizontal side of a symbol a connection uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizontalSide {
    Left,
    Right,
}

impl HorizontalSide {
    /// `-1` for [`Left`](Self::Left), `+1` for [`Right`](Self::Right)
    pub fn direction(self) -> f64 {
        match self {
            HorizontalSide::Left => -1.0,
            HorizontalSide::Right => 1.0,
        }
    }

}

/// Which vertical side of a symbol a connection uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalSide {
    Top,
    Bottom,
}

impl VerticalSide {
    /// `-1` for [`Top`](Self::Top), `+1` for [`Bottom`](Self::Bottom)
    pub fn direction(self) -> f64 {
        match self {
            VerticalSide::Top => -1.0,
            VerticalSide::Bottom => 1.0,
        }
    }
}

/// Round to 3 decimal digits, the precision at which gaps are stored and persisted
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        #[track_caller]
        fn check(input: f64, expected: f64) {
            assert_eq!(round3(input), expected);
        }
        check(0.12345, 0.123);
        check(-0.12355, -0.124);
        check(1.0, 1.0);
        check(0.0005, 0.001);
    }
}
