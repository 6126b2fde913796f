//! Physical dimensions of products and storage locations.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Length/width/height triple. Every axis is finite and strictly positive.
///
/// Values are compared by value; there is no identity. Units of measure are the
/// caller's convention, but products and locations must share one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions")]
pub struct Dimensions {
    length: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct RawDimensions {
    length: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = DomainError;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Dimensions::new(raw.length, raw.width, raw.height)
    }
}

impl Dimensions {
    pub fn new(length: f64, width: f64, height: f64) -> DomainResult<Self> {
        for (axis, value) in [("length", length), ("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::validation(format!(
                    "{axis} must be a positive number (got {value})"
                )));
            }
        }
        Ok(Self {
            length,
            width,
            height,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Fit predicate: `self` fits inside `container` when no axis exceeds the
    /// container's corresponding axis. Axes are not rotated.
    pub fn fits_within(&self, container: &Dimensions) -> bool {
        self.length <= container.length
            && self.width <= container.width
            && self.height <= container.height
    }

    /// Sum of per-axis leftover space when `self` is stored in `container`.
    ///
    /// Returns `None` if `self` does not fit.
    pub fn slack_within(&self, container: &Dimensions) -> Option<f64> {
        if !self.fits_within(container) {
            return None;
        }
        Some(
            (container.length - self.length)
                + (container.width - self.width)
                + (container.height - self.height),
        )
    }
}
