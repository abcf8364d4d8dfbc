// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing curves for flip transitions.
//!
//! [`Easing`] mirrors the CSS `<easing-function>` subset that page-flip
//! renderers commonly use: `linear` and `cubic-bezier(x1, y1, x2, y2)`,
//! including the `ease*` keywords which are fixed cubic-bezier curves.

use alloc::string::{String, ToString};
use core::str::FromStr;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::ConfigError;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const EPSILON: f64 = 1e-7;

/// A transition timing curve mapping linear progress in `[0, 1]` to eased progress.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(try_from = "alloc::string::String")
)]
pub enum Easing {
    /// Identity curve.
    Linear,
    /// A CSS cubic Bézier timing function with fixed end points `(0, 0)` and `(1, 1)`.
    CubicBezier {
        /// X of the first control point, within `[0, 1]`.
        x1: f64,
        /// Y of the first control point.
        y1: f64,
        /// X of the second control point, within `[0, 1]`.
        x2: f64,
        /// Y of the second control point.
        y2: f64,
    },
}

impl Default for Easing {
    /// The book-flip default, `cubic-bezier(0.645, 0.045, 0.355, 1)`.
    fn default() -> Self {
        Self::CubicBezier {
            x1: 0.645,
            y1: 0.045,
            x2: 0.355,
            y2: 1.0,
        }
    }
}

impl Easing {
    /// CSS `ease`.
    pub const EASE: Self = Self::CubicBezier {
        x1: 0.25,
        y1: 0.1,
        x2: 0.25,
        y2: 1.0,
    };
    /// CSS `ease-in`.
    pub const EASE_IN: Self = Self::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };
    /// CSS `ease-out`.
    pub const EASE_OUT: Self = Self::CubicBezier {
        x1: 0.0,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };
    /// CSS `ease-in-out`.
    pub const EASE_IN_OUT: Self = Self::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    /// Builds a cubic Bézier curve, rejecting control points whose X lies outside `[0, 1]`.
    ///
    /// X values outside that range would make the curve non-monotonic in time.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, ConfigError> {
        let curve = Self::CubicBezier { x1, y1, x2, y2 };
        curve.validate()?;
        Ok(curve)
    }

    /// Checks that a cubic Bézier has X control points within `[0, 1]` and finite Y.
    ///
    /// The variant fields are public, so curves built directly are checked here
    /// when a [`FlipConfig`](crate::FlipConfig) is validated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Linear => Ok(()),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                let x_ok = |x: f64| (0.0..=1.0).contains(&x);
                if x_ok(x1) && x_ok(x2) && y1.is_finite() && y2.is_finite() {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidEasing(alloc::format!(
                        "cubic-bezier({x1}, {y1}, {x2}, {y2})"
                    )))
                }
            }
        }
    }

    /// Evaluates the curve at linear progress `t`; `t` is clamped to `[0, 1]`.
    pub fn ease(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            Self::Linear => t,
            Self::CubicBezier { x1, y1, x2, y2 } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let x = Bezier1D::new(x1, x2);
                let y = Bezier1D::new(y1, y2);
                y.sample(x.solve(t))
            }
        }
    }
}

/// One axis of a cubic Bézier with end points fixed at 0 and 1, in polynomial form.
#[derive(Copy, Clone, Debug)]
struct Bezier1D {
    a: f64,
    b: f64,
    c: f64,
}

impl Bezier1D {
    fn new(p1: f64, p2: f64) -> Self {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        Self { a, b, c }
    }

    fn sample(&self, t: f64) -> f64 {
        ((self.a * t + self.b) * t + self.c) * t
    }

    fn derivative(&self, t: f64) -> f64 {
        (3.0 * self.a * t + 2.0 * self.b) * t + self.c
    }

    /// Finds the parameter whose sample equals `x`; `x` is within `[0, 1]`.
    fn solve(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = self.sample(t) - x;
            if err.abs() < EPSILON && (0.0..=1.0).contains(&t) {
                return t;
            }
            let slope = self.derivative(t);
            if slope.abs() < EPSILON {
                break;
            }
            t -= err / slope;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..BISECTION_ITERATIONS {
            let sample = self.sample(t);
            if (sample - x).abs() < EPSILON {
                break;
            }
            if sample < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }
}

impl FromStr for Easing {
    type Err = ConfigError;

    /// Parses CSS timing-function text such as `ease-in` or `cubic-bezier(0.4, 0, 0.2, 1)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        match text {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::EASE),
            "ease-in" => return Ok(Self::EASE_IN),
            "ease-out" => return Ok(Self::EASE_OUT),
            "ease-in-out" => return Ok(Self::EASE_IN_OUT),
            _ => {}
        }

        let invalid = || ConfigError::InvalidEasing(text.to_string());
        let args = text
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let mut values = [0.0_f64; 4];
        let mut parts = args.split(',');
        for slot in &mut values {
            let part = parts.next().ok_or_else(invalid)?;
            *slot = part.trim().parse().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        let [x1, y1, x2, y2] = values;
        Self::cubic_bezier(x1, y1, x2, y2).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Easing {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
