// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flip options and their resolved configuration.

use alloc::string::String;
use core::fmt;

use crate::Easing;

/// How the renderer should animate a page change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum AnimationStyle {
    /// 3D page turn around the spine.
    #[default]
    Flip,
    /// Horizontal slide between pages.
    Slide,
    /// Instant swap.
    None,
}

/// Error returned when options cannot be resolved into a [`FlipConfig`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A size that must be positive and finite was not.
    InvalidDimension {
        /// Option name, e.g. `"width"`.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// `auto_play_interval` was zero.
    ZeroAutoPlayInterval,
    /// Easing text that is not a supported CSS timing function.
    InvalidEasing(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { name, value } => {
                write!(f, "`{name}` must be positive and finite, got {value}")
            }
            Self::ZeroAutoPlayInterval => f.write_str("`auto_play_interval` must be non-zero"),
            Self::InvalidEasing(text) => write!(f, "unsupported easing function `{text}`"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Fully resolved flip configuration.
///
/// Times are in milliseconds; sizes in the host's logical pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FlipConfig {
    /// Width of the open book (both pages of a spread).
    pub width: f64,
    /// Height of a page.
    pub height: f64,
    /// CSS-style perspective distance for 3D flips.
    pub perspective: f64,
    /// Flip transition length; also the flip-lock period.
    pub duration: u64,
    /// Timing curve for the flip transition.
    pub easing: Easing,
    /// Whether the renderer draws page shadows.
    pub shadow: bool,
    /// Visual page thickness.
    pub thickness: f64,
    /// Whether auto-play starts on mount.
    pub auto_play: bool,
    /// Delay between auto-play page turns.
    pub auto_play_interval: u64,
    /// Right-to-left reading order (manga and similar).
    pub rtl: bool,
    /// Show the first page alone instead of as part of a spread.
    pub single_first_page: bool,
    /// Transition style.
    pub animation: AnimationStyle,
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            perspective: 2000.0,
            duration: 800,
            easing: Easing::default(),
            shadow: true,
            thickness: 2.0,
            auto_play: false,
            auto_play_interval: 3000,
            rtl: false,
            single_first_page: true,
            animation: AnimationStyle::Flip,
        }
    }
}

impl FlipConfig {
    /// Half of [`width`](Self::width): the extent one page occupies and the
    /// unit drag displacement is normalized by.
    pub fn page_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Checks the invariants [`FlipOptions::resolve`] enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidDimension { name, value });
            }
        }
        for (name, value) in [
            ("perspective", self.perspective),
            ("thickness", self.thickness),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidDimension { name, value });
            }
        }
        if self.auto_play_interval == 0 {
            return Err(ConfigError::ZeroAutoPlayInterval);
        }
        self.easing.validate()
    }
}

/// Partial flip options; unset keys fall back to [`FlipConfig::default`].
///
/// With the `serde` feature these deserialize from camelCase keys
/// (`autoPlayInterval`, `singleFirstPage`, ...) and unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct FlipOptions {
    /// See [`FlipConfig::width`].
    pub width: Option<f64>,
    /// See [`FlipConfig::height`].
    pub height: Option<f64>,
    /// See [`FlipConfig::perspective`].
    pub perspective: Option<f64>,
    /// See [`FlipConfig::duration`].
    pub duration: Option<u64>,
    /// See [`FlipConfig::easing`].
    pub easing: Option<Easing>,
    /// See [`FlipConfig::shadow`].
    pub shadow: Option<bool>,
    /// See [`FlipConfig::thickness`].
    pub thickness: Option<f64>,
    /// See [`FlipConfig::auto_play`].
    pub auto_play: Option<bool>,
    /// See [`FlipConfig::auto_play_interval`].
    pub auto_play_interval: Option<u64>,
    /// See [`FlipConfig::rtl`].
    pub rtl: Option<bool>,
    /// See [`FlipConfig::single_first_page`].
    pub single_first_page: Option<bool>,
    /// See [`FlipConfig::animation`].
    pub animation: Option<AnimationStyle>,
}

impl FlipOptions {
    /// Merges these options over the defaults and validates the result.
    pub fn resolve(&self) -> Result<FlipConfig, ConfigError> {
        let defaults = FlipConfig::default();
        let config = FlipConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            perspective: self.perspective.unwrap_or(defaults.perspective),
            duration: self.duration.unwrap_or(defaults.duration),
            easing: self.easing.unwrap_or(defaults.easing),
            shadow: self.shadow.unwrap_or(defaults.shadow),
            thickness: self.thickness.unwrap_or(defaults.thickness),
            auto_play: self.auto_play.unwrap_or(defaults.auto_play),
            auto_play_interval: self
                .auto_play_interval
                .unwrap_or(defaults.auto_play_interval),
            rtl: self.rtl.unwrap_or(defaults.rtl),
            single_first_page: self.single_first_page.unwrap_or(defaults.single_first_page),
            animation: self.animation.unwrap_or(defaults.animation),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_resolve_to_defaults() {
        assert_eq!(FlipOptions::default().resolve(), Ok(FlipConfig::default()));
    }

    #[test]
    fn set_options_override_defaults() {
        let options = FlipOptions {
            width: Some(1024.0),
            duration: Some(300),
            rtl: Some(true),
            animation: Some(AnimationStyle::Slide),
            ..FlipOptions::default()
        };
        let config = options.resolve().unwrap();

        assert_eq!(config.width, 1024.0);
        assert_eq!(config.page_width(), 512.0);
        assert_eq!(config.duration, 300);
        assert!(config.rtl);
        assert_eq!(config.animation, AnimationStyle::Slide);
        assert_eq!(config.height, 600.0);
        assert!(config.single_first_page);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let zero_width = FlipOptions {
            width: Some(0.0),
            ..FlipOptions::default()
        };
        assert_eq!(
            zero_width.resolve(),
            Err(ConfigError::InvalidDimension {
                name: "width",
                value: 0.0
            })
        );

        let nan_height = FlipOptions {
            height: Some(f64::NAN),
            ..FlipOptions::default()
        };
        assert!(matches!(
            nan_height.resolve(),
            Err(ConfigError::InvalidDimension { name: "height", .. })
        ));

        let negative_thickness = FlipOptions {
            thickness: Some(-1.0),
            ..FlipOptions::default()
        };
        assert!(negative_thickness.resolve().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let options = FlipOptions {
            auto_play_interval: Some(0),
            ..FlipOptions::default()
        };
        assert_eq!(options.resolve(), Err(ConfigError::ZeroAutoPlayInterval));
    }

    #[test]
    fn hand_built_easing_is_validated() {
        let options = FlipOptions {
            easing: Some(Easing::CubicBezier {
                x1: 2.0,
                y1: 0.0,
                x2: -1.0,
                y2: 1.0,
            }),
            ..FlipOptions::default()
        };
        assert!(matches!(
            options.resolve(),
            Err(ConfigError::InvalidEasing(_))
        ));

        let infinite_y = FlipConfig {
            easing: Easing::CubicBezier {
                x1: 0.5,
                y1: f64::INFINITY,
                x2: 0.5,
                y2: 1.0,
            },
            ..FlipConfig::default()
        };
        assert!(infinite_y.validate().is_err());

        let overshoot = FlipOptions {
            easing: Some(Easing::CubicBezier {
                x1: 0.34,
                y1: 1.56,
                x2: 0.64,
                y2: 1.0,
            }),
            ..FlipOptions::default()
        };
        assert!(overshoot.resolve().is_ok());
    }

    #[test]
    fn errors_render_readably() {
        let err = ConfigError::InvalidDimension {
            name: "width",
            value: -3.0,
        };
        assert_eq!(
            alloc::format!("{err}"),
            "`width` must be positive and finite, got -3"
        );
    }
}
