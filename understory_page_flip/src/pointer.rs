// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer input normalization and horizontal drag tracking.
//!
//! Hosts forward both mouse and touch events to the drag handlers of
//! [`BookFlip`](crate::BookFlip). [`PointerInput`] captures either shape and
//! exposes the primary horizontal coordinate uniformly, and
//! [`HorizontalDrag`] turns the displacement from the drag start into a
//! normalized progress value.
//!
//! ```
//! use kurbo::Point;
//! use understory_page_flip::{HorizontalDrag, PointerInput};
//!
//! let down = PointerInput::touch([Point::new(100.0, 10.0), Point::new(300.0, 10.0)]);
//! assert_eq!(down.primary_x(), Some(100.0));
//!
//! let mut drag = HorizontalDrag::default();
//! drag.start(100.0);
//! // Half a page to the left.
//! assert_eq!(drag.update(-100.0, 400.0), Some(-0.5));
//! assert_eq!(drag.end(), -0.5);
//! assert!(!drag.is_dragging());
//! ```

use kurbo::Point;
use smallvec::SmallVec;

/// A pointer event as seen by the drag handlers.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
    /// A mouse (or pen) event at a single position.
    Mouse {
        /// Pointer position in the host's coordinate space.
        position: Point,
    },
    /// A touch event carrying every active touch point, primary first.
    Touch {
        /// Active touch points.
        touches: SmallVec<[Point; 2]>,
    },
}

impl PointerInput {
    /// A mouse event at `position`.
    pub fn mouse(position: Point) -> Self {
        Self::Mouse { position }
    }

    /// A touch event with the given touch points, primary first.
    pub fn touch(touches: impl IntoIterator<Item = Point>) -> Self {
        Self::Touch {
            touches: touches.into_iter().collect(),
        }
    }

    /// The horizontal coordinate of the primary pointer.
    ///
    /// Returns `None` for a touch event with no touch points.
    pub fn primary_x(&self) -> Option<f64> {
        match self {
            Self::Mouse { position } => Some(position.x),
            Self::Touch { touches } => touches.first().map(|p| p.x),
        }
    }
}

/// Tracks a horizontal drag as a signed fraction of a page width.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HorizontalDrag {
    start_x: Option<f64>,
    progress: f64,
}

impl HorizontalDrag {
    /// Starts tracking a drag from `x`, discarding any previous drag.
    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
        self.progress = 0.0;
    }

    /// Updates progress for the pointer now at `x`.
    ///
    /// Progress is the displacement from the start divided by `page_width`,
    /// clamped to `[-1, 1]`. Returns `None` when no drag is active.
    pub fn update(&mut self, x: f64, page_width: f64) -> Option<f64> {
        let start = self.start_x?;
        self.progress = normalized_offset(x - start, page_width);
        Some(self.progress)
    }

    /// Ends the drag, returning the final progress and resetting it to zero.
    pub fn end(&mut self) -> f64 {
        self.start_x = None;
        core::mem::take(&mut self.progress)
    }

    /// Returns `true` while a drag is active.
    pub fn is_dragging(&self) -> bool {
        self.start_x.is_some()
    }

    /// Current progress in `[-1, 1]`; zero when idle.
    pub fn progress(&self) -> f64 {
        self.progress
    }
}

fn normalized_offset(delta: f64, extent: f64) -> f64 {
    if !(extent.is_finite() && extent > 0.0) {
        return 0.0;
    }
    let fraction = delta / extent;
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(-1.0, 1.0)
    }
}
