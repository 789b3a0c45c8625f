#![forbid(unsafe_code)]

//! Coverage grid storage.
//!
//! The [`Canvas`] is a 2D grid of 8-bit coverage values written by a glyph
//! compositor and later thresholded into ASCII output. Column capacity grows
//! on demand; row capacity is fixed for the life of the canvas.
//!
//! # Layout
//!
//! Cells are stored in column-major order: `index = x * capacity_height + y`.
//! With the height fixed, growing the width appends whole columns to the
//! backing vector and existing cells keep their linear positions.
//!
//! # Invariants
//!
//! 1. `cells.len() == capacity_width * capacity_height`
//! 2. `used_width <= capacity_width` and `used_height <= capacity_height`
//! 3. Every cell never written since the last clear reads 0
//! 4. Used bounds only grow between `new`/`clear`; they cover every written
//!    coordinate
//! 5. A failed `extend` leaves the canvas exactly as it was

use std::error::Error;
use std::fmt;

/// Column-capacity growth strategy for [`Canvas::set_extending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Double the column capacity until the target column fits. Amortizes
    /// repeated single-column growth.
    #[default]
    Doubling,
    /// Grow by a fixed number of columns at a time. A step of 0 is treated
    /// as 1.
    Linear(usize),
}

impl GrowthPolicy {
    /// Next column capacity to request when `current` is insufficient.
    fn next_width(self, current: usize) -> usize {
        match self {
            Self::Doubling => current.saturating_mul(2),
            Self::Linear(step) => current.saturating_add(step.max(1)),
        }
    }
}

/// Errors reported by [`Canvas`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// Construction was asked for a zero-sized dimension.
    InvalidDimensions { width: usize, height: usize },
    /// A bounded write landed outside the allocated capacity.
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// An extending write targeted a row the canvas can never hold. Rows are
    /// sized once per session from font metrics and never auto-grow.
    RowOutOfBounds { y: usize, height: usize },
    /// `extend` was asked to shrink or keep the current width.
    InvalidGrowth { requested: usize, current: usize },
    /// The backing store could not be allocated or grown.
    Allocation { requested_bytes: usize },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "canvas dimensions must be > 0, got {}x{}", width, height)
            }
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => {
                write!(
                    f,
                    "write at ({}, {}) outside canvas capacity {}x{}",
                    x, y, width, height
                )
            }
            Self::RowOutOfBounds { y, height } => {
                write!(
                    f,
                    "row {} exceeds the fixed canvas height {}",
                    y, height
                )
            }
            Self::InvalidGrowth { requested, current } => {
                write!(
                    f,
                    "extend to width {} does not exceed current capacity {}",
                    requested, current
                )
            }
            Self::Allocation { requested_bytes } => {
                write!(f, "failed to allocate {} bytes of cell storage", requested_bytes)
            }
        }
    }
}

impl Error for CanvasError {}

/// A 2D grid of coverage values with on-demand column growth.
///
/// Allocated capacity and the tight bounds actually written are tracked
/// separately: readers iterate the used region, while writers may touch any
/// allocated cell (or beyond, via [`Canvas::set_extending`]).
///
/// # Example
///
/// ```
/// use inkgrid_canvas::Canvas;
///
/// let mut canvas = Canvas::new(8, 4).unwrap();
/// canvas.set(2, 1, 200).unwrap();
/// assert_eq!(canvas.get(2, 1), Some(200));
/// assert_eq!((canvas.used_width(), canvas.used_height()), (3, 2));
/// ```
#[derive(Debug, Clone)]
pub struct Canvas {
    used_width: usize,
    used_height: usize,
    capacity_width: usize,
    capacity_height: usize,
    cells: Vec<u8>,
    policy: GrowthPolicy,
}

impl Canvas {
    /// Create a canvas with the given initial capacity and the default
    /// doubling growth policy. All cells start at 0 and the used bounds at
    /// `(0, 0)`.
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        Self::with_policy(width, height, GrowthPolicy::default())
    }

    /// Create a canvas with an explicit column growth policy.
    pub fn with_policy(
        width: usize,
        height: usize,
        policy: GrowthPolicy,
    ) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        let size = width
            .checked_mul(height)
            .ok_or(CanvasError::Allocation {
                requested_bytes: usize::MAX,
            })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(size)
            .map_err(|_| CanvasError::Allocation {
                requested_bytes: size,
            })?;
        cells.resize(size, 0);
        Ok(Self {
            used_width: 0,
            used_height: 0,
            capacity_width: width,
            capacity_height: height,
            cells,
            policy,
        })
    }

    /// Tight written width since the last clear.
    #[inline]
    pub const fn used_width(&self) -> usize {
        self.used_width
    }

    /// Tight written height since the last clear.
    #[inline]
    pub const fn used_height(&self) -> usize {
        self.used_height
    }

    /// Allocated column capacity.
    #[inline]
    pub const fn capacity_width(&self) -> usize {
        self.capacity_width
    }

    /// Allocated row capacity. Fixed for the life of the canvas.
    #[inline]
    pub const fn capacity_height(&self) -> usize {
        self.capacity_height
    }

    /// Whether nothing has been written since creation or the last clear.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used_width == 0
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.capacity_width && y < self.capacity_height);
        x * self.capacity_height + y
    }

    /// Coverage at `(x, y)`, or `None` outside the used bounds.
    ///
    /// Cells beyond the used region are deliberately unreadable: after a
    /// [`Canvas::clear`] every previously valid coordinate reads `None`
    /// rather than stale data.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.used_width && y < self.used_height {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Write `value` at `(x, y)` within the allocated capacity, extending the
    /// used bounds to cover the coordinate.
    ///
    /// This is the only used-bounds-growing mutator.
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> Result<(), CanvasError> {
        if x >= self.capacity_width || y >= self.capacity_height {
            return Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.capacity_width,
                height: self.capacity_height,
            });
        }
        let i = self.index(x, y);
        self.cells[i] = value;
        if x >= self.used_width {
            self.used_width = x + 1;
        }
        if y >= self.used_height {
            self.used_height = y + 1;
        }
        Ok(())
    }

    /// Write `value` at `(x, y)`, growing the column capacity per the canvas
    /// growth policy until `x` fits.
    ///
    /// Rows never grow: a `y` at or beyond the fixed height is
    /// [`CanvasError::RowOutOfBounds`].
    pub fn set_extending(&mut self, x: usize, y: usize, value: u8) -> Result<(), CanvasError> {
        if y >= self.capacity_height {
            return Err(CanvasError::RowOutOfBounds {
                y,
                height: self.capacity_height,
            });
        }
        while x >= self.capacity_width {
            let next = self.policy.next_width(self.capacity_width);
            self.extend(next)?;
        }
        self.set(x, y, value)
    }

    /// Grow the column capacity to `new_width`, zero-filling the new columns.
    ///
    /// Every previously written cell keeps its value and coordinates. On
    /// allocation failure the canvas is left exactly as it was.
    pub fn extend(&mut self, new_width: usize) -> Result<(), CanvasError> {
        if new_width <= self.capacity_width {
            return Err(CanvasError::InvalidGrowth {
                requested: new_width,
                current: self.capacity_width,
            });
        }
        let new_size = new_width
            .checked_mul(self.capacity_height)
            .ok_or(CanvasError::Allocation {
                requested_bytes: usize::MAX,
            })?;
        let additional = new_size - self.cells.len();
        self.cells
            .try_reserve_exact(additional)
            .map_err(|_| CanvasError::Allocation {
                requested_bytes: new_size,
            })?;
        self.cells.resize(new_size, 0);
        self.capacity_width = new_width;
        Ok(())
    }

    /// Reset the used bounds to zero and zero the entire allocated region,
    /// including capacity gained during the previous line. No coverage can
    /// bleed into the next block.
    pub fn clear(&mut self) {
        self.used_width = 0;
        self.used_height = 0;
        self.cells.fill(0);
    }
}
