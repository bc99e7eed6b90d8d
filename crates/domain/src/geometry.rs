//! Static space geometry: bounds, static element footprints, spawn point.
//!
//! A [`SpaceGeometry`] is immutable once built. Element checks walk the
//! footprint list, so building a geometry costs nothing per covered cell.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A cell on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width × height of a space, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either side is zero or does not
    /// fit the signed coordinate range.
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::validation(format!(
                "Space dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(DomainError::validation(format!(
                "Space dimensions {}x{} exceed the coordinate range",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `true` when the position lies in `[0, width) × [0, height)`.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Row-major cell at `index`, wrapping at the end of the space.
    fn cell_at(&self, index: u64) -> Position {
        let index = index % self.cell_count();
        let width = u64::from(self.width);
        // Both components are bounded by width/height, which fit in i32.
        Position::new((index % width) as i32, (index / width) as i32)
    }

    fn index_of(&self, position: Position) -> u64 {
        u64::from(position.y as u32) * u64::from(self.width) + u64::from(position.x as u32)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses the `"100x200"` form used by the space metadata service.
impl FromStr for Dimensions {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| DomainError::parse(format!("Expected WxH dimensions, got {:?}", s)))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| DomainError::parse(format!("Invalid width in {:?}", s)))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| DomainError::parse(format!("Invalid height in {:?}", s)))?;
        Self::new(width, height)
    }
}

/// Rectangular footprint `[x, x+width) × [y, y+height)` of a static element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementFootprint {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ElementFootprint {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a footprint with no area.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::validation(format!(
                "Element at ({}, {}) has empty footprint {}x{}",
                x, y, width, height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// A single blocked cell.
    pub fn cell(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        let px = i64::from(position.x);
        let py = i64::from(position.y);
        let x = i64::from(self.x);
        let y = i64::from(self.y);
        px >= x && py >= y && px < x + i64::from(self.width) && py < y + i64::from(self.height)
    }

    fn origin(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Immutable geometry of one space.
#[derive(Debug, Clone)]
pub struct SpaceGeometry {
    dimensions: Dimensions,
    elements: Vec<ElementFootprint>,
    spawn: Position,
}

impl SpaceGeometry {
    /// Build geometry from element footprints. A footprint may extend past
    /// the edge of the space; cells beyond it are out of bounds anyway.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if an element's origin lies outside
    /// the space.
    pub fn new(dimensions: Dimensions, elements: Vec<ElementFootprint>) -> Result<Self, DomainError> {
        if let Some(element) = elements.iter().find(|e| !dimensions.contains(e.origin())) {
            return Err(DomainError::validation(format!(
                "Element at {} lies outside {} space",
                element.origin(),
                dimensions
            )));
        }
        Ok(Self {
            dimensions,
            elements,
            spawn: Position::default(),
        })
    }

    /// An empty space with no static elements.
    pub fn open(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            elements: Vec::new(),
            spawn: Position::default(),
        }
    }

    /// Set the preferred spawn point.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the point is out of bounds.
    pub fn with_spawn(mut self, spawn: Position) -> Result<Self, DomainError> {
        if !self.dimensions.contains(spawn) {
            return Err(DomainError::validation(format!(
                "Spawn point {} lies outside {} space",
                spawn, self.dimensions
            )));
        }
        self.spawn = spawn;
        Ok(self)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn elements(&self) -> &[ElementFootprint] {
        &self.elements
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        self.dimensions.contains(position)
    }

    pub fn is_blocked(&self, position: Position) -> bool {
        self.element_at(position).is_some()
    }

    fn element_at(&self, position: Position) -> Option<&ElementFootprint> {
        self.elements.iter().find(|element| element.contains(position))
    }

    /// First cell, row-major from the spawn point and wrapping, that is not
    /// blocked and for which `occupied` is false. `None` when the space is full.
    ///
    /// A blocked run is skipped to the element's right edge in one step.
    pub fn first_free_cell(&self, occupied: impl Fn(Position) -> bool) -> Option<Position> {
        let start = self.dimensions.index_of(self.spawn);
        let total = self.dimensions.cell_count();
        let width = i64::from(self.dimensions.width());
        let mut offset = 0;
        while offset < total {
            let cell = self.dimensions.cell_at(start + offset);
            match self.element_at(cell) {
                Some(element) => {
                    let end = (i64::from(element.x) + i64::from(element.width)).min(width);
                    // `contains` guarantees end > cell.x.
                    offset += (end - i64::from(cell.x)) as u64;
                }
                None if occupied(cell) => offset += 1,
                None => return Some(cell),
            }
        }
        None
    }
}
