//! Board geometry: bounding size, cell lookup and crossing detection.

use crate::answer_map::AnswerMap;
use crate::error::CrosswordError;
use crate::types::{BoardSize, Cell, Coordinates};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Computes the board size enclosing every answer map cell.
///
/// Folds the running maximum of x and y over all cells, then adds one to
/// each. With no cells the result is `{1, 1}`. Order of maps is irrelevant.
#[instrument(skip(maps), fields(maps = maps.len()))]
pub fn compute_board_size(maps: &[AnswerMap]) -> BoardSize {
    let (max_x, max_y) = maps
        .iter()
        .flat_map(|m| m.cells())
        .map(Cell::coordinates)
        .fold((0, 0), |(x, y), at| (x.max(at.x), y.max(at.y)));
    let size = BoardSize::new(max_x.saturating_add(1), max_y.saturating_add(1));
    debug!(x = size.x, y = size.y, "Board size computed");
    size
}

/// Resolves a coordinate to the first answer map cell covering it.
///
/// # Errors
///
/// Returns [`CrosswordError::CellNotFound`] if no answer map contains it.
#[instrument(skip(maps))]
pub fn resolve_cell(x: u32, y: u32, maps: &[AnswerMap]) -> Result<&Cell, CrosswordError> {
    let at = Coordinates::new(x, y);
    maps.iter()
        .flat_map(|m| m.cells())
        .find(|c| c.coordinates() == at)
        .ok_or_else(|| {
            debug!(%at, "Coordinate outside puzzle geometry");
            CrosswordError::CellNotFound(at)
        })
}

/// Returns every answer map cell covering a coordinate.
///
/// Two entries mean the coordinate is a crossing.
pub fn resolve_cells(x: u32, y: u32, maps: &[AnswerMap]) -> Vec<&Cell> {
    let at = Coordinates::new(x, y);
    maps.iter()
        .flat_map(|m| m.cells())
        .filter(|c| c.coordinates() == at)
        .collect()
}

/// A coordinate shared by more than one answer map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intersection<'a> {
    /// Shared coordinate.
    pub at: Coordinates,
    /// Owning cells in puzzle order.
    pub cells: Vec<&'a Cell>,
}

impl Intersection<'_> {
    /// Returns true if every owning cell expects the same character.
    pub fn agrees(&self) -> bool {
        self.cells
            .windows(2)
            .all(|pair| pair[0].expected() == pair[1].expected())
    }
}

/// Lists coordinates covered by two or more answer maps, ordered by coordinate.
pub fn intersections(maps: &[AnswerMap]) -> Vec<Intersection<'_>> {
    let mut by_coordinate: BTreeMap<Coordinates, Vec<&Cell>> = BTreeMap::new();
    for cell in maps.iter().flat_map(|m| m.cells()) {
        by_coordinate.entry(cell.coordinates()).or_default().push(cell);
    }
    by_coordinate
        .into_iter()
        .filter(|(_, cells)| cells.len() > 1)
        .map(|(at, cells)| Intersection { at, cells })
        .collect()
}
