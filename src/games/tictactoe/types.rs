//! Core domain types for the grid game.

use super::action::PlacementError;
use super::position::Position;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A player's marker on the grid.
///
/// Any single visible character is a valid piece. Whitespace is rejected
/// because an empty cell renders as a blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
#[display("{_0}")]
pub struct Piece(char);

impl Piece {
    /// Creates a piece from a character, if it is a visible one.
    pub fn new(symbol: char) -> Option<Self> {
        if symbol.is_whitespace() || symbol.is_control() {
            None
        } else {
            Some(Self(symbol))
        }
    }

    /// Parses a registration token: exactly one visible character,
    /// surrounding whitespace ignored.
    #[instrument]
    pub fn parse_token(token: &str) -> Option<Self> {
        let mut chars = token.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => Self::new(symbol),
            _ => None,
        }
    }

    /// Returns the underlying character.
    pub fn symbol(self) -> char {
        self.0
    }
}

/// Rejected piece character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{:?} is not a valid piece", _0)]
pub struct InvalidPiece(pub char);

impl std::error::Error for InvalidPiece {}

impl TryFrom<char> for Piece {
    type Error = InvalidPiece;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        Self::new(symbol).ok_or(InvalidPiece(symbol))
    }
}

impl From<Piece> for char {
    fn from(piece: Piece) -> Self {
        piece.0
    }
}

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing placed yet.
    Empty,
    /// Cell holding a piece. Never reverts to empty.
    Piece(Piece),
}

impl Cell {
    /// Returns the piece in this cell, if any.
    pub fn piece(self) -> Option<Piece> {
        match self {
            Cell::Empty => None,
            Cell::Piece(piece) => Some(piece),
        }
    }

    /// Checks if the cell is empty.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Fixed-size `rows × cols` grid stored in row-major order.
///
/// Dimensions are set at construction and never change. Cells can only be
/// written through [`Grid::place`], which refuses to overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty grid.
    #[instrument]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Checks whether the grid is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Gets the cell at the given coordinates, `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if self.contains(row, col) {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Returns one row of cells, `None` when out of bounds.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.cells.get(start..start + self.cols)
    }

    /// Places a piece on an empty cell.
    ///
    /// The grid is left untouched when the placement fails.
    #[instrument(skip(self), fields(rows = self.rows, cols = self.cols))]
    pub fn place(&mut self, row: usize, col: usize, piece: Piece) -> Result<(), PlacementError> {
        let position = Position::new(row, col);
        if !self.contains(row, col) {
            return Err(PlacementError::OutOfBounds(position));
        }

        let cell = &mut self.cells[row * self.cols + col];
        if !cell.is_empty() {
            return Err(PlacementError::Occupied(position));
        }

        *cell = Cell::Piece(piece);
        Ok(())
    }

    /// Checks if every cell holds a piece.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Number of pieces placed so far.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let divider = format!("-{}", "----".repeat(self.cols));
        for row in 0..self.rows {
            writeln!(f, "{divider}")?;
            write!(f, "|")?;
            for cell in self.row(row).unwrap_or_default() {
                let symbol = cell.piece().map(Piece::symbol).unwrap_or(' ');
                write!(f, " {symbol} |")?;
            }
            writeln!(f)?;
        }
        write!(f, "{divider}")
    }
}
