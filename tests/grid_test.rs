//! Tests for grid placement invariants.

use tictactoe_broker::{Cell, Grid, Piece, PlacementError, Position};

fn piece(symbol: char) -> Piece {
    Piece::new(symbol).expect("valid piece")
}

/// Fills a few cells in a fixed pattern so the properties run on non-empty grids.
fn seeded_grid(rows: usize, cols: usize) -> Grid {
    let mut grid = Grid::new(rows, cols);
    for i in 0..rows.min(cols) {
        let symbol = if i % 2 == 0 { 'O' } else { 'X' };
        grid.place(i, i, piece(symbol)).expect("diagonal cell empty");
    }
    grid
}

const SIZES: [(usize, usize); 5] = [(1, 1), (3, 3), (2, 4), (4, 2), (5, 5)];

#[test]
fn test_occupied_placement_never_mutates() {
    for (rows, cols) in SIZES {
        let mut grid = seeded_grid(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                if grid.get(row, col) == Some(Cell::Empty) {
                    continue;
                }
                let before = grid.clone();
                let result = grid.place(row, col, piece('#'));
                assert_eq!(result, Err(PlacementError::Occupied(Position::new(row, col))));
                assert_eq!(grid, before);
            }
        }
    }
}

#[test]
fn test_out_of_bounds_placement_never_mutates() {
    for (rows, cols) in SIZES {
        let mut grid = seeded_grid(rows, cols);
        let before = grid.clone();
        for (row, col) in [(rows, 0), (0, cols), (rows, cols), (rows + 7, cols + 3)] {
            let result = grid.place(row, col, piece('O'));
            assert_eq!(result, Err(PlacementError::OutOfBounds(Position::new(row, col))));
            assert_eq!(grid, before);
        }
    }
}

#[test]
fn test_move_at_five_five_rejected_on_three_by_three() {
    let mut grid = seeded_grid(3, 3);
    let before = grid.clone();
    let err = grid.place(5, 5, piece('X')).expect_err("outside the board");
    assert_eq!(err.to_string(), "Position [5,5]: OUT OF BOARD");
    assert_eq!(grid, before);
}

#[test]
fn test_cells_fill_exactly_once() {
    let mut grid = Grid::new(2, 2);
    let cells = [(0, 0), (0, 1), (1, 0), (1, 1)];
    for (n, &(row, col)) in cells.iter().enumerate() {
        assert!(!grid.is_full());
        grid.place(row, col, piece('O')).expect("empty cell");
        assert_eq!(grid.occupied(), n + 1);
    }
    assert!(grid.is_full());
    assert_eq!(grid.rows(), 2);
    assert_eq!(grid.cols(), 2);
}

#[test]
fn test_render_fixture() {
    let mut grid = Grid::new(3, 3);
    grid.place(0, 0, piece('O')).expect("empty cell");
    grid.place(1, 1, piece('X')).expect("empty cell");
    grid.place(2, 0, piece('O')).expect("empty cell");
    let expected = "\
-------------
| O |   |   |
-------------
|   | X |   |
-------------
| O |   |   |
-------------";
    assert_eq!(grid.to_string(), expected);
}
