//! Positional heuristic used to score terminal boards of a playout.
//!
//! Every function here is pure and infallible. Inputs are not validated: a grid
//! holding values that are not powers of two still produces a number, just not
//! a meaningful one.

use crate::engine::{Board, Grid};

/// Snake gradient toward the top-left corner.
const PATTERN_WEIGHTS: [[u64; 4]; 4] = [
    [16, 15, 14, 13],
    [15, 14, 13, 12],
    [14, 13, 12, 11],
    [13, 12, 11, 10],
];

/// The four smallest tile values the game can produce.
pub const SMALL_TILES: [u32; 4] = [2, 4, 8, 16];

/// Central cells that should hold small tiles.
const MIDDLE: [(usize, usize); 4] = [(1, 1), (1, 2), (2, 1), (2, 2)];

const FRAC_WEIGHT: f64 = 0.5;
const FRAC_GUARD: f64 = 0.01;
const PENALTY_WEIGHT: f64 = 0.2;
const DIAG_WEIGHT: f64 = 3.0;
const LOC_WEIGHT: f64 = 4.0;

/// Score a board: pattern weight plus a per-tile bonus for tiles that are close
/// to their twins and similar to their neighbours, minus diagonal and placement
/// penalties.
///
/// ```
/// use mc_2048::heuristic;
/// let grid = [[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]];
/// // 2 * 16 from the pattern, 0.5 / 0.01 for the lone tile, minus 0.2 * 4 * 1
/// assert!((heuristic::score(&grid) - 81.2).abs() < 1e-9);
/// ```
pub fn score(grid: &Grid) -> f64 {
    let loc = loc_penalty(grid) as f64;
    let mut total = pattern_weight(grid) as f64;
    for r in 0..4 {
        for c in 0..4 {
            if grid[r][c] == 0 {
                continue;
            }
            let closeness = move_distance(grid, r, c) as f64 * value_similarity(grid, r, c) as f64;
            let frac = FRAC_WEIGHT / (closeness + FRAC_GUARD);
            let penalty = DIAG_WEIGHT * diag_penalty(grid, r, c) as f64 + LOC_WEIGHT * loc;
            total += frac - PENALTY_WEIGHT * penalty;
        }
    }
    total
}

/// [`score`] over a packed board.
#[inline]
pub fn board_score(board: Board) -> f64 { score(&board.to_grid()) }

/// Sum of tile values weighted by [`PATTERN_WEIGHTS`].
pub fn pattern_weight(grid: &Grid) -> u64 {
    grid.iter()
        .zip(PATTERN_WEIGHTS.iter())
        .flat_map(|(row, weights)| row.iter().zip(weights.iter()))
        .map(|(&val, &w)| val as u64 * w)
        .sum()
}

/// Manhattan distance from `(row, col)` to every other cell with the same value.
pub fn move_distance(grid: &Grid, row: usize, col: usize) -> u32 {
    let tile = grid[row][col];
    if tile == 0 {
        return 0;
    }
    let mut dist = 0;
    for r in 0..4 {
        for c in 0..4 {
            if grid[r][c] == tile && (r, c) != (row, col) {
                dist += (r.abs_diff(row) + c.abs_diff(col)) as u32;
            }
        }
    }
    dist
}

/// Sum of absolute differences to the non-empty 8-neighbours of `(row, col)`.
pub fn value_similarity(grid: &Grid, row: usize, col: usize) -> u64 {
    let tile = grid[row][col];
    neighbours(row, col)
        .map(|(r, c)| grid[r][c])
        .filter(|&val| val != 0)
        .map(|val| val.abs_diff(tile) as u64)
        .sum()
}

/// 2 for every diagonal neighbour holding the same value; 0 for an empty cell.
pub fn diag_penalty(grid: &Grid, row: usize, col: usize) -> u32 {
    let tile = grid[row][col];
    if tile == 0 {
        return 0;
    }
    neighbours(row, col)
        .filter(|&(r, c)| r != row && c != col && grid[r][c] == tile)
        .count() as u32
        * 2
}

/// Board-level placement penalty: one point per large tile in the middle and
/// per small tile on the rim.
pub fn loc_penalty(grid: &Grid) -> u32 {
    let mut output = 0;
    for r in 0..4 {
        for c in 0..4 {
            let val = grid[r][c];
            if val == 0 {
                continue;
            }
            let in_middle = MIDDLE.contains(&(r, c));
            let small = SMALL_TILES.contains(&val);
            if in_middle != small {
                output += 1;
            }
        }
    }
    output
}

/// In-bounds cells of the 3x3 block around `(row, col)`, minus the centre.
fn neighbours(row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    let rows = row.saturating_sub(1)..=(row + 1).min(3);
    rows.flat_map(move |r| {
        let cols = col.saturating_sub(1)..=(col + 1).min(3);
        cols.map(move |c| (r, c))
    })
    .filter(move |&cell| cell != (row, col))
}
