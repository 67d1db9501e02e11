use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// The engine's move enumeration, in the order every selector walks it.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// Largest exponent a nibble can hold (2^15 = 32768).
const MAX_EXPONENT: u32 = 15;

struct Stores {
    shift_left: Box<[u64]>,
    shift_right: Box<[u64]>,
    shift_up: Box<[u64]>,
    shift_down: Box<[u64]>,
    score: Box<[Score]>,
}

type BoardRaw = u64;
type Line = u64;
type Tile = u64;
type Score = u64;

/// Decoded tile values, row-major: `grid[row][col]`, 0 for an empty cell.
pub type Grid = [[u32; 4]; 4];

/// Packed 4x4 2048 board as 16 4-bit exponents in a `u64`.
///
/// `Board` is `Copy`: every assignment is a full copy, so a simulation can never
/// alias the board it was seeded from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from tile values.
    ///
    /// Values are not validated: a non power of two is rounded down to the
    /// nearest power, and anything above 32768 is clamped.
    pub fn from_grid(grid: &Grid) -> Self {
        let mut raw = 0u64;
        for (r, row) in grid.iter().enumerate() {
            for (c, &val) in row.iter().enumerate() {
                let exp = if val == 0 { 0 } else { (31 - val.leading_zeros()).clamp(1, MAX_EXPONENT) };
                raw |= (exp as u64) << (60 - 4 * (r * 4 + c));
            }
        }
        Board(raw)
    }

    /// Decode into a grid of tile values.
    pub fn to_grid(self) -> Grid {
        let mut grid = [[0u32; 4]; 4];
        for (idx, exp) in to_vec(self).into_iter().enumerate() {
            grid[idx / 4][idx % 4] = exp_to_value(exp as Tile);
        }
        grid
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use mc_2048::engine::{Board, Move};
    /// let b = Board::from_grid(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.shift(Move::Left).to_grid()[0], [4, 0, 0, 0]);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        match dir {
            Move::Left | Move::Right => shift_rows(self, dir),
            Move::Up | Move::Down => shift_cols(self, dir),
        }
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot.
    ///
    /// A full board is returned unchanged.
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = count_empty(self);
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        let mut tile = generate_random_tile(rng);
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 { break; }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Perform a move then insert a random tile if the move changed the board.
    ///
    /// A move that changes nothing is a no-op: no tile is spawned.
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let moved = self.shift(direction);
        if moved != self { moved.with_random_tile(rng) } else { self }
    }

    /// Score implied by the tiles on the board, assuming every tile was built from 2s.
    #[inline]
    pub fn score(self) -> Score { get_score(self) }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use mc_2048::engine::Board;
    /// // Nothing can slide on an empty board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// Moves that change this board, in [`Move::ALL`] order.
    pub fn legal_moves(self) -> Vec<Move> {
        Move::ALL.into_iter().filter(|&dir| self.shift(dir) != self).collect()
    }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 when empty.
    #[inline]
    pub fn highest_tile(self) -> Tile { get_highest_tile_val(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 { count_empty(self) }

    /// Tile value at row-major index `idx` (0..16), 0 if empty.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 { exp_to_value(get_tile(self, idx)) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = to_vec(*self).iter().map(format_val).collect();
        for (row_idx, row) in cells.chunks(4).enumerate() {
            if row_idx > 0 {
                writeln!(f, "-------------------------------")?;
            }
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.raw() } }

/// Initialize the shift tables eagerly. Safe to call multiple times; lookups
/// initialize them lazily otherwise.
pub fn new() {
    let _ = stores();
}

/// Compute the tile-implied score for a board.
pub fn get_score(board: Board) -> Score {
    (0..4).fold(0, |acc, idx| {
        let row_val = extract_line(board.0, idx) as u16;
        acc + get_score_entry(row_val)
    })
}

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    Move::ALL.into_iter().all(|direction| board.shift(direction) == board)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u64 {
    16 - count_non_empty(board)
}

// Credit to Nneonneo
fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

fn line_to_vec(line: Line) -> Vec<Tile> {
    (0..4).map(|tile_idx| line >> ((3 - tile_idx) * 4) & 0xf).collect()
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut score = vec![0u64; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let line = val as u64;
        shift_left[val] = shift_line(line, Move::Left);
        shift_right[val] = shift_line(line, Move::Right);
        shift_up[val] = shift_line(line, Move::Up);
        shift_down[val] = shift_line(line, Move::Down);
        score[val] = calc_score(line);
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        score: score.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

#[inline(always)]
fn get_line_entry(table: &[u64], idx: u16) -> u64 {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    unsafe { *table.get_unchecked(idx as usize) }
}

#[inline(always)]
fn get_score_entry(idx: u16) -> Score {
    get_line_entry(&stores().score, idx)
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile { if rng.gen_range(0..10) < 9 { 1 } else { 2 } }

fn shift_rows(board: Board, move_dir: Move) -> Board {
    let s = stores();
    let table: &[u64] = match move_dir {
        Move::Right => &s.shift_right,
        _ => &s.shift_left,
    };
    let res = (0..4).fold(0, |new_board, row_idx| {
        let row_val = extract_line(board.0, row_idx) as u16;
        let new_row_val = get_line_entry(table, row_val);
        new_board | (new_row_val << (48 - (16 * row_idx)))
    });
    Board(res)
}

fn shift_cols(board: Board, move_dir: Move) -> Board {
    let transpose_board = transpose(board.0);
    let s = stores();
    let table: &[u64] = match move_dir {
        Move::Down => &s.shift_down,
        _ => &s.shift_up,
    };
    let res = (0..4).fold(0, |new_board, col_idx| {
        let col_val = extract_line(transpose_board, col_idx) as u16;
        let new_col_val = get_line_entry(table, col_val);
        new_board | (new_col_val << (12 - (4 * col_idx)))
    });
    Board(res)
}

fn shift_line(line: Line, direction: Move) -> Line {
    let tiles = line_to_vec(line);
    match direction {
        Move::Left | Move::Right => vec_to_row(shift_vec(tiles, direction)),
        Move::Up | Move::Down => vec_to_col(shift_vec(tiles, direction)),
    }
}

fn vec_to_row(tiles: Vec<Tile>) -> Line {
    tiles[0] << 12 | tiles[1] << 8 | tiles[2] << 4 | tiles[3]
}

fn vec_to_col(tiles: Vec<Tile>) -> Line {
    tiles[0] << 48 | tiles[1] << 32 | tiles[2] << 16 | tiles[3]
}

fn shift_vec(vec: Vec<Tile>, direction: Move) -> Vec<Tile> {
    match direction {
        Move::Left | Move::Up => shift_vec_left(vec),
        Move::Right | Move::Down => shift_vec_right(vec),
    }
}

fn shift_vec_right(vec: Vec<Tile>) -> Vec<Tile> {
    let rev_vec: Vec<Tile> = vec.into_iter().rev().collect();
    shift_vec_left(rev_vec).iter().rev().copied().collect()
}

fn shift_vec_left(mut vec: Vec<Tile>) -> Vec<Tile> {
    for i in 0..4 {
        calculate_left_shift(&mut vec[i..]);
    }
    vec
}

fn calculate_left_shift(slice: &mut [Tile]) {
    let mut acc = 0;
    for idx in 0..slice.len() {
        let val = slice[idx];
        if acc != 0 && acc == val {
            // a 32768 pair cannot merge past the nibble range
            if acc < MAX_EXPONENT as Tile {
                slice[idx] = 0;
                acc += 1;
            }
            break;
        } else if acc != 0 && val != 0 && acc != val {
            break;
        } else if acc == 0 && val != 0 {
            slice[idx] = 0;
            acc = val;
        };
    }
    slice[0] = acc;
}

// Credit to Nneonneo
fn calc_score(line: Line) -> Score {
    line_to_vec(line)
        .into_iter()
        .filter(|&tile_val| tile_val >= 2)
        // the score is the total sum of the tile and all intermediate merged tiles
        .map(|tile_val| (tile_val - 1) * (1 << tile_val))
        .sum()
}

fn count_non_empty(board: Board) -> u64 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones() as u64
}

fn to_vec(board: Board) -> Vec<u8> {
    (0..16).map(|idx| get_tile(board, idx) as u8).collect()
}

#[inline]
fn exp_to_value(exp: Tile) -> u32 {
    if exp == 0 { 0 } else { 1 << exp }
}

fn format_val(val: &u8) -> String {
    match val {
        0 => String::from("       "),
        &x => format!("{:^7}", 1u32 << x),
    }
}

fn get_highest_tile_val(board: Board) -> Tile {
    let max_tile = (0..16).map(|idx| get_tile(board, idx)).max().unwrap_or(0);
    exp_to_value(max_tile) as Tile
}

fn get_tile(board: Board, idx: usize) -> Tile {
    (board.0 >> (60 - (4 * idx))) & 0xf
}
