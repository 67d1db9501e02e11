//! The game-engine seam the move selector drives.
//!
//! [`GameState`] is everything the Monte Carlo core needs from a game: a board
//! snapshot, the move enumeration, a way to apply moves, and a game-over check.
//! [`Game`] is the stock implementation backed by [`crate::engine`].

use rand::Rng;

use crate::engine::{Board, Move};

pub trait GameState {
    /// Current board, by value.
    fn board(&self) -> Board;

    /// The engine's move enumeration. Order matters: ties go to the later move.
    fn move_list(&self) -> &[Move];

    /// Whether `dir` would change the current position. The selector only
    /// evaluates root moves for which this holds.
    fn is_legal(&self, dir: Move) -> bool {
        let board = self.board();
        board.shift(dir) != board
    }

    fn is_game_over(&self) -> bool;

    /// Apply a move. A move that cannot change the board must be a no-op.
    fn make_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R);

    fn score(&self) -> u64;

    /// A fresh private game of the same kind, seeded with `board` and a zero score.
    fn spawn(&self, board: Board) -> Self
    where
        Self: Sized;
}

/// A live 2048 game: the board plus the running merge score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    board: Board,
    score: u64,
}

impl Game {
    /// New game with the standard two random starting tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let board = Board::EMPTY.with_random_tile(rng).with_random_tile(rng);
        Self::from_board(board)
    }

    /// Game positioned at `board` with a zero score.
    pub fn from_board(board: Board) -> Self { Self { board, score: 0 } }

    pub fn highest_tile(&self) -> u64 { self.board.highest_tile() }
}

impl GameState for Game {
    #[inline]
    fn board(&self) -> Board { self.board }

    #[inline]
    fn move_list(&self) -> &[Move] { &Move::ALL }

    #[inline]
    fn is_game_over(&self) -> bool { self.board.is_game_over() }

    fn make_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) {
        let moved = self.board.shift(dir);
        if moved == self.board {
            return;
        }
        // every merge adds the merged tile's value to the tile-implied score
        self.score += moved.score() - self.board.score();
        self.board = moved.with_random_tile(rng);
    }

    #[inline]
    fn score(&self) -> u64 { self.score }

    fn spawn(&self, board: Board) -> Self { Self::from_board(board) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn new_game_has_two_tiles() {
        let mut rng = StdRng::seed_from_u64(5);
        let game = Game::new(&mut rng);
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.score(), 0);
        assert!(!game.is_game_over());
    }

    #[test]
    fn merges_accumulate_score() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::from_grid(&[[2, 2, 4, 4], [0; 4], [0; 4], [0; 4]]);
        let mut game = Game::from_board(board);
        game.make_move(Move::Left, &mut rng);
        assert_eq!(game.score(), 4 + 8);
        assert_eq!(game.board().to_grid()[0], [4, 8, 0, 0]);
        assert_eq!(game.board().count_empty(), 13);
    }

    #[test]
    fn illegal_move_leaves_game_untouched() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::from_grid(&[[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let mut game = Game::from_board(board);
        game.make_move(Move::Up, &mut rng);
        game.make_move(Move::Left, &mut rng);
        assert_eq!(game.board(), board);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn legality_matches_engine_moves() {
        let game = Game::from_board(Board::from_grid(&[[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]));
        let legal: Vec<Move> = Move::ALL.into_iter().filter(|&m| game.is_legal(m)).collect();
        assert_eq!(legal, game.board().legal_moves());
        assert!(!game.is_legal(Move::Left));
    }

    #[test]
    fn spawn_copies_board_and_resets_score() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::from_board(Board::from_grid(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]));
        game.make_move(Move::Left, &mut rng);
        let mut sim = game.spawn(game.board());
        assert_eq!(sim.board(), game.board());
        assert_eq!(sim.score(), 0);
        sim.make_move(Move::Down, &mut rng);
        assert_ne!(sim.board(), game.board());
    }
}
