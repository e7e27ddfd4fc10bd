use serde::{Deserialize, Serialize};

use crate::relay::room::PlayerRole;

/// The eight winning triples of a 3x3 board.
const WINNING_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Authoritative tic-tac-toe state, broadcast in full after every
/// accepted move so clients can render idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    pub board: [Option<PlayerRole>; 9],
    pub current_player: PlayerRole,
    pub active: bool,
    pub winner: Option<PlayerRole>,
    pub draw: bool,
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToeState {
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current_player: PlayerRole::X,
            active: true,
            winner: None,
            draw: false,
        }
    }

    /// Apply a move by `role` on `cell`. Returns false without touching
    /// the board when the game is over, the cell is taken, the index is
    /// out of range, or it is not `role`'s turn.
    pub fn apply_move(&mut self, cell: usize, role: PlayerRole) -> bool {
        if !self.active || cell >= 9 || role != self.current_player || self.board[cell].is_some() {
            return false;
        }

        self.board[cell] = Some(role);

        if self.has_winning_triple(role) {
            self.active = false;
            self.winner = Some(role);
        } else if self.board.iter().all(|c| c.is_some()) {
            self.active = false;
            self.draw = true;
        } else {
            self.current_player = self.current_player.other();
        }

        true
    }

    /// Empty board, X to move. Role assignment is untouched.
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    fn has_winning_triple(&self, role: PlayerRole) -> bool {
        WINNING_TRIPLES
            .iter()
            .any(|triple| triple.iter().all(|&i| self.board[i] == Some(role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = TicTacToeState::new();
        assert!(state.board.iter().all(|c| c.is_none()));
        assert_eq!(state.current_player, PlayerRole::X);
        assert!(state.active);
        assert!(state.winner.is_none());
        assert!(!state.draw);
    }

    #[test]
    fn test_accepted_move_flips_turn() {
        let mut state = TicTacToeState::new();
        assert!(state.apply_move(4, PlayerRole::X));
        assert_eq!(state.board[4], Some(PlayerRole::X));
        assert_eq!(state.current_player, PlayerRole::O);
        assert!(state.active);
    }

    #[test]
    fn test_out_of_turn_move_rejected() {
        let mut state = TicTacToeState::new();
        assert!(!state.apply_move(0, PlayerRole::O));
        assert!(state.board.iter().all(|c| c.is_none()));
        assert_eq!(state.current_player, PlayerRole::X);
    }

    #[test]
    fn test_occupied_cell_is_immutable() {
        let mut state = TicTacToeState::new();
        assert!(state.apply_move(0, PlayerRole::X));
        assert!(!state.apply_move(0, PlayerRole::O));
        assert_eq!(state.board[0], Some(PlayerRole::X));
        // O's turn was not consumed by the rejected move
        assert_eq!(state.current_player, PlayerRole::O);
    }

    #[test]
    fn test_out_of_range_cell_rejected() {
        let mut state = TicTacToeState::new();
        assert!(!state.apply_move(9, PlayerRole::X));
        assert_eq!(state.current_player, PlayerRole::X);
    }

    #[test]
    fn test_top_row_win() {
        let mut state = TicTacToeState::new();
        assert!(state.apply_move(0, PlayerRole::X));
        assert!(state.apply_move(3, PlayerRole::O));
        assert!(state.apply_move(1, PlayerRole::X));
        assert!(state.apply_move(4, PlayerRole::O));
        assert!(state.apply_move(2, PlayerRole::X));

        assert!(!state.active);
        assert_eq!(state.winner, Some(PlayerRole::X));
        assert!(!state.draw);

        // Terminal state accepts no further moves
        assert!(!state.apply_move(5, PlayerRole::O));
        assert!(state.board[5].is_none());
    }

    #[test]
    fn test_diagonal_win_for_o() {
        let mut state = TicTacToeState::new();
        assert!(state.apply_move(1, PlayerRole::X));
        assert!(state.apply_move(0, PlayerRole::O));
        assert!(state.apply_move(2, PlayerRole::X));
        assert!(state.apply_move(4, PlayerRole::O));
        assert!(state.apply_move(5, PlayerRole::X));
        assert!(state.apply_move(8, PlayerRole::O));

        assert_eq!(state.winner, Some(PlayerRole::O));
        assert!(!state.active);
    }

    #[test]
    fn test_full_board_without_winner_is_draw() {
        let mut state = TicTacToeState::new();
        // X O X / X O O / O X X
        for (cell, role) in [
            (0, PlayerRole::X),
            (1, PlayerRole::O),
            (2, PlayerRole::X),
            (4, PlayerRole::O),
            (3, PlayerRole::X),
            (5, PlayerRole::O),
            (7, PlayerRole::X),
            (6, PlayerRole::O),
            (8, PlayerRole::X),
        ] {
            assert!(state.apply_move(cell, role), "move on cell {} rejected", cell);
        }

        assert!(state.draw);
        assert!(state.winner.is_none());
        assert!(!state.active);
    }

    #[test]
    fn test_cells_never_change_once_set() {
        let mut state = TicTacToeState::new();
        let moves = [
            (0, PlayerRole::X),
            (4, PlayerRole::O),
            (1, PlayerRole::X),
            (5, PlayerRole::O),
        ];

        for (cell, role) in moves {
            assert!(state.apply_move(cell, role));
        }

        let snapshot = state.board;
        // Replay every cell with both roles; nothing already set may change
        for cell in 0..9 {
            let _ = state.apply_move(cell, PlayerRole::X);
            let _ = state.apply_move(cell, PlayerRole::O);
        }
        for (cell, _) in moves {
            assert_eq!(state.board[cell], snapshot[cell]);
        }
    }

    #[test]
    fn test_restart_resets_board() {
        let mut state = TicTacToeState::new();
        state.apply_move(0, PlayerRole::X);
        state.apply_move(4, PlayerRole::O);
        state.restart();

        assert!(state.board.iter().all(|c| c.is_none()));
        assert_eq!(state.current_player, PlayerRole::X);
        assert!(state.active);
    }

    #[test]
    fn test_serializes_camel_case() {
        let state = TicTacToeState::new();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentPlayer"], "X");
        assert_eq!(json["board"].as_array().unwrap().len(), 9);
        assert_eq!(json["active"], true);
    }
}
