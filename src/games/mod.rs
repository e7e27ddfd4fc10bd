pub mod tic_tac_toe;
pub mod word_guess;

pub use tic_tac_toe::TicTacToeState;
pub use word_guess::{GuessStatus, WordGuessState};
