use serde::{Deserialize, Serialize};

/// Number of incorrect guesses a room gets per word.
pub const STARTING_TURNS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessStatus {
    Playing,
    Over,
}

/// Authoritative word-guessing state. The secret word never goes over
/// the wire while the game is playing; `word` is populated once the
/// game is over so clients can show it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordGuessState {
    #[serde(skip)]
    secret: String,
    pub display_word: Vec<char>,
    pub turns_left: u32,
    pub guessed_letters: Vec<char>,
    pub status: GuessStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

impl WordGuessState {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into().to_ascii_uppercase();
        let length = secret.chars().count();
        Self {
            secret,
            display_word: vec!['_'; length],
            turns_left: STARTING_TURNS,
            guessed_letters: Vec::new(),
            status: GuessStatus::Playing,
            message: format!("The word has {} letters.", length),
            hint: None,
            word: None,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Apply a letter guess. Returns false without any state change when
    /// the game is over, the letter is not a single ASCII alphabetic
    /// character, or it was guessed before.
    pub fn guess(&mut self, letter: char) -> bool {
        if self.status != GuessStatus::Playing || !letter.is_ascii_alphabetic() {
            return false;
        }

        let letter = letter.to_ascii_uppercase();
        if self.guessed_letters.contains(&letter) {
            return false;
        }

        self.guessed_letters.push(letter);

        if self.secret.contains(letter) {
            for (i, c) in self.secret.chars().enumerate() {
                if c == letter {
                    self.display_word[i] = letter;
                }
            }
            self.message = format!("Good guess! '{}' is in the word.", letter);
        } else {
            self.turns_left = self.turns_left.saturating_sub(1);
            self.message = format!("Sorry, '{}' is not in the word.", letter);
        }

        // Full reveal wins even on the last turn, so it is checked first.
        if !self.display_word.contains(&'_') {
            self.status = GuessStatus::Over;
            self.message = format!("Congratulations! You guessed the word: {}", self.secret);
            self.word = Some(self.secret.clone());
        } else if self.turns_left == 0 {
            self.status = GuessStatus::Over;
            self.message = format!("You ran out of turns. The word was: {}", self.secret);
            self.word = Some(self.secret.clone());
        }

        true
    }

    /// Attach a hint from the external generator. Side channel only:
    /// guesses, turns and status are untouched.
    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = Some(hint.into());
    }
}
