use std::time::Duration;
use rand::seq::SliceRandom;
use serde_json::json;

use crate::error::{RelayError, Result};

const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

const WORD_PROMPT: &str = "Generate a single, common English word for a word guessing game. \
                           The word should be between 5 and 10 letters long.";

pub const FALLBACK_HINT: &str = "No hint available right now. Keep guessing!";

/// Local word list used whenever the external generator is disabled,
/// times out, or returns garbage. A category is drawn uniformly first,
/// then a word within it.
const FALLBACK_WORDS: &[&[&str]] = &[
    // easy
    &["MOUSE", "SCREEN", "PYTHON", "LAPTOP", "SERVER"],
    // medium
    &["COMPUTER", "KEYBOARD", "VARIABLE", "FUNCTION", "COMPILER"],
    // hard
    &["PROGRAMMING", "DEVELOPER", "ALGORITHM", "RECURSION", "CONCURRENCY"],
];

#[derive(Debug, Clone)]
pub struct WordGenConfig {
    pub api_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl WordGenConfig {
    pub fn from_env() -> Option<Self> {
        let enabled = std::env::var("WORDGEN_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        if !enabled {
            return None;
        }

        let api_key = match std::env::var("WORDGEN_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("WORDGEN_ENABLED set but WORDGEN_API_KEY missing, using fallback words");
                return None;
            }
        };

        let api_url = std::env::var("WORDGEN_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let request_timeout_secs = std::env::var("WORDGEN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        Some(Self {
            api_url,
            api_key,
            request_timeout_secs,
        })
    }
}

/// Source of secret words and hints. Wraps the external text-generation
/// API; every public operation falls back locally and never fails.
pub struct WordSource {
    config: Option<WordGenConfig>,
    client: Option<reqwest::Client>,
}

impl WordSource {
    pub fn new(config: Option<WordGenConfig>) -> Self {
        let client = config.as_ref().and_then(|config| {
            match reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
            {
                Ok(client) => {
                    tracing::info!(api_url = %config.api_url, "Word generation client initialized");
                    Some(client)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create HTTP client, using fallback words");
                    None
                }
            }
        });

        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(WordGenConfig::from_env())
    }

    /// Fallback-only source, used in tests and when no API key is set.
    pub fn disabled() -> Self {
        Self {
            config: None,
            client: None,
        }
    }

    /// Pick a word from the local list: uniform across categories, then
    /// uniform within the category.
    pub fn fallback_word() -> String {
        let mut rng = rand::thread_rng();
        FALLBACK_WORDS
            .choose(&mut rng)
            .and_then(|category| category.choose(&mut rng))
            .unwrap_or(&"KEYBOARD")
            .to_string()
    }

    /// A fresh secret word, uppercase alphabetic. Falls back to the
    /// local list on any generator failure.
    pub async fn generate_word(&self) -> String {
        match self.request_text(WORD_PROMPT).await {
            Ok(text) => {
                let word: String = text
                    .chars()
                    .filter(|c| c.is_ascii_alphabetic())
                    .map(|c| c.to_ascii_uppercase())
                    .collect();

                if (3..=12).contains(&word.len()) {
                    tracing::debug!(word_len = word.len(), "Generated word via API");
                    word
                } else {
                    tracing::warn!("API returned an unusable word, using fallback list");
                    Self::fallback_word()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Word generation failed, using fallback list");
                Self::fallback_word()
            }
        }
    }

    /// A one-sentence hint that does not reveal the word. Never empty:
    /// falls back to a static placeholder on any failure.
    pub async fn generate_hint(&self, word: &str) -> String {
        let prompt = format!(
            "Provide a one-sentence, non-obvious hint for the word \"{}\". \
             Do not use the word itself in the hint.",
            word.to_lowercase()
        );

        match self.request_text(&prompt).await {
            Ok(text) => {
                let hint = text.trim().to_string();
                if hint.is_empty() {
                    tracing::warn!("API returned an empty hint, using fallback");
                    FALLBACK_HINT.to_string()
                } else {
                    hint
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hint generation failed, using fallback");
                FALLBACK_HINT.to_string()
            }
        }
    }

    async fn request_text(&self, prompt: &str) -> Result<String> {
        let (config, client) = match (&self.config, &self.client) {
            (Some(config), Some(client)) => (config, client),
            _ => return Err(RelayError::wordgen("generator disabled")),
        };

        let url = format!("{}?key={}", config.api_url, config.api_key);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "text/plain" }
        });

        let response = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::wordgen(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RelayError::wordgen(format!(
                "unexpected status: {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RelayError::wordgen(format!("invalid response body: {}", e)))?;

        payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| RelayError::wordgen("response missing generated text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_word_is_uppercase_alphabetic() {
        for _ in 0..50 {
            let word = WordSource::fallback_word();
            assert!(word.chars().all(|c| c.is_ascii_uppercase()));
            assert!(word.len() >= 5);
        }
    }

    #[test]
    fn test_fallback_word_comes_from_the_list() {
        let word = WordSource::fallback_word();
        assert!(FALLBACK_WORDS
            .iter()
            .any(|category| category.contains(&word.as_str())));
    }

    #[tokio::test]
    async fn test_disabled_source_falls_back_for_words() {
        let source = WordSource::disabled();
        let word = source.generate_word().await;
        assert!(FALLBACK_WORDS
            .iter()
            .any(|category| category.contains(&word.as_str())));
    }

    #[tokio::test]
    async fn test_disabled_source_hint_never_empty() {
        let source = WordSource::disabled();
        let hint = source.generate_hint("KEYBOARD").await;
        assert_eq!(hint, FALLBACK_HINT);
        assert!(!hint.is_empty());
    }
}
