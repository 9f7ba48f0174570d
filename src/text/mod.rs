pub mod embedded;
pub mod loader;
pub mod normalize;
pub mod supply;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::settings::QuoteLength;

pub use embedded::EmbeddedText;
pub use loader::{TextLoaded, TextLoader, TextRequest};
pub use supply::{PreparedText, TextSupply};

#[derive(Debug, Error)]
pub enum TextError {
    #[error("text resource not found: {0}")]
    NotFound(String),

    #[error("failed to parse {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl Quote {
    /// "author, source (date)" with whichever parts are present.
    pub fn attribution(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(author) = self.author.as_deref() {
            parts.push(author);
        }
        if let Some(source) = self.source.as_deref() {
            parts.push(source);
        }
        if parts.is_empty() {
            return None;
        }
        let mut line = parts.join(", ");
        if let Some(date) = self.date.as_deref() {
            line.push_str(&format!(" ({date})"));
        }
        Some(line)
    }
}

/// Word pool used when a requested difficulty is not served.
pub const DEFAULT_DIFFICULTY: &str = "normal";

/// Keys a text source can serve.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub difficulties: Vec<String>,
    #[serde(default)]
    pub quote_lengths: Vec<String>,
}

impl Manifest {
    /// `key` when the manifest lists it, otherwise the default pool (or the first listed one).
    /// An empty manifest accepts every key.
    pub fn difficulty_or_default<'a>(&'a self, key: &'a str) -> &'a str {
        if self.difficulties.is_empty() || self.difficulties.iter().any(|d| d == key) {
            return key;
        }
        self.difficulties
            .iter()
            .find(|d| *d == DEFAULT_DIFFICULTY)
            .or(self.difficulties.first())
            .map_or(key, String::as_str)
    }
}

/// Word pools and quotes. Implementations may block; they run on the loader thread.
pub trait TextSource: Send {
    fn word_pool(&self, difficulty: &str) -> Result<Vec<String>, TextError>;
    fn quotes(&self, length: QuoteLength) -> Result<Vec<Quote>, TextError>;
    fn manifest(&self) -> Result<Manifest, TextError>;
}
