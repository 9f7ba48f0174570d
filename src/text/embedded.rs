use std::fs;
use std::path::PathBuf;

use rust_embed::Embed;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::session::settings::QuoteLength;
use crate::text::{Manifest, Quote, TextError, TextSource};

#[derive(Embed)]
#[folder = "assets/text/"]
struct TextAssets;

/// Bundled word lists and quotes, with files in a user directory taking precedence.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedText {
    user_dir: Option<PathBuf>,
}

impl EmbeddedText {
    pub fn new() -> Self {
        Self {
            user_dir: dirs::data_dir().map(|d| d.join("keypace").join("text")),
        }
    }

    pub fn bundled_only() -> Self {
        Self { user_dir: None }
    }

    pub fn with_user_dir(user_dir: PathBuf) -> Self {
        Self {
            user_dir: Some(user_dir),
        }
    }

    fn read(&self, name: &str) -> Result<String, TextError> {
        if let Some(dir) = &self.user_dir {
            let path = dir.join(name);
            if let Ok(content) = fs::read_to_string(&path) {
                debug!(path = %path.display(), "using user text file");
                return Ok(content);
            }
        }

        TextAssets::get(name)
            .and_then(|file| String::from_utf8(file.data.into_owned()).ok())
            .ok_or_else(|| TextError::NotFound(name.to_string()))
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, TextError> {
        let content = self.read(name)?;
        serde_json::from_str(&content).map_err(|source| TextError::Parse {
            name: name.to_string(),
            source,
        })
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl TextSource for EmbeddedText {
    fn word_pool(&self, difficulty: &str) -> Result<Vec<String>, TextError> {
        if !is_valid_key(difficulty) {
            return Err(TextError::NotFound(difficulty.to_string()));
        }
        let words: Vec<String> = self.read_json(&format!("words/{difficulty}.json"))?;
        Ok(words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty() && !w.contains(char::is_whitespace))
            .collect())
    }

    fn quotes(&self, length: QuoteLength) -> Result<Vec<Quote>, TextError> {
        let quotes: Vec<Quote> = self.read_json(&format!("quotes/{}.json", length.as_key()))?;
        Ok(quotes
            .into_iter()
            .filter(|q| !q.quote.trim().is_empty())
            .collect())
    }

    fn manifest(&self) -> Result<Manifest, TextError> {
        self.read_json("manifest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_manifest_lists_available_pools() {
        let source = EmbeddedText::bundled_only();
        let manifest = source.manifest().unwrap();
        assert!(!manifest.difficulties.is_empty());
        for difficulty in &manifest.difficulties {
            let pool = source.word_pool(difficulty).unwrap();
            assert!(!pool.is_empty(), "empty pool {difficulty}");
        }
        for key in &manifest.quote_lengths {
            let length = QuoteLength::from_key(key).unwrap();
            assert!(!source.quotes(length).unwrap().is_empty(), "no {key} quotes");
        }
    }

    #[test]
    fn test_unknown_difficulty_not_found() {
        let source = EmbeddedText::bundled_only();
        assert!(matches!(
            source.word_pool("nonexistent"),
            Err(TextError::NotFound(_))
        ));
        assert!(matches!(
            source.word_pool("../manifest"),
            Err(TextError::NotFound(_))
        ));
    }

    #[test]
    fn test_user_file_overrides_bundled() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("words")).unwrap();
        fs::write(dir.path().join("words/easy.json"), r#"["zzz", " yy ", ""]"#).unwrap();

        let source = EmbeddedText::with_user_dir(dir.path().to_path_buf());
        assert_eq!(source.word_pool("easy").unwrap(), vec!["zzz", "yy"]);
        assert!(!source.word_pool("normal").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_user_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("quotes")).unwrap();
        fs::write(dir.path().join("quotes/short.json"), "[{").unwrap();

        let source = EmbeddedText::with_user_dir(dir.path().to_path_buf());
        assert!(matches!(
            source.quotes(QuoteLength::Short),
            Err(TextError::Parse { .. })
        ));
    }
}
