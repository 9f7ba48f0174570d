use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::generator::generate;
use crate::generator::stream::WordStream;
use crate::session::settings::{QuoteLength, Settings, TestMode};
use crate::text::loader::{TextLoaded, TextRequest};
use crate::text::normalize::normalize_text;
use crate::text::Quote;

/// A ready-to-type target for one test.
#[derive(Clone, Debug)]
pub struct PreparedText {
    pub target: String,
    /// Present for modes that extend their target while typing.
    pub stream: Option<WordStream>,
    pub attribution: Option<String>,
}

/// Cache of loaded pools and quotes. Missing data is requested once and generation is
/// deferred until it arrives.
pub struct TextSupply {
    pools: HashMap<String, Vec<String>>,
    quotes: HashMap<QuoteLength, Vec<Quote>>,
    requested: HashSet<TextRequest>,
    outbox: Vec<TextRequest>,
    rng: SmallRng,
}

impl TextSupply {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            pools: HashMap::new(),
            quotes: HashMap::new(),
            requested: HashSet::new(),
            outbox: Vec::new(),
            rng,
        }
    }

    /// Build a target for `settings`, or `None` while the needed data is still loading.
    pub fn prepare(&mut self, settings: &Settings) -> Option<PreparedText> {
        match settings.mode {
            TestMode::Time | TestMode::Zen => {
                let pool = self.pool(&settings.difficulty)?.clone();
                let rng = SmallRng::seed_from_u64(self.rng.next_u64());
                let mut stream = WordStream::new(pool, settings.word_options(), rng);
                Some(PreparedText {
                    target: stream.next_batch(),
                    stream: Some(stream),
                    attribution: None,
                })
            }
            TestMode::Words => {
                let pool = self.pool(&settings.difficulty)?.clone();
                let target = generate(
                    settings.word_target,
                    &pool,
                    settings.word_options(),
                    &mut self.rng,
                );
                Some(PreparedText {
                    target,
                    stream: None,
                    attribution: None,
                })
            }
            TestMode::Quote => {
                let length = settings.quote_length;
                if !self.quotes.contains_key(&length) {
                    self.request(TextRequest::Quotes(length));
                    return None;
                }
                let quotes = self.quotes.get(&length)?;
                let picked = if quotes.is_empty() {
                    None
                } else {
                    Some(&quotes[self.rng.gen_range(0..quotes.len())])
                };
                Some(PreparedText {
                    target: picked.map(|q| normalize_text(&q.quote)).unwrap_or_default(),
                    stream: None,
                    attribution: picked.and_then(Quote::attribution),
                })
            }
            TestMode::Preset => Some(PreparedText {
                target: settings
                    .preset_text
                    .as_deref()
                    .map(normalize_text)
                    .unwrap_or_default(),
                stream: None,
                attribution: None,
            }),
        }
    }

    fn pool(&mut self, difficulty: &str) -> Option<&Vec<String>> {
        if !self.pools.contains_key(difficulty) {
            self.request(TextRequest::Words(difficulty.to_string()));
            return None;
        }
        self.pools.get(difficulty)
    }

    fn request(&mut self, request: TextRequest) {
        if self.requested.insert(request.clone()) {
            debug!(?request, "text not loaded yet");
            self.outbox.push(request);
        }
    }

    /// Loads queued by `prepare` since the last call.
    pub fn take_requests(&mut self) -> Vec<TextRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Store a loader result. Failures are cached as empty so they are not requested again.
    pub fn apply(&mut self, loaded: TextLoaded) {
        match loaded {
            TextLoaded::Words { difficulty, result } => {
                let words = result.unwrap_or_else(|err| {
                    warn!(difficulty = %difficulty, error = %err, "word pool unavailable");
                    Vec::new()
                });
                self.pools.insert(difficulty, words);
            }
            TextLoaded::Quotes { length, result } => {
                let quotes = result.unwrap_or_else(|err| {
                    warn!(length = length.as_key(), error = %err, "quotes unavailable");
                    Vec::new()
                });
                self.quotes.insert(length, quotes);
            }
        }
    }

    pub fn insert_pool(&mut self, difficulty: &str, words: Vec<String>) {
        self.pools.insert(difficulty.to_string(), words);
    }

    pub fn insert_quotes(&mut self, length: QuoteLength, quotes: Vec<Quote>) {
        self.quotes.insert(length, quotes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::stream::STREAM_BATCH;
    use crate::text::TextError;

    fn supply() -> TextSupply {
        TextSupply::new(SmallRng::seed_from_u64(11))
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_missing_pool_defers_and_requests_once() {
        let mut supply = supply();
        let settings = Settings::default();
        assert!(supply.prepare(&settings).is_none());
        assert!(supply.prepare(&settings).is_none());
        assert_eq!(
            supply.take_requests(),
            vec![TextRequest::Words("normal".to_string())]
        );
        assert!(supply.take_requests().is_empty());
    }

    #[test]
    fn test_time_mode_streams_initial_batch() {
        let mut supply = supply();
        supply.insert_pool("normal", words(&["aa", "bb", "cc"]));
        let prepared = supply.prepare(&Settings::default()).unwrap();
        assert_eq!(prepared.target.split(' ').count(), STREAM_BATCH);
        assert!(prepared.stream.is_some());
    }

    #[test]
    fn test_words_mode_uses_word_target() {
        let mut supply = supply();
        supply.insert_pool("easy", words(&["aa", "bb"]));
        let settings = Settings {
            mode: TestMode::Words,
            word_target: 7,
            difficulty: "easy".to_string(),
            ..Settings::default()
        };
        let prepared = supply.prepare(&settings).unwrap();
        assert_eq!(prepared.target.split(' ').count(), 7);
        assert!(prepared.stream.is_none());
    }

    #[test]
    fn test_quote_is_normalized_with_attribution() {
        let mut supply = supply();
        supply.insert_quotes(
            QuoteLength::Short,
            vec![Quote {
                quote: "  Know\nthyself. ".to_string(),
                author: Some("Socrates".to_string()),
                source: None,
                date: None,
            }],
        );
        let settings = Settings {
            mode: TestMode::Quote,
            quote_length: QuoteLength::Short,
            ..Settings::default()
        };
        let prepared = supply.prepare(&settings).unwrap();
        assert_eq!(prepared.target, "Know thyself.");
        assert_eq!(prepared.attribution.as_deref(), Some("Socrates"));
    }

    #[test]
    fn test_failed_load_yields_empty_target() {
        let mut supply = supply();
        let settings = Settings {
            mode: TestMode::Words,
            ..Settings::default()
        };
        assert!(supply.prepare(&settings).is_none());
        supply.apply(TextLoaded::Words {
            difficulty: "normal".to_string(),
            result: Err(TextError::NotFound("words/normal.json".to_string())),
        });
        let prepared = supply.prepare(&settings).unwrap();
        assert_eq!(prepared.target, "");
    }

    #[test]
    fn test_preset_needs_no_loading() {
        let mut supply = supply();
        let settings = Settings {
            mode: TestMode::Preset,
            preset_text: Some("hello   there".to_string()),
            ..Settings::default()
        };
        assert_eq!(supply.prepare(&settings).unwrap().target, "hello there");
        assert!(supply.take_requests().is_empty());
    }
}
