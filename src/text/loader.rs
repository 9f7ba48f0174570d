use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::session::settings::QuoteLength;
use crate::text::{Quote, TextError, TextSource};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextRequest {
    Words(String),
    Quotes(QuoteLength),
}

#[derive(Debug)]
pub enum TextLoaded {
    Words {
        difficulty: String,
        result: Result<Vec<String>, TextError>,
    },
    Quotes {
        length: QuoteLength,
        result: Result<Vec<Quote>, TextError>,
    },
}

/// Reads text resources off the input thread.
pub struct TextLoader {
    tx: mpsc::Sender<TextRequest>,
    rx: mpsc::Receiver<TextLoaded>,
}

impl TextLoader {
    pub fn spawn(source: Box<dyn TextSource>) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<TextRequest>();
        let (done_tx, done_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(request) = req_rx.recv() {
                debug!(?request, "loading text");
                let loaded = match request {
                    TextRequest::Words(difficulty) => TextLoaded::Words {
                        result: source.word_pool(&difficulty),
                        difficulty,
                    },
                    TextRequest::Quotes(length) => TextLoaded::Quotes {
                        length,
                        result: source.quotes(length),
                    },
                };
                if done_tx.send(loaded).is_err() {
                    return;
                }
            }
        });

        Self {
            tx: req_tx,
            rx: done_rx,
        }
    }

    pub fn request(&self, request: TextRequest) {
        if self.tx.send(request).is_err() {
            warn!("text loader stopped");
        }
    }

    pub fn drain(&self) -> Vec<TextLoaded> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TextLoaded> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EmbeddedText;

    #[test]
    fn test_loads_bundled_pool() {
        let loader = TextLoader::spawn(Box::new(EmbeddedText::bundled_only()));
        loader.request(TextRequest::Words("easy".to_string()));

        match loader.recv_timeout(Duration::from_secs(5)) {
            Some(TextLoaded::Words { difficulty, result }) => {
                assert_eq!(difficulty, "easy");
                assert!(!result.unwrap().is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_pool_reports_error() {
        let loader = TextLoader::spawn(Box::new(EmbeddedText::bundled_only()));
        loader.request(TextRequest::Words("klingon".to_string()));

        match loader.recv_timeout(Duration::from_secs(5)) {
            Some(TextLoaded::Words { result, .. }) => assert!(result.is_err()),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
