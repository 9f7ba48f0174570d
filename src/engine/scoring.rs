use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound on elapsed minutes used for wpm, keeps the first keystrokes from exploding the rate.
pub const MIN_ELAPSED_MINUTES: f64 = 0.01;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub correct: usize,
    pub incorrect: usize,
    pub missed: usize,
    pub extra: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    Incorrect,
    Missed,
    Extra,
}

/// One scored position. `ch` is the typed char, except for `Missed` where it is the expected one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharMark {
    pub ch: char,
    pub class: CharClass,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMismatch {
    pub typed: String,
    pub expected: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordResults {
    pub correct_words: Vec<String>,
    pub incorrect_words: Vec<WordMismatch>,
}

/// Word-aligned walk over typed and target text. Both are split on single spaces and compared
/// index by index; the last typed element is the word still being typed.
fn walk(typed: &str, target: &str, mut mark: impl FnMut(CharMark)) {
    let typed_words: Vec<Vec<char>> = typed.split(' ').map(|w| w.chars().collect()).collect();
    let target_words: Vec<Vec<char>> = target.split(' ').map(|w| w.chars().collect()).collect();
    let last = typed_words.len() - 1;

    for (i, word) in typed_words.iter().enumerate() {
        let reference: &[char] = target_words.get(i).map(Vec::as_slice).unwrap_or(&[]);

        if i == last {
            for (j, &ch) in word.iter().enumerate() {
                let class = match reference.get(j) {
                    Some(&expected) if expected == ch => CharClass::Correct,
                    Some(_) => CharClass::Incorrect,
                    None => CharClass::Extra,
                };
                mark(CharMark { ch, class });
            }
            break;
        }

        for j in 0..word.len().max(reference.len()) {
            let scored = match (word.get(j), reference.get(j)) {
                (Some(&ch), Some(&expected)) if ch == expected => CharMark {
                    ch,
                    class: CharClass::Correct,
                },
                (Some(&ch), Some(_)) => CharMark {
                    ch,
                    class: CharClass::Incorrect,
                },
                (None, Some(&expected)) => CharMark {
                    ch: expected,
                    class: CharClass::Missed,
                },
                (Some(&ch), None) => CharMark {
                    ch,
                    class: CharClass::Extra,
                },
                (None, None) => continue,
            };
            mark(scored);
        }

        // The space after a completed word. At the end of the target only a single trailing
        // space is accepted; anything typed past it is extra.
        let class = if i >= target_words.len() {
            CharClass::Extra
        } else if target_words.get(i + 1).is_some() {
            if word.len() >= reference.len() {
                CharClass::Correct
            } else {
                CharClass::Incorrect
            }
        } else if typed_words.len() == i + 2 && typed_words[i + 1].is_empty() {
            CharClass::Correct
        } else {
            CharClass::Extra
        };
        mark(CharMark { ch: ' ', class });
    }
}

pub fn score(typed: &str, target: &str) -> Stats {
    let mut stats = Stats::default();
    walk(typed, target, |m| match m.class {
        CharClass::Correct => stats.correct += 1,
        CharClass::Incorrect => stats.incorrect += 1,
        CharClass::Missed => stats.missed += 1,
        CharClass::Extra => stats.extra += 1,
    });
    stats
}

pub fn char_marks(typed: &str, target: &str) -> Vec<CharMark> {
    let mut marks = Vec::with_capacity(typed.len());
    walk(typed, target, |m| marks.push(m));
    marks
}

pub fn word_results(typed: &str, target: &str) -> WordResults {
    let expected_words: Vec<&str> = target.split(' ').collect();
    let mut results = WordResults::default();

    for (i, word) in typed.split_whitespace().enumerate() {
        let Some(&expected) = expected_words.get(i) else {
            continue;
        };
        if expected.is_empty() {
            continue;
        }
        if word == expected {
            results.correct_words.push(word.to_string());
        } else {
            results.incorrect_words.push(WordMismatch {
                typed: word.to_string(),
                expected: expected.to_string(),
            });
        }
    }

    results
}

pub fn accuracy(correct: usize, typed_len: usize) -> f64 {
    if typed_len == 0 {
        return 100.0;
    }
    correct as f64 / typed_len as f64 * 100.0
}

pub fn wpm(typed_len: usize, elapsed: Duration) -> f64 {
    let minutes = (elapsed.as_secs_f64() / 60.0).max(MIN_ELAPSED_MINUTES);
    (typed_len as f64 / 5.0) / minutes
}
