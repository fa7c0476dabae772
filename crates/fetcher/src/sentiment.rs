//! Lexicon-based sentiment scorer for free text.
//!
//! AFINN-style word-polarity lookup with negation and intensifier
//! handling, with a lexicon curated for tech/community discussions.
//! Pure and deterministic; this is the core unit-testable algorithm of
//! the whole pipeline.

use std::collections::HashMap;
use std::sync::OnceLock;

#[rustfmt::skip]
static LEXICON: &[(&str, f64)] = &[
    // Negative words
    ("abandon", -2.0), ("abandoned", -2.0), ("abuse", -3.0), ("abused", -3.0),
    ("annoying", -2.0), ("annoyed", -2.0), ("awful", -3.0), ("bad", -3.0),
    ("broke", -2.0), ("broken", -3.0), ("bug", -2.0), ("buggy", -3.0),
    ("crap", -3.0), ("crash", -2.0), ("crashed", -3.0), ("crashes", -2.0),
    ("critical", -2.0), ("damn", -2.0), ("dead", -2.0), ("deprecated", -1.0),
    ("difficult", -1.0), ("disappointing", -2.0), ("disappointed", -2.0),
    ("disaster", -3.0), ("dislike", -2.0), ("downgrade", -2.0), ("error", -2.0),
    ("errors", -2.0), ("fail", -2.0), ("failed", -2.0), ("failing", -2.0),
    ("failure", -2.0), ("fault", -2.0), ("freeze", -2.0), ("freezes", -2.0),
    ("frustrating", -3.0), ("frustrated", -3.0), ("glitch", -2.0), ("glitchy", -2.0),
    ("hate", -3.0), ("horrible", -3.0), ("impossible", -2.0), ("incompatible", -2.0),
    ("inconvenient", -2.0), ("issue", -1.0), ("issues", -1.0), ("lack", -1.0),
    ("lag", -2.0), ("laggy", -2.0), ("mess", -2.0), ("messy", -2.0),
    ("missing", -1.0), ("nightmare", -3.0), ("obsolete", -2.0), ("outdated", -1.0),
    ("pain", -2.0), ("painful", -2.0), ("poor", -2.0), ("problem", -2.0),
    ("problems", -2.0), ("regret", -2.0), ("remove", -1.0), ("removed", -1.0),
    ("risky", -2.0), ("sad", -2.0), ("security", -1.0), ("shit", -4.0),
    ("slow", -2.0), ("sucks", -3.0), ("terrible", -3.0), ("trouble", -2.0),
    ("ugly", -2.0), ("unable", -2.0), ("unacceptable", -3.0), ("unavailable", -1.0),
    ("unstable", -2.0), ("unusable", -3.0), ("useless", -3.0), ("virus", -3.0),
    ("vulnerable", -2.0), ("warning", -1.0), ("waste", -2.0), ("wasted", -2.0),
    ("weak", -2.0), ("worst", -3.0), ("wrong", -2.0),
    // Positive words
    ("amazing", 4.0), ("awesome", 4.0), ("beautiful", 3.0), ("best", 3.0),
    ("better", 2.0), ("brilliant", 4.0), ("clean", 2.0), ("cool", 2.0),
    ("correct", 1.0), ("easy", 2.0), ("elegant", 3.0), ("excellent", 3.0),
    ("excited", 3.0), ("fantastic", 4.0), ("fast", 2.0), ("favorite", 2.0),
    ("fine", 1.0), ("fix", 1.0), ("fixed", 2.0), ("free", 1.0),
    ("glad", 2.0), ("good", 2.0), ("great", 3.0), ("happy", 3.0),
    ("helpful", 2.0), ("impressed", 3.0), ("impressive", 3.0), ("improve", 2.0),
    ("improved", 2.0), ("improvement", 2.0), ("interesting", 2.0), ("like", 1.0),
    ("love", 3.0), ("loved", 3.0), ("lovely", 3.0), ("nice", 2.0),
    ("perfect", 3.0), ("pleased", 2.0), ("powerful", 2.0), ("pretty", 1.0),
    ("quick", 1.0), ("recommend", 2.0), ("reliable", 2.0), ("resolved", 2.0),
    ("responsive", 2.0), ("safe", 1.0), ("satisfactory", 1.0), ("satisfied", 2.0),
    ("secure", 2.0), ("simple", 1.0), ("sleek", 2.0), ("smooth", 2.0),
    ("solid", 2.0), ("solved", 2.0), ("stable", 2.0), ("success", 2.0),
    ("successful", 2.0), ("super", 3.0), ("thanks", 2.0), ("thank", 2.0),
    ("top", 1.0), ("update", 1.0), ("upgrade", 1.0), ("useful", 2.0),
    ("win", 2.0), ("wonderful", 3.0), ("works", 1.0), ("wow", 3.0),
    ("yay", 3.0),
];

static NEGATIONS: &[&str] = &[
    "not", "no", "don't", "doesn't", "didn't", "won't", "wouldn't", "couldn't",
    "shouldn't", "isn't", "aren't", "wasn't", "weren't", "never", "neither",
    "nobody", "nothing", "nowhere", "hardly", "barely", "scarcely",
];

#[rustfmt::skip]
static INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5), ("really", 1.5), ("extremely", 2.0), ("absolutely", 2.0),
    ("completely", 1.5), ("totally", 1.5), ("highly", 1.5), ("super", 1.5),
    ("incredibly", 2.0), ("somewhat", 0.5), ("slightly", 0.5), ("kind", 0.5),
    ("kinda", 0.5), ("pretty", 0.75),
];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| LEXICON.iter().copied().collect())
}

fn intensifiers() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| INTENSIFIERS.iter().copied().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    /// Normalized score in [-5, 5].
    pub score: f64,
    /// Score divided by token count; 0 for empty text.
    pub comparative: f64,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub tokens: usize,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Score free text against the lexicon.
///
/// Each matched word is negated (flipped and halved) when a negation
/// marker appears within the previous three tokens, then scaled by an
/// intensifier in the immediately preceding token. The accumulated sum is
/// normalized by 3 and clamped to [-5, 5].
pub fn analyze(text: &str) -> Sentiment {
    let words = tokenize(text);

    let mut total = 0.0;
    let mut positive = Vec::new();
    let mut negative = Vec::new();

    for (i, word) in words.iter().enumerate() {
        let Some(&polarity) = lexicon().get(word.as_str()) else {
            continue;
        };
        let mut word_score = polarity;

        let negated = words[i.saturating_sub(3)..i]
            .iter()
            .any(|w| NEGATIONS.contains(&w.as_str()));
        if negated {
            word_score = -word_score * 0.5;
        }

        if i > 0 {
            if let Some(&mult) = intensifiers().get(words[i - 1].as_str()) {
                word_score *= mult;
            }
        }

        total += word_score;
        if word_score > 0.0 {
            positive.push(word.clone());
        } else if word_score < 0.0 {
            negative.push(word.clone());
        }
    }

    let score = (total / 3.0).clamp(-5.0, 5.0);

    Sentiment {
        score,
        comparative: if words.is_empty() { 0.0 } else { score / words.len() as f64 },
        positive,
        negative,
        tokens: words.len(),
    }
}

/// Classification boundaries sit at exactly ±0.5.
pub fn classify(score: f64) -> SentimentClass {
    if score >= 0.5 {
        SentimentClass::Positive
    } else if score <= -0.5 {
        SentimentClass::Negative
    } else {
        SentimentClass::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        let result = analyze("");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.tokens, 0);
        assert!(result.positive.is_empty());
        assert!(result.negative.is_empty());
    }

    #[test]
    fn text_without_lexicon_matches_scores_zero() {
        let result = analyze("the quic brown fox jumps");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.tokens, 5);
    }

    #[test]
    fn positive_and_negative_words_accumulate() {
        let result = analyze("this update is great but the installer is broken");
        assert!(result.positive.contains(&"great".to_string()));
        assert!(result.negative.contains(&"broken".to_string()));
    }

    #[test]
    fn negation_flips_and_reduces_magnitude() {
        let plain = analyze("this is great");
        let negated = analyze("this is not great");
        assert!(plain.score > 0.0);
        assert!(negated.score < 0.0);
        assert!(negated.score.abs() < plain.score.abs());
    }

    #[test]
    fn negation_reaches_back_three_tokens() {
        // "not" is exactly three tokens before "good".
        let negated = analyze("not a very good experience");
        assert!(negated.score < 0.0);
    }

    #[test]
    fn intensifier_increases_magnitude() {
        let plain = analyze("this is awful");
        let intense = analyze("this is extremely awful");
        assert!(intense.score < plain.score);
        assert!(intense.score.abs() > plain.score.abs());
    }

    #[test]
    fn diminisher_reduces_magnitude() {
        let plain = analyze("it is broken");
        let soft = analyze("it is slightly broken");
        assert!(soft.score.abs() < plain.score.abs());
    }

    #[test]
    fn score_is_clamped_to_range() {
        let text = "awesome ".repeat(100);
        let result = analyze(&text);
        assert!(result.score <= 5.0);

        let text = "terrible ".repeat(100);
        let result = analyze(&text);
        assert!(result.score >= -5.0);
    }

    #[test]
    fn punctuation_is_stripped_but_apostrophes_survive() {
        let result = analyze("it's broken!!! (horrible)");
        // "it's" stays one token; "broken" and "horrible" are found
        // despite the punctuation.
        assert!(result.negative.contains(&"broken".to_string()));
        assert!(result.negative.contains(&"horrible".to_string()));
        assert_eq!(result.tokens, 3);
    }

    #[test]
    fn classify_boundaries_at_half() {
        assert_eq!(classify(0.5), SentimentClass::Positive);
        assert_eq!(classify(0.49), SentimentClass::Neutral);
        assert_eq!(classify(-0.49), SentimentClass::Neutral);
        assert_eq!(classify(-0.5), SentimentClass::Negative);
        assert_eq!(classify(0.0), SentimentClass::Neutral);
    }

    #[test]
    fn analyze_is_deterministic() {
        let text = "snap updates are really slow and frustrating";
        assert_eq!(analyze(text), analyze(text));
    }
}
