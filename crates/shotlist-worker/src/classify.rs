//! Text classification into semantic buckets.
//!
//! Rules are tried in order and the first match wins:
//! 1. titles: a production/marketing marker, or an unusually long line
//! 2. locations: a region code token, or a trailing `, XX` region suffix
//! 3. lowerThirds: short lines (four words or fewer)
//! 4. other

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use shotlist_media::ocr::DEFAULT_MIN_LINE_LEN;
use shotlist_models::{TextBucket, TextBuckets, TextLine, DEFAULT_BUCKET_CAP};

/// Lines longer than this are treated as title cards.
pub const DEFAULT_TITLE_MAX_LEN: usize = 45;

/// Lines with at most this many words are lower-thirds.
const LOWER_THIRD_MAX_WORDS: usize = 4;

static TITLE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(PRESENTS|A FILM( BY)?|PRODUCTIONS?|PRODUCED BY|DIRECTED BY|IN ASSOCIATION WITH|STARRING)\b",
    )
    .unwrap()
});

static REGION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S.*,\s*[A-Z]{2}$").unwrap());

/// Two-letter region codes recognized as standalone tokens.
///
/// US states, DC and common country codes. Codes that double as everyday
/// English words (IN, OR, ME, HI, OK, IT, US, NO, IS, AT, BE, MY, TO, DO,
/// SO, ON, AN, AM, GO) are left out; they still count in the `, XX` form.
static REGION_CODES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        // US states and DC
        "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "IA", "ID", "IL", "KS",
        "KY", "LA", "MA", "MD", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ", "NM",
        "NV", "NY", "OH", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA", "WI", "WV",
        "WY",
        // Countries
        "UK", "GB", "FR", "ES", "MX", "JP", "CN", "KR", "AU", "NZ", "BR", "CL", "PE", "ZA",
        "NG", "KE", "EG", "SE", "DK", "FI", "NL", "CH", "PL", "PT", "GR", "IE", "TR", "RU",
        "UA", "TH", "VN", "PH", "SG", "HK", "TW", "AE", "SA",
    ])
});

/// Whitespace-normalize and trim a recognized line.
pub fn clean_line(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a cleaned line with the default title length threshold.
pub fn classify_line(line: &str) -> TextBucket {
    classify_line_with(line, DEFAULT_TITLE_MAX_LEN)
}

/// Classify a cleaned line.
pub fn classify_line_with(line: &str, title_max_len: usize) -> TextBucket {
    if TITLE_MARKERS.is_match(line) || line.chars().count() > title_max_len {
        return TextBucket::Titles;
    }
    if has_region_token(line) || REGION_SUFFIX.is_match(line) {
        return TextBucket::Locations;
    }
    if line.split_whitespace().count() <= LOWER_THIRD_MAX_WORDS {
        return TextBucket::LowerThirds;
    }
    TextBucket::Other
}

fn has_region_token(line: &str) -> bool {
    line.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| token.len() == 2 && token.chars().all(|c| c.is_ascii_uppercase()))
        .any(|token| REGION_CODES.contains(token))
}

/// Accumulates classified lines across a run.
#[derive(Debug, Clone)]
pub struct TextBucketer {
    cap: usize,
    min_line_len: usize,
    title_max_len: usize,
    buckets: TextBuckets,
}

impl Default for TextBucketer {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_CAP, DEFAULT_MIN_LINE_LEN, DEFAULT_TITLE_MAX_LEN)
    }
}

impl TextBucketer {
    pub fn new(cap: usize, min_line_len: usize, title_max_len: usize) -> Self {
        Self {
            cap,
            min_line_len,
            title_max_len,
            buckets: TextBuckets::default(),
        }
    }

    /// Clean, classify and record one line.
    ///
    /// Returns `None` for lines too short to keep. A duplicate or a line
    /// arriving at a full bucket is still classified but not recorded.
    pub fn add(&mut self, raw: &str) -> Option<TextLine> {
        let cleaned = clean_line(raw);
        if cleaned.chars().count() < self.min_line_len {
            return None;
        }
        let bucket = classify_line_with(&cleaned, self.title_max_len);
        self.buckets.insert(bucket, &cleaned, self.cap);
        Some(TextLine {
            raw: raw.to_string(),
            cleaned,
            bucket,
        })
    }

    /// Record every line of every shot, in shot order.
    pub fn add_shots(&mut self, shots: &[Vec<String>]) {
        for line in shots.iter().flatten() {
            self.add(line);
        }
    }

    pub fn buckets(&self) -> &TextBuckets {
        &self.buckets
    }

    pub fn into_buckets(self) -> TextBuckets {
        self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(classify_line("WARNER BROS. PRESENTS"), TextBucket::Titles);
        assert_eq!(classify_line("a film by Jane Doe"), TextBucket::Titles);
        assert_eq!(classify_line("Directed by Someone"), TextBucket::Titles);
        assert_eq!(classify_line("BLUE SKY PRODUCTIONS"), TextBucket::Titles);
        let long = "This sentence is comfortably longer than forty five characters";
        assert_eq!(classify_line(long), TextBucket::Titles);
    }

    #[test]
    fn test_title_marker_beats_region_code() {
        assert_eq!(classify_line("A FILM BY JANE DOE NY"), TextBucket::Titles);
        assert_eq!(classify_line("Produced by Acme, CA"), TextBucket::Titles);
    }

    #[test]
    fn test_locations() {
        assert_eq!(classify_line("LOS ANGELES, CA"), TextBucket::Locations);
        assert_eq!(classify_line("Somewhere near the lake, US"), TextBucket::Locations);
        assert_eq!(classify_line("TOKYO JP 1998"), TextBucket::Locations);
        // Lowercase tokens are not region codes
        assert_eq!(classify_line("ca va"), TextBucket::LowerThirds);
    }

    #[test]
    fn test_lower_thirds_and_other() {
        assert_eq!(classify_line("Jane Doe"), TextBucket::LowerThirds);
        assert_eq!(classify_line("JOHN SMITH, DIRECTOR"), TextBucket::LowerThirds);
        assert_eq!(classify_line("THIS IS IN OR OUT"), TextBucket::Other);
        assert_eq!(classify_line("the quick brown fox jumps"), TextBucket::Other);
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  Jane \t  Doe  "), "Jane Doe");
        assert_eq!(clean_line("\n"), "");
    }

    #[test]
    fn test_bucketer_dedups_and_skips_short_lines() {
        let mut bucketer = TextBucketer::default();
        bucketer.add_shots(&[
            vec!["Jane  Doe".to_string(), "ok".to_string()],
            vec!["Jane Doe".to_string(), "LOS ANGELES, CA".to_string()],
        ]);

        let buckets = bucketer.into_buckets();
        assert_eq!(buckets.lower_thirds, vec!["Jane Doe"]);
        assert_eq!(buckets.locations, vec!["LOS ANGELES, CA"]);
        assert!(buckets.titles.is_empty());
    }

    #[test]
    fn test_bucketer_cap() {
        let mut bucketer = TextBucketer::new(3, DEFAULT_MIN_LINE_LEN, DEFAULT_TITLE_MAX_LEN);
        for i in 0..10 {
            let line = bucketer.add(&format!("Name {}", i)).unwrap();
            assert_eq!(line.bucket, TextBucket::LowerThirds);
        }

        assert_eq!(
            bucketer.buckets().lower_thirds,
            vec!["Name 0", "Name 1", "Name 2"]
        );
    }

    #[test]
    fn test_add_reports_line() {
        let mut bucketer = TextBucketer::default();
        let line = bucketer.add(" STARRING  JANE DOE ").unwrap();
        assert_eq!(line.raw, " STARRING  JANE DOE ");
        assert_eq!(line.cleaned, "STARRING JANE DOE");
        assert_eq!(line.bucket, TextBucket::Titles);
        assert!(bucketer.add("  x ").is_none());
    }

    #[test]
    fn test_bucketer_min_line_len() {
        let mut bucketer = TextBucketer::new(DEFAULT_BUCKET_CAP, 1, DEFAULT_TITLE_MAX_LEN);
        let line = bucketer.add("OK").unwrap();
        assert_eq!(line.bucket, TextBucket::LowerThirds);
        assert_eq!(bucketer.buckets().lower_thirds, vec!["OK"]);

        let mut bucketer = TextBucketer::new(DEFAULT_BUCKET_CAP, 6, DEFAULT_TITLE_MAX_LEN);
        assert!(bucketer.add("Jane").is_none());
        assert!(bucketer.buckets().is_empty());
    }
}
