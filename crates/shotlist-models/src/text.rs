//! On-screen text lines and their semantic buckets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default maximum number of entries kept per bucket.
pub const DEFAULT_BUCKET_CAP: usize = 50;

/// Semantic role of a line of on-screen text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TextBucket {
    /// Title cards and marketing/production credits
    Titles,
    /// Short caption or name overlays
    LowerThirds,
    /// Location or region stamps
    Locations,
    /// Everything else
    Other,
}

impl TextBucket {
    /// All buckets in classification priority order.
    pub const ALL: [TextBucket; 4] = [
        TextBucket::Titles,
        TextBucket::Locations,
        TextBucket::LowerThirds,
        TextBucket::Other,
    ];

    /// Wire name of the bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextBucket::Titles => "titles",
            TextBucket::LowerThirds => "lowerThirds",
            TextBucket::Locations => "locations",
            TextBucket::Other => "other",
        }
    }
}

impl fmt::Display for TextBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a bucket name does not match any known bucket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown text bucket '{0}' (expected titles, lowerThirds, locations or other)")]
pub struct UnknownBucket(pub String);

impl FromStr for TextBucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "titles" | "title" => Ok(TextBucket::Titles),
            "lowerthirds" | "lowerthird" => Ok(TextBucket::LowerThirds),
            "locations" | "location" => Ok(TextBucket::Locations),
            "other" => Ok(TextBucket::Other),
            _ => Err(UnknownBucket(s.to_string())),
        }
    }
}

/// A single recognized line of text with its assigned bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    /// Text as returned by the recognizer
    pub raw: String,
    /// Whitespace-normalized, trimmed text
    pub cleaned: String,
    /// Assigned bucket
    pub bucket: TextBucket,
}

/// Deduplicated, order-preserving, capped lists of text per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextBuckets {
    pub titles: Vec<String>,
    pub lower_thirds: Vec<String>,
    pub locations: Vec<String>,
    pub other: Vec<String>,
}

impl TextBuckets {
    /// Entries of one bucket.
    pub fn get(&self, bucket: TextBucket) -> &[String] {
        match bucket {
            TextBucket::Titles => &self.titles,
            TextBucket::LowerThirds => &self.lower_thirds,
            TextBucket::Locations => &self.locations,
            TextBucket::Other => &self.other,
        }
    }

    fn get_mut(&mut self, bucket: TextBucket) -> &mut Vec<String> {
        match bucket {
            TextBucket::Titles => &mut self.titles,
            TextBucket::LowerThirds => &mut self.lower_thirds,
            TextBucket::Locations => &mut self.locations,
            TextBucket::Other => &mut self.other,
        }
    }

    /// Add `text` to `bucket` unless it is already present or the bucket is
    /// full. Returns `true` if the entry was added.
    pub fn insert(&mut self, bucket: TextBucket, text: &str, cap: usize) -> bool {
        let entries = self.get_mut(bucket);
        if entries.len() >= cap || entries.iter().any(|e| e == text) {
            return false;
        }
        entries.push(text.to_string());
        true
    }

    /// Empty the given bucket.
    pub fn clear(&mut self, bucket: TextBucket) {
        self.get_mut(bucket).clear();
    }

    /// Total number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.titles.len() + self.lower_thirds.len() + self.locations.len() + self.other.len()
    }

    /// Whether every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_serialization() {
        assert_eq!(
            serde_json::to_string(&TextBucket::LowerThirds).unwrap(),
            "\"lowerThirds\""
        );
        let parsed: TextBucket = serde_json::from_str("\"titles\"").unwrap();
        assert_eq!(parsed, TextBucket::Titles);
    }

    #[test]
    fn test_bucket_from_str() {
        assert_eq!("titles".parse::<TextBucket>().unwrap(), TextBucket::Titles);
        assert_eq!("lowerThirds".parse::<TextBucket>().unwrap(), TextBucket::LowerThirds);
        assert_eq!("lower_thirds".parse::<TextBucket>().unwrap(), TextBucket::LowerThirds);
        assert_eq!("Locations".parse::<TextBucket>().unwrap(), TextBucket::Locations);
        assert!("credits".parse::<TextBucket>().is_err());
    }

    #[test]
    fn test_insert_dedups_and_preserves_order() {
        let mut buckets = TextBuckets::default();
        assert!(buckets.insert(TextBucket::Other, "second line", 50));
        assert!(buckets.insert(TextBucket::Other, "first line", 50));
        assert!(!buckets.insert(TextBucket::Other, "second line", 50));
        assert_eq!(buckets.other, vec!["second line", "first line"]);
    }

    #[test]
    fn test_insert_respects_cap() {
        let mut buckets = TextBuckets::default();
        for i in 0..10 {
            buckets.insert(TextBucket::Titles, &format!("title {}", i), 3);
        }
        assert_eq!(buckets.titles.len(), 3);
        assert_eq!(buckets.titles[2], "title 2");
    }

    #[test]
    fn test_buckets_json_shape() {
        let mut buckets = TextBuckets::default();
        buckets.insert(TextBucket::LowerThirds, "Jane Doe", 50);
        let json = serde_json::to_value(&buckets).unwrap();
        assert_eq!(json["lowerThirds"][0], "Jane Doe");
        assert!(json["titles"].as_array().unwrap().is_empty());
    }
}
