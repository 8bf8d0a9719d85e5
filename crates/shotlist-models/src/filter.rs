//! Caller-supplied post-filter over an assembled shotlist.
//!
//! The filter always runs on the complete result, so the reported buckets
//! reflect the whole video rather than the surviving shots. Shot membership
//! is decided from each shot's own lines, never from the capped bucket lists.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shot::{ShotEntry, ShotlistResult};
use crate::text::TextBucket;

/// Post-filter parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotlistFilter {
    /// Keep only shots carrying text from the included buckets
    #[serde(default)]
    pub only_with_text: bool,
    /// Buckets to report; empty means all buckets
    #[serde(default)]
    pub include_buckets: Vec<TextBucket>,
}

impl ShotlistFilter {
    pub fn new(only_with_text: bool, include_buckets: Vec<TextBucket>) -> Self {
        Self {
            only_with_text,
            include_buckets,
        }
    }

    /// Whether the filter leaves a result untouched.
    pub fn is_noop(&self) -> bool {
        !self.only_with_text && self.include_buckets.is_empty()
    }

    fn includes(&self, bucket: TextBucket) -> bool {
        self.include_buckets.is_empty() || self.include_buckets.contains(&bucket)
    }

    /// Apply the filter to a fully assembled result.
    ///
    /// `classify` maps one shot line to its bucket.
    ///
    /// - `only_with_text` drops shots with no line belonging to an included
    ///   bucket (any non-empty text when no buckets are listed).
    /// - A non-empty `include_buckets` empties the other buckets.
    pub fn apply<F>(&self, mut result: ShotlistResult, classify: F) -> ShotlistResult
    where
        F: Fn(&str) -> TextBucket,
    {
        if self.is_noop() {
            return result;
        }

        if self.only_with_text {
            result
                .shots
                .retain(|shot| self.shot_has_included_text(shot, &classify));
        }

        if !self.include_buckets.is_empty() {
            for bucket in TextBucket::ALL {
                if !self.includes(bucket) {
                    result.text_buckets.clear(bucket);
                }
            }
        }

        result
    }

    fn shot_has_included_text<F>(&self, shot: &ShotEntry, classify: &F) -> bool
    where
        F: Fn(&str) -> TextBucket,
    {
        if self.include_buckets.is_empty() {
            return !shot.text.is_empty();
        }
        shot.text.iter().any(|line| self.includes(classify(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextBuckets;

    fn by_case(line: &str) -> TextBucket {
        if line.chars().any(|c| c.is_ascii_lowercase()) {
            TextBucket::LowerThirds
        } else {
            TextBucket::Titles
        }
    }

    fn shot(index: usize, text: &[&str]) -> ShotEntry {
        ShotEntry {
            index,
            tc_in: "00:00:00:00".to_string(),
            tc_out: "00:00:01:00".to_string(),
            text: text.iter().map(|s| s.to_string()).collect(),
            still: None,
        }
    }

    fn sample_result() -> ShotlistResult {
        let mut buckets = TextBuckets::default();
        buckets.insert(TextBucket::Titles, "WARNER PRESENTS", 50);
        buckets.insert(TextBucket::LowerThirds, "Jane Doe", 50);
        ShotlistResult {
            duration_seconds: 10.0,
            used_threshold: 0.35,
            shots: vec![
                shot(1, &["WARNER PRESENTS"]),
                shot(2, &["Jane Doe"]),
                shot(3, &[]),
            ],
            text_buckets: buckets,
        }
    }

    #[test]
    fn test_noop_filter_keeps_everything() {
        let result = ShotlistFilter::default().apply(sample_result(), by_case);
        assert_eq!(result, sample_result());
    }

    #[test]
    fn test_only_with_text_without_buckets() {
        let result = ShotlistFilter::new(true, vec![]).apply(sample_result(), by_case);
        let indices: Vec<usize> = result.shots.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(result.text_buckets.len(), 2);
    }

    #[test]
    fn test_only_with_text_restricted_to_bucket() {
        let result =
            ShotlistFilter::new(true, vec![TextBucket::Titles]).apply(sample_result(), by_case);
        let indices: Vec<usize> = result.shots.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1]);
        assert!(result.text_buckets.lower_thirds.is_empty());
        assert_eq!(result.text_buckets.titles, vec!["WARNER PRESENTS"]);
    }

    #[test]
    fn test_include_buckets_alone_keeps_all_shots() {
        let result =
            ShotlistFilter::new(false, vec![TextBucket::LowerThirds]).apply(sample_result(), by_case);
        assert_eq!(result.shots.len(), 3);
        assert!(result.text_buckets.titles.is_empty());
        assert_eq!(result.text_buckets.lower_thirds, vec!["Jane Doe"]);
    }

    #[test]
    fn test_filter_deserializes_from_camel_case() {
        let filter: ShotlistFilter =
            serde_json::from_str(r#"{"onlyWithText": true, "includeBuckets": ["titles"]}"#)
                .unwrap();
        assert!(filter.only_with_text);
        assert_eq!(filter.include_buckets, vec![TextBucket::Titles]);
    }

    #[test]
    fn test_membership_ignores_bucket_cap() {
        let mut buckets = TextBuckets::default();
        buckets.insert(TextBucket::Titles, "WARNER PRESENTS", 1);
        buckets.insert(TextBucket::Titles, "A FILM BY JANE DOE", 1);
        let result = ShotlistResult {
            duration_seconds: 10.0,
            used_threshold: 0.35,
            shots: vec![
                shot(1, &["WARNER PRESENTS"]),
                shot(2, &["Jane Doe"]),
                shot(3, &["A FILM BY JANE DOE"]),
            ],
            text_buckets: buckets,
        };

        let result = ShotlistFilter::new(true, vec![TextBucket::Titles]).apply(result, by_case);
        let indices: Vec<usize> = result.shots.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(result.text_buckets.get(TextBucket::Titles), ["WARNER PRESENTS"]);
    }
}
