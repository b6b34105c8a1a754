use serde::Serialize;
use thiserror::Error;

use crate::buckets::BucketDefinition;
use crate::dataset::JobRecord;

/// Shown instead of a share when an artist has no jobs.
pub const NO_SHARE_PLACEHOLDER: &str = "—";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Unknown bucket \"{bucket}\" for artist \"{artist}\"")]
    UnknownBucket { artist: String, bucket: String },
    #[error("Job count overflow in bucket \"{bucket}\" for artist \"{artist}\"")]
    CountOverflow { artist: String, bucket: String },
}

/// What to do with rows whose bucket code isn't in the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownBucketPolicy {
    /// Drop the row from both the series and the total.
    #[default]
    Lenient,
    /// Reject the whole selection.
    Strict,
}

/// One bar of an artist's distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketEntry {
    /// Raw bucket code (e.g. "z100+").
    pub bucket: String,
    /// Display label (e.g. "100+").
    pub label: String,
    pub jobs_count: u64,
    /// Percentage of the artist's total, unrounded. 0.0 when the total is 0.
    pub pct_share: f64,
}

/// A complete, ordered, zero-filled distribution for one artist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSeries {
    pub artist: String,
    pub entries: Vec<BucketEntry>,
    pub total: u64,
    /// Jobs in the overflow bucket.
    pub over_100: u64,
    /// Rows skipped because their bucket code was unknown.
    pub dropped: usize,
}

/// Headline numbers for the metrics row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub over_100: u64,
    pub overflow_share: String,
}

/// Project an artist's raw rows onto the bucket order.
///
/// Duplicate (artist, bucket) rows are summed. An artist with no rows gets a
/// full series of zeros. Unknown bucket codes are handled per `policy`; in
/// lenient mode they count toward neither the series nor `total`.
pub fn normalize(
    records: &[JobRecord],
    artist: &str,
    order: &BucketDefinition,
    policy: UnknownBucketPolicy,
) -> Result<ArtistSeries, ValidationError> {
    let mut counts = vec![0u64; order.len()];
    let mut dropped = 0usize;

    for record in records.iter().filter(|r| r.artist == artist) {
        let Some(idx) = order.position(&record.bucket) else {
            match policy {
                UnknownBucketPolicy::Strict => {
                    return Err(ValidationError::UnknownBucket {
                        artist: artist.to_string(),
                        bucket: record.bucket.clone(),
                    });
                }
                UnknownBucketPolicy::Lenient => {
                    dropped += 1;
                    continue;
                }
            }
        };

        counts[idx] = counts[idx].checked_add(record.jobs_count).ok_or_else(|| {
            ValidationError::CountOverflow {
                artist: artist.to_string(),
                bucket: record.bucket.clone(),
            }
        })?;
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {} row(s) with unknown bucket codes",
            artist,
            dropped
        );
    }

    let total = counts.iter().try_fold(0u64, |acc, &c| acc.checked_add(c)).ok_or_else(|| {
        ValidationError::CountOverflow {
            artist: artist.to_string(),
            bucket: "total".to_string(),
        }
    })?;

    let entries: Vec<BucketEntry> = order
        .iter()
        .zip(&counts)
        .map(|(code, &jobs_count)| BucketEntry {
            bucket: code.to_string(),
            label: order.display_label(code).to_string(),
            jobs_count,
            pct_share: share(jobs_count, total),
        })
        .collect();

    let over_100 = counts.last().copied().unwrap_or(0);

    log::debug!("{}: {} jobs across {} buckets", artist, total, entries.len());

    Ok(ArtistSeries {
        artist: artist.to_string(),
        entries,
        total,
        over_100,
        dropped,
    })
}

/// `part / total * 100`, or 0 when there is nothing to divide by.
fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Format a share for display (1 decimal), or the placeholder when undefined.
pub fn format_share(part: u64, total: u64) -> String {
    if total == 0 {
        NO_SHARE_PLACEHOLDER.to_string()
    } else {
        format!("{:.1}%", share(part, total))
    }
}

impl ArtistSeries {
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total,
            over_100: self.over_100,
            overflow_share: format_share(self.over_100, self.total),
        }
    }

    /// Largest bucket count, used to scale bars.
    pub fn max_count(&self) -> u64 {
        self.entries.iter().map(|e| e.jobs_count).max().unwrap_or(0)
    }
}

/// The first `n` entries of a series, for incremental rendering.
/// `n` is clamped to the series length.
pub fn partial(series: &ArtistSeries, n: usize) -> &[BucketEntry] {
    &series.entries[..n.min(series.entries.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(artist: &str, bucket: &str, n: u64) -> JobRecord {
        JobRecord::new(artist, bucket, n)
    }

    fn lenient(records: &[JobRecord], artist: &str) -> ArtistSeries {
        normalize(records, artist, &BucketDefinition::default(), UnknownBucketPolicy::Lenient)
            .unwrap()
    }

    fn pct_sum(series: &ArtistSeries) -> f64 {
        series.entries.iter().map(|e| e.pct_share).sum()
    }

    #[test]
    fn test_fills_missing_buckets() {
        let records = vec![
            rec("A", "00-10", 41),
            rec("A", "11-20", 143),
            rec("A", "z100+", 3),
            rec("B", "21-30", 99),
        ];
        let series = lenient(&records, "A");

        assert_eq!(series.entries.len(), 11);
        let order = BucketDefinition::default();
        for (entry, code) in series.entries.iter().zip(order.iter()) {
            assert_eq!(entry.bucket, code);
        }

        assert_eq!(series.total, 187);
        assert_eq!(series.over_100, 3);
        assert_eq!(series.entries[0].jobs_count, 41);
        assert_eq!(series.entries[1].jobs_count, 143);
        assert!(series.entries[2..10].iter().all(|e| e.jobs_count == 0));
        assert_eq!(series.entries[10].label, "100+");

        assert_eq!(format!("{:.1}", series.entries[0].pct_share), "21.9");
        assert_eq!(format!("{:.1}", series.entries[1].pct_share), "76.5");
        assert_eq!(format!("{:.1}", series.entries[10].pct_share), "1.6");
        assert!((pct_sum(&series) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let records = vec![rec("A", "z100+", 3), rec("A", "51-60", 2), rec("A", "00-10", 1)];
        let series = lenient(&records, "A");
        let counts: Vec<u64> = series.entries.iter().map(|e| e.jobs_count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 2, 0, 0, 0, 0, 3]);
    }

    #[test]
    fn test_absent_artist_is_all_zero() {
        let records = vec![rec("A", "00-10", 41)];
        let series = lenient(&records, "Nobody");

        assert_eq!(series.entries.len(), 11);
        assert_eq!(series.total, 0);
        assert_eq!(series.over_100, 0);
        assert!(series.entries.iter().all(|e| e.jobs_count == 0 && e.pct_share == 0.0));
        assert_eq!(series.summary().overflow_share, "—");
    }

    #[test]
    fn test_duplicates_are_summed() {
        let records = vec![rec("A", "00-10", 5), rec("A", "00-10", 7), rec("A", "11-20", 4)];
        let series = lenient(&records, "A");
        assert_eq!(series.entries[0].jobs_count, 12);
        assert_eq!(series.total, 16);
        assert!((series.entries[0].pct_share - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_bucket_lenient_excluded_from_total() {
        let records = vec![
            rec("A", "00-10", 10),
            rec("A", "unknown-code", 90),
            rec("A", "z100+", 10),
        ];
        let series = lenient(&records, "A");
        assert_eq!(series.entries.len(), 11);
        assert_eq!(series.total, 20);
        assert_eq!(series.dropped, 1);
        assert!(series.entries.iter().all(|e| e.bucket != "unknown-code"));
        assert!((series.entries[0].pct_share - 50.0).abs() < 1e-9);
        assert!((pct_sum(&series) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_bucket_strict_rejected() {
        let records = vec![rec("A", "00-10", 10), rec("A", "unknown-code", 90)];
        let err = normalize(
            &records,
            "A",
            &BucketDefinition::default(),
            UnknownBucketPolicy::Strict,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownBucket {
                artist: "A".into(),
                bucket: "unknown-code".into()
            }
        );
    }

    #[test]
    fn test_strict_ignores_other_artists_bad_rows() {
        let records = vec![rec("A", "00-10", 10), rec("B", "bogus", 1)];
        let series = normalize(
            &records,
            "A",
            &BucketDefinition::default(),
            UnknownBucketPolicy::Strict,
        )
        .unwrap();
        assert_eq!(series.total, 10);
    }

    #[test]
    fn test_count_overflow() {
        let records = vec![rec("A", "00-10", u64::MAX), rec("A", "00-10", 1)];
        let err = normalize(
            &records,
            "A",
            &BucketDefinition::default(),
            UnknownBucketPolicy::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::CountOverflow { .. }));

        let records = vec![rec("A", "00-10", u64::MAX), rec("A", "11-20", 1)];
        let err = normalize(
            &records,
            "A",
            &BucketDefinition::default(),
            UnknownBucketPolicy::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::CountOverflow { .. }));
    }

    #[test]
    fn test_shares_sum_to_100_for_sample() {
        let sample = crate::dataset::embedded_sample();
        for artist in sample.artists() {
            let series = lenient(&sample.records, &artist);
            let raw: u64 = sample
                .records
                .iter()
                .filter(|r| r.artist == artist)
                .map(|r| r.jobs_count)
                .sum();
            assert_eq!(series.entries.len(), 11, "{artist}");
            assert_eq!(series.total, raw, "{artist}");
            assert!((pct_sum(&series) - 100.0).abs() < 1e-6, "{artist}");
        }
    }

    #[test]
    fn test_summary() {
        let sample = crate::dataset::embedded_sample();
        let series = lenient(&sample.records, "Fedosey");
        let summary = series.summary();
        assert_eq!(summary.total, 711);
        assert_eq!(summary.over_100, 237);
        assert_eq!(summary.overflow_share, "33.3%");
    }

    #[test]
    fn test_partial() {
        let series = lenient(&[rec("A", "00-10", 1)], "A");
        assert!(partial(&series, 0).is_empty());
        assert_eq!(partial(&series, 3).len(), 3);
        assert_eq!(partial(&series, 3)[0].bucket, "00-10");
        assert_eq!(partial(&series, 99).len(), 11);
    }

    #[test]
    fn test_format_share() {
        assert_eq!(format_share(3, 187), "1.6%");
        assert_eq!(format_share(0, 0), "—");
        assert_eq!(format_share(5, 5), "100.0%");
    }
}
