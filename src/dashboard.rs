use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::buckets::BucketDefinition;
use crate::dataset::Dataset;
use crate::normalize::{self, ArtistSeries, Summary, UnknownBucketPolicy, ValidationError};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("No datasets loaded")]
    NoData,
    #[error("Unknown dataset \"{0}\"")]
    UnknownDataset(String),
    #[error("Dataset name \"{0}\" is used more than once")]
    DuplicateDataset(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What the viewer picked: an artist and, when several are loaded, a dataset.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub dataset: Option<String>,
    pub artist: String,
}

impl Selection {
    pub fn artist(artist: impl Into<String>) -> Self {
        Self {
            dataset: None,
            artist: artist.into(),
        }
    }

    pub fn in_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }
}

/// Everything the renderer needs for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub dataset: String,
    pub series: ArtistSeries,
    pub summary: Summary,
}

/// One row of the per-artist overview. A rejected selection only affects its own row.
#[derive(Debug)]
pub struct SummaryRow {
    pub artist: String,
    pub outcome: Result<Summary, ValidationError>,
}

/// Loaded datasets plus the bucket order they are projected onto.
/// Each selection change goes through [`Dashboard::select`] and yields a fresh view.
pub struct Dashboard {
    datasets: Vec<Dataset>,
    order: BucketDefinition,
    policy: UnknownBucketPolicy,
}

impl Dashboard {
    pub fn new(
        datasets: Vec<Dataset>,
        order: BucketDefinition,
        policy: UnknownBucketPolicy,
    ) -> Result<Self, DashboardError> {
        if datasets.is_empty() {
            return Err(DashboardError::NoData);
        }
        let mut seen = BTreeSet::new();
        for d in &datasets {
            if !seen.insert(d.name.as_str()) {
                return Err(DashboardError::DuplicateDataset(d.name.clone()));
            }
        }
        Ok(Self {
            datasets,
            order,
            policy,
        })
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn order(&self) -> &BucketDefinition {
        &self.order
    }

    /// Union of artist names across all datasets, sorted ascending.
    pub fn artists(&self) -> Vec<String> {
        self.datasets
            .iter()
            .flat_map(|d| d.records.iter().map(|r| r.artist.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Resolve a dataset by name; `None` means the first one loaded.
    pub fn dataset(&self, name: Option<&str>) -> Result<&Dataset, DashboardError> {
        match name {
            None => self.datasets.first().ok_or(DashboardError::NoData),
            Some(n) => self
                .datasets
                .iter()
                .find(|d| d.name == n)
                .ok_or_else(|| DashboardError::UnknownDataset(n.to_string())),
        }
    }

    /// Handle a selection change. An artist missing from the chosen dataset
    /// yields an all-zero series, not an error.
    pub fn select(&self, selection: &Selection) -> Result<View, DashboardError> {
        let dataset = self.dataset(selection.dataset.as_deref())?;
        log::debug!(
            "Selected artist \"{}\" in dataset \"{}\"",
            selection.artist,
            dataset.name
        );

        let series =
            normalize::normalize(&dataset.records, &selection.artist, &self.order, self.policy)?;
        let summary = series.summary();

        Ok(View {
            dataset: dataset.name.clone(),
            series,
            summary,
        })
    }

    /// Headline numbers for every artist in one dataset.
    pub fn summary_rows(&self, dataset: Option<&str>) -> Result<Vec<SummaryRow>, DashboardError> {
        let dataset = self.dataset(dataset)?;
        Ok(dataset
            .artists()
            .into_iter()
            .map(|artist| {
                let outcome =
                    normalize::normalize(&dataset.records, &artist, &self.order, self.policy)
                        .map(|series| series.summary());
                SummaryRow { artist, outcome }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::JobRecord;

    fn two_datasets() -> Dashboard {
        let jan = Dataset::new(
            "jan",
            vec![
                JobRecord::new("Oksana", "00-10", 10),
                JobRecord::new("Maksim", "z100+", 5),
            ],
        );
        let feb = Dataset::new(
            "feb",
            vec![
                JobRecord::new("Yulia", "11-20", 8),
                JobRecord::new("Oksana", "11-20", 2),
                JobRecord::new("Oksana", "bogus", 1),
            ],
        );
        Dashboard::new(vec![jan, feb], BucketDefinition::default(), UnknownBucketPolicy::Lenient)
            .unwrap()
    }

    #[test]
    fn test_requires_data() {
        let err = Dashboard::new(vec![], BucketDefinition::default(), UnknownBucketPolicy::Lenient);
        assert!(matches!(err, Err(DashboardError::NoData)));
    }

    #[test]
    fn test_artist_union_sorted() {
        let dash = two_datasets();
        assert_eq!(dash.artists(), vec!["Maksim", "Oksana", "Yulia"]);
        assert_eq!(dash.dataset_names(), vec!["jan", "feb"]);
    }

    #[test]
    fn test_select_defaults_to_first_dataset() {
        let dash = two_datasets();
        let view = dash.select(&Selection::artist("Oksana")).unwrap();
        assert_eq!(view.dataset, "jan");
        assert_eq!(view.summary.total, 10);
        assert_eq!(view.summary.overflow_share, "0.0%");
    }

    #[test]
    fn test_select_named_dataset() {
        let dash = two_datasets();
        let view = dash
            .select(&Selection::artist("Oksana").in_dataset("feb"))
            .unwrap();
        assert_eq!(view.dataset, "feb");
        assert_eq!(view.series.total, 2);
        assert_eq!(view.series.dropped, 1);
    }

    #[test]
    fn test_artist_missing_from_dataset() {
        let dash = two_datasets();
        let view = dash
            .select(&Selection::artist("Yulia").in_dataset("jan"))
            .unwrap();
        assert_eq!(view.series.entries.len(), 11);
        assert_eq!(view.summary.total, 0);
        assert_eq!(view.summary.overflow_share, "—");
    }

    #[test]
    fn test_unknown_dataset() {
        let dash = two_datasets();
        let err = dash
            .select(&Selection::artist("Yulia").in_dataset("mar"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown dataset \"mar\"");
    }

    #[test]
    fn test_duplicate_dataset_names_rejected() {
        let a = Dataset::new("jobs", vec![JobRecord::new("X", "00-10", 1)]);
        let b = Dataset::new("jobs", vec![JobRecord::new("X", "00-10", 99)]);
        let err = Dashboard::new(vec![a, b], BucketDefinition::default(), UnknownBucketPolicy::Lenient);
        assert!(matches!(err, Err(DashboardError::DuplicateDataset(ref n)) if n == "jobs"));
    }

    #[test]
    fn test_second_dataset_is_selectable() {
        let a = Dataset::new("a/jobs", vec![JobRecord::new("X", "00-10", 1)]);
        let b = Dataset::new("b/jobs", vec![JobRecord::new("X", "00-10", 99)]);
        let dash =
            Dashboard::new(vec![a, b], BucketDefinition::default(), UnknownBucketPolicy::Lenient)
                .unwrap();
        let names: Vec<String> = dash.dataset_names().iter().map(|s| s.to_string()).collect();
        let view = dash
            .select(&Selection::artist("X").in_dataset(&names[1]))
            .unwrap();
        assert_eq!(view.summary.total, 99);
    }

    #[test]
    fn test_strict_rejection_is_per_artist() {
        let ds = Dataset::new(
            "feb",
            vec![
                JobRecord::new("Ksenia", "00-10", 4),
                JobRecord::new("Oksana", "bogus", 1),
                JobRecord::new("Yulia", "z100+", 2),
            ],
        );
        let dash =
            Dashboard::new(vec![ds], BucketDefinition::default(), UnknownBucketPolicy::Strict)
                .unwrap();

        let rows = dash.summary_rows(None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].outcome.as_ref().map(|s| s.total), Ok(4));
        assert!(matches!(rows[1].outcome, Err(ValidationError::UnknownBucket { .. })));
        assert_eq!(rows[2].outcome.as_ref().map(|s| s.overflow_share.as_str()), Ok("100.0%"));

        // A rejected artist doesn't poison later selections
        assert!(dash.select(&Selection::artist("Oksana")).is_err());
        assert_eq!(dash.select(&Selection::artist("Yulia")).unwrap().summary.total, 2);
    }

    #[test]
    fn test_summary_rows_unknown_dataset() {
        let dash = two_datasets();
        assert!(matches!(
            dash.summary_rows(Some("mar")),
            Err(DashboardError::UnknownDataset(_))
        ));
        assert_eq!(dash.summary_rows(Some("feb")).unwrap().len(), 2);
    }

    #[test]
    fn test_strict_policy_surfaces_validation_error() {
        let feb = Dataset::new("feb", vec![JobRecord::new("Oksana", "bogus", 1)]);
        let dash =
            Dashboard::new(vec![feb], BucketDefinition::default(), UnknownBucketPolicy::Strict)
                .unwrap();
        let err = dash.select(&Selection::artist("Oksana")).unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }
}
