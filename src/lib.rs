pub mod auth;
pub mod buckets;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod normalize;
pub mod render;

/// Application name for XDG paths
pub const APP_NAME: &str = "jobdash";

/// Most datasets the dashboard compares side by side.
pub const MAX_DATASETS: usize = 2;
