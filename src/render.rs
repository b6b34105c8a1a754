use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use crate::dashboard::View;
use crate::normalize::{self, ArtistSeries, BucketEntry, Summary};

/// Default pause between animation frames.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(70);

/// Default bar width in characters.
pub const DEFAULT_CHART_WIDTH: usize = 50;

const BAR_CHAR: char = '█';

const X_AXIS_TITLE: &str = "Hours to complete";
const Y_AXIS_TITLE: &str = "Jobs count";

/// ANSI: clear screen and home the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Static horizontal bar chart for a view.
pub fn render_chart(view: &View, width: usize) -> String {
    render_frame(view, &view.series.entries, width)
}

/// Chart with only `entries` drawn. Bars are scaled to the whole series so
/// partial frames line up with the final one.
fn render_frame(view: &View, entries: &[BucketEntry], width: usize) -> String {
    let series = &view.series;
    let max = series.max_count();
    let label_width = series
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(X_AXIS_TITLE.len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Completion time distribution — {} ({})",
        series.artist, view.dataset
    );
    out.push('\n');
    let _ = writeln!(out, "{X_AXIS_TITLE:>label_width$}   {Y_AXIS_TITLE}");
    let _ = writeln!(out, "{}", "-".repeat(label_width + width + 20));

    for entry in entries {
        let bar: String = std::iter::repeat_n(BAR_CHAR, bar_len(entry.jobs_count, max, width))
            .collect();
        let _ = writeln!(
            out,
            "{:>label_width$} │ {:<width$} {:>6}  ({:.1}%)",
            entry.label, bar, entry.jobs_count, entry.pct_share,
        );
    }

    out
}

/// Bar length proportional to `max`; any non-zero count gets at least one cell.
fn bar_len(count: u64, max: u64, width: usize) -> usize {
    if max == 0 || count == 0 {
        return 0;
    }
    let len = (count as f64 / max as f64 * width as f64).round() as usize;
    len.clamp(1, width)
}

/// Headline metrics row.
pub fn render_metrics(summary: &Summary, overflow_label: &str) -> String {
    format!(
        "Total completed jobs: {}   {} hour jobs: {}   {} share: {}",
        summary.total, overflow_label, summary.over_100, overflow_label, summary.overflow_share
    )
}

/// The underlying data as a plain table.
pub fn render_table(series: &ArtistSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:>10} {:>8}", "Bucket", "Jobs", "Share");
    let _ = writeln!(out, "{}", "-".repeat(30));
    for e in &series.entries {
        let _ = writeln!(
            out,
            "{:<10} {:>10} {:>8}",
            e.label,
            e.jobs_count,
            normalize::format_share(e.jobs_count, series.total)
        );
    }
    out
}

/// One frame per bucket, each adding the next bar. The last frame is the
/// static chart.
pub fn frames(view: &View, width: usize) -> Vec<String> {
    (1..=view.series.entries.len())
        .map(|n| render_frame(view, normalize::partial(&view.series, n), width))
        .collect()
}

/// Play the bar-by-bar animation to `out`, pausing `delay` between frames.
/// Purely cosmetic; the final screen matches [`render_chart`].
pub fn animate<W: Write>(view: &View, width: usize, delay: Duration, out: &mut W) -> io::Result<()> {
    for frame in frames(view, width) {
        write!(out, "{CLEAR_SCREEN}{frame}")?;
        out.flush()?;
        std::thread::sleep(delay);
    }
    Ok(())
}
