use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobdash::auth::{AuthOutcome, PasswordGate, Session, MAX_ATTEMPTS, PASSWORD_ENV};
use jobdash::config::AppConfig;
use jobdash::dashboard::{Dashboard, Selection, View};
use jobdash::dataset::{self, Dataset};
use jobdash::render;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobdash", version, about = "Artist job completion dashboard")]
struct Cli {
    /// Data file(s) with artist, bucket, jobs_count columns (up to two)
    #[arg(long = "data", global = true)]
    data: Vec<PathBuf>,

    /// Config file (defaults to the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject unknown bucket codes instead of dropping them
    #[arg(long, global = true)]
    strict: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every artist across the loaded datasets
    Artists,

    /// List loaded datasets
    Datasets,

    /// Show one artist's completion time distribution
    Show {
        /// Artist name (exact match)
        artist: String,

        /// Dataset to use (defaults to the first one loaded)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Draw the chart in one go
        #[arg(long)]
        no_animate: bool,

        /// Also print the underlying data table
        #[arg(long)]
        table: bool,

        /// Print the view as JSON instead of a chart
        #[arg(long)]
        json: bool,
    },

    /// One line per artist: total jobs and overflow share
    Summary {
        /// Dataset to use (defaults to the first one loaded)
        #[arg(short, long)]
        dataset: Option<String>,
    },

    /// Print the bucket each elapsed-hours value falls into
    Classify {
        /// Hours to classify
        #[arg(required = true)]
        hours: Vec<f64>,
    },

    /// Password-gated interactive picker
    Interactive {
        /// Read the password from this environment variable instead of APP_PASSWORD
        #[arg(long)]
        password_env: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let order = config.bucket_order().context("Invalid bucket order in config")?;
    let policy = if cli.strict {
        jobdash::normalize::UnknownBucketPolicy::Strict
    } else {
        config.bucket_policy()
    };

    // Resolve data sources: CLI > config > embedded sample
    let files = if !cli.data.is_empty() {
        cli.data.clone()
    } else {
        config.data_files.clone()
    };
    let datasets = load_datasets(&files)?;
    let dash = Dashboard::new(datasets, order, policy)?;

    match cli.command {
        Commands::Artists => {
            for artist in dash.artists() {
                println!("{}", artist);
            }
        }

        Commands::Datasets => {
            println!("{:<20} {:>8} {:>6}", "Dataset", "Artists", "Rows");
            println!("{}", "-".repeat(36));
            for d in dash.datasets() {
                println!(
                    "{:<20} {:>8} {:>6}",
                    d.name,
                    d.artists().len(),
                    d.records.len()
                );
            }
        }

        Commands::Show { artist, dataset, no_animate, table, json } => {
            if !dash.artists().contains(&artist) {
                log::warn!("Artist \"{}\" not found in any dataset", artist);
            }
            let selection = Selection { dataset, artist };
            let view = dash.select(&selection).context("Failed to build view")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            let animate = config.animate && !no_animate && std::io::stdout().is_terminal();
            print_view(&dash, &view, &config, animate, table)?;
        }

        Commands::Summary { dataset } => {
            print_summary_table(&dash, dataset.as_deref())?;
        }

        Commands::Classify { hours } => {
            let order = dash.order();
            for h in hours {
                match order.bucket_for_hours(h) {
                    Some(code) => println!("{:>8} {}", h, order.display_label(code)),
                    None => println!("{:>8} -", h),
                }
            }
        }

        Commands::Interactive { password_env } => {
            // Secret: --password-env var > APP_PASSWORD > config
            let secret = password_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .or_else(|| std::env::var(PASSWORD_ENV).ok())
                .or(config.password.clone());
            run_interactive(&dash, &config, PasswordGate::new(secret))?;
        }
    }

    Ok(())
}

/// Load up to two data files, or the embedded sample when none are given.
fn load_datasets(files: &[PathBuf]) -> Result<Vec<Dataset>> {
    if files.is_empty() {
        log::info!("No data files given, using embedded sample");
        return Ok(vec![dataset::embedded_sample()]);
    }
    if files.len() > jobdash::MAX_DATASETS {
        anyhow::bail!(
            "At most {} data files are supported, got {}",
            jobdash::MAX_DATASETS,
            files.len()
        );
    }
    files
        .iter()
        .zip(dataset::unique_names(files))
        .map(|(path, name)| {
            dataset::load_named(path, name)
                .with_context(|| format!("Cannot load data from {}", path.display()))
        })
        .collect()
}

/// Chart, metrics, and optionally the data table.
fn print_view(
    dash: &Dashboard,
    view: &View,
    config: &AppConfig,
    animate: bool,
    table: bool,
) -> Result<()> {
    if animate {
        let mut stdout = std::io::stdout().lock();
        render::animate(view, config.chart_width, config.frame_delay(), &mut stdout)?;
    } else {
        print!("{}", render::render_chart(view, config.chart_width));
    }

    let order = dash.order();
    println!();
    println!(
        "{}",
        render::render_metrics(&view.summary, order.display_label(order.overflow()))
    );

    if table {
        println!();
        print!("{}", render::render_table(&view.series));
    }
    Ok(())
}

/// Print every artist's headline numbers for one dataset.
fn print_summary_table(dash: &Dashboard, dataset: Option<&str>) -> Result<()> {
    let ds = dash.dataset(dataset)?;
    let rows = dash.summary_rows(dataset)?;
    let order = dash.order();
    let overflow = order.display_label(order.overflow());

    println!("Dataset: {}", ds.name);
    println!();
    println!("{:<25} {:>8} {:>8} {:>8}", "Artist", "Total", overflow, "Share");
    println!("{}", "-".repeat(52));

    for row in &rows {
        let name: String = if row.artist.chars().count() > 25 {
            format!("{}...", row.artist.chars().take(22).collect::<String>())
        } else {
            row.artist.clone()
        };
        match &row.outcome {
            Ok(summary) => println!(
                "{:<25} {:>8} {:>8} {:>8}",
                name, summary.total, summary.over_100, summary.overflow_share
            ),
            Err(e) => println!("{:<25} {}", name, e),
        }
    }
    Ok(())
}

/// Read one trimmed line after printing `label`. `None` on EOF.
fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Pick from a numbered list. Empty input picks `default`; `q` quits.
fn pick<'a>(
    input: &mut impl BufRead,
    what: &str,
    options: &'a [String],
    default: Option<usize>,
) -> Result<Option<&'a String>> {
    for (i, opt) in options.iter().enumerate() {
        println!("  {:>2}) {}", i + 1, opt);
    }
    loop {
        let Some(answer) = prompt(input, &format!("{} (number, q to quit): ", what))? else {
            return Ok(None);
        };
        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        if answer.is_empty() {
            if let Some(d) = default {
                return Ok(options.get(d));
            }
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(options.get(n - 1)),
            _ => println!("Please enter a number between 1 and {}.", options.len()),
        }
    }
}

fn run_interactive(dash: &Dashboard, config: &AppConfig, gate: PasswordGate) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut session = Session::new();

    if !gate.is_open() {
        println!("Access required. Please enter the shared password to continue.");
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(pw) = prompt(&mut input, "Password: ")? else {
                anyhow::bail!("No password given");
            };
            match session.attempt(&gate, &pw) {
                AuthOutcome::Granted => break,
                AuthOutcome::Denied => println!("Incorrect password"),
            }
            if attempt == MAX_ATTEMPTS {
                anyhow::bail!("Too many incorrect password attempts");
            }
        }
    }

    let dataset_names: Vec<String> = dash.dataset_names().iter().map(|s| s.to_string()).collect();
    let artists = dash.artists();
    let animate = config.animate && std::io::stdout().is_terminal();

    loop {
        let dataset = if dataset_names.len() > 1 {
            println!();
            println!("Datasets:");
            match pick(&mut input, "Dataset", &dataset_names, Some(0))? {
                Some(d) => Some(d.clone()),
                None => break,
            }
        } else {
            None
        };

        println!();
        println!("Artists:");
        let Some(artist) = pick(&mut input, "Artist", &artists, None)? else {
            break;
        };

        let selection = Selection {
            dataset,
            artist: artist.clone(),
        };
        let view = match dash.select(&selection) {
            Ok(view) => view,
            Err(e) => {
                println!("Cannot show {}: {}", selection.artist, e);
                continue;
            }
        };
        println!();
        print_view(dash, &view, config, animate, false)?;

        println!();
        if let Some(answer) = prompt(&mut input, "Show underlying data? [y/N] ")? {
            if answer.eq_ignore_ascii_case("y") {
                println!();
                print!("{}", render::render_table(&view.series));
            }
        }
    }

    Ok(())
}
