use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, info_span};

use movie_kpi::apis::{ExportFile, MovieSource, TmdbClient, TmdbSource};
use movie_kpi::kpi::search::MovieSearch;
use movie_kpi::{fingerprint, logging, to_rows, KpiEngine, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "movie_kpi")]
#[command(about = "Movie catalog cleaning pipeline and KPI report")]
#[command(version = "0.1.0")]
struct Cli {
    /// Pipeline config file (defaults to ./movie_kpi.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the size of every ranked view
    #[arg(long, global = true)]
    top: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch full movie records (with credits) from TMDB
    Fetch {
        /// Movie ids (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Clean a raw export into the finalized movie table
    Clean {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Clean a raw export and build the KPI report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Search the cleaned movies by genre, cast and director
    Search {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        genre: Vec<String>,
        #[arg(long)]
        cast: Vec<String>,
        #[arg(long)]
        director: Vec<String>,
    },
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn clean(input: &Path, config: &PipelineConfig) -> Result<DataFrame> {
    let source = ExportFile::new(input);
    let records = source
        .fetch_records()
        .with_context(|| format!("Failed to load records from {}", input.display()))?;
    let output = Pipeline::from_config(config).run(&records)?;
    for stage in &output.stages {
        info!(
            "{:<13} {:>6} -> {:<6} rows, {} columns",
            stage.stage, stage.rows_in, stage.rows_out, stage.columns_out
        );
    }
    Ok(output.frame)
}

fn main() -> Result<()> {
    let _guard = logging::init_logging();
    let cli = Cli::parse();

    let mut config = PipelineConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load pipeline config")?;
    if let Some(top) = cli.top {
        config.top_n = top;
    }

    match cli.command {
        Commands::Fetch { ids, out } => {
            let span = info_span!("fetch", movies = ids.len());
            let _enter = span.enter();
            let client = TmdbClient::from_env().context("TMDB client setup failed")?;
            let source = TmdbSource::new(client, ids);
            let records = source.fetch_records()?;
            info!("Fetched {} records from {}", records.len(), source.source_name());
            write_json(&records, out.as_deref())?;
        }
        Commands::Clean { input, out } => {
            let movies = clean(&input, &config)?;
            info!("Cleaned table fingerprint {}", fingerprint(&movies)?);
            write_json(&to_rows(&movies)?, out.as_deref())?;
        }
        Commands::Report { input, out } => {
            let movies = clean(&input, &config)?;
            let report = KpiEngine::from_config(&config).report(&movies)?;
            write_json(&report, out.as_deref())?;
        }
        Commands::Search {
            input,
            genre,
            cast,
            director,
        } => {
            let movies = clean(&input, &config)?;
            let mut search = MovieSearch::new();
            for needle in genre {
                search = search.genre(needle);
            }
            for needle in cast {
                search = search.cast(needle);
            }
            for needle in director {
                search = search.director(needle);
            }
            let found = search.run(&movies)?;
            eprintln!("🔎 {} movies matched", found.height());
            write_json(&to_rows(&found)?, None)?;
        }
    }

    Ok(())
}
