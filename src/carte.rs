use log::{debug, info};

use circo_results::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::PathBuf;

use serde_json::Value as JSValue;

use crate::carte::config_reader::*;
use crate::carte::io_http::HttpFetcher;
use crate::carte::load::{LoadCycle, LoadState};

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_geojson;
pub mod io_http;
pub mod load;
pub mod render;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CarteError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Empty workbook or missing header row"))]
    EmptyExcel {},
    #[snafu(display("Missing worksheet {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Error reading CSV line {lineno}: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Erreur réseau lors du chargement des {what} : {source}"))]
    HttpRequest { source: reqwest::Error, what: String },
    #[snafu(display("Erreur lors du chargement des {what} ({status})"))]
    HttpStatus { what: String, status: u16 },
    #[snafu(display("Réponse inattendue lors du chargement des {what}"))]
    UnexpectedPayload { what: String },
    #[snafu(display("Trop de pages lors du chargement des {what} (maximum {max_pages})"))]
    TooManyPages { what: String, max_pages: usize },
    #[snafu(display("Unknown environment {name}"))]
    UnknownEnvironment { name: String },
    #[snafu(display("Unknown provider {name}"))]
    UnknownProvider { name: String },
    #[snafu(display("No {what} source configured"))]
    MissingSource { what: String },
    #[snafu(display("Impossible de charger les données : {message}"))]
    LoadFailed { message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CarteResult<T> = Result<T, CarteError>;

/// What to load and where to write, as requested on the command line.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunSettings {
    pub config: Option<String>,
    pub environment: Option<String>,
    pub boundaries: Option<String>,
    pub results: Option<String>,
    pub results_type: Option<String>,
    pub out: Option<String>,
    pub summary: Option<String>,
    pub reference: Option<String>,
}

fn write_output(path: &str, js: &JSValue) -> CarteResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    if path == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(path, pretty).context(WritingOutputSnafu { path })?;
        info!("Wrote {}", path);
    }
    Ok(())
}

/// Applies the command line overrides on top of the configured sources.
fn select_sources(config: &CarteConfig, settings: &RunSettings) -> CarteResult<DataSources> {
    let mut sources = config.sources(settings.environment.as_deref())?;
    if let Some(b) = settings.boundaries.clone() {
        sources.boundaries = vec![SourceSpec::new(Provider::guess_boundaries(&b), &b)];
    }
    if let Some(r) = settings.results.clone() {
        let provider = match settings.results_type.as_deref() {
            Some(name) => Provider::from_name(name)?,
            None => Provider::guess_results(&r),
        };
        sources.results = vec![SourceSpec::new(provider, &r)];
    }
    ensure!(
        !sources.boundaries.is_empty(),
        MissingSourceSnafu { what: "contours" }
    );
    ensure!(
        !sources.results.is_empty(),
        MissingSourceSnafu { what: "résultats" }
    );
    Ok(sources)
}

/// Runs one load cycle and renders the map layers and the summary.
pub async fn run_map(settings: &RunSettings) -> CarteResult<()> {
    let config: CarteConfig = match settings.config.clone() {
        Some(p) => read_config(&p)?,
        None => CarteConfig::default(),
    };
    debug!("config: {:?}", config);

    let sources = select_sources(&config, settings)?;
    info!(
        "Sources: {} boundary source(s), {} result source(s)",
        sources.boundaries.len(),
        sources.results.len()
    );

    let fetcher = HttpFetcher::new()?;
    let cycle = LoadCycle::new();
    let interrupt = tokio::signal::ctrl_c();
    let state = cycle
        .run_until(&fetcher, &sources, config.max_pages(), interrupt)
        .await;
    let snapshot = match state {
        LoadState::Ready(s) => s,
        LoadState::Failed(message) => return LoadFailedSnafu { message }.fail(),
        LoadState::Loading => whatever!("The load cycle was interrupted"),
    };

    let options = config.reconcile_options();
    let reconciliation = reconcile(&snapshot.rows, &options);

    let palette = render::Palette::from_config(&config);
    let (styled, unmatched) = render::styled_collection(
        &snapshot.boundaries,
        &reconciliation,
        &options.aliases,
        &palette,
    );
    let summary = render::summary_js(
        &config.output_settings.title,
        &reconciliation,
        &palette,
        unmatched,
        config.swing_delta.clone(),
    );

    let out_dir: Option<PathBuf> = config
        .output_settings
        .output_directory
        .as_ref()
        .map(PathBuf::from);
    let out_path = settings.out.clone().or_else(|| {
        out_dir
            .as_ref()
            .map(|d| d.join("carte.geojson").display().to_string())
    });
    let summary_path = settings.summary.clone().or_else(|| {
        out_dir
            .as_ref()
            .map(|d| d.join("summary.json").display().to_string())
    });

    if let Some(p) = out_path {
        write_output(&p, &styled)?;
    }
    match summary_path {
        Some(p) => write_output(&p, &summary)?,
        None => write_output("stdout", &summary)?,
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = settings.reference.clone() {
        render::check_reference(&summary, &reference)?;
    }
    Ok(())
}
