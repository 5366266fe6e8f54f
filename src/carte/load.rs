// One load cycle: boundaries and results fetched together, then published once.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use tokio::sync::watch;

use circo_results::Row;

use crate::carte::config_reader::{DataSources, Provider, SourceSpec};
use crate::carte::io_common::rows_from_payload;
use crate::carte::io_csv::read_csv_rows;
use crate::carte::io_excel::read_excel_rows;
use crate::carte::io_geojson::{
    feature_collection_from_value, merge, read_feature_collection, FeatureCollection,
};
use crate::carte::io_http::{fetch_paginated_rows, JsonFetcher};
use crate::carte::*;

const BOUNDARIES: &str = "contours";
const RESULTS: &str = "résultats";

/// Everything the reconciliation and the rendering need, loaded in one cycle.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Snapshot {
    pub boundaries: FeatureCollection,
    pub rows: Vec<Row>,
}

/// The three states a map can be shown in. There is no partial state.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Failed(String),
    Ready(Arc<Snapshot>),
}

/// Drops the pending commit of a load cycle when cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    alive: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

pub struct LoadCycle {
    alive: Arc<AtomicBool>,
    tx: watch::Sender<LoadState>,
}

impl Default for LoadCycle {
    fn default() -> Self {
        LoadCycle::new()
    }
}

impl LoadCycle {
    pub fn new() -> LoadCycle {
        let (tx, _) = watch::channel(LoadState::Loading);
        LoadCycle {
            alive: Arc::new(AtomicBool::new(true)),
            tx,
        }
    }

    pub fn state(&self) -> LoadState {
        self.tx.borrow().clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            alive: self.alive.clone(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Loads the boundaries and the results concurrently and publishes the outcome.
    ///
    /// The first failure fails the whole cycle. If the cycle was cancelled in the
    /// meantime, nothing is published and the current state is returned.
    pub async fn run<F: JsonFetcher>(
        &self,
        fetcher: &F,
        sources: &DataSources,
        max_pages: usize,
    ) -> LoadState {
        if !self.is_alive() {
            return self.state();
        }
        self.tx.send_replace(LoadState::Loading);
        let loaded = tokio::try_join!(
            load_boundaries(fetcher, &sources.boundaries),
            load_results(fetcher, &sources.results, max_pages)
        );
        if !self.is_alive() {
            warn!("LoadCycle::run: cycle cancelled, discarding the responses");
            return self.state();
        }
        let state = match loaded {
            Ok((boundaries, rows)) => {
                info!(
                    "LoadCycle::run: {} features, {} result rows",
                    boundaries.len(),
                    rows.len()
                );
                LoadState::Ready(Arc::new(Snapshot { boundaries, rows }))
            }
            Err(e) => {
                warn!("LoadCycle::run: {}", e);
                LoadState::Failed(e.to_string())
            }
        };
        self.tx.send_replace(state.clone());
        state
    }

    /// Like [LoadCycle::run], but gives up as soon as `interrupt` completes (Ctrl-C for
    /// the command line). An interrupted cycle is cancelled and keeps its last state.
    pub async fn run_until<F: JsonFetcher, I: Future>(
        &self,
        fetcher: &F,
        sources: &DataSources,
        max_pages: usize,
        interrupt: I,
    ) -> LoadState {
        let handle = self.cancel_handle();
        tokio::select! {
            biased;
            _ = interrupt => {
                warn!("LoadCycle::run_until: interrupted");
                handle.cancel();
                self.state()
            }
            state = self.run(fetcher, sources, max_pages) => state,
        }
    }
}

async fn load_boundary_source<F: JsonFetcher>(
    fetcher: &F,
    spec: &SourceSpec,
) -> CarteResult<FeatureCollection> {
    debug!("load_boundary_source: {:?}", spec);
    match spec.provider {
        Provider::Geojson => read_feature_collection(&spec.location).await,
        Provider::GeojsonHttp => {
            let js = fetcher.get_json(&spec.location, BOUNDARIES).await?;
            feature_collection_from_value(js, BOUNDARIES)
        }
        p => whatever!("Provider {:?} cannot provide district boundaries", p),
    }
}

pub async fn load_boundaries<F: JsonFetcher>(
    fetcher: &F,
    specs: &[SourceSpec],
) -> CarteResult<FeatureCollection> {
    let mut collections: Vec<FeatureCollection> = Vec::new();
    for spec in specs.iter() {
        collections.push(load_boundary_source(fetcher, spec).await?);
    }
    Ok(merge(collections))
}

async fn read_json_rows(path: &str) -> CarteResult<Vec<Row>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    ensure!(
        js.is_array() || js.get("data").map(|d| d.is_array()).unwrap_or(false),
        UnexpectedPayloadSnafu { what: RESULTS }
    );
    Ok(rows_from_payload(&js))
}

async fn load_result_source<F: JsonFetcher>(
    fetcher: &F,
    spec: &SourceSpec,
    max_pages: usize,
) -> CarteResult<Vec<Row>> {
    debug!("load_result_source: {:?}", spec);
    match spec.provider {
        Provider::Json => read_json_rows(&spec.location).await,
        Provider::JsonHttp => {
            fetch_paginated_rows(fetcher, &spec.location, max_pages, RESULTS).await
        }
        Provider::Csv => read_csv_rows(&spec.location, spec.delimiter_byte()).await,
        Provider::Xlsx => {
            read_excel_rows(&spec.location, spec.worksheet.as_deref()).await
        }
        p => whatever!("Provider {:?} cannot provide results", p),
    }
}

pub async fn load_results<F: JsonFetcher>(
    fetcher: &F,
    specs: &[SourceSpec],
    max_pages: usize,
) -> CarteResult<Vec<Row>> {
    let mut rows: Vec<Row> = Vec::new();
    for spec in specs.iter() {
        rows.extend(load_result_source(fetcher, spec, max_pages).await?);
    }
    Ok(rows)
}
