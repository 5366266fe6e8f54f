use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use circo_results::blocs::BlocTable;
use circo_results::{Bloc, FieldAliases, ReconcileOptions};

use crate::carte::*;

const GEOJSON_URL: &str = "https://static.data.gouv.fr/resources/contours-geographiques-des-circonscriptions-legislatives/20240613-191520/circonscriptions-legislatives-p10.geojson";
const RESULTS_URL: &str =
    "https://tabular-api.data.gouv.fr/api/resources/6682d0c255dcda5df20b1d90/data/?page_size=1000";
const PRODUCTION: &str = "production";
const DEFAULT_MAX_PAGES: usize = 50;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "defaultFill")]
    pub default_fill: Option<String>,
    #[serde(rename = "unavailableMessage")]
    pub unavailable_message: Option<String>,
}

fn default_title() -> String {
    "Cartographie des circonscriptions législatives".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            title: default_title(),
            output_directory: None,
            default_fill: None,
            unavailable_message: None,
        }
    }
}

/// Where a source of boundaries or results comes from, and in which format.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Geojson,
    GeojsonHttp,
    Json,
    JsonHttp,
    Csv,
    Xlsx,
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl Provider {
    pub fn from_name(name: &str) -> CarteResult<Provider> {
        match name {
            "geojson" => Ok(Provider::Geojson),
            "geojson_http" => Ok(Provider::GeojsonHttp),
            "json" => Ok(Provider::Json),
            "json_http" => Ok(Provider::JsonHttp),
            "csv" => Ok(Provider::Csv),
            "xlsx" => Ok(Provider::Xlsx),
            x => UnknownProviderSnafu { name: x }.fail(),
        }
    }

    pub fn guess_boundaries(location: &str) -> Provider {
        if is_url(location) {
            Provider::GeojsonHttp
        } else {
            Provider::Geojson
        }
    }

    pub fn guess_results(location: &str) -> Provider {
        let lower = location.to_lowercase();
        if is_url(location) {
            Provider::JsonHttp
        } else if lower.ends_with(".csv") {
            Provider::Csv
        } else if lower.ends_with(".xlsx") {
            Provider::Xlsx
        } else {
            Provider::Json
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Provider::GeojsonHttp | Provider::JsonHttp)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub provider: Provider,
    /// A file path or a URL, depending on the provider.
    pub location: String,
    pub worksheet: Option<String>,
    pub delimiter: Option<String>,
}

impl SourceSpec {
    pub fn new(provider: Provider, location: &str) -> SourceSpec {
        SourceSpec {
            provider,
            location: location.to_string(),
            worksheet: None,
            delimiter: None,
        }
    }

    /// The CSV delimiter, if one was given.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.as_deref().and_then(|d| d.bytes().next())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSources {
    #[serde(default)]
    pub boundaries: Vec<SourceSpec>,
    #[serde(default)]
    pub results: Vec<SourceSpec>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BlocStyle {
    pub name: Bloc,
    pub color: String,
    pub label: Option<String>,
}

fn default_blocs() -> Vec<BlocStyle> {
    [
        (Bloc::NouveauFrontPopulaire, "#d73027"),
        (Bloc::Ensemble, "#fee08b"),
        (Bloc::RassemblementNational, "#4575b4"),
        (Bloc::LesRepublicains, "#1b7837"),
        (Bloc::DiversDroite, "#a6d96a"),
        (Bloc::DiversGauche, "#fdae61"),
        (Bloc::Centre, "#74add1"),
        (Bloc::Divers, "#bdbdbd"),
        (Bloc::Autres, "#969696"),
    ]
    .into_iter()
    .map(|(name, color)| BlocStyle {
        name,
        color: color.to_string(),
        label: None,
    })
    .collect()
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CarteConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "defaultEnvironment")]
    pub default_environment: Option<String>,
    #[serde(default)]
    pub environments: BTreeMap<String, DataSources>,
    #[serde(default = "default_blocs")]
    pub blocs: Vec<BlocStyle>,
    #[serde(rename = "defaultBloc")]
    pub default_bloc: Option<Bloc>,
    /// Additions to the nuance codes.
    #[serde(default)]
    pub nuances: BTreeMap<String, Bloc>,
    /// Additions to the free-text party labels.
    #[serde(default)]
    pub aliases: BTreeMap<String, Bloc>,
    #[serde(rename = "fieldAliases", default)]
    pub field_aliases: FieldAliases,
    #[serde(rename = "maxPages")]
    pub max_pages: Option<usize>,
    /// Passed through to the summary, not computed.
    #[serde(rename = "swingDelta")]
    pub swing_delta: Option<JSValue>,
}

impl Default for CarteConfig {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            PRODUCTION.to_string(),
            DataSources {
                boundaries: vec![SourceSpec::new(Provider::GeojsonHttp, GEOJSON_URL)],
                results: vec![SourceSpec::new(Provider::JsonHttp, RESULTS_URL)],
            },
        );
        CarteConfig {
            output_settings: OutputSettings::default(),
            default_environment: Some(PRODUCTION.to_string()),
            environments,
            blocs: default_blocs(),
            default_bloc: None,
            nuances: BTreeMap::new(),
            aliases: BTreeMap::new(),
            field_aliases: FieldAliases::default(),
            max_pages: None,
            swing_delta: None,
        }
    }
}

impl CarteConfig {
    /// The sources of the requested environment, or of the default one.
    ///
    /// Without any environment at all, the sources are left empty: they must then
    /// come from the command line.
    pub fn sources(&self, environment: Option<&str>) -> CarteResult<DataSources> {
        let name = match environment.or(self.default_environment.as_deref()) {
            Some(n) => n,
            None if self.environments.len() == 1 => {
                return Ok(self.environments.values().next().cloned().unwrap_or_default())
            }
            None => return Ok(DataSources::default()),
        };
        self.environments
            .get(name)
            .cloned()
            .context(UnknownEnvironmentSnafu { name })
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        let mut blocs = BlocTable::default();
        for (code, bloc) in self.nuances.iter() {
            blocs = blocs.with_nuance(code, bloc.clone());
        }
        for (label, bloc) in self.aliases.iter() {
            blocs = blocs.with_alias(label, bloc.clone());
        }
        ReconcileOptions {
            aliases: self.field_aliases.clone(),
            blocs,
            default_bloc: self.default_bloc.clone().unwrap_or(Bloc::Divers),
        }
    }

    /// Makes the file locations relative to the given directory.
    fn resolve_paths(&mut self, root: &Path) {
        for sources in self.environments.values_mut() {
            for spec in sources
                .boundaries
                .iter_mut()
                .chain(sources.results.iter_mut())
            {
                if !spec.provider.is_remote() && Path::new(&spec.location).is_relative() {
                    spec.location = root.join(&spec.location).display().to_string();
                }
            }
        }
    }
}

pub fn parse_config(contents: &str) -> CarteResult<CarteConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

/// Reads a configuration file. File locations are taken relative to the file.
pub fn read_config(path: &str) -> CarteResult<CarteConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut config = parse_config(&contents)?;
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(root);
    debug!("read_config: {:?}", config);
    Ok(config)
}
