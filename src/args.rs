use clap::Parser;

use crate::carte::RunSettings;

/// Builds the choropleth layer and the seat summary of the French legislative elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The configuration file, in JSON format. Without it, the
    /// results of data.gouv.fr are used. See the manual of circo_results for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (name, optional) The environment of the configuration to load the data from.
    #[clap(short, long, value_parser)]
    pub environment: Option<String>,

    /// (file path or URL) The district boundaries, as GeoJSON. Overrides the configuration.
    #[clap(short, long, value_parser)]
    pub boundaries: Option<String>,

    /// (file path or URL) The results. Overrides the configuration.
    #[clap(long, value_parser)]
    pub results: Option<String>,

    /// (json, json_http, csv or xlsx) The type of the results. Guessed from the extension
    /// when not given.
    #[clap(long, value_parser)]
    pub results_type: Option<String>,

    /// (file path or 'stdout') Where to write the styled GeoJSON layer.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout') Where to write the summary of the seats. Defaults to the
    /// output directory of the configuration, or to the standard output.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, carte checks that the
    /// computed summary matches it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

impl From<Args> for RunSettings {
    fn from(args: Args) -> Self {
        RunSettings {
            config: args.config,
            environment: args.environment,
            boundaries: args.boundaries,
            results: args.results,
            results_type: args.results_type,
            out: args.out,
            summary: args.summary,
            reference: args.reference,
        }
    }
}
