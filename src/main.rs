mod args;
mod carte;

use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

use crate::args::Args;
use crate::carte::RunSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    info!("args: {:?}", args);

    let settings: RunSettings = args.into();
    let res = carte::run_map(&settings).await;

    if let Err(e) = res {
        eprintln!("{}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
