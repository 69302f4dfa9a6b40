//! Entry point for the `geomap` command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("geomap: logging disabled: {err}");
    }

    if let Err(err) = geomap_cli::run() {
        eprintln!("geomap: {err}");
        std::process::exit(1);
    }
}
