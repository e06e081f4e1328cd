use anyhow::Result;
use clap::{App, Arg};
use sitegen::build::build_site;
use sitegen::config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("sitegen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates a static site from a tree of Markdown posts and assets")
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .takes_value(true)
                .value_name("DIR")
                .help("The site directory (defaults to the current directory)"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .takes_value(true)
                .value_name("DIR")
                .help("Overrides the output directory"),
        )
        .arg(
            Arg::with_name("clean")
                .long("clean")
                .help("Removes the output directory before generating"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Logs progress at the info level"),
        )
        .get_matches();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if matches.is_present("verbose") {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(
        matches.value_of("project").map(Path::new),
        matches.value_of("output").map(PathBuf::from),
        matches.is_present("clean"),
    ) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(project: Option<&Path>, output: Option<PathBuf>, clean: bool) -> Result<()> {
    let dir = match project {
        Some(dir) => dir.to_owned(),
        None => std::env::current_dir()?,
    };
    let mut config = Config::from_directory(&dir)?;
    if let Some(output) = output {
        config.output_directory = output;
    }
    config.clean = clean;
    build_site(&config)?;
    Ok(())
}
