use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mpf_cli::{GaussianPathRunner, GaussianTarget};
use mpf_core::{
    error_codes, ConfigError, CsvWriter, MultiPathConfig, MultiPathError, MultiPathFinder,
    NullWriter, Writer,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("mpf")
        .version(mpf_cli::VERSION)
        .about("Multi-path variational inference with importance resampling")
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Run the multi-path pipeline on a Gaussian demo target")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Base random seed"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(u32))
                        .help("RNG stream offset of the first path"),
                )
                .arg(
                    Arg::new("paths")
                        .long("paths")
                        .value_parser(value_parser!(u32))
                        .help("Number of paths"),
                )
                .arg(
                    Arg::new("draws")
                        .long("draws")
                        .value_parser(value_parser!(usize))
                        .help("Approximate draws per path"),
                )
                .arg(
                    Arg::new("multi-draws")
                        .long("multi-draws")
                        .value_parser(value_parser!(usize))
                        .help("Draws kept after importance resampling"),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(value_parser!(usize))
                        .help("Worker threads (default: all cores)"),
                )
                .arg(
                    Arg::new("dims")
                        .long("dims")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Dimensions of the demo target"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Draws CSV file (default: stdout)"),
                )
                .arg(
                    Arg::new("diagnostics")
                        .long("diagnostics")
                        .value_parser(value_parser!(PathBuf))
                        .help("Diagnostic CSV file (default: discarded)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON"),
                ),
        )
        .subcommand(Command::new("config").about("Print the default configuration as TOML"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<MultiPathConfig, ConfigError> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => MultiPathConfig::from_path(path)?,
        None => MultiPathConfig::default(),
    };
    if let Some(&seed) = args.get_one::<u64>("seed") {
        config = config.with_seed(seed);
    }
    if let Some(&path) = args.get_one::<u32>("path") {
        config = config.with_path_offset(path);
    }
    if let Some(&paths) = args.get_one::<u32>("paths") {
        config = config.with_num_paths(paths);
    }
    if let Some(&draws) = args.get_one::<usize>("draws") {
        config = config.with_num_draws(draws);
    }
    if let Some(&multi_draws) = args.get_one::<usize>("multi-draws") {
        config = config.with_num_multi_draws(multi_draws);
    }
    if let Some(&threads) = args.get_one::<usize>("threads") {
        config = config.with_threads(threads);
    }
    Ok(config)
}

fn open_sink(path: Option<&PathBuf>, stdout: bool) -> anyhow::Result<Box<dyn Writer>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(CsvWriter::new(BufWriter::new(file)))
        }
        None if stdout => Box::new(CsvWriter::new(BufWriter::new(io::stdout()))),
        None => Box::new(NullWriter),
    })
}

fn run(args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let dims = args.get_one::<usize>("dims").copied().unwrap_or(4);
    let model = GaussianTarget::new(dims);
    let runner = GaussianPathRunner::default();
    let inits = vec![None; config.num_paths as usize];

    let mut params = open_sink(args.get_one::<PathBuf>("output"), true)?;
    let mut diagnostics = open_sink(args.get_one::<PathBuf>("diagnostics"), false)?;

    let finder = MultiPathFinder::new(config);
    let result = finder.run(&runner, &model, &inits, &mut params, &mut diagnostics);
    params.flush().context("failed to flush draws")?;
    diagnostics.flush().context("failed to flush diagnostics")?;

    let summary = result?;
    tracing::info!(
        successful = summary.successful_paths.len(),
        failed = summary.failed_paths.len(),
        evals = summary.eval_count,
        draws = summary.drawn_indices.len(),
        "run finished"
    );
    Ok(())
}

fn print_default_config() -> anyhow::Result<()> {
    let text = MultiPathConfig::default().to_toml_string()?;
    print!("{text}");
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<MultiPathError>() {
        e.error_code()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        error_codes::CONFIG
    } else if err.downcast_ref::<io::Error>().is_some() {
        error_codes::IOERR
    } else {
        error_codes::SOFTWARE
    }
}

fn main() {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("run", args)) => {
            init_tracing(args.get_flag("json"));
            run(args)
        }
        Some(("config", _)) => print_default_config(),
        _ => std::process::exit(error_codes::USAGE),
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
