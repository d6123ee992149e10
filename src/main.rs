use anyhow::Context;
use card_relabel::{Config, FailurePolicy, FileFilterConfig, Relabeler, DEFAULT_NAME_TEMPLATE};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "card-relabel",
    version,
    author,
    about = "Rename numbered card images from a catalog and convert them",
    long_about = "Rename numbered card images from a JSON catalog and convert them.\n\n\
    Every image whose file name is a plain number (e.g. 12.png) is looked up in the \
    selected series of the catalog, renamed after the card (12-Mew-ex-Mythical-Island.png) \
    and converted into a sibling file of the target format. Other images are left alone.\n\n\
    USAGE EXAMPLES:\n  \
      # Relabel the Mythical Island set\n  \
      card-relabel --catalog data/pokemons.json --series A1a --dir images/cards/mythical-island\n\n  \
      # Preview without touching anything\n  \
      card-relabel -c data/pokemons.json -s A1a -d images/cards/mythical-island --dry-run\n\n  \
      # Use cwebp instead of ImageMagick\n  \
      card-relabel -c data/pokemons.json -s A1a -d cards --converter cwebp \\\n    \
      --converter-arg={input} --converter-arg=-o --converter-arg={output}"
)]
struct Cli {
    /// JSON catalog file
    #[arg(short, long, value_name = "FILE")]
    catalog: PathBuf,

    /// Codename of the series to use (e.g. A1a)
    #[arg(short, long, value_name = "CODENAME")]
    series: String,

    /// Directory scanned recursively for images
    #[arg(short, long, default_value = ".", value_name = "PATH")]
    dir: PathBuf,

    /// Label used in file names (defaults to the series name, hyphenated)
    #[arg(short, long)]
    label: Option<String>,

    /// Base name template; supports {number}, {name} and {label}
    #[arg(short, long, default_value = DEFAULT_NAME_TEMPLATE)]
    template: String,

    /// Extension of images to relabel (case-sensitive)
    #[arg(long, default_value = "png", value_name = "EXT")]
    from: String,

    /// Extension of converted copies
    #[arg(long, default_value = "webp", value_name = "EXT")]
    to: String,

    /// Program used for conversion
    #[arg(long, default_value = "convert", value_name = "PROGRAM")]
    converter: String,

    /// Converter argument; supports {input} and {output} (can be used multiple times)
    ///
    /// Defaults to `{input} {output}`.
    #[arg(long = "converter-arg", value_name = "ARG", allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Glob of files or directories to skip, relative to --dir (can be used multiple times)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Stop at the first image that fails
    #[arg(long)]
    fail_fast: bool,

    /// Show what would happen without renaming or converting
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let failure_policy = if cli.fail_fast {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::CollectAndReport
    };

    let mut builder = Config::builder()
        .catalog_path(cli.catalog)
        .codename(cli.series)
        .root_dir(cli.dir)
        .name_template(cli.template)
        .source_extension(cli.from)
        .target_extension(cli.to)
        .failure_policy(failure_policy)
        .dry_run(cli.dry_run)
        .file_filter_config(
            FileFilterConfig::new()
                .exclude_files(cli.exclude.clone())
                .exclude_directories(cli.exclude),
        );

    builder = if cli.converter_args.is_empty() {
        builder.converter_program(cli.converter)
    } else {
        builder.converter_command(cli.converter, cli.converter_args)
    };

    if let Some(label) = cli.label {
        builder = builder.series_label(label);
    }

    if let Some(report) = cli.report {
        builder = builder.report_path(report);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let report = Relabeler::new(config)
        .context("Failed to prepare relabeling")?
        .run()
        .context("Relabeling failed")?;

    report.print_summary();

    let failed = report.failures.len();
    report
        .into_result()
        .with_context(|| format!("{failed} image(s) could not be relabeled"))?;

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("card_relabel=info"),
        1 => EnvFilter::new("card_relabel=debug"),
        _ => EnvFilter::new("card_relabel=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
