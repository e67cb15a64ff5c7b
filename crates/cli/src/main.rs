mod cli;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ebookfill_core::{
    add_missing_format, load_config, load_config_from_env, separate_colliding_outputs,
    validate_config, BulkRequest, CalibreDb, Catalog, Config, ConversionPool, ConversionReport,
    ConversionTask, EbookConvert, TargetFormat,
};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    apply_overrides(&mut config, &cli.command)?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Commands::AddFormat {
            library,
            format,
            output_dir,
            keep_output,
            ..
        } => {
            let library = resolve_library(library, &config)?;
            let format = resolve_format(format, &config)?;
            let mut request = BulkRequest::new(format.as_str())?
                .with_pool(config.conversion.pool())
                .with_dry_run(config.conversion.dry_run)
                .with_keep_output(keep_output || config.conversion.keep_output);
            if let Some(dir) = output_dir.or_else(|| config.conversion.output_dir.clone()) {
                request = request.with_output_dir(dir);
            }

            let catalog = CalibreDb::new(&library)
                .with_calibredb_path(&config.library.calibredb_path);
            let converter = EbookConvert::new(config.converter.clone());

            info!(library = %library.display(), format = %format, "Adding missing format");
            let summary = add_missing_format(&catalog, converter, request)
                .await
                .context("Adding missing format failed")?;

            if summary.considered == 0 {
                println!("Every book already has {}", format);
                return Ok(());
            }
            print_report(&summary.report);
            if summary.imported {
                println!(
                    "Imported {} file(s) into {}",
                    summary.report.produced.len(),
                    library.display()
                );
            }
            if let Some(dir) = summary.output_dir {
                println!("Converted files kept in {}", dir.display());
            }
        }

        Commands::Convert {
            format,
            output_dir,
            paths,
            ..
        } => {
            let format = resolve_format(format, &config)?;
            let dry_run = config.conversion.dry_run;
            let mut tasks: Vec<ConversionTask> = paths
                .into_iter()
                .map(|path| {
                    ConversionTask::for_path(path, &output_dir, format.clone())
                        .with_dry_run(dry_run)
                })
                .collect();
            separate_colliding_outputs(&mut tasks);

            let pool = ConversionPool::new(
                config.conversion.pool(),
                EbookConvert::new(config.converter.clone()),
            )?;
            let converted = pool.convert_all(tasks).await;
            pool.shutdown().await.context("Failed to stop conversion pool")?;
            let report = converted.context("Conversion failed")?;

            print_report(&report);
        }

        Commands::List { library } => {
            let library = resolve_library(library, &config)?;
            let catalog = CalibreDb::new(&library)
                .with_calibredb_path(&config.library.calibredb_path);

            let books = catalog
                .list()
                .await
                .with_context(|| format!("Failed to list library {}", library.display()))?;
            for book in &books {
                println!("{}\t{}", book.uuid.as_deref().unwrap_or("-"), book.title);
                for path in &book.formats {
                    println!("\t{}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn resolve_library(flag: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    match flag.or_else(|| config.library.library.clone()) {
        Some(library) => Ok(library),
        None => bail!("No library given: pass --library or set library.library in the config"),
    }
}

fn resolve_format(flag: Option<String>, config: &Config) -> Result<TargetFormat> {
    match flag {
        Some(format) => Ok(TargetFormat::new(format)?),
        None => match &config.conversion.format {
            Some(format) => Ok(format.clone()),
            None => bail!("No format given: pass --format or set conversion.format in the config"),
        },
    }
}

/// Folds the run flags of a converting subcommand into the loaded config.
fn apply_overrides(config: &mut Config, command: &Commands) -> Result<()> {
    let Some(run) = command.run_args() else {
        return Ok(());
    };
    if let Some(threads) = run.threads {
        if threads < 1 {
            bail!("--threads must be at least 1, got {}", threads);
        }
        config.conversion.workers = threads;
    }
    config.conversion.dry_run |= run.dry_run;
    Ok(())
}

fn print_report(report: &ConversionReport) {
    for path in &report.produced {
        println!("Converted: {}", path.display());
    }
    for failure in &report.failures {
        if let Err(e) = &failure.outcome {
            println!("Failed: {} ({})", failure.task.title, e);
        }
    }
    println!(
        "{} of {} converted",
        report.produced.len(),
        report.results_seen
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebookfill_core::ConversionConfig;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ebookfill").chain(args.iter().copied())).unwrap()
    }

    fn config_with_workers(workers: usize) -> Config {
        Config {
            conversion: ConversionConfig {
                workers,
                ..ConversionConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_threads_flag_overrides_invalid_config() {
        let cli = parse(&["add-format", "--threads", "4"]);
        let mut config = config_with_workers(0);

        apply_overrides(&mut config, &cli.command).unwrap();
        assert_eq!(config.conversion.workers, 4);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let cli = parse(&["convert", "-o", "/out", "--threads", "0", "a.epub"]);
        let mut config = Config::default();

        let err = apply_overrides(&mut config, &cli.command).unwrap_err();
        assert!(err.to_string().contains("--threads must be at least 1"));
    }

    #[test]
    fn test_config_values_kept_without_flags() {
        let cli = parse(&["add-format"]);
        let mut config = config_with_workers(3);
        config.conversion.dry_run = true;

        apply_overrides(&mut config, &cli.command).unwrap();
        assert_eq!(config.conversion.workers, 3);
        assert!(config.conversion.dry_run);
    }

    #[test]
    fn test_dry_run_flag_sets_config() {
        let cli = parse(&["add-format", "--dry-run"]);
        let mut config = Config::default();

        apply_overrides(&mut config, &cli.command).unwrap();
        assert!(config.conversion.dry_run);
    }

    #[test]
    fn test_list_ignores_run_overrides() {
        let cli = parse(&["list"]);
        let mut config = config_with_workers(0);

        apply_overrides(&mut config, &cli.command).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_resolve_library() {
        let mut config = Config::default();
        assert!(resolve_library(None, &config).is_err());

        config.library.library = Some(PathBuf::from("/books"));
        assert_eq!(resolve_library(None, &config).unwrap(), PathBuf::from("/books"));
        assert_eq!(
            resolve_library(Some(PathBuf::from("/other")), &config).unwrap(),
            PathBuf::from("/other")
        );
    }

    #[test]
    fn test_resolve_format() {
        let mut config = Config::default();
        assert!(resolve_format(None, &config).is_err());
        assert!(resolve_format(Some(String::new()), &config).is_err());

        config.conversion.format = Some(TargetFormat::new("epub").unwrap());
        assert_eq!(resolve_format(None, &config).unwrap().as_str(), ".epub");
        assert_eq!(
            resolve_format(Some("MOBI".to_string()), &config).unwrap().as_str(),
            ".mobi"
        );
    }
}
