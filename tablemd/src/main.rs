//! Data-dictionary generator.
//!
//! Resolves a table name or `LIKE` pattern against an Oracle schema or a
//! SQL Server database and writes one Markdown document per matching table
//! under `<OUTPUT_BASE>/<scope>/TABLE_<table>.md`.
//!
//! # Security Guarantees
//! - Catalog `SELECT`s only
//! - Passwords are prompted for when absent and never logged

use anyhow::Context;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tablemd_core::{
    AppConfig, DictionaryGenerator, FsDocumentSink, RunReport, TableMdError, TablePattern,
    catalog, logging::init_logging,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "tablemd")]
#[command(about = "Generate Markdown data dictionaries from Oracle or SQL Server catalogs")]
#[command(version)]
#[command(long_about = "
tablemd - one Markdown page per table

The pattern is matched case-insensitively against table names in the
configured Oracle schema or SQL Server database. '%' and '_' act as SQL
LIKE wildcards; a pattern without them must match exactly one table name.

EXAMPLES:
  tablemd TXD2BV01LOG
  tablemd 'ABC%'
  tablemd -c prod.properties -o docs 'ORD_%'
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Properties file with connection settings
    #[arg(
        short,
        long,
        env = "TABLEMD_CONFIG",
        default_value = "tablemd.properties"
    )]
    config: PathBuf,

    /// Output base directory (overrides OUTPUT_BASE)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Table name or LIKE pattern
    pattern: String,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    quiet: bool,
}

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIGURATION: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;
const EXIT_CONNECTION: u8 = 4;
const EXIT_TABLES_FAILED: u8 = 5;
const EXIT_ENVIRONMENT: u8 = 6;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_CONFIGURATION);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match runtime.block_on(generate(&cli)) {
        Ok(report) => {
            for path in &report.written {
                println!("{}", path.display());
            }
            if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                for failure in &report.failures {
                    warn!("Skipped {}: {}", failure.table, failure.error);
                }
                ExitCode::from(EXIT_TABLES_FAILED)
            }
        }
        Err(e) => {
            error!("{:#}", e);
            if cli.global.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Loads configuration, connects and writes every matching document.
async fn generate(cli: &Cli) -> anyhow::Result<RunReport> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(output) = &cli.output {
        config.output_base.clone_from(output);
    }
    let pattern = TablePattern::parse(&cli.pattern)?;

    ensure_password(&mut config)?;
    info!("Target: {}", config.backend);

    let provider = catalog::connect(&config.backend).await?;
    let sink = FsDocumentSink::new(&config.output_base);
    let mut generator =
        DictionaryGenerator::new(sink).with_output_scope(config.backend.output_scope());

    let report = generator.run(provider, &pattern).await?;
    info!(
        "✓ {} of {} table(s) written under {}",
        report.written.len(),
        report.tables_resolved(),
        generator.sink().base().display()
    );
    Ok(report)
}

/// Prompts on the terminal when the properties file carries no password.
fn ensure_password(config: &mut AppConfig) -> anyhow::Result<()> {
    let credentials = config.backend.credentials_mut();
    if credentials.has_password() {
        return Ok(());
    }

    let prompt = format!("Password for {}: ", credentials.username());
    let password = rpassword::prompt_password(prompt).map_err(|e| {
        TableMdError::configuration(format!("Failed to read password: {e}"))
    })?;
    if password.is_empty() {
        return Err(TableMdError::configuration("Password cannot be empty").into());
    }
    credentials.set_password(password);
    Ok(())
}

/// Maps a failed run to the process exit status.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TableMdError>() {
        Some(TableMdError::Configuration { .. }) => EXIT_CONFIGURATION,
        Some(TableMdError::NotFound { .. }) => EXIT_NOT_FOUND,
        Some(TableMdError::Connection { .. }) => EXIT_CONNECTION,
        Some(TableMdError::CatalogQuery { .. } | TableMdError::Normalization { .. }) => {
            EXIT_TABLES_FAILED
        }
        Some(TableMdError::Io { .. } | TableMdError::UnsupportedFeature { .. }) => {
            EXIT_ENVIRONMENT
        }
        None => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_cli_defaults() {
        temp_env::with_var_unset("TABLEMD_CONFIG", || {
            let cli = Cli::try_parse_from(["tablemd", "ABC%"]).expect("parse");
            assert_eq!(cli.config, PathBuf::from("tablemd.properties"));
            assert_eq!(cli.output, None);
            assert_eq!(cli.pattern, "ABC%");
            assert_eq!(cli.global.verbose, 0);
            assert!(!cli.global.quiet);
        });
    }

    #[test]
    fn test_config_from_environment() {
        temp_env::with_var("TABLEMD_CONFIG", Some("/etc/tablemd/prod.properties"), || {
            let cli = Cli::try_parse_from(["tablemd", "TXD2BV01LOG"]).expect("parse");
            assert_eq!(cli.config, PathBuf::from("/etc/tablemd/prod.properties"));
        });
    }

    #[test]
    fn test_flag_overrides_environment() {
        temp_env::with_var("TABLEMD_CONFIG", Some("env.properties"), || {
            let cli = Cli::try_parse_from(["tablemd", "-c", "cli.properties", "-o", "docs", "X"])
                .expect("parse");
            assert_eq!(cli.config, PathBuf::from("cli.properties"));
            assert_eq!(cli.output, Some(PathBuf::from("docs")));
        });
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["tablemd", "-vv", "-q", "X"]).expect("parse");
        assert_eq!(cli.global.verbose, 2);
        assert!(cli.global.quiet);
    }

    #[test]
    fn test_pattern_is_required() {
        assert!(Cli::try_parse_from(["tablemd"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let cases = [
            (TableMdError::configuration("DB_TYPE is required"), 2),
            (TableMdError::not_found("APPS", "ABC%"), 3),
            (
                TableMdError::io("writing document", io::Error::other("disk full")),
                6,
            ),
            (
                TableMdError::unsupported_feature("trusted connection", "sqlserver"),
                6,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(exit_code_for(&anyhow::Error::new(err)), expected);
        }
        assert_eq!(exit_code_for(&anyhow::anyhow!("runtime")), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::new(TableMdError::configuration("missing file"))
            .context("Failed to load tablemd.properties");
        assert_eq!(exit_code_for(&err), EXIT_CONFIGURATION);
    }

    #[test]
    fn test_missing_config_file_is_configuration_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let cli = Cli::try_parse_from([
            "tablemd",
            "-c",
            dir.path().join("absent.properties").to_str().expect("utf8"),
            "X",
        ])
        .expect("parse");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let err = runtime.block_on(generate(&cli)).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_CONFIGURATION);
    }
}
