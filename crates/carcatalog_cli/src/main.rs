//! Command-line front end for the car catalog.
//!
//! # Responsibility
//! - Submit applications and run catalog queries against a SQLite file.
//! - Print results as JSON lines so scripts can consume them.
//!
//! Logging goes to files only when `--log-dir` (or `CARCATALOG_LOG_DIR`) is set.

use carcatalog_core::service::form_validation::{current_year, validate_application_form};
use carcatalog_core::{
    default_log_level, init_logging, open_db, ApplicationService, CarApplicationForm,
    CarApplicationResult, CarCatalogEntry, CatalogConfig, CatalogQueryService, SqliteCatalogStore,
    StoreResult,
};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "carcatalog_cli", about = "Car catalog applications and queries", version)]
struct Cli {
    /// Write rolling log files into this absolute directory
    #[arg(long, env = "CARCATALOG_LOG_DIR", value_name = "DIR")]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "CARCATALOG_LOG", value_name = "LEVEL")]
    log_level: Option<String>,

    /// JSON catalog configuration file
    #[arg(long, env = "CARCATALOG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the core library links
    Ping,
    /// Print the core library version
    Version,
    /// Submit one (maker, model, year range) application
    Apply {
        /// SQLite catalog file
        db: PathBuf,
        maker: String,
        model: String,
        /// First production month
        #[arg(value_name = "YYYY-MM", value_parser = parse_year_month)]
        start: YearMonth,
        /// Last production month
        #[arg(value_name = "YYYY-MM", value_parser = parse_year_month)]
        end: YearMonth,
    },
    /// Print every catalog entry
    List { db: PathBuf },
    /// Print entries whose year ranges still have gaps
    Incomplete { db: PathBuf },
    /// Search entries by alias
    Search { db: PathBuf, term: String },
}

/// A `YYYY-MM` argument. Month bounds are checked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YearMonth {
    year: i32,
    month: i32,
}

fn parse_year_month(value: &str) -> Result<YearMonth, String> {
    let invalid = || format!("expected YYYY-MM, got `{value}`");
    let (year, month) = value.split_once('-').ok_or_else(invalid)?;
    Ok(YearMonth {
        year: year.parse().map_err(|_| invalid())?,
        month: month.parse().map_err(|_| invalid())?,
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| err.to_string())?;
    }
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ping => {
            println!("carcatalog_core ping={}", carcatalog_core::ping());
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            println!("carcatalog_core version={}", carcatalog_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Apply {
            db,
            maker,
            model,
            start,
            end,
        } => {
            let form = CarApplicationForm {
                maker_name: maker,
                model_name: model,
                start_year: start.year,
                start_month: start.month,
                end_year: end.year,
                end_month: end.month,
            };
            apply(&db, &form, &config)
        }
        Command::List { db } => query(&db, &config, |service| service.all_cars()),
        Command::Incomplete { db } => query(&db, &config, |service| service.incomplete_cars()),
        Command::Search { db, term } => query(&db, &config, |service| service.search_cars(&term)),
    }
}

fn apply(db: &Path, form: &CarApplicationForm, config: &CatalogConfig) -> Result<ExitCode, String> {
    let advice = validate_application_form(form, config, current_year());
    for message in advice.errors.iter().chain(advice.warnings.iter()) {
        eprintln!("note: {}", message.display_line());
    }

    let conn = open_db(db).map_err(|err| err.to_string())?;
    let store = SqliteCatalogStore::try_new(&conn).map_err(|err| err.to_string())?;
    let service = ApplicationService::from_config(store, config);

    let result = match service.process_car_application(form) {
        Ok(result) => result,
        Err(err) => {
            warn!("event=cli_apply module=cli status=error error={}", err);
            CarApplicationResult::from_error(&err)
        }
    };

    println!(
        "{}",
        serde_json::to_string(&result).map_err(|err| err.to_string())?
    );
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn query<F>(db: &Path, config: &CatalogConfig, run_query: F) -> Result<ExitCode, String>
where
    F: FnOnce(&CatalogQueryService<SqliteCatalogStore<'_>>) -> StoreResult<Vec<CarCatalogEntry>>,
{
    let conn = open_db(db).map_err(|err| err.to_string())?;
    let store = SqliteCatalogStore::try_new(&conn).map_err(|err| err.to_string())?;
    let service = CatalogQueryService::from_config(store, config);
    let entries = run_query(&service).map_err(|err| err.to_string())?;
    for entry in &entries {
        println!(
            "{}",
            serde_json::to_string(entry).map_err(|err| err.to_string())?
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<CatalogConfig, String> {
    let Some(path) = path else {
        return Ok(CatalogConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read config `{}`: {err}", path.display()))?;
    CatalogConfig::from_json_str(&raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_year_month, Cli, Command, YearMonth};
    use clap::error::ErrorKind;
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn year_month_arguments_parse() {
        assert_eq!(
            parse_year_month("2015-01").unwrap(),
            YearMonth {
                year: 2015,
                month: 1
            }
        );
        assert!(parse_year_month("2018").is_err());
        assert!(parse_year_month("2018-xx").is_err());
    }

    #[test]
    fn apply_parses_positionals() {
        let cli = Cli::try_parse_from([
            "carcatalog_cli",
            "apply",
            "catalog.db",
            "Toyota",
            "Corolla",
            "2015-01",
            "2018-12",
        ])
        .unwrap();
        let Command::Apply {
            db,
            maker,
            model,
            start,
            end,
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(db, PathBuf::from("catalog.db"));
        assert_eq!((maker.as_str(), model.as_str()), ("Toyota", "Corolla"));
        assert_eq!((start.year, start.month), (2015, 1));
        assert_eq!((end.year, end.month), (2018, 12));
    }

    #[test]
    fn apply_without_end_month_is_a_usage_error() {
        let err = Cli::try_parse_from([
            "carcatalog_cli",
            "apply",
            "catalog.db",
            "Toyota",
            "Corolla",
            "2015-01",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn malformed_year_month_is_a_value_error() {
        let err = Cli::try_parse_from([
            "carcatalog_cli",
            "apply",
            "catalog.db",
            "Toyota",
            "Corolla",
            "2015",
            "2018-12",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn global_options_precede_the_subcommand() {
        let cli = Cli::try_parse_from([
            "carcatalog_cli",
            "--log-level",
            "warn",
            "--config",
            "catalog.json",
            "search",
            "catalog.db",
            "cor",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
        assert_eq!(cli.config, Some(PathBuf::from("catalog.json")));
        assert!(matches!(cli.command, Command::Search { ref term, .. } if term == "cor"));
    }
}
