#![deny(missing_docs)]

//! # Modelsmith CLI
//!
//! Command Line Interface for the schema-to-Python model compiler.
//!
//! Supported Commands:
//! - `generate`: JSON Schema / models document -> pydantic or dataclass module.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod generate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Python data model generator")]
struct Cli {
    /// Raise log output to debug.
    #[clap(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a Python module from a schema document.
    Generate(generate::GenerateArgs),
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Generate(args) => generate::execute(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "modelsmith",
            "generate",
            "--input",
            "schema.json",
            "--output-model-type",
            "pydantic.BaseModel",
            "--target-python-version",
            "3.9",
            "--use-union-operator",
            "--custom-type",
            "Money=shop.Money",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Generate(args) = cli.command;
        assert_eq!(args.input.as_deref(), Some(std::path::Path::new("schema.json")));
        assert_eq!(
            args.output_model_type,
            Some(modelsmith_core::OutputFlavor::PydanticV1)
        );
        assert_eq!(
            args.target_python_version,
            Some(modelsmith_core::PythonVersion::Py39)
        );
        assert!(args.use_union_operator);
        assert_eq!(args.custom_types, vec!["Money=shop.Money".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_flavor() {
        let result = Cli::try_parse_from([
            "modelsmith",
            "generate",
            "--output-model-type",
            "attrs.define",
        ]);
        assert!(result.is_err());
    }
}
