//! CLI for the C mutant generator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use comut::operators::CATALOG;
use comut::{run_generation, Config, GenerationReport, OperatorConfig};

#[derive(Parser)]
#[command(name = "comut")]
#[command(author, version, about = "Source-level mutant generation for C", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the mutants of a C file
    Generate {
        /// C source file to mutate
        input: PathBuf,

        /// Path to the config file; every operator with defaults if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory receiving the database and mutant files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum mutants per operator and node
        #[arg(short, long)]
        limit: Option<usize>,

        /// Enable only these operators (repeatable)
        #[arg(short = 'm', long = "operator", value_name = "OP")]
        operators: Vec<String>,

        /// Write the database only
        #[arg(long)]
        no_files: bool,

        /// Log every emitted mutant
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the config file
        #[arg(short, long, default_value = "comut.yaml")]
        config: PathBuf,
    },

    /// List the operator catalog
    Operators,

    /// Show example configuration
    Example,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            config,
            output_dir,
            limit,
            operators,
            no_files,
            verbose,
        } => {
            init_tracing(verbose);
            let overrides = Overrides {
                output_dir,
                limit,
                operators,
                no_files,
            };
            generate(&input, config.as_deref(), overrides)
        }

        Commands::Validate { config } => validate_config(&config),

        Commands::Operators => {
            print_operators();
            Ok(())
        }

        Commands::Example => {
            print_example();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "comut=debug" } else { "comut=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command line settings that take precedence over the config file
struct Overrides {
    output_dir: Option<PathBuf>,
    limit: Option<usize>,
    operators: Vec<String>,
    no_files: bool,
}

fn generate(input: &Path, config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => {
            println!("{}", "Loading configuration...".dimmed());
            Config::load(path)?
        }
        None => Config::default(),
    };

    if let Some(dir) = overrides.output_dir {
        config.settings.output_dir = dir;
    }
    if let Some(limit) = overrides.limit {
        config.settings.limit = limit;
    }
    if !overrides.operators.is_empty() {
        config.operators = overrides
            .operators
            .iter()
            .map(|name| OperatorConfig::named(name))
            .collect();
    }
    if overrides.no_files {
        config.settings.write_mutant_files = false;
    }

    if let Err(errors) = config.validate() {
        eprintln!("{}", "Configuration errors found:".red().bold());
        for error in &errors {
            eprintln!("  • {}", error);
        }
        bail!("{} configuration error(s)", errors.len());
    }

    let outcome = run_generation(&config, input)
        .with_context(|| format!("generating mutants of '{}'", input.display()))?;
    GenerationReport::new(&outcome).print();
    Ok(())
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    println!("{}", "Loading configuration...".dimmed());
    let config = Config::load(config_path)?;

    let enabled = if config.operators.is_empty() {
        format!("all {} operators", CATALOG.len())
    } else {
        format!("{} operator(s)", config.operators.len())
    };
    println!("Config enables {}", enabled);
    println!();

    match config.validate() {
        Ok(()) => {
            println!("{} Configuration is valid!", "✓".green().bold());
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("{} {}", "✗".red(), error);
            }
            println!();
            bail!("{} configuration error(s)", errors.len());
        }
    }
}

fn print_operators() {
    println!("{}", "Mutation Operators".bold());
    println!("{}", "=".repeat(60));
    for def in CATALOG {
        println!("{}  {}", def.name.bold(), def.description);
        let domain = if def.default_domain.is_empty() {
            "any".to_string()
        } else {
            def.default_domain.join(" ")
        };
        let range = if def.default_range.is_empty() {
            def.range.describe()
        } else {
            def.default_range.join(" ")
        };
        println!("      {} {}", "domain:".dimmed(), domain);
        println!("      {} {}", "range: ".dimmed(), range);
    }
}

fn print_example() {
    let example = r#"# Example comut.yaml configuration file
version: "1.0"

settings:
  output_dir: mutants
  limit: 10            # mutants per operator and node
  range:               # omit to mutate the whole file
    start: { line: 10 }
    end: { line: 40, column: 1 }
  excluded_lines: [12, 13]
  write_mutant_files: true

# Omit the list to enable every operator with its defaults
operators:
  # Arithmetic operator substitution restricted to + and -
  - name: OAAN
    domain: ["+", "-"]
    range: ["*", "/"]

  # Relational operator substitution with defaults
  - name: ORRN

  # Replace locals of the current function, but only by i or n
  - name: VLSR
    range: ["i", "n"]

  # Off-by-one on every scalar reference
  - name: VTWD

  # Statement deletion
  - name: SSDL
"#;

    println!("{}", example);
}
