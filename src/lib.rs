//! Source-level mutant generation for C
//!
//! This library parses a C translation unit, walks it in source order while
//! tracking scopes, visible variables and syntactic contexts, and asks a
//! catalog of mutation operators for the mutants each node admits. Every
//! accepted mutant is recorded in a tab-separated database, and optionally
//! written out as a full copy of the source with one substitution applied.
//!
//! # Example Configuration
//!
//! ```yaml
//! version: "1.0"
//! settings:
//!   output_dir: mutants
//!   limit: 10
//!
//! operators:
//!   - name: OAAN
//!     domain: ["+"]
//!     range: ["-", "*"]
//!   - name: VTWD
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use comut::{run_generation, Config, GenerationReport};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("comut.yaml")).unwrap();
//! let outcome = run_generation(&config, Path::new("src/list.c")).unwrap();
//! GenerationReport::new(&outcome).print();
//! ```

pub mod codegen;
pub mod config;
pub mod context;
pub mod error;
pub mod frontend;
pub mod operators;
pub mod recorder;
pub mod report;
pub mod runner;

// Re-export main types at crate root
pub use config::{Config, OperatorConfig, Settings};
pub use context::{Inventory, MutationBounds, MutationContext};
pub use error::{MutationError, Result};
pub use operators::OperatorSet;
pub use recorder::{MutantEntry, Recorder};
pub use report::GenerationReport;
pub use runner::{generate_mutants, run_generation, GenerationOutcome};
