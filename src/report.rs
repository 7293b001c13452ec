//! Report generation for mutant generation runs
//!
//! This module summarises what a run produced and where it was written.

use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::runner::GenerationOutcome;

/// Summary report of one generation run
#[derive(Debug)]
pub struct GenerationReport {
    pub source_file: PathBuf,
    pub database: PathBuf,
    pub files_written: usize,
    /// Mutants per operator, in operator name order
    pub per_operator: BTreeMap<String, usize>,
    pub total: usize,
}

impl GenerationReport {
    pub fn new(outcome: &GenerationOutcome) -> Self {
        let mut per_operator = BTreeMap::new();
        for entry in &outcome.entries {
            *per_operator.entry(entry.operator.clone()).or_insert(0) += 1;
        }
        Self {
            source_file: outcome.source_file.clone(),
            database: outcome.database.clone(),
            files_written: outcome.mutant_files.len(),
            per_operator,
            total: outcome.entries.len(),
        }
    }

    /// Number of mutants emitted by `operator`
    pub fn count(&self, operator: &str) -> usize {
        self.per_operator.get(operator).copied().unwrap_or(0)
    }

    /// Print the report to stdout
    pub fn print(&self) {
        println!();
        println!("{}", "Mutant Generation Report".bold());
        println!("{}", "=".repeat(60));
        println!("Source:            {}", self.source_file.display());
        println!();

        if self.per_operator.is_empty() {
            println!("{}", "No operator produced a mutant".yellow());
        } else {
            println!("{}", "Operator   Mutants".bold());
            println!("{}", "-".repeat(40));
            for (operator, count) in &self.per_operator {
                println!("{:<10} {:>7}", operator, count);
            }
        }

        println!();
        println!("{}", "Summary".bold());
        println!("{}", "-".repeat(40));
        let total = self.total.to_string();
        let total = if self.total > 0 {
            total.green().bold()
        } else {
            total.yellow().bold()
        };
        println!("Total mutants:     {}", total);
        println!("Database:          {}", self.database.display().to_string().dimmed());
        println!("Files written:     {}", self.files_written);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{SourceLocation, SourceRange};
    use crate::recorder::MutantEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_per_operator() {
        let range = SourceRange::new(SourceLocation::new(1, 1), SourceLocation::new(1, 2));
        let outcome = GenerationOutcome {
            source_file: PathBuf::from("a.c"),
            database: PathBuf::from("out/a_mut_db.csv"),
            mutant_files: vec![PathBuf::from("out/a.MUT1.c")],
            entries: vec![
                MutantEntry::new("VTWD", "x", range, "(x+1)", 1),
                MutantEntry::new("VTWD", "x", range, "(x-1)", 1),
                MutantEntry::new("OAAN", "+", range, "-", 1),
            ],
        };
        let report = GenerationReport::new(&outcome);
        assert_eq!(report.total, 3);
        assert_eq!(report.count("VTWD"), 2);
        assert_eq!(report.count("OAAN"), 1);
        assert_eq!(report.count("SSDL"), 0);
        assert_eq!(report.files_written, 1);
        let names: Vec<_> = report.per_operator.keys().map(String::as_str).collect();
        assert_eq!(names, ["OAAN", "VTWD"]);
    }
}
