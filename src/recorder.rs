//! Mutant recorder
//!
//! Accepted mutations are appended to an ordered in-memory log. The log is
//! persisted once the generation pass has finished: one tab-separated row per
//! mutant in the database file, plus optionally one rewritten copy of the
//! source per mutant.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codegen::{apply_substitution, mutant_file_name, mutant_name};
use crate::error::{MutationError, Result};
use crate::frontend::source::count_non_newline_bytes;
use crate::frontend::{SourceMap, SourceRange};

/// One emitted mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutantEntry {
    pub operator: String,
    pub original: String,
    pub original_range: SourceRange,
    pub replacement: String,
    /// Same start as the original; end shifted by the replacement length
    pub replacement_range: SourceRange,
    /// Proteum-style statement line
    pub statement_line: usize,
}

impl MutantEntry {
    pub fn new(
        operator: impl Into<String>,
        original: impl Into<String>,
        original_range: SourceRange,
        replacement: impl Into<String>,
        statement_line: usize,
    ) -> Self {
        let replacement = replacement.into();
        let start = original_range.start;
        let end = start.shifted(count_non_newline_bytes(&replacement));
        Self {
            operator: operator.into(),
            original: original.into(),
            original_range,
            replacement,
            replacement_range: SourceRange::new(start, end),
            statement_line,
        }
    }

    /// Tab-separated database row
    pub fn database_row(&self, source_file: &str, mutant_name: &str) -> String {
        let orig = self.original_range;
        let new = self.replacement_range;
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            source_file,
            mutant_name,
            self.operator,
            self.statement_line,
            orig.start.line,
            orig.start.column,
            orig.end.line,
            orig.end.column,
            self.original,
            new.start.line,
            new.start.column,
            new.end.line,
            new.end.column,
            self.replacement,
        )
    }
}

/// Ordered log of every accepted mutant
#[derive(Debug, Default)]
pub struct Recorder {
    entries: Vec<MutantEntry>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: MutantEntry) {
        debug!(
            operator = %entry.operator,
            at = %entry.original_range.start,
            original = %entry.original,
            replacement = %entry.replacement,
            "mutant"
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MutantEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emitter for one operator at one node, capped at `limit` mutants
    pub fn site<'r>(&'r mut self, operator: &'r str, statement_line: usize, limit: usize) -> SiteRecorder<'r> {
        SiteRecorder {
            recorder: self,
            operator,
            statement_line,
            remaining: limit,
        }
    }

    /// Write the database, truncating any previous one
    pub fn write_database(&self, path: &Path, source_file: &str, stem: &str) -> Result<()> {
        let write_error = |e: std::io::Error| MutationError::WriteError {
            file: path.to_path_buf(),
            error: e.to_string(),
        };
        let mut file = fs::File::create(path).map_err(write_error)?;
        for (index, entry) in self.entries.iter().enumerate() {
            let row = entry.database_row(source_file, &mutant_name(stem, index + 1));
            writeln!(file, "{}", row).map_err(write_error)?;
        }
        info!(path = %path.display(), rows = self.entries.len(), "wrote mutant database");
        Ok(())
    }

    /// Write one rewritten copy of the source per mutant, numbered from 1
    pub fn write_mutant_files(&self, map: &SourceMap, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let path = dir.join(mutant_file_name(stem, index + 1));
            let source = apply_substitution(map, entry.original_range, &entry.replacement);
            fs::write(&path, source).map_err(|e| MutationError::WriteError {
                file: path.clone(),
                error: e.to_string(),
            })?;
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "wrote mutant files");
        Ok(written)
    }
}

/// Emits mutants for one operator application at one node
pub struct SiteRecorder<'r> {
    recorder: &'r mut Recorder,
    operator: &'r str,
    statement_line: usize,
    remaining: usize,
}

impl SiteRecorder<'_> {
    /// Record a mutant unless the site limit is reached or the replacement
    /// equals the original; returns whether it was recorded
    pub fn emit(&mut self, original: &str, range: SourceRange, replacement: impl Into<String>) -> bool {
        let replacement = replacement.into();
        if self.remaining == 0 || replacement == original {
            return false;
        }
        self.remaining -= 1;
        self.recorder.record(MutantEntry::new(
            self.operator,
            original,
            range,
            replacement,
            self.statement_line,
        ));
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}
