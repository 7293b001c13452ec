//! Source rewriting for mutant files
//!
//! A mutant is the original file with exactly one range replaced, so the
//! rewrite works on the original text rather than on a printed AST.

use std::path::Path;

use crate::frontend::{SourceMap, SourceRange};

/// Original source with `range` replaced by `replacement`
pub fn apply_substitution(map: &SourceMap, range: SourceRange, replacement: &str) -> String {
    let text = map.text();
    let start = map.offset(range.start);
    let end = map.offset(range.end).max(start);
    let mut mutated = String::with_capacity(text.len() + replacement.len());
    mutated.push_str(&text[..start]);
    mutated.push_str(replacement);
    mutated.push_str(&text[end..]);
    mutated
}

/// Base name used for the database and mutant files: the file name
/// without its extension
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mutant".to_string())
}

/// Name of mutant `id` as written to the database
pub fn mutant_name(stem: &str, id: usize) -> String {
    format!("{}.MUT{}", stem, id)
}

pub fn mutant_file_name(stem: &str, id: usize) -> String {
    format!("{}.c", mutant_name(stem, id))
}

pub fn database_file_name(stem: &str) -> String {
    format!("{}_mut_db.csv", stem)
}
