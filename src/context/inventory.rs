//! Whole-file inventory gathered before mutant generation
//!
//! Constant and string replacement need every literal of the current
//! function, including those after the node being mutated, so they are
//! collected in a separate first pass. Deleting a statement needs to know
//! which gotos target the labels inside it.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::frontend::ast::{Expr, ExprKind, FunctionDef, Stmt, StmtKind, TranslationUnit};
use crate::frontend::visit::{self, Visit};
use crate::frontend::{SourceLocation, SourceMap, SourceRange};

/// A distinct numeric or character constant
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantRecord {
    /// Literal text; character literals are stored as their integer value
    pub text: String,
    pub is_float: bool,
    /// First occurrence
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteralRecord {
    pub text: String,
    pub location: SourceLocation,
}

#[derive(Debug, Default)]
pub struct Inventory {
    pub global_constants: Vec<ConstantRecord>,
    /// Constants used inside function bodies, deduplicated per function,
    /// ordered by location
    pub local_constants: Vec<ConstantRecord>,
    pub global_strings: Vec<StringLiteralRecord>,
    pub local_strings: Vec<StringLiteralRecord>,
    pub labels: Vec<SourceLocation>,
    /// Label statement location to the locations of gotos targeting it
    pub label_gotos: BTreeMap<SourceLocation, Vec<SourceLocation>>,
}

impl Inventory {
    /// Run the first pass over `tu`
    pub fn gather(tu: &TranslationUnit, map: &SourceMap) -> Self {
        let mut gatherer = Gatherer {
            map,
            inventory: Inventory::default(),
            function: None,
            global_seen: HashSet::new(),
            local_seen: HashSet::new(),
            global_strings_seen: HashSet::new(),
            local_strings_seen: HashSet::new(),
            label_names: HashMap::new(),
            pending_gotos: Vec::new(),
        };
        gatherer.visit_translation_unit(tu);
        let inventory = gatherer.inventory;
        debug!(
            global_constants = inventory.global_constants.len(),
            local_constants = inventory.local_constants.len(),
            labels = inventory.labels.len(),
            "gathered inventory"
        );
        inventory
    }

    /// Locations of gotos that jump to the label at `label`
    pub fn gotos_to(&self, label: SourceLocation) -> &[SourceLocation] {
        self.label_gotos
            .get(&label)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True unless some label inside `range` is the target of a goto outside it
    pub fn labels_removable(&self, range: &SourceRange) -> bool {
        self.labels
            .iter()
            .filter(|label| range.contains(**label))
            .all(|label| {
                self.gotos_to(*label)
                    .iter()
                    .all(|goto| range.contains(*goto))
            })
    }
}

struct Gatherer<'m> {
    map: &'m SourceMap,
    inventory: Inventory,
    function: Option<SourceRange>,
    global_seen: HashSet<String>,
    local_seen: HashSet<String>,
    global_strings_seen: HashSet<String>,
    local_strings_seen: HashSet<String>,
    label_names: HashMap<String, SourceLocation>,
    pending_gotos: Vec<(String, SourceLocation)>,
}

impl Gatherer<'_> {
    fn add_constant(&mut self, text: String, is_float: bool, location: SourceLocation) {
        let record = ConstantRecord {
            text,
            is_float,
            location,
        };
        if self.function.is_some() {
            if self.local_seen.insert(record.text.clone()) {
                self.inventory.local_constants.push(record);
            }
        } else if self.global_seen.insert(record.text.clone()) {
            self.inventory.global_constants.push(record);
        }
    }

    fn add_string(&mut self, text: String, location: SourceLocation) {
        let record = StringLiteralRecord { text, location };
        if self.function.is_some() {
            if self.local_strings_seen.insert(record.text.clone()) {
                self.inventory.local_strings.push(record);
            }
        } else if self.global_strings_seen.insert(record.text.clone()) {
            self.inventory.global_strings.push(record);
        }
    }

    /// Gotos resolve by label name within their own function
    fn resolve_gotos(&mut self) {
        for (name, goto) in self.pending_gotos.drain(..) {
            if let Some(label) = self.label_names.get(&name) {
                self.inventory
                    .label_gotos
                    .entry(*label)
                    .or_default()
                    .push(goto);
            }
        }
        self.label_names.clear();
    }
}

impl<'ast> Visit<'ast> for Gatherer<'_> {
    fn visit_function(&mut self, node: &'ast FunctionDef) {
        self.function = Some(node.range);
        self.local_seen.clear();
        self.local_strings_seen.clear();
        visit::visit_function(self, node);
        self.resolve_gotos();
        self.function = None;
    }

    fn visit_stmt(&mut self, node: &'ast Stmt) {
        match &node.kind {
            StmtKind::Label { name, .. } => {
                self.inventory.labels.push(node.range.start);
                self.inventory.label_gotos.entry(node.range.start).or_default();
                self.label_names.insert(name.clone(), node.range.start);
            }
            StmtKind::Goto { label } => {
                self.pending_gotos.push((label.clone(), node.range.start));
            }
            _ => {}
        }
        visit::visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast Expr) {
        match &node.kind {
            ExprKind::IntLiteral { .. } => {
                let text = self.map.slice(node.range).to_string();
                self.add_constant(text, false, node.range.start);
            }
            ExprKind::FloatLiteral { .. } => {
                let text = self.map.slice(node.range).to_string();
                self.add_constant(text, true, node.range.start);
            }
            ExprKind::CharLiteral { value, .. } => {
                self.add_constant(value.to_string(), false, node.range.start);
            }
            ExprKind::StringLiteral { text } => {
                self.add_string(text.clone(), node.range.start);
            }
            _ => {}
        }
        visit::visit_expr(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use pretty_assertions::assert_eq;

    fn gather(src: &str) -> Inventory {
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        Inventory::gather(&tu, &map)
    }

    fn texts(records: &[ConstantRecord]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_constants_split_by_scope() {
        let inventory = gather(
            "int g = 4;\n\
             int f(void) { return 4 + 'a' + 4 + 1.5; }\n\
             int h(void) { return 4; }\n",
        );
        assert_eq!(texts(&inventory.global_constants), vec!["4"]);
        // deduplicated within a function, not across functions
        assert_eq!(texts(&inventory.local_constants), vec!["4", "97", "1.5", "4"]);
        assert!(inventory.local_constants[2].is_float);
        let locations: Vec<_> = inventory.local_constants.iter().map(|r| r.location).collect();
        let mut sorted = locations.clone();
        sorted.sort();
        assert_eq!(locations, sorted);
    }

    #[test]
    fn test_strings() {
        let inventory = gather(
            "char *s = \"a\";\n\
             void f(void) { char *t = \"b\"; t = \"b\"; t = \"a\"; }\n",
        );
        assert_eq!(inventory.global_strings.len(), 1);
        let local: Vec<_> = inventory.local_strings.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(local, vec!["\"b\"", "\"a\""]);
    }

    #[test]
    fn test_label_goto_map() {
        let inventory = gather(
            "void f(int x) {\n\
             \x20 if (x) goto out;\n\
             \x20 { out: x = 1; }\n\
             }\n\
             void g(void) { out: ; }\n",
        );
        assert_eq!(inventory.labels.len(), 2);
        let first = inventory.labels[0];
        assert_eq!(first, SourceLocation::new(3, 5));
        assert_eq!(inventory.gotos_to(first), &[SourceLocation::new(2, 10)]);
        assert!(inventory.gotos_to(inventory.labels[1]).is_empty());

        let block = SourceRange::new(SourceLocation::new(3, 3), SourceLocation::new(3, 20));
        assert!(!inventory.labels_removable(&block));
        let whole = SourceRange::new(SourceLocation::new(1, 1), SourceLocation::new(4, 2));
        assert!(inventory.labels_removable(&whole));
    }
}
