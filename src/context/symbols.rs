//! Scope-partitioned variable symbol tables

use crate::error::{MutationError, Result};
use crate::frontend::ast::VarDecl;
use crate::frontend::{CType, SourceLocation, SourceRange, VarCategory};

/// A declared variable as seen by the replacement operators
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: CType,
    pub category: VarCategory,
    /// Location of the declarator name
    pub location: SourceLocation,
    pub is_global: bool,
    pub is_const: bool,
    /// Scope the declaration belongs to; `None` for globals
    pub scope: Option<SourceRange>,
}

impl VariableDeclaration {
    /// Classify `decl`; `None` for variables outside the four categories
    pub fn from_var_decl(decl: &VarDecl, scope: Option<SourceRange>) -> Option<Self> {
        let category = decl.ty.category()?;
        Some(Self {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            category,
            location: decl.name_loc,
            is_global: decl.is_global,
            is_const: decl.is_const,
            scope,
        })
    }
}

type CategoryLists = [Vec<VariableDeclaration>; 4];

#[derive(Debug)]
struct Frame {
    scope: SourceRange,
    lists: CategoryLists,
}

/// Global lists plus one frame of local lists per open scope.
///
/// Keeping the four local lists inside the frame means the scope stack and
/// every local list always have the same depth.
#[derive(Debug, Default)]
pub struct SymbolTable {
    globals: CategoryLists,
    frames: Vec<Frame>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every local scope and open a fresh one for the function
    pub fn enter_function(&mut self, range: SourceRange) {
        self.frames.clear();
        self.enter_scope(range);
    }

    pub fn enter_scope(&mut self, range: SourceRange) {
        self.frames.push(Frame {
            scope: range,
            lists: Default::default(),
        });
    }

    pub fn leave_scope(&mut self) -> Option<SourceRange> {
        self.frames.pop().map(|frame| frame.scope)
    }

    /// Close every innermost scope that does not contain `loc`
    pub fn leave_scopes_before(&mut self, loc: SourceLocation) -> usize {
        let mut closed = 0;
        while let Some(frame) = self.frames.last() {
            if frame.scope.contains(loc) {
                break;
            }
            self.frames.pop();
            closed += 1;
        }
        closed
    }

    /// Innermost open scope
    pub fn current_scope(&self) -> Option<SourceRange> {
        self.frames.last().map(|frame| frame.scope)
    }

    /// Append to the global list or to the innermost local list
    pub fn record(&mut self, decl: VariableDeclaration) -> Result<()> {
        let index = decl.category.index();
        if decl.is_global {
            self.globals[index].push(decl);
            return Ok(());
        }
        match self.frames.last_mut() {
            Some(frame) => {
                frame.lists[index].push(decl);
                Ok(())
            }
            None => Err(MutationError::ScopeDesync {
                name: decl.name,
                line: decl.location.line,
                column: decl.location.column,
            }),
        }
    }

    pub fn scope_depth(&self) -> usize {
        self.frames.len()
    }

    /// Depth of the local list stack for one category
    pub fn local_depth(&self, category: VarCategory) -> usize {
        self.frames
            .iter()
            .map(|frame| &frame.lists[category.index()])
            .count()
    }

    pub fn globals(&self, category: VarCategory) -> &[VariableDeclaration] {
        &self.globals[category.index()]
    }

    /// Locals of every open scope, outermost first
    pub fn locals(&self, category: VarCategory) -> impl Iterator<Item = &VariableDeclaration> {
        self.frames
            .iter()
            .flat_map(move |frame| frame.lists[category.index()].iter())
    }

    /// Globals declared before `loc`
    pub fn globals_visible_at(
        &self,
        loc: SourceLocation,
        category: VarCategory,
    ) -> Vec<&VariableDeclaration> {
        self.globals(category)
            .iter()
            .filter(|decl| decl.location < loc)
            .collect()
    }

    /// Locals declared before `loc` in a scope that contains `loc`
    pub fn locals_visible_at(
        &self,
        loc: SourceLocation,
        category: VarCategory,
    ) -> Vec<&VariableDeclaration> {
        self.locals(category)
            .filter(|decl| decl.location < loc)
            .filter(|decl| decl.scope.map_or(false, |scope| scope.contains(loc)))
            .collect()
    }

    /// Globals followed by locals, both filtered for visibility at `loc`
    pub fn visible_at(
        &self,
        loc: SourceLocation,
        category: VarCategory,
    ) -> Vec<&VariableDeclaration> {
        let mut visible = self.globals_visible_at(loc, category);
        visible.extend(self.locals_visible_at(loc, category));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::IntKind;

    fn loc(line: usize, column: usize) -> SourceLocation {
        SourceLocation::new(line, column)
    }

    fn range(start: (usize, usize), end: (usize, usize)) -> SourceRange {
        SourceRange::new(loc(start.0, start.1), loc(end.0, end.1))
    }

    fn var(name: &str, at: SourceLocation, scope: Option<SourceRange>) -> VariableDeclaration {
        VariableDeclaration {
            name: name.to_string(),
            ty: CType::Int(IntKind::Int),
            category: VarCategory::Scalar,
            location: at,
            is_global: scope.is_none(),
            is_const: false,
            scope,
        }
    }

    #[test]
    fn test_depths_move_together() {
        let mut table = SymbolTable::new();
        table.enter_function(range((1, 1), (10, 2)));
        table.enter_scope(range((2, 5), (5, 6)));
        for category in VarCategory::ALL {
            assert_eq!(table.local_depth(category), table.scope_depth());
        }
        assert_eq!(table.leave_scopes_before(loc(7, 1)), 1);
        for category in VarCategory::ALL {
            assert_eq!(table.local_depth(category), 1);
        }
    }

    #[test]
    fn test_local_without_scope_is_desync() {
        let mut table = SymbolTable::new();
        let err = table.record(var("x", loc(1, 5), Some(range((1, 1), (2, 1)))));
        assert!(matches!(err, Err(MutationError::ScopeDesync { .. })));
    }

    #[test]
    fn test_visibility_filters() {
        let function = range((2, 1), (20, 2));
        let block = range((3, 5), (6, 6));
        let mut table = SymbolTable::new();
        table.record(var("g", loc(1, 5), None)).unwrap();
        table.enter_function(function);
        table.record(var("a", loc(2, 9), Some(function))).unwrap();
        table.enter_scope(block);
        table.record(var("b", loc(4, 13), Some(block))).unwrap();

        let names = |decls: Vec<&VariableDeclaration>| {
            decls.iter().map(|d| d.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(table.visible_at(loc(5, 9), VarCategory::Scalar)), ["g", "a", "b"]);
        // declared at or after the reference point
        assert_eq!(names(table.visible_at(loc(4, 13), VarCategory::Scalar)), ["g", "a"]);
        // block already closed textually even though the frame is still open
        assert_eq!(names(table.visible_at(loc(8, 1), VarCategory::Scalar)), ["g", "a"]);
    }
}
