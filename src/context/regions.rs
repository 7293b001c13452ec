//! Forbidden regions
//!
//! Each kind keeps a stack of nested ranges rather than a single slot, so an
//! inner construct of the same kind does not erase the outer one.

use std::collections::HashMap;

use crate::frontend::{SourceLocation, SourceRange};

/// Syntactic contexts in which some mutations would not compile or would be meaningless
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// From the start of an assignment's left operand to its operator
    AssignmentLhs,
    /// Size of a file-scope, field or typedef array; never mutated
    ArrayDeclSize,
    /// Size of a block-scope array; mutated, but never made negative
    LocalArraySize,
    SwitchCondition,
    CaseLabel,
    Typedef,
    FieldDecl,
    AddressOf,
    IncrementOperand,
    DecrementOperand,
    ArraySubscript,
    EnumDecl,
    FunctionPrototype,
    /// Operands of `%`, bitwise and shift operators and casts assigned to pointers
    IntegralOnly,
    /// Right operand of a division or remainder, parentheses stripped
    Divisor,
    /// Controlling expression of if, while, do and for
    BranchCondition,
}

#[derive(Debug, Default)]
pub struct RegionStack {
    stacks: HashMap<RegionKind, Vec<SourceRange>>,
}

impl RegionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a region, discarding entries of the same kind that do not enclose it
    pub fn set(&mut self, kind: RegionKind, range: SourceRange) {
        let stack = self.stacks.entry(kind).or_default();
        while let Some(top) = stack.last() {
            if top.encloses(&range) && *top != range {
                break;
            }
            stack.pop();
        }
        stack.push(range);
    }

    /// Drop every region that ends at or before `loc`
    pub fn prune(&mut self, loc: SourceLocation) {
        for stack in self.stacks.values_mut() {
            stack.retain(|range| loc < range.end);
        }
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    pub fn contains(&self, kind: RegionKind, loc: SourceLocation) -> bool {
        self.stack(kind).iter().any(|range| range.contains(loc))
    }

    /// True if a region of `kind` covers exactly `range`
    pub fn is_exactly(&self, kind: RegionKind, range: &SourceRange) -> bool {
        self.stack(kind).iter().any(|r| r == range)
    }

    fn stack(&self, kind: RegionKind) -> &[SourceRange] {
        self.stacks.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: (usize, usize), end: (usize, usize)) -> SourceRange {
        SourceRange::new(
            SourceLocation::new(start.0, start.1),
            SourceLocation::new(end.0, end.1),
        )
    }

    #[test]
    fn test_nested_regions_survive() {
        let mut regions = RegionStack::new();
        let outer = range((1, 1), (1, 30));
        let inner = range((1, 5), (1, 10));
        regions.set(RegionKind::ArraySubscript, outer);
        regions.set(RegionKind::ArraySubscript, inner);
        assert!(regions.is_exactly(RegionKind::ArraySubscript, &outer));
        assert!(regions.is_exactly(RegionKind::ArraySubscript, &inner));

        regions.prune(SourceLocation::new(1, 12));
        assert!(!regions.is_exactly(RegionKind::ArraySubscript, &inner));
        assert!(regions.is_exactly(RegionKind::ArraySubscript, &outer));
        assert!(regions.contains(RegionKind::ArraySubscript, SourceLocation::new(1, 20)));
    }

    #[test]
    fn test_sibling_replaces_previous() {
        let mut regions = RegionStack::new();
        regions.set(RegionKind::AssignmentLhs, range((1, 1), (1, 3)));
        regions.set(RegionKind::AssignmentLhs, range((2, 1), (2, 3)));
        assert!(!regions.is_exactly(RegionKind::AssignmentLhs, &range((1, 1), (1, 3))));
        assert!(!regions.contains(RegionKind::AssignmentLhs, SourceLocation::new(1, 1)));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut regions = RegionStack::new();
        let r = range((3, 1), (3, 9));
        regions.set(RegionKind::Divisor, r);
        assert!(regions.is_exactly(RegionKind::Divisor, &r));
        assert!(!regions.is_exactly(RegionKind::CaseLabel, &r));
        assert!(!regions.contains(RegionKind::CaseLabel, SourceLocation::new(3, 2)));
        regions.clear();
        assert!(!regions.contains(RegionKind::Divisor, SourceLocation::new(3, 2)));
    }
}
