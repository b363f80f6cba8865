//! Language-neutral declaration tree.
//!
//! Front-ends (see [`crate::python`]) lower a parse tree into [`DeclNode`]s;
//! the chunker only ever sees this shape.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `def` / `async def`.
    Function,
    /// `class`.
    Class,
}

/// One declaration with its nested declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclNode {
    pub kind: DeclKind,
    pub name: String,
    /// 1-based line of the declaration keyword.
    pub start_line: usize,
    /// 1-based inclusive last line, when the front-end knows it.
    pub end_line: Option<usize>,
    pub children: Vec<DeclNode>,
}

impl DeclNode {
    #[must_use]
    pub fn new(kind: DeclKind, name: impl Into<String>, start_line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            start_line,
            end_line: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn ending_at(mut self, end_line: usize) -> Self {
        self.end_line = Some(end_line);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<DeclNode>) -> Self {
        self.children = children;
        self
    }
}

pub trait DeclVisitor {
    fn visit(&mut self, node: &DeclNode);
}

impl<F: FnMut(&DeclNode)> DeclVisitor for F {
    fn visit(&mut self, node: &DeclNode) {
        self(node);
    }
}

/// Visit every node breadth-first: all roots in order, then their children
/// level by level.
pub fn walk_breadth_first<V: DeclVisitor + ?Sized>(roots: &[DeclNode], visitor: &mut V) {
    let mut queue: VecDeque<&DeclNode> = roots.iter().collect();
    while let Some(node) = queue.pop_front() {
        visitor.visit(node);
        queue.extend(node.children.iter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(roots: &[DeclNode]) -> Vec<String> {
        let mut out = Vec::new();
        walk_breadth_first(roots, &mut |node: &DeclNode| out.push(node.name.clone()));
        out
    }

    #[test]
    fn empty_forest_visits_nothing() {
        assert!(names(&[]).is_empty());
    }

    #[test]
    fn shallower_declarations_come_first() {
        let roots = vec![
            DeclNode::new(DeclKind::Class, "A", 1).with_children(vec![
                DeclNode::new(DeclKind::Function, "a1", 2)
                    .with_children(vec![DeclNode::new(DeclKind::Function, "inner", 3)]),
                DeclNode::new(DeclKind::Function, "a2", 6),
            ]),
            DeclNode::new(DeclKind::Function, "top", 9),
        ];
        assert_eq!(names(&roots), ["A", "top", "a1", "a2", "inner"]);
    }

    #[test]
    fn struct_visitor() {
        struct CountClasses(usize);
        impl DeclVisitor for CountClasses {
            fn visit(&mut self, node: &DeclNode) {
                if node.kind == DeclKind::Class {
                    self.0 += 1;
                }
            }
        }

        let roots = vec![
            DeclNode::new(DeclKind::Class, "A", 1)
                .with_children(vec![DeclNode::new(DeclKind::Class, "B", 2)]),
            DeclNode::new(DeclKind::Function, "f", 5),
        ];
        let mut counter = CountClasses(0);
        walk_breadth_first(&roots, &mut counter);
        assert_eq!(counter.0, 2);
    }
}
