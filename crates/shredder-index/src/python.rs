//! Python front-end: tree-sitter parse tree to [`DeclNode`] forest.

use tree_sitter::{Node, Parser};

use crate::decl::{DeclKind, DeclNode};
use crate::error::{IndexError, Result};
use crate::languages::Lang;

/// Parse Python source and return its top-level declarations.
///
/// Declarations nested in non-declaration statements (`if`, `try`, decorators)
/// are attached to the nearest enclosing declaration, or become roots.
///
/// # Errors
///
/// Returns `IndexError::Parse` if the source contains syntax errors and
/// `IndexError::UnsupportedLanguage` if the grammar is not compiled in.
pub fn parse_declarations(source: &str) -> Result<Vec<DeclNode>> {
    let grammar = Lang::Python
        .grammar()
        .ok_or(IndexError::UnsupportedLanguage)?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| IndexError::Parse(format!("set_language failed: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| IndexError::Parse("parser returned no tree".into()))?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error_line(&root).unwrap_or(1);
        return Err(IndexError::Parse(format!("syntax error near line {at}")));
    }
    reject_non_python3(&root)?;

    let mut roots = Vec::new();
    collect(&root, source.as_bytes(), &mut roots);
    Ok(roots)
}

fn collect(parent: &Node, source: &[u8], out: &mut Vec<DeclNode>) {
    let child_count = u32::try_from(parent.named_child_count()).unwrap_or(u32::MAX);
    for i in 0..child_count {
        let Some(child) = parent.named_child(i) else {
            continue;
        };
        match declaration_kind(child.kind()) {
            Some(kind) => {
                let name = child
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok())
                    .unwrap_or_default();
                let mut children = Vec::new();
                collect(&child, source, &mut children);
                out.push(
                    DeclNode::new(kind, name, child.start_position().row + 1)
                        .ending_at(child.end_position().row + 1)
                        .with_children(children),
                );
            }
            None => collect(&child, source, out),
        }
    }
}

/// The grammar also accepts Python 2 statements and dedents to a column no
/// enclosing block opened. Both are syntax errors for a Python 3 parser.
fn reject_non_python3(node: &Node) -> Result<()> {
    match node.kind() {
        kind @ ("print_statement" | "exec_statement") => {
            let keyword = kind.trim_end_matches("_statement");
            return Err(IndexError::Parse(format!(
                "Python 2 `{keyword}` statement near line {}",
                node.start_position().row + 1
            )));
        }
        "module" | "block" => check_indentation(node)?,
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        reject_non_python3(&child)?;
    }
    Ok(())
}

/// Statements of one suite that start their own line share a column; module
/// statements start at column 0.
fn check_indentation(suite: &Node) -> Result<()> {
    let mut expected = (suite.kind() == "module").then_some(0);
    let mut prev_end_row: Option<usize> = None;
    let mut cursor = suite.walk();
    for stmt in suite.named_children(&mut cursor).filter(|n| !n.is_extra()) {
        let start = stmt.start_position();
        let own_line = prev_end_row.is_none_or(|row| start.row > row);
        prev_end_row = Some(stmt.end_position().row);
        if !own_line {
            continue;
        }
        match expected {
            None => expected = Some(start.column),
            Some(column) if column != start.column => {
                return Err(IndexError::Parse(format!(
                    "inconsistent indentation near line {}",
                    start.row + 1
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn declaration_kind(node_kind: &str) -> Option<DeclKind> {
    match node_kind {
        "function_definition" => Some(DeclKind::Function),
        "class_definition" => Some(DeclKind::Class),
        _ => None,
    }
}

fn first_error_line(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(Node::has_error)
        .find_map(|child| first_error_line(&child))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functions_and_classes_with_spans() {
        let src = "import os\n\ndef a():\n    return 1\n\nclass B:\n    def m(self):\n        pass\n";
        let roots = parse_declarations(src).unwrap();
        assert_eq!(roots.len(), 2);

        assert_eq!(roots[0].kind, DeclKind::Function);
        assert_eq!(roots[0].name, "a");
        assert_eq!(roots[0].start_line, 3);
        assert_eq!(roots[0].end_line, Some(4));

        assert_eq!(roots[1].kind, DeclKind::Class);
        assert_eq!(roots[1].name, "B");
        assert_eq!(roots[1].start_line, 6);
        assert_eq!(roots[1].end_line, Some(8));
        assert_eq!(roots[1].children.len(), 1);
        assert_eq!(roots[1].children[0].name, "m");
        assert_eq!(roots[1].children[0].start_line, 7);
    }

    #[test]
    fn async_def_is_a_function() {
        let roots = parse_declarations("async def fetch():\n    await x()\n").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].kind, DeclKind::Function);
        assert_eq!(roots[0].name, "fetch");
    }

    #[test]
    fn decorated_function_starts_at_def_line() {
        let src = "@cache\ndef cached():\n    return 2\n";
        let roots = parse_declarations(src).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "cached");
        assert_eq!(roots[0].start_line, 2);
    }

    #[test]
    fn declarations_inside_blocks_are_found() {
        let src = "if True:\n    def inner():\n        pass\n";
        let roots = parse_declarations(src).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "inner");
    }

    #[test]
    fn syntax_error_is_parse_failure() {
        let err = parse_declarations("def broken(:\n    pass\n").unwrap_err();
        assert!(matches!(err, IndexError::Parse(_)), "{err:?}");
    }

    #[test]
    fn python2_statements_are_parse_failures() {
        let err = parse_declarations("print \"hello\"\n\ndef f():\n    pass\n").unwrap_err();
        assert!(err.to_string().contains("`print`"), "{err}");

        let err = parse_declarations("def f():\n    exec \"x = 1\"\n").unwrap_err();
        assert!(err.to_string().contains("`exec`"), "{err}");
    }

    #[test]
    fn print_call_is_python3() {
        let roots = parse_declarations("print(\"hello\")\n\ndef f():\n    pass\n").unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn unmatched_dedent_is_parse_failure() {
        let err = parse_declarations("def f():\n    return 1\n  x = 2\n").unwrap_err();
        assert!(matches!(err, IndexError::Parse(_)), "{err:?}");
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn indented_first_statement_is_parse_failure() {
        assert!(parse_declarations("  x = 1\n").is_err());
    }

    #[test]
    fn same_line_statements_and_comments_keep_indentation_valid() {
        let src = "\
import os; import sys
def f():
    a = 1; b = 2
    # trailing note
    if a:  pass
    return (a +
  b)
";
        let roots = parse_declarations(src).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "f");
    }

    #[test]
    fn no_declarations() {
        assert!(parse_declarations("x = 1\nprint(x)\n").unwrap().is_empty());
        assert!(parse_declarations("").unwrap().is_empty());
    }
}
