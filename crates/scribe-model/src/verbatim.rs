//! String literals spanning lines of member code
//!
//! Leading whitespace on a line that begins inside a string, heredoc or
//! nowdoc belongs to the string value, and so does trailing whitespace
//! before a line break inside one. Dedenting on load, indenting on print and
//! tab expansion leave those bytes alone.

use crate::parser::php_parser;
use std::ops::Range;
use tree_sitter::Node;

/// Node kinds whose text is part of a runtime value
const LITERAL_KINDS: &[&str] = &[
    "string",
    "encapsed_string",
    "heredoc",
    "nowdoc",
    "shell_command_expression",
];

/// Position of one line relative to the literals around it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LineMark {
    /// First byte of the line lies inside a literal
    pub(crate) opens_inside: bool,
    /// Line break ending the line lies inside a literal
    pub(crate) closes_inside: bool,
}

/// Byte ranges of every literal below `node`
pub(crate) fn literal_ranges(node: Node<'_>) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    collect(node, &mut ranges);
    ranges
}

fn collect(node: Node<'_>, ranges: &mut Vec<Range<usize>>) {
    if node.is_named() && LITERAL_KINDS.contains(&node.kind()) {
        ranges.push(node.byte_range());
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, ranges);
    }
}

/// Byte `at` belongs to a literal
#[inline]
pub(crate) fn in_literal(ranges: &[Range<usize>], at: usize) -> bool {
    ranges.iter().any(|r| r.contains(&at))
}

/// Mark every `\n`-separated line of `text`, which starts at byte `offset`
pub(crate) fn line_marks(text: &str, offset: usize, ranges: &[Range<usize>]) -> Vec<LineMark> {
    let mut marks = Vec::new();
    let mut start = offset;
    for line in text.split('\n') {
        let end = start + line.len();
        marks.push(LineMark {
            opens_inside: ranges.iter().any(|r| r.start < start && start < r.end),
            closes_inside: in_literal(ranges, end),
        });
        start = end + 1;
    }
    marks
}

/// Mark the lines of a code fragment detached from its file
///
/// The fragment is parsed between `prefix` and `suffix`. Fragments without
/// a line break or a string delimiter are not parsed.
pub(crate) fn fragment_marks(prefix: &str, code: &str, suffix: &str) -> Vec<LineMark> {
    let may_span = code.contains('\n') && code.contains(|c| matches!(c, '\'' | '"' | '`' | '<'));
    let ranges = if may_span {
        fragment_ranges(&format!("{prefix}{code}{suffix}"))
    } else {
        Vec::new()
    };
    line_marks(code, prefix.len(), &ranges)
}

fn fragment_ranges(source: &str) -> Vec<Range<usize>> {
    let Ok(mut parser) = php_parser() else {
        return Vec::new();
    };
    parser
        .parse(source, None)
        .map(|tree| literal_ranges(tree.root_node()))
        .unwrap_or_default()
}

/// Trailing whitespace dropped unless the line break is inside a literal
#[inline]
pub(crate) fn line_end(line: &str, mark: LineMark) -> &str {
    if mark.closes_inside {
        line
    } else {
        line.trim_end()
    }
}

/// Up to `width` leading spaces removed unless the line opens inside a literal
#[inline]
pub(crate) fn strip_indent(line: &str, mark: LineMark, width: usize) -> &str {
    if mark.opens_inside {
        return line;
    }
    let spaces = line.len() - line.trim_start_matches(' ').len();
    &line[spaces.min(width)..]
}

/// Source with tabs outside literals expanded; `None` when there are none
pub(crate) fn expand_tabs(source: &str, ranges: &[Range<usize>]) -> Option<String> {
    let expands = |(at, c): (usize, char)| c == '\t' && !in_literal(ranges, at);
    if !source.char_indices().any(expands) {
        return None;
    }
    let mut out = String::with_capacity(source.len() + 32);
    for (at, c) in source.char_indices() {
        if expands((at, c)) {
            out.push_str("    ");
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(source: &str) -> Vec<Range<usize>> {
        fragment_ranges(source)
    }

    #[test]
    fn marks_continuation_lines() {
        let source = "<?php\n$q = 'a  \n  b';\n$r = 1;\n";
        let marks = line_marks(source, 0, &ranges(source));

        assert_eq!(marks[1], LineMark { opens_inside: false, closes_inside: true });
        assert_eq!(marks[2], LineMark { opens_inside: true, closes_inside: false });
        assert_eq!(marks[3], LineMark::default());
    }

    #[test]
    fn heredoc_closing_marker_is_inside() {
        let source = "<?php\n$x = <<<EOT\n    hi\n    EOT;\n";
        let marks = line_marks(source, 0, &ranges(source));

        assert!(marks[2].opens_inside);
        assert!(marks[3].opens_inside);
    }

    #[test]
    fn fragment_without_delimiters_is_plain() {
        let marks = fragment_marks("<?php\n", "if ($a) {\n    return 1;\n}", "\n");
        assert!(marks.iter().all(|m| *m == LineMark::default()));
    }

    #[test]
    fn tabs_inside_strings_survive() {
        let source = "<?php\n\t$a = \"x\ty\";\n";
        let expanded = expand_tabs(source, &ranges(source)).expect("tab outside");

        assert_eq!(expanded, "<?php\n    $a = \"x\ty\";\n");
        assert_eq!(expand_tabs("<?php\n$a = 'x\ty';\n", &ranges("<?php\n$a = 'x\ty';\n")), None);
    }

    #[test]
    fn indent_kept_inside_literal() {
        let inside = LineMark { opens_inside: true, closes_inside: false };
        assert_eq!(strip_indent("      b';", inside, 4), "      b';");
        assert_eq!(strip_indent("      b;", LineMark::default(), 4), "  b;");
        assert_eq!(strip_indent("  b;", LineMark::default(), 4), "b;");
    }
}
