//! Line and indentation helpers for text spliced into existing code.

/// `"\r\n"` for sources that use it, else `"\n"`.
pub(crate) fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Byte offset of the start of the line containing `offset`.
pub(crate) fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Byte offset just past the newline ending the line containing `offset`,
/// or the end of the source on the last line.
pub(crate) fn line_end_inclusive(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i + 1)
}

/// Leading whitespace of the line containing `offset`.
pub(crate) fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Only whitespace precedes `offset` on its line.
pub(crate) fn starts_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// Only whitespace follows `offset` up to the end of its line.
pub(crate) fn ends_line(source: &str, offset: usize) -> bool {
    source[offset..]
        .chars()
        .take_while(|c| *c != '\n')
        .all(char::is_whitespace)
}

/// Re-indent a block: strip the common leading whitespace of its non-blank
/// lines, then prefix each with `indent`. Leading and trailing blank lines are
/// dropped and blank lines inside stay empty. Lines are joined with `eol`.
pub(crate) fn reindent(text: &str, indent: &str, eol: &str) -> String {
    let lines: Vec<&str> = text
        .trim_matches(['\r', '\n'])
        .lines()
        .map(str::trim_end)
        .collect();
    let common = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{}", &line[common..])
            }
        })
        .collect::<Vec<_>>()
        .join(eol)
}

/// Indentation one level deeper than `indent`, using the file's unit when it
/// can be told from `indent` itself.
pub(crate) fn nested_indent(indent: &str) -> String {
    if indent.starts_with('\t') {
        format!("{indent}\t")
    } else {
        format!("{indent}  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "function App() {\n    return (\n        <div />\n    );\n}";

    #[test]
    fn line_bounds() {
        let div = SOURCE.find("<div").unwrap();
        assert_eq!(&SOURCE[line_start(SOURCE, div)..div], "        ");
        assert_eq!(&SOURCE[div..line_end_inclusive(SOURCE, div)], "<div />\n");
        assert_eq!(line_end_inclusive(SOURCE, SOURCE.len() - 1), SOURCE.len());
        assert_eq!(line_indent(SOURCE, div), "        ");
        assert_eq!(line_indent(SOURCE, 3), "");
    }

    #[test]
    fn alone_on_line() {
        let div = SOURCE.find("<div").unwrap();
        assert!(starts_line(SOURCE, div));
        assert!(ends_line(SOURCE, div + "<div />".len()));

        let ret = SOURCE.find("(\n").unwrap();
        assert!(!starts_line(SOURCE, ret));
    }

    #[test]
    fn reindent_keeps_relative_indentation() {
        let text = "\n      if (ready) {\n        load();\n\n      }\n";
        assert_eq!(reindent(text, "    ", "\n"), "    if (ready) {\n      load();\n\n    }");
    }

    #[test]
    fn reindent_joins_with_file_line_ending() {
        let text = "<p>\n  hi\n</p>\n";
        assert_eq!(reindent(text, "  ", "\r\n"), "  <p>\r\n    hi\r\n  </p>");
        assert_eq!(reindent("<p>\r\n  hi\r\n</p>\r\n", "", "\r\n"), "<p>\r\n  hi\r\n</p>");
    }

    #[test]
    fn line_ending_detection() {
        assert_eq!(line_ending("a\r\nb\r\n"), "\r\n");
        assert_eq!(line_ending("a\nb\n"), "\n");
        assert_eq!(line_ending("a"), "\n");
    }

    #[test]
    fn nested_indent_follows_unit() {
        assert_eq!(nested_indent("  "), "    ");
        assert_eq!(nested_indent("\t"), "\t\t");
    }
}
