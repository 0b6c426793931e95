//! Locate the indentation-delimited schema block inside free-form text.

const MARKERS: [&str; 2] = ["Schema::", "Schema:"];

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Return the DSL source following the first `Schema:`/`Schema::` header line,
/// or `None` when the text has no schema block.
///
/// The block runs over blank and indented lines and ends at the first
/// non-blank line indented less than the first non-blank line of the block.
pub fn extract_block(doc: &str) -> Option<String> {
    let mut lines = doc.lines();
    lines.by_ref().find(|line| MARKERS.iter().any(|m| line.contains(m)))?;

    let mut block: Vec<&str> = Vec::new();
    let mut base: Option<usize> = None;
    for line in lines {
        if is_blank(line) {
            block.push(line);
            continue;
        }
        let indent = indentation(line);
        if indent == 0 {
            break;
        }
        match base {
            None => base = Some(indent),
            Some(b) if indent < b => break,
            Some(_) => {}
        }
        block.push(line);
    }

    base?;
    Some(block.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_marker_means_no_schema() {
        assert_eq!(extract_block(""), None);
        assert_eq!(extract_block("test"), None);
        assert_eq!(extract_block("Create an item.\n\n    POST /item\n"), None);
    }

    #[test]
    fn collects_indented_lines_after_double_colon_marker() {
        let doc = "Create an item.\n\n    Schema::\n\n        POST /item\n        {\"a\": i8}\n\n        200\n    ";
        let block = extract_block(doc).unwrap();
        assert!(block.contains("POST /item"));
        assert!(block.contains("200"));
    }

    #[test]
    fn single_colon_marker_is_accepted() {
        let block = extract_block("Schema:\n    GET /users\n    200\n").unwrap();
        assert_eq!(block, "    GET /users\n    200");
    }

    #[test]
    fn dedent_ends_the_block() {
        let doc = "Schema::\n        GET /a\n        200\n    Returns the thing.\n        ignored\n";
        let block = extract_block(doc).unwrap();
        assert_eq!(block, "        GET /a\n        200");
    }

    #[test]
    fn unindented_line_ends_the_block() {
        let doc = "Schema::\n    GET /a\nplain text\n    201\n";
        assert_eq!(extract_block(doc).unwrap(), "    GET /a");
    }

    #[test]
    fn blank_only_block_is_absent() {
        assert_eq!(extract_block("Schema::\n\n   \nend"), None);
    }
}
