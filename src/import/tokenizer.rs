use tracing::warn;

/// Splits one logical line of comma-separated text into its fields.
///
/// Commas inside a quoted span do not delimit, and a doubled quote inside a
/// quoted span yields one literal quote. Quote characters themselves are never
/// emitted. An empty line yields no fields at all, which lets callers skip it.
pub fn tokenize_line(line: &str) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if !inside_quotes => inside_quotes = true,
            '"' => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    inside_quotes = false;
                }
            }
            ',' if !inside_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    fields.push(current);
    fields
}

/// Splits text into logical lines, joining physical lines while a quoted span
/// is open so quoted fields may contain line breaks.
///
/// A `\r` before each line break is dropped so CRLF files tokenize the same
/// as LF files. A quote that no later line closes stays on its own physical
/// line and scanning resumes with the next one.
pub fn split_logical_lines(text: &str) -> Vec<String> {
    let physical: Vec<&str> = physical_lines(text).collect();
    let mut lines = Vec::with_capacity(physical.len());
    let mut start = 0;

    while start < physical.len() {
        let line = physical[start];
        if !flips_quote(line) {
            lines.push(line.to_string());
            start += 1;
            continue;
        }
        match physical[start + 1..].iter().position(|next| flips_quote(next)) {
            Some(offset) => {
                let end = start + 1 + offset;
                lines.push(physical[start..=end].join("\n"));
                start = end + 1;
            }
            None => {
                warn!(line = start + 1, "unterminated quote, keeping the line as is");
                lines.push(line.to_string());
                start += 1;
            }
        }
    }
    lines
}

/// Doubled quotes add two, so only a lone quote leaves a span open.
fn flips_quote(line: &str) -> bool {
    line.matches('"').count() % 2 == 1
}

fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.strip_suffix('\n')
        .unwrap_or(text)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_matches_naive_split() {
        let line = "BT001,K174,,漏胶";
        let expected: Vec<String> = line.split(',').map(str::to_string).collect();
        assert_eq!(tokenize_line(line), expected);
    }

    #[test]
    fn quoted_comma_stays_in_field() {
        assert_eq!(tokenize_line(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn doubled_quote_unescapes() {
        assert_eq!(tokenize_line(r#""x""y""#), vec![r#"x"y"#]);
    }

    #[test]
    fn empty_line_has_no_fields() {
        assert!(tokenize_line("").is_empty());
    }

    #[test]
    fn trailing_comma_emits_empty_field() {
        assert_eq!(tokenize_line("a,"), vec!["a", ""]);
    }

    #[test]
    fn quoted_line_break_stays_in_one_logical_line() {
        let lines = split_logical_lines("h1,h2\r\nv1,\"multi\nline\"\r\nv2,x\n");
        assert_eq!(lines, vec!["h1,h2", "v1,\"multi\nline\"", "v2,x"]);
    }

    #[test]
    fn unterminated_quote_keeps_following_lines() {
        let lines = split_logical_lines("h1,h2\nBT001,12\"cell\nBT002,K175\nBT003,K176\n");
        assert_eq!(lines, vec!["h1,h2", "BT001,12\"cell", "BT002,K175", "BT003,K176"]);
    }

    #[test]
    fn multiline_field_and_unterminated_quote_coexist() {
        let lines = split_logical_lines("h\nB,\"x\ny\"\nA,5\"\nC\n");
        assert_eq!(lines, vec!["h", "B,\"x\ny\"", "A,5\"", "C"]);
    }
}
