//! Hand-rolled CSV reader/writer: double-quoted fields, embedded
//! delimiters, doubled-quote escapes, CRLF line endings.

/// Parses CSV text into rows of fields. `delimiter` is a single character;
/// quoted fields may contain the delimiter, doubled quotes, and newlines.
pub fn parse(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // A quoted empty field ("") leaves `field` empty, so the tail guard
    // needs to know a quote opened the pending field.
    let mut field_quoted = false;
    let mut chars = text.chars().peekable();
    let mut saw_any = false;

    while let Some(ch) = chars.next() {
        saw_any = true;
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                field_quoted = true;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                field_quoted = false;
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                field_quoted = false;
            }
            _ if ch == delimiter => {
                row.push(std::mem::take(&mut field));
                field_quoted = false;
            }
            _ => field.push(ch),
        }
    }

    if saw_any && (!field.is_empty() || !row.is_empty() || field_quoted) {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Writes rows back out, quoting only fields that need it.
pub fn write(rows: &[Vec<String>], delimiter: char) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .map(|field| encode_field(field, delimiter))
            .collect();
        out.push_str(&line.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

fn encode_field(field: &str, delimiter: char) -> String {
    let needs_quotes =
        field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
