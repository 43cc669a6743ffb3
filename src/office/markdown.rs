//! Markdown adapter: light regex-based structure detection into document
//! blocks, block rendering back to Markdown, and HTML generation via
//! pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::sync::LazyLock;

use crate::office::docx::DocBlock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading pattern"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("bullet pattern"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|(.+)\|\s*$").expect("table row pattern"));
static TABLE_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?[\s:|-]+\|?\s*$").expect("table rule pattern"));

/// Splits Markdown text into heading/bullet/table/paragraph blocks.
/// Inline formatting is kept verbatim inside the block text.
pub fn to_blocks(text: &str) -> Vec<DocBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    let mut flush_paragraph = |blocks: &mut Vec<DocBlock>, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            blocks.push(DocBlock::Paragraph {
                text: paragraph.join(" "),
            });
            paragraph.clear();
        }
    };

    for line in text.lines() {
        if let Some(captures) = TABLE_ROW.captures(line) {
            if TABLE_RULE.is_match(line) && !table.is_empty() {
                continue; // header separator row
            }
            flush_paragraph(&mut blocks, &mut paragraph);
            let cells: Vec<String> = captures[1]
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect();
            table.push(cells);
            continue;
        }
        if !table.is_empty() {
            blocks.push(DocBlock::Table {
                rows: std::mem::take(&mut table),
            });
        }

        if line.trim().is_empty() {
            flush_paragraph(&mut blocks, &mut paragraph);
        } else if let Some(captures) = HEADING.captures(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            blocks.push(DocBlock::Heading {
                level: captures[1].len().min(9) as u8,
                text: captures[2].trim().to_string(),
            });
        } else if let Some(captures) = BULLET.captures(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            blocks.push(DocBlock::Bullet {
                text: captures[1].trim().to_string(),
            });
        } else {
            paragraph.push(line.trim().to_string());
        }
    }

    if !table.is_empty() {
        blocks.push(DocBlock::Table { rows: table });
    }
    flush_paragraph(&mut blocks, &mut paragraph);
    blocks
}

/// Renders blocks as Markdown; tables become pipe tables.
pub fn from_blocks(blocks: &[DocBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            DocBlock::Heading { level, text } => {
                out.push_str(&"#".repeat(usize::from(*level).min(6)));
                out.push(' ');
                out.push_str(text);
                out.push_str("\n\n");
            }
            DocBlock::Paragraph { text } => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            DocBlock::Bullet { text } => {
                out.push_str("- ");
                out.push_str(text);
                out.push('\n');
            }
            DocBlock::Table { rows } => {
                for (index, row) in rows.iter().enumerate() {
                    out.push_str("| ");
                    out.push_str(&row.join(" | "));
                    out.push_str(" |\n");
                    if index == 0 {
                        out.push_str("|");
                        for _ in row {
                            out.push_str(" --- |");
                        }
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
        }
    }
    out.trim_end().to_string() + "\n"
}

pub fn to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(text, options);
    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
