//! CIF text writer.
//!
//! Serializes a [`Document`] back to CIF 1.1 text. Every value is written
//! with the lightest delimiter that parses back to the same [`Value`]:
//! bare, single-quoted, double-quoted, or a semicolon text field.
//!
//! Scalars are written before loops within each block; block, pair, loop
//! and row order are preserved. A text value containing a line that starts
//! with `;` cannot be expressed in CIF 1.1 and is written as-is.

use std::fmt::{self, Write};

use super::dom::{Block, Document, Value};

/// Column at which scalar values start when the tag is shorter.
const VALUE_COLUMN: usize = 35;

/// How a single value is laid out in the output.
#[derive(Debug, PartialEq)]
enum Rendered<'a> {
    /// Fits on the current line, delimiters included.
    Inline(String),
    /// Needs a `;`-delimited text field starting at column 1.
    TextField(&'a str),
}

/// Serialize a document to a CIF string.
pub fn write(doc: &Document) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_to(&mut out, doc);
    out
}

/// Serialize a document into any [`fmt::Write`] sink.
pub fn write_to<W: Write>(out: &mut W, doc: &Document) -> fmt::Result {
    for (i, block) in doc.blocks.iter().enumerate() {
        if i > 0 {
            out.write_char('\n')?;
        }
        writeln!(out, "data_{}", block.name)?;
        write_block_body(out, block)?;
    }
    Ok(())
}

fn write_block_body<W: Write>(out: &mut W, block: &Block) -> fmt::Result {
    for (tag, value) in &block.pairs {
        match render(value) {
            Rendered::Inline(text) => {
                let pad = VALUE_COLUMN.saturating_sub(tag.len()).max(1);
                writeln!(out, "{tag}{:pad$}{text}", "")?;
            }
            Rendered::TextField(text) => {
                writeln!(out, "{tag}")?;
                writeln!(out, ";{text}")?;
                writeln!(out, ";")?;
            }
        }
    }

    for lp in &block.loops {
        writeln!(out)?;
        writeln!(out, "loop_")?;
        for tag in &lp.tags {
            writeln!(out, " {tag}")?;
        }
        for row in lp.rows() {
            let mut line_open = false;
            for value in row {
                match render(value) {
                    Rendered::Inline(text) => {
                        out.write_char(' ')?;
                        out.write_str(&text)?;
                        line_open = true;
                    }
                    Rendered::TextField(text) => {
                        if line_open {
                            out.write_char('\n')?;
                        }
                        writeln!(out, ";{text}")?;
                        out.write_char(';')?;
                        line_open = true;
                    }
                }
            }
            out.write_char('\n')?;
        }
    }

    for frame in &block.frames {
        writeln!(out)?;
        writeln!(out, "save_{}", frame.name)?;
        write_block_body(out, frame)?;
        writeln!(out, "save_")?;
    }
    Ok(())
}

/// Render one value the way it would appear inline, or `None` if it needs
/// a text field.
pub fn format_inline(value: &Value) -> Option<String> {
    match render(value) {
        Rendered::Inline(s) => Some(s),
        Rendered::TextField(_) => None,
    }
}

fn render(value: &Value) -> Rendered<'_> {
    let s = match value {
        Value::Unknown => return Rendered::Inline("?".into()),
        Value::Inapplicable => return Rendered::Inline(".".into()),
        Value::Str(s) => s.as_str(),
    };

    if s.contains('\n') || s.contains('\r') {
        return Rendered::TextField(s);
    }
    if s.is_empty() {
        return Rendered::Inline("''".into());
    }
    if !needs_quotes(s) {
        return Rendered::Inline(s.to_string());
    }
    if can_quote(s, '\'') {
        Rendered::Inline(format!("'{s}'"))
    } else if can_quote(s, '"') {
        Rendered::Inline(format!("\"{s}\""))
    } else {
        Rendered::TextField(s)
    }
}

fn needs_quotes(s: &str) -> bool {
    if s == "?" || s == "." {
        return true;
    }
    if s.starts_with(['_', '\'', '"', ';', '#', '$', '[', ']']) {
        return true;
    }
    if s.chars().any(char::is_whitespace) {
        return true;
    }
    let lower = s.to_ascii_lowercase();
    lower.starts_with("data_")
        || lower.starts_with("save_")
        || lower == "loop_"
        || lower == "global_"
        || lower == "stop_"
}

/// A quote character can delimit `s` unless `s` contains that quote followed
/// by whitespace, or ends with it.
fn can_quote(s: &str, quote: char) -> bool {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == quote {
            match chars.peek() {
                None => return false,
                Some(next) if next.is_whitespace() => return false,
                _ => {}
            }
        }
    }
    true
}
