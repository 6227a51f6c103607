//! CIF text parser.
//!
//! Parses CIF 1.1 text into an untyped [`Document`] tree. Handles all value
//! forms: unquoted, single/double-quoted, and semicolon text fields. Case
//! conventions are preserved in tag and block names.

use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};

use super::dom::{Block, Document, Loop, Value};

/// Errors that can occur during CIF parsing. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum CifParseError {
    #[error("line {line}: data block header has no name")]
    MalformedBlockHeader { line: usize },
    #[error("line {line}: duplicate data block name `{name}`")]
    DuplicateBlock { name: String, line: usize },
    #[error("line {line}: duplicate tag `{tag}` in block `{block}`")]
    DuplicateTag {
        block: String,
        tag: String,
        line: usize,
    },
    #[error("line {line}: loop in block `{block}` has {values} values for {tags} columns")]
    LoopCountMismatch {
        block: String,
        tags: usize,
        values: usize,
        line: usize,
    },
    #[error("line {line}: loop_ without any tags")]
    EmptyLoop { line: usize },
    #[error("line {line}: unterminated semicolon text field")]
    UnterminatedTextField { line: usize },
    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: tag `{tag}` has no value")]
    MissingValue { tag: String, line: usize },
    #[error("line {line}: value `{value}` is not attached to a tag")]
    UnexpectedValue { value: String, line: usize },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parser behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// When `false`, recoverable problems (duplicate tags, stray values,
    /// tags without values, short final loop rows) are logged and skipped.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl ParseOptions {
    pub fn lenient() -> Self {
        Self { strict: false }
    }
}

/// Parse a CIF text string into a [`Document`] with strict checking.
pub fn parse(input: &str) -> Result<Document, CifParseError> {
    parse_with(input, &ParseOptions::default())
}

/// Parse a CIF text string with explicit options.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Document, CifParseError> {
    let doc = Parser::new(input, *options).parse_document()?;
    debug!(
        "parsed {} data block(s): {:?}",
        doc.blocks.len(),
        doc.block_names().collect::<Vec<_>>()
    );
    Ok(doc)
}

/// Read and parse a CIF file from disk.
pub fn parse_file(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Document, CifParseError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| CifParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!("read {} bytes from {}", text.len(), path.display());
    parse_with(&text, options)
}

// ---------------------------------------------------------------------------
// Internal tokenizer / parser
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Token {
    DataBlock(String),
    LoopStart,
    SaveStart(String),
    SaveEnd,
    Global,
    Stop,
    Tag(String),
    Val(Value),
    Eof,
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    at_line_start: bool,
    pending: Option<(Token, usize)>,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: ParseOptions) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            at_line_start: true,
            pending: None,
            options,
        }
    }

    /// Next token together with the line it starts on.
    fn next(&mut self) -> Result<(Token, usize), CifParseError> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        self.skip_whitespace_and_comments();
        let line = self.line;
        let token = self.scan_token()?;
        Ok((token, line))
    }

    fn push_back(&mut self, token: Token, line: usize) {
        debug_assert!(self.pending.is_none());
        self.pending = Some((token, line));
    }

    /// Fails in strict mode, warns and continues otherwise.
    fn recoverable(&self, err: CifParseError) -> Result<(), CifParseError> {
        if self.options.strict {
            Err(err)
        } else {
            warn!("{err}; skipped");
            Ok(())
        }
    }

    // --- Tokenizer ---

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.at_line_start = true;
                }
                // Any other whitespace (incl. form feed) ends column 1
                b if b.is_ascii_whitespace() => {
                    self.pos += 1;
                    self.at_line_start = false;
                }
                b'#' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token, CifParseError> {
        if self.pos >= self.bytes.len() {
            return Ok(Token::Eof);
        }

        let b = self.bytes[self.pos];

        // Semicolon text field (only valid at line start)
        if b == b';' && self.at_line_start {
            return self.scan_semicolon_text();
        }

        self.at_line_start = false;

        if b == b'\'' || b == b'"' {
            return self.scan_quoted(b);
        }

        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        classify_unquoted(&self.input[start..self.pos], self.line)
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Token, CifParseError> {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        loop {
            if self.pos >= self.bytes.len() || self.bytes[self.pos] == b'\n' {
                return Err(CifParseError::UnterminatedQuote { line: self.line });
            }
            if self.bytes[self.pos] == quote {
                // CIF rule: closing quote must be followed by whitespace or EOF
                if self.pos + 1 >= self.bytes.len() || self.bytes[self.pos + 1].is_ascii_whitespace()
                {
                    let val = self.input[start + 1..self.pos].to_string();
                    self.pos += 1; // skip closing quote
                    return Ok(Token::Val(Value::Str(val)));
                }
            }
            self.pos += 1;
        }
    }

    fn scan_semicolon_text(&mut self) -> Result<Token, CifParseError> {
        let open_line = self.line;
        self.pos += 1; // skip opening ;
        self.at_line_start = false;
        let content_start = self.pos;

        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return Err(CifParseError::UnterminatedTextField { line: open_line });
            }
            self.pos += 1; // skip \n
            self.line += 1;

            if self.pos < self.bytes.len() && self.bytes[self.pos] == b';' {
                // Content excludes the line break before the closing ;
                let mut content_end = self.pos - 1;
                if content_end > content_start && self.bytes[content_end - 1] == b'\r' {
                    content_end -= 1;
                }
                let text = self.input[content_start..content_end].to_string();
                self.pos += 1; // skip closing ;
                return Ok(Token::Val(Value::Str(text)));
            }
        }
    }

    // --- Structure parsing ---

    fn parse_document(&mut self) -> Result<Document, CifParseError> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let (token, line) = self.next()?;
            match token {
                Token::Eof => break,
                Token::DataBlock(name) => {
                    if !seen.insert(name.to_ascii_lowercase()) {
                        let err = CifParseError::DuplicateBlock {
                            name: name.clone(),
                            line,
                        };
                        if self.options.strict {
                            return Err(err);
                        }
                        warn!("{err}; kept both");
                    }
                    blocks.push(self.parse_block(name)?);
                }
                Token::Val(v) => self.recoverable(CifParseError::UnexpectedValue {
                    value: display_value(&v),
                    line,
                })?,
                // Anything before the first data block carries no data
                _ => {}
            }
        }
        Ok(Document { blocks })
    }

    fn parse_block(&mut self, name: String) -> Result<Block, CifParseError> {
        let mut block = Block::new(name);
        let mut tags_seen: HashSet<String> = HashSet::new();

        loop {
            let (token, line) = self.next()?;
            match token {
                Token::Eof | Token::DataBlock(_) | Token::Global => {
                    self.push_back(token, line);
                    break;
                }
                Token::SaveEnd => break,
                Token::Stop => {}
                Token::LoopStart => {
                    let lp = self.parse_loop(&block.name, line)?;
                    let mut clash = None;
                    for tag in &lp.tags {
                        if !tags_seen.insert(tag.to_ascii_lowercase()) {
                            clash = Some(tag.clone());
                        }
                    }
                    match clash {
                        Some(tag) => self.recoverable(CifParseError::DuplicateTag {
                            block: block.name.clone(),
                            tag,
                            line,
                        })?,
                        None => block.loops.push(lp),
                    }
                }
                Token::SaveStart(frame_name) => {
                    let frame = self.parse_block(frame_name)?;
                    block.frames.push(frame);
                }
                Token::Tag(tag) => {
                    let (val_token, val_line) = self.next()?;
                    let value = match val_token {
                        Token::Val(v) => v,
                        other => {
                            self.push_back(other, val_line);
                            self.recoverable(CifParseError::MissingValue { tag, line })?;
                            continue;
                        }
                    };
                    if !tags_seen.insert(tag.to_ascii_lowercase()) {
                        self.recoverable(CifParseError::DuplicateTag {
                            block: block.name.clone(),
                            tag,
                            line,
                        })?;
                        continue;
                    }
                    block.pairs.push((tag, value));
                }
                Token::Val(v) => self.recoverable(CifParseError::UnexpectedValue {
                    value: display_value(&v),
                    line,
                })?,
            }
        }

        Ok(block)
    }

    fn parse_loop(&mut self, block: &str, loop_line: usize) -> Result<Loop, CifParseError> {
        let mut tags = Vec::new();
        let mut values = Vec::new();

        loop {
            let (token, line) = self.next()?;
            match token {
                Token::Tag(t) => tags.push(t),
                other => {
                    self.push_back(other, line);
                    break;
                }
            }
        }
        if tags.is_empty() {
            return Err(CifParseError::EmptyLoop { line: loop_line });
        }

        let mut last_line = loop_line;
        loop {
            let (token, line) = self.next()?;
            match token {
                Token::Val(v) => {
                    values.push(v);
                    last_line = line;
                }
                other => {
                    self.push_back(other, line);
                    break;
                }
            }
        }

        let remainder = values.len() % tags.len();
        if remainder != 0 {
            self.recoverable(CifParseError::LoopCountMismatch {
                block: block.to_string(),
                tags: tags.len(),
                values: values.len(),
                line: last_line,
            })?;
            values.truncate(values.len() - remainder);
        }

        Ok(Loop { tags, values })
    }
}

fn classify_unquoted(s: &str, line: usize) -> Result<Token, CifParseError> {
    let lower = s.to_ascii_lowercase();
    let token = if lower.starts_with("data_") {
        if s.len() == 5 {
            return Err(CifParseError::MalformedBlockHeader { line });
        }
        Token::DataBlock(s[5..].to_string())
    } else if lower == "loop_" {
        Token::LoopStart
    } else if lower == "global_" {
        Token::Global
    } else if lower == "stop_" {
        Token::Stop
    } else if lower.starts_with("save_") {
        if s.len() == 5 {
            Token::SaveEnd
        } else {
            Token::SaveStart(s[5..].to_string())
        }
    } else if s.starts_with('_') {
        Token::Tag(s.to_string())
    } else if s == "." {
        Token::Val(Value::Inapplicable)
    } else if s == "?" {
        Token::Val(Value::Unknown)
    } else {
        Token::Val(Value::Str(s.to_string()))
    };
    Ok(token)
}

fn display_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        Value::Inapplicable => ".".into(),
        Value::Unknown => "?".into(),
    }
}
