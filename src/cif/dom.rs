//! CIF Document Object Model.
//!
//! Provides an untyped representation of a CIF file, with a query API
//! for extracting data by tag name. Nothing here interprets tag meaning;
//! see [`super::extract`] for typed records.

use std::fmt;

use serde::Serialize;

/// A parsed CIF document containing one or more data blocks, in file order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A data block (`data_NAME`) containing key-value pairs, loops, and save frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub name: String,
    pub pairs: Vec<(String, Value)>,
    pub loops: Vec<Loop>,
    pub frames: Vec<Block>, // save frames (rare, only in dictionaries)
}

/// A looped data table: named columns with row-major values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Loop {
    /// Column names (tags).
    pub tags: Vec<String>,
    /// Row-major flat array of values. Length = `tags.len() * nrows()`.
    pub values: Vec<Value>,
}

/// A CIF data value.
///
/// `?` and `.` are markers, not text: a quoted `'?'` is `Str("?")`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// A string value (unquoted, single-quoted, double-quoted, or semicolon text).
    Str(String),
    /// The inapplicable marker `.`.
    Inapplicable,
    /// The unknown marker `?`.
    Unknown,
}

/// A CIF number with its optional standard uncertainty, e.g. `7.1183(1)`.
///
/// The parenthesised digits are kept as written. They refer to the last
/// shown decimal place(s) of the mantissa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measured {
    pub value: f64,
    /// Digits inside the parentheses, if any.
    pub su_digits: Option<u32>,
    /// Number of digits after the decimal point in the mantissa.
    pub decimals: u32,
    /// Power of ten from an `e`/`E` suffix, 0 when absent.
    pub exponent: i32,
}

impl Measured {
    /// Parse CIF numeric notation: `1`, `-0.25`, `7.1183(1)`, `1.2E-3(4)`.
    ///
    /// Returns `None` for anything that is not a finite number.
    pub fn parse(s: &str) -> Option<Self> {
        let (number, su_digits) = match s.find('(') {
            Some(open) => {
                let digits = s[open + 1..].strip_suffix(')')?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                (&s[..open], Some(digits.parse().ok()?))
            }
            None => (s, None),
        };

        if !number
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
        {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() {
            return None;
        }

        let (mantissa, exponent) = match number.find(|c| c == 'e' || c == 'E') {
            Some(idx) => (&number[..idx], number[idx + 1..].parse().ok()?),
            None => (number, 0),
        };
        let decimals = mantissa
            .find('.')
            .map(|idx| (mantissa.len() - idx - 1) as u32)
            .unwrap_or(0);

        Some(Self {
            value,
            su_digits,
            decimals,
            exponent,
        })
    }

    /// Standard uncertainty on the value's own scale (`7.1183(1)` → `0.0001`).
    pub fn su(&self) -> Option<f64> {
        self.su_digits.map(|d| d as f64 * self.resolution())
    }

    /// One unit in the last stated decimal place (`1.132` → `0.001`).
    pub fn resolution(&self) -> f64 {
        let decimals = i32::try_from(self.decimals).unwrap_or(i32::MAX);
        10f64.powi(self.exponent.saturating_sub(decimals))
    }
}

impl fmt::Display for Measured {
    /// Writes the number back in CIF notation, uncertainty included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.decimals as usize;
        if self.exponent == 0 {
            write!(f, "{:.*}", decimals, self.value)?;
        } else {
            let mantissa = self.value / 10f64.powi(self.exponent);
            if mantissa.is_finite() {
                write!(f, "{:.*}E{}", decimals, mantissa, self.exponent)?;
            } else {
                // Exponent beyond f64 range; the value itself is exact
                write!(f, "{:e}", self.value)?;
            }
        }
        if let Some(su) = self.su_digits {
            write!(f, "({su})")?;
        }
        Ok(())
    }
}

impl Value {
    /// Returns the string content, or `None` for `.` / `?`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Parses the value as a number with optional uncertainty.
    pub fn as_measured(&self) -> Option<Measured> {
        Measured::parse(self.as_str()?)
    }

    /// Tries to parse the value as `f64`.
    ///
    /// Handles CIF uncertainty notation like `50.123(4)` by dropping the
    /// parenthesized uncertainty.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_measured().map(|m| m.value)
    }

    /// Tries to parse the value as `i32`.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_str()?.parse().ok()
    }

    /// Tries to parse the value as `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_str()?.parse().ok()
    }

    /// Returns `true` if this is a `Str` value (not `.` or `?`).
    pub fn is_present(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_inapplicable(&self) -> bool {
        matches!(self, Value::Inapplicable)
    }
}

impl Loop {
    /// Number of rows in this loop.
    pub fn nrows(&self) -> usize {
        if self.tags.is_empty() {
            0
        } else {
            self.values.len() / self.tags.len()
        }
    }

    /// Find the column index for a tag (case-insensitive).
    pub fn column_index(&self, tag: &str) -> Option<usize> {
        self.tags
            .iter()
            .position(|t| t.eq_ignore_ascii_case(tag))
    }

    /// One row as a slice, in tag order.
    pub fn row(&self, row: usize) -> Option<&[Value]> {
        if row >= self.nrows() {
            return None;
        }
        let stride = self.tags.len();
        Some(&self.values[row * stride..(row + 1) * stride])
    }

    /// All complete rows, in file order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        (0..self.nrows()).filter_map(move |i| self.row(i))
    }
}

impl Block {
    /// Creates an empty block.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get a single key-value pair by tag name (case-insensitive).
    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(tag))
            .map(|(_, v)| v)
    }

    /// First scalar found among several alternative tag spellings.
    pub fn get_any(&self, tags: &[&str]) -> Option<&Value> {
        tags.iter().find_map(|t| self.get(t))
    }

    /// Find the loop containing a given tag (case-insensitive).
    pub fn find_loop(&self, tag: &str) -> Option<&Loop> {
        self.loops
            .iter()
            .find(|lp| lp.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// Find the loop containing every one of `tags`.
    pub fn find_loop_with(&self, tags: &[&str]) -> Option<&Loop> {
        self.loops
            .iter()
            .find(|lp| tags.iter().all(|t| lp.column_index(t).is_some()))
    }

    /// Returns `true` if the tag appears as a scalar or as a loop column.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.get(tag).is_some() || self.find_loop(tag).is_some()
    }

    /// Number of distinct tags: scalars plus loop columns.
    pub fn tag_count(&self) -> usize {
        self.pairs.len() + self.loops.iter().map(|lp| lp.tags.len()).sum::<usize>()
    }

    /// Get a single column from whatever loop contains it.
    pub fn column(&self, tag: &str) -> Option<ColumnIter<'_>> {
        let lp = self.find_loop(tag)?;
        let col_idx = lp.column_index(tag)?;
        Some(ColumnIter {
            lp,
            col_idx,
            row: 0,
        })
    }

    /// Get multiple columns from the same loop, for row-wise iteration.
    ///
    /// Returns `None` if any tag is missing or if the tags span different loops.
    pub fn columns(&self, tags: &[&str]) -> Option<Columns<'_>> {
        if tags.is_empty() {
            return None;
        }
        let lp = self.find_loop_with(tags)?;
        let mut col_indices = Vec::with_capacity(tags.len());
        for tag in tags {
            col_indices.push(lp.column_index(tag)?);
        }
        Some(Columns { lp, col_indices })
    }
}

impl Document {
    /// Find a block by name (case-insensitive).
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }
}

/// Iterator over a single column's values.
pub struct ColumnIter<'a> {
    lp: &'a Loop,
    col_idx: usize,
    row: usize,
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.lp.nrows() {
            return None;
        }
        let stride = self.lp.tags.len();
        let idx = self.row * stride + self.col_idx;
        self.row += 1;
        Some(&self.lp.values[idx])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.lp.nrows() - self.row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ColumnIter<'_> {}

/// Multi-column accessor for row-wise iteration over a loop.
pub struct Columns<'a> {
    lp: &'a Loop,
    col_indices: Vec<usize>,
}

impl<'a> Columns<'a> {
    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.lp.nrows()
    }

    /// Number of selected columns.
    pub fn ncols(&self) -> usize {
        self.col_indices.len()
    }

    /// Get the value at `(row, col)` where `col` indexes into the requested tags.
    pub fn get(&self, row: usize, col: usize) -> &'a Value {
        let stride = self.lp.tags.len();
        &self.lp.values[row * stride + self.col_indices[col]]
    }

    /// Iterate over rows, yielding a `Vec<&Value>` per row.
    pub fn iter(&self) -> RowIter<'a> {
        RowIter {
            lp: self.lp,
            col_indices: self.col_indices.clone(),
            row: 0,
        }
    }
}

/// Row-wise iterator over selected columns of a loop.
pub struct RowIter<'a> {
    lp: &'a Loop,
    col_indices: Vec<usize>,
    row: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Vec<&'a Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.lp.nrows() {
            return None;
        }
        let stride = self.lp.tags.len();
        let base = self.row * stride;
        let row: Vec<&Value> = self
            .col_indices
            .iter()
            .map(|&ci| &self.lp.values[base + ci])
            .collect();
        self.row += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.lp.nrows() - self.row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowIter<'_> {}
