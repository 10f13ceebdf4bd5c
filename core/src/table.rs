//! Fixed-width text tables.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Cell {
    /// Numeric cells are right-justified.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

pub type Row = BTreeMap<String, Cell>;
pub type Formatter = fn(&Cell) -> String;

/// Default formatting: floats get three decimals, everything else its plain form.
pub fn value_string(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Int(v) => v.to_string(),
        Cell::Float(v) => format!("{v:.3}"),
        Cell::Bool(v) => v.to_string(),
        Cell::Null => String::new(),
    }
}

/// Seconds with an `s` suffix, e.g. `3.000s`.
pub fn elapsed_string(cell: &Cell) -> String {
    format!("{}s", value_string(cell))
}

#[derive(Debug, Clone)]
pub struct Column {
    pub key: String,
    pub title: String,
    pub formatter: Option<Formatter>,
}

impl Column {
    /// Column whose key doubles as its title.
    pub fn new(key: &str) -> Self {
        Self::titled(key, key)
    }

    pub fn titled(key: &str, title: &str) -> Self {
        Column {
            key: key.to_string(),
            title: title.to_string(),
            formatter: None,
        }
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    fn format(&self, cell: &Cell) -> String {
        match self.formatter {
            Some(f) => f(cell),
            None => value_string(cell),
        }
    }
}

impl From<&str> for Column {
    fn from(key: &str) -> Self {
        Column::new(key)
    }
}

impl From<(&str, &str)> for Column {
    fn from((key, title): (&str, &str)) -> Self { Column::titled(key, title) }
}

/// Render `rows` as a header line, a dashed rule and one line per row.
///
/// Each column is as wide as its title or its widest rendered value. A key
/// missing from a row renders as an empty cell. No rows or no columns yields
/// an empty string.
pub fn render_table(rows: &[Row], columns: &[Column]) -> String {
    if rows.is_empty() || columns.is_empty() {
        return String::new();
    }

    let null = Cell::Null;
    let cells: Vec<Vec<(&Cell, String)>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| {
                    let cell = row.get(&c.key).unwrap_or(&null);
                    (cell, c.format(cell))
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.title.chars().count()).collect();
    for row in &cells {
        for (w, (_, text)) in widths.iter_mut().zip(row) {
            *w = (*w).max(text.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| format!("{:<w$}", c.title))
        .collect();
    push_line(&mut out, &header, " | ");
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    push_line(&mut out, &rule, "-+-");
    for row in &cells {
        let fields: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|((cell, text), &w)| {
                if cell.is_numeric() {
                    format!("{text:>w$}")
                } else {
                    format!("{text:<w$}")
                }
            })
            .collect();
        push_line(&mut out, &fields, " | ");
    }
    out
}

fn push_line(out: &mut String, fields: &[String], separator: &str) {
    out.push_str(&fields.join(separator));
    out.push('\n');
}
