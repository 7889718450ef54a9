use chrono::{NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, SweeperError};

/// A single cell of a frame
///
/// Integers are kept exactly as `Int`; only fractional or out-of-range
/// numbers become `Number`. Serialises to the natural JSON type, with
/// date-times as their CSV text and `null` for missing entries.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Empty,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// `Int` and `Number` cells count as numbers
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Shorthand for building text cells in code and tests
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Empty, Into::into)
    }
}

impl fmt::Display for Value {
    /// Renders the value the way it is written to CSV
    ///
    /// Integral numbers print without a fractional part, booleans as
    /// `True`/`False`, midnight date-times as a bare date, missing values
    /// as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Empty => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::DateTime(_) => serializer.collect_str(self),
            Value::Empty => serializer.serialize_none(),
        }
    }
}

/// A named column of values
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    /// A column is numeric when every present value is a number and at
    /// least one value is present
    pub fn is_numeric(&self) -> bool {
        let mut present = self.values.iter().filter(|v| !v.is_empty()).peekable();
        present.peek().is_some() && present.all(Value::is_number)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_empty()).count()
    }
}

/// An in-memory table of named columns and aligned rows
///
/// Every column always holds exactly `height` values. Row removal goes
/// through [`Frame::retain_rows`] so the same mask is applied to every
/// column.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    /// Builds a frame from a header and row-major data
    ///
    /// Short rows are padded with [`Value::Empty`]; extra trailing cells
    /// beyond the header width are dropped.
    ///
    /// # Examples
    /// ```
    /// use data_sweeper::frame::{Frame, Value};
    ///
    /// let frame = Frame::from_rows(
    ///     vec!["a".to_string(), "b".to_string()],
    ///     vec![vec![Value::Number(1.0)], vec![Value::Number(2.0), Value::text("x")]],
    /// );
    /// assert_eq!(frame.height(), 2);
    /// assert_eq!(frame.column("b").unwrap().values[0], Value::Empty);
    /// ```
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let height = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(height),
            })
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(Value::Empty));
            }
        }

        Frame { columns, height }
    }

    /// Builds a frame from whole columns
    ///
    /// Columns shorter than the longest one are padded with missing values.
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let height = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in columns.iter_mut() {
            column.values.resize(height, Value::Empty);
        }
        Frame { columns, height }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of the numeric columns, in frame order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.height).map(move |r| self.columns.iter().map(|c| &c.values[r]).collect())
    }

    /// The first `n` rows, used for previews
    pub fn head(&self, n: usize) -> Vec<Vec<&Value>> {
        self.rows().take(n).collect()
    }

    /// Keeps only the rows for which `keep` is true
    ///
    /// `keep` must have one entry per row.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.height);
        for column in self.columns.iter_mut() {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.height = keep.iter().filter(|k| **k).count();
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Restricts the frame to the named columns
    ///
    /// Retained columns keep their original order regardless of the order
    /// (or repetition) of `names`. An unknown name fails the whole call
    /// and leaves the frame as it was.
    ///
    /// # Errors
    /// * [`SweeperError::UnknownColumn`] for the first name not in the frame
    pub fn select_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let wanted: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();

        if let Some(missing) = names
            .iter()
            .map(|n| n.as_ref())
            .find(|n| self.column(n).is_none())
        {
            return Err(SweeperError::UnknownColumn(missing.to_string()));
        }

        self.columns.retain(|c| wanted.contains(c.name.as_str()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::from_rows(
            vec!["id".into(), "name".into(), "score".into()],
            vec![
                vec![1.0.into(), "ann".into(), 9.5.into()],
                vec![2.0.into(), "bob".into(), Value::Empty],
                vec![3.0.into(), "cy".into(), 7.0.into()],
            ],
        )
    }

    #[test]
    fn numeric_detection_ignores_missing() {
        let frame = sample();
        assert_eq!(frame.numeric_columns(), vec!["id", "score"]);
    }

    #[test]
    fn all_missing_column_is_not_numeric() {
        let frame = Frame::from_rows(vec!["x".into()], vec![vec![Value::Empty]]);
        assert!(frame.numeric_columns().is_empty());
    }

    #[test]
    fn retain_rows_keeps_columns_aligned() {
        let mut frame = sample();
        frame.retain_rows(&[true, false, true]);
        assert_eq!(frame.height(), 2);
        let rows: Vec<_> = frame.rows().collect();
        assert_eq!(rows[1], vec![&Value::Number(3.0), &Value::text("cy"), &Value::Number(7.0)]);
    }

    #[test]
    fn display_formats_integral_numbers_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn large_integers_display_exactly() {
        assert_eq!(Value::Int(9_007_199_254_740_993).to_string(), "9007199254740993");
        assert_eq!(Value::Int(i64::MIN).to_string(), "-9223372036854775808");
    }

    #[test]
    fn datetimes_display_like_pandas() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()).to_string(), "2024-03-15");
        assert_eq!(
            Value::DateTime(day.and_hms_opt(10, 30, 0).unwrap()).to_string(),
            "2024-03-15 10:30:00"
        );
    }

    #[test]
    fn int_columns_are_numeric() {
        let frame = Frame::from_rows(
            vec!["n".into()],
            vec![vec![Value::Int(1)], vec![Value::Number(2.5)], vec![Value::Empty]],
        );
        assert_eq!(frame.numeric_columns(), vec!["n"]);
    }
}
