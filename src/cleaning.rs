use log::debug;
use serde::Serialize;
use std::collections::HashSet;

use crate::frame::{Frame, Value};

/// Hashable stand-in for a cell, used to detect repeated rows
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Int(i64),
    Number(u64),
    Text(&'a str),
    Bool(bool),
    DateTime(chrono::NaiveDateTime),
    Empty,
}

impl<'a> From<&'a Value> for CellKey<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Int(i) => CellKey::Int(*i),
            // 1 and 1.0 are the same number, as are -0.0 and 0.0
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                CellKey::Int(*n as i64)
            }
            Value::Number(n) if n.is_nan() => CellKey::Number(f64::NAN.to_bits()),
            Value::Number(n) => CellKey::Number(n.to_bits()),
            Value::Text(s) => CellKey::Text(s),
            Value::Bool(b) => CellKey::Bool(*b),
            Value::DateTime(dt) => CellKey::DateTime(*dt),
            Value::Empty => CellKey::Empty,
        }
    }
}

/// Removes rows that repeat an earlier row in every column
///
/// The first occurrence of each row is kept and row order is otherwise
/// unchanged. Missing values compare equal to each other.
///
/// # Returns
/// * The number of rows removed
///
/// # Examples
/// ```
/// use data_sweeper::cleaning::remove_duplicates;
/// use data_sweeper::frame::{Frame, Value};
///
/// let mut frame = Frame::from_rows(
///     vec!["a".to_string()],
///     vec![vec![Value::Number(1.0)], vec![Value::Number(1.0)], vec![Value::Number(2.0)]],
/// );
/// assert_eq!(remove_duplicates(&mut frame), 1);
/// assert_eq!(frame.height(), 2);
/// ```
pub fn remove_duplicates(frame: &mut Frame) -> usize {
    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(frame.height());
        frame
            .rows()
            .map(|row| seen.insert(row.into_iter().map(CellKey::from).collect()))
            .collect()
    };

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        frame.retain_rows(&keep);
    }
    debug!("removed {} duplicate rows", removed);
    removed
}

/// One numeric column touched by [`fill_missing_with_mean`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilledColumn {
    pub column: String,
    pub mean: f64,
    pub filled: usize,
}

/// Summary of a mean-fill pass
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub columns: Vec<FilledColumn>,
}

impl FillReport {
    pub fn total_filled(&self) -> usize {
        self.columns.iter().map(|c| c.filled).sum()
    }
}

/// Replaces missing entries of each numeric column with the column mean
///
/// The mean is taken over the column's present values, and integer
/// entries of a filled column become floats. Non-numeric columns and
/// numeric columns without gaps are left as they are.
pub fn fill_missing_with_mean(frame: &mut Frame) -> FillReport {
    let mut report = FillReport::default();

    for column in frame.columns_mut() {
        if !column.is_numeric() {
            continue;
        }
        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }

        let (sum, count) = column
            .values
            .iter()
            .filter_map(Value::as_number)
            .fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
        let mean = sum / count as f64;

        // A filled column becomes float throughout
        for value in column.values.iter_mut() {
            match value {
                Value::Empty => *value = Value::Number(mean),
                Value::Int(i) => *value = Value::Number(*i as f64),
                _ => {}
            }
        }

        debug!("filled {} missing values in {} with {}", missing, column.name, mean);
        report.columns.push(FilledColumn {
            column: column.name.clone(),
            mean,
            filled: missing,
        });
    }

    report
}
