//! Eurostat TSV parser
//!
//! Header: `unit,geo\time<TAB>2021<TAB>2020...`. The part left of the
//! backslash names the row axes, the part right of it names the column axis.
//! Each data line: `NR,BE<TAB>1.5<TAB>2.0...`.

use crate::array::types::{Axis, LabeledArray};
use crate::error::{EstatError, EstatResult};
use std::collections::HashMap;

/// Parse cleaned (or raw) TSV text into a [`LabeledArray`].
pub fn parse_tsv(text: &str) -> EstatResult<LabeledArray> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| EstatError::ParseError("empty dataset".to_string()))?;
    let mut header_cells = header.split('\t');
    let first = header_cells.next().unwrap_or_default();

    let (row_part, column_name) = first.rsplit_once('\\').ok_or_else(|| {
        EstatError::ParseError(format!("header cell '{}' has no '\\' separator", first))
    })?;
    let row_names: Vec<&str> = row_part.split(',').map(str::trim).collect();
    let column_labels: Vec<String> = header_cells.map(|c| c.trim().to_string()).collect();

    let mut row_axes: Vec<LabelIndex> = row_names.iter().map(|_| LabelIndex::default()).collect();
    let mut rows: Vec<(Vec<usize>, Vec<Option<f64>>)> = Vec::new();

    for (lineno, line) in lines.enumerate() {
        let mut cells = line.split('\t');
        let key = cells.next().unwrap_or_default();
        let key_labels: Vec<&str> = key.split(',').map(str::trim).collect();

        if key_labels.len() != row_names.len() {
            return Err(EstatError::ParseError(format!(
                "line {}: expected {} labels, found {}",
                lineno + 2,
                row_names.len(),
                key_labels.len()
            )));
        }

        let positions = key_labels
            .iter()
            .zip(row_axes.iter_mut())
            .map(|(label, index)| index.insert(label))
            .collect();

        let values = cells
            .map(parse_value)
            .collect::<EstatResult<Vec<_>>>()?;
        if values.len() > column_labels.len() {
            return Err(EstatError::ParseError(format!(
                "line {}: {} values for {} columns",
                lineno + 2,
                values.len(),
                column_labels.len()
            )));
        }

        rows.push((positions, values));
    }

    let mut axes: Vec<Axis> = row_names
        .iter()
        .zip(row_axes)
        .map(|(name, index)| Axis::new(*name, index.labels))
        .collect();
    axes.push(Axis::new(column_name.trim(), column_labels));

    let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
    let ncols = shape[shape.len() - 1];
    let mut data = vec![None; shape.iter().product()];

    for (positions, values) in rows {
        let row_offset = positions
            .iter()
            .zip(&shape)
            .fold(0, |acc, (pos, len)| acc * len + pos);
        let start = row_offset * ncols;
        for (i, value) in values.into_iter().enumerate() {
            data[start + i] = value;
        }
    }

    LabeledArray::new(axes, data)
}

/// A cell is its first whitespace token; empty or `:` means missing.
fn parse_value(cell: &str) -> EstatResult<Option<f64>> {
    match cell.split_whitespace().next() {
        None | Some(":") => Ok(None),
        Some(token) => token
            .parse::<f64>()
            .map(Some)
            .map_err(|_| EstatError::ParseError(format!("invalid value '{}'", cell.trim()))),
    }
}

/// Labels of one axis in order of first appearance
#[derive(Debug, Default)]
struct LabelIndex {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl LabelIndex {
    fn insert(&mut self, label: &str) -> usize {
        if let Some(&pos) = self.positions.get(label) {
            return pos;
        }
        let pos = self.labels.len();
        self.labels.push(label.to_string());
        self.positions.insert(label.to_string(), pos);
        pos
    }
}
