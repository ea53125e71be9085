use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::decentlab::Measurement;
use crate::element::Reading;
use crate::table::Cell;

/// Rows of metadata keyed by a join value, e.g. device address.
pub type Lookup = IndexMap<String, IndexMap<String, Cell>>;

/// A timestamp-indexed table with named, ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    index: Vec<DateTime<Utc>>,
    columns: IndexMap<String, Vec<Cell>>,
}

impl Table {
    pub fn new(index_name: &str) -> Self {
        Self {
            index_name: index_name.to_string(),
            index: Vec::new(),
            columns: IndexMap::new(),
        }
    }

    /// One row per reading; columns are the sorted union of all data keys.
    pub fn from_readings(readings: &[Reading]) -> Self {
        let mut table = Self::new("measured_at");

        let names: BTreeSet<&str> = readings
            .iter()
            .flat_map(|r| r.data.keys().map(String::as_str))
            .collect();
        for name in names {
            table.columns.insert(name.to_string(), Vec::new());
        }

        for reading in readings {
            table.push_row(
                reading.measured_at,
                reading.data.iter().map(|(k, v)| (k.clone(), Cell::from(v))),
            );
        }

        table
    }

    pub fn from_measurements<'a, I>(index_name: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, &'a Measurement)>,
    {
        let mut table = Self::new(index_name);
        for (timestamp, measurement) in rows {
            table.push_row(timestamp, measurement_cells(measurement));
        }
        table
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn row(&self, i: usize) -> impl Iterator<Item = (&str, &Cell)> {
        self.columns.iter().map(move |(k, v)| (k.as_str(), &v[i]))
    }

    /// Appends a row. Unknown columns are added and back-filled with `Null`,
    /// columns the row lacks get `Null`.
    pub fn push_row<I, K>(&mut self, timestamp: DateTime<Utc>, row: I)
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        let len = self.index.len();
        for (name, cell) in row {
            let column = self
                .columns
                .entry(name.into())
                .or_insert_with(|| vec![Cell::Null; len]);
            if column.len() > len {
                column[len] = cell;
            } else {
                column.push(cell);
            }
        }

        self.index.push(timestamp);
        let len = self.index.len();
        for column in self.columns.values_mut() {
            column.resize(len, Cell::Null);
        }
    }

    /// Sets `name` to `cell` on every row, replacing an existing column.
    pub fn with_constant(mut self, name: &str, cell: Cell) -> Self {
        self.columns
            .insert(name.to_string(), vec![cell; self.index.len()]);
        self
    }

    /// Stable sort of the rows by their timestamp.
    pub fn sort_by_index(&mut self) {
        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&i| self.index[i]);

        self.index = order.iter().map(|&i| self.index[i]).collect();
        for column in self.columns.values_mut() {
            *column = order.iter().map(|&i| column[i].clone()).collect();
        }
    }

    /// Stacks tables vertically. Columns are the union in first-seen order.
    pub fn concat<I: IntoIterator<Item = Table>>(tables: I) -> Table {
        let mut tables = tables.into_iter();
        let Some(mut out) = tables.next() else {
            return Table::new("timestamp");
        };

        for table in tables {
            for (i, timestamp) in table.index.iter().enumerate() {
                out.push_row(*timestamp, table.row(i).map(|(k, c)| (k, c.clone())));
            }
            // keep columns of tables that contributed no rows
            let len = out.len();
            for name in table.columns.keys() {
                out.columns
                    .entry(name.clone())
                    .or_insert_with(|| vec![Cell::Null; len]);
            }
        }

        out
    }

    /// Left outer join on column `on`.
    ///
    /// Row count and order of `self` are kept; rows without a match get
    /// `Null` in every lookup column. Lookup columns clashing with an
    /// existing column are suffixed with `_right`, repeated until unique.
    pub fn left_join(&self, on: &str, lookup: &Lookup) -> Table {
        let mut out = self.clone();

        let mut names: Vec<&str> = Vec::new();
        for row in lookup.values() {
            for name in row.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }

        let keys: Vec<Option<String>> = match self.columns.get(on) {
            Some(column) => column.iter().map(Cell::as_key).collect(),
            None => vec![None; self.len()],
        };

        for name in names {
            let cells = keys
                .iter()
                .map(|key| {
                    key.as_ref()
                        .and_then(|k| lookup.get(k))
                        .and_then(|row| row.get(name))
                        .cloned()
                        .unwrap_or(Cell::Null)
                })
                .collect();

            let mut column_name = name.to_string();
            while out.columns.contains_key(&column_name) {
                column_name.push_str("_right");
            }
            out.columns.insert(column_name, cells);
        }

        out
    }
}

/// Measurement fields as cells, with snake-cased column names.
pub fn measurement_cells(measurement: &Measurement) -> impl Iterator<Item = (String, Cell)> + '_ {
    measurement
        .iter()
        .map(|(name, value)| (column_name(name), Cell::from(value)))
}

/// `Sensor temperature (internal)` → `sensor_temperature_internal`, matching
/// the keys the platform uses for its own readings.
pub fn column_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
