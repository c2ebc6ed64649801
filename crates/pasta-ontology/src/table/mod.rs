//! Row/column model over a list of JSON records.
//!
//! Each column maps to a field of the row record. Button-like columns
//! (`Delete`, `ReorderUp`) hold no data; [`TableModel::activate`] performs
//! their action, and toggles the flag of a `Required` column.
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One row record, e.g. a property definition.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Link target or list of choices; comma separated input becomes a list.
    LinkList,
    /// Mandatory flag shown as a toggle.
    Required,
    Delete,
    ReorderUp,
}

impl ColumnKind {
    #[inline]
    pub fn is_action(&self) -> bool {
        matches!(self, ColumnKind::Delete | ColumnKind::ReorderUp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    /// Record field; empty for action columns.
    pub field: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    const fn data(header: &'static str, field: &'static str, kind: ColumnKind) -> Self {
        Self {
            header,
            field,
            kind,
        }
    }

    const fn action(header: &'static str, kind: ColumnKind) -> Self {
        Self {
            header,
            field: "",
            kind,
        }
    }
}

/// Columns of a property category table.
pub const PROPERTY_COLUMNS: &[Column] = &[
    Column::data("Name", "name", ColumnKind::Text),
    Column::data("Query", "query", ColumnKind::Text),
    Column::data("List", "list", ColumnKind::LinkList),
    // data type a value must reference
    Column::data("Link", "link", ColumnKind::Text),
    Column::data("Unit", "unit", ColumnKind::Text),
    Column::data("Mandatory", "required", ColumnKind::Required),
    Column::action("", ColumnKind::Delete),
    Column::action("", ColumnKind::ReorderUp),
];

/// Columns of the attachments table.
pub const ATTACHMENT_COLUMNS: &[Column] = &[
    Column::data("Description", "description", ColumnKind::Text),
    Column::data("Type", "type", ColumnKind::Text),
    Column::action("", ColumnKind::Delete),
    Column::action("", ColumnKind::ReorderUp),
];

pub struct TableModel {
    columns: &'static [Column],
    rows: Vec<Row>,
}

impl TableModel {
    pub fn new(columns: &'static [Column], rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Stored value, `Null` when absent, out of range, or an action column.
    pub fn get(&self, row: usize, column: usize) -> Value {
        let (Some(record), Some(col)) = (self.rows.get(row), self.columns.get(column)) else {
            return Value::Null;
        };
        if col.kind.is_action() {
            return Value::Null;
        }
        record.get(col.field).cloned().unwrap_or(Value::Null)
    }

    /// Cell text as an editor shows it: lists joined with `", "`.
    pub fn display(&self, row: usize, column: usize) -> String {
        match self.get(row, column) {
            Value::Null => String::new(),
            Value::String(s) => s,
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        }
    }

    /// Write `value` under the column's field. Returns `false` (and logs) when
    /// the cell does not exist or does not accept the value.
    pub fn set(&mut self, row: usize, column: usize, value: Value) -> bool {
        let Some(col) = self.columns.get(column).copied() else {
            warn!(column, "set: column out of range");
            return false;
        };
        let rows = self.rows.len();
        let Some(record) = self.rows.get_mut(row) else {
            warn!(row, rows, "set: row out of range");
            return false;
        };

        let value = match col.kind {
            ColumnKind::Delete | ColumnKind::ReorderUp => {
                warn!(column, "set: action column holds no data");
                return false;
            }
            ColumnKind::LinkList => split_list(value),
            ColumnKind::Required => match as_flag(&value) {
                Some(flag) => Value::Bool(flag),
                None => {
                    warn!(row, ?value, "set: mandatory flag expects a boolean");
                    return false;
                }
            },
            ColumnKind::Text => value,
        };
        record.insert(col.field.to_string(), value);
        true
    }

    /// Remove the row at `position`; out of range leaves the rows untouched.
    pub fn delete(&mut self, position: usize) -> Option<Row> {
        if position >= self.rows.len() {
            warn!(position, rows = self.rows.len(), "delete: row out of range");
            return None;
        }
        debug!(position, "row deleted");
        Some(self.rows.remove(position))
    }

    /// Move the row at `position` one slot towards the start, clamped at 0.
    pub fn reorder_up(&mut self, position: usize) -> bool {
        if position >= self.rows.len() {
            warn!(position, rows = self.rows.len(), "reorder: row out of range");
            return false;
        }
        let row = self.rows.remove(position);
        self.rows.insert(position.saturating_sub(1), row);
        true
    }

    pub fn add_empty_row(&mut self) {
        self.rows.push(Row::new());
    }

    /// Flip the mandatory flag of `row` for the first `Required` column.
    pub fn toggle_required(&mut self, row: usize) -> bool {
        let Some(column) = self
            .columns
            .iter()
            .position(|c| c.kind == ColumnKind::Required)
        else {
            return false;
        };
        let current = self.get(row, column).as_bool().unwrap_or(false);
        self.set(row, column, Value::Bool(!current))
    }

    /// What a click on the cell does: toggle, delete, or reorder.
    pub fn activate(&mut self, row: usize, column: usize) -> bool {
        match self.columns.get(column).map(|c| c.kind) {
            Some(ColumnKind::Required) => self.toggle_required(row),
            Some(ColumnKind::Delete) => self.delete(row).is_some(),
            Some(ColumnKind::ReorderUp) => self.reorder_up(row),
            _ => false,
        }
    }
}

fn split_list(value: Value) -> Value {
    match value {
        Value::String(s) if s.contains(',') => Value::Array(
            s.split(',')
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
        ),
        other => other,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
