use std::collections::BTreeMap;

use crate::field_value::FieldValue;

/// Where a cell's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Typed by the user into this column, or loaded as its own value.
    Authored,
    /// Copied from column 0 by a propagation pass.
    Inherited,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: FieldValue,
    pub provenance: Provenance,
}

impl Cell {
    pub fn authored(raw: FieldValue) -> Self {
        Self {
            raw,
            provenance: Provenance::Authored,
        }
    }

    pub fn inherited(raw: FieldValue) -> Self {
        Self {
            raw,
            provenance: Provenance::Inherited,
        }
    }

    /// Propagation may overwrite this cell.
    pub fn accepts_propagation(&self) -> bool {
        self.provenance == Provenance::Inherited
    }
}

/// One grid column: a physical unit's field values.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    index: usize,
    fields: BTreeMap<String, Cell>,
}

impl EntityRecord {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.fields.get(field)
    }

    /// Absent fields read as [`FieldValue::Empty`].
    pub fn value(&self, field: &str) -> &FieldValue {
        static EMPTY: FieldValue = FieldValue::Empty;
        self.fields.get(field).map(|c| &c.raw).unwrap_or(&EMPTY)
    }

    pub fn provenance(&self, field: &str) -> Option<Provenance> {
        self.fields.get(field).map(|c| c.provenance)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub(crate) fn set(&mut self, field: &str, cell: Cell) {
        self.fields.insert(field.to_string(), cell);
    }

    /// Field id → raw value, provenance dropped.
    pub fn to_values(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .map(|(k, c)| (k.clone(), c.raw.clone()))
            .collect()
    }
}
