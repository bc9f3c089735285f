use crate::dirty::{DirtyReason, DirtyTracker};
use crate::error::CoreError;
use crate::field_value::{FieldValue, Row};
use crate::record::{Cell, EntityRecord, Provenance};
use crate::wire::EntityValues;

/// N-column form grid with column-0 auto-fill.
///
/// Writing a field on column 0 copies the value into every other active
/// column whose cell is absent or [`Provenance::Inherited`]. A direct edit
/// on any column marks that cell [`Provenance::Authored`], after which
/// propagation leaves it alone until the grid is reloaded.
#[derive(Debug)]
pub struct FieldGrid {
    max_entities: usize,
    entity_count: usize,
    entities: Vec<EntityRecord>,
    dirty: DirtyTracker,
}

impl FieldGrid {
    /// A single empty column. `max_entities` below 1 is raised to 1.
    pub fn new(max_entities: usize, dirty: DirtyTracker) -> Self {
        Self {
            max_entities: max_entities.max(1),
            entity_count: 1,
            entities: vec![EntityRecord::new(0)],
            dirty,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.entity_count {
            return Err(CoreError::EntityOutOfRange {
                index,
                count: self.entity_count,
            });
        }
        Ok(())
    }

    /// Grow with fresh columns or drop the tail. Dropped columns are gone
    /// for good; growing again yields empty records.
    pub fn set_entity_count(&mut self, requested: usize) {
        let count = requested.clamp(1, self.max_entities);
        if count != requested {
            tracing::warn!(
                requested,
                max = self.max_entities,
                "Entity count out of range, clamping to {count}"
            );
        }
        if count == self.entity_count {
            return;
        }

        if count > self.entity_count {
            self.entities.extend((self.entity_count..count).map(EntityRecord::new));
        } else {
            self.entities.truncate(count);
        }
        tracing::debug!(from = self.entity_count, to = count, "Entity count changed");
        self.entity_count = count;
        self.dirty.mark_dirty(DirtyReason::EntityCount);
    }

    pub fn set_value(
        &mut self,
        index: usize,
        field: &str,
        value: FieldValue,
    ) -> Result<(), CoreError> {
        self.check_index(index)?;

        if index == 0 {
            self.propagate(field, &value);
        }
        self.entities[index].set(field, Cell::authored(value));

        self.dirty.mark_dirty(DirtyReason::Field {
            entity: index,
            field: field.to_string(),
        });
        Ok(())
    }

    /// Copy column 0's new value into every active column that has not
    /// been edited directly.
    fn propagate(&mut self, field: &str, value: &FieldValue) {
        let mut written = 0usize;
        for entity in &mut self.entities[1..self.entity_count] {
            if entity.cell(field).is_none_or(Cell::accepts_propagation) {
                entity.set(field, Cell::inherited(value.clone()));
                written += 1;
            }
        }
        tracing::trace!(field, written, "Propagated from column 0");
    }

    /// Add or remove one member of a multi-select field. The whole resulting
    /// set is what gets written (and propagated). Fails with
    /// [`CoreError::NotChoices`] if the field holds any other kind of value.
    pub fn toggle_member(
        &mut self,
        index: usize,
        field: &str,
        member: &str,
        included: bool,
    ) -> Result<(), CoreError> {
        self.check_index(index)?;
        let current = self.entities[index].value(field);
        if !matches!(current, FieldValue::Empty | FieldValue::Choices(_)) {
            return Err(CoreError::NotChoices {
                field: field.to_string(),
            });
        }
        let next = current.with_member(member, included);
        self.set_value(index, field, next)
    }

    /// Apply `edit` to a copy of a sub-table field, then write the whole
    /// resulting row list through [`FieldGrid::set_value`].
    fn edit_rows<T>(
        &mut self,
        index: usize,
        field: &str,
        edit: impl FnOnce(&mut Vec<Row>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        self.check_index(index)?;
        let mut rows = match self.entities[index].value(field) {
            FieldValue::Rows(rows) => rows.clone(),
            FieldValue::Empty => Vec::new(),
            _ => {
                return Err(CoreError::NotRows {
                    field: field.to_string(),
                });
            }
        };
        let out = edit(&mut rows)?;
        self.set_value(index, field, FieldValue::Rows(rows))?;
        Ok(out)
    }

    pub fn push_row(&mut self, index: usize, field: &str, row: Row) -> Result<(), CoreError> {
        self.edit_rows(index, field, |rows| {
            rows.push(row);
            Ok(())
        })
    }

    pub fn remove_row(&mut self, index: usize, field: &str, row: usize) -> Result<Row, CoreError> {
        self.edit_rows(index, field, |rows| {
            if row >= rows.len() {
                return Err(CoreError::RowOutOfRange {
                    field: field.to_string(),
                    row,
                    len: rows.len(),
                });
            }
            Ok(rows.remove(row))
        })
    }

    pub fn set_row_cell(
        &mut self,
        index: usize,
        field: &str,
        row: usize,
        column: &str,
        value: FieldValue,
    ) -> Result<(), CoreError> {
        self.edit_rows(index, field, |rows| {
            let len = rows.len();
            let target = rows.get_mut(row).ok_or_else(|| CoreError::RowOutOfRange {
                field: field.to_string(),
                row,
                len,
            })?;
            target.insert(column.to_string(), value);
            Ok(())
        })
    }

    /// The first `entity_count` columns. Cheap to clone and iterate again.
    pub fn active_entities(
        &self,
    ) -> impl ExactSizeIterator<Item = &EntityRecord> + Clone + '_ {
        self.entities[..self.entity_count].iter()
    }

    pub fn entity(&self, index: usize) -> Option<&EntityRecord> {
        self.active_entities().nth(index)
    }

    pub fn cell(&self, index: usize, field: &str) -> Option<&Cell> {
        self.entity(index).and_then(|e| e.cell(field))
    }

    /// Inactive columns and absent fields read as [`FieldValue::Empty`].
    pub fn value(&self, index: usize, field: &str) -> &FieldValue {
        static EMPTY: FieldValue = FieldValue::Empty;
        self.entity(index).map(|e| e.value(field)).unwrap_or(&EMPTY)
    }

    pub fn provenance(&self, index: usize, field: &str) -> Option<Provenance> {
        self.cell(index, field).map(|c| c.provenance)
    }

    pub fn is_inherited(&self, index: usize, field: &str) -> bool {
        self.provenance(index, field) == Some(Provenance::Inherited)
    }

    /// Re-seed from authoritative server state. Does not touch the dirty
    /// tracker.
    ///
    /// Column 0 is authored. Other columns inherit where they hold the same
    /// value as column 0 and are authored elsewhere. Empty values are not
    /// stored, so the next column-0 write fills them.
    ///
    /// Snapshots carry no provenance, so a column the user overrode with a
    /// value that happens to equal column 0 comes back inherited and follows
    /// the next column-0 edit.
    pub fn load(&mut self, entities: &[EntityValues]) {
        if entities.len() > self.max_entities {
            tracing::warn!(
                loaded = entities.len(),
                max = self.max_entities,
                "Server returned more entities than the screen allows, truncating"
            );
        }
        let count = entities.len().clamp(1, self.max_entities);
        let mut records: Vec<EntityRecord> = (0..count).map(EntityRecord::new).collect();

        for (index, values) in entities.iter().take(count).enumerate() {
            for (field, raw) in values {
                if raw.is_empty() {
                    continue;
                }
                let mirrors_source = index > 0 && entities[0].get(field) == Some(raw);
                let cell = if mirrors_source {
                    Cell::inherited(raw.clone())
                } else {
                    Cell::authored(raw.clone())
                };
                records[index].set(field, cell);
            }
        }

        self.entities = records;
        self.entity_count = count;
    }

    /// Active columns as field id → raw value.
    pub fn snapshot(&self) -> Vec<EntityValues> {
        self.active_entities().map(EntityRecord::to_values).collect()
    }

    /// `(index, field)` for every required field that is blank in an active
    /// column.
    pub fn blank_fields<S: AsRef<str>>(&self, required: &[S]) -> Vec<(usize, String)> {
        self.active_entities()
            .flat_map(|entity| {
                required.iter().filter_map(move |field| {
                    let field: &str = field.as_ref();
                    entity
                        .value(field)
                        .is_blank()
                        .then(|| (entity.index(), field.to_string()))
                })
            })
            .collect()
    }
}
