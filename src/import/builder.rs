use crate::import::header::HeaderMap;
use crate::model::{IdGenerator, Record, Schema};

/// Turns tokenized data rows into canonical records for one import batch.
pub struct RecordBuilder<'a> {
    schema: &'a Schema,
    headers: &'a HeaderMap,
    ids: &'a mut IdGenerator,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(schema: &'a Schema, headers: &'a HeaderMap, ids: &'a mut IdGenerator) -> Self {
        Self {
            schema,
            headers,
            ids,
        }
    }

    /// Builds a record carrying every schema field. Unmapped fields and
    /// columns beyond the end of `row` become empty strings; mapped cells are
    /// copied verbatim.
    pub fn build(&mut self, row: &[String]) -> Record {
        let values = self
            .schema
            .fields()
            .iter()
            .map(|field| {
                let value = self
                    .headers
                    .column(&field.label)
                    .and_then(|index| row.get(index))
                    .cloned()
                    .unwrap_or_default();
                (field.key.clone(), value)
            })
            .collect();
        Record::new(self.ids.next_id(), values)
    }
}
