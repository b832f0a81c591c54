use std::collections::HashMap;

use crate::model::Schema;

/// Resolved column positions for the canonical fields of one import, keyed by
/// canonical label. Fields without a matching column are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    /// Column index bound to the canonical `label`.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Canonical labels of `schema` that no header cell matched, in schema order.
    pub fn missing<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        schema
            .labels()
            .filter(|label| !self.columns.contains_key(*label))
            .collect()
    }
}

/// Binds header cells to canonical fields by mutual substring containment.
///
/// Each non-empty cell binds to the first schema field (in declaration order)
/// whose label contains the cell or is contained by it. When several cells
/// match the same field the rightmost one wins. Matching is case-sensitive.
pub fn resolve_headers(headers: &[String], schema: &Schema) -> HeaderMap {
    let mut columns = HashMap::new();

    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let matched = schema
            .labels()
            .find(|label| label.contains(header.as_str()) || header.contains(label));
        if let Some(label) = matched {
            columns.insert(label.to_string(), index);
        }
    }

    HeaderMap { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldSpec;

    fn schema(labels: &[&str]) -> Schema {
        let fields = labels
            .iter()
            .enumerate()
            .map(|(index, label)| FieldSpec::new(*label, format!("field{index}")))
            .collect();
        Schema::new(fields).expect("valid schema")
    }

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn first_declared_field_wins_for_a_cell() {
        let map = resolve_headers(&headers(&["A"]), &schema(&["A", "AB"]));
        assert_eq!(map.column("A"), Some(0));
        assert_eq!(map.column("AB"), None);
    }

    #[test]
    fn last_matching_cell_wins_for_a_field() {
        let map = resolve_headers(&headers(&["电池型号", "型号"]), &Schema::battery_repairs());
        assert_eq!(map.column("电池型号"), Some(1));
    }

    #[test]
    fn decorated_headers_still_match() {
        let map = resolve_headers(
            &headers(&["", "电池BT码(必填)", "BMS"]),
            &Schema::battery_repairs(),
        );
        assert_eq!(map.column("电池BT码"), Some(1));
        assert_eq!(map.column("BMS编号"), Some(2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn missing_lists_unmatched_fields_in_order() {
        let schema = schema(&["A", "B", "C"]);
        let map = resolve_headers(&headers(&["C", "X"]), &schema);
        assert_eq!(map.missing(&schema), vec!["A", "B"]);
    }
}
