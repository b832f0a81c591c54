use std::collections::HashSet;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, ToolError};

/// Key under which every record stores its synthesized identifier.
pub const ID_KEY: &str = "id";

/// One canonical field: the header label spreadsheets are expected to use and
/// the key the field is persisted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    pub key: String,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }
}

/// Ordered set of canonical fields every imported record carries.
///
/// Declaration order matters: header resolution tries the fields in this
/// order and the first match wins for a given column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Builds a schema after checking that labels and keys are non-empty and
    /// unique, and that no key collides with the identifier key.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(ToolError::InvalidSchema("schema declares no fields".into()));
        }
        let mut seen_keys = HashSet::new();
        let mut seen_labels = HashSet::new();
        for field in &fields {
            if field.key.is_empty() || field.label.is_empty() {
                return Err(ToolError::InvalidSchema(
                    "field labels and keys must not be empty".into(),
                ));
            }
            if field.key == ID_KEY {
                return Err(ToolError::InvalidSchema(format!(
                    "field key '{ID_KEY}' is reserved for record identifiers"
                )));
            }
            if !seen_keys.insert(field.key.as_str()) {
                return Err(ToolError::InvalidSchema(format!(
                    "duplicate field key '{}'",
                    field.key
                )));
            }
            if !seen_labels.insert(field.label.as_str()) {
                return Err(ToolError::InvalidSchema(format!(
                    "duplicate field label '{}'",
                    field.label
                )));
            }
        }
        Ok(Self { fields })
    }

    /// The battery return/repair schema: 18 fields in their declared order.
    pub fn battery_repairs() -> Self {
        let fields = [
            ("电池BT码", "batteryBtCode"),
            ("BMS编号", "bmsNumber"),
            ("电池型号", "batteryModel"),
            ("循环次数", "cycleCount"),
            ("返厂原因", "returnReason"),
            ("返厂时间", "returnDate"),
            ("客退地区", "returnArea"),
            ("维修状态", "repairStatus"),
            ("维修项目", "repairItem"),
            ("维修费用", "repairCost"),
            ("维修时间", "repairDate"),
            ("快递公司", "expressCompany"),
            ("运费金额", "shippingCost"),
            ("责任归属", "responsibility"),
            ("维修工时费", "laborCost"),
            ("原因分析", "causeAnalysis"),
            ("改善措施", "improvements"),
            ("维修措施", "repairMeasures"),
        ]
        .into_iter()
        .map(|(label, key)| FieldSpec::new(label, key))
        .collect();
        Self { fields }
    }

    /// Loads a schema from a JSON array of `{"label", "key"}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let fields: Vec<FieldSpec> = serde_json::from_str(&data)?;
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.label.as_str())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::battery_repairs()
    }
}

/// A canonical repair record: one value per schema field plus an identifier.
///
/// Values are kept in schema order; [`Record::to_json`] renders the flat JSON
/// object stored on disk, `id` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    values: Vec<(String, String)>,
}

impl Record {
    pub(crate) fn new(id: String, values: Vec<(String, String)>) -> Self {
        Self { id, values }
    }

    /// Returns the value stored under `key`, if the key is part of the record.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Field keys in schema order, excluding the identifier.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    /// Converts the record into the JSON object stored on disk.
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::with_capacity(self.values.len() + 1);
        object.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.values {
            object.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(object)
    }
}

/// Produces record identifiers from the wall clock plus a small random
/// component.
///
/// Identifiers are `unix_millis * 1000 + r` with `r` in `0..1000`, rendered
/// as decimal strings, and never repeat or go backwards within one generator.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u128,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator whose identifiers all sort after `last`.
    pub fn starting_after(last: u128) -> Self {
        Self { last }
    }

    /// Seeds a generator past every numeric identifier already in `existing`.
    ///
    /// Identifiers that do not fit in a `u64` are ignored so a stray huge id
    /// cannot pin the generator at its ceiling.
    pub fn after_existing<'a>(existing: impl IntoIterator<Item = &'a Value>) -> Self {
        let last = existing
            .into_iter()
            .filter_map(|entry| entry.get(ID_KEY))
            .filter_map(|id| match id {
                Value::String(text) => text.parse::<u64>().ok(),
                Value::Number(number) => number.as_u64(),
                _ => None,
            })
            .max()
            .map(u128::from)
            .unwrap_or_default();
        Self::starting_after(last)
    }

    pub fn next_id(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let jitter = Uuid::new_v4().as_u128() % 1000;
        let candidate = millis * 1000 + jitter;
        self.last = candidate.max(self.last.saturating_add(1));
        self.last.to_string()
    }
}
