use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::domain::model::Record;

/// Field types as reported by the schema diagnostics. A field observed
/// with more than one type collapses into `Choice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Null,
    Boolean,
    Long,
    Double,
    String,
    Array,
    Struct,
    Choice(BTreeSet<String>),
}

impl FieldType {
    fn of(value: &Value) -> FieldType {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Long,
            Value::Number(_) => FieldType::Double,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Struct,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::Boolean => "boolean",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Struct => "struct",
            FieldType::Choice(_) => "choice",
        }
    }

    fn merge(self, other: FieldType) -> FieldType {
        if self == other {
            return self;
        }

        // 不同型別合併成 choice，成員按名稱排序
        let mut members = BTreeSet::new();
        match self {
            FieldType::Choice(set) => members.extend(set),
            ty => {
                members.insert(ty.name().to_string());
            }
        }
        match other {
            FieldType::Choice(set) => members.extend(set),
            ty => {
                members.insert(ty.name().to_string());
            }
        }
        FieldType::Choice(members)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Choice(members) => {
                let joined: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
                write!(f, "choice({})", joined.join(","))
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Schema inferred from a batch of records, fields sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSchema {
    fields: BTreeMap<String, FieldType>,
}

impl RecordSchema {
    pub fn infer(records: &[Record]) -> Self {
        let mut fields: BTreeMap<String, FieldType> = BTreeMap::new();

        for record in records {
            for (name, value) in &record.fields {
                let observed = FieldType::of(value);
                match fields.remove(name) {
                    Some(existing) => {
                        fields.insert(name.clone(), existing.merge(observed));
                    }
                    None => {
                        fields.insert(name.clone(), observed);
                    }
                }
            }
        }

        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the schema in the tree form the migration logs use:
    ///
    /// ```text
    /// root
    /// |-- pk: string
    /// |-- sk: string
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::from("root");
        for (name, ty) in &self.fields {
            out.push_str(&format!("\n|-- {}: {}", name, ty));
        }
        out
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect()
    }

    #[test]
    fn test_infer_basic_types() {
        let records = records(vec![json!({
            "id": "42",
            "count": 3,
            "score": 0.5,
            "active": true,
            "missing": null,
            "tags": ["a"],
            "meta": {"k": "v"}
        })]);

        let schema = RecordSchema::infer(&records);
        assert_eq!(schema.field("id"), Some(&FieldType::String));
        assert_eq!(schema.field("count"), Some(&FieldType::Long));
        assert_eq!(schema.field("score"), Some(&FieldType::Double));
        assert_eq!(schema.field("active"), Some(&FieldType::Boolean));
        assert_eq!(schema.field("missing"), Some(&FieldType::Null));
        assert_eq!(schema.field("tags"), Some(&FieldType::Array));
        assert_eq!(schema.field("meta"), Some(&FieldType::Struct));
    }

    #[test]
    fn test_infer_conflicting_types_become_choice() {
        let records = records(vec![json!({"count": 3}), json!({"count": "3"})]);

        let schema = RecordSchema::infer(&records);
        match schema.field("count") {
            Some(FieldType::Choice(members)) => {
                let members: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
                assert_eq!(members, vec!["long", "string"]);
            }
            other => panic!("expected choice, got {:?}", other),
        }
    }

    #[test]
    fn test_choice_absorbs_further_types() {
        let records = records(vec![
            json!({"v": 1}),
            json!({"v": "x"}),
            json!({"v": 1.5}),
            json!({"v": 2}),
        ]);

        let schema = RecordSchema::infer(&records);
        assert_eq!(schema.field("v").unwrap().to_string(), "choice(double,long,string)");
    }

    #[test]
    fn test_render_sorts_fields_by_name() {
        let records = records(vec![json!({"url": "x.png", "id": "42", "pk": "discord_42"})]);

        let schema = RecordSchema::infer(&records);
        assert_eq!(
            schema.render(),
            "root\n|-- id: string\n|-- pk: string\n|-- url: string"
        );
    }

    #[test]
    fn test_render_empty_schema() {
        let schema = RecordSchema::infer(&[]);
        assert!(schema.is_empty());
        assert_eq!(schema.render(), "root");
    }

    #[test]
    fn test_absent_fields_do_not_conflict() {
        let records = records(vec![
            json!({"id": "1", "note": "hi"}),
            json!({"id": "2"}),
        ]);

        let schema = RecordSchema::infer(&records);
        assert_eq!(schema.field("note"), Some(&FieldType::String));
        assert_eq!(schema.len(), 2);
    }
}
