use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::domain::schema::RecordSchema;
use crate::utils::error::{EtlError, Result};

/// 單筆遷移記錄，保留來源項目的欄位順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Returns the string value of a field, failing the job when the
    /// field is absent or not a string.
    pub fn get_str(&self, field: &str) -> Result<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(EtlError::FieldTypeError {
                field: field.to_string(),
                expected: "string",
            }),
            None => Err(EtlError::MissingFieldError {
                field: field.to_string(),
            }),
        }
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// 移除欄位，其餘欄位保持原本順序
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<Record>,
    /// Schema right after key derivation, original fields still present.
    pub mapped_schema: RecordSchema,
    /// Schema after the legacy key fields are dropped.
    pub output_schema: RecordSchema,
}

/// 一次遷移執行的最終統計
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub job_name: String,
    pub records_read: usize,
    pub records_written: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}
