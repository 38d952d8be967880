use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;

use crate::domain::model::Record;
use crate::domain::ports::{TableSink, TableSource};
use crate::utils::error::{EtlError, Result};

/// BatchWriteItem 單次請求上限
const MAX_BATCH_SIZE: usize = 25;
/// UnprocessedItems 重送次數上限
const MAX_RESUBMIT_ATTEMPTS: usize = 5;
const RESUBMIT_BASE_DELAY: Duration = Duration::from_millis(200);

fn dynamo_err<E>(operation: &str, err: E) -> EtlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    EtlError::DynamoDbError {
        operation: operation.to_string(),
        message: format!("{}", DisplayErrorContext(err)),
    }
}

/// Builds the DynamoDB client, honouring optional region and endpoint
/// overrides (the endpoint override is what local runs point at
/// dynamodb-local).
pub async fn build_client(region: Option<String>, endpoint_url: Option<String>) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_sdk_dynamodb::config::Region::new(region));
    }
    let shared_config = loader.load().await;

    let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared_config);
    if let Some(endpoint) = endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }
    Client::from_conf(builder.build())
}

pub struct DynamoDbTableSource {
    client: Client,
    table_name: String,
    page_size: Option<i32>,
}

impl DynamoDbTableSource {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            page_size: None,
        }
    }

    pub fn with_page_size(mut self, page_size: Option<i32>) -> Self {
        self.page_size = page_size;
        self
    }
}

impl TableSource for DynamoDbTableSource {
    async fn scan_records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0usize;

        // 一直翻頁到 LastEvaluatedKey 為空
        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key);
            if let Some(limit) = self.page_size {
                request = request.limit(limit);
            }

            let output = request.send().await.map_err(|e| dynamo_err("Scan", e))?;
            pages += 1;

            for item in output.items.unwrap_or_default() {
                let record: Record = serde_dynamo::from_item(item)?;
                records.push(record);
            }

            exclusive_start_key = output.last_evaluated_key;
            if exclusive_start_key.is_none() {
                break;
            }
        }

        tracing::debug!(
            "Scanned {} records from '{}' in {} pages",
            records.len(),
            self.table_name,
            pages
        );
        Ok(records)
    }
}

pub struct DynamoDbTableSink {
    client: Client,
    table_name: String,
    writes_per_second: Option<f64>,
}

impl DynamoDbTableSink {
    /// Connects the sink to its destination table. When a throughput
    /// fraction is configured the table's provisioned write capacity is
    /// looked up once and writes are paced to `capacity * percent` per
    /// second; on-demand tables are never paced.
    pub async fn connect(
        client: Client,
        table_name: impl Into<String>,
        throughput_write_percent: Option<f64>,
    ) -> Result<Self> {
        let table_name = table_name.into();

        let writes_per_second = match throughput_write_percent {
            Some(percent) => {
                let output = client
                    .describe_table()
                    .table_name(&table_name)
                    .send()
                    .await
                    .map_err(|e| dynamo_err("DescribeTable", e))?;
                let write_capacity = output
                    .table
                    .and_then(|t| t.provisioned_throughput)
                    .and_then(|p| p.write_capacity_units)
                    .unwrap_or(0);

                match throttled_rate(write_capacity, percent) {
                    Some(rate) => {
                        tracing::debug!(
                            "🚦 Throttling writes to '{}' at {:.1} writes/s",
                            table_name,
                            rate
                        );
                        Some(rate)
                    }
                    None => {
                        tracing::debug!(
                            "Table '{}' is on-demand, writes are not throttled",
                            table_name
                        );
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Self {
            client,
            table_name,
            writes_per_second,
        })
    }

    async fn write_batch(&self, batch: Vec<WriteRequest>) -> Result<()> {
        let mut pending = batch;
        let mut attempts = 0usize;

        loop {
            let output = self
                .client
                .batch_write_item()
                .request_items(self.table_name.as_str(), pending)
                .send()
                .await
                .map_err(|e| dynamo_err("BatchWriteItem", e))?;

            let mut unprocessed = output.unprocessed_items.unwrap_or_default();
            let retry = unprocessed.remove(&self.table_name).unwrap_or_default();
            if retry.is_empty() {
                return Ok(());
            }

            attempts += 1;
            if attempts >= MAX_RESUBMIT_ATTEMPTS {
                return Err(EtlError::UnprocessedItemsError {
                    table: self.table_name.clone(),
                    count: retry.len(),
                    attempts,
                });
            }

            tracing::warn!(
                "⚠️ {} unprocessed items for '{}', resubmitting (attempt {}/{})",
                retry.len(),
                self.table_name,
                attempts,
                MAX_RESUBMIT_ATTEMPTS
            );
            tokio::time::sleep(RESUBMIT_BASE_DELAY * attempts as u32).await;
            pending = retry;
        }
    }
}

impl TableSink for DynamoDbTableSink {
    async fn write_records(&self, records: Vec<Record>) -> Result<usize> {
        let total = records.len();
        if total == 0 {
            return Ok(0);
        }

        let mut requests = Vec::with_capacity(total);
        for record in &records {
            requests.push(to_write_request(record)?);
        }

        let mut batches = 0usize;
        while !requests.is_empty() {
            let split = requests.len().min(MAX_BATCH_SIZE);
            let batch: Vec<WriteRequest> = requests.drain(..split).collect();
            let batch_len = batch.len();

            self.write_batch(batch).await?;
            batches += 1;

            if let Some(rate) = self.writes_per_second {
                if !requests.is_empty() {
                    tokio::time::sleep(batch_delay(batch_len, rate)).await;
                }
            }
        }

        tracing::debug!(
            "Wrote {} records to '{}' in {} batches",
            total,
            self.table_name,
            batches
        );
        Ok(total)
    }
}

fn to_write_request(record: &Record) -> Result<WriteRequest> {
    let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)?;
    let put = PutRequest::builder()
        .set_item(Some(item))
        .build()
        .map_err(|e| dynamo_err("BatchWriteItem", e))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

/// 每秒寫入額度 = 供應的 WCU * 節流比例；沒有供應容量時回傳 None
fn throttled_rate(write_capacity: i64, percent: f64) -> Option<f64> {
    if write_capacity <= 0 {
        return None;
    }
    Some((write_capacity as f64 * percent).max(1.0))
}

fn batch_delay(batch_len: usize, writes_per_second: f64) -> Duration {
    Duration::from_secs_f64(batch_len as f64 / writes_per_second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_throttled_rate_applies_percent() {
        assert_eq!(throttled_rate(10, 0.5), Some(5.0));
        assert_eq!(throttled_rate(200, 0.5), Some(100.0));
    }

    #[test]
    fn test_throttled_rate_on_demand_table() {
        assert_eq!(throttled_rate(0, 0.5), None);
        assert_eq!(throttled_rate(-1, 0.5), None);
    }

    #[test]
    fn test_throttled_rate_never_drops_below_one_write() {
        assert_eq!(throttled_rate(1, 0.1), Some(1.0));
    }

    #[test]
    fn test_batch_delay_scales_with_batch_size() {
        assert_eq!(batch_delay(25, 12.5), Duration::from_secs(2));
        assert_eq!(batch_delay(5, 12.5), Duration::from_millis(400));
    }

    #[test]
    fn test_record_converts_to_dynamodb_item() {
        let record = record(json!({
            "pk": "discord_1",
            "sk": "Image",
            "count": 3,
            "flagged": false,
            "meta": {"width": 640}
        }));
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();

        assert_eq!(
            item.get("pk"),
            Some(&AttributeValue::S("discord_1".to_string()))
        );
        assert!(matches!(item.get("count"), Some(AttributeValue::N(n)) if n == "3"));
        assert_eq!(item.get("flagged"), Some(&AttributeValue::Bool(false)));
        assert!(matches!(
            item.get("meta"),
            Some(AttributeValue::M(m)) if matches!(m.get("width"), Some(AttributeValue::N(w)) if w == "640")
        ));
    }

    #[test]
    fn test_dynamodb_item_converts_to_record() {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("42".to_string()));
        item.insert("count".to_string(), AttributeValue::N("3".to_string()));
        item.insert(
            "tags".to_string(),
            AttributeValue::L(vec![AttributeValue::S("cat".to_string())]),
        );

        let record: Record = serde_dynamo::from_item(item).unwrap();
        assert_eq!(record.get_str("id").unwrap(), "42");
        assert_eq!(record.fields.get("count"), Some(&json!(3)));
        assert_eq!(record.fields.get("tags"), Some(&json!(["cat"])));
    }

    #[test]
    fn test_to_write_request_carries_the_item() {
        let record = record(json!({"pk": "discord_1", "sk": "Image"}));
        let request = to_write_request(&record).unwrap();
        assert!(request.put_request().is_some());
    }
}
