use anyhow::Result;
use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::Client;
use httpmock::prelude::*;
use serde_json::json;

use single_table_etl::core::{Record, TableSink, TableSource};
use single_table_etl::utils::error::EtlError;
use single_table_etl::{DynamoDbTableSink, DynamoDbTableSource};

fn test_client(server: &MockServer) -> Client {
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(server.base_url())
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .build();
    Client::from_conf(config)
}

fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn image_batch(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            record(json!({
                "pk": format!("discord_{}", i),
                "sk": "Image",
                "url": format!("https://img.example/{}.png", i)
            }))
        })
        .collect()
}

#[tokio::test]
async fn test_scan_follows_pagination() -> Result<()> {
    let server = MockServer::start();

    let page2 = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.Scan")
            .body_contains("ExclusiveStartKey");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "Items": [{"id": {"S": "3"}, "url": {"S": "c.png"}}],
                    "Count": 1,
                    "ScannedCount": 1
                })
                .to_string(),
            );
    });

    let page1 = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.Scan")
            .matches(|req| {
                !String::from_utf8_lossy(req.body.as_deref().unwrap_or_default())
                    .contains("ExclusiveStartKey")
            });
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "Items": [
                        {"id": {"S": "1"}, "url": {"S": "a.png"}},
                        {"id": {"S": "2"}, "count": {"N": "5"}}
                    ],
                    "Count": 2,
                    "ScannedCount": 2,
                    "LastEvaluatedKey": {"id": {"S": "2"}}
                })
                .to_string(),
            );
    });

    let source = DynamoDbTableSource::new(test_client(&server), "image-info-table");
    let records = source.scan_records().await?;

    page1.assert();
    page2.assert();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get_str("id")?, "1");
    assert_eq!(records[1].fields.get("count"), Some(&json!(5)));
    assert_eq!(records[2].get_str("url")?, "c.png");
    Ok(())
}

#[tokio::test]
async fn test_scan_failure_surfaces_as_dynamodb_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.Scan");
        then.status(400)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
                    "message": "Requested resource not found"
                })
                .to_string(),
            );
    });

    let source = DynamoDbTableSource::new(test_client(&server), "missing-table");
    let err = source.scan_records().await.unwrap_err();

    assert!(matches!(err, EtlError::DynamoDbError { ref operation, .. } if operation == "Scan"));
}

#[tokio::test]
async fn test_write_records_chunks_batches_of_25() -> Result<()> {
    let server = MockServer::start();

    let write_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(json!({"UnprocessedItems": {}}).to_string());
    });

    let sink = DynamoDbTableSink::connect(test_client(&server), "random-image-site", None).await?;

    let written = sink.write_records(image_batch(30)).await?;

    assert_eq!(written, 30);
    write_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_unprocessed_items_are_resubmitted() -> Result<()> {
    let server = MockServer::start();

    let first_round = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
            .body_contains("discord_1");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "UnprocessedItems": {
                        "random-image-site": [
                            {"PutRequest": {"Item": {"pk": {"S": "discord_2"}, "sk": {"S": "Image"}}}}
                        ]
                    }
                })
                .to_string(),
            );
    });

    let resubmit = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
            .matches(|req| {
                !String::from_utf8_lossy(req.body.as_deref().unwrap_or_default())
                    .contains("discord_1")
            });
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(json!({"UnprocessedItems": {}}).to_string());
    });

    let sink = DynamoDbTableSink::connect(test_client(&server), "random-image-site", None).await?;

    let records = vec![
        record(json!({"pk": "discord_1", "sk": "Image"})),
        record(json!({"pk": "discord_2", "sk": "Image"})),
    ];
    let written = sink.write_records(records).await?;

    assert_eq!(written, 2);
    first_round.assert();
    resubmit.assert();
    Ok(())
}

#[tokio::test]
async fn test_persistently_unprocessed_items_fail_the_job() {
    let server = MockServer::start();

    let write_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "UnprocessedItems": {
                        "random-image-site": [
                            {"PutRequest": {"Item": {"pk": {"S": "discord_1"}, "sk": {"S": "Image"}}}}
                        ]
                    }
                })
                .to_string(),
            );
    });

    let sink = DynamoDbTableSink::connect(test_client(&server), "random-image-site", None)
        .await
        .unwrap();

    let err = sink
        .write_records(vec![record(json!({"pk": "discord_1", "sk": "Image"}))])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EtlError::UnprocessedItemsError {
            count: 1,
            attempts: 5,
            ..
        }
    ));
    write_mock.assert_hits(5);
}

#[tokio::test]
async fn test_connect_reads_provisioned_capacity_once() -> Result<()> {
    let server = MockServer::start();

    let describe_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.DescribeTable");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "Table": {
                        "TableName": "random-image-site",
                        "TableStatus": "ACTIVE",
                        "ProvisionedThroughput": {
                            "ReadCapacityUnits": 10,
                            "WriteCapacityUnits": 5000,
                            "NumberOfDecreasesToday": 0
                        }
                    }
                })
                .to_string(),
            );
    });

    let write_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(json!({"UnprocessedItems": {}}).to_string());
    });

    let sink =
        DynamoDbTableSink::connect(test_client(&server), "random-image-site", Some(0.5)).await?;

    describe_mock.assert();

    // paced at 2500 writes per second, both batches still go out quickly
    let written = sink.write_records(image_batch(30)).await?;
    assert_eq!(written, 30);
    write_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_on_demand_table_is_not_throttled() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.DescribeTable");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(
                json!({
                    "Table": {
                        "TableName": "random-image-site",
                        "TableStatus": "ACTIVE",
                        "BillingModeSummary": {"BillingMode": "PAY_PER_REQUEST"},
                        "ProvisionedThroughput": {
                            "ReadCapacityUnits": 0,
                            "WriteCapacityUnits": 0,
                            "NumberOfDecreasesToday": 0
                        }
                    }
                })
                .to_string(),
            );
    });

    let write_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(json!({"UnprocessedItems": {}}).to_string());
    });

    let sink =
        DynamoDbTableSink::connect(test_client(&server), "random-image-site", Some(0.5)).await?;

    let written = sink.write_records(image_batch(26)).await?;
    assert_eq!(written, 26);
    write_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_connect_without_throughput_skips_describe_table() -> Result<()> {
    let server = MockServer::start();

    let describe_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("x-amz-target", "DynamoDB_20120810.DescribeTable");
        then.status(200)
            .header("content-type", "application/x-amz-json-1.0")
            .body(json!({"Table": {"TableName": "random-image-site"}}).to_string());
    });

    DynamoDbTableSink::connect(test_client(&server), "random-image-site", None).await?;

    describe_mock.assert_hits(0);
    Ok(())
}
