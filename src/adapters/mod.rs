// Adapters layer: concrete DynamoDB implementations of the domain ports.

pub mod dynamodb;

pub use dynamodb::{build_client, DynamoDbTableSink, DynamoDbTableSource};
