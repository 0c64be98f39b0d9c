//! DynamoDB store implementation.
//!
//! Implements `TableStore` from `dynamodel_core::storage` using DynamoDB.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    PutRequest, TableStatus, WriteRequest,
};
use aws_sdk_dynamodb::Client;

use dynamodel_core::query::QueryPlan;
use dynamodel_core::storage::{PutMode, Result, StoreError, TableDefinition, TableStore};
use dynamodel_core::Item;

use super::conversions::{from_item, to_attribute_value, to_item, to_scalar_type};
use super::error::{
    map_batch_write_error, map_build_error, map_create_table_error, map_delete_table_error,
    map_describe_table_error, map_get_item_error, map_put_item_error, map_query_error,
};
use crate::config::ClientConfig;

/// Maximum number of write requests in one BatchWriteItem call.
const BATCH_WRITE_LIMIT: usize = 25;

/// DynamoDB-based store implementation.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    poll_interval: Duration,
    max_attempts: u32,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll_interval: Duration::from_millis(500),
            max_attempts: 60,
        }
    }

    /// Creates a new store from a client configuration.
    pub async fn connect(config: &ClientConfig) -> Self {
        Self::new(config.connect().await)
    }

    /// Creates a new store from environment configuration.
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub async fn from_env() -> Self {
        Self::connect(&ClientConfig::from_env()).await
    }

    /// Changes how table status is polled after create and delete.
    pub fn with_polling(mut self, poll_interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches the current table status, `None` if the table doesn't exist.
    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(output) => Ok(Some(
                output
                    .table()
                    .and_then(|table| table.table_status())
                    .cloned()
                    .unwrap_or(TableStatus::Active),
            )),
            Err(err) => match map_describe_table_error(err, table_name) {
                StoreError::TableNotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn wait_for_table_active(&self, table_name: &str) -> Result<()> {
        for _ in 0..self.max_attempts {
            if let Some(TableStatus::Active) = self.table_status(table_name).await? {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(StoreError::TableActivationTimeout(table_name.to_string()))
    }

    async fn wait_for_table_gone(&self, table_name: &str) -> Result<()> {
        for _ in 0..self.max_attempts {
            if self.table_status(table_name).await?.is_none() {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(StoreError::TableActivationTimeout(table_name.to_string()))
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let table = &definition.table;
        let mut key_schema = Vec::new();
        let mut attribute_definitions = Vec::new();

        for (index, (name, tag)) in definition.key_attributes().into_iter().enumerate() {
            let key_type = if index == 0 {
                KeyType::Hash
            } else {
                KeyType::Range
            };
            key_schema.push(
                KeySchemaElement::builder()
                    .attribute_name(name)
                    .key_type(key_type)
                    .build()
                    .map_err(map_build_error)?,
            );
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(to_scalar_type(tag))
                    .build()
                    .map_err(map_build_error)?,
            );
        }

        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(table.throughput.read)
            .write_capacity_units(table.throughput.write)
            .build()
            .map_err(map_build_error)?;

        tracing::info!(table = %table.name, "Creating table");

        self.client
            .create_table()
            .table_name(&table.name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, &table.name))?;

        self.wait_for_table_active(&table.name).await
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        tracing::info!(table = %table_name, "Deleting table");

        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table_name))?;

        self.wait_for_table_gone(table_name).await
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool> {
        Ok(self.table_status(table_name).await?.is_some())
    }

    async fn put_item(&self, table_name: &str, item: Item, mode: PutMode) -> Result<()> {
        let mut request = self
            .client
            .put_item()
            .table_name(table_name)
            .set_item(Some(to_item(&item)));

        if let (Some(condition), PutMode::Unique { hash_key }) = (mode.condition_expression(), &mode)
        {
            request = request
                .condition_expression(condition)
                .expression_attribute_names("#hash_key", hash_key);
        }

        tracing::debug!(table = %table_name, ?mode, "PutItem");

        request
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table_name))?;

        Ok(())
    }

    async fn batch_put(&self, table_name: &str, items: Vec<Item>) -> Result<()> {
        let mut unprocessed = 0;

        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|item| {
                    let put = PutRequest::builder()
                        .set_item(Some(to_item(item)))
                        .build()
                        .map_err(map_build_error)?;
                    Ok::<_, StoreError>(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(table = %table_name, count = requests.len(), "BatchWriteItem");

            let output = self
                .client
                .batch_write_item()
                .request_items(table_name, requests)
                .send()
                .await
                .map_err(|e| map_batch_write_error(e, table_name))?;

            unprocessed += output
                .unprocessed_items()
                .map(|pending| pending.values().map(Vec::len).sum::<usize>())
                .unwrap_or(0);
        }

        if unprocessed > 0 {
            tracing::warn!(table = %table_name, unprocessed, "Batch write left items unprocessed");
            return Err(StoreError::UnprocessedItems(unprocessed));
        }

        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        tracing::debug!(table = %table_name, "GetItem");

        let result = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(to_item(&key)))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table_name))?;

        match result.item {
            Some(item) => Ok(Some(from_item(&item)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, table_name: &str, plan: &QueryPlan) -> Result<Vec<Item>> {
        let values: HashMap<String, AttributeValue> = plan
            .attribute_values
            .iter()
            .map(|(placeholder, value)| (placeholder.clone(), to_attribute_value(value)))
            .collect();

        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(table_name)
                .key_condition_expression(&plan.key_condition_expression)
                .set_filter_expression(plan.filter_expression.clone())
                .set_expression_attribute_names(Some(plan.attribute_names.clone()))
                .set_expression_attribute_values(Some(values.clone()))
                .scan_index_forward(plan.scan_forward)
                .set_exclusive_start_key(start_key.take());

            if let Some(limit) = plan.limit {
                request = request.limit(limit);
            }

            tracing::debug!(table = %table_name, page_start = items.len(), "Query");

            let output = request
                .send()
                .await
                .map_err(|e| map_query_error(e, table_name))?;

            for item in output.items.unwrap_or_default() {
                items.push(from_item(&item)?);
            }

            let wants_more = plan
                .limit
                .is_none_or(|limit| items.len() < limit.max(0) as usize);

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() && wants_more => start_key = Some(key),
                _ => break,
            }
        }

        if let Some(limit) = plan.limit {
            items.truncate(limit.max(0) as usize);
        }

        Ok(items)
    }
}
