// Batch execution of outbound operations with per-item failure isolation

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ItemParameters, OutboundOperation};
use crate::client::ZaloBotClient;
use crate::error::{BatchError, ClientError};

/// Batch execution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Record a failing item as `{"error": message}` instead of aborting.
    pub continue_on_failure: bool,
}

/// One output record, paired with the index of the input item it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub json: Value,
    pub paired_item: usize,
}

impl OutputRecord {
    pub fn is_error(&self) -> bool {
        self.json
            .as_object()
            .map(|o| o.len() == 1 && o.contains_key("error"))
            .unwrap_or(false)
    }
}

/// Runs a resource/operation pair over a batch of items.
#[derive(Debug, Clone)]
pub struct OperationDispatcher {
    client: ZaloBotClient,
}

impl OperationDispatcher {
    pub fn new(client: ZaloBotClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ZaloBotClient {
        &self.client
    }

    /// Execute one operation per item, in input order.
    ///
    /// Output record `i` always corresponds to input item `i`.
    ///
    /// # Errors
    ///
    /// Without `continue_on_failure`, the first failing item aborts the batch
    /// and the remaining items are not processed.
    pub async fn execute_batch(
        &self,
        resource: &str,
        operation: &str,
        items: &[ItemParameters],
        options: BatchOptions,
    ) -> Result<Vec<OutputRecord>, BatchError> {
        let mut records = Vec::with_capacity(items.len());

        for (index, params) in items.iter().enumerate() {
            match self.execute_item(resource, operation, params).await {
                Ok(output) => records.push(OutputRecord {
                    json: output,
                    paired_item: index,
                }),
                Err(e) if options.continue_on_failure => {
                    warn!(
                        resource = resource,
                        operation = operation,
                        item_index = index,
                        error = %e,
                        "Item failed, continuing with next item"
                    );
                    records.push(OutputRecord {
                        json: json!({ "error": e.to_string() }),
                        paired_item: index,
                    });
                }
                Err(e) => {
                    warn!(
                        resource = resource,
                        operation = operation,
                        item_index = index,
                        error = %e,
                        "Item failed, aborting batch"
                    );
                    return Err(BatchError {
                        item_index: index,
                        source: e,
                    });
                }
            }
        }

        debug!(
            resource = resource,
            operation = operation,
            count = records.len(),
            "Batch completed"
        );

        Ok(records)
    }

    /// Resolve, execute, and unwrap a single item.
    pub async fn execute_item(
        &self,
        resource: &str,
        operation: &str,
        params: &ItemParameters,
    ) -> Result<Value, ClientError> {
        let operation = OutboundOperation::from_parameters(resource, operation, params)?;
        self.client.perform(&operation).await
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
