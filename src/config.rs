//! Runtime configuration, resolved once by the binary and passed down.

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::dynamodb::RetryPolicy;

/// Settings for one run against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    /// AWS region; the SDK default chain applies when unset.
    pub region: Option<String>,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: None,
            endpoint_url: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (&self.endpoint_url, &self.region) {
            (Some(url), _) => format!("table '{}' on local DynamoDB ({url})", self.table_name),
            (None, Some(region)) => {
                format!("table '{}' on AWS DynamoDB (region: {region})", self.table_name)
            }
            (None, None) => format!("table '{}' on AWS DynamoDB", self.table_name),
        }
    }

    /// Loads the AWS SDK configuration with this config's overrides applied.
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }
}
