//! Component selection as it appears in pipeline configuration

use serde::{Deserialize, Serialize};

use super::schema::ComponentConfig;

/// `{ "type": <key>, "config": {...} }` entry selecting one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(rename = "type")]
    pub key: String,
    #[serde(default)]
    pub config: ComponentConfig,
}

impl ComponentSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            config: ComponentConfig::new(),
        }
    }

    pub fn with_config(mut self, config: ComponentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config = self.config.with(key, value);
        self
    }
}
