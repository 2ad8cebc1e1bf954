//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values and cross references and
//! reports every problem it finds, not just the first.

use std::collections::HashSet;
use std::fmt;

use crate::chain::ChainNamespace;
use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.client_id.trim().is_empty() {
        errors.push(ValidationError::new("client_id", "must not be empty"));
    }

    if let Err(e) = config.chain.chain_id_u64() {
        errors.push(ValidationError::new("chain.chain_id", e.to_string()));
    }
    if let Err(e) = config.chain.rpc_url() {
        errors.push(ValidationError::new("chain.rpc_target", e.to_string()));
    }
    if config.chain.chain_namespace != ChainNamespace::Eip155 {
        errors.push(ValidationError::new(
            "chain.chain_namespace",
            "only eip155 chains are supported",
        ));
    }

    if config.adapters.is_empty() {
        errors.push(ValidationError::new("adapters", "at least one adapter is required"));
    }
    for (i, adapter) in config.adapters.iter().enumerate() {
        if adapter.name.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("adapters[{}].name", i),
                "must not be empty",
            ));
        }
    }

    let mut plugin_names = HashSet::new();
    for (i, plugin) in config.plugins.iter().enumerate() {
        if !plugin_names.insert(plugin.name.as_str()) {
            errors.push(ValidationError::new(
                format!("plugins[{}].name", i),
                format!("duplicate plugin '{}'", plugin.name),
            ));
        }
    }

    if config.session.session_time_secs == 0 {
        errors.push(ValidationError::new(
            "session.session_time_secs",
            "must be greater than zero",
        ));
    }
    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than zero"));
    }
    if config.rpc.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.receipt_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.rpc.poll_interval_ms == 0 {
        errors.push(ValidationError::new("rpc.poll_interval_ms", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
