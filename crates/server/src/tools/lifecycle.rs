//! Lifecycle tools: sw_install, sw_activate and sw_status.

use std::sync::Arc;

use lumina_client::{LifecycleState, ServiceWorker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub cache_name: String,
    pub precached: usize,
    /// True when the new version will be activated without waiting.
    pub ready_to_activate: bool,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub cache_name: String,
    /// Namespaces of earlier versions that were deleted.
    pub deleted: Vec<String>,
    pub controls_clients: bool,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub state: String,
    pub cache_name: String,
    pub origin: String,
    pub controls_clients: bool,
    pub ready_to_activate: bool,
}

fn state_name(state: LifecycleState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{state:?}"))
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &Arc<ServiceWorker>) -> Result<CallToolResult, McpError> {
    worker.on_install().await?;

    let output = SwInstallOutput {
        cache_name: worker.config().cache_name(),
        precached: worker.config().precache_urls.len(),
        ready_to_activate: worker.ready_to_activate().await,
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &Arc<ServiceWorker>) -> Result<CallToolResult, McpError> {
    let deleted = worker.on_activate().await?;

    let output = SwActivateOutput {
        cache_name: worker.config().cache_name(),
        deleted,
        controls_clients: worker.controls_clients(),
    };
    json_result(&output)
}

/// Implementation of the sw_status tool.
pub async fn status_impl(worker: &Arc<ServiceWorker>) -> Result<CallToolResult, McpError> {
    let output = SwStatusOutput {
        state: state_name(worker.state().await),
        cache_name: worker.config().cache_name(),
        origin: worker.origin().to_string(),
        controls_clients: worker.controls_clients(),
        ready_to_activate: worker.ready_to_activate().await,
    };
    json_result(&output)
}
