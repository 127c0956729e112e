//! Headline counts and device overview

use crate::envelope::normalize;
use arl_transport::{is_truthy, QueryParams, Transport, TransportError};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Path of the backend host report
pub const DEVICE_INFO_PATH: &str = "console/info";

/// Counted collections, with their labels
pub const DASHBOARD_RESOURCES: [(&str, &str); 4] = [
    ("Tasks", "task"),
    ("Domains", "domain"),
    ("Sites", "site"),
    ("Asset scopes", "asset_scope"),
];

/// Total of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCount {
    /// Display label
    pub label: &'static str,
    /// Collection name
    pub resource: &'static str,
    /// Backend-reported total
    pub total: u64,
}

/// Dashboard state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DashboardSummary {
    /// Every count succeeded
    Counts(Vec<StatCount>),
    /// At least one count failed
    Unavailable {
        /// First failure
        reason: String,
    },
}

/// Fetch every headline total concurrently; any failure voids the summary
pub async fn dashboard_counts(transport: &dyn Transport) -> DashboardSummary {
    let params = QueryParams::new().with("page", 1).with("size", 1);
    let requests = DASHBOARD_RESOURCES.iter().map(|&(label, resource)| {
        let params = &params;
        async move {
            let body = transport.get(&format!("{resource}/"), params).await?;
            Ok::<_, TransportError>(StatCount {
                label,
                resource,
                total: normalize(&body).total,
            })
        }
    });

    match try_join_all(requests).await {
        Ok(counts) => DashboardSummary::Counts(counts),
        Err(err) => {
            warn!(error = %err, "dashboard counts unavailable");
            DashboardSummary::Unavailable {
                reason: err.operator_message(),
            }
        }
    }
}

/// Backend host report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeviceInfo {
    /// Entries in backend order, values as display text
    Available(IndexMap<String, String>),
    /// Report could not be fetched
    Unavailable {
        /// Failure message
        reason: String,
    },
}

/// Counts and device report together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Headline totals
    pub counts: DashboardSummary,
    /// Host report
    pub device: DeviceInfo,
}

/// Fetch the backend's CPU, memory and disk report
///
/// The entries live under `data.device_info`, or `device_info` when `data`
/// is absent or falsy. A missing or non-object report yields no entries.
pub async fn device_info(transport: &dyn Transport) -> DeviceInfo {
    match transport.get(DEVICE_INFO_PATH, &QueryParams::new()).await {
        Ok(body) => DeviceInfo::Available(device_entries(&body)),
        Err(err) => {
            warn!(error = %err, "device info unavailable");
            DeviceInfo::Unavailable {
                reason: err.operator_message(),
            }
        }
    }
}

fn device_entries(body: &Value) -> IndexMap<String, String> {
    let payload = body.get("data").filter(|data| is_truthy(data)).unwrap_or(body);
    let Some(Value::Object(info)) = payload.get("device_info") else {
        return IndexMap::new();
    };
    info.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

/// Counts and device report, fetched concurrently
pub async fn load_dashboard(transport: &dyn Transport) -> Dashboard {
    let (counts, device) = futures::join!(dashboard_counts(transport), device_info(transport));
    Dashboard { counts, device }
}
