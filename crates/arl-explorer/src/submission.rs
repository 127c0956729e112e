//! Task creation, policy runs, scope sync and management forms
//!
//! Every submission validates locally first; nothing is sent when a
//! required field is blank. Outcomes are reported through the context's
//! notifier as well as returned.

use crate::error::{ExplorerError, ExplorerResult};
use arl_transport::{ApiContext, Notice, Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Form posted to the backend
pub trait Submission: Serialize + Send + Sync {
    /// Endpoint path
    const PATH: &'static str;

    /// Human name used in notices
    const NOUN: &'static str;

    /// Reject blank required fields
    fn validate(&self) -> ExplorerResult<()>;
}

fn require(fields: &[(&str, &str)]) -> ExplorerResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExplorerError::validation(format!(
            "{} must not be empty",
            missing.join(" and ")
        )))
    }
}

/// Validate, post and report a submission
pub async fn submit<S: Submission>(
    ctx: &ApiContext,
    transport: &dyn Transport,
    form: &S,
) -> ExplorerResult<Value> {
    if let Err(err) = form.validate() {
        ctx.notify(Notice::error(err.operator_message()));
        return Err(err);
    }
    let payload = serde_json::to_value(form).map_err(arl_transport::TransportError::from)?;

    match transport.post(S::PATH, &payload).await {
        Ok(body) => {
            info!(path = S::PATH, "{} submitted", S::NOUN);
            ctx.notify(Notice::success(format!("{} submitted.", capitalize(S::NOUN))));
            Ok(body)
        }
        Err(err) => {
            ctx.notify(Notice::error(format!("Failed to submit {}.", S::NOUN)));
            Err(err.into())
        }
    }
}

fn capitalize(noun: &str) -> String {
    let mut chars = noun.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Scan depth presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPreset {
    /// Brute force and port scan on test dictionaries, site identification
    #[default]
    Standard,
    /// Every plugin, large dictionaries
    Deep,
}

/// New scan task; option fields map one-to-one to backend plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct TaskSubmission {
    pub name: String,
    pub target: String,
    pub domain_brute: bool,
    pub domain_brute_type: String,
    pub port_scan: bool,
    pub port_scan_type: String,
    pub site_identify: bool,
    pub site_capture: bool,
    pub search_engines: bool,
    pub site_spider: bool,
    pub arl_search: bool,
    pub alt_dns: bool,
    pub service_detection: bool,
    pub os_detection: bool,
    pub file_leak: bool,
    pub ssl_cert: bool,
    pub dns_query_plugin: bool,
    pub skip_scan_cdn_ip: bool,
    pub nuclei_scan: bool,
    pub findvhost: bool,
    pub web_info_hunter: bool,
}

impl TaskSubmission {
    /// Task with trimmed name and target and the preset's options
    #[must_use]
    pub fn new(name: &str, target: &str, preset: ScanPreset) -> Self {
        let deep = preset == ScanPreset::Deep;
        Self {
            name: name.trim().to_string(),
            target: target.trim().to_string(),
            domain_brute: true,
            domain_brute_type: if deep { "big" } else { "test" }.to_string(),
            port_scan: true,
            port_scan_type: if deep { "top1000" } else { "test" }.to_string(),
            site_identify: true,
            site_capture: true,
            search_engines: deep,
            site_spider: deep,
            arl_search: true,
            alt_dns: deep,
            service_detection: deep,
            os_detection: deep,
            file_leak: deep,
            ssl_cert: deep,
            dns_query_plugin: deep,
            skip_scan_cdn_ip: false,
            nuclei_scan: deep,
            findvhost: deep,
            web_info_hunter: deep,
        }
    }
}

impl Submission for TaskSubmission {
    const PATH: &'static str = "task/";
    const NOUN: &'static str = "task";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("name", self.name.as_str()), ("target", self.target.as_str())])
    }
}

/// Tag attached to policy tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTag {
    /// Regular task
    #[default]
    Task,
    /// Risk cruising run
    RiskCruising,
}

/// Task run from a stored policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PolicyTaskSubmission {
    pub name: String,
    pub target: String,
    pub task_tag: TaskTag,
    pub policy_id: String,
    /// Optional; sent blank when unset
    pub result_set_id: String,
}

impl PolicyTaskSubmission {
    /// Policy run with trimmed fields and no result set
    #[must_use]
    pub fn new(name: &str, target: &str, policy_id: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            target: target.trim().to_string(),
            task_tag: TaskTag::default(),
            policy_id: policy_id.trim().to_string(),
            result_set_id: String::new(),
        }
    }

    /// Set tag
    #[must_use]
    pub fn with_tag(mut self, tag: TaskTag) -> Self {
        self.task_tag = tag;
        self
    }

    /// Set result set
    #[must_use]
    pub fn with_result_set(mut self, result_set_id: &str) -> Self {
        self.result_set_id = result_set_id.trim().to_string();
        self
    }
}

impl Submission for PolicyTaskSubmission {
    const PATH: &'static str = "task/policy/";
    const NOUN: &'static str = "policy task";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("name", self.name.as_str()), ("policy_id", self.policy_id.as_str())])
    }
}

/// Link a task's results to an asset scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ScopeSync {
    pub task_id: String,
    pub scope_id: String,
}

impl ScopeSync {
    /// Sync request with trimmed ids
    #[must_use]
    pub fn new(task_id: &str, scope_id: &str) -> Self {
        Self {
            task_id: task_id.trim().to_string(),
            scope_id: scope_id.trim().to_string(),
        }
    }
}

impl Submission for ScopeSync {
    const PATH: &'static str = "task/sync/";
    const NOUN: &'static str = "scope sync";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("task_id", self.task_id.as_str()), ("scope_id", self.scope_id.as_str())])
    }
}

/// Kind of target an asset scope holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Root domains
    #[default]
    Domain,
    /// IP ranges
    Ip,
}

/// New asset scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AssetScopeSubmission {
    pub name: String,
    pub scope: String,
    /// Excluded targets; may be blank
    pub black_scope: String,
    pub scope_type: ScopeType,
}

impl AssetScopeSubmission {
    /// Scope with trimmed fields and nothing excluded
    #[must_use]
    pub fn new(name: &str, scope: &str, scope_type: ScopeType) -> Self {
        Self {
            name: name.trim().to_string(),
            scope: scope.trim().to_string(),
            black_scope: String::new(),
            scope_type,
        }
    }

    /// Set excluded targets
    #[must_use]
    pub fn with_black_scope(mut self, black_scope: &str) -> Self {
        self.black_scope = black_scope.trim().to_string();
        self
    }
}

impl Submission for AssetScopeSubmission {
    const PATH: &'static str = "asset_scope/";
    const NOUN: &'static str = "asset scope";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("name", self.name.as_str()), ("scope", self.scope.as_str())])
    }
}

/// Recurring monitor of one domain inside a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ScheduleSubmission {
    pub scope_id: String,
    pub domain: String,
    /// Seconds between runs
    pub interval: u64,
    /// Optional
    pub name: String,
    /// Optional
    pub policy_id: String,
}

impl ScheduleSubmission {
    /// Schedule with trimmed fields, no name and no policy
    #[must_use]
    pub fn new(scope_id: &str, domain: &str, interval: u64) -> Self {
        Self {
            scope_id: scope_id.trim().to_string(),
            domain: domain.trim().to_string(),
            interval,
            name: String::new(),
            policy_id: String::new(),
        }
    }

    /// Set name
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.trim().to_string();
        self
    }

    /// Set policy
    #[must_use]
    pub fn with_policy(mut self, policy_id: &str) -> Self {
        self.policy_id = policy_id.trim().to_string();
        self
    }
}

impl Submission for ScheduleSubmission {
    const PATH: &'static str = "scheduler/add/";
    const NOUN: &'static str = "schedule";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("scope_id", self.scope_id.as_str()), ("domain", self.domain.as_str())])?;
        if self.interval == 0 {
            return Err(ExplorerError::validation("interval must be greater than zero"));
        }
        Ok(())
    }
}

/// GitHub leak monitoring task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct GithubTaskSubmission {
    pub name: String,
    pub keyword: String,
}

impl GithubTaskSubmission {
    /// Task with trimmed name and keyword
    #[must_use]
    pub fn new(name: &str, keyword: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            keyword: keyword.trim().to_string(),
        }
    }
}

impl Submission for GithubTaskSubmission {
    const PATH: &'static str = "github_task/";
    const NOUN: &'static str = "GitHub task";

    fn validate(&self) -> ExplorerResult<()> {
        require(&[("name", self.name.as_str()), ("keyword", self.keyword.as_str())])
    }
}
