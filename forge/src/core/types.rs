//! Deployment configuration shared by the store, the composer and the
//! explanation view.
//!
//! These types carry no derived state: the rendered command is always
//! recomputed from the current [`DeploymentConfiguration`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::phase::Phase;

/// Limit value meaning "every host in the inventory".
pub const LIMIT_ALL: &str = "all";

/// Target environment; selects the inventory directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Qual,
    Preprod,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Qual, Environment::Preprod, Environment::Prod];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Qual => "qual",
            Environment::Preprod => "preprod",
            Environment::Prod => "prod",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Environment::Qual => "Qualif",
            Environment::Preprod => "Preprod",
            Environment::Prod => "Production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| format!("unknown environment '{s}' (expected qual, preprod or prod)"))
    }
}

/// Every option of one `ansible-playbook` invocation.
///
/// Empty strings, zero (or negative) counts and `false` switches all mean
/// "omit the flag".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentConfiguration {
    pub environment: Environment,
    /// Comma-separated host groups, or [`LIMIT_ALL`].
    pub limit: String,
    pub tags: Vec<String>,
    /// UI marker for the phase that produced `tags`; not emitted.
    pub phase: Phase,
    pub forks: i64,
    pub timeout: i64,
    pub remote_user: String,
    pub start_at_task: String,
    pub vault_password: String,
    pub extra_vars_raw: String,
    pub verbose: bool,
    pub check_mode: bool,
    pub diff: bool,
    pub step: bool,
    pub syntax_check: bool,
    pub list_tasks: bool,
    pub list_tags: bool,
    /// `--become` (privilege escalation on the managed hosts).
    #[serde(rename = "become")]
    pub escalate: bool,
    pub use_mogend_home: bool,
    pub skip_tags: Vec<String>,
}

impl Default for DeploymentConfiguration {
    fn default() -> Self {
        Self {
            environment: Environment::Qual,
            limit: LIMIT_ALL.to_string(),
            tags: Phase::Precheck.tags(),
            phase: Phase::Precheck,
            forks: 0,
            timeout: 0,
            remote_user: String::new(),
            start_at_task: String::new(),
            vault_password: String::new(),
            extra_vars_raw: String::new(),
            verbose: false,
            check_mode: false,
            diff: false,
            step: false,
            syntax_check: false,
            list_tasks: false,
            list_tags: false,
            escalate: false,
            use_mogend_home: true,
            skip_tags: Vec::new(),
        }
    }
}

/// Field-level patch merged into a [`DeploymentConfiguration`].
///
/// Absent fields leave the current value untouched. This is also the shape
/// the natural-language interpreter returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at_task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_vars_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_check: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_tasks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_tags: Option<bool>,
    #[serde(rename = "become", skip_serializing_if = "Option::is_none")]
    pub escalate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mogend_home: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tags: Option<Vec<String>>,
}

impl PartialConfiguration {
    /// Names (camelCase) of the fields this patch sets, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let flags = [
            ("environment", self.environment.is_some()),
            ("limit", self.limit.is_some()),
            ("tags", self.tags.is_some()),
            ("phase", self.phase.is_some()),
            ("forks", self.forks.is_some()),
            ("timeout", self.timeout.is_some()),
            ("remoteUser", self.remote_user.is_some()),
            ("startAtTask", self.start_at_task.is_some()),
            ("vaultPassword", self.vault_password.is_some()),
            ("extraVarsRaw", self.extra_vars_raw.is_some()),
            ("verbose", self.verbose.is_some()),
            ("checkMode", self.check_mode.is_some()),
            ("diff", self.diff.is_some()),
            ("step", self.step.is_some()),
            ("syntaxCheck", self.syntax_check.is_some()),
            ("listTasks", self.list_tasks.is_some()),
            ("listTags", self.list_tags.is_some()),
            ("become", self.escalate.is_some()),
            ("useMogendHome", self.use_mogend_home.is_some()),
            ("skipTags", self.skip_tags.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}

/// Drop repeated entries while keeping first-occurrence order.
pub fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
