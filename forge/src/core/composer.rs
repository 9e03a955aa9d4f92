//! Deterministic rendering of a configuration into an `ansible-playbook`
//! shell command.
//!
//! Composition is total: every field has an "omit" value, so any reachable
//! configuration renders. Free-text fields are embedded as typed, without
//! shell escaping; [`quoting_hazards`] reports the ones that would be
//! reinterpreted by the shell.

use serde::Serialize;

use crate::core::types::{DeploymentConfiguration, Environment, LIMIT_ALL};

/// Playbook run by every generated command.
pub const PLAYBOOK: &str = "playbooks/install.yml";

/// Transient file holding the vault password while the playbook runs.
pub const VAULT_PASS_FILE: &str = ".vault_pass";

/// Separator between shell stages: `&&` plus a line continuation.
pub const STAGE_SEPARATOR: &str = " && \\\n";

const HOME_STAGE: &str = "cd \"$MOGEND_HOME\"";

/// Inventory file for an environment.
pub fn inventory_path(environment: Environment) -> String {
    format!("inventories/{}/inventory.ini", environment.as_str())
}

/// True when the configuration carries a vault password (ignoring blanks).
pub fn uses_vault_file(config: &DeploymentConfiguration) -> bool {
    !config.vault_password.trim().is_empty()
}

/// Flags passed to `ansible-playbook`, in their fixed order.
pub fn playbook_flags(config: &DeploymentConfiguration) -> Vec<String> {
    let mut flags = vec![format!("-i {}", inventory_path(config.environment))];

    if !config.limit.is_empty() && config.limit != LIMIT_ALL {
        flags.push(format!("-l \"{}\"", config.limit));
    }
    if !config.tags.is_empty() {
        flags.push(format!("--tags \"{}\"", config.tags.join(",")));
    }
    if !config.skip_tags.is_empty() {
        flags.push(format!("--skip-tags \"{}\"", config.skip_tags.join(",")));
    }

    if uses_vault_file(config) {
        flags.push(format!("--vault-password-file {VAULT_PASS_FILE}"));
    } else {
        flags.push("--ask-vault-pass".to_string());
    }

    if config.forks > 0 {
        flags.push(format!("-f {}", config.forks));
    }
    if config.timeout > 0 {
        flags.push(format!("--timeout {}", config.timeout));
    }
    if !config.remote_user.is_empty() {
        flags.push(format!("-u {}", config.remote_user));
    }

    let switches = [
        (config.escalate, "--become"),
        (config.verbose, "-vvv"),
        (config.check_mode, "--check"),
        (config.diff, "--diff"),
        (config.step, "--step"),
        (config.syntax_check, "--syntax-check"),
        (config.list_tasks, "--list-tasks"),
        (config.list_tags, "--list-tags"),
    ];
    flags.extend(
        switches
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| flag.to_string()),
    );

    if !config.start_at_task.is_empty() {
        flags.push(format!("--start-at-task \"{}\"", config.start_at_task));
    }
    if !config.extra_vars_raw.is_empty() {
        flags.push(format!("-e \"{}\"", config.extra_vars_raw));
    }

    flags
}

/// Shell stages in execution order, before joining.
pub fn stages(config: &DeploymentConfiguration) -> Vec<String> {
    let vault = uses_vault_file(config);
    let mut stages = Vec::with_capacity(4);
    if config.use_mogend_home {
        stages.push(HOME_STAGE.to_string());
    }
    if vault {
        stages.push(format!(
            "echo \"{}\" > {VAULT_PASS_FILE}",
            config.vault_password
        ));
    }
    stages.push(format!(
        "ansible-playbook {PLAYBOOK} {}",
        playbook_flags(config).join(" ")
    ));
    if vault {
        stages.push(format!("rm -f {VAULT_PASS_FILE}"));
    }
    stages
}

/// Render the full multi-line shell command.
pub fn compose(config: &DeploymentConfiguration) -> String {
    stages(config).join(STAGE_SEPARATOR)
}

/// A free-text field whose value contains characters the shell interprets
/// inside (or around) the generated quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotingHazard {
    /// camelCase field name.
    pub field: &'static str,
    /// Offending characters, in first-seen order.
    pub characters: Vec<char>,
}

impl QuotingHazard {
    /// Human-readable warning. Never includes the field value.
    pub fn message(&self) -> String {
        let chars: Vec<String> = self
            .characters
            .iter()
            .map(|c| format!("'{c}'"))
            .collect();
        format!(
            "{} contains {} which the shell will interpret; the value is embedded unescaped",
            self.field,
            chars.join(", ")
        )
    }
}

const SHELL_SPECIAL: [char; 4] = ['"', '$', '`', '\\'];

/// Report free-text fields that are unsafe to embed unescaped.
pub fn quoting_hazards(config: &DeploymentConfiguration) -> Vec<QuotingHazard> {
    let fields: [(&'static str, &str); 5] = [
        ("limit", config.limit.as_str()),
        ("remoteUser", config.remote_user.as_str()),
        ("vaultPassword", config.vault_password.as_str()),
        ("startAtTask", config.start_at_task.as_str()),
        ("extraVarsRaw", config.extra_vars_raw.as_str()),
    ];
    fields
        .into_iter()
        .filter_map(|(field, value)| {
            let mut characters = Vec::new();
            for c in value.chars().filter(|c| SHELL_SPECIAL.contains(c)) {
                if !characters.contains(&c) {
                    characters.push(c);
                }
            }
            (!characters.is_empty()).then_some(QuotingHazard { field, characters })
        })
        .collect()
}
