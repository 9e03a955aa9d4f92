//! One operator's working configuration and the assistant hook.
//!
//! [`Session`] owns the current [`DeploymentConfiguration`] and replaces it
//! wholesale through the pure transitions in [`crate::core::store`]. The CLI
//! builds one per invocation; the server keeps one behind a lock.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::agents::interpreter::Interpreter;
use crate::core::composer::{QuotingHazard, compose, quoting_hazards};
use crate::core::explain::{Explanation, explain};
use crate::core::phase::Phase;
use crate::core::store;
use crate::core::types::{DeploymentConfiguration, PartialConfiguration};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    config: DeploymentConfiguration,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DeploymentConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeploymentConfiguration {
        &self.config
    }

    pub fn update(&mut self, patch: &PartialConfiguration) {
        // Field names only: values may hold the vault password.
        debug!(fields = ?patch.field_names(), "update");
        self.config = store::update(&self.config, patch);
    }

    pub fn apply_phase(&mut self, phase: Phase) {
        debug!(%phase, "apply phase");
        self.config = store::apply_phase(&self.config, phase);
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        debug!(tag, "toggle tag");
        self.config = store::toggle_tag(&self.config, tag);
    }

    pub fn toggle_skip_tag(&mut self, tag: &str) {
        debug!(tag, "toggle skip tag");
        self.config = store::toggle_skip_tag(&self.config, tag);
    }

    pub fn toggle_limit_group(&mut self, group: &str) {
        debug!(group, "toggle limit group");
        self.config = store::toggle_limit_group(&self.config, group);
    }

    pub fn reset(&mut self) {
        debug!("reset");
        self.config = DeploymentConfiguration::default();
    }

    pub fn command(&self) -> String {
        compose(&self.config)
    }

    pub fn hazards(&self) -> Vec<QuotingHazard> {
        quoting_hazards(&self.config)
    }

    pub fn explain(&self) -> Explanation {
        explain(&self.config)
    }
}

/// Ask `interpreter` to turn `text` into a patch and merge it.
///
/// On failure the session is left untouched and the error is returned after
/// being logged. On success returns the names of the fields that were set.
#[instrument(skip_all)]
pub fn assist<I: Interpreter + ?Sized>(
    session: &mut Session,
    interpreter: &I,
    text: &str,
) -> Result<Vec<&'static str>> {
    match interpreter.interpret(text) {
        Ok(patch) => {
            let fields = patch.field_names();
            session.update(&patch);
            info!(fields = ?fields, "applied interpreted request");
            Ok(fields)
        }
        Err(err) => {
            warn!(err = %format!("{err:#}"), "interpretation failed, configuration unchanged");
            Err(err)
        }
    }
}

/// Monotonic ticket counter: only the most recently issued ticket may apply.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Environment;
    use crate::test_support::ScriptedInterpreter;

    #[test]
    fn transitions_replace_config() {
        let mut session = Session::new();
        session.apply_phase(Phase::Backup);
        session.toggle_limit_group("solr");
        session.toggle_tag("logs");
        session.toggle_skip_tag("nftables");

        let config = session.config();
        assert_eq!(config.phase, Phase::CustomTags);
        assert_eq!(config.limit, "solr");
        assert_eq!(config.tags, vec!["phase_backup", "logs"]);
        assert_eq!(config.skip_tags, vec!["nftables"]);
        assert!(session.command().contains("--skip-tags \"nftables\""));

        session.reset();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn assist_merges_on_success() {
        let interpreter = ScriptedInterpreter::new().then_ok(PartialConfiguration {
            environment: Some(Environment::Preprod),
            diff: Some(true),
            ..PartialConfiguration::default()
        });
        let mut session = Session::new();

        let fields = assist(&mut session, &interpreter, "diff en preprod").expect("assist");

        assert_eq!(fields, vec!["environment", "diff"]);
        assert_eq!(session.config().environment, Environment::Preprod);
        assert!(session.config().diff);
        assert_eq!(interpreter.requests(), vec!["diff en preprod"]);
    }

    #[test]
    fn assist_failure_leaves_config_unchanged() {
        let interpreter = ScriptedInterpreter::new().then_err("service unavailable");
        let mut session = Session::new();
        session.toggle_tag("logs");
        let before = session.clone();

        let err = assist(&mut session, &interpreter, "tout").unwrap_err();

        assert!(err.to_string().contains("service unavailable"));
        assert_eq!(session, before);
    }

    #[test]
    fn gate_only_accepts_latest_ticket() {
        let gate = RequestGate::new();
        let first = gate.issue();
        let second = gate.issue();
        assert!(second > first);
        assert!(!gate.is_latest(first));
        assert!(gate.is_latest(second));
    }
}
