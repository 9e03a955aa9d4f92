//! Natural-language interpreter backed by an agent CLI.
//!
//! The agent receives a rendered prompt on stdin and must leave a single JSON
//! object matching `schemas/partial_config.schema.json` as its last message.
//! That message is validated again here before it becomes a
//! [`PartialConfiguration`].

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::types::PartialConfiguration;
use crate::io::executor::{CodexExecutor, ExecRequest, Executor, execute_and_load_text};
use crate::io::prompt::PromptEngine;
use crate::io::settings::InterpreterSettings;

use super::write_output_schema;

pub const OUTPUT_SCHEMA: &str = include_str!("../../schemas/partial_config.schema.json");

/// Turns free text into a configuration patch.
pub trait Interpreter {
    fn interpret(&self, text: &str) -> Result<PartialConfiguration>;
}

/// Interpreter that delegates to an [`Executor`] in a scratch directory.
#[derive(Debug, Clone)]
pub struct AgentInterpreter<E = CodexExecutor> {
    executor: E,
    timeout: Duration,
    output_limit_bytes: usize,
    scratch_root: Option<PathBuf>,
}

impl AgentInterpreter<CodexExecutor> {
    pub fn from_settings(settings: &InterpreterSettings) -> Result<Self> {
        let executor = CodexExecutor::new(settings.command.clone())?;
        Ok(Self::new(
            executor,
            Duration::from_secs(settings.timeout_secs),
            settings.output_limit_bytes,
        ))
    }
}

impl<E: Executor> AgentInterpreter<E> {
    pub fn new(executor: E, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            executor,
            timeout,
            output_limit_bytes,
            scratch_root: None,
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("forge-interpret-");
        match &self.scratch_root {
            Some(root) => builder
                .tempdir_in(root)
                .with_context(|| format!("create scratch dir in {}", root.display())),
            None => builder.tempdir().context("create scratch dir"),
        }
    }
}

impl<E: Executor> Interpreter for AgentInterpreter<E> {
    #[instrument(skip_all, fields(text_len = text.len()))]
    fn interpret(&self, text: &str) -> Result<PartialConfiguration> {
        let request = text.trim();
        if request.is_empty() {
            bail!("interpret: request text is empty");
        }

        let scratch = self.scratch_dir()?;
        let schema_path = scratch.path().join("partial_config.schema.json");
        write_output_schema(&schema_path, OUTPUT_SCHEMA)?;

        let prompt = PromptEngine::new()?.render_interpret(request)?;
        let exec_request = ExecRequest {
            workdir: scratch.path().to_path_buf(),
            prompt,
            output_schema_path: schema_path,
            output_path: scratch.path().join("last_message.txt"),
            executor_log_path: scratch.path().join("executor.log"),
            timeout: self.timeout,
            output_limit_bytes: self.output_limit_bytes,
        };

        let message = execute_and_load_text(&self.executor, &exec_request)?;
        let partial = parse_agent_reply(&message)?;
        debug!(fields = ?partial.field_names(), "interpreted request");
        Ok(partial)
    }
}

/// Parse, validate and normalise the agent's last message.
pub fn parse_agent_reply(message: &str) -> Result<PartialConfiguration> {
    let raw = extract_json_object(message)
        .ok_or_else(|| anyhow!("agent reply does not contain a JSON object"))?;
    let mut value: Value = serde_json::from_str(raw).context("parse agent reply json")?;
    let schema: Value = serde_json::from_str(OUTPUT_SCHEMA).context("parse output schema")?;
    fill_absent_properties(&mut value, &schema);
    validate_schema(&schema, &value)?;
    let partial: PartialConfiguration =
        serde_json::from_value(value).context("deserialize agent reply")?;
    Ok(expand_phase_tags(partial))
}

/// Locate the JSON object in a reply that may be wrapped in a fenced block
/// or surrounded by prose.
pub fn extract_json_object(message: &str) -> Option<&str> {
    static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced json regex")
    });

    if let Some(caps) = FENCED_RE.captures(message)
        && let Some(body) = caps.get(1)
    {
        return Some(body.as_str());
    }
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    (start < end).then(|| &message[start..=end])
}

/// Agents without schema enforcement may drop untouched fields; treat a
/// missing property like an explicit `null`.
fn fill_absent_properties(reply: &mut Value, schema: &Value) {
    let (Some(reply), Some(properties)) = (
        reply.as_object_mut(),
        schema.get("properties").and_then(Value::as_object),
    ) else {
        return;
    };
    for name in properties.keys() {
        reply.entry(name.clone()).or_insert(Value::Null);
    }
}

fn validate_schema(schema: &Value, reply: &Value) -> Result<()> {
    let compiled = validator_for(schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(reply)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("agent reply failed schema validation: {}", messages.join("; "));
    }
    Ok(())
}

/// A phase without explicit tags selects the phase's own tag list.
fn expand_phase_tags(mut partial: PartialConfiguration) -> PartialConfiguration {
    if let Some(phase) = partial.phase
        && partial.tags.as_ref().is_none_or(Vec::is_empty)
    {
        partial.tags = Some(phase.tags());
    }
    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::{DEPLOYMENT_TAGS, FULL_PIPELINE_TAGS, Phase};
    use crate::core::types::Environment;
    use crate::test_support::{ScriptedExecutor, agent_reply};
    use serde_json::json;

    fn interpreter(reply: &str) -> AgentInterpreter<ScriptedExecutor> {
        AgentInterpreter::new(
            ScriptedExecutor::replying(reply),
            Duration::from_secs(5),
            10_000,
        )
    }

    #[test]
    fn full_reply_becomes_partial() {
        let reply = agent_reply(json!({
            "environment": "prod",
            "limit": "mcf1",
            "diff": true,
        }));
        let partial = interpreter(&reply)
            .interpret("diff sur mcf1 en prod")
            .expect("interpret");
        assert_eq!(partial.environment, Some(Environment::Prod));
        assert_eq!(partial.limit.as_deref(), Some("mcf1"));
        assert_eq!(partial.diff, Some(true));
        assert_eq!(partial.field_names(), vec!["environment", "limit", "diff"]);
    }

    #[test]
    fn request_reaches_agent_with_schema() {
        let interpreter = interpreter(&agent_reply(json!({ "step": true })));
        interpreter.interpret("  pas à pas  ").expect("interpret");
        let request = interpreter.executor().last_request().expect("request");
        assert!(request.prompt.contains("<request>\npas à pas\n</request>"));
        assert!(request.output_schema_path.ends_with("partial_config.schema.json"));
        assert_eq!(request.timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_request_is_rejected_without_running_agent() {
        let interpreter = interpreter("{}");
        let err = interpreter.interpret("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(interpreter.executor().last_request().is_none());
    }

    #[test]
    fn fenced_reply_is_extracted() {
        let reply = format!(
            "Voici la configuration :\n```json\n{}\n```\n",
            agent_reply(json!({ "syntaxCheck": true }))
        );
        let partial = parse_agent_reply(&reply).expect("parse");
        assert_eq!(partial.syntax_check, Some(true));
    }

    #[test]
    fn extract_handles_prose_and_missing_object() {
        assert_eq!(
            extract_json_object("ok: {\"a\": {\"b\": 1}} done"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn minimal_reply_fills_absent_fields() {
        let partial = parse_agent_reply(r#"{"diff": true}"#).expect("parse");
        assert_eq!(partial.diff, Some(true));
        assert_eq!(partial.field_names(), vec!["diff"]);
    }

    #[test]
    fn minimal_reply_still_rejects_wrong_types() {
        let err = parse_agent_reply(r#"{"forks": "ten"}"#).unwrap_err();
        assert!(err.to_string().contains("schema validation"));
    }

    #[test]
    fn first_of_several_fenced_blocks_is_used() {
        let reply = "```json\n{\"diff\": true}\n```\nou bien\n```json\n{\"step\": true}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"diff\": true}"));
        let partial = parse_agent_reply(reply).expect("parse");
        assert_eq!(partial.diff, Some(true));
        assert_eq!(partial.step, None);
    }

    #[test]
    fn fenced_nested_object_is_kept_whole() {
        let reply = "```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn unknown_fields_fail_validation() {
        let mut value: Value =
            serde_json::from_str(&agent_reply(json!({ "diff": true }))).expect("json");
        value["vaultPassword"] = json!("secret");
        let err = parse_agent_reply(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("schema validation"));
    }

    #[test]
    fn unknown_phase_fails_validation() {
        let reply = agent_reply(json!({ "phase": "phase_everything" }));
        assert!(parse_agent_reply(&reply).is_err());
    }

    #[test]
    fn aggregate_phase_without_tags_expands() {
        let partial =
            parse_agent_reply(&agent_reply(json!({ "phase": "full_pipeline" }))).expect("parse");
        assert_eq!(partial.phase, Some(Phase::FullPipeline));
        assert_eq!(partial.tags.expect("tags").len(), FULL_PIPELINE_TAGS.len());

        let partial = parse_agent_reply(&agent_reply(json!({
            "phase": "phase_deployment",
            "tags": [],
        })))
        .expect("parse");
        assert_eq!(partial.tags.expect("tags").len(), DEPLOYMENT_TAGS.len());
    }

    #[test]
    fn explicit_tags_are_kept() {
        let partial = parse_agent_reply(&agent_reply(json!({
            "phase": "full_pipeline",
            "tags": ["logs"],
        })))
        .expect("parse");
        assert_eq!(partial.tags, Some(vec!["logs".to_string()]));
    }

    #[test]
    fn single_phase_selects_itself() {
        let partial =
            parse_agent_reply(&agent_reply(json!({ "phase": "phase_backup" }))).expect("parse");
        assert_eq!(partial.tags, Some(vec!["phase_backup".to_string()]));
    }

    #[test]
    fn agent_failure_propagates() {
        let interpreter = AgentInterpreter::new(
            ScriptedExecutor::failing("quota exceeded"),
            Duration::from_secs(5),
            10_000,
        );
        let err = interpreter.interpret("tout").unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn scratch_root_is_used_and_cleaned() {
        let temp = tempfile::tempdir().expect("tempdir");
        let interpreter = interpreter(&agent_reply(json!({ "verbose": true })))
            .with_scratch_root(temp.path());
        interpreter.interpret("verbose").expect("interpret");
        let request = interpreter.executor().last_request().expect("request");
        assert!(request.workdir.starts_with(temp.path()));
        assert!(!request.workdir.exists());
    }
}
