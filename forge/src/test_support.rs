//! Test-only helpers: scripted agents and reply builders.

use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::agents::interpreter::{Interpreter, OUTPUT_SCHEMA};
use crate::core::types::PartialConfiguration;
use crate::io::executor::{ExecRequest, Executor};

/// Build a schema-complete agent reply: every property null except `fields`.
pub fn agent_reply(fields: Value) -> String {
    let schema: Value = serde_json::from_str(OUTPUT_SCHEMA).expect("output schema json");
    let mut reply: Map<String, Value> = schema["properties"]
        .as_object()
        .expect("schema properties")
        .keys()
        .map(|key| (key.clone(), Value::Null))
        .collect();
    if let Value::Object(overrides) = fields {
        reply.extend(overrides);
    }
    Value::Object(reply).to_string()
}

/// Executor that writes a fixed last message (or fails) and records the request.
pub struct ScriptedExecutor {
    outcome: std::result::Result<String, String>,
    last_request: Mutex<Option<ExecRequest>>,
}

impl ScriptedExecutor {
    pub fn replying(message: &str) -> Self {
        Self {
            outcome: Ok(message.to_string()),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            outcome: Err(error.to_string()),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<ExecRequest> {
        self.last_request.lock().expect("lock").clone()
    }
}

impl Executor for ScriptedExecutor {
    fn exec(&self, request: &ExecRequest) -> Result<()> {
        *self.last_request.lock().expect("lock") = Some(request.clone());
        match &self.outcome {
            Ok(message) => {
                fs::write(&request.output_path, message)?;
                Ok(())
            }
            Err(error) => Err(anyhow!("{error}")),
        }
    }
}

/// Interpreter that replays queued outcomes in order and records requests.
#[derive(Default)]
pub struct ScriptedInterpreter {
    outcomes: Mutex<VecDeque<std::result::Result<PartialConfiguration, String>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, partial: PartialConfiguration) -> Self {
        self.outcomes.lock().expect("lock").push_back(Ok(partial));
        self
    }

    pub fn then_err(self, error: &str) -> Self {
        self.outcomes
            .lock()
            .expect("lock")
            .push_back(Err(error.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Interpreter for ScriptedInterpreter {
    fn interpret(&self, text: &str) -> Result<PartialConfiguration> {
        self.requests.lock().expect("lock").push(text.to_string());
        match self.outcomes.lock().expect("lock").pop_front() {
            Some(Ok(partial)) => Ok(partial),
            Some(Err(error)) => Err(anyhow!("{error}")),
            None => Err(anyhow!("scripted interpreter has no outcome left")),
        }
    }
}
