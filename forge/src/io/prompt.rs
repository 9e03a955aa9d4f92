//! Prompt rendering for the natural-language interpreter.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::catalog::catalog;

const INTERPRET_TEMPLATE: &str = include_str!("prompts/interpret.md");

/// Phrases operators use, mapped to the fields they set.
pub const KEYWORD_HINTS: [&str; 10] = [
    "\"diff\" / \"différence\" → `diff: true`",
    "\"pas à pas\" → `step: true`",
    "\"syntaxe\" → `syntaxCheck: true`",
    "\"lister\" → `listTasks: true` (or `listTags: true` when tags are listed)",
    "\"reprendre à <tâche>\" → `startAtTask: \"<tâche>\"`",
    "\"timeout <n>\" → `timeout: <n>`",
    "\"déploiement\" → `phase: \"phase_deployment\"`",
    "\"tout\" / \"complet\" → `phase: \"full_pipeline\"`",
    "\"sur mcf1\" → `limit: \"mcf1\"`",
    "\"uniquement solr\" → `limit: \"solr\"`",
];

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("interpret", INTERPRET_TEMPLATE)
            .context("load interpret template")?;
        Ok(Self { env })
    }

    /// Render the interpreter prompt for one operator request.
    pub fn render_interpret(&self, request: &str) -> Result<String> {
        let catalog = catalog();
        let template = self.env.get_template("interpret")?;
        let rendered = template
            .render(context! {
                request => request.trim(),
                environments => catalog.environments,
                phases => catalog.phases,
                groups => catalog.groups,
                tags => catalog.tags,
                hints => KEYWORD_HINTS,
            })
            .context("render interpret template")?;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_catalog_and_request() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine
            .render_interpret("  déploiement complet sur mcf1 en diff  ")
            .expect("render");

        assert!(prompt.contains("<contract>"));
        assert!(prompt.contains("Every other field is `null`."));
        assert!(prompt.contains("`prod`: Production"));
        assert!(prompt.contains("`full_pipeline` (Pipeline Complète)"));
        assert!(prompt.contains("`mcf2`: MCF2"));
        assert!(prompt.contains("`nftables`"));
        assert!(prompt.contains("\"pas à pas\""));
        assert!(prompt.contains("<request>\ndéploiement complet sur mcf1 en diff\n</request>"));
    }

    #[test]
    fn sections_appear_in_stable_order() {
        let prompt = PromptEngine::new()
            .expect("engine")
            .render_interpret("x")
            .expect("render");
        let order = [
            "### Interpreter Contract",
            "### Environments",
            "### Phases",
            "### Limit Groups",
            "### Specific Tags",
            "### Keyword Hints",
            "### Request",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|heading| prompt.find(heading).expect("section"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
