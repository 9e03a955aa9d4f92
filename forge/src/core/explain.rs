//! Human-oriented breakdown of what a configuration will do.

use serde::Serialize;

use crate::core::catalog::{phase_info, tag_description};
use crate::core::composer::uses_vault_file;
use crate::core::types::{DeploymentConfiguration, Environment, LIMIT_ALL};

/// Pipeline stage used to group active tags. A tag may belong to several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initialisation,
    CoreApplication,
    SecurityNetworking,
    Observability,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Initialisation,
        Stage::CoreApplication,
        Stage::SecurityNetworking,
        Stage::Observability,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Stage::Initialisation => "1. Initialisation",
            Stage::CoreApplication => "2. Core Application",
            Stage::SecurityNetworking => "3. Security & Networking",
            Stage::Observability => "4. Observability & Logs",
        }
    }

    pub fn contains(self, tag: &str) -> bool {
        match self {
            Stage::Initialisation => matches!(
                tag,
                "copie" | "bootstrap" | "verif" | "ssh" | "finger" | "java_env"
            ),
            Stage::CoreApplication => {
                tag.starts_with("phase_") || matches!(tag, "solr" | "mcf" | "lancement")
            }
            Stage::SecurityNetworking => {
                matches!(tag, "nftables" | "replace_certs" | "verif_certilibre")
            }
            Stage::Observability => {
                matches!(tag, "logs" | "fetch_log" | "monitor_script" | "phase_post")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagExplanation {
    pub id: String,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageGroup {
    pub stage: Stage,
    pub title: &'static str,
    pub tags: Vec<TagExplanation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetEntry {
    pub label: &'static str,
    pub value: String,
}

/// Full explanation of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub environment: Environment,
    pub environment_label: &'static str,
    pub limit: String,
    /// Phase label, or `MANUAL` for a custom selection.
    pub operation: &'static str,
    /// Every active tag, in selection order.
    pub tags: Vec<TagExplanation>,
    /// Non-empty stage groups, in pipeline order.
    pub stages: Vec<StageGroup>,
    pub sheet: Vec<SheetEntry>,
    pub badges: Vec<String>,
    pub production_alert: bool,
}

pub const MANUAL_OPERATION: &str = "MANUAL";

pub const PRODUCTION_ALERT: &str = "ALERTE PRODUCTION : exécution directe (sans --check) sur \
    l'environnement de production. Risque de rupture de service.";

pub fn explain(config: &DeploymentConfiguration) -> Explanation {
    let tags: Vec<TagExplanation> = config
        .tags
        .iter()
        .map(|id| TagExplanation {
            id: id.clone(),
            description: tag_description(id),
        })
        .collect();

    let stages = Stage::ALL
        .into_iter()
        .filter_map(|stage| {
            let members: Vec<TagExplanation> = tags
                .iter()
                .filter(|tag| stage.contains(&tag.id))
                .cloned()
                .collect();
            (!members.is_empty()).then_some(StageGroup {
                stage,
                title: stage.title(),
                tags: members,
            })
        })
        .collect();

    let operation = if config.phase.is_custom() {
        MANUAL_OPERATION
    } else {
        phase_info(config.phase).label
    };

    let limit = if config.limit.is_empty() {
        LIMIT_ALL.to_string()
    } else {
        config.limit.clone()
    };

    Explanation {
        environment: config.environment,
        environment_label: config.environment.label(),
        limit,
        operation,
        tags,
        stages,
        sheet: technical_sheet(config),
        badges: badges(config),
        production_alert: config.environment == Environment::Prod && !config.check_mode,
    }
}

fn technical_sheet(config: &DeploymentConfiguration) -> Vec<SheetEntry> {
    let entry = |label: &'static str, value: String| SheetEntry { label, value };
    vec![
        entry(
            "Inventaire source",
            format!("inventories/{}/", config.environment.as_str()),
        ),
        entry(
            "Mode d'exécution",
            if config.check_mode {
                "Simulation (--check)".to_string()
            } else {
                "Application directe".to_string()
            },
        ),
        entry(
            "Gestion des Secrets",
            if uses_vault_file(config) {
                "Vault Pass File".to_string()
            } else {
                "Ask-Pass (Prompt)".to_string()
            },
        ),
        entry("SSH Strategy", "Linear / Pipelining".to_string()),
        entry(
            "Utilisateur distant",
            if config.remote_user.is_empty() {
                "System Default".to_string()
            } else {
                config.remote_user.clone()
            },
        ),
        entry(
            "Timeout SSH",
            if config.timeout > 0 {
                format!("{}s", config.timeout)
            } else {
                "Défaut".to_string()
            },
        ),
    ]
}

fn badges(config: &DeploymentConfiguration) -> Vec<String> {
    let mut badges = vec![format!("Tags : {}", config.tags.len())];
    if config.use_mogend_home {
        badges.push("Home Context ON".to_string());
    }
    if config.verbose {
        badges.push("VVV Logging".to_string());
    }
    if config.diff {
        badges.push("Diff Mode".to_string());
    }
    if config.forks > 0 {
        badges.push(format!("Forks: {}", config.forks));
    }
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::UNKNOWN_TAG_DESCRIPTION;
    use crate::core::phase::Phase;
    use crate::core::store::{apply_phase, toggle_tag};

    fn stage_ids(explanation: &Explanation, stage: Stage) -> Vec<String> {
        explanation
            .stages
            .iter()
            .find(|group| group.stage == stage)
            .map(|group| group.tags.iter().map(|tag| tag.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn full_pipeline_groups_tags_by_stage() {
        let config = apply_phase(&DeploymentConfiguration::default(), Phase::FullPipeline);
        let explanation = explain(&config);
        assert_eq!(
            stage_ids(&explanation, Stage::Initialisation),
            vec!["copie", "bootstrap", "verif"]
        );
        assert_eq!(
            stage_ids(&explanation, Stage::SecurityNetworking),
            vec!["nftables"]
        );
        assert_eq!(
            stage_ids(&explanation, Stage::Observability),
            vec!["phase_post", "logs"]
        );
        let core = stage_ids(&explanation, Stage::CoreApplication);
        assert!(core.contains(&"phase_post".to_string()));
        assert!(core.contains(&"lancement".to_string()));
        assert_eq!(explanation.operation, "Pipeline Complète");
    }

    #[test]
    fn empty_stages_are_skipped() {
        let config = apply_phase(&DeploymentConfiguration::default(), Phase::CustomTags);
        let explanation = explain(&config);
        assert!(explanation.stages.is_empty());
        assert!(explanation.tags.is_empty());
        assert_eq!(explanation.operation, MANUAL_OPERATION);
    }

    #[test]
    fn unknown_tags_use_fallback_description() {
        let config = toggle_tag(&DeploymentConfiguration::default(), "my_tag");
        let explanation = explain(&config);
        let custom = explanation
            .tags
            .iter()
            .find(|tag| tag.id == "my_tag")
            .expect("tag");
        assert_eq!(custom.description, UNKNOWN_TAG_DESCRIPTION);
    }

    #[test]
    fn production_alert_requires_prod_without_check() {
        let prod = DeploymentConfiguration {
            environment: Environment::Prod,
            ..DeploymentConfiguration::default()
        };
        assert!(explain(&prod).production_alert);
        let checked = DeploymentConfiguration {
            check_mode: true,
            ..prod.clone()
        };
        assert!(!explain(&checked).production_alert);
        assert!(!explain(&DeploymentConfiguration::default()).production_alert);
    }

    #[test]
    fn sheet_reflects_secrets_and_timeout() {
        let config = DeploymentConfiguration {
            vault_password: "x".to_string(),
            timeout: 45,
            remote_user: "datafari".to_string(),
            ..DeploymentConfiguration::default()
        };
        let explanation = explain(&config);
        let value = |label: &str| {
            explanation
                .sheet
                .iter()
                .find(|entry| entry.label == label)
                .map(|entry| entry.value.clone())
                .expect("sheet entry")
        };
        assert_eq!(value("Gestion des Secrets"), "Vault Pass File");
        assert_eq!(value("Timeout SSH"), "45s");
        assert_eq!(value("Utilisateur distant"), "datafari");
    }

    #[test]
    fn empty_limit_is_shown_as_all() {
        let config = DeploymentConfiguration {
            limit: String::new(),
            ..DeploymentConfiguration::default()
        };
        assert_eq!(explain(&config).limit, "all");
    }

    #[test]
    fn badges_list_active_options() {
        let config = DeploymentConfiguration {
            verbose: true,
            forks: 4,
            ..DeploymentConfiguration::default()
        };
        assert_eq!(
            explain(&config).badges,
            vec!["Tags : 1", "Home Context ON", "VVV Logging", "Forks: 4"]
        );
    }
}
