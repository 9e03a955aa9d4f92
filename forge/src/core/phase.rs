//! Deployment phases and the phase → tag derivation table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tags run by the `full_pipeline` phase, in playbook order.
pub const FULL_PIPELINE_TAGS: [&str; 15] = [
    "copie",
    "bootstrap",
    "verif",
    "phase_precheck",
    "phase_install",
    "phase_configuration",
    "phase_frontend",
    "phase_mcf",
    "phase_services",
    "phase_start",
    "phase_post",
    "nftables",
    "lancement",
    "phase_backup",
    "logs",
];

/// Tags run by the `phase_deployment` phase: the full pipeline without
/// `copie` and `bootstrap`.
pub const DEPLOYMENT_TAGS: [&str; 13] = [
    "verif",
    "phase_precheck",
    "phase_install",
    "phase_configuration",
    "phase_frontend",
    "phase_mcf",
    "phase_services",
    "phase_start",
    "phase_post",
    "nftables",
    "lancement",
    "phase_backup",
    "logs",
];

/// Named shortcut that expands to a fixed list of execution tags.
///
/// `CustomTags` marks an ad-hoc tag selection; it is never emitted to the
/// command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "phase_precheck")]
    Precheck,
    #[serde(rename = "phase_install")]
    Install,
    #[serde(rename = "phase_configuration")]
    Configuration,
    #[serde(rename = "phase_frontend")]
    Frontend,
    #[serde(rename = "phase_services")]
    Services,
    #[serde(rename = "phase_start")]
    Start,
    #[serde(rename = "phase_deployment")]
    Deployment,
    #[serde(rename = "full_pipeline")]
    FullPipeline,
    #[serde(rename = "phase_backup")]
    Backup,
    #[serde(rename = "custom_tags", alias = "custom")]
    CustomTags,
}

impl Phase {
    /// Every phase, in the order the selector presents them.
    pub const ALL: [Phase; 10] = [
        Phase::Precheck,
        Phase::Install,
        Phase::Configuration,
        Phase::Frontend,
        Phase::Services,
        Phase::Start,
        Phase::Deployment,
        Phase::FullPipeline,
        Phase::Backup,
        Phase::CustomTags,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Phase::Precheck => "phase_precheck",
            Phase::Install => "phase_install",
            Phase::Configuration => "phase_configuration",
            Phase::Frontend => "phase_frontend",
            Phase::Services => "phase_services",
            Phase::Start => "phase_start",
            Phase::Deployment => "phase_deployment",
            Phase::FullPipeline => "full_pipeline",
            Phase::Backup => "phase_backup",
            Phase::CustomTags => "custom_tags",
        }
    }

    /// Aggregate phases expand to a union of several finer-grained phases.
    pub fn is_aggregate(self) -> bool {
        matches!(self, Phase::FullPipeline | Phase::Deployment)
    }

    pub fn is_custom(self) -> bool {
        self == Phase::CustomTags
    }

    /// Tag list selected by this phase.
    pub fn tags(self) -> Vec<String> {
        match self {
            Phase::FullPipeline => to_owned(&FULL_PIPELINE_TAGS),
            Phase::Deployment => to_owned(&DEPLOYMENT_TAGS),
            Phase::CustomTags => Vec::new(),
            other => vec![other.id().to_string()],
        }
    }
}

fn to_owned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "custom" {
            return Ok(Phase::CustomTags);
        }
        Phase::ALL
            .into_iter()
            .find(|phase| phase.id() == s)
            .ok_or_else(|| format!("unknown phase '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pipeline_expands_to_fifteen_tags() {
        let tags = Phase::FullPipeline.tags();
        assert_eq!(tags.len(), 15);
        assert_eq!(tags.first().map(String::as_str), Some("copie"));
        assert_eq!(tags.last().map(String::as_str), Some("logs"));
    }

    #[test]
    fn deployment_is_full_pipeline_without_copie_and_bootstrap() {
        let expected: Vec<String> = FULL_PIPELINE_TAGS
            .iter()
            .filter(|tag| !matches!(**tag, "copie" | "bootstrap"))
            .map(|tag| tag.to_string())
            .collect();
        assert_eq!(Phase::Deployment.tags(), expected);
        assert_eq!(expected.len(), 13);
    }

    #[test]
    fn simple_phase_expands_to_its_own_id() {
        assert_eq!(Phase::Backup.tags(), vec!["phase_backup".to_string()]);
        assert!(Phase::CustomTags.tags().is_empty());
    }

    #[test]
    fn parse_accepts_ids_and_legacy_custom_marker() {
        assert_eq!("full_pipeline".parse::<Phase>(), Ok(Phase::FullPipeline));
        assert_eq!("custom".parse::<Phase>(), Ok(Phase::CustomTags));
        assert!("phase_unknown".parse::<Phase>().is_err());
    }

    #[test]
    fn serde_uses_phase_ids() {
        let json = serde_json::to_string(&Phase::Deployment).expect("serialize");
        assert_eq!(json, "\"phase_deployment\"");
        let parsed: Phase = serde_json::from_str("\"custom\"").expect("deserialize");
        assert_eq!(parsed, Phase::CustomTags);
    }
}
