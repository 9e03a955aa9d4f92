//! Pure configuration transitions.
//!
//! Each transition takes the current configuration by reference and returns
//! the next one. Callers replace their value wholesale; nothing is mutated in
//! place and no validation happens here (the input boundary coerces values).

use crate::core::phase::Phase;
use crate::core::types::{
    DeploymentConfiguration, LIMIT_ALL, PartialConfiguration, dedup_preserving_order,
};

/// Shallow merge: every field present in `patch` overwrites the current one.
pub fn update(
    config: &DeploymentConfiguration,
    patch: &PartialConfiguration,
) -> DeploymentConfiguration {
    let mut next = config.clone();
    if let Some(environment) = patch.environment {
        next.environment = environment;
    }
    if let Some(limit) = &patch.limit {
        next.limit = limit.clone();
    }
    if let Some(tags) = &patch.tags {
        next.tags = dedup_preserving_order(tags);
    }
    if let Some(phase) = patch.phase {
        next.phase = phase;
    }
    if let Some(forks) = patch.forks {
        next.forks = forks;
    }
    if let Some(timeout) = patch.timeout {
        next.timeout = timeout;
    }
    if let Some(remote_user) = &patch.remote_user {
        next.remote_user = remote_user.clone();
    }
    if let Some(task) = &patch.start_at_task {
        next.start_at_task = task.clone();
    }
    if let Some(password) = &patch.vault_password {
        next.vault_password = password.clone();
    }
    if let Some(extra_vars) = &patch.extra_vars_raw {
        next.extra_vars_raw = extra_vars.clone();
    }
    merge_flag(&mut next.verbose, patch.verbose);
    merge_flag(&mut next.check_mode, patch.check_mode);
    merge_flag(&mut next.diff, patch.diff);
    merge_flag(&mut next.step, patch.step);
    merge_flag(&mut next.syntax_check, patch.syntax_check);
    merge_flag(&mut next.list_tasks, patch.list_tasks);
    merge_flag(&mut next.list_tags, patch.list_tags);
    merge_flag(&mut next.escalate, patch.escalate);
    merge_flag(&mut next.use_mogend_home, patch.use_mogend_home);
    if let Some(skip_tags) = &patch.skip_tags {
        next.skip_tags = dedup_preserving_order(skip_tags);
    }
    next
}

fn merge_flag(slot: &mut bool, value: Option<bool>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Select a phase: tags are replaced wholesale by the phase's tag list.
pub fn apply_phase(config: &DeploymentConfiguration, phase: Phase) -> DeploymentConfiguration {
    DeploymentConfiguration {
        phase,
        tags: phase.tags(),
        ..config.clone()
    }
}

/// Add or remove one tag.
///
/// Under an aggregate phase or an already-custom selection the phase marker is
/// kept; otherwise it switches to [`Phase::CustomTags`].
pub fn toggle_tag(config: &DeploymentConfiguration, tag: &str) -> DeploymentConfiguration {
    let phase = if config.phase.is_aggregate() || config.phase.is_custom() {
        config.phase
    } else {
        Phase::CustomTags
    };
    DeploymentConfiguration {
        tags: toggle_member(&config.tags, tag),
        phase,
        ..config.clone()
    }
}

/// Add or remove one excluded tag. The phase marker is never touched.
pub fn toggle_skip_tag(config: &DeploymentConfiguration, tag: &str) -> DeploymentConfiguration {
    DeploymentConfiguration {
        skip_tags: toggle_member(&config.skip_tags, tag),
        ..config.clone()
    }
}

/// Toggle one host group in the limit expression.
pub fn toggle_limit_group(config: &DeploymentConfiguration, group: &str) -> DeploymentConfiguration {
    DeploymentConfiguration {
        limit: toggle_limit(&config.limit, group),
        ..config.clone()
    }
}

/// Toggle `group` in a comma-separated limit expression.
///
/// `all` is exclusive: selecting it resets the limit, selecting any other
/// group drops it, and removing the last specific group restores it.
pub fn toggle_limit(limit: &str, group: &str) -> String {
    if group == LIMIT_ALL {
        return LIMIT_ALL.to_string();
    }
    let mut groups: Vec<&str> = Vec::new();
    for token in limit.split(',').map(str::trim) {
        if !token.is_empty() && token != LIMIT_ALL && !groups.contains(&token) {
            groups.push(token);
        }
    }
    if let Some(pos) = groups.iter().position(|token| *token == group) {
        groups.remove(pos);
    } else {
        groups.push(group);
    }
    if groups.is_empty() {
        return LIMIT_ALL.to_string();
    }
    groups.join(",")
}

fn toggle_member(items: &[String], item: &str) -> Vec<String> {
    if items.iter().any(|existing| existing == item) {
        items
            .iter()
            .filter(|existing| *existing != item)
            .cloned()
            .collect()
    } else {
        let mut next = items.to_vec();
        next.push(item.to_string());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Environment;

    #[test]
    fn update_overwrites_only_present_fields() {
        let config = DeploymentConfiguration::default();
        let patch = PartialConfiguration {
            environment: Some(Environment::Prod),
            check_mode: Some(true),
            forks: Some(5),
            ..PartialConfiguration::default()
        };
        let next = update(&config, &patch);
        assert_eq!(next.environment, Environment::Prod);
        assert!(next.check_mode);
        assert_eq!(next.forks, 5);
        assert_eq!(next.tags, config.tags);
        assert_eq!(next.limit, config.limit);
        assert!(next.use_mogend_home);
    }

    #[test]
    fn update_does_not_validate_values() {
        let config = DeploymentConfiguration::default();
        let patch = PartialConfiguration {
            forks: Some(-4),
            limit: Some(String::new()),
            ..PartialConfiguration::default()
        };
        let next = update(&config, &patch);
        assert_eq!(next.forks, -4);
        assert_eq!(next.limit, "");
    }

    #[test]
    fn update_dedups_tag_lists() {
        let config = DeploymentConfiguration::default();
        let patch = PartialConfiguration {
            tags: Some(vec!["solr".into(), "mcf".into(), "solr".into()]),
            skip_tags: Some(vec!["logs".into(), "logs".into()]),
            ..PartialConfiguration::default()
        };
        let next = update(&config, &patch);
        assert_eq!(next.tags, vec!["solr", "mcf"]);
        assert_eq!(next.skip_tags, vec!["logs"]);
    }

    #[test]
    fn empty_patch_is_identity() {
        let config = DeploymentConfiguration::default();
        assert_eq!(update(&config, &PartialConfiguration::default()), config);
    }

    #[test]
    fn apply_phase_replaces_tags_wholesale() {
        let config = toggle_tag(&DeploymentConfiguration::default(), "solr");
        let next = apply_phase(&config, Phase::FullPipeline);
        assert_eq!(next.phase, Phase::FullPipeline);
        assert_eq!(next.tags.len(), 15);
        assert!(!next.tags.contains(&"solr".to_string()));

        let next = apply_phase(&next, Phase::Deployment);
        assert_eq!(next.tags.len(), 13);
        assert!(!next.tags.contains(&"copie".to_string()));
        assert!(!next.tags.contains(&"bootstrap".to_string()));

        let next = apply_phase(&next, Phase::CustomTags);
        assert!(next.tags.is_empty());
        assert_eq!(next.phase, Phase::CustomTags);
    }

    #[test]
    fn apply_simple_phase_selects_singleton() {
        let next = apply_phase(&DeploymentConfiguration::default(), Phase::Frontend);
        assert_eq!(next.tags, vec!["phase_frontend"]);
    }

    #[test]
    fn toggle_tag_from_custom_keeps_custom_marker() {
        let config = apply_phase(&DeploymentConfiguration::default(), Phase::CustomTags);
        let on = toggle_tag(&config, "solr");
        assert_eq!(on.tags, vec!["solr"]);
        assert_eq!(on.phase, Phase::CustomTags);
        let off = toggle_tag(&on, "solr");
        assert!(off.tags.is_empty());
        assert_eq!(off.phase, Phase::CustomTags);
    }

    #[test]
    fn toggle_tag_under_simple_phase_switches_to_custom() {
        let config = DeploymentConfiguration::default();
        let next = toggle_tag(&config, "ssh");
        assert_eq!(next.tags, vec!["phase_precheck", "ssh"]);
        assert_eq!(next.phase, Phase::CustomTags);
    }

    #[test]
    fn toggle_tag_under_aggregate_phase_keeps_marker() {
        let config = apply_phase(&DeploymentConfiguration::default(), Phase::Deployment);
        let next = toggle_tag(&config, "logs");
        assert_eq!(next.phase, Phase::Deployment);
        assert_eq!(next.tags.len(), 12);
        assert!(!next.tags.contains(&"logs".to_string()));
    }

    #[test]
    fn toggle_skip_tag_never_touches_phase() {
        let config = DeploymentConfiguration::default();
        let next = toggle_skip_tag(&config, "nftables");
        assert_eq!(next.skip_tags, vec!["nftables"]);
        assert_eq!(next.phase, Phase::Precheck);
        assert!(toggle_skip_tag(&next, "nftables").skip_tags.is_empty());
    }

    #[test]
    fn toggle_limit_on_then_off_restores_all() {
        let on = toggle_limit("all", "solr");
        assert_eq!(on, "solr");
        assert_eq!(toggle_limit(&on, "solr"), "all");
    }

    #[test]
    fn toggle_limit_accumulates_and_removes_groups() {
        let limit = toggle_limit("all", "mcf1");
        let limit = toggle_limit(&limit, "mcf2");
        assert_eq!(limit, "mcf1,mcf2");
        assert_eq!(toggle_limit(&limit, "mcf1"), "mcf2");
    }

    #[test]
    fn toggle_limit_all_resets_selection() {
        assert_eq!(toggle_limit("main,solr", "all"), "all");
    }

    #[test]
    fn toggle_limit_cleans_empty_and_all_tokens() {
        assert_eq!(toggle_limit("all,,main,", "solr"), "main,solr");
        assert_eq!(toggle_limit("", "main"), "main");
        assert_eq!(toggle_limit(",", "main"), "main");
    }

    #[test]
    fn toggle_limit_treats_repeated_groups_as_one() {
        assert_eq!(toggle_limit("main,main", "main"), "all");
        assert_eq!(toggle_limit("main,solr,main", "mcf1"), "main,solr,mcf1");
        assert_eq!(toggle_limit(" solr , solr", "main"), "solr,main");
    }

    #[test]
    fn toggle_limit_group_updates_configuration() {
        let config = DeploymentConfiguration::default();
        let next = toggle_limit_group(&config, "main");
        assert_eq!(next.limit, "main");
        assert_eq!(toggle_limit_group(&next, "main").limit, "all");
    }
}
