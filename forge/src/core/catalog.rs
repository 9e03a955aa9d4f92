//! Static catalog: phase presentation, limit groups and specific tags.

use serde::Serialize;

use crate::core::phase::Phase;
use crate::core::types::Environment;

/// Presentation data for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// Presentation data for a phase. Total over [`Phase`].
pub fn phase_info(phase: Phase) -> PhaseInfo {
    let (label, icon, description) = match phase {
        Phase::Precheck => (
            "Precheck",
            "📋",
            "Vérification OS (Debian), variables obligatoires, cohérence système et réapplication du durcissement SSH.",
        ),
        Phase::Install => (
            "Installation",
            "📥",
            "Désinstallation propre et installation de Datafari (Tomcat, Solr, ManifoldCF, Tika).",
        ),
        Phase::Configuration => (
            "Config Globale",
            "⚙️",
            "Déploiement des certificats TLS réels, mise à jour des keystores Java et cohérence PKI.",
        ),
        Phase::Frontend => (
            "Frontend",
            "🖥️",
            "Configuration datafari.properties, build de l'UI MORICE et personnalisation de la sidebar métier.",
        ),
        Phase::Services => (
            "Services (SSO)",
            "🌐",
            "Configuration Apache pour le SSO, règles CORS et test de vivacité applicative.",
        ),
        Phase::Start => (
            "Start / Monit",
            "🚀",
            "Déploiement des scripts de monitoring et démarrage des services consolidés.",
        ),
        Phase::Deployment => (
            "Déploiement",
            "📦",
            "Pipeline de déploiement standard incluant Precheck, Install, Config, Frontend et Start.",
        ),
        Phase::FullPipeline => (
            "Pipeline Complète",
            "⚡",
            "Séquence totale : Bootstrap système, Prechecks, Installation, Services, Backup et Logs.",
        ),
        Phase::Backup => (
            "Backup",
            "💾",
            "Sauvegarde critique de Solr, ManifoldCF et des configurations pour le PRA/PCA.",
        ),
        Phase::CustomTags => (
            "Tags personnalisés",
            "🏷️",
            "Sélection manuelle de tags spécifiques, sans phase prédéfinie.",
        ),
    };
    PhaseInfo {
        phase,
        label,
        icon,
        description,
    }
}

/// A host group usable in the limit expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub id: &'static str,
    pub label: &'static str,
}

pub const LIMIT_GROUPS: [GroupInfo; 5] = [
    GroupInfo {
        id: "all",
        label: "Tous (all)",
    },
    GroupInfo {
        id: "main",
        label: "Main",
    },
    GroupInfo {
        id: "solr",
        label: "Solr Nodes",
    },
    GroupInfo {
        id: "mcf1",
        label: "MCF1",
    },
    GroupInfo {
        id: "mcf2",
        label: "MCF2",
    },
];

/// A fine-grained playbook tag that can be toggled on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub id: &'static str,
    pub description: &'static str,
}

const fn tag(id: &'static str, description: &'static str) -> TagInfo {
    TagInfo { id, description }
}

pub const SPECIFIC_TAGS: [TagInfo; 22] = [
    tag("uninstall", "Désinstallation propre de la version Datafari en place."),
    tag("ssh", "Réapplication du durcissement de la configuration SSH."),
    tag("finger", "Relevé des empreintes des hôtes cibles."),
    tag("java_env", "Configuration de l'environnement Java (JAVA_HOME, options JVM)."),
    tag("replace_certs", "Remplacement des certificats TLS et mise à jour des keystores."),
    tag("verif_certilibre", "Vérification de la chaîne de certification et de la PKI."),
    tag("datafari_properties", "Génération du fichier datafari.properties."),
    tag("application_properties", "Génération des application.properties des services."),
    tag("build_front", "Build de l'interface MORICE."),
    tag("sidebar", "Personnalisation de la sidebar métier."),
    tag("tika", "Installation et configuration du serveur Tika."),
    tag("apache_sso_cors", "Configuration Apache pour le SSO et les règles CORS."),
    tag("monitor_script", "Déploiement des scripts de monitoring."),
    tag("nftables", "Application des règles de pare-feu nftables."),
    tag("fetch_log", "Rapatriement des journaux d'exécution."),
    tag("lancement", "Démarrage des services consolidés."),
    tag("widget", "Déploiement des widgets de l'interface."),
    tag("solr", "Configuration des nœuds Solr."),
    tag("mcf", "Configuration des connecteurs ManifoldCF."),
    tag("verif", "Contrôles de cohérence avant exécution."),
    tag("copie", "Copie de l'archive d'installation sur les hôtes cibles."),
    tag("logs", "Collecte et rotation des journaux applicatifs."),
];

/// Description used for tags missing from [`SPECIFIC_TAGS`].
pub const UNKNOWN_TAG_DESCRIPTION: &str =
    "Tag système ou personnalisé sans description enregistrée.";

/// Description of a tag: catalog entry, phase description, or the fallback.
pub fn tag_description(id: &str) -> &'static str {
    if let Some(info) = SPECIFIC_TAGS.iter().find(|info| info.id == id) {
        return info.description;
    }
    match id.parse::<Phase>() {
        Ok(phase) if !phase.is_custom() => phase_info(phase).description,
        _ => UNKNOWN_TAG_DESCRIPTION,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub environment: Environment,
    pub label: &'static str,
}

/// Everything a front end needs to build the selection form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub environments: Vec<EnvironmentInfo>,
    pub phases: Vec<PhaseInfo>,
    pub groups: Vec<GroupInfo>,
    pub tags: Vec<TagInfo>,
}

pub fn catalog() -> Catalog {
    Catalog {
        environments: Environment::ALL
            .into_iter()
            .map(|environment| EnvironmentInfo {
                environment,
                label: environment.label(),
            })
            .collect(),
        phases: Phase::ALL.into_iter().map(phase_info).collect(),
        groups: LIMIT_GROUPS.to_vec(),
        tags: SPECIFIC_TAGS.to_vec(),
    }
}
