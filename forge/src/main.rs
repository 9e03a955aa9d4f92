//! Command-line front end for the MOGEND deployment command composer.
//!
//! Every subcommand builds a configuration from flags (in the same order the
//! form applies them), then prints the composed command, an explanation, or
//! the catalog. `interpret` additionally asks the configured agent to turn a
//! free-text request into changes.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use forge::agents::interpreter::AgentInterpreter;
use forge::core::catalog::{Catalog, catalog};
use forge::core::explain::{Explanation, PRODUCTION_ALERT};
use forge::core::input::coerce_count;
use forge::core::phase::Phase;
use forge::core::types::{Environment, PartialConfiguration};
use forge::exit_codes;
use forge::io::init::{ForgePaths, InitOptions, init_forge};
use forge::io::settings::load_settings;
use forge::session::{Session, assist};

#[derive(Parser, Debug)]
#[command(
    name = "forge",
    version,
    about = "Compose MOGEND/Datafari ansible-playbook deployment commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the shell command for the selected options.
    Compose {
        #[command(flatten)]
        config: ConfigArgs,
        /// Print `{config, command, hazards}` as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Describe what the selected options will do.
    Explain {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long)]
        json: bool,
    },
    /// Apply a free-text request on top of the selected options.
    Interpret {
        /// Request in plain language, e.g. "déploiement complet sur mcf1 en diff".
        text: String,
        #[command(flatten)]
        config: ConfigArgs,
        /// Settings file (default: `.forge/config.toml`).
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List environments, phases, limit groups and specific tags.
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Write default settings to `.forge/config.toml`.
    Init {
        /// Overwrite an existing settings file.
        #[arg(short, long)]
        force: bool,
    },
}

/// One flag per configuration field.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Target environment: qual, preprod or prod.
    #[arg(long = "env", value_name = "ENV")]
    environment: Option<Environment>,
    /// Raw limit expression, replaces the current one.
    #[arg(long)]
    limit: Option<String>,
    /// Toggle a host group in the limit (repeatable).
    #[arg(long = "group", value_name = "GROUP")]
    groups: Vec<String>,
    /// Select a phase; its tags replace the current selection.
    #[arg(long)]
    phase: Option<Phase>,
    /// Toggle a tag (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
    /// Toggle an excluded tag (repeatable).
    #[arg(long = "skip-tag", value_name = "TAG")]
    skip_tags: Vec<String>,
    #[arg(long, value_parser = parse_count, allow_hyphen_values = true)]
    forks: Option<i64>,
    /// SSH connection timeout in seconds.
    #[arg(long, value_parser = parse_count, allow_hyphen_values = true)]
    timeout: Option<i64>,
    #[arg(long)]
    remote_user: Option<String>,
    #[arg(long)]
    start_at_task: Option<String>,
    /// Written to `.vault_pass` for the run, then removed.
    #[arg(long)]
    vault_password: Option<String>,
    /// Raw `-e` payload.
    #[arg(long = "extra-vars")]
    extra_vars: Option<String>,
    #[arg(long = "become")]
    escalate: bool,
    /// Pass `-vvv`.
    #[arg(long)]
    verbose: bool,
    #[arg(long = "check")]
    check_mode: bool,
    #[arg(long)]
    diff: bool,
    #[arg(long)]
    step: bool,
    #[arg(long)]
    syntax_check: bool,
    #[arg(long)]
    list_tasks: bool,
    #[arg(long)]
    list_tags: bool,
    /// Do not prefix the command with `cd "$MOGEND_HOME"`.
    #[arg(long)]
    no_mogend_home: bool,
}

fn parse_count(raw: &str) -> Result<i64, String> {
    Ok(coerce_count(raw))
}

impl ConfigArgs {
    /// Environment, limit groups, phase, tag toggles, then advanced fields.
    fn build_session(&self) -> Session {
        let mut session = Session::new();

        if let Some(environment) = self.environment {
            session.update(&PartialConfiguration {
                environment: Some(environment),
                ..PartialConfiguration::default()
            });
        }

        if let Some(limit) = &self.limit {
            session.update(&PartialConfiguration {
                limit: Some(limit.clone()),
                ..PartialConfiguration::default()
            });
        }
        for group in &self.groups {
            session.toggle_limit_group(group);
        }

        if let Some(phase) = self.phase {
            session.apply_phase(phase);
        }
        for tag in &self.tags {
            session.toggle_tag(tag);
        }
        for tag in &self.skip_tags {
            session.toggle_skip_tag(tag);
        }

        session.update(&self.advanced());
        session
    }

    fn advanced(&self) -> PartialConfiguration {
        PartialConfiguration {
            forks: self.forks,
            timeout: self.timeout,
            remote_user: self.remote_user.clone(),
            start_at_task: self.start_at_task.clone(),
            vault_password: self.vault_password.clone(),
            extra_vars_raw: self.extra_vars.clone(),
            escalate: self.escalate.then_some(true),
            verbose: self.verbose.then_some(true),
            check_mode: self.check_mode.then_some(true),
            diff: self.diff.then_some(true),
            step: self.step.then_some(true),
            syntax_check: self.syntax_check.then_some(true),
            list_tasks: self.list_tasks.then_some(true),
            list_tags: self.list_tags.then_some(true),
            use_mogend_home: self.no_mogend_home.then_some(false),
            ..PartialConfiguration::default()
        }
    }
}

fn main() {
    forge::logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            // Printing help or a usage error; nothing useful to do if stderr is gone.
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Compose { config, json } => cmd_compose(&config.build_session(), json),
        Command::Explain { config, json } => cmd_explain(&config.build_session(), json),
        Command::Interpret {
            text,
            config,
            settings,
            json,
        } => cmd_interpret(config.build_session(), &text, settings, json),
        Command::Catalog { json } => cmd_catalog(json),
        Command::Init { force } => cmd_init(force),
    }
}

fn cmd_compose(session: &Session, json: bool) -> Result<i32> {
    print_command(session, json)?;
    Ok(exit_codes::OK)
}

fn print_command(session: &Session, json: bool) -> Result<()> {
    let hazards = session.hazards();
    if json {
        let payload = json!({
            "config": session.config(),
            "command": session.command(),
            "hazards": hazards,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize command")?
        );
        return Ok(());
    }
    for hazard in &hazards {
        eprintln!("warning: {}", hazard.message());
    }
    println!("{}", session.command());
    Ok(())
}

fn cmd_explain(session: &Session, json: bool) -> Result<i32> {
    let explanation = session.explain();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&explanation).context("serialize explanation")?
        );
    } else {
        print!("{}", render_explanation(&explanation));
    }
    Ok(exit_codes::OK)
}

fn render_explanation(explanation: &Explanation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Environnement : {} ({})\n",
        explanation.environment_label,
        explanation.environment.as_str()
    ));
    out.push_str(&format!("Cible : {}\n", explanation.limit));
    out.push_str(&format!("Opération : {}\n", explanation.operation));
    if explanation.production_alert {
        out.push_str(&format!("\n{PRODUCTION_ALERT}\n"));
    }

    out.push_str(&format!("\nTags actifs ({}) :\n", explanation.tags.len()));
    for tag in &explanation.tags {
        out.push_str(&format!("  - {} : {}\n", tag.id, tag.description));
    }
    for group in &explanation.stages {
        out.push_str(&format!("\n{}\n", group.title));
        for tag in &group.tags {
            out.push_str(&format!("  - {}\n", tag.id));
        }
    }

    out.push_str("\nFiche technique :\n");
    for entry in &explanation.sheet {
        out.push_str(&format!("  {} : {}\n", entry.label, entry.value));
    }
    out.push_str(&format!("\nOptions : {}\n", explanation.badges.join(" | ")));
    out
}

fn cmd_interpret(
    mut session: Session,
    text: &str,
    settings_path: Option<PathBuf>,
    json: bool,
) -> Result<i32> {
    let settings_path = match settings_path {
        Some(path) => path,
        None => ForgePaths::new(env::current_dir().context("resolve current directory")?)
            .settings_path,
    };
    let settings = load_settings(&settings_path)?;
    let interpreter = AgentInterpreter::from_settings(&settings.interpreter)?;

    let code = match assist(&mut session, &interpreter, text) {
        Ok(_) => exit_codes::OK,
        Err(err) => {
            eprintln!("warning: interpretation failed, options unchanged: {err:#}");
            exit_codes::ASSIST_FAILED
        }
    };
    print_command(&session, json)?;
    Ok(code)
}

fn cmd_catalog(json: bool) -> Result<i32> {
    let catalog = catalog();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&catalog).context("serialize catalog")?
        );
    } else {
        print!("{}", render_catalog(&catalog));
    }
    Ok(exit_codes::OK)
}

fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::from("Environnements :\n");
    for env in &catalog.environments {
        out.push_str(&format!("  {:<8} {}\n", env.environment.as_str(), env.label));
    }
    out.push_str("\nPhases :\n");
    for phase in &catalog.phases {
        out.push_str(&format!(
            "  {} {:<20} {} : {}\n",
            phase.icon,
            phase.phase.id(),
            phase.label,
            phase.description
        ));
    }
    out.push_str("\nGroupes (limit) :\n");
    for group in &catalog.groups {
        out.push_str(&format!("  {:<8} {}\n", group.id, group.label));
    }
    out.push_str("\nTags spécifiques :\n");
    for tag in &catalog.tags {
        out.push_str(&format!("  {:<24} {}\n", tag.id, tag.description));
    }
    out
}

fn cmd_init(force: bool) -> Result<i32> {
    let root = env::current_dir().context("resolve current directory")?;
    let paths = init_forge(&root, &InitOptions { force })?;
    println!("{}", paths.settings_path.display());
    Ok(exit_codes::OK)
}
