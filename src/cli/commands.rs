use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strsim::levenshtein;

use std::path::{Path, PathBuf};

use crate::conditions::{ConditionTerm, SettingsSnapshot, Value};
use crate::config::{self, Config};
use crate::registry::ControlConditionsRegistry;

use super::exit_codes;
use super::output::{
    self, CheckData, ConditionTrace, ControlData, DependentsData, ExplainData, OutputMode,
    StatsData, TermData,
};

/// maximum edit distance for "did you mean" suggestions
const SUGGESTION_DISTANCE: usize = 3;

#[derive(Parser)]
#[command(name = "ctlcond")]
#[command(about = "Evaluate editor control visibility rules against a settings snapshot")]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides CTLCOND_CONFIG env var and default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether controls are visible for a settings snapshot
    Check {
        /// Rule file (JSON5)
        #[arg(short, long)]
        rules: PathBuf,

        /// Settings snapshot file (JSON5 object); empty settings if omitted
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Controls to check (all controls in the rule file if omitted)
        controls: Vec<String>,

        /// Exit with a non-zero code when any checked control is hidden
        #[arg(long)]
        fail_hidden: bool,
    },

    /// Show how each condition of a control evaluates, term by term
    Explain {
        /// Rule file (JSON5)
        #[arg(short, long)]
        rules: PathBuf,

        /// Settings snapshot file (JSON5 object); empty settings if omitted
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Control to explain
        control: String,
    },

    /// Show which settings each control depends on
    Deps {
        /// Rule file (JSON5)
        #[arg(short, long)]
        rules: PathBuf,

        /// Only list the controls that depend on this setting
        #[arg(long)]
        setting: Option<String>,
    },

    /// Show rule statistics
    Stats {
        /// Rule file (JSON5)
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "engine.nested_relation")
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset configuration to defaults
    Reset,
    /// Verify configuration file
    Verify,
    /// Print the rule file JSON schema, or write it to a file
    Schema {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match cli.command {
        Commands::Check {
            rules,
            settings,
            controls,
            fail_hidden,
        } => {
            let mut registry = build_registry(config_path, &rules, output_mode)?;
            registry.set_settings(read_settings(settings.as_deref(), output_mode));

            let names: Vec<String> = if controls.is_empty() {
                registry.controls().map(str::to_string).collect()
            } else {
                for control in &controls {
                    ensure_control(&registry, control, output_mode);
                }
                controls
            };

            let data = CheckData {
                controls: names
                    .into_iter()
                    .map(|control| {
                        let state = registry.get_control_state(&control, None);
                        let (reason, trigger) = match state.data {
                            Some(data) => (Some(data.reason), data.trigger),
                            None => (None, None),
                        };
                        ControlData {
                            control,
                            visible: state.visible,
                            enabled: state.enabled,
                            reason,
                            trigger,
                        }
                    })
                    .collect(),
            };

            match output_mode {
                OutputMode::Json => output::print_json(&data),
                OutputMode::Text => {
                    for control in &data.controls {
                        println!(
                            "{}: {} ({})",
                            control.control,
                            if control.visible { "visible" } else { "hidden" },
                            control.reason.as_deref().unwrap_or("-")
                        );
                    }
                }
                OutputMode::Quiet => {}
            }

            let hidden: Vec<&str> = data
                .controls
                .iter()
                .filter(|c| !c.visible)
                .map(|c| c.control.as_str())
                .collect();

            if fail_hidden && !hidden.is_empty() {
                tracing::debug!(?hidden, "hidden controls with --fail-hidden");
                std::process::exit(exit_codes::CONTROL_HIDDEN);
            }

            Ok(())
        }

        Commands::Explain {
            rules,
            settings,
            control,
        } => {
            let registry = build_registry(config_path, &rules, output_mode)?;
            let settings = read_settings(settings.as_deref(), output_mode);
            ensure_control(&registry, &control, output_mode);

            let data = explain(&registry, &control, &settings);

            match output_mode {
                OutputMode::Json => output::print_json(&data),
                OutputMode::Text => print_explain(&data),
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Deps { rules, setting } => {
            let registry = build_registry(config_path, &rules, output_mode)?;
            let tree = registry.get_dependency_tree();

            match setting {
                Some(setting) => {
                    let data = DependentsData {
                        controls: tree
                            .dependents_of(&setting)
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                        setting,
                    };
                    match output_mode {
                        OutputMode::Json => output::print_json(&data),
                        OutputMode::Text => {
                            for control in &data.controls {
                                println!("{}", control);
                            }
                        }
                        OutputMode::Quiet => {}
                    }
                }
                None => match output_mode {
                    OutputMode::Json => output::print_json(&tree),
                    OutputMode::Text => {
                        for (control, settings) in tree.iter() {
                            println!("{}: {}", control, settings.join(", "));
                        }
                    }
                    OutputMode::Quiet => {}
                },
            }
            Ok(())
        }

        Commands::Stats { rules } => {
            let registry = build_registry(config_path, &rules, output_mode)?;
            let data = StatsData {
                stats: registry.get_stats(),
            };

            match output_mode {
                OutputMode::Json => output::print_json(&data),
                OutputMode::Text => {
                    println!("controls:   {}", data.stats.controls);
                    println!("conditions: {}", data.stats.conditions);
                    println!(
                        "average:    {:.2} conditions per control",
                        data.stats.avg_conditions_per_control
                    );
                }
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = config::load_with_override(config_path)?;
                let json =
                    serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("{}", json);
                Ok(())
            }
            ConfigCommands::Path => {
                let path = config::get_config_path_with_override(config_path)?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                let mut config = config::load_with_override(config_path)?;
                if let Err(e) = config::set_value(&mut config, &key, &value) {
                    fail(output_mode, exit_codes::INVALID_ARGS, &e.to_string(), Vec::new());
                }
                config::save_with_override(&config, config_path)?;
                if !output_mode.is_quiet() {
                    println!("Set {} = {}", key, value);
                }
                Ok(())
            }
            ConfigCommands::Reset => {
                let config = Config::default();
                config::save_with_override(&config, config_path)?;
                if !output_mode.is_quiet() {
                    println!("Configuration reset to defaults");
                }
                Ok(())
            }
            ConfigCommands::Verify => {
                let path = config::get_config_path_with_override(config_path)?;
                let errors = match config::verify(&path) {
                    Ok(errors) => errors,
                    Err(e) => fail(output_mode, exit_codes::CONFIG_ERROR, &e.to_string(), Vec::new()),
                };

                if errors.is_empty() {
                    if !output_mode.is_quiet() {
                        println!("✓ Configuration is valid: {}", path.display());
                    }
                    Ok(())
                } else {
                    println!(
                        "✗ Configuration has {} error(s): {}",
                        errors.len(),
                        path.display()
                    );
                    println!();
                    for error in &errors {
                        println!("  - {}", error);
                    }
                    std::process::exit(exit_codes::CONFIG_ERROR);
                }
            }
            ConfigCommands::Schema { output } => match output {
                Some(path) => {
                    config::write_schema_file(&path)?;
                    if !output_mode.is_quiet() {
                        println!("Wrote schema to {}", path.display());
                    }
                    Ok(())
                }
                None => {
                    println!("{}", config::RULES_SCHEMA);
                    Ok(())
                }
            },
        },
    }
}

/// load config and rules into a fresh registry
fn build_registry(
    config_path: Option<&Path>,
    rules: &Path,
    output_mode: OutputMode,
) -> Result<ControlConditionsRegistry> {
    let config = match config::load_with_override(config_path) {
        Ok(config) => config,
        Err(e) => fail(output_mode, exit_codes::CONFIG_ERROR, &format!("{:#}", e), Vec::new()),
    };

    let conditions = match config::load_rules(rules) {
        Ok(conditions) => conditions,
        Err(e) => fail(
            output_mode,
            exit_codes::RULES_ERROR,
            &format!("{}: {}", rules.display(), e),
            Vec::new(),
        ),
    };

    let mut registry = ControlConditionsRegistry::with_settings(&config.engine);
    registry.register_conditions(conditions);
    Ok(registry)
}

fn read_settings(path: Option<&Path>, output_mode: OutputMode) -> SettingsSnapshot {
    let Some(path) = path else {
        return SettingsSnapshot::new();
    };

    match config::load_settings(path) {
        Ok(settings) => settings,
        Err(e) => fail(
            output_mode,
            exit_codes::RULES_ERROR,
            &format!("{}: {}", path.display(), e),
            Vec::new(),
        ),
    }
}

/// exit with CONTROL_NOT_FOUND when the control has no rules
fn ensure_control(registry: &ControlConditionsRegistry, control: &str, output_mode: OutputMode) {
    if registry.has_control(control) {
        return;
    }

    let suggestions = suggest_controls(control, registry.controls());
    fail(
        output_mode,
        exit_codes::CONTROL_NOT_FOUND,
        &format!("control '{}' has no rules", control),
        suggestions,
    );
}

/// closest control names by edit distance
fn suggest_controls<'a>(query: &str, controls: impl Iterator<Item = &'a str>) -> Vec<String> {
    let query_lower = query.to_lowercase();

    let mut matches: Vec<(&str, usize)> = controls
        .map(|c| (c, levenshtein(&query_lower, &c.to_lowercase())))
        .filter(|(_, distance)| *distance <= SUGGESTION_DISTANCE)
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    matches.into_iter().map(|(c, _)| c.to_string()).collect()
}

/// evaluate a control's conditions in order, recording every evaluated term
fn explain(
    registry: &ControlConditionsRegistry,
    control: &str,
    settings: &SettingsSnapshot,
) -> ExplainData {
    let mut traces = Vec::new();

    for (index, condition) in registry.conditions_for(control).iter().enumerate() {
        let mut terms = Vec::new();
        let matched = registry.evaluator().check_with(
            &condition.conditions,
            settings,
            &mut |term: &ConditionTerm, current: Option<&Value>, result: bool| {
                terms.push(TermData {
                    term: term.to_string(),
                    current: current.cloned(),
                    result,
                })
            },
        );

        traces.push(ConditionTrace {
            index,
            action: condition.action.as_str(),
            conditions: condition.conditions.to_string(),
            matched,
            terms,
        });

        if matched {
            break;
        }
    }

    let result = registry.check_visibility(control, Some(settings));
    ExplainData {
        control: control.to_string(),
        visible: result.visible,
        reason: result.reason,
        conditions: traces,
    }
}

fn print_explain(data: &ExplainData) {
    for trace in &data.conditions {
        println!(
            "#{} {} when {} -> {}",
            trace.index,
            trace.action,
            trace.conditions,
            if trace.matched { "matched" } else { "no match" }
        );
        for term in &trace.terms {
            let current = term
                .current
                .as_ref()
                .map_or_else(|| "undefined".to_string(), |v| v.to_string());
            println!("    {} (current: {}) -> {}", term.term, current, term.result);
        }
    }
    println!(
        "{}: {} ({})",
        data.control,
        if data.visible { "visible" } else { "hidden" },
        data.reason.as_deref().unwrap_or("-")
    );
}

/// report an error in the active output mode and exit
fn fail(output_mode: OutputMode, code: i32, message: &str, suggestions: Vec<String>) -> ! {
    if output_mode.is_json() {
        output::print_json_error(code, message, suggestions);
    } else {
        eprintln!("Error: {}", message);
        if !suggestions.is_empty() {
            eprintln!("Did you mean: {}?", suggestions.join(", "));
        }
    }
    std::process::exit(code);
}
