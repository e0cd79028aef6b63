//! CLI command definitions and handlers

mod batch;
mod evaluate;
mod list;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use labsig::config::{project_config_path, UserConfig};
use labsig::models::{ContextOverrides, PatientContext, Sex, SignificanceLevel};
use labsig::reporters::OutputFormat;
use labsig::ClinicalSignificanceEngine;
use std::path::PathBuf;
use std::str::FromStr;

/// Parse a significance level for --fail-on
fn parse_level(s: &str) -> Result<SignificanceLevel, String> {
    SignificanceLevel::from_str(s).map_err(|e| e.to_string())
}

/// labsig - how much does this lab value matter?
#[derive(Parser, Debug)]
#[command(name = "labsig")]
#[command(
    version,
    about = "Grade common lab values by clinical significance, with a short pearl and a suggested action",
    long_about = "labsig grades a lab value on a five-step scale (normal, likely insignificant, \
possibly significant, clinically significant, critical) using fixed decision tables for \
hemoglobin, creatinine, potassium, glucose and TSH. Sex, age and fasting state refine \
the result where the table depends on them.\n\n\
Defaults come from ~/.config/labsig/config.toml, ./labsig.toml and LABSIG_* variables.",
    after_help = "\
Examples:
  labsig evaluate hgb 11.8 --sex female       Single value
  labsig evaluate glucose 110 --fasting       Fasting glucose
  labsig evaluate k 6.5 --format json         JSON output for scripting
  labsig batch labs.json --fail-on critical   Exit code 1 on any critical value
  labsig batch --item k=3.3 --item tsh=5.2    Batch from the command line
  labsig rules creatinine                     Show the decision table"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "LABSIG_LOG", default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Disable ANSI colors in text output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a single lab value
    #[command(after_help = "\
Examples:
  labsig evaluate hemoglobin 11.8 --sex female
  labsig evaluate creatinine 1.2 --sex female --age 75
  labsig evaluate glucose 220 --not-fasting --format markdown
  labsig evaluate K+ 6.5 --fail-on critical")]
    Evaluate {
        /// Lab test name or alias (e.g. hgb, k, glucose, tsh)
        test: String,

        /// Measured value
        #[arg(allow_negative_numbers = true)]
        value: String,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Evaluate up to 50 lab values against one patient context
    #[command(after_help = "\
Input is a JSON array of items or a request object:
  [{\"test_name\": \"k\", \"value\": 6.5}, {\"testName\": \"tsh\", \"value\": \"5.2\"}]
  {\"lab_values\": [...], \"patient_context\": {\"sex\": \"female\", \"age\": 72}}

Examples:
  labsig batch labs.json
  cat labs.json | labsig batch - --format json
  labsig batch --item hgb=11.8 --item cr=1.2 --sex female --age 75")]
    Batch {
        /// JSON file to read, or '-' for stdin
        file: Option<PathBuf>,

        /// Extra item as TEST=VALUE (repeatable)
        #[arg(long = "item", value_name = "TEST=VALUE")]
        items: Vec<String>,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the supported lab tests
    Tests {
        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,
    },

    /// Show the ordered decision table for one lab test
    Rules {
        /// Lab test name or alias
        test: String,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version info
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize user config file with example settings
    Init,
    /// Show the effective config and where it came from
    Show,
}

/// Patient context flags; unset flags fall back to config
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Patient sex: male, female, unknown
    #[arg(long, ignore_case = true, value_parser = ["male", "female", "unknown"])]
    pub sex: Option<String>,

    /// Patient age in years
    #[arg(long)]
    pub age: Option<u32>,

    /// Sample was drawn fasting
    #[arg(long, conflicts_with = "not_fasting")]
    pub fasting: bool,

    /// Sample was not drawn fasting (overrides a fasting default)
    #[arg(long)]
    pub not_fasting: bool,
}

impl ContextArgs {
    pub fn overrides(&self) -> ContextOverrides {
        let fasting = match (self.fasting, self.not_fasting) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ContextOverrides {
            sex: self.sex.as_deref().map(Sex::from_lenient),
            age: self.age,
            fasting,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format: text, json, markdown (or md). Default from config, else text
    #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Exit with code 1 if any result is at this level or higher.
    /// Values: critical, clinically_significant, possibly_significant, likely_insignificant, normal
    #[arg(long, value_parser = parse_level)]
    pub fail_on: Option<SignificanceLevel>,
}

/// Settings shared by every command after config layering
pub(crate) struct Session {
    pub config: UserConfig,
    pub color: bool,
}

impl Session {
    fn new(config: UserConfig, no_color: bool) -> Self {
        // console already honours CLICOLOR, CLICOLOR_FORCE and non-tty stdout
        let color = !no_color && config.color_enabled() && console::colors_enabled();
        console::set_colors_enabled(color);
        Self { config, color }
    }

    /// Flag format, else config format
    pub fn format(&self, flag: Option<&str>) -> Result<OutputFormat> {
        OutputFormat::from_str(flag.unwrap_or(self.config.format()))
    }

    /// Config defaults with `overrides` applied on top
    pub fn context(&self, overrides: &ContextOverrides) -> PatientContext {
        overrides.apply(self.config.patient_context())
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let session = Session::new(UserConfig::load()?, cli.no_color);
    let engine = ClinicalSignificanceEngine::shared()?;

    match cli.command {
        Commands::Evaluate {
            test,
            value,
            context,
            output,
        } => evaluate::run(engine, &session, &test, &value, &context, &output),

        Commands::Batch {
            file,
            items,
            context,
            output,
        } => batch::run(engine, &session, file.as_deref(), &items, &context, &output),

        Commands::Tests { format } => list::tests(engine, &session, format.as_deref()),

        Commands::Rules { test, format } => {
            list::rules(engine, &session, &test, format.as_deref())
        }

        Commands::Config { action } => run_config_action(action, &session),

        Commands::Version => {
            println!("labsig {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Exit with code 1 if `worst` reaches the --fail-on threshold
pub(crate) fn check_fail_threshold(
    fail_on: Option<SignificanceLevel>,
    worst: Option<SignificanceLevel>,
) -> Result<()> {
    if let (Some(threshold), Some(worst)) = (fail_on, worst) {
        if worst >= threshold {
            eprintln!(
                "Failing due to --fail-on={} threshold (worst result: {})",
                threshold, worst
            );
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_config_action(action: ConfigAction, session: &Session) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!(
                "{} Config initialized at: {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
            println!("\nEdit it to set patient and output defaults, or use the environment:");
            println!("  export LABSIG_SEX=female LABSIG_AGE=72");
            Ok(())
        }
        ConfigAction::Show => show_config(session),
    }
}

fn show_config(session: &Session) -> Result<()> {
    let config = &session.config;

    println!("Config paths:");
    if let Some(user_path) = UserConfig::user_config_path() {
        println!(
            "  User:    {} {}",
            user_path.display(),
            found(user_path.exists())
        );
    }
    let project_path = project_config_path(std::path::Path::new("."));
    println!(
        "  Project: {} {}",
        project_path.display(),
        found(project_path.exists())
    );
    if !config.sources.is_empty() {
        let sources: Vec<String> = config
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!("  Loaded:  {}", sources.join(", "));
    }
    println!();

    let ctx = config.patient_context();
    println!("{}", style("Patient defaults").bold());
    println!("  sex:     {}", ctx.sex);
    println!("  age:     {}", ctx.age);
    println!("  fasting: {}", ctx.fasting);
    println!();
    println!("{}", style("Output").bold());
    println!("  format:  {}", config.format());
    println!("  color:   {}", session.color);
    Ok(())
}

fn found(exists: bool) -> console::StyledObject<&'static str> {
    if exists {
        style("(found)").green()
    } else {
        style("(not found)").dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("critical"), Ok(SignificanceLevel::Critical));
        assert_eq!(
            parse_level("Possibly_Significant"),
            Ok(SignificanceLevel::PossiblySignificant)
        );
        assert!(parse_level("high").is_err());
    }

    #[test]
    fn test_evaluate_accepts_negative_values() {
        let cli = Cli::try_parse_from(["labsig", "evaluate", "k", "-1"]).unwrap();
        match cli.command {
            Commands::Evaluate { value, .. } => assert_eq!(value, "-1"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_fasting_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "labsig",
            "evaluate",
            "glucose",
            "100",
            "--fasting",
            "--not-fasting",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_context_args_to_overrides() {
        let args = ContextArgs {
            sex: Some("FEMALE".into()),
            age: Some(75),
            fasting: false,
            not_fasting: true,
        };
        let overrides = args.overrides();
        assert_eq!(overrides.sex, Some(Sex::Female));
        assert_eq!(overrides.age, Some(75));
        assert_eq!(overrides.fasting, Some(false));
        assert_eq!(ContextArgs::default().overrides(), ContextOverrides::default());
    }

    #[test]
    fn test_session_layers_flags_over_config() {
        let mut config = UserConfig::default();
        config.patient.age = Some(80);
        config.patient.sex = Some(Sex::Male);
        config.output.format = Some("json".into());
        let session = Session { config, color: false };

        let ctx = session.context(&ContextOverrides {
            age: Some(40),
            ..Default::default()
        });
        assert_eq!(ctx.sex, Sex::Male);
        assert_eq!(ctx.age, 40);
        assert_eq!(session.format(None).unwrap(), OutputFormat::Json);
        assert_eq!(session.format(Some("md")).unwrap(), OutputFormat::Markdown);
    }

    #[test]
    fn test_fail_threshold_below_is_ok() {
        use SignificanceLevel::*;
        assert!(check_fail_threshold(Some(Critical), Some(PossiblySignificant)).is_ok());
        assert!(check_fail_threshold(None, Some(Critical)).is_ok());
        assert!(check_fail_threshold(Some(Normal), None).is_ok());
    }
}
