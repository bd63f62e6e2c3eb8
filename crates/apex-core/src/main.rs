//! `apex` command line

use anyhow::Context;
use apex_core::{
    ApexConfig, ApexService, ClassifyRequest, RunExecutionRequest, SynthesizeRequest,
};
use apex_model::{Requirement, TestCase};
use apex_requirements::RecordFormat;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Bare list, or the response of the previous stage
#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementsInput {
    List(Vec<Requirement>),
    Classified { requirements: Vec<Requirement> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CasesInput {
    List(Vec<TestCase>),
    Synthesized {
        #[serde(rename = "testCases")]
        test_cases: Vec<TestCase>,
        #[serde(rename = "suiteId", default)]
        suite_id: Option<String>,
    },
}

fn cli() -> Command {
    Command::new("apex")
        .version(apex_core::VERSION)
        .about("Requirement classification, test synthesis and execution")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("classify")
                .about("Extract and classify requirements")
                .arg(file_arg(
                    "input",
                    "Requirements document, or tracker export with --structured",
                ))
                .arg(
                    Arg::new("structured")
                        .long("structured")
                        .num_args(0..=1)
                        .default_missing_value("json")
                        .help("Treat input as a tracker export (json or yaml)"),
                ),
        )
        .subcommand(
            Command::new("design")
                .about("Synthesize test cases from classified requirements")
                .arg(file_arg("requirements", "JSON requirements, or classify output"))
                .arg(
                    Arg::new("dialect")
                        .long("dialect")
                        .help("Script dialect: python, javascript or csharp"),
                ),
        )
        .subcommand(
            Command::new("execute")
                .about("Run test cases and aggregate a report")
                .arg(file_arg("cases", "JSON test cases, or design output"))
                .arg(
                    Arg::new("environment")
                        .long("environment")
                        .help("Target environment"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Run one case at a time"),
                )
                .arg(
                    Arg::new("max-parallel")
                        .long("max-parallel")
                        .value_parser(value_parser!(usize))
                        .help("Batch width for parallel runs"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducible outcomes"),
                )
                .arg(
                    Arg::new("no-delay")
                        .long("no-delay")
                        .action(ArgAction::SetTrue)
                        .help("Skip simulated setup and step delays"),
                ),
        )
        .subcommand(
            Command::new("pipeline")
                .about("Classify, synthesize and execute a document")
                .arg(file_arg("input", "Requirements document"))
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducible outcomes"),
                )
                .arg(
                    Arg::new("no-delay")
                        .long("no-delay")
                        .action(ArgAction::SetTrue)
                        .help("Skip simulated setup and step delays"),
                ),
        )
}

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn read_file_arg(args: &ArgMatches, name: &str) -> anyhow::Result<String> {
    let path = args
        .get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))?;
    read(path)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Apply per-run execution flags on top of the loaded file
fn apply_execution_flags(config: &mut ApexConfig, args: &ArgMatches) {
    if let Some(seed) = args.get_one::<u64>("seed") {
        config.execution.seed = Some(*seed);
    }
    if args.get_flag("no-delay") {
        config.execution.simulate_delays = false;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ApexConfig::load(path)?,
        None => ApexConfig::default(),
    };

    let success = match matches.subcommand() {
        Some(("classify", args)) => {
            let content = read_file_arg(args, "input")?;
            let request = match args.get_one::<String>("structured") {
                Some(format) => {
                    ClassifyRequest::structured(content, format.parse::<RecordFormat>()?)
                }
                None => ClassifyRequest::from_document(&content),
            };
            let response = ApexService::new(config).classify(&request);
            print_json(&response)?;
            response.success
        }
        Some(("design", args)) => {
            let input = read_file_arg(args, "requirements")?;
            let requirements = match serde_json::from_str::<RequirementsInput>(&input)
                .context("input is neither a requirement list nor classify output")?
            {
                RequirementsInput::List(requirements)
                | RequirementsInput::Classified { requirements } => requirements,
            };
            let response = ApexService::new(config).synthesize(&SynthesizeRequest {
                requirements,
                dialect: args.get_one::<String>("dialect").cloned(),
            });
            print_json(&response)?;
            response.success
        }
        Some(("execute", args)) => {
            let input = read_file_arg(args, "cases")?;
            let (test_cases, suite_id) = match serde_json::from_str::<CasesInput>(&input)
                .context("input is neither a test case list nor design output")?
            {
                CasesInput::List(test_cases) => (test_cases, None),
                CasesInput::Synthesized {
                    test_cases,
                    suite_id,
                } => (test_cases, suite_id),
            };
            apply_execution_flags(&mut config, args);
            config.validate()?;

            let request = RunExecutionRequest {
                test_cases,
                environment: args.get_one::<String>("environment").cloned(),
                parallel: args.get_flag("sequential").then_some(false),
                max_parallel: args.get_one::<usize>("max-parallel").copied(),
                suite_id,
            };
            let response = ApexService::new(config).run_execution(&request).await;
            print_json(&response)?;
            response.success
        }
        Some(("pipeline", args)) => {
            let content = read_file_arg(args, "input")?;
            apply_execution_flags(&mut config, args);
            let response = ApexService::new(config)
                .pipeline(&ClassifyRequest::from_document(&content))
                .await;
            print_json(&response)?;
            response.success
        }
        _ => true,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn execute_flags_parse() {
        let matches = cli()
            .try_get_matches_from([
                "apex",
                "execute",
                "--cases",
                "cases.json",
                "--sequential",
                "--seed",
                "7",
                "--config",
                "apex.toml",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("apex.toml"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "execute");
        assert!(args.get_flag("sequential"));

        let mut config = ApexConfig::default();
        apply_execution_flags(&mut config, args);
        assert_eq!(config.execution.seed, Some(7));
        assert!(config.execution.simulate_delays);
    }

    #[test]
    fn design_output_feeds_execute() {
        let input: CasesInput = serde_json::from_str(
            r#"{"success": true, "suiteId": "TS-1", "testCases": []}"#,
        )
        .unwrap();
        assert!(matches!(
            input,
            CasesInput::Synthesized { suite_id: Some(ref id), .. } if id == "TS-1"
        ));
    }
}
