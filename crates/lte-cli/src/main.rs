use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use lte_cli::{FileConfig, RegenerateOptions, Target};
use lte_core::{loader, FieldId, GenerationOutcome, RowId, TaskId};
use lte_provider::GeminiProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn input_arg() -> Arg {
    Arg::new("input")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Plan document (JSON)")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_parser(value_parser!(PathBuf))
        .help("Write the result here instead of overwriting the input")
}

fn cli() -> Command {
    Command::new("lte")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Learning-task editor: regenerate plan content and track dependency review")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with [editor] and [provider] tables"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a plan document and print its counts")
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a task with its dependency flags")
                .arg(input_arg())
                .arg(Arg::new("task").long("task").help("Task to show (default: active task)"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the whole document as JSON"),
                ),
        )
        .subcommand(
            Command::new("regenerate")
                .about("Regenerate a row or a whole task through the content provider")
                .arg(input_arg())
                .arg(Arg::new("row").long("row").help("Row to regenerate"))
                .arg(Arg::new("page").long("page").help("Task to regenerate in full"))
                .group(ArgGroup::new("target").args(["row", "page"]).required(true))
                .arg(
                    Arg::new("instruction")
                        .long("instruction")
                        .short('i')
                        .required(true)
                        .help("What the provider should change"),
                )
                .arg(
                    Arg::new("focus")
                        .long("focus")
                        .help("Field under review; its dependencies are flagged on success"),
                )
                .arg(output_arg())
                .arg(
                    Arg::new("timeout-secs")
                        .long("timeout-secs")
                        .value_parser(value_parser!(u64))
                        .help("Provider call budget in seconds"),
                )
                .arg(
                    Arg::new("placeholder-fallback")
                        .long("placeholder-fallback")
                        .action(ArgAction::SetTrue)
                        .help("Write placeholder text when the provider fails (demo only)"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Clear the dependency flags of a field")
                .arg(input_arg())
                .arg(Arg::new("field").long("field").required(true).help("Field to resolve"))
                .arg(output_arg()),
        )
}

fn input(args: &ArgMatches) -> Result<&Path> {
    args.get_one::<PathBuf>("input")
        .map(PathBuf::as_path)
        .context("missing input document")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    lte_cli::init_tracing(matches.get_flag("log-json"));

    let config = FileConfig::load_or_default(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("validate", args)) => {
            let report = lte_cli::validate(input(args)?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(("show", args)) => {
            let doc = loader::load(input(args)?)?;
            if args.get_flag("json") {
                println!("{}", loader::to_json_string(&doc)?);
            } else {
                let task = args.get_one::<String>("task").map(TaskId::new);
                print!("{}", lte_cli::render_task(&doc, task.as_ref())?);
            }
        }
        Some(("regenerate", args)) => {
            let target = match (args.get_one::<String>("row"), args.get_one::<String>("page")) {
                (Some(row), _) => Target::Row(RowId::new(row.as_str())),
                (None, Some(task)) => Target::Page(TaskId::new(task.as_str())),
                (None, None) => anyhow::bail!("one of --row or --page is required"),
            };
            let options = RegenerateOptions {
                input: input(args)?.to_path_buf(),
                output: args.get_one::<PathBuf>("output").cloned(),
                target,
                instruction: args
                    .get_one::<String>("instruction")
                    .cloned()
                    .unwrap_or_default(),
                focus: args.get_one::<String>("focus").map(FieldId::new),
                timeout: args.get_one::<u64>("timeout-secs").map(|s| Duration::from_secs(*s)),
                placeholder_fallback: args.get_flag("placeholder-fallback"),
                editor: config.editor,
            };
            let provider = Arc::new(GeminiProvider::new(config.provider)?);

            let outcome = lte_cli::regenerate(options, provider).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let GenerationOutcome::Failed { error, .. } = outcome {
                anyhow::bail!("regeneration failed: {error}");
            }
        }
        Some(("resolve", args)) => {
            let field = args
                .get_one::<String>("field")
                .map(FieldId::new)
                .context("missing --field")?;
            let output = args.get_one::<PathBuf>("output").map(PathBuf::as_path);
            let report = lte_cli::resolve(input(args)?, &field, output)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {}
    }
    Ok(())
}
