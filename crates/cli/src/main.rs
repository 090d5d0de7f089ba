use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, value_parser};
use terminus_api::TerminusClient;
use terminus_engine::{ProgressSink, SilentProgress, WaitOptions, WorkflowCollection, WriterProgress};
use terminus_types::{OwnerContext, WorkflowRecord};
use terminus_util::TerminusConfig;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Conventional exit status for a process interrupted by SIGINT.
const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("workflow", sub)) => run_workflow_cmd(sub).await,
        _ => bail!("expected a subcommand; run `terminus --help`"),
    }
}

/// Logs go to stderr so stdout stays machine readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn owner_args(command: Command) -> Command {
    command
        .arg(Arg::new("site").long("site").action(ArgAction::Set).help("Site id or name"))
        .arg(
            Arg::new("env")
                .long("env")
                .action(ArgAction::Set)
                .requires("site")
                .help("Environment of --site (dev, test, live, or a multidev)"),
        )
        .arg(Arg::new("org").long("org").action(ArgAction::Set).help("Organization id"))
        .arg(
            Arg::new("user")
                .long("user")
                .action(ArgAction::Set)
                .help("User id; defaults to the signed-in user"),
        )
        .group(ArgGroup::new("owner").args(["site", "org", "user"]).multiple(false))
}

fn workflow_id_arg() -> Arg {
    Arg::new("id").required(true).help("Workflow id")
}

fn build_cli() -> Command {
    let workflow = Command::new("workflow")
        .about("Inspect and wait on platform workflows")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            owner_args(Command::new("wait"))
                .about("Wait for a workflow to finish and print its record")
                .arg(workflow_id_arg())
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Seconds between status checks"),
                )
                .arg(
                    Arg::new("max-wait")
                        .long("max-wait")
                        .value_parser(value_parser!(u64))
                        .help("Give up after this many seconds"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Do not print progress dots"),
                ),
        )
        .subcommand(
            owner_args(Command::new("info"))
                .about("Show a workflow")
                .arg(workflow_id_arg())
                .arg(
                    Arg::new("logs")
                        .long("logs")
                        .action(ArgAction::SetTrue)
                        .help("Include per-operation logs"),
                ),
        )
        .subcommand(owner_args(Command::new("list")).about("List workflows"))
        .subcommand(
            owner_args(Command::new("logs"))
                .about("Show the operations of a workflow with their logs")
                .arg(workflow_id_arg()),
        );

    Command::new("terminus")
        .about("Pantheon command line")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(workflow)
}

/// Owner named on the command line. With no owner flag the signed-in user is assumed.
fn owner_context(matches: &ArgMatches, current_user_id: Option<&str>) -> Result<OwnerContext> {
    let text = |name: &str| matches.get_one::<String>(name).map(String::as_str);
    let context = match (text("site"), text("env"), text("org"), text("user")) {
        (Some(site), Some(env), _, _) => OwnerContext::new().with_environment(site, env),
        (Some(site), None, _, _) => OwnerContext::new().with_site(site),
        (None, _, Some(org), _) => {
            let current_user_id = current_user_id.context("organization workflows require a signed-in user")?;
            OwnerContext::new().with_organization(org, current_user_id)
        }
        (None, _, None, Some(user)) => OwnerContext::new().with_user(user),
        (None, _, None, None) => match current_user_id {
            Some(user) => OwnerContext::new().with_user(user),
            None => bail!("pass --site, --org or --user, or sign in first"),
        },
    };
    Ok(context)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn wait_options(config: &TerminusConfig, matches: &ArgMatches) -> WaitOptions {
    let mut options = WaitOptions::from_config(config);
    if let Some(interval) = matches.get_one::<u64>("interval") {
        options = options.with_poll_interval(Duration::from_secs(*interval));
    }
    if let Some(max_wait) = matches.get_one::<u64>("max-wait") {
        options = options.with_max_duration(Duration::from_secs(*max_wait));
    }
    options
}

async fn run_workflow_cmd(matches: &ArgMatches) -> Result<ExitCode> {
    let (name, sub) = matches.subcommand().context("expected a workflow subcommand")?;

    let config = TerminusConfig::load().context("failed to load configuration")?;
    let client = TerminusClient::from_config(&config).context("failed to build API client")?;
    let context = owner_context(sub, client.current_user_id())?;
    let collection = WorkflowCollection::from_context(&context, Arc::new(client))?;
    debug!(owner = %collection.owner(), kind = collection.owner().kind(), command = name, "resolved workflow owner");

    match name {
        "wait" => {
            let id = required_id(sub)?;
            let mut workflow = collection
                .get(id)
                .await
                .with_context(|| format!("failed to load workflow {id}"))?;
            let options = wait_options(&config, sub);
            let mut progress: Box<dyn ProgressSink> = if sub.get_flag("quiet") {
                Box::new(SilentProgress)
            } else {
                Box::new(WriterProgress::stderr())
            };

            let outcome = tokio::select! {
                outcome = workflow.wait_with(&options, progress.as_mut()) => Some(outcome.map(|_| ())),
                _ = tokio::signal::ctrl_c() => None,
            };
            match outcome {
                Some(result) => result?,
                None => {
                    progress.finish();
                    warn!(workflow_id = %id, "interrupted; the workflow keeps running on the platform");
                    return Ok(ExitCode::from(INTERRUPTED));
                }
            }
            print_json(&workflow.serialize())?;
        }
        "info" => {
            let id = required_id(sub)?;
            let workflow = if sub.get_flag("logs") {
                collection.get_with_logs(id).await?
            } else {
                collection.get(id).await?
            };
            print_json(&workflow.serialize())?;
        }
        "list" => {
            let records: Vec<WorkflowRecord> = collection.list().await?.iter().map(|workflow| workflow.serialize()).collect();
            print_json(&records)?;
        }
        "logs" => {
            let id = required_id(sub)?;
            let workflow = collection.get_with_logs(id).await?;
            let operations = workflow.operations();
            if operations.is_empty() {
                warn!(workflow_id = %id, "workflow has no operations");
            }
            for operation in operations {
                println!("{operation}\n");
            }
        }
        other => bail!("unknown workflow command: {other}"),
    }

    Ok(ExitCode::SUCCESS)
}

fn required_id(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("id")
        .map(String::as_str)
        .context("a workflow id is required")
}

#[cfg(test)]
mod tests {
    use terminus_types::WorkflowOwner;

    use super::*;

    fn workflow_matches(args: &[&str]) -> ArgMatches {
        let matches = build_cli()
            .try_get_matches_from(["terminus", "workflow"].iter().chain(args))
            .unwrap();
        let (_, workflow) = matches.subcommand().unwrap();
        let (_, sub) = workflow.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn site_and_env_resolve_to_an_environment_owner() {
        let matches = workflow_matches(&["wait", "W1", "--site", "S123", "--env", "live"]);
        let owner = owner_context(&matches, None).unwrap().resolve().unwrap();
        assert_eq!(
            owner,
            WorkflowOwner::Environment {
                site_id: "S123".into(),
                environment_id: "live".into()
            }
        );
    }

    #[test]
    fn organizations_need_a_signed_in_user() {
        let matches = workflow_matches(&["list", "--org", "O1"]);
        assert!(owner_context(&matches, None).is_err());

        let owner = owner_context(&matches, Some("U1")).unwrap().resolve().unwrap();
        assert_eq!(owner.collection_path(), "users/U1/organizations/O1/workflows");
    }

    #[test]
    fn no_owner_defaults_to_the_current_user() {
        let matches = workflow_matches(&["list"]);
        let owner = owner_context(&matches, Some("U7")).unwrap().resolve().unwrap();
        assert_eq!(owner, WorkflowOwner::User { user_id: "U7".into() });
        assert!(owner_context(&matches, None).is_err());
    }

    #[test]
    fn env_without_site_is_rejected() {
        let result = build_cli().try_get_matches_from(["terminus", "workflow", "info", "W1", "--env", "dev"]);
        assert!(result.is_err());
    }

    #[test]
    fn wait_flags_override_configuration() {
        let matches = workflow_matches(&["wait", "W1", "--site", "S1", "--interval", "10", "--max-wait", "60"]);
        let options = wait_options(&TerminusConfig::default(), &matches);
        assert_eq!(options.poll_interval, Duration::from_secs(10));
        assert_eq!(options.max_duration, Some(Duration::from_secs(60)));
    }
}
