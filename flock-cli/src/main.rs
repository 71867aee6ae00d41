use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flock_minion::{ClientConfig, MinionClient, MinionError, Task};
use flock_resource::{Registry, Systemctl, probe};
use flock_store::{EtcdConfig, EtcdStore};
use tabled::Table;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod apply;
mod output;

use output::{ClassifiedRow, ClassifierRow, MinionRow, TaskResultRow};

/// Exit status for malformed arguments (EX_USAGE).
const EXIT_USAGE: i32 = 64;

#[derive(Parser)]
#[command(name = "flockctl")]
#[command(about = "Control a flock of minions", long_about = None)]
struct Cli {
    /// etcd endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:2379")]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Concurrent lookups for fleet-wide queries
    #[arg(long, default_value = "4")]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered minions
    Minions,

    /// Show all classifiers of a minion
    Classifier {
        /// Minion UUID
        minion: String,
    },

    /// Show minions having a classifier key
    Classified {
        /// Classifier key, e.g. "os"
        key: String,
    },

    /// Submit a task to a minion
    Push {
        /// Minion UUID
        minion: String,

        /// Command to run
        command: String,

        /// Command arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show results of a task from every minion that ran it
    #[command(name = "result")]
    TaskResult {
        /// Task UUID
        task: String,
    },

    /// Reconcile the resources declared in a manifest on this host
    Apply {
        /// Manifest file (JSON)
        file: PathBuf,

        /// Seconds to wait for a unit start/stop job
        #[arg(long, default_value = "30")]
        job_timeout: u64,
    },
}

/// Arguments that parsed but make no sense.
#[derive(Debug, Error)]
#[error("{0}")]
struct UsageError(String);

fn parse_uuid(what: &str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| UsageError(format!("bad {} uuid given: {}", what, s)).into())
}

/// Fleet queries treat a missing keyspace as no results.
fn or_empty<T: Default>(result: flock_minion::Result<T>) -> flock_minion::Result<T> {
    match result {
        Err(e) if e.is_not_found() => Ok(T::default()),
        other => other,
    }
}

fn client(cli: &Cli) -> Result<MinionClient> {
    let store = EtcdStore::new(EtcdConfig {
        endpoint: cli.endpoint.clone(),
        timeout: Duration::from_secs(cli.timeout),
    })
    .context("failed to create etcd client")?;

    let config = ClientConfig {
        concurrency: cli.concurrency.max(1),
        ..ClientConfig::default()
    };
    Ok(MinionClient::with_config(Arc::new(store), config))
}

fn print_table<R: tabled::Tabled>(rows: Vec<R>, empty: &str) {
    if rows.is_empty() {
        println!("{}", empty);
    } else {
        println!("{}", Table::new(rows));
    }
}

async fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Minions => {
            let client = client(&cli)?;
            let minions = or_empty(client.list_minions().await)?;

            let mut rows = Vec::with_capacity(minions.len());
            for minion in minions {
                let name = match client.get_name(minion).await {
                    Ok(name) => name,
                    Err(e) if e.is_not_found() => "-".to_string(),
                    Err(e) => return Err(e.into()),
                };
                let lastseen = match client.get_lastseen(minion).await {
                    Ok(secs) => output::format_timestamp(secs),
                    Err(e) if e.is_not_found() => "-".to_string(),
                    Err(e) => return Err(e.into()),
                };
                rows.push(MinionRow {
                    id: minion.to_string(),
                    name,
                    lastseen,
                });
            }
            print_table(rows, "No minions found");
        }

        Commands::Classifier { minion } => {
            let minion = parse_uuid("minion", minion)?;
            let classifiers = or_empty(client(&cli)?.get_all_classifiers(minion).await)?;
            let rows: Vec<ClassifierRow> = classifiers.into_iter().map(ClassifierRow::from).collect();
            print_table(rows, "No classifiers found");
        }

        Commands::Classified { key } => {
            let found = or_empty(client(&cli)?.get_classified_minions(key).await)?;
            let rows: Vec<ClassifiedRow> = found
                .into_iter()
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .map(|(minion, c)| ClassifiedRow::new(minion, c))
                .collect();
            print_table(rows, "No minions classified");
        }

        Commands::Push {
            minion,
            command,
            args,
        } => {
            let minion = parse_uuid("minion", minion)?;
            let task = Task::new(command.clone(), args.clone());
            match client(&cli)?.submit_task(minion, &task).await {
                Ok(()) => println!("{}", task.id),
                Err(e @ MinionError::UnknownMinion(_)) => {
                    return Err(UsageError(e.to_string()).into());
                }
                Err(e) => return Err(e).context("failed to submit task"),
            }
        }

        Commands::TaskResult { task } => {
            let task = parse_uuid("task", task)?;
            let results = or_empty(client(&cli)?.get_task(task).await)?;
            let rows: Vec<TaskResultRow> = results
                .into_iter()
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .map(|(minion, t)| TaskResultRow::new(minion, t))
                .collect();
            print_table(rows, "No results yet");
        }

        Commands::Apply { file, job_timeout } => {
            let decls = apply::load_manifest(file).await?;
            let registry = Registry::with_host_capabilities(
                probe::systemd_booted(),
                Arc::new(Systemctl::new()),
                Duration::from_secs(*job_timeout),
            )?;
            let resources = apply::build(&registry, &decls)?;

            let rows = apply::apply(&resources).await;
            let ok = rows.iter().all(|r| r.error == "-");
            print_table(rows, "Nothing to apply");
            return Ok(ok);
        }
    }

    Ok(true)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flockctl=info,flock_minion=info,flock_resource=info,flock_store=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) if e.downcast_ref::<UsageError>().is_some() => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_USAGE);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
