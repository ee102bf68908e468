//! Binary entry point for the `mgmtctl` CLI.

use std::env;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mgmtctl::{
    ClientError, CommandError, ConfigError, ExtensionManager, GetWebJob, JsonSink,
    ManagementClient, ManagementConfig, NewWebJob, OutputSink, PayloadError,
    RemoveDiagnosticsExtension, RemoveWebJob, SetDiagnosticsExtension, ValidationError,
    WebJobClient, read_binary_file, read_text_file,
};

#[cfg(feature = "test-backdoors")]
mod backdoor;
mod cli;

use cli::{
    Cli, GetWebJobArgs, NewWebJobArgs, RemoveDiagnosticsArgs, RemoveWebJobArgs,
    SetDiagnosticsArgs,
};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("management client error: {0}")]
    Client(#[from] ClientError),
    #[error("input file error: {0}")]
    Payload(#[from] PayloadError),
    #[error("invalid parameters: {0}")]
    Validation(ValidationError),
    #[error("{0}")]
    Command(String),
}

impl<E> From<CommandError<E>> for CliError
where
    E: std::error::Error + 'static,
{
    fn from(err: CommandError<E>) -> Self {
        match err {
            CommandError::Validation(inner) => Self::Validation(inner),
            other => Self::Command(other.to_string()),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| String::from(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    #[cfg(feature = "test-backdoors")]
    if let Some(backend) = backdoor::from_env() {
        let result = execute(
            cli,
            &backend.manager,
            &backend.jobs,
            &mut JsonSink::stdout(),
        )
        .await;
        backdoor::write_calls(io::stderr(), &backend);
        return result;
    }

    let config = ManagementConfig::load_without_cli_args()?;
    let client = ManagementClient::new(&config)?;
    execute(cli, &client, &client, &mut JsonSink::stdout()).await
}

async fn execute<M, C, S>(cli: Cli, manager: &M, jobs: &C, sink: &mut S) -> Result<(), CliError>
where
    M: ExtensionManager,
    C: WebJobClient,
    S: OutputSink,
{
    match cli {
        Cli::SetDiagnosticsExtension(args) => {
            set_diagnostics_command(args)?
                .execute(manager, sink)
                .await?;
        }
        Cli::RemoveDiagnosticsExtension(args) => {
            remove_diagnostics_command(args)
                .execute(manager, sink)
                .await?;
        }
        Cli::NewWebJob(args) => {
            new_webjob_command(args).execute(jobs, sink).await?;
        }
        Cli::GetWebJob(args) => {
            get_webjob_command(args).execute(jobs, sink).await?;
        }
        Cli::RemoveWebJob(args) => {
            remove_webjob_command(args).execute(jobs).await?;
        }
    }
    Ok(())
}

fn set_diagnostics_command(args: SetDiagnosticsArgs) -> Result<SetDiagnosticsExtension, CliError> {
    let certificate = args
        .certificate_file
        .as_deref()
        .map(read_binary_file)
        .transpose()?;
    let diagnostics_configuration = args
        .diagnostics_configuration_file
        .as_deref()
        .map(read_text_file)
        .transpose()?;

    Ok(SetDiagnosticsExtension {
        service_name: args.service_name,
        slot: args.slot,
        roles: args.roles,
        certificate,
        certificate_thumbprint: args.certificate_thumbprint,
        thumbprint_algorithm: args.thumbprint_algorithm,
        storage_account_name: args.storage_account_name,
        diagnostics_configuration,
    })
}

fn remove_diagnostics_command(args: RemoveDiagnosticsArgs) -> RemoveDiagnosticsExtension {
    RemoveDiagnosticsExtension {
        service_name: args.service_name,
        slot: args.slot,
        roles: args.roles,
    }
}

fn new_webjob_command(args: NewWebJobArgs) -> NewWebJob {
    NewWebJob {
        name: args.name,
        slot: args.slot,
        job_name: args.job_name,
        job_type: args.job_type,
        job_file: args.job_file,
    }
}

fn get_webjob_command(args: GetWebJobArgs) -> GetWebJob {
    GetWebJob {
        name: args.name,
        slot: args.slot,
        job_name: args.job_name,
        job_type: args.job_type,
    }
}

fn remove_webjob_command(args: RemoveWebJobArgs) -> RemoveWebJob {
    RemoveWebJob {
        name: args.name,
        slot: args.slot,
        job_name: args.job_name,
        job_type: args.job_type,
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
