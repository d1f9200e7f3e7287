#![allow(clippy::result_large_err)]

use anyhow::{anyhow, Context};
use source_availability::availability::{
    AvailabilityChecker, CheckOutcome, Propagation, PropagationMode,
};
use source_availability::config::AvailabilityConfig;
use source_availability::domain::CheckRequest;
use source_availability::identity::{identity_headers, AccountIdentityResolver};
use source_availability::probe::TcpConnectProbe;
use source_availability::sources_api::HttpSourcesApi;
use source_availability::telemetry;
use std::process::ExitCode;
use std::sync::Arc;

enum CliCommand {
    Check {
        request: CheckRequest,
        config_path: Option<String>,
    },
    Help,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    telemetry::init_tracing().context("failed to initialise telemetry")?;

    match parse_cli_args()? {
        CliCommand::Check {
            request,
            config_path,
        } => {
            let config = match config_path {
                Some(path) => AvailabilityConfig::load_from(&path)
                    .with_context(|| format!("failed to load configuration from {path}"))?,
                None => AvailabilityConfig::load().context("failed to load configuration")?,
            };

            let checker = build_checker(&config, &request)?;
            let report = checker
                .check(&request)
                .await
                .context("availability check aborted")?;

            match report.result {
                Some(result) => println!(
                    "{} status={} error={}",
                    report.outcome,
                    result.status,
                    result.error_message.unwrap_or_default()
                ),
                None => println!("{}", report.outcome),
            }

            Ok(match report.outcome {
                CheckOutcome::Error => ExitCode::FAILURE,
                CheckOutcome::Skipped | CheckOutcome::Success => ExitCode::SUCCESS,
            })
        }
        CliCommand::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_checker(
    config: &AvailabilityConfig,
    request: &CheckRequest,
) -> anyhow::Result<AvailabilityChecker> {
    let identity = Arc::new(AccountIdentityResolver);
    let api = HttpSourcesApi::new(&config.sources_api)
        .context("failed to build sources api client")?
        .with_headers(identity_headers(identity.as_ref(), request.account()));

    let probe_timeout = config.probe.timeout().context("invalid probe timeout")?;
    let propagation = build_propagation(config)?;

    Ok(AvailabilityChecker::new(
        Arc::new(api),
        Arc::new(TcpConnectProbe::new(probe_timeout)),
        propagation,
    )
    .with_identity_resolver(identity))
}

#[allow(clippy::needless_return)]
fn build_propagation(config: &AvailabilityConfig) -> anyhow::Result<Propagation> {
    match config.propagation_mode() {
        PropagationMode::Direct => Ok(Propagation::Direct),
        PropagationMode::Event => {
            #[cfg(feature = "kafka")]
            {
                let factory =
                    source_availability::transport::kafka::KafkaPublisherFactory::new(&config.kafka)
                        .context("failed to configure kafka publisher")?;
                return Ok(Propagation::Event(Arc::new(factory)));
            }

            #[cfg(not(feature = "kafka"))]
            {
                Err(anyhow!(
                    "`update_via_events` requested but the binary was built \
                     without the `kafka` feature"
                ))
            }
        }
    }
}

fn parse_cli_args() -> anyhow::Result<CliCommand> {
    let mut args = std::env::args().skip(1);
    let Some(first) = args.next() else {
        return Ok(CliCommand::Help);
    };

    match first.as_str() {
        "check" => parse_check_args(args),
        "-h" | "--help" => Ok(CliCommand::Help),
        other => anyhow::bail!("unrecognised command `{other}`"),
    }
}

fn parse_check_args<I>(args: I) -> anyhow::Result<CliCommand>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut request = CheckRequest::default();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--source-id" => {
                request.source_id = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("expected value after {arg}"))?,
                );
            }
            "--account" => {
                request.account_identifier = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("expected value after {arg}"))?,
                );
            }
            "--params" => {
                let raw = args
                    .next()
                    .ok_or_else(|| anyhow!("expected JSON after {arg}"))?;
                let params: serde_json::Value =
                    serde_json::from_str(&raw).context("--params must be a JSON object")?;
                request = CheckRequest::from_params(&params);
            }
            "-c" | "--config" => {
                if config_path.is_some() {
                    anyhow::bail!("config path specified multiple times");
                }
                config_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("expected path after {arg}"))?,
                );
            }
            "-h" | "--help" => return Ok(CliCommand::Help),
            other => anyhow::bail!("unrecognised argument `{other}`"),
        }
    }

    Ok(CliCommand::Check {
        request,
        config_path,
    })
}

fn print_help() {
    println!(
        "\
Usage: source-availability check [OPTIONS]

Options:
      --source-id <ID>     Source to check
      --account <ACCOUNT>  Tenant account used for the identity header
      --params <JSON>      Trigger params, e.g. {{\"source_id\":\"42\",\"external_tenant\":\"123\"}}
  -c, --config <PATH>      Configuration file (defaults to config/local)
  -h, --help               Print this help message

Environment:
  AVAILABILITY__UPDATE_VIA_EVENTS=true   Publish status messages instead of patching the Sources API
"
    );
}
