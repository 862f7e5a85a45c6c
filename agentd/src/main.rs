//! `guardiantrack-agentd` entry point.
//!
//! Loads the TOML config, wires the host bridges into the core pipeline, and
//! dispatches the start or stop command. In service mode (the default) the
//! daemon stays resident until Ctrl-C / SIGTERM, at which point it stops
//! tracking and exits cleanly.
//!
//! ## Usage
//!
//! `guardiantrack-agentd [--config <path>] [<action>]`
//!
//! `<action>` defaults to `start`; any unrecognized action also starts, so a
//! supervisor restart resumes collection. `stop` signals the resident daemon
//! instead of running a pipeline of its own: the presence lock file names the
//! holder's pid, and a SIGTERM to it triggers the daemon's clean shutdown
//! path. With no live holder, `stop` fails and touches nothing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::bail;
use guardiantrack_agentd::platform::{
    JsonlCallLogSource, JsonlMessageLogSource, LockFilePresence, StdinFixSource,
};
use guardiantrack_core::config::{self, AgentConfig};
use guardiantrack_core::sources::location::FixRequest;
use guardiantrack_core::{
    AgentContext, AgentController, AgentState, Command, DeliveryClient, SampleLog,
    StaticIdentityProvider,
};

struct Args {
    config_path: PathBuf,
    action: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config_path = None;
    let mut action = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().context("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                println!("usage: guardiantrack-agentd [--config <path>] [<action>]");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            other => {
                if action.replace(other.to_string()).is_some() {
                    bail!("at most one action may be given");
                }
            }
        }
    }

    Ok(Args {
        config_path: config_path.unwrap_or_else(config::default_config_path),
        action,
    })
}

fn build_context(config: &AgentConfig, presence: LockFilePresence) -> AgentContext {
    AgentContext {
        identity: Arc::new(StaticIdentityProvider::new(config.identity())),
        capabilities: Arc::new(config.capability_set()),
        fixes: Arc::new(StdinFixSource),
        call_log: Arc::new(JsonlCallLogSource::new(config.sources.call_log_path.clone())),
        message_log: Arc::new(JsonlMessageLogSource::new(
            config.sources.message_log_path.clone(),
        )),
        presence: Arc::new(presence),
        delivery: DeliveryClient::new(config.sink_url.clone()),
        buffer: SampleLog::new(config.buffer_path.clone()),
        fix_request: FixRequest::new(
            config.location.interval_ms,
            config.location.fastest_interval_ms,
        ),
    }
}

/// Deliver the stop command to the resident daemon.
///
/// The pid comes from the presence lock file and is only trusted while the
/// lock is actually held, so a stale file from a dead instance is never
/// signalled.
fn signal_running_instance(presence: &LockFilePresence) -> anyhow::Result<()> {
    let holder = presence
        .holder_pid()
        .context("cannot inspect the presence lock")?;
    let Some(pid) = holder else {
        bail!("no running instance holds the presence lock");
    };

    // SAFETY: plain signal syscall; kill(2) has no memory-safety
    // preconditions.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("cannot signal pid {pid}"));
    }
    tracing::info!(pid, "stop signal delivered to running instance");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    run()
}

#[tokio::main]
async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("guardiantrack-agentd v{} starting", env!("CARGO_PKG_VERSION"));

    let args = parse_args()?;
    let presence = LockFilePresence::default();

    if Command::from_action(args.action.as_deref()) == Command::StopTracking {
        return signal_running_instance(&presence);
    }

    let config = AgentConfig::load(&args.config_path)
        .with_context(|| format!("cannot load config {}", args.config_path.display()))?;
    tracing::info!(sink_url = %config.sink_url, "config loaded");

    let mut controller = AgentController::new(build_context(&config, presence));
    controller.handle(Command::StartTracking);
    if controller.state() != AgentState::Running {
        bail!("agent failed to start; see log for the refusal");
    }

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("cannot listen for shutdown signal")?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    tracing::info!("signal received, stopping tracking");
    controller.handle(Command::StopTracking);

    tracing::info!("guardiantrack-agentd exiting cleanly");
    Ok(())
}
