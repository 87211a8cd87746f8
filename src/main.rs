//! Lumo Orchestrator - command-line front end to the configuration core.

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lumo_orchestrator::config::{Settings, DEFAULT_CONFIG_PATH};
use lumo_orchestrator::error::{OrchestratorError, ValidationErrorKind};
use lumo_orchestrator::factory::ServiceFactory;
use lumo_orchestrator::health::HealthMonitor;
use lumo_orchestrator::result::OperationResult;
use lumo_orchestrator::site::Site;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

type CliResult = Result<bool, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let (config_path, command) = split_args(&args[1..]);
    if command.is_empty() {
        print_help();
        return ExitCode::FAILURE;
    }

    let settings = match Settings::load_or_default(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    let factory = match ServiceFactory::from_settings(&settings) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "Failed to initialize services");
            return ExitCode::FAILURE;
        }
    };

    let outcome = if command[0] == "watch" {
        let interval = Duration::from_secs(settings.health.interval_seconds);
        match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime
                .block_on(watch(Arc::new(factory.health_monitor()), interval))
                .map(|()| true),
            Err(e) => Err(e.into()),
        }
    } else {
        run(&factory, &command)
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Separate `--config <PATH>` from the subcommand words.
fn split_args(args: &[String]) -> (String, Vec<String>) {
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut command = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = iter.next() {
                config_path = path.clone();
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config_path = path.to_string();
        } else {
            command.push(arg.clone());
        }
    }

    (config_path, command)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), OrchestratorError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(result: OperationResult) -> CliResult {
    print_json(&result)?;
    Ok(result.success)
}

fn arg<'a>(command: &'a [String], index: usize, name: &str) -> Result<&'a str, OrchestratorError> {
    command
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| OrchestratorError::Validation {
            kind: ValidationErrorKind::MissingParameter {
                param: name.to_string(),
            },
        })
}

fn usage(command: &[String]) -> OrchestratorError {
    OrchestratorError::invalid("command", format!("unknown command '{}'", command.join(" ")))
}

fn run(factory: &ServiceFactory, command: &[String]) -> CliResult {
    let words: Vec<&str> = command.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["os"] => {
            print_json(&serde_json::json!({ "family": factory.os_family() }))?;
            Ok(true)
        }
        ["firewall", rest @ ..] => firewall(factory, rest, command),
        ["service", rest @ ..] => service(factory, rest, command),
        ["site", action, ..] => site(factory, action, command),
        ["pool", action, ..] => pool(factory, action, command),
        _ => Err(usage(command).into()),
    }
}

fn firewall(factory: &ServiceFactory, words: &[&str], command: &[String]) -> CliResult {
    let firewall = factory.firewall();
    match words {
        ["status"] => {
            let status = firewall.get_status();
            print_json(&status)?;
            Ok(status.active)
        }
        ["rules"] => {
            print_json(&firewall.get_rules())?;
            Ok(true)
        }
        ["enable"] => report(firewall.enable()),
        ["disable"] => report(firewall.disable()),
        ["reset"] => report(firewall.reset()),
        ["allow", port] => report(firewall.allow_port(port)?),
        ["allow", port, protocol] => report(firewall.add_rule(port, protocol)?),
        ["remove", port] => report(firewall.remove_port(port)?),
        ["remove", port, protocol] => report(firewall.delete_rule(port, protocol)?),
        _ => Err(usage(command).into()),
    }
}

fn service(factory: &ServiceFactory, words: &[&str], command: &[String]) -> CliResult {
    let services = factory.service_manager();
    match words {
        ["list"] => {
            print_json(&services.get_supported_services())?;
            Ok(true)
        }
        ["available"] => {
            print_json(&services.get_available_services())?;
            Ok(true)
        }
        ["status", key] => {
            let status = services.get_service_status(key)?;
            print_json(&status)?;
            Ok(true)
        }
        ["start", key] => report(services.start_service(key)?),
        ["stop", key] => report(services.stop_service(key)?),
        ["restart", key] => report(services.restart_service(key)?),
        ["reload", key] => report(services.reload_service(key)?),
        _ => Err(usage(command).into()),
    }
}

fn load_site(command: &[String]) -> Result<Site, OrchestratorError> {
    Site::from_toml_file(Path::new(arg(command, 2, "site_file")?))
}

fn site(factory: &ServiceFactory, action: &str, command: &[String]) -> CliResult {
    let web = factory.web_server();
    match action {
        "test" => report(web.test_config()),
        "reload" => report(web.reload()),
        "generate" => {
            print!("{}", web.generate_config(&load_site(command)?)?);
            Ok(true)
        }
        "write" => report(web.write_config(&load_site(command)?)?),
        "deploy" => report(web.deploy(&load_site(command)?)?),
        "enable" => report(web.enable_site(&load_site(command)?)?),
        "disable" => report(web.disable_site(&load_site(command)?)?),
        "delete" => report(web.delete_config(&load_site(command)?)?),
        "remove" => report(web.remove(&load_site(command)?)?),
        _ => Err(usage(command).into()),
    }
}

fn pool(factory: &ServiceFactory, action: &str, command: &[String]) -> CliResult {
    let php = factory.php_runtime();
    match action {
        "test" => report(php.test_config(arg(command, 2, "version")?, None)?),
        "reload" => report(php.reload(arg(command, 2, "version")?)?),
        "restart" => report(php.restart(arg(command, 2, "version")?)?),
        "generate" => {
            print!("{}", php.generate_pool_config(&load_site(command)?)?);
            Ok(true)
        }
        "write" => report(php.write_pool_config(&load_site(command)?)?),
        "deploy" => report(php.deploy_pool(&load_site(command)?)?),
        "delete" => report(php.delete_pool_config(&load_site(command)?)?),
        _ => Err(usage(command).into()),
    }
}

/// Print a health snapshot every `interval` until SIGINT/SIGTERM.
async fn watch(
    monitor: Arc<HealthMonitor>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(interval_secs = interval.as_secs(), "Starting health watch");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let monitor = Arc::clone(&monitor);
                let snapshot = tokio::task::spawn_blocking(move || monitor.snapshot()).await?;
                let down = snapshot.down();
                if !down.is_empty() {
                    warn!(services = ?down, "Services not running");
                }
                print_json(&snapshot)?;
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, stopping health watch");
                break;
            }
        }
    }

    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Server configuration orchestrator for nginx, PHP-FPM, firewall and services.

USAGE:
    {} [OPTIONS] <COMMAND>

COMMANDS:
    os                                    Show the detected OS family
    firewall status|rules|enable|disable|reset
    firewall allow|remove <PORT> [PROTO]  Open or close a port (tcp default)
    service list|available
    service status|start|stop|restart|reload <KEY>
    site test|reload
    site generate|write|deploy|enable|disable|delete|remove <SITE.toml>
    pool test|reload|restart <PHP_VERSION>
    pool generate|write|deploy|delete <SITE.toml>
    watch                                 Print health snapshots until stopped

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: {}]
    -h, --help             Print help information
    -V, --version          Print version information
"#,
        NAME, VERSION, NAME, DEFAULT_CONFIG_PATH
    );
}

/// Initialize logging based on settings.
///
/// Logs go to stderr; stdout carries command output.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
