//! Command-line interface for hsx
//!
//! Usage:
//!   hsx parse `<file>` [--grammar build|runtime] [--format json|yaml]  - Print the parsed commands
//!   hsx build [`<file>`] [--root `<dir>`]                               - Run a build script (default: Mist.hsx)
//!   hsx load `<page>` [--host `<html>`]                                 - Load a page and print the resulting document
//!   hsx extensions list                                               - List approved extensions
//!   hsx extensions add --hsx `<f>` --js `<f>` ...                       - Submit an extension

use clap::{Arg, ArgAction, ArgMatches, Command};
use hsx::hsx::build::{build_file, BuildOptions};
use hsx::hsx::loader::DocumentLoader;
use hsx::hsx::parsing::{parse, Grammar};
use hsx::hsx::registry::{submit, AllowAll, ArtifactKind, ArtifactRegistry, LocalRegistry, Submission};
use hsx::DomSurface;
use hsx_config::{HsxConfig, Loader};
use std::path::PathBuf;

const DEFAULT_ENTRY: &str = "Mist.hsx";
const USER_CONFIG: &str = "hsx.toml";

fn cli() -> Command {
    Command::new("hsx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse, build and load hsx scripts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the defaults (default: ./hsx.toml if present)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .subcommand(
            Command::new("parse")
                .about("Print the command sequence of an hsx source")
                .arg(Arg::new("path").required(true).help("Path to the hsx source"))
                .arg(
                    Arg::new("grammar")
                        .long("grammar")
                        .short('g')
                        .value_parser(["build", "runtime"])
                        .default_value("build"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["json", "yaml"])
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Run an hsx build script")
                .arg(
                    Arg::new("path")
                        .default_value(DEFAULT_ENTRY)
                        .help("Build script to run"),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .help("Directory relative paths resolve against"),
                ),
        )
        .subcommand(
            Command::new("load")
                .about("Load an hsx page into a host document and print it")
                .arg(Arg::new("path").required(true).help("Page containing an <hsx> block"))
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Host HTML document (default: an empty page)"),
                ),
        )
        .subcommand(
            Command::new("extensions")
                .about("Manage the local extension registry")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List approved extensions"))
                .subcommand(add_command()),
        )
}

fn add_command() -> Command {
    let mut command = Command::new("add")
        .about("Submit an extension")
        .arg(Arg::new("author").long("author").help("Author name (default: Anonymous)"));
    for kind in ArtifactKind::ALL {
        command = command.arg(
            Arg::new(kind.folder())
                .long(kind.folder())
                .required(true)
                .help(format!("The extension's {} file", kind)),
        );
    }
    command
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = load_config(&matches);

    match matches.subcommand() {
        Some(("parse", sub)) => handle_parse_command(sub),
        Some(("build", sub)) => handle_build_command(sub, &config).await,
        Some(("load", sub)) => handle_load_command(sub, &config).await,
        Some(("extensions", sub)) => handle_extensions_command(sub, &config),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(matches: &ArgMatches) -> HsxConfig {
    let loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(USER_CONFIG),
    };
    let config = loader
        .build()
        .unwrap_or_else(|e| fail(format!("Configuration error: {}", e)));
    tracing::debug!(?config, "configuration loaded");
    config
}

fn read_source(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("Cannot read {}: {}", path, e)))
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches) {
    let path = required(matches, "path");
    let grammar = match required(matches, "grammar") {
        "runtime" => Grammar::Runtime,
        _ => Grammar::Build,
    };

    let output = parse(&read_source(path), grammar);
    for diagnostic in &output.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    let formatted = match required(matches, "format") {
        "yaml" => serde_yaml::to_string(&output.commands).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(&output.commands).map_err(|e| e.to_string()),
    };
    match formatted {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => fail(format!("Error formatting commands: {}", e)),
    }
}

/// Handle the build command
async fn handle_build_command(matches: &ArgMatches, config: &HsxConfig) {
    let path = required(matches, "path");
    let options = match matches.get_one::<String>("root") {
        Some(root) => BuildOptions {
            root: PathBuf::from(root),
        },
        None => config.build.clone(),
    };

    match build_file(path, options).await {
        Ok(report) => {
            println!(
                "Built {} ({} commands, {} warnings)",
                path,
                report.commands_executed,
                report.diagnostics.len()
            );
        }
        Err(e) => fail(format!("Build failed: {}", e)),
    }
}

/// Handle the load command
async fn handle_load_command(matches: &ArgMatches, config: &HsxConfig) {
    let path = required(matches, "path");
    let surface = match matches.get_one::<String>("host") {
        Some(host) => DomSurface::from_html(&read_source(host)),
        None => DomSurface::new(),
    };

    let loader = DocumentLoader::new(config.loader.clone());
    match loader.load(path, &surface).await {
        Ok(mut outcome) => {
            for failure in &outcome.report.failures {
                eprintln!("error: line {}: {}", failure.line, failure.message);
            }
            outcome.state.dispose();
            println!("{}", surface.to_html());
        }
        Err(e) => fail(format!("Load failed: {}", e)),
    }
}

/// Handle the extensions command
fn handle_extensions_command(matches: &ArgMatches, config: &HsxConfig) {
    let mut registry = LocalRegistry::new(&config.registry.path);

    match matches.subcommand() {
        Some(("list", _)) => {
            let approved = registry
                .list_approved()
                .unwrap_or_else(|e| fail(format!("Registry error: {}", e)));
            if approved.is_empty() {
                println!("No approved extensions.");
            }
            for record in approved {
                println!("{} by {} (#{})", record.name, record.author, record.id);
                for (kind, stored) in &record.files {
                    println!("    {}: {}", kind, registry.resolve(stored).display());
                }
            }
        }
        Some(("add", sub)) => {
            let mut submission = Submission::new(sub.get_one::<String>("author").cloned());
            for kind in ArtifactKind::ALL {
                submission = submission.file(kind, required(sub, kind.folder()));
            }
            let record = submit(&mut registry, &AllowAll, &submission)
                .unwrap_or_else(|e| fail(format!("Registry error: {}", e)));
            println!("Recorded {} (#{}, {:?})", record.name, record.id, record.status);
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("missing argument: {}", id)))
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
