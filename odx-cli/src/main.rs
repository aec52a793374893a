//! Command-line interface for odx
//! This binary compiles template field lists and assembles data documents from them.
//!
//! Usage:
//!   odx compile `<fields>` [--emit `<emit>`]                  - Compile a field list and print a stage
//!   odx assemble `<fields>` `<data>` [--pretty] [--recursive] - Evaluate a template against data
//!
//! Global options: `--config <file>` layers a TOML file over the built-in defaults (and
//! `ODX_<SECTION>__<KEY>` environment variables over both), and
//! `--strict` exits with status 2 when the template or evaluation reported any problem.

mod transforms;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use odx_config::{Loader, OdxConfig};
use odx_template::odx::evaluation::{evaluate, EvaluationResult};
use odx_template::odx::expression::PathEngine;
use odx_template::odx::indirect::{AssembledDocument, DirectoryProvider, DocumentAssembler};
use odx_template::odx::loader::{load_data, TemplateLoader};
use odx_template::odx::transforms::standard::compile_pipeline;
use serde_json::{json, Value as Json};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const EXIT_FAILURE: i32 = 1;
const EXIT_DIAGNOSTICS: i32 = 2;

fn build_cli() -> Command {
    Command::new("odx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile document templates and assemble data documents from them")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .global(true)
                .help("Exit with status 2 if any diagnostic or evaluation error was reported")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("compile")
                .about("Compile a field list and print one of its stages")
                .arg(
                    Arg::new("fields")
                        .help("Path to the field list (.json, .yaml)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("emit")
                        .long("emit")
                        .short('e')
                        .help("What to print")
                        .value_parser(PossibleValuesParser::new(
                            transforms::AVAILABLE_EMITS.iter().copied(),
                        ))
                        .default_value("logic"),
                ),
        )
        .subcommand(
            Command::new("assemble")
                .about("Evaluate a template against data and print the result")
                .arg(
                    Arg::new("fields")
                        .help("Path to the field list (.json, .yaml)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("data")
                        .help("Path to the data (.json, .yaml)")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .help("Pretty-print the JSON result")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("recursive")
                        .long("recursive")
                        .short('r')
                        .help("Also assemble inserted templates, resolved next to the field list")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let config = load_config(matches.get_one::<String>("config"));
    init_logging(&config);
    let strict = matches.get_flag("strict");
    debug!(
        command = matches.subcommand_name().unwrap_or("none"),
        strict,
        "configuration loaded"
    );

    let clean = match matches.subcommand() {
        Some(("compile", sub)) => handle_compile_command(sub, &config),
        Some(("assemble", sub)) if sub.get_flag("recursive") => {
            handle_recursive_assemble_command(sub, &config).await
        }
        Some(("assemble", sub)) => handle_assemble_command(sub, &config),
        _ => {
            eprintln!("Unknown command. Run `odx --help` for usage.");
            process::exit(EXIT_FAILURE);
        }
    };

    if strict && !clean {
        process::exit(EXIT_DIAGNOSTICS);
    }
}

fn load_config(path: Option<&String>) -> OdxConfig {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        process::exit(EXIT_FAILURE);
    })
}

/// Log to stderr; RUST_LOG wins over the configured filter
fn init_logging(config: &OdxConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a String {
    matches.get_one::<String>(name).unwrap_or_else(|| {
        eprintln!("Missing argument <{}>", name);
        process::exit(EXIT_FAILURE);
    })
}

fn load_template(path: &str) -> TemplateLoader {
    TemplateLoader::from_path(path).unwrap_or_else(|e| {
        eprintln!("Cannot load template: {}", e);
        process::exit(EXIT_FAILURE);
    })
}

/// Handle the compile command; returns whether the template compiled without diagnostics
fn handle_compile_command(matches: &ArgMatches, config: &OdxConfig) -> bool {
    let fields = required(matches, "fields");
    let emit = required(matches, "emit");

    let compiled = load_template(fields)
        .with(&compile_pipeline(&config.recognizer_options()))
        .unwrap_or_else(|e| {
            eprintln!("Compile error: {}", e);
            process::exit(EXIT_FAILURE);
        });

    let output = transforms::execute_emit(&compiled, emit).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(EXIT_FAILURE);
    });
    print!("{}", output);
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }

    if emit != "diagnostics" {
        for diagnostic in &compiled.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
    !compiled.has_errors()
}

/// Handle the assemble command for a single template
fn handle_assemble_command(matches: &ArgMatches, config: &OdxConfig) -> bool {
    let fields = required(matches, "fields");
    let data_path = required(matches, "data");

    let compiled = load_template(fields)
        .with(&compile_pipeline(&config.recognizer_options()))
        .unwrap_or_else(|e| {
            eprintln!("Compile error: {}", e);
            process::exit(EXIT_FAILURE);
        });
    for diagnostic in &compiled.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let data = read_data(data_path);
    let result = evaluate(
        &compiled.logic,
        &data,
        &PathEngine,
        &config.evaluator_options(),
    );

    print_json(&result_to_json(&result), matches.get_flag("pretty"));
    !compiled.has_errors() && !result.has_errors
}

/// Handle the assemble command, following inserted templates
async fn handle_recursive_assemble_command(matches: &ArgMatches, config: &OdxConfig) -> bool {
    let fields = Path::new(required(matches, "fields"));
    let data = read_data(required(matches, "data"));

    let root = fields.parent().unwrap_or_else(|| Path::new("."));
    let target = fields
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| {
            eprintln!("Not a template file: {}", fields.display());
            process::exit(EXIT_FAILURE);
        });

    let assembler = DocumentAssembler::new(DirectoryProvider::new(root), Arc::new(PathEngine))
        .with_recognizer_options(&config.recognizer_options())
        .with_evaluator_options(config.evaluator_options())
        .with_max_indirect_depth(config.assembly.max_indirect_depth);

    let document = assembler.assemble(&target, data).await.unwrap_or_else(|e| {
        eprintln!("Assembly error: {}", e);
        process::exit(EXIT_FAILURE);
    });
    report_diagnostics(&document);

    print_json(&assembled_to_json(&document), matches.get_flag("pretty"));
    !document.has_errors()
}

fn read_data(path: &str) -> Json {
    load_data(path).unwrap_or_else(|e| {
        eprintln!("Cannot load data: {}", e);
        process::exit(EXIT_FAILURE);
    })
}

fn report_diagnostics(document: &AssembledDocument) {
    for diagnostic in &document.diagnostics {
        eprintln!("{}: {}", document.target, diagnostic);
    }
    for insert in &document.inserts {
        report_diagnostics(&insert.document);
    }
}

fn result_to_json(result: &EvaluationResult) -> Json {
    serde_json::to_value(result).unwrap_or_else(|e| {
        eprintln!("Error formatting result: {}", e);
        process::exit(EXIT_FAILURE);
    })
}

fn assembled_to_json(document: &AssembledDocument) -> Json {
    let inserts: Vec<Json> = document
        .inserts
        .iter()
        .map(|insert| {
            json!({
                "Id": insert.id,
                "ContentType": insert.content_type.as_str(),
                "KeepSections": insert.keep_sections,
                "Document": assembled_to_json(&insert.document),
            })
        })
        .collect();
    json!({
        "Target": document.target,
        "Result": result_to_json(&document.result),
        "Inserts": inserts,
    })
}

fn print_json(value: &Json, pretty: bool) {
    let formatted = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match formatted {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error formatting result: {}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}
