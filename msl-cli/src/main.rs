//! MSL CLI - Command line interface
//!
//! Checks, inspects and dry-runs macro scripts. `run` drives a console
//! device that prints every primitive instead of touching the OS.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, Level};

mod config;
mod logging;
mod platform;

use crate::config::{load_run_config, LogConfig};
use crate::logging::LogFormat;
use crate::platform::{print_error_with_source, ConsoleDevice};
use msl_api::{init_config, Engine, MslError, RunConfig};
use msl_core::Variables;

const TARGET: &str = "msl::cli";

#[derive(Parser)]
#[command(name = "msl", about = "Macro Scripting Language tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON run configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Global log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    /// Per-phase log level, e.g. `parser=debug` (repeatable)
    #[arg(long = "log", global = true, value_name = "PHASE=LEVEL")]
    log_overrides: Vec<String>,

    #[arg(long, global = true, value_enum, default_value = "compact")]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a script without running it
    Check(ScriptArg),
    /// Dump the token stream
    Tokens(ScriptArg),
    /// Print the parsed tree
    Tree {
        #[command(flatten)]
        script: ScriptArg,
        /// One-line form instead of the indented tree
        #[arg(long)]
        compact: bool,
        /// Canonical script text instead of a tree
        #[arg(long, conflicts_with = "compact")]
        format: bool,
    },
    /// Node counts and dependencies
    Stats(ScriptArg),
    /// Run a script against the console device
    Run(RunArgs),
}

#[derive(Args)]
struct ScriptArg {
    /// Script file, `-` for stdin
    file: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    script: ScriptArg,

    /// Literal variable binding
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, String)>,

    /// Variable bound to a script fragment
    #[arg(long = "var-script", value_name = "NAME=SCRIPT", value_parser = parse_binding)]
    var_scripts: Vec<(String, String)>,

    /// Parse only, do not execute
    #[arg(long)]
    dry_run: bool,

    /// Log the tree before running
    #[arg(long)]
    show_tree: bool,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(format!("missing variable name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::with_global(cli.log_level);
    for directive in &cli.log_overrides {
        if let Err(e) = log_config.apply_override(directive) {
            fail(&e);
        }
    }
    if let Err(e) = logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_ref()) {
        fail(&e.to_string());
    }

    let run_config = match &cli.config {
        Some(path) => load_run_config(path).unwrap_or_else(|e| fail(&e)),
        None => RunConfig::default(),
    };

    let code = match &cli.command {
        Command::Check(arg) => handle_check(&read_source(&arg.file), cli.json),
        Command::Tokens(arg) => handle_tokens(&read_source(&arg.file), cli.json),
        Command::Tree {
            script,
            compact,
            format,
        } => handle_tree(&read_source(&script.file), *compact, *format),
        Command::Stats(arg) => handle_stats(&read_source(&arg.file), cli.json),
        Command::Run(args) => handle_run(args, run_config, cli.json),
    };
    process::exit(code);
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(2);
}

fn read_source(path: &Path) -> String {
    let result = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    };
    result.unwrap_or_else(|e| fail(&format!("Cannot read '{}': {}", path.display(), e)))
}

/// Report an error and return the exit code
fn report(e: &MslError, source: &str, json: bool) -> i32 {
    if json {
        print_json(&e.to_report());
    } else {
        print_error_with_source(e, source);
    }
    1
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(&format!("Cannot serialize output: {e}")),
    }
}

fn handle_check(source: &str, json: bool) -> i32 {
    match msl_api::check(source) {
        Ok(output) => {
            if json {
                print_json(&output);
            } else {
                println!("ok: {} tokens, {} nodes", output.tokens, output.nodes);
            }
            0
        }
        Err(e) => report(&e, source, json),
    }
}

fn handle_tokens(source: &str, json: bool) -> i32 {
    let tokens = msl_core::tokenize(source);
    let diagnostics = msl_core::validate(&tokens);
    if json {
        print_json(&tokens);
    } else {
        for token in &tokens {
            println!(
                "{:>4}:{:<4} {:<12} {}",
                token.line(),
                token.column(),
                format!("{:?}", token.kind),
                token.text
            );
        }
    }
    if diagnostics.is_empty() {
        0
    } else {
        report(&MslError::Lexer(diagnostics), source, json)
    }
}

fn handle_tree(source: &str, compact: bool, format: bool) -> i32 {
    match msl_api::parse(source) {
        Ok(ast) => {
            if format {
                println!("{}", ast.to_script());
            } else if compact {
                println!("{ast}");
            } else {
                println!("{}", ast.tree_string());
            }
            0
        }
        Err(e) => report(&e, source, false),
    }
}

fn handle_stats(source: &str, json: bool) -> i32 {
    let stats = match msl_api::stats(source) {
        Ok(stats) => stats,
        Err(e) => return report(&e, source, json),
    };
    if json {
        print_json(&stats);
        return 0;
    }

    println!("nodes: {} (max depth {})", stats.counts.total, stats.counts.max_depth);
    for (kind, count) in &stats.counts.counts {
        println!("  {kind:<14} {count}");
    }
    let deps = &stats.dependencies;
    let keys: Vec<&str> = deps.keys.iter().map(String::as_str).collect();
    let vars: Vec<String> = deps.variables.iter().map(|v| format!("${v}")).collect();
    println!("keys: {}", keys.join(", "));
    if !vars.is_empty() {
        println!("variables: {}", vars.join(", "));
    }
    println!(
        "parallel: {}, continuous: {}, mouse: {}, wheel: {}",
        deps.uses_parallel, deps.uses_continuous, deps.uses_mouse, deps.uses_wheel
    );
    0
}

fn handle_run(args: &RunArgs, mut config: RunConfig, json: bool) -> i32 {
    let source = read_source(&args.script.file);
    config.dry_run |= args.dry_run;
    config.show_tree |= args.show_tree;

    let mut variables = Variables::new();
    for (name, value) in &args.vars {
        variables.insert_literal(name.as_str(), value.as_str());
    }
    for (name, script) in &args.var_scripts {
        if let Err(e) = variables.insert_script(name.as_str(), script) {
            eprintln!("in --var-script {name}:");
            return report(&MslError::Parser(e), script, json);
        }
    }
    debug!(target: TARGET, variables = variables.len(), "bindings ready");

    if init_config(config.clone()).is_err() {
        debug!(target: TARGET, "global config already set");
    }

    let engine = Engine::new(Arc::new(ConsoleDevice::stdout()), config);
    let output = match engine.run(&source, variables) {
        Ok(output) => output,
        Err(e) => return report(&e, &source, json),
    };

    let Some(result) = &output.result else {
        if !json {
            println!("dry run: {} nodes parsed", output.ast.len());
        }
        return 0;
    };
    if json {
        print_json(result);
    } else if result.cancelled {
        println!("cancelled after {} actions", result.actions);
    } else {
        println!(
            "done: {} actions in {} ms",
            result.actions,
            result.elapsed.as_millis()
        );
    }

    match output.error() {
        Some(e) if !json => report(&e, &source, false),
        Some(_) => 1,
        None => 0,
    }
}
