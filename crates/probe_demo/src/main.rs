mod app;

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

use app::bootstrap::{build_session, fixtures_dir, init_tracing, DemoOptions, DEFAULT_SCRIPT_FILE};
use app::commands::{parse_command_line, parse_script_commands, DemoCommand, COMMAND_HELP};
use app::error::DemoError;
use app::runner::run_commands;

enum Invocation {
    Help,
    Run(DemoOptions, Vec<DemoCommand>),
}

fn main() -> ExitCode {
    let invocation = match parse_args(env::args().skip(1).collect()) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{}", usage_text());
            return ExitCode::from(2);
        }
    };
    let (options, commands) = match invocation {
        Invocation::Help => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Invocation::Run(options, commands) => (options, commands),
    };

    init_tracing();
    match run(&options, &commands) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "probe_demo_failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &DemoOptions, commands: &[DemoCommand]) -> Result<(), DemoError> {
    let mut session = build_session(options)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_commands(&mut session, commands, &mut out)
}

fn parse_args(args: Vec<String>) -> Result<Invocation, String> {
    if args
        .first()
        .is_some_and(|arg| arg == "-h" || arg == "--help")
    {
        return Ok(Invocation::Help);
    }

    let mut options = DemoOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--config" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --config".to_string())?;
                options.config_path = Some(PathBuf::from(value));
                index += 2;
            }
            "--layout" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --layout".to_string())?;
                options.layout_path = Some(PathBuf::from(value));
                index += 2;
            }
            _ => break,
        }
    }

    let subcommand = args.get(index).map(String::as_str);
    let rest = args.get((index + 1)..).unwrap_or_default();
    let commands = match subcommand {
        None => read_script(fixtures_dir().join(DEFAULT_SCRIPT_FILE))?,
        Some("run") => {
            if rest.is_empty() {
                return Err("run requires a command".to_string());
            }
            let line = rest
                .iter()
                .map(|arg| quote_if_needed(arg))
                .collect::<Vec<_>>()
                .join(" ");
            vec![parse_command_line(&line).map_err(|err| err.to_string())?]
        }
        Some("script") => match rest {
            [path] => read_script(PathBuf::from(path))?,
            _ => return Err("script requires exactly one file path".to_string()),
        },
        Some(other) => return Err(format!("unknown subcommand '{other}'")),
    };

    Ok(Invocation::Run(options, commands))
}

fn read_script(path: PathBuf) -> Result<Vec<DemoCommand>, String> {
    let content = fs::read_to_string(&path)
        .map_err(|error| format!("failed to read script file '{}': {error}", path.display()))?;
    parse_script_commands(&content).map_err(|err| err.to_string())
}

fn quote_if_needed(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

fn usage_text() -> String {
    let mut lines = vec![
        "probe_demo - hit-test and simulated click inspector".to_string(),
        String::new(),
        "Usage:".to_string(),
        "  probe_demo [--config <file>] [--layout <file>]".to_string(),
        "  probe_demo [--config <file>] [--layout <file>] run <command...>".to_string(),
        "  probe_demo [--config <file>] [--layout <file>] script <file>".to_string(),
        String::new(),
        "Without a subcommand the bundled overlay menu script runs.".to_string(),
        String::new(),
        "Commands:".to_string(),
    ];
    for (name, arg_schema, help) in COMMAND_HELP {
        if arg_schema.is_empty() {
            lines.push(format!("  {name} - {help}"));
        } else {
            lines.push(format!("  {name} {arg_schema} - {help}"));
        }
    }
    lines.join("\n")
}
