use super::error::DemoError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DemoCommand {
    Probe { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    ClickNamed { name: String, relative: Option<(f32, f32)> },
    ClickBounds { name: String },
    ClickLowerHalf,
    ClickUpperHalf,
    Despawn { name: String },
    WaitGone { name: String, timeout_seconds: Option<f32> },
    WaitTicks { ticks: u32 },
    Stats,
}

/// Name, argument schema and help line of every script command, in help order.
pub(crate) const COMMAND_HELP: &[(&str, &str, &str)] = &[
    ("probe", "<x:f32> <y:f32>", "List ranked hit candidates at a point"),
    ("click", "<x:f32> <y:f32>", "Simulate a click at a point"),
    (
        "click_named",
        "<name> [rel_x:f32 rel_y:f32]",
        "Click an element's rectangle (center by default)",
    ),
    ("click_bounds", "<name>", "Click where an element's bounds project"),
    ("click_lower_half", "", "Click the middle of the lower screen half"),
    ("click_upper_half", "", "Click the middle of the upper screen half"),
    ("despawn", "<name>", "Despawn an element by name"),
    (
        "wait_gone",
        "<name> [timeout_seconds:f32]",
        "Wait until no element with that name is active",
    ),
    ("wait_ticks", "<ticks:u32>", "Let ticks pass"),
    ("stats", "", "Print driver counters"),
];

pub(crate) fn parse_script_commands(content: &str) -> Result<Vec<DemoCommand>, DemoError> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_command_line)
        .collect()
}

pub(crate) fn parse_command_line(line: &str) -> Result<DemoCommand, DemoError> {
    let tokens = tokenize_line(line).map_err(|reason| DemoError::Command {
        reason,
        usage: "help".to_string(),
    })?;
    let Some((name, args)) = tokens.split_first() else {
        return Err(DemoError::Command {
            reason: "empty command".to_string(),
            usage: "help".to_string(),
        });
    };

    match name.to_ascii_lowercase().as_str() {
        "probe" => {
            let (x, y) = parse_point(args, "probe <x> <y>")?;
            Ok(DemoCommand::Probe { x, y })
        }
        "click" => {
            let (x, y) = parse_point(args, "click <x> <y>")?;
            Ok(DemoCommand::Click { x, y })
        }
        "click_named" => parse_click_named(args),
        "click_bounds" => {
            let name = require_single(args, "click_bounds <name>")?;
            Ok(DemoCommand::ClickBounds { name })
        }
        "click_lower_half" => {
            require_no_args(args, "click_lower_half")?;
            Ok(DemoCommand::ClickLowerHalf)
        }
        "click_upper_half" => {
            require_no_args(args, "click_upper_half")?;
            Ok(DemoCommand::ClickUpperHalf)
        }
        "despawn" => {
            let name = require_single(args, "despawn <name>")?;
            Ok(DemoCommand::Despawn { name })
        }
        "wait_gone" => parse_wait_gone(args),
        "wait_ticks" => {
            let usage = "wait_ticks <ticks>";
            let raw = require_single(args, usage)?;
            let ticks = parse_arg::<u32>(&raw, "tick count", "u32", usage)?;
            Ok(DemoCommand::WaitTicks { ticks })
        }
        "stats" => {
            require_no_args(args, "stats")?;
            Ok(DemoCommand::Stats)
        }
        _ => Err(DemoError::Command {
            reason: format!("unknown command '{name}'"),
            usage: "help".to_string(),
        }),
    }
}

fn parse_click_named(args: &[String]) -> Result<DemoCommand, DemoError> {
    let usage = "click_named <name> [rel_x rel_y]";
    match args {
        [name] => Ok(DemoCommand::ClickNamed {
            name: name.clone(),
            relative: None,
        }),
        [name, rel_x, rel_y] => {
            let rel_x = parse_arg::<f32>(rel_x, "relative x", "f32", usage)?;
            let rel_y = parse_arg::<f32>(rel_y, "relative y", "f32", usage)?;
            Ok(DemoCommand::ClickNamed {
                name: name.clone(),
                relative: Some((rel_x, rel_y)),
            })
        }
        _ => Err(DemoError::Command {
            reason: "expected <name> or <name> <rel_x> <rel_y>".to_string(),
            usage: usage.to_string(),
        }),
    }
}

fn parse_wait_gone(args: &[String]) -> Result<DemoCommand, DemoError> {
    let usage = "wait_gone <name> [timeout_seconds]";
    match args {
        [name] => Ok(DemoCommand::WaitGone {
            name: name.clone(),
            timeout_seconds: None,
        }),
        [name, timeout] => {
            let timeout = parse_arg::<f32>(timeout, "timeout", "f32", usage)?;
            if !timeout.is_finite() || timeout < 0.0 {
                return Err(DemoError::Command {
                    reason: format!("invalid timeout '{timeout}' (expected >= 0)"),
                    usage: usage.to_string(),
                });
            }
            Ok(DemoCommand::WaitGone {
                name: name.clone(),
                timeout_seconds: Some(timeout),
            })
        }
        _ => Err(DemoError::Command {
            reason: "expected <name> or <name> <timeout_seconds>".to_string(),
            usage: usage.to_string(),
        }),
    }
}

fn parse_point(args: &[String], usage: &str) -> Result<(f32, f32), DemoError> {
    let [x, y] = args else {
        return Err(DemoError::Command {
            reason: "expected exactly two arguments <x> <y>".to_string(),
            usage: usage.to_string(),
        });
    };
    let x = parse_arg::<f32>(x, "x coordinate", "f32", usage)?;
    let y = parse_arg::<f32>(y, "y coordinate", "f32", usage)?;
    Ok((x, y))
}

fn parse_arg<T: std::str::FromStr>(
    raw: &str,
    what: &str,
    expected: &str,
    usage: &str,
) -> Result<T, DemoError> {
    raw.parse::<T>().map_err(|_| DemoError::Command {
        reason: format!("invalid {what} '{raw}' (expected {expected})"),
        usage: usage.to_string(),
    })
}

fn require_single(args: &[String], usage: &str) -> Result<String, DemoError> {
    match args {
        [value] => Ok(value.clone()),
        _ => Err(DemoError::Command {
            reason: "expected exactly one argument".to_string(),
            usage: usage.to_string(),
        }),
    }
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), DemoError> {
    if args.is_empty() {
        return Ok(());
    }
    Err(DemoError::Command {
        reason: "unexpected arguments".to_string(),
        usage: usage.to_string(),
    })
}

/// Splits on whitespace; double quotes group a name containing spaces.
fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending_token {
                    tokens.push(std::mem::take(&mut current));
                    pending_token = false;
                }
            }
            _ => {
                current.push(ch);
                pending_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending_token {
        tokens.push(current);
    }
    Ok(tokens)
}
