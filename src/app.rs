use crate::config::CursorConfig;
use crate::cursor::{
    is_merge_in_progress, merge_position, resolve_lower_bound, resolve_upper_bound, Cursor,
    PositionCursor,
};
use crate::progress::SegmentProgress;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const USAGE: &str = "usage: ceptra-cursor [--config <path>] inspect <cursor.json>\n       \
                     ceptra-cursor [--config <path>] advance <cursor.json> <index>...";

/// CLI entrypoint: parses process arguments and prints the command output.
pub fn run() -> Result<()> {
    let output = execute(env::args().skip(1))?;
    print!("{output}");
    Ok(())
}

/// Runs one CLI invocation and returns what it would print.
pub fn execute<I>(args: I) -> Result<String>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path = None;
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(format!("{USAGE}\n")),
            _ => positional.push(arg),
        }
    }

    let config = match &config_path {
        Some(path) => CursorConfig::load(path)?,
        None => CursorConfig::default(),
    };

    let mut positional = positional.into_iter();
    let command = positional
        .next()
        .ok_or_else(|| anyhow!("missing command\n{USAGE}"))?;
    let cursor_path = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{command} requires a cursor file"))?;
    let cursor = read_cursor(&cursor_path)?;

    match command.as_str() {
        "inspect" => inspect(cursor.as_ref()),
        "advance" => {
            let indices = positional
                .map(|raw| {
                    raw.parse::<u64>()
                        .with_context(|| format!("invalid sequence index {raw:?}"))
                })
                .collect::<Result<Vec<_>>>()?;
            advance_through(cursor, &indices, &config)
        }
        other => Err(anyhow!("unknown command: {other}\n{USAGE}")),
    }
}

fn read_cursor(path: &Path) -> Result<Option<Cursor>> {
    let payload = fs::read_to_string(path)
        .with_context(|| format!("failed to read cursor file {}", path.display()))?;
    serde_json::from_str(&payload)
        .with_context(|| format!("failed to parse cursor file {}", path.display()))
}

fn inspect(cursor: Option<&Cursor>) -> Result<String> {
    let mut out = String::new();
    let kind = cursor.map_or("none", |cursor| cursor.kind().as_str());
    writeln!(out, "kind: {kind}")?;
    writeln!(out, "merge_in_progress: {}", is_merge_in_progress(cursor))?;
    writeln!(out, "lower_bound: {}", render(resolve_lower_bound(cursor)?.as_ref())?)?;
    writeln!(out, "upper_bound: {}", render(resolve_upper_bound(cursor)?.as_ref())?)?;
    let position = cursor.and_then(|cursor| cursor.position());
    writeln!(out, "position: {}", render_number(position))?;
    writeln!(out, "merge_position: {}", render_number(merge_position(cursor)?))?;
    Ok(out)
}

fn advance_through(cursor: Option<Cursor>, indices: &[u64], config: &CursorConfig) -> Result<String> {
    let mut progress = SegmentProgress::new("cli", cursor, config);
    let mut out = String::new();
    for index in indices {
        let outcome = progress.advance(&Cursor::sequence(*index), now_ms())?;
        writeln!(out, "{index}: {outcome:?}")?;
    }
    writeln!(out, "cursor: {}", render(progress.cursor())?)?;
    Ok(out)
}

fn render(cursor: Option<&Cursor>) -> Result<String> {
    match cursor {
        Some(cursor) => Ok(cursor.to_json()?),
        None => Ok("null".to_string()),
    }
}

fn render_number(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}
