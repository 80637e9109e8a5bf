//! Line-oriented console commands used by the binary to drive the engine.
//!
//! ```text
//! list | status | get <id> | quit
//! add <moisture> <threshold> <name...>
//! threshold <id> <n>
//! valve <id> on|off|toggle
//! moisture <id> <n>
//! nudge <id> <+n|-n>
//! delete <id>
//! ```

use crate::plant::{NewPlant, PlantId, ValveStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Status,
    Get(PlantId),
    Add(NewPlant),
    Threshold(PlantId, i32),
    Valve(PlantId, ValveAction),
    Moisture(PlantId, i32),
    Nudge(PlantId, i32),
    Delete(PlantId),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveAction {
    Set(ValveStatus),
    Toggle,
}

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let cmd = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("list" | "ls", []) => Command::List,
        ("status", []) => Command::Status,
        ("quit" | "exit", []) => Command::Quit,
        ("get", [id]) => Command::Get(parse_id(id)?),
        ("delete" | "rm", [id]) => Command::Delete(parse_id(id)?),
        ("threshold", [id, n]) => Command::Threshold(parse_id(id)?, parse_int(n)?),
        ("moisture", [id, n]) => Command::Moisture(parse_id(id)?, parse_int(n)?),
        ("nudge", [id, n]) => Command::Nudge(parse_id(id)?, parse_int(n)?),
        ("valve", [id, action]) => {
            let action = if action.eq_ignore_ascii_case("toggle") {
                ValveAction::Toggle
            } else {
                ValveAction::Set(parse_valve_command(action)?)
            };
            Command::Valve(parse_id(id)?, action)
        }
        ("add", [moisture, threshold, name @ ..]) if !name.is_empty() => Command::Add(NewPlant {
            name: name.join(" "),
            moisture: parse_int(moisture)?,
            threshold: parse_int(threshold)?,
        }),
        (verb, _) => return Err(format!("unknown or malformed command '{verb}'")),
    };
    Ok(Some(cmd))
}

/// Parse an "on"/"off" word (case-insensitive, trims whitespace).
pub fn parse_valve_command(word: &str) -> Result<ValveStatus, String> {
    let word = word.trim();
    if word.eq_ignore_ascii_case("on") {
        Ok(ValveStatus::On)
    } else if word.eq_ignore_ascii_case("off") {
        Ok(ValveStatus::Off)
    } else {
        Err(format!("unknown valve command '{word}'"))
    }
}

fn parse_id(s: &str) -> Result<PlantId, String> {
    s.trim_start_matches('#')
        .parse()
        .map(PlantId)
        .map_err(|_| format!("invalid plant id '{s}'"))
}

fn parse_int(s: &str) -> Result<i32, String> {
    s.trim_start_matches('+')
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("invalid number '{s}'"))
}

// ===========================================================================
// Tests
// ===========================================================================
