//! Classification of game server console output.
//!
//! Every line is matched against a fixed, ordered table of patterns. The
//! first pattern that matches decides what the line means. All patterns are
//! anchored on the vanilla log prefix, so a change in the upstream log format
//! makes lines fall through to plain [`ConsoleEvent::Log`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Log(String),
    Message {
        relay: bool,
        author: String,
        text: String,
    },
    PlayerDeath {
        username: String,
        message: String,
    },
    TeamsListed(Vec<String>),
    TeamMembers {
        team: String,
        members: Vec<String>,
    },
    PlayerJoined(String),
    PlayerLeft(String),
    PlayerAchievement {
        username: String,
        achievement: String,
    },
    ServerLoaded,
}

type Handler = fn(&Captures) -> Vec<ConsoleEvent>;

const TIME: &str = r"^\[[0-9]{2}:[0-9]{2}:[0-9]{2}\] \[Server thread/INFO\]";
const NAME: &str = r"[A-Za-z0-9_\.]+";

fn pattern(source: &str, rest: &str) -> Regex {
    Regex::new(&format!(r"{TIME} \[{source}\]: {rest}\r*$")).unwrap()
}

static PATTERNS: LazyLock<Vec<(Regex, Handler)>> = LazyLock::new(|| {
    vec![
        (pattern("minecraft/MinecraftServer", &format!(r"(?: \[Not Secure\])* <({NAME})> (.*)")), chat_message),
        (pattern("co.gr.mc.MCTGMod/", &format!("\x1bCHAT\x1b({NAME})\x1b(.*)")), mod_chat_message),
        (pattern("co.gr.mc.MCTGMod/", &format!("\x1bDEATH\x1b({NAME})\x1b(.*)")), mod_death_message),
        (pattern("minecraft/MinecraftServer", r"There are ([0-9]+) team\(s\): (.+)"), teams_listed),
        (pattern("minecraft/MinecraftServer", r"Team (.+) has ([0-9]+) member\(s\): (.+)"), team_members),
        (pattern("minecraft/MinecraftServer", &format!("({NAME}) joined the game")), player_joined),
        (pattern("minecraft/MinecraftServer", &format!("({NAME}) left the game")), player_left),
        (pattern("minecraft/MinecraftServer", &format!(r"({NAME}) has made the advancement \[(.*)\]")), achievement),
        (pattern("minecraft/DedicatedServer", r#"Done \([0-9]+\.[0-9]+s\)! For help, type "help""#), server_loaded),
    ]
});

fn group(caps: &Captures, index: usize) -> String {
    caps.get(index).map(|m| m.as_str().to_owned()).unwrap_or_default()
}

// Team names are printed in brackets: "[red], [blue]"
fn strip_brackets(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
        .unwrap_or(name)
        .to_owned()
}

fn chat_message(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::Message {
        relay: false,
        author: group(caps, 1),
        text: group(caps, 2),
    }]
}

fn mod_chat_message(caps: &Captures) -> Vec<ConsoleEvent> {
    let author = group(caps, 1);
    let text = group(caps, 2);
    vec![
        ConsoleEvent::Log(format!("{author}: {text}")),
        ConsoleEvent::Message { relay: true, author, text },
    ]
}

fn mod_death_message(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::PlayerDeath {
        username: group(caps, 1),
        message: group(caps, 2),
    }]
}

fn teams_listed(caps: &Captures) -> Vec<ConsoleEvent> {
    let teams = group(caps, 2).split(", ").map(strip_brackets).collect();
    vec![ConsoleEvent::TeamsListed(teams)]
}

fn team_members(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::TeamMembers {
        team: strip_brackets(&group(caps, 1)),
        members: group(caps, 3).split(", ").map(str::to_owned).collect(),
    }]
}

fn player_joined(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::PlayerJoined(group(caps, 1))]
}

fn player_left(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::PlayerLeft(group(caps, 1))]
}

fn achievement(caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::PlayerAchievement {
        username: group(caps, 1),
        achievement: group(caps, 2),
    }]
}

fn server_loaded(_caps: &Captures) -> Vec<ConsoleEvent> {
    vec![ConsoleEvent::ServerLoaded]
}

/// Turn one console line into events. The first event is always the line
/// itself as [`ConsoleEvent::Log`].
pub fn parse_line(line: &str) -> Vec<ConsoleEvent> {
    let mut events = vec![ConsoleEvent::Log(line.to_owned())];
    for (regex, handler) in PATTERNS.iter() {
        if let Some(caps) = regex.captures(line) {
            events.extend(handler(&caps));
            break;
        }
    }
    events
}
