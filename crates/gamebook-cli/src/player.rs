//! The read-render loop.
//!
//! Transitions are played back in real time: each one becomes a timer in a
//! `JoinSet` and the session is told when it fires. Input is only read once
//! the scene has settled.

use std::io::{self, BufRead};

use gamebook_core::stage::Prompt;
use gamebook_engine::StorySession;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::error::CliError;
use crate::render::render;

const HELP: &str = "Enter a link number, or: save, load, back, restart, help, quit.";

/// One line of reader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Follow(usize),
    Save,
    Load,
    Back,
    Restart,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parses a line. Blank lines are `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_ascii_lowercase();
        if word.is_empty() {
            return None;
        }
        if let Ok(number) = word.parse::<usize>() {
            return Some(Self::Follow(number));
        }
        Some(match word.as_str() {
            "s" | "save" => Self::Save,
            "l" | "load" => Self::Load,
            "b" | "back" => Self::Back,
            "r" | "restart" => Self::Restart,
            "h" | "?" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(word),
        })
    }
}

/// Plays `session` until the reader quits or input ends.
///
/// # Errors
///
/// Returns `CliError::Io` if input cannot be read and `CliError::Task` if a
/// timer task fails.
pub async fn play(session: &mut StorySession) -> Result<(), CliError> {
    println!("{HELP}");
    loop {
        animate(session).await?;
        let page = render(session);
        println!("\n{}\n", page.text);

        let Some(line) = read_line().await? else {
            debug!("input closed");
            return Ok(());
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Follow(number) => {
                match number.checked_sub(1).and_then(|index| page.links.get(index)) {
                    Some(link) => {
                        session.click(*link);
                    }
                    None => println!("There is no link {number}."),
                }
            }
            Command::Save => session.save(false),
            Command::Load => session.load(false),
            Command::Back => session.back(None),
            Command::Restart => session.reset(None, false),
            Command::Help => println!("{HELP}"),
            Command::Quit => {
                if !session.settings().warn_when_leaving || session.confirm(Prompt::LeaveStory) {
                    return Ok(());
                }
            }
            Command::Unknown(word) => println!("Unknown command `{word}`. {HELP}"),
        }
    }
}

/// Waits out every transition the session emits until it settles.
async fn animate(session: &mut StorySession) -> Result<(), CliError> {
    let mut timers = JoinSet::new();
    loop {
        for transition in session.drain_transitions() {
            trace!(?transition.kind, ?transition.duration, "playing transition");
            timers.spawn(async move {
                tokio::time::sleep(transition.duration).await;
                transition.ticket
            });
        }
        let Some(finished) = timers.join_next().await else {
            return Ok(());
        };
        session.finish(finished?);
    }
}

async fn read_line() -> Result<Option<String>, CliError> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map(|read| (read > 0).then_some(line))
    })
    .await??;
    Ok(line)
}
