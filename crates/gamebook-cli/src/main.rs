//! Gamebook terminal player entry point.

use std::error::Error;
use std::path::PathBuf;

use gamebook_core::rng::StdRandom;
use gamebook_engine::{Collaborators, StorySession};
use gamebook_expression::ScriptEvaluator;
use tracing_subscriber::EnvFilter;

mod error;
mod player;
mod render;
mod stage;
mod store;
mod story;

use error::CliError;
use stage::TerminalStage;
use store::FileSaveStore;
use story::StoryFile;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they never interleave with the story.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    // Read configuration from arguments and environment.
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GAMEBOOK_STORY").ok())
        .map(PathBuf::from)
        .ok_or_else(|| {
            CliError::Config("usage: gamebook <story.yaml>, or set GAMEBOOK_STORY".into())
        })?;
    let story = StoryFile::load(&path)?;
    let settings = story.settings(|key| std::env::var(key).ok())?;
    let save_path = std::env::var("GAMEBOOK_SAVE_PATH")
        .map_or_else(|_| PathBuf::from(format!("{}.save.json", settings.story_id)), PathBuf::from);

    tracing::info!(
        story = %path.display(),
        story_id = %settings.story_id,
        save = %save_path.display(),
        "Starting gamebook player"
    );

    let mut session = StorySession::start(
        story.document(),
        settings,
        Collaborators {
            stage: Box::new(TerminalStage::new()),
            store: Box::new(FileSaveStore::new(save_path)),
            evaluator: Box::new(ScriptEvaluator),
            rng: Box::new(StdRandom::from_os()),
        },
    )?;

    player::play(&mut session).await?;

    Ok(())
}
