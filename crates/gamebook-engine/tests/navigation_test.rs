//! Integration tests for starting, going to scenes and going back.

mod common;

use common::{link, passage, start, start_session, start_with};
use gamebook_core::StoryError;
use gamebook_core::stage::{Notice, Prompt};
use gamebook_document::{Document, Fragment};
use gamebook_engine::domain::canon::story_document;
use gamebook_test_support::{MemorySaveStore, MockRng, ScriptedStage, SequenceRng};

fn cave() -> Vec<Fragment> {
    vec![
        passage("intro").child("Prologue").into(),
        passage("start")
            .child("You wake in a cave.")
            .child(link("Crawl forward", "data-click", "tunnel"))
            .child(link("Dig", "data-click", "nowhere"))
            .into(),
        passage("tunnel")
            .child("A narrow tunnel.")
            .child(link("Retreat", "data-click-back", ""))
            .child(link("Press on", "data-click", "lake"))
            .into(),
        passage("lake")
            .child("An underground lake.")
            .child(link("Return", "data-click-back", ""))
            .into(),
    ]
}

#[test]
fn test_story_starts_at_start_template() {
    let harness = start(cave());

    assert_eq!(harness.session.bookmarks().selectors(), vec![".start"]);
    assert!(harness.visible_text().contains("You wake in a cave."));
    assert!(!harness.visible_text().contains("Prologue"));
    assert!(!harness.session.is_locked());
}

#[test]
fn test_story_without_start_class_starts_at_first_template() {
    let harness = start(vec![
        passage("first").child("One").into(),
        passage("second").child("Two").into(),
    ]);

    assert_eq!(harness.visible_text(), "One");
    assert_eq!(harness.session.bookmarks().selectors(), vec![":first"]);
}

#[test]
fn test_empty_story_notifies_reader() {
    // Arrange
    let stage = ScriptedStage::new();

    // Act
    let result = start_session(
        story_document(&[]),
        stage.clone(),
        Box::new(MemorySaveStore::new()),
        Box::new(MockRng),
    );

    // Assert
    assert!(matches!(result, Err(StoryError::EmptyStory)));
    assert_eq!(stage.notices(), vec![Notice::StoryEmpty]);
}

#[test]
fn test_document_without_canon_is_rejected() {
    let result = start_session(
        Document::new(),
        ScriptedStage::new(),
        Box::new(MemorySaveStore::new()),
        Box::new(MockRng),
    );

    assert!(matches!(result, Err(StoryError::MissingCanon)));
}

#[test]
fn test_goto_replaces_scene_and_records_bookmark() {
    let mut harness = start(cave());

    harness.click("Crawl forward");

    assert_eq!(harness.visible_text(), "A narrow tunnel.RetreatPress on");
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start", "tunnel"]);
    assert_eq!(harness.link_labels(), vec!["Retreat", "Press on"]);
}

#[test]
fn test_goto_unwritten_scene_notifies_and_keeps_scene() {
    let mut harness = start(cave());

    harness.click("Dig");

    assert_eq!(harness.stage.notices(), vec![Notice::NotWrittenYet]);
    assert!(harness.visible_text().contains("You wake in a cave."));
    assert_eq!(harness.session.bookmarks().len(), 1);
}

#[test]
fn test_back_returns_to_previous_scene() {
    // Arrange
    let mut harness = start(cave());
    harness.click("Crawl forward");
    harness.click("Press on");

    // Act
    harness.click("Return");

    // Assert
    assert!(harness.visible_text().starts_with("A narrow tunnel."));
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start", "tunnel"]);

    harness.click("Retreat");
    assert!(harness.visible_text().starts_with("You wake in a cave."));
    assert_eq!(harness.session.bookmarks().len(), 1);
}

#[test]
fn test_back_at_start_notifies_reader() {
    let mut harness = start(vec![
        passage("start")
            .child(link("Back", "data-click-back", ""))
            .into(),
    ]);

    harness.click("Back");

    assert_eq!(harness.stage.notices(), vec![Notice::CannotGoBack]);
}

#[test]
fn test_back_at_start_uses_fallback() {
    let mut harness = start(vec![
        passage("start")
            .child(link("Leave", "data-click-back", "outside"))
            .into(),
        passage("outside").child("Daylight.").into(),
    ]);

    harness.click("Leave");

    assert_eq!(harness.visible_text(), "Daylight.");
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start", "outside"]);
}

#[test]
fn test_back_skips_templates_without_bookmarks() {
    // Arrange
    let mut harness = start(vec![
        passage("start").child(link("Map", "data-click", "map")).into(),
        passage("map")
            .attr("data-nobookmark", "")
            .child(link("Close", "data-click", "hall"))
            .into(),
        passage("hall")
            .child("Hall.")
            .child(link("Back", "data-click-back", ""))
            .into(),
    ]);
    harness.click("Map");
    harness.click("Close");
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start", "", "hall"]);

    // Act
    harness.click("Back");

    // Assert
    assert_eq!(harness.visible_text(), "Map");
    assert_eq!(harness.session.bookmarks().len(), 1);
}

#[test]
fn test_revisiting_current_template_records_one_bookmark() {
    let mut harness = start(vec![
        passage("start")
            .child(link("Wait", "data-click", "start"))
            .into(),
    ]);

    harness.click("Wait");
    harness.click("Wait");

    assert_eq!(harness.session.bookmarks().len(), 1);
}

#[test]
fn test_random_goto_picks_drawn_alternative() {
    let mut harness = start_with(
        vec![
            passage("start").child(link("Roll", "data-click", "a;b;c")).into(),
            passage("a").child("A").into(),
            passage("b").child("B").into(),
            passage("c").child("C").into(),
        ],
        ScriptedStage::new(),
        MemorySaveStore::new(),
        SequenceRng::new(vec![2]),
    );

    harness.click("Roll");

    assert_eq!(harness.visible_text(), "C");
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start", "c"]);
}

#[test]
fn test_blank_alternative_is_not_written_yet() {
    let mut harness = start_with(
        vec![
            passage("start").child(link("Roll", "data-click", "a;")).into(),
            passage("a").child("A").into(),
        ],
        ScriptedStage::new(),
        MemorySaveStore::new(),
        SequenceRng::new(vec![1]),
    );

    harness.click("Roll");

    assert_eq!(harness.stage.notices(), vec![Notice::NotWrittenYet]);
    assert_eq!(harness.visible_text(), "Roll");
}

#[test]
fn test_selector_indirection_through_variable() {
    let mut harness = start(vec![
        passage("start")
            .child(
                link("Go", "data-click", "Variables.exit").attr("data-click-setvar", "exit; cellar"),
            )
            .into(),
        passage("cellar").child("Cellar.").into(),
    ]);

    harness.click("Go");

    assert_eq!(harness.visible_text(), "Cellar.");
}

#[test]
fn test_switch_follows_condition() {
    let mut harness = start(vec![
        passage("start")
            .child(link(
                "Open",
                "data-click-switch",
                "Variables.key; unlocked; locked",
            ))
            .child(link("Take key", "data-click-setvar", "key; true"))
            .into(),
        passage("unlocked").child("The door swings open.").into(),
        passage("locked")
            .child("Locked.")
            .child(link("Back", "data-click-back", ""))
            .into(),
    ]);

    harness.click("Open");
    assert!(harness.visible_text().starts_with("Locked."));
    harness.click("Back");
    harness.click("Take key");
    harness.click("Open");

    assert_eq!(harness.visible_text(), "The door swings open.");
}

#[test]
fn test_clicks_are_ignored_while_scene_changes() {
    // Arrange
    let mut harness = start(cave());
    assert!(harness.press("Crawl forward"));

    // Act
    let reacted = harness.press("Dig");

    // Assert
    assert!(!reacted);
    assert!(harness.session.is_paused());
    harness.session.settle();
    assert!(harness.stage.notices().is_empty());
    assert!(harness.visible_text().starts_with("A narrow tunnel."));
}

#[test]
fn test_reset_asks_then_restarts() {
    // Arrange
    let mut harness = start(vec![
        passage("start")
            .child("Start.")
            .child(link("Next", "data-click", "next").attr("data-click-setvar", "gold; 3"))
            .into(),
        passage("next")
            .child(link("Restart", "data-click-resetstory", ""))
            .into(),
    ]);
    harness.click("Next");

    // Act
    harness.click("Restart");

    // Assert
    assert_eq!(harness.stage.prompts(), vec![Prompt::RestartStory]);
    assert!(harness.session.variables().is_empty());
    assert!(harness.visible_text().starts_with("Start."));
    assert_eq!(harness.session.bookmarks().selectors(), vec![".start"]);
}

#[test]
fn test_declined_reset_changes_nothing() {
    let mut harness = start_with(
        vec![
            passage("start")
                .child(link("Gold", "data-click-setvar", "gold; 3"))
                .child(link("Restart", "data-click-resetstory", ""))
                .into(),
        ],
        ScriptedStage::new().declining(),
        MemorySaveStore::new(),
        MockRng,
    );
    harness.click("Gold");

    harness.click("Restart");

    assert_eq!(harness.session.variables().len(), 1);
}

#[test]
fn test_quiet_reset_to_alternate_start() {
    let mut harness = start(vec![
        passage("start")
            .child(link("Epilogue", "data-click-resetstory", "epilogue; quiet"))
            .into(),
        passage("epilogue").child("The end.").into(),
    ]);

    harness.click("Epilogue");

    assert!(harness.stage.prompts().is_empty());
    assert_eq!(harness.visible_text(), "The end.");
    assert_eq!(harness.session.bookmarks().selectors(), vec!["epilogue"]);
}
