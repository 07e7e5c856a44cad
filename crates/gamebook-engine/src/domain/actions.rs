//! The click and load action tables.
//!
//! An element's attributes are read once into an ordered list of [`Action`]
//! records. Order follows the tables below, so an element carrying several
//! actions always runs them the same way.

use gamebook_core::value::parse_leading_integer;
use gamebook_document::{Document, NodeId};

use super::logic::{LOGIC_ELSE, LOGIC_ELSE_IF, LOGIC_IF};

/// Class that marks an element as clickable.
pub const CLICK_ACTION_CLASS: &str = "gamebook-click-action";
/// Flag that stops an element's load actions.
pub const LOAD_SKIP: &str = "data-load-skip";

pub const CLICK_RESET_STORY: &str = "data-click-resetstory";
pub const CLICK_LOAD_STORY: &str = "data-click-loadstory";
pub const CLICK_SET_VAR: &str = "data-click-setvar";
pub const CLICK_SET_RANDOM: &str = "data-click-setrandom";
pub const CLICK_ADD_TO_VAR: &str = "data-click-addtovar";
pub const CLICK_MACRO: &str = "data-click-macro";
pub const CLICK_RUN: &str = "data-click-run";
pub const CLICK_BECOME: &str = "data-click-become";
pub const CLICK_GOTO: &str = "data-click";
pub const CLICK_SWITCH: &str = "data-click-switch";
pub const CLICK_BACK: &str = "data-click-back";
pub const CLICK_PREPEND: &str = "data-click-prepend";
pub const CLICK_APPEND: &str = "data-click-append";
pub const CLICK_REPLACE: &str = "data-click-replace";
pub const CLICK_DEACTIVATE: &str = "data-click-deactivate";
pub const CLICK_REFRESH: &str = "data-click-refresh";
pub const CLICK_REMOVE: &str = "data-click-remove";
pub const CLICK_RESET_BOOKMARKS: &str = "data-click-resetbookmarks";
pub const CLICK_SAVE_STORY: &str = "data-click-savestory";

pub const LOAD_RESET_BOOKMARKS: &str = "data-load-resetbookmarks";
pub const LOAD_SET_VAR: &str = "data-load-setvar";
pub const LOAD_SET_RANDOM: &str = "data-load-setrandom";
pub const LOAD_ADD_TO_VAR: &str = "data-load-addtovar";
pub const LOAD_MACRO: &str = "data-load-macro";
pub const LOAD_RUN: &str = "data-load-run";
pub const LOAD: &str = "data-load";
pub const LOAD_VAR: &str = "data-load-var";
pub const LOAD_ARRAY: &str = "data-load-array";
pub const LOAD_EXPRESSION: &str = "data-load-expression";
pub const LOAD_SWITCH: &str = "data-load-switch";
pub const LOAD_BECOME: &str = "data-load-become";
pub const LOAD_GOTO: &str = "data-load-goto";
pub const LOAD_PREPEND: &str = "data-load-prepend";
pub const LOAD_APPEND: &str = "data-load-append";
pub const LOAD_REPLACE: &str = "data-load-replace";
pub const LOAD_DEACTIVATE: &str = "data-load-deactivate";
pub const LOAD_REFRESH: &str = "data-load-refresh";
pub const LOAD_REMOVE: &str = "data-load-remove";
pub const LOAD_SAVE_STORY: &str = "data-load-savestory";

/// Attributes that make an element part of a load pass.
pub const LOAD_PASS_ATTRIBUTES: [&str; 23] = [
    LOGIC_IF,
    LOGIC_ELSE_IF,
    LOGIC_ELSE,
    LOAD,
    LOAD_ADD_TO_VAR,
    LOAD_APPEND,
    LOAD_ARRAY,
    LOAD_BECOME,
    LOAD_DEACTIVATE,
    LOAD_EXPRESSION,
    LOAD_GOTO,
    LOAD_MACRO,
    LOAD_PREPEND,
    LOAD_REFRESH,
    LOAD_REMOVE,
    LOAD_RESET_BOOKMARKS,
    LOAD_REPLACE,
    LOAD_RUN,
    LOAD_SAVE_STORY,
    LOAD_SET_RANDOM,
    LOAD_SET_VAR,
    LOAD_SWITCH,
    LOAD_VAR,
];

/// Where an inserted clone goes relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Prepend,
    Append,
}

/// One parsed action. Selector operands are kept as written and resolved at
/// dispatch time, since variables may change between parse and use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ResetStory {
        start: Option<String>,
        quiet: bool,
    },
    LoadStory,
    SetVariable {
        name: String,
        expression: Option<String>,
        refresh: Option<String>,
    },
    SetRandom {
        name: String,
        choices: i64,
        refresh: Option<String>,
    },
    AddToVariable {
        name: String,
        amount: i64,
        refresh: Option<String>,
    },
    Macro {
        templates: Vec<String>,
    },
    Run {
        source: String,
    },
    /// Replace own contents with a clone of one of the alternatives.
    Load {
        alternatives: Vec<String>,
    },
    ShowVariable {
        name: String,
        fallback: Option<String>,
    },
    ShowList {
        name: String,
        fallback: Option<String>,
    },
    ShowExpression {
        source: String,
    },
    ShowSwitch {
        condition: String,
        when_true: String,
        when_false: String,
    },
    Become {
        alternatives: Vec<String>,
    },
    GoTo {
        alternatives: Vec<String>,
    },
    Switch {
        condition: String,
        when_true: Option<String>,
        when_false: Option<String>,
    },
    Back {
        fallback: Option<String>,
    },
    Insert {
        placement: Placement,
        template: Option<String>,
        targets: Option<String>,
        outside: bool,
    },
    Replace {
        targets: String,
        template: Option<String>,
    },
    Deactivate {
        targets: Option<String>,
    },
    /// `declared` is false when only collected refresh targets trigger it.
    Refresh {
        targets: Option<String>,
        declared: bool,
    },
    Remove {
        targets: Option<String>,
    },
    ResetBookmarks,
    SaveStory {
        quiet: bool,
    },
}

impl Action {
    /// Stable name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResetStory { .. } => "reset_story",
            Self::LoadStory => "load_story",
            Self::SetVariable { .. } => "set_variable",
            Self::SetRandom { .. } => "set_random",
            Self::AddToVariable { .. } => "add_to_variable",
            Self::Macro { .. } => "macro",
            Self::Run { .. } => "run",
            Self::Load { .. } => "load",
            Self::ShowVariable { .. } => "show_variable",
            Self::ShowList { .. } => "show_list",
            Self::ShowExpression { .. } => "show_expression",
            Self::ShowSwitch { .. } => "show_switch",
            Self::Become { .. } => "become",
            Self::GoTo { .. } => "goto",
            Self::Switch { .. } => "switch",
            Self::Back { .. } => "back",
            Self::Insert { .. } => "insert",
            Self::Replace { .. } => "replace",
            Self::Deactivate { .. } => "deactivate",
            Self::Refresh { .. } => "refresh",
            Self::Remove { .. } => "remove",
            Self::ResetBookmarks => "reset_bookmarks",
            Self::SaveStory { .. } => "save_story",
        }
    }

    /// Refresh selector collected by the variable-setting actions.
    #[must_use]
    pub fn collected_refresh(&self) -> Option<&str> {
        match self {
            Self::SetVariable { refresh, .. }
            | Self::SetRandom { refresh, .. }
            | Self::AddToVariable { refresh, .. } => refresh.as_deref(),
            _ => None,
        }
    }
}

/// `;`-delimited, trimmed, 1-based attribute parameters.
#[derive(Debug, Clone)]
struct Params<'a> {
    raw: &'a str,
    items: Vec<&'a str>,
}

impl<'a> Params<'a> {
    fn of(doc: &'a Document, node: NodeId, attribute: &str) -> Option<Self> {
        let raw = doc.attribute(node, attribute)?;
        Some(Self {
            raw,
            items: raw.split(';').map(str::trim).collect(),
        })
    }

    /// The `position`th parameter; empty parameters count as absent.
    fn get(&self, position: usize) -> Option<&'a str> {
        position
            .checked_sub(1)
            .and_then(|index| self.items.get(index))
            .copied()
            .filter(|item| !item.is_empty())
    }

    fn owned(&self, position: usize) -> Option<String> {
        self.get(position).map(str::to_owned)
    }

    fn text(&self, position: usize) -> String {
        self.get(position).unwrap_or_default().to_owned()
    }

    fn whole(&self) -> String {
        self.raw.to_owned()
    }

    /// Every parameter, blanks included, for random choice.
    fn alternatives(&self) -> Vec<String> {
        if self.raw.is_empty() {
            return Vec::new();
        }
        self.items.iter().map(|item| (*item).to_owned()).collect()
    }

    /// Every non-blank parameter.
    fn list(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| !item.is_empty())
            .map(|item| (*item).to_owned())
            .collect()
    }

    fn integer(&self, position: usize) -> Option<i64> {
        self.get(position).and_then(parse_leading_integer)
    }
}

fn variable_actions(
    doc: &Document,
    node: NodeId,
    [set_var, set_random, add_to_var]: [&str; 3],
    actions: &mut Vec<Action>,
) {
    if let Some(p) = Params::of(doc, node, set_var) {
        if let Some(name) = p.owned(1) {
            actions.push(Action::SetVariable {
                name,
                expression: p.owned(2),
                refresh: p.owned(3),
            });
        }
    }
    if let Some(p) = Params::of(doc, node, set_random) {
        if let Some(name) = p.owned(1) {
            actions.push(Action::SetRandom {
                name,
                choices: p.integer(2).unwrap_or(2),
                refresh: p.owned(3),
            });
        }
    }
    if let Some(p) = Params::of(doc, node, add_to_var) {
        if let Some(name) = p.owned(1) {
            actions.push(Action::AddToVariable {
                name,
                amount: p.integer(2).unwrap_or(1),
                refresh: p.owned(3),
            });
        }
    }
}

fn insert_action(p: &Params<'_>, placement: Placement) -> Action {
    Action::Insert {
        placement,
        template: p.owned(1),
        targets: p.owned(2),
        outside: matches!(p.get(3), Some("outside" | "out")),
    }
}

fn refresh_action(doc: &Document, node: NodeId, attribute: &str, actions: &[Action]) -> Option<Action> {
    let declared = Params::of(doc, node, attribute);
    let collected = actions.iter().any(|action| action.collected_refresh().is_some());
    if declared.is_none() && !collected {
        return None;
    }
    Some(Action::Refresh {
        targets: declared.as_ref().and_then(|p| non_blank(p.raw)),
        declared: declared.is_some(),
    })
}

/// Actions a click on `node` performs, in table order.
///
/// `data-click-switch` yields to `data-click`, and `data-click-back` yields to
/// either of them.
#[must_use]
pub fn click_actions(doc: &Document, node: NodeId) -> Vec<Action> {
    let mut actions = Vec::new();

    if let Some(p) = Params::of(doc, node, CLICK_RESET_STORY) {
        let first = p.get(1);
        let quiet = first == Some("quiet") || p.get(2) == Some("quiet");
        actions.push(Action::ResetStory {
            start: first.filter(|start| *start != "quiet").map(str::to_owned),
            quiet,
        });
    }
    if doc.has_attribute(node, CLICK_LOAD_STORY) {
        actions.push(Action::LoadStory);
    }
    variable_actions(
        doc,
        node,
        [CLICK_SET_VAR, CLICK_SET_RANDOM, CLICK_ADD_TO_VAR],
        &mut actions,
    );
    if let Some(p) = Params::of(doc, node, CLICK_MACRO) {
        actions.push(Action::Macro {
            templates: p.list(),
        });
    }
    if let Some(p) = Params::of(doc, node, CLICK_RUN) {
        actions.push(Action::Run { source: p.whole() });
    }
    if let Some(p) = Params::of(doc, node, CLICK_BECOME) {
        actions.push(Action::Become {
            alternatives: p.alternatives(),
        });
    }
    let goes_to = doc.has_attribute(node, CLICK_GOTO);
    if let Some(p) = Params::of(doc, node, CLICK_GOTO) {
        actions.push(Action::GoTo {
            alternatives: p.alternatives(),
        });
    }
    let switches = doc.has_attribute(node, CLICK_SWITCH);
    if let Some(p) = Params::of(doc, node, CLICK_SWITCH).filter(|_| !goes_to) {
        actions.push(Action::Switch {
            condition: p.text(1),
            when_true: p.owned(2),
            when_false: p.owned(3),
        });
    }
    if let Some(p) = Params::of(doc, node, CLICK_BACK).filter(|_| !goes_to && !switches) {
        actions.push(Action::Back {
            fallback: p.owned(1),
        });
    }
    if let Some(p) = Params::of(doc, node, CLICK_PREPEND) {
        actions.push(insert_action(&p, Placement::Prepend));
    }
    if let Some(p) = Params::of(doc, node, CLICK_APPEND) {
        actions.push(insert_action(&p, Placement::Append));
    }
    if let Some(p) = Params::of(doc, node, CLICK_REPLACE) {
        if let Some(targets) = p.owned(1) {
            actions.push(Action::Replace {
                targets,
                template: p.owned(2),
            });
        }
    }
    if let Some(p) = Params::of(doc, node, CLICK_DEACTIVATE) {
        actions.push(Action::Deactivate {
            targets: non_blank(p.raw),
        });
    }
    actions.extend(refresh_action(doc, node, CLICK_REFRESH, &actions));
    if let Some(p) = Params::of(doc, node, CLICK_REMOVE) {
        actions.push(Action::Remove {
            targets: non_blank(p.raw),
        });
    }
    if doc.has_attribute(node, CLICK_RESET_BOOKMARKS) {
        actions.push(Action::ResetBookmarks);
    }
    if doc.has_attribute(node, CLICK_SAVE_STORY) {
        actions.push(Action::SaveStory { quiet: false });
    }
    actions
}

/// Actions `node` performs when it loads, in table order. An element flagged
/// with `data-load-skip` performs none.
#[must_use]
pub fn load_actions(doc: &Document, node: NodeId) -> Vec<Action> {
    let mut actions = Vec::new();
    if doc.has_attribute(node, LOAD_SKIP) {
        return actions;
    }

    if doc.has_attribute(node, LOAD_RESET_BOOKMARKS) {
        actions.push(Action::ResetBookmarks);
    }
    variable_actions(
        doc,
        node,
        [LOAD_SET_VAR, LOAD_SET_RANDOM, LOAD_ADD_TO_VAR],
        &mut actions,
    );
    if let Some(p) = Params::of(doc, node, LOAD_MACRO) {
        actions.push(Action::Macro {
            templates: p.list(),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_RUN) {
        actions.push(Action::Run { source: p.whole() });
    }
    if let Some(p) = Params::of(doc, node, LOAD) {
        actions.push(Action::Load {
            alternatives: p.alternatives(),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_VAR) {
        actions.push(Action::ShowVariable {
            name: p.text(1),
            fallback: p.owned(2),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_ARRAY) {
        actions.push(Action::ShowList {
            name: p.text(1),
            fallback: p.owned(2),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_EXPRESSION) {
        actions.push(Action::ShowExpression { source: p.whole() });
    }
    if let Some(p) = Params::of(doc, node, LOAD_SWITCH) {
        actions.push(Action::ShowSwitch {
            condition: p.text(1),
            when_true: p.text(2),
            when_false: p.text(3),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_BECOME) {
        actions.push(Action::Become {
            alternatives: p.alternatives(),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_GOTO) {
        actions.push(Action::GoTo {
            alternatives: p.alternatives(),
        });
    }
    if let Some(p) = Params::of(doc, node, LOAD_PREPEND) {
        actions.push(insert_action(&p, Placement::Prepend));
    }
    if let Some(p) = Params::of(doc, node, LOAD_APPEND) {
        actions.push(insert_action(&p, Placement::Append));
    }
    if let Some(p) = Params::of(doc, node, LOAD_REPLACE) {
        if let Some(targets) = p.owned(1) {
            actions.push(Action::Replace {
                targets,
                template: p.owned(2),
            });
        }
    }
    if let Some(p) = Params::of(doc, node, LOAD_DEACTIVATE) {
        if let Some(targets) = p.owned(1) {
            actions.push(Action::Deactivate {
                targets: Some(targets),
            });
        }
    }
    actions.extend(refresh_action(doc, node, LOAD_REFRESH, &actions));
    if let Some(p) = Params::of(doc, node, LOAD_REMOVE) {
        actions.push(Action::Remove {
            targets: non_blank(p.raw),
        });
    }
    if doc.has_attribute(node, LOAD_SAVE_STORY) {
        actions.push(Action::SaveStory { quiet: true });
    }
    actions
}

/// Whether `node` takes part in a load pass.
#[must_use]
pub fn is_load_candidate(doc: &Document, node: NodeId) -> bool {
    LOAD_PASS_ATTRIBUTES
        .iter()
        .any(|attribute| doc.has_attribute(node, attribute))
}

/// Whether `node` reacts to clicks.
#[must_use]
pub fn is_interactive(doc: &Document, node: NodeId) -> bool {
    doc.tag(node) == Some("a") || doc.has_class(node, CLICK_ACTION_CLASS)
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(attributes: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let node = doc.create_element("a");
        for (name, value) in attributes {
            doc.set_attribute(node, name, value);
        }
        doc.append_child(doc.root(), node);
        (doc, node)
    }

    fn names(actions: &[Action]) -> Vec<&'static str> {
        actions.iter().map(Action::name).collect()
    }

    #[test]
    fn test_click_actions_follow_table_order() {
        // Arrange
        let (doc, node) = element(&[
            (CLICK_SAVE_STORY, ""),
            (CLICK_GOTO, "hall"),
            (CLICK_SET_VAR, "gold; 3"),
            (CLICK_RESET_STORY, "quiet"),
        ]);

        // Act
        let actions = click_actions(&doc, node);

        // Assert
        assert_eq!(
            names(&actions),
            vec!["reset_story", "set_variable", "goto", "save_story"]
        );
    }

    #[test]
    fn test_goto_suppresses_switch_and_back() {
        let (doc, node) = element(&[
            (CLICK_GOTO, "hall"),
            (CLICK_SWITCH, "true; a; b"),
            (CLICK_BACK, ""),
        ]);

        assert_eq!(names(&click_actions(&doc, node)), vec!["goto"]);
    }

    #[test]
    fn test_switch_suppresses_back() {
        let (doc, node) = element(&[(CLICK_SWITCH, "true; a; b"), (CLICK_BACK, "")]);

        assert_eq!(names(&click_actions(&doc, node)), vec!["switch"]);
    }

    #[test]
    fn test_params_are_trimmed_and_one_based() {
        let (doc, node) = element(&[(CLICK_APPEND, " note ;  ; out ")]);

        assert_eq!(
            click_actions(&doc, node),
            vec![Action::Insert {
                placement: Placement::Append,
                template: Some("note".into()),
                targets: None,
                outside: true,
            }]
        );
    }

    #[test]
    fn test_set_random_and_add_defaults() {
        let (doc, node) = element(&[(LOAD_SET_RANDOM, "roll"), (LOAD_ADD_TO_VAR, "gold; x")]);

        assert_eq!(
            load_actions(&doc, node),
            vec![
                Action::SetRandom {
                    name: "roll".into(),
                    choices: 2,
                    refresh: None,
                },
                Action::AddToVariable {
                    name: "gold".into(),
                    amount: 1,
                    refresh: None,
                },
            ]
        );
    }

    #[test]
    fn test_collected_refresh_adds_implicit_refresh() {
        let (doc, node) = element(&[(CLICK_SET_VAR, "mood; 'happy'; face")]);

        let actions = click_actions(&doc, node);

        assert_eq!(
            actions.last(),
            Some(&Action::Refresh {
                targets: None,
                declared: false,
            })
        );
    }

    #[test]
    fn test_reset_story_quiet_forms() {
        let (doc, node) = element(&[(CLICK_RESET_STORY, "prologue; quiet")]);
        assert_eq!(
            click_actions(&doc, node),
            vec![Action::ResetStory {
                start: Some("prologue".into()),
                quiet: true,
            }]
        );

        let (doc, node) = element(&[(CLICK_RESET_STORY, "quiet")]);
        assert_eq!(
            click_actions(&doc, node),
            vec![Action::ResetStory {
                start: None,
                quiet: true,
            }]
        );
    }

    #[test]
    fn test_skip_flag_suppresses_all_load_actions() {
        let (doc, node) = element(&[(LOAD_GOTO, "hall"), (LOAD_SKIP, "")]);

        assert!(load_actions(&doc, node).is_empty());
    }

    #[test]
    fn test_load_deactivate_requires_targets() {
        let (doc, node) = element(&[(LOAD_DEACTIVATE, ""), (LOAD_REMOVE, "")]);

        assert_eq!(
            load_actions(&doc, node),
            vec![Action::Remove { targets: None }]
        );
    }

    #[test]
    fn test_load_array_makes_element_a_candidate() {
        let (doc, node) = element(&[(LOAD_ARRAY, "inventory")]);

        assert!(is_load_candidate(&doc, node));
        assert_eq!(names(&load_actions(&doc, node)), vec!["show_list"]);
    }

    #[test]
    fn test_alternatives_keep_blank_entries() {
        let (doc, node) = element(&[(CLICK_GOTO, "a;;c")]);

        assert_eq!(
            click_actions(&doc, node),
            vec![Action::GoTo {
                alternatives: vec!["a".into(), String::new(), "c".into()],
            }]
        );
    }
}
