//! Action dispatch.
//!
//! Click actions run when the reader activates an element. Load actions run
//! for every eligible element of newly inserted content, in document order,
//! after that element's logic chain has been resolved.

use gamebook_core::evaluator::Evaluator;
use gamebook_core::{EvalError, Value, Variables};
use gamebook_document::NodeId;
use tracing::{debug, trace, warn};

use super::session::StorySession;
use crate::domain::actions::{
    Action, LOAD_REFRESH, LOAD_SKIP, Placement, click_actions, is_load_candidate, load_actions,
};
use crate::domain::canon::Canon;
use crate::domain::logic;

const VARIABLE_PREFIX: &str = "Variables.";

/// What set an action off.
#[derive(Debug, Clone, Copy)]
enum Trigger<'a> {
    Click,
    /// A load pass. `snapshot` is every element the pass set out to visit.
    Load {
        snapshot: &'a [NodeId],
        macro_replay: bool,
    },
}

impl StorySession {
    pub(crate) fn run_click_actions(&mut self, element: NodeId) {
        let mut collected = Vec::new();
        for action in click_actions(&self.doc, element) {
            debug!(action = action.name(), ?element, "click action");
            self.perform(action, element, Trigger::Click, &mut collected);
        }
    }

    /// Resolves logic and runs load actions for `root` and every eligible
    /// element below it.
    ///
    /// A macro replay runs over a detached clone; it never flags the pass as
    /// skipped when it navigates.
    pub(crate) fn run_load_pass(&mut self, root: NodeId, macro_replay: bool) {
        if !self.doc.contains(root) {
            return;
        }
        self.doc.clear_logic(root);
        let snapshot: Vec<NodeId> = self
            .doc
            .subtree_elements(root)
            .into_iter()
            .filter(|node| is_load_candidate(&self.doc, *node))
            .collect();

        for &element in &snapshot {
            if !self.doc.contains(element) {
                trace!(?element, "skipping destroyed element");
                continue;
            }
            let result = logic::resolve(&self.doc, element, root, |source| {
                evaluate_to_bool(self.evaluator.as_ref(), &mut self.variables, source)
            });
            self.doc.set_logic(element, result);
            if result == Some(false) {
                continue;
            }

            let trigger = Trigger::Load {
                snapshot: &snapshot,
                macro_replay,
            };
            let mut collected = Vec::new();
            for action in load_actions(&self.doc, element) {
                debug!(action = action.name(), ?element, "load action");
                self.perform(action, element, trigger, &mut collected);
            }
        }
    }

    /// Resolves logic chains under `root` without running any load action.
    pub(crate) fn resolve_logic(&mut self, root: NodeId) {
        if !self.doc.contains(root) {
            return;
        }
        self.doc.clear_logic(root);
        let candidates: Vec<NodeId> = self
            .doc
            .subtree_elements(root)
            .into_iter()
            .filter(|node| is_load_candidate(&self.doc, *node))
            .collect();
        for element in candidates {
            let result = logic::resolve(&self.doc, element, root, |source| {
                evaluate_to_bool(self.evaluator.as_ref(), &mut self.variables, source)
            });
            self.doc.set_logic(element, result);
        }
    }

    #[allow(clippy::too_many_lines)]
    fn perform(
        &mut self,
        action: Action,
        element: NodeId,
        trigger: Trigger<'_>,
        collected: &mut Vec<NodeId>,
    ) {
        let is_click = matches!(trigger, Trigger::Click);
        let refresh_anchor = is_click.then_some(element);

        match action {
            Action::ResetStory { start, quiet } => self.reset(start.as_deref(), quiet),
            Action::LoadStory => self.load(false),
            Action::SetVariable {
                name,
                expression,
                refresh,
            } => {
                let value = expression.as_deref().and_then(|source| {
                    possibly_as_string(self.evaluator.as_ref(), &mut self.variables, source)
                });
                self.variables.assign(&name, value);
                self.collect_refresh(refresh.as_deref(), refresh_anchor, collected);
            }
            Action::SetRandom {
                name,
                choices,
                refresh,
            } => {
                self.variables.set_random(&name, choices, self.rng.as_mut());
                self.collect_refresh(refresh.as_deref(), refresh_anchor, collected);
            }
            Action::AddToVariable {
                name,
                amount,
                refresh,
            } => {
                #[allow(clippy::cast_precision_loss)]
                let amount = amount as f64;
                self.variables.add(&name, amount);
                self.collect_refresh(refresh.as_deref(), refresh_anchor, collected);
            }
            Action::Macro { templates } => {
                for selector in templates {
                    self.replay_macro(&selector);
                }
            }
            Action::Run { source } => {
                evaluate(self.evaluator.as_ref(), &mut self.variables, &source);
            }
            Action::Load { alternatives } => self.load_into(element, &alternatives),
            Action::ShowVariable { name, fallback } => {
                let text = match self.variables.get(&name) {
                    Some(value) if !value.is_null() => value.to_string(),
                    _ => fallback.unwrap_or_default(),
                };
                self.doc.set_text_content(element, &text);
            }
            Action::ShowList { name, fallback } => {
                self.show_list(element, &name, fallback.as_deref());
            }
            Action::ShowExpression { source } => {
                let text = evaluate(self.evaluator.as_ref(), &mut self.variables, &source)
                    .filter(|value| !value.is_null())
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                self.doc.set_text_content(element, &text);
            }
            Action::ShowSwitch {
                condition,
                when_true,
                when_false,
            } => {
                let result =
                    evaluate_to_bool(self.evaluator.as_ref(), &mut self.variables, &condition);
                let text = if result { when_true } else { when_false };
                self.doc.set_text_content(element, &text);
            }
            Action::Become { alternatives } => {
                let template = self
                    .choose(&alternatives)
                    .and_then(|selector| self.find_template(&selector));
                self.replace(vec![element], template);
            }
            Action::GoTo { alternatives } => {
                let selector = self.choose(&alternatives).unwrap_or_default();
                let template = self.find_template(&selector);
                if let Trigger::Load {
                    snapshot,
                    macro_replay,
                } = trigger
                {
                    if template.is_none() {
                        debug!(%selector, "load goto target not found");
                        return;
                    }
                    if !macro_replay {
                        for node in snapshot {
                            self.doc.set_attribute(*node, LOAD_SKIP, "");
                        }
                    }
                }
                self.go_to(template, &selector);
            }
            Action::Switch {
                condition,
                when_true,
                when_false,
            } => {
                let result =
                    evaluate_to_bool(self.evaluator.as_ref(), &mut self.variables, &condition);
                let selector = if result { when_true } else { when_false }.unwrap_or_default();
                let template = self.find_template(&selector);
                self.go_to(template, &selector);
            }
            Action::Back { fallback } => self.back(fallback.as_deref()),
            Action::Insert {
                placement,
                template,
                targets,
                outside,
            } => {
                let template = template
                    .as_deref()
                    .and_then(|selector| self.find_template(selector));
                match (targets, placement) {
                    (None, Placement::Prepend) => self.prepend_to_scene(template),
                    (None, Placement::Append) => self.append_to_scene(template),
                    (Some(selector), _) => {
                        let found = self.find_in_scene(&selector, Some(element));
                        self.insert_around(placement, template, found, outside);
                    }
                }
            }
            Action::Replace { targets, template } => {
                let found = self.find_in_scene(&targets, Some(element));
                let template = template
                    .as_deref()
                    .and_then(|selector| self.find_template(selector));
                self.replace(found, template);
            }
            Action::Deactivate { targets } => {
                let found = match targets {
                    Some(selector) => self.find_in_scene(&selector, Some(element)),
                    None => vec![element],
                };
                self.deactivate(found);
            }
            Action::Refresh { targets, declared } => {
                if declared && targets.is_none() {
                    if !is_click {
                        self.doc.remove_attribute(element, LOAD_REFRESH);
                    }
                    self.refresh_all();
                    return;
                }
                let mut found = targets
                    .map(|selector| self.find_in_scene(&selector, refresh_anchor))
                    .unwrap_or_default();
                found.append(collected);
                self.refresh(found);
            }
            Action::Remove { targets } => {
                let found = match targets {
                    Some(selector) => self.find_in_scene(&selector, Some(element)),
                    None => vec![element],
                };
                self.remove(found);
            }
            Action::ResetBookmarks => self.bookmarks.reset(true),
            Action::SaveStory { quiet } => self.save(quiet),
        }
    }

    fn collect_refresh(
        &self,
        selector: Option<&str>,
        anchor: Option<NodeId>,
        collected: &mut Vec<NodeId>,
    ) {
        if let Some(selector) = selector {
            collected.extend(self.find_in_scene(selector, anchor));
        }
    }

    /// Picks one alternative at random. Blank alternatives stay in the draw.
    fn choose(&mut self, alternatives: &[String]) -> Option<String> {
        let index = self.rng.pick(alternatives.len())?;
        alternatives.get(index).cloned()
    }

    /// Runs a template's load actions over a throwaway clone.
    fn replay_macro(&mut self, selector: &str) {
        let Some(template) = self.find_template(selector) else {
            debug!(%selector, "macro template not found");
            return;
        };
        let Some(clone) = Canon::clone_template(&mut self.doc, Some(template)) else {
            return;
        };
        self.run_load_pass(clone, true);
        self.doc.destroy(clone);
    }

    /// Replaces the contents of `element` with a clone of one alternative.
    fn load_into(&mut self, element: NodeId, alternatives: &[String]) {
        let template = self
            .choose(alternatives)
            .and_then(|selector| self.find_template(&selector));
        self.doc.clear_children(element);
        let Some(clone) = Canon::clone_template(&mut self.doc, template) else {
            return;
        };
        self.doc.append_child(element, clone);
        self.run_load_pass(clone, false);
        self.format(clone);
    }

    /// One item per list entry: `li` inside lists, `span` elsewhere.
    fn show_list(&mut self, element: NodeId, name: &str, fallback: Option<&str>) {
        let fallback_items = || fallback.map(|item| vec![item.to_owned()]).unwrap_or_default();
        let items = match self.variables.get(name) {
            None => fallback_items(),
            Some(Value::List(items)) if items.is_empty() => fallback_items(),
            Some(Value::List(items)) => items.iter().map(ToString::to_string).collect(),
            Some(other) => vec![other.to_string()],
        };
        let tag = if matches!(self.doc.tag(element), Some("ol" | "ul")) {
            "li"
        } else {
            "span"
        };
        self.doc.clear_children(element);
        for item in items {
            let node = self.doc.create_element(tag);
            self.doc.set_text_content(node, &item);
            self.doc.append_child(element, node);
        }
    }
}

/// Evaluates `source`, logging failures. Blank source has no value.
pub(crate) fn evaluate(
    evaluator: &dyn Evaluator,
    variables: &mut Variables,
    source: &str,
) -> Option<Value> {
    if source.is_empty() {
        return None;
    }
    match evaluator.evaluate(source, variables) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%source, %error, "expression failed");
            None
        }
    }
}

/// Truthiness of `source`; failures are `false`.
pub(crate) fn evaluate_to_bool(
    evaluator: &dyn Evaluator,
    variables: &mut Variables,
    source: &str,
) -> bool {
    evaluate(evaluator, variables, source).is_some_and(|value| value.is_truthy())
}

/// Like [`evaluate`], but a bare unknown word is taken as the text itself, so
/// `data-click-setvar="mood; happy"` stores `"happy"`.
pub(crate) fn possibly_as_string(
    evaluator: &dyn Evaluator,
    variables: &mut Variables,
    source: &str,
) -> Option<Value> {
    if source.is_empty() {
        return None;
    }
    match evaluator.evaluate(source, variables) {
        Ok(value) => Some(value),
        Err(EvalError::UnknownIdentifier(_)) if !source.starts_with(VARIABLE_PREFIX) => {
            Some(Value::Text(source.to_owned()))
        }
        Err(error) => {
            warn!(%source, %error, "expression failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use gamebook_expression::ScriptEvaluator;

    use super::*;

    #[test]
    fn test_unknown_word_is_stored_as_text() {
        let mut variables = Variables::new();

        let value = possibly_as_string(&ScriptEvaluator, &mut variables, "happy");

        assert_eq!(value, Some(Value::from("happy")));
    }

    #[test]
    fn test_unknown_variable_reference_is_not_coerced() {
        let mut variables = Variables::new();

        let value = possibly_as_string(&ScriptEvaluator, &mut variables, "Variables.x.length");

        assert_eq!(value, None);
    }

    #[test]
    fn test_failed_condition_is_false() {
        let mut variables = Variables::new();

        assert!(!evaluate_to_bool(&ScriptEvaluator, &mut variables, "1 +"));
        assert!(!evaluate_to_bool(&ScriptEvaluator, &mut variables, ""));
        assert!(evaluate_to_bool(&ScriptEvaluator, &mut variables, "2 > 1"));
    }
}
