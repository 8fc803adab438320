/// Script steps replayed by the command-line runner.
///
/// A script is a JSON array. Each entry is either a plain action
/// (`{"type": "add_page", ...}`) or a session command tagged with `step`
/// (`{"step": "undo"}`).
use anyhow::{bail, Result};
use serde::Deserialize;
use story_editor_core::{
    check_invariants, Action, Dispatch, ElementPatch, ElementType, StorySession,
};
use tracing::{debug, info};

/// Session-level commands that are not reducer actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Command {
    Undo,
    Redo,
    /// Ends the current undo group.
    BreakGroup,
    /// Adds a page with a generated id.
    CreatePage {
        #[serde(default)]
        at: Option<usize>,
    },
    /// Adds an element with a generated id and registry defaults.
    CreateElement {
        element_type: ElementType,
        #[serde(default)]
        attributes: ElementPatch,
        #[serde(default)]
        at: Option<usize>,
        #[serde(default)]
        as_background: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Command(Command),
    Action(Action),
}

pub fn parse(json: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(json)?)
}

fn apply(session: &mut StorySession, step: Step) {
    match step {
        Step::Action(action) => session.dispatch(action),
        Step::Command(Command::Undo) => {
            if !session.undo() {
                debug!("Nothing to undo");
            }
        }
        Step::Command(Command::Redo) => {
            if !session.redo() {
                debug!("Nothing to redo");
            }
        }
        Step::Command(Command::BreakGroup) => session.break_undo_group(),
        Step::Command(Command::CreatePage { at }) => {
            session.api().add_page_at(at);
        }
        Step::Command(Command::CreateElement {
            element_type,
            attributes,
            at,
            as_background,
        }) => {
            let mut api = session.api();
            let created = if as_background {
                api.add_background_element(element_type, &attributes)
            } else {
                api.add_element_at(element_type, &attributes, at)
            };
            if created.is_none() {
                debug!("Cannot create an element of type {}", element_type.as_str());
            }
        }
    }
}

/// Runs every step against `session`.
///
/// With `verify`, stops at the first step that leaves the document
/// inconsistent.
pub fn run(session: &mut StorySession, steps: Vec<Step>, verify: bool) -> Result<()> {
    let total = steps.len();
    for (index, step) in steps.into_iter().enumerate() {
        apply(session, step);
        if verify {
            let violations = check_invariants(session.document());
            if !violations.is_empty() {
                let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
                bail!(
                    "Document inconsistent after step {}: {}",
                    index + 1,
                    listed.join("; ")
                );
            }
        }
    }
    info!("Replayed {total} steps");
    Ok(())
}
