//! Text normalization and action classification.
//!
//! Rendered step text often carries the step label, ancestor navigation text
//! and sibling labels on separate lines. [`normalize`] picks the one line that
//! describes the action; [`classify`] maps that line to an [`ActionType`].
//!
//! Both functions are deterministic: ASCII-only case folding, fixed tables,
//! no locale.

use flowscribe_protocols::ActionType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Title used when no usable line survives normalization.
pub const UNKNOWN_ACTION: &str = "Unknown Action";

static STEP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Step\s+\d+\s*[:.\-]?\s*").expect("valid step prefix pattern"));

/// Editor chrome that shows up in rendered text but never names an action.
/// Compared case-insensitively against whole lines.
pub const CHROME_LABELS: &[&str] = &[
    "Design",
    "Workflow",
    "Workflows",
    "Backend workflows",
    "API workflows",
    "Data",
    "Styles",
    "Plugins",
    "Settings",
    "Logs",
    "Uncategorized",
    "Custom events",
    "Database trigger events",
    "Recurring events",
    "New folder",
    "Add a new step",
    "Click here to add an action...",
    "Click here to add an event...",
    "Search for events...",
];

/// Words that mark a line as describing an action. Checked in this order
/// against each line; the first line containing any of them is the title.
pub const ACTION_KEYWORDS: &[&str] = &[
    "Schedule",
    "Cancel",
    "Create",
    "Make changes",
    "Delete",
    "Only when",
    "Send email",
    "Send",
    "Trigger",
    "Return data",
    "Terminate",
    "Sign the user up",
    "Log the user",
    "Add list",
    "Remove",
    "Reset",
    "Copy a list",
];

/// Phrase to action table. Order is significant: the first entry whose
/// phrase occurs in the title wins, so longer, more specific phrases must
/// precede the shorter ones they contain.
pub const CLASSIFICATION_TABLE: &[(&str, ActionType)] = &[
    ("Schedule API Workflow on a list", ActionType::ScheduleApiWorkflowOnList),
    ("Schedule API Workflow", ActionType::ScheduleApiWorkflow),
    ("Cancel a scheduled", ActionType::CancelScheduledWorkflow),
    ("Create a new", ActionType::CreateThing),
    ("Make changes to current user", ActionType::MakeChangesToCurrentUser),
    ("Make changes to a list", ActionType::MakeChangesToList),
    ("Make changes to", ActionType::MakeChangesToThing),
    ("Delete a list", ActionType::DeleteList),
    ("Delete", ActionType::DeleteThing),
    ("Only when", ActionType::Condition),
    ("Send email", ActionType::SendEmail),
    ("Trigger a custom event", ActionType::TriggerCustomEvent),
    ("Return data", ActionType::ReturnData),
    ("Terminate", ActionType::TerminateWorkflow),
    ("Sign the user up", ActionType::SignUp),
    ("Log the user in", ActionType::LogIn),
    ("Log the user out", ActionType::LogOut),
    ("Schedule", ActionType::ScheduleApiWorkflow),
];

/// Reduce raw rendered step text to a single clean title.
pub fn normalize(raw: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| strip_step_prefix(line.trim()))
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty() && !is_chrome_label(line))
        .collect();

    if let Some(line) = lines.iter().find(|line| contains_action_keyword(line)) {
        return line.clone();
    }

    lines
        .into_iter()
        .find(|line| !is_numeric(line))
        .unwrap_or_else(|| UNKNOWN_ACTION.to_string())
}

/// Classify a normalized title into an action tag.
pub fn classify(title: &str) -> ActionType {
    let folded = title.to_ascii_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|(phrase, _)| folded.contains(&phrase.to_ascii_lowercase()))
        .map(|(_, action)| *action)
        .unwrap_or_default()
}

fn strip_step_prefix(line: &str) -> &str {
    match STEP_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_chrome_label(line: &str) -> bool {
    CHROME_LABELS.iter().any(|label| label.eq_ignore_ascii_case(line))
}

fn contains_action_keyword(line: &str) -> bool {
    ACTION_KEYWORDS.iter().any(|keyword| line.contains(keyword))
}

fn is_numeric(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
