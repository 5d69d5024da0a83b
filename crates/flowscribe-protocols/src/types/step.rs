//! Step records.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::geometry::Position;

/// Closed set of action tags a step can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ScheduleApiWorkflowOnList,
    ScheduleApiWorkflow,
    CancelScheduledWorkflow,
    CreateThing,
    MakeChangesToCurrentUser,
    MakeChangesToList,
    MakeChangesToThing,
    DeleteList,
    DeleteThing,
    Condition,
    SendEmail,
    TriggerCustomEvent,
    ReturnData,
    TerminateWorkflow,
    SignUp,
    LogIn,
    LogOut,
    #[default]
    CustomAction,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleApiWorkflowOnList => "schedule_api_workflow_on_list",
            Self::ScheduleApiWorkflow => "schedule_api_workflow",
            Self::CancelScheduledWorkflow => "cancel_scheduled_workflow",
            Self::CreateThing => "create_thing",
            Self::MakeChangesToCurrentUser => "make_changes_to_current_user",
            Self::MakeChangesToList => "make_changes_to_list",
            Self::MakeChangesToThing => "make_changes_to_thing",
            Self::DeleteList => "delete_list",
            Self::DeleteThing => "delete_thing",
            Self::Condition => "condition",
            Self::SendEmail => "send_email",
            Self::TriggerCustomEvent => "trigger_custom_event",
            Self::ReturnData => "return_data",
            Self::TerminateWorkflow => "terminate_workflow",
            Self::SignUp => "sign_up",
            Self::LogIn => "log_in",
            Self::LogOut => "log_out",
            Self::CustomAction => "custom_action",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `Parameter...: value` occurrence read from a properties panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// 1-based position in panel read order.
    pub index: usize,
    /// Label as rendered, without the trailing colon.
    pub label: String,
    pub value: String,
}

/// One ordered action unit of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number; unique within a workflow, not necessarily contiguous.
    pub order: u32,
    /// Normalized action text.
    pub title: String,
    pub action: ActionType,
    /// Property name to value, in panel read order.
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Render-time coordinates. Never part of any hash.
    #[serde(default)]
    pub position: Position,
    pub step_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_default() {
        assert_eq!(ActionType::default(), ActionType::CustomAction);
    }

    #[test]
    fn test_action_type_serde_matches_as_str() {
        for action in [
            ActionType::ScheduleApiWorkflowOnList,
            ActionType::CreateThing,
            ActionType::MakeChangesToCurrentUser,
            ActionType::Condition,
            ActionType::SendEmail,
            ActionType::CustomAction,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn test_step_record_defaults_on_deserialize() {
        let json = r#"{"order": 2, "title": "Send email", "action": "send_email", "step_hash": "abc"}"#;
        let step: StepRecord = serde_json::from_str(json).unwrap();
        assert_eq!(step.order, 2);
        assert!(step.properties.is_empty());
        assert!(step.parameters.is_empty());
        assert_eq!(step.position, Position::default());
    }
}
