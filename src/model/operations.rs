//! Maintenance tasks and energy goals

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{opt_number, opt_string, string_or_empty};
use super::{number_in, optional, required, Creatable, Record, RecordId, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "string_or_empty", alias = "name")]
    pub title: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub site_id: Option<RecordId>,
    #[serde(default, deserialize_with = "opt_string")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "due")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "assigned_to")]
    pub assignee: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MaintenanceTask {
    pub fn is_open(&self) -> bool {
        !matches!(
            self.status.as_deref(),
            Some("done" | "closed" | "completed" | "cancelled")
        )
    }
}

impl Record for MaintenanceTask {
    const KIND: &'static str = "task";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

pub const PRIORITIES: [&str; 3] = ["low", "normal", "high"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    pub priority: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl Creatable for MaintenanceTask {
    type Draft = NewTask;

    fn from_draft(draft: &NewTask, id: RecordId) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            site_id: draft.site_id.clone().map(RecordId::from),
            priority: Some(draft.priority.clone()),
            status: Some(draft.status.clone()),
            due_date: draft.due_date.clone(),
            assignee: draft.assignee.clone(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub assignee: String,
}

fn parse_date(value: &str, field: &'static str) -> Result<Option<String>, ValidationError> {
    match optional(value) {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map(|_| Some(date))
            .map_err(|_| ValidationError::Invalid {
                field,
                reason: "expected YYYY-MM-DD".to_string(),
            }),
        None => Ok(None),
    }
}

impl TryFrom<TaskForm> for NewTask {
    type Error = ValidationError;

    fn try_from(form: TaskForm) -> Result<Self, Self::Error> {
        let title = required(&form.title, "title")?;
        let priority = match optional(&form.priority) {
            Some(p) if PRIORITIES.contains(&p.as_str()) => p,
            Some(p) => {
                return Err(ValidationError::Invalid {
                    field: "priority",
                    reason: format!("unknown priority '{}'", p),
                })
            }
            None => "normal".to_string(),
        };
        Ok(Self {
            title,
            description: optional(&form.description),
            site_id: optional(&form.site_id),
            priority,
            status: "open".to_string(),
            due_date: parse_date(&form.due_date, "due date")?,
            assignee: optional(&form.assignee),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "string_or_empty", alias = "name")]
    pub title: String,
    /// What is measured, e.g. "heat_loss" or "co2"
    #[serde(default, deserialize_with = "opt_string")]
    pub metric: Option<String>,
    #[serde(default, deserialize_with = "opt_number", alias = "target_value")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "opt_number", alias = "current_value")]
    pub current: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "due_date")]
    pub deadline: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Goal {
    /// Progress towards target in percent, clamped to 0..=100
    pub fn progress(&self) -> f64 {
        match (self.current, self.target) {
            (Some(current), Some(target)) if target > 0.0 => {
                (current / target * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }
}

impl Record for Goal {
    const KIND: &'static str = "goal";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub target: f64,
    pub current: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Creatable for Goal {
    type Draft = NewGoal;

    fn from_draft(draft: &NewGoal, id: RecordId) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            metric: draft.metric.clone(),
            target: Some(draft.target),
            current: Some(draft.current),
            unit: draft.unit.clone(),
            deadline: draft.deadline.clone(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub deadline: String,
}

impl TryFrom<GoalForm> for NewGoal {
    type Error = ValidationError;

    fn try_from(form: GoalForm) -> Result<Self, Self::Error> {
        let title = required(&form.title, "title")?;
        let target = number_in(&form.target, "target", 0.0, 1.0e12)?;
        if target == 0.0 {
            return Err(ValidationError::Invalid {
                field: "target",
                reason: "must be greater than zero".to_string(),
            });
        }
        let current = if form.current.trim().is_empty() {
            0.0
        } else {
            number_in(&form.current, "current", 0.0, 1.0e12)?
        };
        Ok(Self {
            title,
            metric: optional(&form.metric),
            target,
            current,
            unit: optional(&form.unit),
            deadline: parse_date(&form.deadline, "deadline")?,
        })
    }
}
