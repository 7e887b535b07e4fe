//! Energy goals with progress bars.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::{Extension, Form};
use dioxus::prelude::*;

use super::Viewer;
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::{Goal, GoalForm, RecordId};
use crate::ui::components::widgets::{number, text};
use crate::ui::components::{loaded_view, EmptyState, Layout, Notice};
use crate::ui::{create_record, delete_record, render};
use crate::upstream::Loaded;

const GOALS_PATH: &str = "/api/goals";

/// "current / target unit"
fn goal_figures(goal: &Goal) -> String {
    let unit = goal.unit.as_deref().unwrap_or_default();
    format!("{} / {} {}", number(goal.current, 1), number(goal.target, 1), unit)
        .trim_end()
        .to_string()
}

fn goal_card(goal: &Goal) -> Element {
    let progress = format!("{:.0}", goal.progress());
    let figures = goal_figures(goal);
    rsx! {
        article {
            header {
                strong { "{goal.title}" }
                br {}
                small { {text(goal.metric.as_deref())} }
            }
            div { class: "progress-cell",
                progress { value: "{progress}", max: "100" }
            }
            p {
                "{figures} "
                small { "({progress} %)" }
            }
            footer {
                small { "Deadline " {text(goal.deadline.as_deref())} }
                form {
                    method: "post",
                    action: "/goals/{goal.id}/delete",
                    class: "inline-form",
                    button { r#type: "submit", class: "secondary outline", "Delete" }
                }
            }
        }
    }
}

fn goal_cards(goals: &[Goal]) -> Element {
    if goals.is_empty() {
        return rsx! { EmptyState { text: "No goals defined yet. Add one below.".to_string() } };
    }
    rsx! {
        div { class: "chart-grid",
            for goal in goals.iter() {
                {goal_card(goal)}
            }
        }
    }
}

#[component]
pub fn GoalsPage(viewer: Viewer, goals: Loaded<Vec<Goal>>, notice: Option<Notice>) -> Element {
    let list = loaded_view(&goals, "/goals", |g| goal_cards(g));

    rsx! {
        Layout {
            title: "Goals".to_string(),
            nav_active: "goals".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,

            h1 { "Goals" }
            {list}
            details {
                summary { role: "button", class: "secondary", "New goal" }
                form { method: "post", action: "/goals",
                    div { class: "grid",
                        label { "Title"
                            input { name: "title", required: true }
                        }
                        label { "Metric"
                            input { name: "metric", placeholder: "heat_loss, co2, ..." }
                        }
                    }
                    div { class: "grid",
                        label { "Target"
                            input { name: "target", required: true }
                        }
                        label { "Current"
                            input { name: "current", placeholder: "0" }
                        }
                        label { "Unit"
                            input { name: "unit", placeholder: "%" }
                        }
                        label { "Deadline"
                            input { name: "deadline", r#type: "date" }
                        }
                    }
                    button { r#type: "submit", "Create goal" }
                }
            }
        }
    }
}

/// GET /goals
pub async fn goals_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let goals = state.api.load_list(GOALS_PATH, demo::goals).await;
    render(rsx! {
        GoalsPage { viewer: Viewer::from(&session), goals }
    })
}

/// POST /goals
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<GoalForm>,
) -> Html<String> {
    let loaded = state.api.load_list(GOALS_PATH, demo::goals).await;
    let (goals, notice) = create_record::<Goal, _>(&state, GOALS_PATH, "Goal", loaded, form).await;
    render(rsx! {
        GoalsPage { viewer: Viewer::from(&session), goals, notice: Some(notice) }
    })
}

/// POST /goals/{id}/delete
pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Html<String> {
    let loaded = state.api.load_list(GOALS_PATH, demo::goals).await;
    let (goals, notice) =
        delete_record(&state, GOALS_PATH, "Goal", loaded, RecordId::from(id)).await;
    render(rsx! {
        GoalsPage { viewer: Viewer::from(&session), goals, notice: Some(notice) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_figures_with_and_without_unit() {
        let mut goal = Goal {
            current: Some(9.5),
            target: Some(15.0),
            unit: Some("%".into()),
            ..Goal::default()
        };
        assert_eq!(goal_figures(&goal), "9.5 / 15.0 %");
        goal.unit = None;
        assert_eq!(goal_figures(&goal), "9.5 / 15.0");
    }

    #[test]
    fn cards_render_progress_bars() {
        let goals = demo::goals();
        let html = dioxus::ssr::render_element(goal_cards(&goals));
        assert_eq!(html.matches("<progress").count(), goals.len());
    }
}
