//! Maintenance tasks: list, create, delete.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::{Extension, Form};
use dioxus::prelude::*;

use super::Viewer;
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::operations::PRIORITIES;
use crate::model::{MaintenanceTask, RecordId, TaskForm};
use crate::ui::components::widgets::text;
use crate::ui::components::{loaded_view, EmptyState, Layout, Notice};
use crate::ui::{create_record, delete_record, render};
use crate::upstream::Loaded;

const TASKS_PATH: &str = "/api/maintenance/tasks";

fn task_class(task: &MaintenanceTask) -> &'static str {
    if task.is_open() {
        "task-open"
    } else {
        "task-closed"
    }
}

fn task_table(tasks: &[MaintenanceTask]) -> Element {
    if tasks.is_empty() {
        return rsx! { EmptyState { text: "No maintenance tasks. Create one below.".to_string() } };
    }
    let open = tasks.iter().filter(|t| t.is_open()).count();
    let total = tasks.len();
    rsx! {
        p { small { "{open} open of {total}" } }
        table {
            thead {
                tr {
                    th { "Task" } th { "Site" } th { "Priority" } th { "Status" }
                    th { "Due" } th { "Assignee" } th {}
                }
            }
            tbody {
                for task in tasks.iter() {
                    tr { class: task_class(task),
                        td {
                            strong { "{task.title}" }
                            if let Some(description) = task.description.as_deref() {
                                br {}
                                small { "{description}" }
                            }
                        }
                        td { {text(task.site_id.as_ref().map(|id| id.as_str()))} }
                        td { {text(task.priority.as_deref())} }
                        td { {text(task.status.as_deref())} }
                        td { {text(task.due_date.as_deref())} }
                        td { {text(task.assignee.as_deref())} }
                        td {
                            form {
                                method: "post",
                                action: "/maintenance/{task.id}/delete",
                                class: "inline-form",
                                button { r#type: "submit", class: "secondary outline", "Delete" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn MaintenancePage(
    viewer: Viewer,
    tasks: Loaded<Vec<MaintenanceTask>>,
    notice: Option<Notice>,
) -> Element {
    let list = loaded_view(&tasks, "/maintenance", |t| task_table(t));

    rsx! {
        Layout {
            title: "Maintenance".to_string(),
            nav_active: "maintenance".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,

            h1 { "Maintenance" }
            {list}
            details {
                summary { role: "button", class: "secondary", "New task" }
                form { method: "post", action: "/maintenance",
                    label { "Title"
                        input { name: "title", required: true }
                    }
                    label { "Description"
                        textarea { name: "description", rows: "2" }
                    }
                    div { class: "grid",
                        label { "Site ID"
                            input { name: "site_id", placeholder: "optional" }
                        }
                        label { "Priority"
                            select { name: "priority",
                                for priority in PRIORITIES.iter() {
                                    option { value: *priority, selected: *priority == "normal", "{priority}" }
                                }
                            }
                        }
                        label { "Due"
                            input { name: "due_date", r#type: "date" }
                        }
                        label { "Assignee"
                            input { name: "assignee" }
                        }
                    }
                    button { r#type: "submit", "Create task" }
                }
            }
        }
    }
}

/// GET /maintenance
pub async fn maintenance_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let tasks = state.api.load_list(TASKS_PATH, demo::maintenance_tasks).await;
    render(rsx! {
        MaintenancePage { viewer: Viewer::from(&session), tasks }
    })
}

/// POST /maintenance
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<TaskForm>,
) -> Html<String> {
    let loaded = state.api.load_list(TASKS_PATH, demo::maintenance_tasks).await;
    let (tasks, notice) =
        create_record::<MaintenanceTask, _>(&state, TASKS_PATH, "Task", loaded, form).await;
    render(rsx! {
        MaintenancePage { viewer: Viewer::from(&session), tasks, notice: Some(notice) }
    })
}

/// POST /maintenance/{id}/delete
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Html<String> {
    let loaded = state.api.load_list(TASKS_PATH, demo::maintenance_tasks).await;
    let (tasks, notice) =
        delete_record(&state, TASKS_PATH, "Task", loaded, RecordId::from(id)).await;
    render(rsx! {
        MaintenancePage { viewer: Viewer::from(&session), tasks, notice: Some(notice) }
    })
}
