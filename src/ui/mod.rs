//! Web UI: server-rendered pages for the console and the tenant portal
//!
//! Pages are Dioxus components rendered to HTML per request. Every handler
//! fetches what its page needs through [`crate::upstream::ApiClient`], so a
//! page shows live data, labelled demo data, or a retry panel. Create and
//! delete forms post back to the page, which renders the updated list in
//! place.
//!
//! - components/ - layout, navigation, theme switcher, notices, stat cards
//! - pages/ - one module per page family, component plus axum handlers

pub mod components;
pub mod pages;

use axum::response::Html;
use dioxus::prelude::*;
use tracing::{info, warn};

use crate::api::AppState;
use crate::bus::BusEvent;
use crate::model::{Creatable, Record, RecordId, ValidationError};
use crate::records::RecordList;
use crate::upstream::Loaded;
use components::Notice;

/// Render a page component into a complete HTML document
pub fn render(page: Element) -> Html<String> {
    let html = dioxus::ssr::render_element(page);
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"dark\">\n{}</html>",
        html
    ))
}

/// Run `f` on the page list, keeping the list's data source
fn with_list<T: Record, R>(
    loaded: Loaded<Vec<T>>,
    f: impl FnOnce(&mut RecordList<T>) -> R,
) -> (Loaded<Vec<T>>, R) {
    match loaded {
        Loaded::Live(items) => {
            let mut list = RecordList::from(items);
            let result = f(&mut list);
            (Loaded::Live(list.into_items()), result)
        }
        Loaded::Demo(items) => {
            let mut list = RecordList::from(items);
            let result = f(&mut list);
            (Loaded::Demo(list.into_items()), result)
        }
        Loaded::Failed(message) => {
            let mut list = RecordList::new(Vec::new());
            let result = f(&mut list);
            (Loaded::Failed(message), result)
        }
    }
}

/// Validate a submitted form, create the record upstream and append it to
/// the page list. Invalid input never reaches the API.
pub(crate) async fn create_record<T, F>(
    state: &AppState,
    path: &str,
    noun: &str,
    loaded: Loaded<Vec<T>>,
    form: F,
) -> (Loaded<Vec<T>>, Notice)
where
    T: Creatable,
    T::Draft: TryFrom<F, Error = ValidationError>,
{
    let draft = match <T::Draft as TryFrom<F>>::try_from(form) {
        Ok(draft) => draft,
        Err(e) => return (loaded, Notice::error(e.to_string())),
    };

    let result = state.api.create::<T>(path, &draft).await;
    let (loaded, outcome) = with_list(loaded, |list| {
        list.apply_created(result).map(|record| record.id().clone())
    });

    let notice = match outcome {
        Ok(id) => {
            info!(kind = T::KIND, id = %id, "record created");
            state.bus.publish(BusEvent::RecordCreated {
                kind: T::KIND.to_string(),
                id: id.to_string(),
            });
            Notice::success(format!("{} created", noun))
        }
        Err(message) => {
            warn!(kind = T::KIND, error = %message, "create failed");
            Notice::error(message)
        }
    };
    (loaded, notice)
}

/// Delete a record upstream and drop it from the page list
pub(crate) async fn delete_record<T: Record>(
    state: &AppState,
    path: &str,
    noun: &str,
    loaded: Loaded<Vec<T>>,
    id: RecordId,
) -> (Loaded<Vec<T>>, Notice) {
    let target = format!("{}/{}", path, urlencoding::encode(id.as_str()));
    let result = state.api.delete(&target).await;
    let (loaded, outcome) = with_list(loaded, |list| list.apply_deleted(&id, result));

    let notice = match outcome {
        Ok(_) => {
            info!(kind = T::KIND, id = %id, "record deleted");
            state.bus.publish(BusEvent::RecordDeleted {
                kind: T::KIND.to_string(),
                id: id.to_string(),
            });
            Notice::success(format!("{} deleted", noun))
        }
        Err(message) => {
            warn!(kind = T::KIND, id = %id, error = %message, "delete failed");
            Notice::error(message)
        }
    };
    (loaded, notice)
}

/// Upstream path with an optional `key=value` filter
pub(crate) fn filtered_path(path: &str, key: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => format!("{}?{}={}", path, key, urlencoding::encode(value)),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Goal;
    use crate::upstream::ApiError;

    fn goal(id: &str) -> Goal {
        Goal {
            id: RecordId::from(id),
            title: format!("Goal {}", id),
            ..Default::default()
        }
    }

    #[test]
    fn with_list_keeps_source() {
        let (loaded, added) = with_list(Loaded::Demo(vec![goal("g-1")]), |list| {
            list.apply_created(Ok(goal("g-2"))).map(|g| g.id.clone())
        });
        assert_eq!(added, Ok(RecordId::from("g-2")));
        assert!(loaded.is_demo());
        assert_eq!(loaded.data().map(Vec::len), Some(2));

        let (loaded, removed) = with_list(Loaded::Failed("down".into()), |list: &mut RecordList<Goal>| {
            list.apply_deleted(&RecordId::from("g-1"), Err(ApiError::Decode("x".into())))
        });
        assert!(removed.is_err());
        assert_eq!(loaded.error(), Some("down"));
    }

    #[test]
    fn filter_path_encodes_value() {
        assert_eq!(filtered_path("/api/meters", "site_id", None), "/api/meters");
        assert_eq!(filtered_path("/api/meters", "site_id", Some(" ")), "/api/meters");
        assert_eq!(
            filtered_path("/api/meters", "site_id", Some("s 1")),
            "/api/meters?site_id=s%201"
        );
    }
}
