//! Small building blocks shared by pages: notices, data-source banners,
//! stat cards and empty states.

use dioxus::prelude::*;

use crate::upstream::Loaded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message shown above the page content
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

#[component]
pub fn NoticeArea(notice: Option<Notice>) -> Element {
    let Some(notice) = notice else {
        return rsx! { div { id: "notices" } };
    };
    let class = match notice.kind {
        NoticeKind::Success => "notice notice-ok",
        NoticeKind::Error => "notice notice-err",
    };
    rsx! {
        div { id: "notices",
            article { class: class, role: "alert", "{notice.text}" }
        }
    }
}

/// Marks a page rendered from the built-in sample dataset
#[component]
pub fn DemoBanner() -> Element {
    rsx! {
        p { class: "demo-banner",
            mark { "Demo data" }
            " The metering API is unavailable. Showing sample data; changes are not saved."
        }
    }
}

#[component]
pub fn LoadFailed(message: String, retry: String) -> Element {
    rsx! {
        article { class: "load-failed",
            p { strong { class: "status-err", "Failed to load" } }
            p { "{message}" }
            a { href: "{retry}", role: "button", class: "secondary", "Retry" }
        }
    }
}

#[component]
pub fn StatCard(label: String, value: String, #[props(default)] hint: Option<String>) -> Element {
    rsx! {
        article { class: "stat-card",
            small { "{label}" }
            p { class: "stat-value", "{value}" }
            if let Some(hint) = hint {
                small { "{hint}" }
            }
        }
    }
}

#[component]
pub fn EmptyState(text: String) -> Element {
    rsx! {
        article { class: "empty-state", p { "{text}" } }
    }
}

/// Inline SVG from [`crate::charts`]
#[component]
pub fn Chart(svg: String, #[props(default)] caption: Option<String>) -> Element {
    rsx! {
        figure { class: "chart",
            div { dangerous_inner_html: "{svg}" }
            if let Some(caption) = caption {
                figcaption { small { "{caption}" } }
            }
        }
    }
}

/// Render `view` for live or demo data, the retry panel otherwise
pub fn loaded_view<T>(loaded: &Loaded<T>, retry: &str, view: impl FnOnce(&T) -> Element) -> Element {
    match loaded {
        Loaded::Live(data) => view(data),
        Loaded::Demo(data) => {
            let inner = view(data);
            rsx! {
                DemoBanner {}
                {inner}
            }
        }
        Loaded::Failed(message) => rsx! {
            LoadFailed { message: message.clone(), retry: retry.to_string() }
        },
    }
}

/// Placeholder for absent text fields
pub fn text(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

pub fn number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

pub fn count(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn money(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, currency),
        None => "-".to_string(),
    }
}
