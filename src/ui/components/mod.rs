//! Shared UI components for the Dioxus-based web UI.

pub mod layout;
pub mod nav;
pub mod theme;
pub mod widgets;

pub use layout::{Layout, PublicLayout, TenantLayout};
pub use nav::Nav;
pub use theme::ThemeSwitcher;
pub use widgets::{
    loaded_view, Chart, DemoBanner, EmptyState, LoadFailed, Notice, NoticeArea, NoticeKind, StatCard,
};
