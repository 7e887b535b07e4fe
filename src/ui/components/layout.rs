//! Page shells: the console layout with sidebar, the tenant portal layout,
//! and the bare layout used by the sign-in pages.

use dioxus::prelude::*;

use super::nav::{Nav, NAV_SCRIPT};
use super::theme::{ThemeSwitcher, THEME_FUNCTIONS, THEME_SCRIPT};
use super::widgets::{Notice, NoticeArea};

/// Shared JavaScript utilities (XSS-safe escaping, etc.)
const SHARED_JS: &str = r#"
function esc(s) { return String(s ?? '').replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'})[c]); }
function fmt(n, d) { return n == null ? '-' : Number(n).toFixed(d ?? 1); }
"#;

/// CSS on top of Pico
const CUSTOM_STYLES: &str = r#"
:root { --pico-font-size: 15px; }
.status-ok { color: var(--pico-ins-color); }
.status-err { color: var(--pico-del-color); }
.status-warn { color: var(--pico-mark-background-color); }
.progress-cell progress { margin: 0; }
small { color: var(--pico-muted-color); }
.shell { display: grid; grid-template-columns: 14rem 1fr; min-height: 100vh; }
.shell.collapsed { grid-template-columns: 3.5rem 1fr; }
.shell.collapsed .sidebar ul, .shell.collapsed .sidebar .nav-heading { display: none; }
.sidebar { padding: 1rem; border-right: 1px solid var(--pico-muted-border-color); }
.sidebar ul { display: block; padding: 0; margin-bottom: 1rem; }
.sidebar li { display: block; padding: 0.1rem 0; list-style: none; }
.nav-heading { text-transform: uppercase; letter-spacing: 0.05em; font-size: 0.7rem; }
#nav-toggle { padding: 0.2rem 0.6rem; margin-bottom: 1rem; }
.topbar { display: flex; justify-content: space-between; align-items: center; gap: 1rem; }
.topbar form { margin: 0; }
.topbar button { margin: 0; padding: 0.3rem 0.8rem; }
.content { padding: 1rem 2rem; }
.stat-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(11rem, 1fr)); gap: 1rem; }
.stat-card { margin: 0; }
.stat-value { font-size: 1.8rem; font-weight: 600; margin: 0.2rem 0; }
.demo-banner mark { margin-right: 0.5rem; }
.notice-ok { border-left: 4px solid var(--pico-ins-color); }
.notice-err { border-left: 4px solid var(--pico-del-color); }
.chart svg { width: 100%; height: auto; }
svg line.chart-grid { stroke: #e2e8f0; }
svg line.chart-zero { stroke: #64748b; }
.chart-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(22rem, 1fr)); gap: 1rem; }
.inline-form { display: inline; margin: 0; }
.inline-form button { margin: 0; padding: 0.2rem 0.6rem; font-size: 0.8rem; }
.filters { display: flex; gap: 0.5rem; align-items: end; flex-wrap: wrap; }
.filters > * { margin-bottom: 0; }
.controls { display: flex; gap: 0.5rem; flex-wrap: wrap; }
.controls form { margin: 0; }
.controls button { margin: 0; }
/* Black theme (OLED) - extends dark theme */
[data-theme="dark"][data-variant="black"] {
    --pico-background-color: #000;
    --pico-card-background-color: #0a0a0a;
    --pico-card-sectioning-background-color: #0a0a0a;
    --pico-primary-background: #1a1a1a;
    --pico-muted-border-color: #1a1a1a;
    --pico-form-element-background-color: #0a0a0a;
    --pico-table-border-color: #1a1a1a;
}
.theme-switcher { display: flex; gap: 0.25rem; }
.theme-switcher button { padding: 0.25rem 0.5rem; font-size: 0.8rem; margin: 0; }
.theme-switcher button.active { background: var(--pico-primary-background); color: var(--pico-primary-inverse); }
"#;

#[component]
fn Head(title: String) -> Element {
    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{title} - Heatnet Console" }
            link {
                rel: "stylesheet",
                href: "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css"
            }
            style { {CUSTOM_STYLES} }
            script { dangerous_inner_html: THEME_SCRIPT }
            script { dangerous_inner_html: SHARED_JS }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct LayoutProps {
    /// Page title (shown in browser tab)
    pub title: String,
    /// Active navigation item ID
    pub nav_active: String,
    /// Signed-in operator
    pub user: String,
    /// Session granted offline with the demo credentials
    #[props(default)]
    pub demo_session: bool,
    #[props(default)]
    pub notice: Option<Notice>,
    /// Page content
    pub children: Element,
    /// Optional page script, runs after the shell scripts
    #[props(default)]
    pub scripts: Option<String>,
}

/// Console layout: sidebar, top bar with user and sign-out, notices, content.
#[component]
pub fn Layout(props: LayoutProps) -> Element {
    let version = env!("HNC_VERSION");

    rsx! {
        Head { title: props.title.clone() }
        body {
            div { class: "shell",
                Nav { active: props.nav_active.clone() }
                div {
                    header { class: "content topbar",
                        strong { "Heatnet Console" }
                        div { class: "topbar",
                            if props.demo_session {
                                mark { "Demo session" }
                            }
                            small { "Signed in as {props.user}" }
                            form { method: "post", action: "/logout",
                                button { r#type: "submit", class: "secondary outline", "Sign out" }
                            }
                        }
                    }
                    main { class: "content",
                        NoticeArea { notice: props.notice.clone() }
                        {props.children}
                    }
                    footer {
                        class: "content topbar",
                        small { "Heatnet Console v{version}" }
                        ThemeSwitcher {}
                    }
                }
            }
            script { dangerous_inner_html: THEME_FUNCTIONS }
            script { dangerous_inner_html: NAV_SCRIPT }
            if let Some(scripts) = props.scripts {
                script { dangerous_inner_html: "{scripts}" }
            }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct TenantLayoutProps {
    pub title: String,
    pub nav_active: String,
    pub email: String,
    #[props(default)]
    pub notice: Option<Notice>,
    pub children: Element,
}

const TENANT_LINKS: &[(&str, &str, &str)] = &[
    ("home", "Overview", "/tenant"),
    ("consumption", "Consumption", "/tenant/consumption"),
    ("invoices", "Invoices", "/tenant/invoices"),
];

/// Tenant portal layout: top navigation only.
#[component]
pub fn TenantLayout(props: TenantLayoutProps) -> Element {
    rsx! {
        Head { title: props.title.clone() }
        body {
            header { class: "container",
                nav {
                    ul { li { strong { "Tenant Portal" } } }
                    ul {
                        for (id, label, href) in TENANT_LINKS.iter() {
                            li {
                                if *id == props.nav_active.as_str() {
                                    a { href: *href, "aria-current": "page", strong { "{label}" } }
                                } else {
                                    a { href: *href, "{label}" }
                                }
                            }
                        }
                        li {
                            form { method: "post", action: "/tenant/logout", class: "inline-form",
                                button { r#type: "submit", class: "secondary outline", "Sign out" }
                            }
                        }
                    }
                }
            }
            main { class: "container",
                small { "{props.email}" }
                NoticeArea { notice: props.notice.clone() }
                {props.children}
            }
            footer { class: "container topbar",
                small { "Heatnet Console" }
                ThemeSwitcher {}
            }
            script { dangerous_inner_html: THEME_FUNCTIONS }
        }
    }
}

/// Centered card for the sign-in pages
#[component]
pub fn PublicLayout(title: String, children: Element) -> Element {
    rsx! {
        Head { title: title.clone() }
        body {
            main { class: "container", style: "max-width: 28rem; padding-top: 10vh;",
                {children}
            }
            script { dangerous_inner_html: THEME_FUNCTIONS }
        }
    }
}
