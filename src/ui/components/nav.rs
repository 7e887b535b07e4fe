//! Sidebar navigation for console pages.

use dioxus::prelude::*;

/// (id, label, href) grouped under a heading
const NAV_GROUPS: &[(&str, &[(&str, &str, &str)])] = &[
    (
        "Overview",
        &[
            ("dashboard", "Dashboard", "/"),
            ("sites", "Sites", "/sites"),
            ("buildings", "Buildings", "/buildings"),
            ("meters", "Meters", "/meters"),
        ],
    ),
    (
        "M-Bus",
        &[
            ("gateways", "Gateways", "/gateways"),
            ("reader", "Live Reader", "/mbus/reader"),
            ("remote", "Remote Control", "/mbus/remote"),
            ("manual-entry", "Manual Entry", "/manual-entry"),
        ],
    ),
    (
        "Operations",
        &[
            ("maintenance", "Maintenance", "/maintenance"),
            ("goals", "Goals", "/goals"),
        ],
    ),
    (
        "Reports",
        &[
            ("billing", "Billing", "/billing"),
            ("finance", "Finance", "/finance"),
            ("analytics", "Analytics", "/analytics"),
            ("carbon", "Carbon", "/carbon"),
        ],
    ),
];

/// Collapsed state is remembered per browser
pub const NAV_SCRIPT: &str = r#"
(function(){
    const shell = document.querySelector('.shell');
    const toggle = document.getElementById('nav-toggle');
    if (!shell || !toggle) return;
    const apply = c => shell.classList.toggle('collapsed', c);
    apply(localStorage.getItem('hnc-nav-collapsed') === '1');
    toggle.addEventListener('click', () => {
        const c = !shell.classList.contains('collapsed');
        localStorage.setItem('hnc-nav-collapsed', c ? '1' : '0');
        apply(c);
    });
})();
"#;

#[derive(Props, Clone, PartialEq)]
pub struct NavProps {
    /// The currently active page ID (e.g., "dashboard", "meters")
    pub active: String,
}

#[component]
pub fn Nav(props: NavProps) -> Element {
    rsx! {
        nav { class: "sidebar",
            button { id: "nav-toggle", class: "outline secondary", title: "Collapse menu", "☰" }
            for (heading, links) in NAV_GROUPS.iter() {
                small { class: "nav-heading", "{heading}" }
                ul {
                    for (id, label, href) in links.iter() {
                        li {
                            if *id == props.active.as_str() {
                                a { href: *href, "aria-current": "page", strong { "{label}" } }
                            } else {
                                a { href: *href, "{label}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
