//! Theme switcher for light/dark/black modes.

use dioxus::prelude::*;

/// Buttons are plain HTML; the handlers live in [`THEME_FUNCTIONS`].
#[component]
pub fn ThemeSwitcher() -> Element {
    rsx! {
        div {
            class: "theme-switcher",
            button { id: "theme-light", "data-theme-choice": "light", "Light" }
            button { id: "theme-dark", "data-theme-choice": "dark", "Dark" }
            button { id: "theme-black", "data-theme-choice": "black", "Black" }
        }
    }
}

/// Runs in `<head>` so the stored theme applies before first paint.
pub const THEME_SCRIPT: &str = r#"
(function(){
    const t = localStorage.getItem('hnc-theme') || 'dark';
    document.documentElement.setAttribute('data-theme', t === 'black' ? 'dark' : t);
    if (t === 'black') document.documentElement.setAttribute('data-variant', 'black');
})();
"#;

pub const THEME_FUNCTIONS: &str = r#"
function setTheme(t) {
    document.documentElement.setAttribute('data-theme', t === 'black' ? 'dark' : t);
    if (t === 'black') {
        document.documentElement.setAttribute('data-variant', 'black');
    } else {
        document.documentElement.removeAttribute('data-variant');
    }
    localStorage.setItem('hnc-theme', t);
    updateThemeButtons();
}
function updateThemeButtons() {
    const variant = document.documentElement.getAttribute('data-variant');
    const theme = variant === 'black' ? 'black' : (document.documentElement.getAttribute('data-theme') || 'dark');
    document.querySelectorAll('[data-theme-choice]').forEach(btn => {
        btn.classList.toggle('active', btn.dataset.themeChoice === theme);
    });
}
document.querySelectorAll('[data-theme-choice]').forEach(btn => {
    btn.addEventListener('click', () => setTheme(btn.dataset.themeChoice));
});
updateThemeButtons();
"#;
