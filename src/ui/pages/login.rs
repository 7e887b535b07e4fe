//! Operator sign-in and sign-out.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use dioxus::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::AppState;
use crate::auth::gate::LOGIN_PATH;
use crate::auth::{
    clear_cookie, console_login, cookie_value, safe_next, session_cookie, SESSION_COOKIE,
};
use crate::bus::BusEvent;
use crate::ui::components::PublicLayout;
use crate::ui::render;

#[component]
pub fn LoginPage(
    next: Option<String>,
    username: String,
    error: Option<String>,
    demo_hint: bool,
) -> Element {
    rsx! {
        PublicLayout { title: "Sign in".to_string(),
            article {
                header {
                    hgroup {
                        h2 { "Heatnet Console" }
                        p { "Sign in to manage the network" }
                    }
                }
                if let Some(error) = error {
                    p { class: "status-err", role: "alert", "{error}" }
                }
                form { method: "post", action: "/login",
                    if let Some(next) = next {
                        input { r#type: "hidden", name: "next", value: "{next}" }
                    }
                    label { "Username"
                        input { name: "username", value: "{username}", autocomplete: "username", required: true }
                    }
                    label { "Password"
                        input { name: "password", r#type: "password", autocomplete: "current-password", required: true }
                    }
                    button { r#type: "submit", "Sign in" }
                }
                if demo_hint {
                    footer { small { "Demo sign-in is available while the metering API is offline." } }
                }
                p { small { a { href: "/tenant/login", "Tenant portal" } } }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

fn demo_hint(state: &AppState) -> bool {
    state.config.demo.fallback && state.config.demo.username.is_some()
}

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LoginQuery>,
) -> Response {
    // Already signed in
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        if state.sessions.validate(&token).await.is_ok() {
            return Redirect::to(safe_next(params.next.as_deref())).into_response();
        }
    }
    let demo_hint = demo_hint(&state);
    render(rsx! {
        LoginPage { next: params.next, username: String::new(), demo_hint }
    })
    .into_response()
}

/// POST /login
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match console_login(&state.api, &state.config.demo, &form.username, &form.password).await {
        Ok(grant) => {
            let purged = state.sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "dropped expired console sessions");
            }
            let (token, session) = state
                .sessions
                .create(&grant.username, &grant.role, grant.demo)
                .await;
            info!(username = %session.username, demo = session.demo, "console session started");
            state.bus.publish(BusEvent::SessionStarted {
                username: session.username.clone(),
            });
            let cookie = session_cookie(SESSION_COOKIE, &token, state.sessions.ttl_secs());
            let target = safe_next(form.next.as_deref()).to_string();
            ([(SET_COOKIE, cookie)], Redirect::to(&target)).into_response()
        }
        Err(message) => {
            let demo_hint = demo_hint(&state);
            let page = render(rsx! {
                LoginPage {
                    next: form.next,
                    username: form.username,
                    error: Some(message),
                    demo_hint,
                }
            });
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        if let Some(session) = state.sessions.revoke(&token).await {
            info!(username = %session.username, "console session ended");
            state.bus.publish(BusEvent::SessionEnded {
                username: session.username,
            });
        }
    }
    (
        [(SET_COOKIE, clear_cookie(SESSION_COOKIE))],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}
