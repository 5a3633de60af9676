//! Login entry point and logout.
//!
//! Flow Overview:
//! 1) `GET /login` renders the form, carrying `callbackUrl` in a hidden field.
//! 2) `POST /login` verifies the credentials, issues a session cookie, and
//!    redirects to the sanitized callback.
//! 3) `POST /logout` clears the cookie. The token itself stays valid until it
//!    expires.

use axum::{
    extract::{Extension, Form, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::{
    session::{clear_session_cookie, now_unix_seconds, session_cookie},
    state::AuthState,
    utils::{
        escape_html, normalize_email, sanitize_callback, valid_email, LOGIN_PATH, MIN_PASSWORD_LEN,
    },
};

const MSG_MISSING_FIELDS: &str = "Email and password required.";
const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials.";
const MSG_SOMETHING_WENT_WRONG: &str = "Something went wrong.";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Path to land on after a successful login.
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"***")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form", content_type = "text/html", body = String)
    ),
    tag = "auth"
)]
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    let callback = sanitize_callback(query.callback_url.as_deref());
    Html(render_login_page(&callback, "", None))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content = LoginForm,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 303, description = "Signed in; redirects to the callback path"),
        (status = 400, description = "Email or password missing", content_type = "text/html", body = String),
        (status = 401, description = "Invalid credentials", content_type = "text/html", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let callback = sanitize_callback(form.callback_url.as_deref());

    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    if email.trim().is_empty() || password.is_empty() {
        return login_error(StatusCode::BAD_REQUEST, &callback, &email, MSG_MISSING_FIELDS);
    }

    if !valid_email(&normalize_email(&email)) || password.chars().count() < MIN_PASSWORD_LEN {
        info!("Login rejected: malformed email or short password");
        return login_error(
            StatusCode::UNAUTHORIZED,
            &callback,
            &email,
            MSG_INVALID_CREDENTIALS,
        );
    }

    let password = SecretString::from(password);
    let identity = match auth_state.verifier().verify(&email, &password).await {
        Ok(identity) => identity,
        Err(_) => {
            return login_error(
                StatusCode::UNAUTHORIZED,
                &callback,
                &email,
                MSG_INVALID_CREDENTIALS,
            );
        }
    };

    let now = now_unix_seconds();
    let issued = match auth_state.issuer().issue_at(&identity, now) {
        Ok(issued) => issued,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return login_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &callback,
                &email,
                MSG_SOMETHING_WENT_WRONG,
            );
        }
    };

    let cookie = match session_cookie(auth_state.config(), &issued, now) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return login_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &callback,
                &email,
                MSG_SOMETHING_WENT_WRONG,
            );
        }
    };

    info!(user_id = %identity.user_id, "User signed in");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (headers, Redirect::to(&callback)).into_response()
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cookie cleared; redirects to /login")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> Response {
    // Always clear the cookie; there is no server-side session to delete.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    (headers, Redirect::to(LOGIN_PATH)).into_response()
}

fn login_error(status: StatusCode, callback: &str, email: &str, message: &str) -> Response {
    (status, Html(render_login_page(callback, email, Some(message)))).into_response()
}

fn render_login_page(callback: &str, email: &str, error: Option<&str>) -> String {
    let error_block = error.map_or_else(String::new, |message| {
        format!(
            "    <p class=\"error\" role=\"alert\">{}</p>\n",
            escape_html(message)
        )
    });
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Log in | Ledgerly</title>
</head>
<body>
  <main>
    <h1>Please log in to continue.</h1>
    <form method="post" action="{LOGIN_PATH}">
      <label for="email">Email</label>
      <input id="email" type="email" name="email" value="{email}" required>
      <label for="password">Password</label>
      <input id="password" type="password" name="password" minlength="{MIN_PASSWORD_LEN}" required>
      <input type="hidden" name="callbackUrl" value="{callback}">
      <button type="submit">Log in</button>
    </form>
{error_block}  </main>
</body>
</html>
"#,
        email = escape_html(email),
        callback = escape_html(callback),
    )
}
