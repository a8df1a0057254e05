use axum::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::headers::{Cookie, HeaderMapExt};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::config::{SESSION_COOKIE, SESSION_COOKIE_MAX_AGE};
use crate::err::{Envelope, Error};
use crate::models::StudentProfile;
use crate::session::{mint_token, Identity, Session};
use crate::state::AppState;
use crate::{proceeds, Payload};

pub const LOGIN_FAILED: &str = "Invalid enrollment number or password";

/// Checks the credentials and opens a session. Unknown accounts and wrong
/// passwords produce the same failed envelope.
pub async fn login(
    state: &AppState,
    enrollment_number: &str,
    password: &str,
) -> Result<Envelope<LoginOutcome>, Error> {
    let student = state.students.find_student(enrollment_number).await?;
    let hash = student.as_ref().map(|s| s.password_hash.as_str());
    let matches = state.hasher.verify(password, hash).await?;

    let student = match student {
        Some(student) if matches => student,
        _ => {
            log::warn!("Failed login attempt for `{}`", enrollment_number);
            return Ok(Envelope::failed(LoginOutcome {
                message: LOGIN_FAILED.to_string(),
                user: None,
                session_token: None,
            }));
        }
    };

    let token = mint_token();
    let identity = student.profile();
    state
        .sessions
        .create(&token, Session::new(identity.clone()))
        .await?;
    log::info!("`{}` logged in as {}", identity.enrollment_number, identity.role);

    Ok(Envelope::of(LoginOutcome {
        message: "Login successful".to_string(),
        user: Some(identity),
        session_token: Some(token),
    }))
}

pub async fn logout(state: &AppState, token: Option<&str>) -> Result<(), Error> {
    if let Some(token) = token {
        if let Some(session) = state.sessions.delete(token).await? {
            log::info!(
                "`{}` logged out after {} minutes",
                session.identity.enrollment_number,
                session.age().num_minutes()
            );
        }
    }
    Ok(())
}

/// The gate in front of every authenticated operation.
pub async fn resolve(state: &AppState, token: Option<&str>) -> Result<Identity, Error> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or_else(Error::unauthenticated)?;
    match state.sessions.get(token).await? {
        Some(session) => Ok(session.identity),
        None => Err(Error::unauthenticated()),
    }
}

pub fn require_admin(identity: &Identity) -> Result<(), Error> {
    if identity.is_admin() {
        Ok(())
    } else {
        log::debug!("`{}` denied admin access", identity.enrollment_number);
        Err(Error::forbidden())
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string))
}

fn session_cookie(token: &str, max_age: u32) -> Result<HeaderValue, Error> {
    let cookie = format!(
        "{}={}; HttpOnly; Max-Age={}; Path=/; SameSite=Lax",
        SESSION_COOKIE, token, max_age
    );
    HeaderValue::from_str(&cookie).map_err(|e| Error::internal("HeaderError", e.to_string()))
}

/// Extracts the identity bound to the request's session cookie.
pub struct Authenticated(pub Identity);

#[async_trait]
impl<B> FromRequest<B> for Authenticated
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let state = req
            .extensions()
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| Error::internal("StateError", "application state missing"))?;
        let token = session_token(req.headers());
        resolve(&state, token.as_deref()).await.map(Authenticated)
    }
}

pub async fn login_handler(
    Extension(state): Extension<AppState>,
    Json(login_data): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<Envelope<LoginOutcome>>), Error> {
    let outcome = login(&state, &login_data.enrollment_number, &login_data.password).await?;
    let mut headers = HeaderMap::new();
    if let Some(token) = &outcome.value().session_token {
        headers.insert(SET_COOKIE, session_cookie(token, SESSION_COOKIE_MAX_AGE)?);
    }
    Ok((headers, Json(outcome)))
}

pub async fn logout_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<Envelope<Message>>), Error> {
    logout(&state, session_token(&headers).as_deref()).await?;
    let mut cleared = HeaderMap::new();
    cleared.insert(SET_COOKIE, session_cookie("", 0)?);
    Ok((
        cleared,
        Json(Envelope::of(Message::new("Logged out successfully"))),
    ))
}

pub async fn me_handler(Authenticated(user): Authenticated) -> Payload<Me> {
    proceeds(Me { user })
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub enrollment_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<StudentProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Me {
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
