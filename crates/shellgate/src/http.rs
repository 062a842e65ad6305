//! The HTTP surface: credentials, bootstrap, and sandboxed file access.
//!
//! Every handler here is thin: extract, call into the owning layer, map
//! the result onto a status code. Error bodies are deliberately generic —
//! credential failures never say which half was wrong, sandbox violations
//! never echo the offending path.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shellgate_auth::{AuthError, NewUser, Principal, SessionClaims, StoreError};
use shellgate_protocol::UserSummary;
use shellgate_sandbox::{DirEntry, FileContent, Sandbox, SandboxError};

use crate::server::AppState;

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// HTTP-facing error: a status plus a generic message.
pub(crate) struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    const UNAUTHORIZED: Self =
        Self::new(StatusCode::UNAUTHORIZED, "invalid credentials");
    const FORBIDDEN: Self = Self::new(StatusCode::FORBIDDEN, "access denied");
    const NOT_FOUND: Self = Self::new(StatusCode::NOT_FOUND, "not found");
    const CONFLICT: Self = Self::new(StatusCode::CONFLICT, "conflict");
    const BAD_REQUEST: Self =
        Self::new(StatusCode::BAD_REQUEST, "bad request");
    const INTERNAL: Self =
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::UNAUTHORIZED,
            AuthError::DuplicateUsername => Self::CONFLICT,
            AuthError::Store(e) => e.into(),
            AuthError::HashingFailed | AuthError::TokenIssue => Self::INTERNAL,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Registry trouble is always loud and always opaque to clients.
        tracing::error!(error = %err, "registry failure");
        Self::INTERNAL
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::AccessDenied => Self::FORBIDDEN,
            SandboxError::NotFound => Self::NOT_FOUND,
            SandboxError::InvalidRoot(_) | SandboxError::Io(_) => {
                tracing::error!(error = %err, "sandboxed io failure");
                Self::INTERNAL
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials & bootstrap
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub(crate) struct LoginResponse {
    token: String,
    user: UserSummary,
}

/// `POST /login` — exchange a username/password for a session token.
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .store()
        .authenticate(&req.username, &req.password)
        .await?;
    let token = state.keys().issue(&user)?;
    Ok(Json(LoginResponse {
        token,
        user: user.summary(),
    }))
}

/// `GET /session` — the current principal, re-verified from the token.
pub(crate) async fn session(Principal(claims): Principal) -> Json<UserSummary> {
    Json(claims.summary())
}

/// `POST /users` — create a user. Any authenticated caller may do this in
/// the minimal system; finer roles are an external concern.
pub(crate) async fn create_user(
    State(state): State<AppState>,
    Principal(_claims): Principal,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let user = state.store().create_user(new).await?;
    Ok((StatusCode::CREATED, Json(user.summary())))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetupStatus {
    has_users: bool,
}

/// `GET /setup-status` — whether the one-time bootstrap is still open.
///
/// Errors when the registry's state cannot be confirmed; "unknown" must
/// never read as "no users".
pub(crate) async fn setup_status(
    State(state): State<AppState>,
) -> Result<Json<SetupStatus>, ApiError> {
    let has_users = state.store().has_any_user().await?;
    Ok(Json(SetupStatus { has_users }))
}

/// `POST /setup` — unauthenticated creation of the *first* user. Closed
/// forever once any user exists.
pub(crate) async fn setup(
    State(state): State<AppState>,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    if state.store().has_any_user().await? {
        return Err(ApiError::CONFLICT);
    }
    let user = state.store().create_user(new).await?;
    tracing::info!(username = %user.username, "bootstrap user created");
    Ok((StatusCode::CREATED, Json(user.summary())))
}

// ---------------------------------------------------------------------------
// Sandboxed file access
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct PathQuery {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ListResponse {
    entries: Vec<DirEntry>,
}

#[derive(Deserialize)]
pub(crate) struct WriteRequest {
    path: String,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadResponse {
    name: String,
    size: u64,
}

/// Opens the caller's sandbox. The home directory is created at user
/// creation, so a missing root here is an operational fault, not a 404.
fn sandbox_for(claims: &SessionClaims) -> Result<Sandbox, ApiError> {
    Sandbox::new(&claims.home).map_err(ApiError::from)
}

/// `GET /files?path=` — list a directory.
pub(crate) async fn files_list(
    Principal(claims): Principal,
    Query(query): Query<PathQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let sandbox = sandbox_for(&claims)?;
    let entries = sandbox.list(query.path.as_deref().unwrap_or("")).await?;
    Ok(Json(ListResponse { entries }))
}

/// `GET /files/content?path=` — read a file. Binary files come back as
/// metadata only.
pub(crate) async fn file_read(
    Principal(claims): Principal,
    Query(query): Query<PathQuery>,
) -> Result<Json<FileContent>, ApiError> {
    let sandbox = sandbox_for(&claims)?;
    let path = query.path.ok_or(ApiError::BAD_REQUEST)?;
    Ok(Json(sandbox.read(&path).await?))
}

/// `PUT /files/content` — write (or overwrite) a text file.
pub(crate) async fn file_write(
    Principal(claims): Principal,
    Json(req): Json<WriteRequest>,
) -> Result<StatusCode, ApiError> {
    let sandbox = sandbox_for(&claims)?;
    sandbox.write(&req.path, req.content.as_bytes()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /files/upload` — multipart upload into the sandbox. An optional
/// `path` field names the target directory; the file keeps its own name.
/// The request body cap (configured on the router) bounds the size.
pub(crate) async fn file_upload(
    Principal(claims): Principal,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let sandbox = sandbox_for(&claims)?;

    let mut target_dir = String::new();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BAD_REQUEST)?
    {
        match field.name() {
            Some("path") => {
                target_dir = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BAD_REQUEST)?;
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(ToOwned::to_owned)
                    .ok_or(ApiError::BAD_REQUEST)?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BAD_REQUEST)?;
                upload = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (name, bytes) = upload.ok_or(ApiError::BAD_REQUEST)?;
    let requested = if target_dir.is_empty() {
        name.clone()
    } else {
        format!("{target_dir}/{name}")
    };
    sandbox.write(&requested, &bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            name,
            size: bytes.len() as u64,
        }),
    ))
}

/// `DELETE /files?path=` — delete a file or directory (recursive).
pub(crate) async fn files_delete(
    Principal(claims): Principal,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, ApiError> {
    let sandbox = sandbox_for(&claims)?;
    let path = query.path.ok_or(ApiError::BAD_REQUEST)?;
    sandbox.remove(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}
