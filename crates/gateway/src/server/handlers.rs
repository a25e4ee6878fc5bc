//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    DecryptRequest, DecryptResponse, EncryptRequest, ErrorResponse, HealthResponse,
    RecordPayload, RoundTripResponse,
};
use common::ServiceError;
use cryptosphere::{CryptoError, EncryptionEnvelope};
use tracing::{debug, info, warn};

use super::state::AppState;
use crate::records;

/// Handler error: a [`ServiceError`] rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<CryptoError> for ApiError {
    fn from(e: CryptoError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        } else {
            debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Run a CPU-bound codec call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("codec task failed: {e}")))?
        .map_err(ApiError)
}

/// `POST /v1/encrypt`: encrypt `data` into a fresh envelope.
pub async fn encrypt(
    State(state): State<AppState>,
    Json(req): Json<EncryptRequest>,
) -> Result<Json<EncryptionEnvelope>, ApiError> {
    let params = req.into_params()?;
    let encryptor = state.encryptor.clone();
    let envelope = run_blocking(move || Ok(encryptor.encrypt(params)?)).await?;
    Ok(Json(envelope))
}

/// `POST /v1/decrypt`: authenticate and decrypt an envelope.
pub async fn decrypt(
    State(state): State<AppState>,
    Json(req): Json<DecryptRequest>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let encryptor = state.encryptor.clone();
    let out = run_blocking(move || Ok(encryptor.decrypt(&req)?)).await?;
    Ok(Json(out))
}

/// `POST /v1/roundtrip`: encrypt then decrypt, returning all three forms.
///
/// Diagnostic only; production callers store the envelope from
/// `/v1/encrypt` and decrypt later.
pub async fn roundtrip(
    State(state): State<AppState>,
    Json(req): Json<EncryptRequest>,
) -> Result<Json<RoundTripResponse>, ApiError> {
    let original = req.data.clone();
    let params = req.into_params()?;
    let encryptor = state.encryptor.clone();
    let (envelope, decrypted) = run_blocking(move || {
        let envelope = encryptor.encrypt(params)?;
        let decrypted = encryptor.decrypt(&envelope.to_decrypt_params())?;
        Ok((envelope, decrypted.decrypted))
    })
    .await?;
    Ok(Json(RoundTripResponse {
        original,
        envelope,
        decrypted,
    }))
}

/// `POST /v1/records/:entity/encrypt`: encrypt the policy fields of a record.
pub async fn encrypt_record(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(req): Json<RecordPayload>,
) -> Result<Json<RecordPayload>, ApiError> {
    let policy = state
        .policies
        .get(&entity)
        .map_err(|_| ServiceError::NotFound(entity.clone()))?;
    let encryptor = state.encryptor.clone();
    let mut payload = req.payload;
    let payload = run_blocking(move || {
        let count = records::encrypt_record(encryptor.as_ref(), &entity, &policy, &mut payload)?;
        info!(entity = %entity, fields = count, "record fields encrypted");
        Ok(payload)
    })
    .await?;
    Ok(Json(RecordPayload { payload }))
}

/// `POST /v1/records/:entity/decrypt`: decrypt the policy fields of a record.
pub async fn decrypt_record(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(req): Json<RecordPayload>,
) -> Result<Json<RecordPayload>, ApiError> {
    let policy = state
        .policies
        .get(&entity)
        .map_err(|_| ServiceError::NotFound(entity.clone()))?;
    let encryptor = state.encryptor.clone();
    let mut payload = req.payload;
    let payload = run_blocking(move || {
        let count = records::decrypt_record(encryptor.as_ref(), &policy, &mut payload)?;
        info!(entity = %entity, fields = count, "record fields decrypted");
        Ok(payload)
    })
    .await?;
    Ok(Json(RecordPayload { payload }))
}

/// `GET /health`: liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        policies_loaded: state.policies.len(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
