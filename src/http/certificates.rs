use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Extension, Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;

use super::AppState;
use super::auth::Caller;
use super::error::{ApiError, ApiResult};
use crate::error::PkiError;
use crate::role::CertificateRole;

pub const CA_CERT_CONTENT_TYPE: &str = "application/x-x509-ca-cert";
pub const USER_CERT_CONTENT_TYPE: &str = "application/x-x509-user-cert";

/// GET /certificates/ca.crt
pub async fn ca_certificate(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let pem = state.authority.ca_certificate_pem()?;
    Ok(([(header::CONTENT_TYPE, CA_CERT_CONTENT_TYPE)], pem))
}

/// POST /certificates/sign
///
/// Multipart fields: `type` (`client` or `server`) and `csr` (PEM file).
/// The whole body is read before anything is signed.
pub async fn sign(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut role: Option<String> = None;
    let mut csr: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(aborted_upload)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("type") => role = Some(field.text().await.map_err(aborted_upload)?),
            Some("csr") => {
                let bytes = field.bytes().await.map_err(aborted_upload)?;
                let pem = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    PkiError::MalformedInput("CSR is not valid UTF-8".to_string())
                })?;
                csr = Some(pem);
            }
            _ => {}
        }
    }

    let role = role.filter(|r| !r.is_empty());
    let csr = csr.filter(|c| !c.trim().is_empty());
    let (role, csr) = match (role, csr) {
        (Some(role), Some(csr)) => (role, csr),
        (role, csr) => {
            let mut missing = Vec::new();
            if role.is_none() {
                missing.push("type");
            }
            if csr.is_none() {
                missing.push("csr");
            }
            return Err(ApiError::BadRequest(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }
    };

    let role: CertificateRole = role.parse()?;
    tracing::debug!(caller = %caller.id, %role, "signing request");

    let certificate = match role {
        CertificateRole::Client => state.authority.sign_client_request(csr).await?,
        CertificateRole::Server => state.authority.sign_server_request(csr).await?,
    };

    Ok((
        [(header::CONTENT_TYPE, USER_CERT_CONTENT_TYPE)],
        certificate.to_pem()?,
    ))
}

fn aborted_upload(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid upload: {}", err.body_text()))
}
