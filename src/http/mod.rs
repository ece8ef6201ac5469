//! HTTP surface of the certificate authority.
//!
//! - `GET /certificates/ca.crt`: the CA certificate as PEM, unauthenticated.
//! - `POST /certificates/sign`: signs a multipart-uploaded CSR, requires a
//!   bearer token.

pub mod auth;
pub mod certificates;
pub mod error;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::authority::CertificateAuthority;
use auth::Authenticator;

/// Shared state passed to all handlers.
pub struct AppState {
    pub authority: Arc<CertificateAuthority>,
    pub authenticator: Arc<dyn Authenticator>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/certificates/sign", post(certificates::sign))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/certificates/ca.crt", get(certificates::ca_certificate))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::Certificate;
    use crate::cert::params::{DistinguishedName, RequestAttributes};
    use crate::config::IssuancePolicy;
    use crate::store::PkiStore;
    use crate::worker::CryptoPool;
    use auth::StaticTokenAuthenticator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";
    const BOUNDARY: &str = "vpn-pki-test-boundary";

    struct Fixture {
        _dir: TempDir,
        authority: Arc<CertificateAuthority>,
        router: Router,
    }

    async fn fixture(with_ca: bool) -> Fixture {
        let dir = tempdir().expect("tempdir should be created");
        let authority = Arc::new(CertificateAuthority::new(
            PkiStore::new(dir.path().join("pki")),
            IssuancePolicy::default(),
            CryptoPool::new(2),
        ));
        if with_ca {
            authority
                .build_ca(
                    DistinguishedName::builder()
                        .organization("Community VPN".to_string())
                        .common_name("Community VPN".to_string())
                        .build(),
                )
                .await
                .unwrap();
        }

        let router = build_router(Arc::new(AppState {
            authority: authority.clone(),
            authenticator: Arc::new(StaticTokenAuthenticator::new(Some(TOKEN.to_string()))),
        }));
        Fixture {
            _dir: dir,
            authority,
            router,
        }
    }

    async fn csr_pem(authority: &CertificateAuthority) -> String {
        let attributes: RequestAttributes = DistinguishedName::builder()
            .common_name("test-client".to_string())
            .build()
            .into();
        authority
            .generate_request(attributes)
            .await
            .unwrap()
            .csr
            .to_pem()
            .unwrap()
    }

    fn multipart_body(role: Option<&str>, csr: Option<&str>) -> String {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nignored\r\n"
        );
        if let Some(role) = role {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\n{role}\r\n"
            ));
        }
        if let Some(csr) = csr {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"csr\"; filename=\"request.csr\"\r\nContent-Type: application/pkcs10\r\n\r\n{csr}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn sign_request(token: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/certificates/sign")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn ca_certificate_is_served_as_pem() {
        let fixture = fixture(true).await;
        let response = fixture
            .router
            .oneshot(
                Request::get("/certificates/ca.crt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-x509-ca-cert"
        );
        assert_eq!(
            body_text(response).await,
            fixture.authority.ca_certificate_pem().unwrap()
        );
    }

    #[tokio::test]
    async fn ca_certificate_without_ca_is_server_error() {
        let fixture = fixture(false).await;
        let response = fixture
            .router
            .oneshot(
                Request::get("/certificates/ca.crt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn sign_requires_a_valid_token() {
        let fixture = fixture(true).await;
        let csr = csr_pem(&fixture.authority).await;

        let response = fixture
            .router
            .clone()
            .oneshot(sign_request(None, multipart_body(Some("client"), Some(&csr))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = fixture
            .router
            .oneshot(sign_request(
                Some("wrong"),
                multipart_body(Some("client"), Some(&csr)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_returns_client_certificate() {
        let fixture = fixture(true).await;
        let csr = csr_pem(&fixture.authority).await;

        let response = fixture
            .router
            .oneshot(sign_request(
                Some(TOKEN),
                multipart_body(Some("client"), Some(&csr)),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-x509-user-cert"
        );
        let cert = Certificate::from_pem(&body_text(response).await).unwrap();
        let ca = fixture.authority.ca_state().unwrap();
        assert_eq!(cert.issuer(), ca.certificate().subject());
    }

    #[tokio::test]
    async fn sign_reports_missing_parameters() {
        let fixture = fixture(true).await;

        let response = fixture
            .router
            .clone()
            .oneshot(sign_request(Some(TOKEN), multipart_body(None, None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_text(response)
                .await
                .contains("Missing required parameters: type, csr")
        );

        let response = fixture
            .router
            .oneshot(sign_request(Some(TOKEN), multipart_body(Some("server"), None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_text(response)
                .await
                .contains("Missing required parameters: csr")
        );
    }

    #[tokio::test]
    async fn sign_rejects_unknown_type_and_bad_csr() {
        let fixture = fixture(true).await;
        let csr = csr_pem(&fixture.authority).await;

        let response = fixture
            .router
            .clone()
            .oneshot(sign_request(
                Some(TOKEN),
                multipart_body(Some("ca"), Some(&csr)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Invalid value for type"));

        let response = fixture
            .router
            .oneshot(sign_request(
                Some(TOKEN),
                multipart_body(Some("client"), Some("not a csr")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn truncated_upload_is_a_client_error() {
        let fixture = fixture(true).await;
        let csr = csr_pem(&fixture.authority).await;
        let body = multipart_body(Some("client"), Some(&csr));
        let truncated = body[..body.len() / 2].to_string();

        let response = fixture
            .router
            .oneshot(sign_request(Some(TOKEN), truncated))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
