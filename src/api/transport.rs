use crate::config::settings::{Credentials, ProviderConfig};
use crate::errors::{JetError, Result};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("jet/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated JSON-over-HTTPS channel to one provider.
///
/// Built once per command and shared by every request that command makes.
pub struct Transport {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

/// A response whose body has already been read.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Maps a failed status onto the matching error.
    ///
    /// `action` completes "you may not have permission to ..." and `entity`
    /// names what was missing on a 404.
    pub fn classify(self, action: &str, entity: &str) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        match self.status {
            StatusCode::UNAUTHORIZED => Err(JetError::AuthFailed),
            StatusCode::FORBIDDEN => Err(JetError::forbidden(action)),
            StatusCode::NOT_FOUND => Err(JetError::not_found(entity)),
            StatusCode::BAD_REQUEST => Err(JetError::Validation {
                status: self.status.as_u16(),
                detail: self.text().trim().to_string(),
            }),
            status => Err(JetError::Api {
                status: status.as_u16(),
                action: action.to_string(),
            }),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Transport {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .use_preconfigured_tls(tls_config()?)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| JetError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<RawResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<RawResponse> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Sends one request relative to the base URL and reads the whole body.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        self.execute(method, &url, path, body).await
    }

    /// Fetches an absolute URL (attachment content) with the same credentials.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.execute::<()>(Method::GET, url, url, None).await?;
        Ok(response
            .classify("download attachment", "Attachment")?
            .body)
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        label: &str,
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let (user, token) = self.credentials.basic_auth().ok_or(JetError::AuthMissing)?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .basic_auth(user, Some(token))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(
            %method,
            path = label,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request complete"
        );

        Ok(RawResponse { status, body })
    }
}

/// Appends an encoded query string to `path`.
pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

/// TLS 1.2+ with AEAD suites only.
fn tls_config() -> Result<rustls::ClientConfig> {
    use rustls::crypto::ring::{cipher_suite, default_provider};

    let provider = rustls::crypto::CryptoProvider {
        cipher_suites: vec![
            cipher_suite::TLS13_AES_256_GCM_SHA384,
            cipher_suite::TLS13_AES_128_GCM_SHA256,
            cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
            cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        ],
        ..default_provider()
    };

    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|e| JetError::Network(format!("TLS setup failed: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(config)
}
