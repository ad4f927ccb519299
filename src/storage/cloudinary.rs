//! Cloudinary blob store.
//!
//! Talks to the Cloudinary upload API with signed form posts. Content is sent
//! inline as a base64 `data:` URI, which the service caps at 10 MiB.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{multipart::Form, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{
    check_inline_limit, join_remote_id, validate_remote_id, BlobStore, ResourceKind, StoredObject,
};
use crate::config::{SignatureAlgorithm, StorageConfig};
use crate::{MediaError, Result};

/// User-Agent header value.
const USER_AGENT: &str = concat!("mediabox/", env!("CARGO_PKG_VERSION"));

/// Resource as returned by upload, rename and the admin lookup.
#[derive(Debug, Deserialize)]
struct ResourceResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Blob store backed by the Cloudinary API.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryStore {
    /// Create a new store from the storage configuration.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MediaError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            signature_algorithm: config.signature_algorithm,
        })
    }

    /// Upload API endpoint, e.g. `.../v1_1/<cloud>/video/rename`.
    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base, self.cloud_name, resource_type, action
        )
    }

    /// Admin API endpoint describing a single uploaded resource.
    fn resource_endpoint(&self, kind: ResourceKind, public_id: &str) -> String {
        format!(
            "{}/v1_1/{}/resources/{}/upload/{}",
            self.api_base,
            self.cloud_name,
            kind.as_str(),
            public_id
        )
    }

    /// Compute the request signature.
    ///
    /// Parameters are serialized as `k=v` pairs sorted by key and joined with
    /// `&`; the API secret is appended and the whole string hashed with the
    /// configured digest.
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        match self.signature_algorithm {
            SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, &self.api_secret),
            SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, &self.api_secret),
        }
    }

    /// Build a signed multipart form. `file` is sent but never signed.
    fn signed_form(&self, mut params: BTreeMap<&'static str, String>, file: Option<String>) -> Form {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        // SHA-1 is the service default and needs no marker.
        if self.signature_algorithm == SignatureAlgorithm::Sha256 {
            params.insert("signature_algorithm", "sha256".to_string());
        }

        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        if let Some(file) = file {
            form = form.text("file", file);
        }
        form.text("api_key", self.api_key.clone())
            .text("signature", signature)
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        url: String,
        action: &str,
        form: Form,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Storage(format!("{action} request failed: {e}")))?;

        parse_response(response, action).await
    }
}

/// Encode content as a `data:` URI with the MIME type guessed from the id.
fn data_uri(content: &[u8], remote_id: &str) -> String {
    let mime = mime_guess::from_path(remote_id).first_or_octet_stream();
    format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(content))
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    action: &str,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(MediaError::Storage(format!(
            "{action} failed ({status}): {message}"
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| MediaError::Storage(format!("{action}: unexpected response: {e}")))
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn upload(
        &self,
        content: &[u8],
        folder: &str,
        desired_id: Option<&str>,
    ) -> Result<StoredObject> {
        check_inline_limit(content)?;

        let name = match desired_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let remote_id = join_remote_id(folder, &name);
        validate_remote_id(&remote_id)?;

        let mut params = BTreeMap::new();
        params.insert("public_id", remote_id.clone());
        let form = self.signed_form(params, Some(data_uri(content, &remote_id)));

        let resource: ResourceResponse = self
            .post_signed(self.endpoint("auto", "upload"), "upload", form)
            .await?;

        tracing::debug!(remote_id = %resource.public_id, "Uploaded {} bytes", content.len());

        Ok(StoredObject {
            remote_id: resource.public_id,
            url: resource.secure_url,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<bool> {
        let kind = ResourceKind::from_remote_id(remote_id);

        let mut params = BTreeMap::new();
        params.insert("public_id", remote_id.to_string());
        let form = self.signed_form(params, None);

        let response: DestroyResponse = self
            .post_signed(self.endpoint(kind.as_str(), "destroy"), "destroy", form)
            .await?;

        match response.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(MediaError::Storage(format!(
                "destroy returned unexpected result: {other}"
            ))),
        }
    }

    async fn rename(&self, from_remote_id: &str, to_remote_id: &str) -> Result<StoredObject> {
        validate_remote_id(to_remote_id)?;
        let kind = ResourceKind::from_remote_id(from_remote_id);

        let mut params = BTreeMap::new();
        params.insert("from_public_id", from_remote_id.to_string());
        params.insert("to_public_id", to_remote_id.to_string());
        let form = self.signed_form(params, None);

        let resource: ResourceResponse = self
            .post_signed(self.endpoint(kind.as_str(), "rename"), "rename", form)
            .await?;

        Ok(StoredObject {
            remote_id: resource.public_id,
            url: resource.secure_url,
        })
    }

    async fn fetch(&self, remote_id: &str) -> Result<Option<Vec<u8>>> {
        let kind = ResourceKind::from_remote_id(remote_id);

        let response = self
            .client
            .get(self.resource_endpoint(kind, remote_id))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource: ResourceResponse = parse_response(response, "lookup").await?;

        let response = self.client.get(&resource.secure_url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MediaError::Storage(format!(
                "download failed: HTTP {}",
                response.status()
            )));
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}

fn hex_digest<D: Digest>(payload: &str, secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
