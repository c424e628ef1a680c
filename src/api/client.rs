//! HTTP implementation of [`ZoneApi`] on top of reqwest.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{ImportTarget, NewBoundary, NewZone, ZoneApi, ZonePatch};
use crate::config::ApiConfig;
use crate::error::{ApiError, GENERIC_REMOTE_MESSAGE};
use crate::models::{BoundaryType, Zone, ZoneId, ZoningClassification};

const CSRF_HEADER: &str = "X-CSRF-TOKEN";

pub struct HttpZoneApi {
    client: Client,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpZoneApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("zonemap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base: base_url(&config.base_url)?,
            csrf_token: config.csrf_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a path relative to the API root
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mutating = method != Method::GET;
        let mut req = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if mutating {
            if let Some(token) = &self.csrf_token {
                req = req.header(CSRF_HEADER, token);
            }
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Backend request failed with status {}", status);
        Err(remote_error(status.as_u16(), &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self.send(self.request(Method::GET, url)).await?;
        decode(&response.bytes().await?)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        let mut req = self.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(req).await?;
        Ok(())
    }
}

impl ZoneApi for HttpZoneApi {
    async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        self.get_json("zones").await
    }

    async fn get_zone(&self, id: ZoneId) -> Result<Zone, ApiError> {
        self.get_json(&format!("zones/{}", id)).await
    }

    async fn list_classifications(
        &self,
        active_only: bool,
    ) -> Result<Vec<ZoningClassification>, ApiError> {
        if active_only {
            self.get_json("classifications?active_only=1").await
        } else {
            self.get_json("classifications").await
        }
    }

    async fn municipal_boundary(&self) -> Result<Option<Zone>, ApiError> {
        let zone: Option<Zone> = match self.get_json("municipal-boundary").await {
            Ok(zone) => zone,
            Err(ApiError::Remote { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                None
            }
            Err(e) => return Err(e),
        };
        Ok(zone.map(|z| with_boundary_type(z, BoundaryType::Municipal)))
    }

    async fn barangay_boundaries(&self) -> Result<Vec<Zone>, ApiError> {
        let zones: Vec<Zone> = self.get_json("barangay-boundaries").await?;
        Ok(zones
            .into_iter()
            .map(|z| with_boundary_type(z, BoundaryType::Barangay))
            .collect())
    }

    async fn create_zone(&self, zone: &NewZone) -> Result<(), ApiError> {
        self.send_json(Method::POST, "zones", Some(zone)).await
    }

    async fn create_municipal(&self, boundary: &NewBoundary) -> Result<(), ApiError> {
        self.send_json(Method::POST, "municipal-boundary", Some(boundary))
            .await
    }

    async fn create_barangay(&self, boundary: &NewBoundary) -> Result<(), ApiError> {
        self.send_json(Method::POST, "barangay-boundaries", Some(boundary))
            .await
    }

    async fn update_zone(&self, id: ZoneId, patch: &ZonePatch) -> Result<(), ApiError> {
        self.send_json(Method::PATCH, &format!("zones/{}", id), Some(patch))
            .await
    }

    async fn update_barangay(&self, id: ZoneId, patch: &ZonePatch) -> Result<(), ApiError> {
        self.send_json(
            Method::PUT,
            &format!("barangay-boundaries/{}", id),
            Some(patch),
        )
        .await
    }

    async fn delete_zone(&self, id: ZoneId) -> Result<(), ApiError> {
        self.send_json::<()>(Method::DELETE, &format!("zones/{}", id), None)
            .await
    }

    async fn export_geojson(&self) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint("export")?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn import_geojson(
        &self,
        target: ImportTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("import")?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/geo+json")?;
        let form = Form::new().text("target", target.as_str()).part("file", part);

        debug!("Importing {} into {}", file_name, target);
        self.send(self.request(Method::POST, url).multipart(form))
            .await?;
        Ok(())
    }
}

/// Parse the configured root, making sure relative joins stay beneath it
fn base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Decode a body that may or may not be wrapped as `{"data": ...}`
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(serde_json::from_value(unwrap_data(value))?)
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn remote_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_REMOTE_MESSAGE.to_string());
    ApiError::Remote { status, message }
}

fn with_boundary_type(mut zone: Zone, boundary_type: BoundaryType) -> Zone {
    zone.boundary_type = boundary_type;
    zone
}
