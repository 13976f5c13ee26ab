use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::dto::SupplyChainDto;
use super::pager::{PagedRequest, Pager, NEXT_CURSOR_HEADER};
use crate::errors::ApiError;
use crate::types::TurboConfig;

const API_PREFIX: &str = "/api/v3";

/// Authenticated session against the platform REST API. One client is
/// created per run and reused for every query; the session cookie is kept
/// in the underlying `reqwest` cookie store.
pub struct TurboClient {
    http: reqwest::Client,
    base_url: String,
}

/// Raw body of one response plus the pagination cursor header.
pub(crate) struct RawResponse {
    pub body: String,
    pub next_cursor: Option<String>,
}

impl RawResponse {
    pub(crate) fn decode<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let body = self.body.trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let decode_err = |source: serde_json::Error| ApiError::Decode {
            path: path.to_string(),
            source,
        };
        // Some endpoints answer with a bare object instead of a list
        if body.starts_with('{') {
            return serde_json::from_str(body).map(|item| vec![item]).map_err(decode_err);
        }
        serde_json::from_str(body).map_err(decode_err)
    }
}

impl TurboClient {
    /// Builds an unauthenticated client.
    pub fn new(cfg: &TurboConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!cfg.verify_ssl)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|source| ApiError::Transport {
                path: "client setup".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: api_base_url(&cfg.host),
        })
    }

    /// Builds a client and logs in.
    pub async fn connect(cfg: &TurboConfig) -> Result<Self, ApiError> {
        let client = Self::new(cfg)?;
        client.login(&cfg.username, &cfg.password).await?;
        info!(base_url = %client.base_url, user = %cfg.username, "connected to platform API");
        Ok(client)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let path = "login";
        let res = self
            .http
            .post(self.url(path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Auth(username.to_string()))
            }
            status => Err(ApiError::Status {
                method: Method::POST.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Entity search by type, e.g. `["Namespace"]`.
    pub fn search<T: DeserializeOwned>(&self, types: &[&str]) -> Pager<'_, T> {
        Pager::new(
            self,
            PagedRequest {
                method: Method::GET,
                path: "search".to_string(),
                query: vec![("types".to_string(), types.join(","))],
                body: None,
            },
        )
    }

    /// Criteria search with a JSON search DTO.
    pub fn search_by_criteria<T: DeserializeOwned>(&self, dto: serde_json::Value) -> Pager<'_, T> {
        self.request(Method::POST, "search", &[], Some(dto))
    }

    /// Generic paged request against `path` (relative to `/api/v3`).
    pub fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        dto: Option<serde_json::Value>,
    ) -> Pager<'_, T> {
        Pager::new(
            self,
            PagedRequest {
                method,
                path: path.trim_start_matches('/').to_string(),
                query: query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                body: dto,
            },
        )
    }

    /// Supply chain (topology) of the given seeds, restricted to `types`.
    pub fn get_supply_chains(
        &self,
        uuids: &[&str],
        types: &[&str],
        aspects: &[&str],
    ) -> Pager<'_, SupplyChainDto> {
        let uuids = uuids.join(",");
        let types = types.join(",");
        let aspects = aspects.join(",");
        self.request(
            Method::GET,
            "supplychains",
            &[
                ("uuids", uuids.as_str()),
                ("types", types.as_str()),
                ("detail", "aspects"),
                ("aspects", aspects.as_str()),
                ("health", "true"),
            ],
            None,
        )
    }

    pub(crate) async fn send(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ApiError> {
        debug!(method = %method, path = %path, query = ?query, "api request");
        let mut req = self.http.request(method.clone(), self.url(path)).query(query);
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = res.status();
        let next_cursor = res
            .headers()
            .get(NEXT_CURSOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());
        let text = res.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth("session".to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(RawResponse {
            body: text,
            next_cursor,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// `turbo.example.com` becomes `https://turbo.example.com/api/v3`; hosts that
/// already carry a scheme keep it.
pub fn api_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{}", host, API_PREFIX)
    } else {
        format!("https://{}{}", host, API_PREFIX)
    }
}
