use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Lesson, LessonId},
    error::ApiErrorBody,
    protocol::{Order, SearchQuery, SpaceUpdate},
};
use tracing::debug;
use url::Url;

use crate::error::{ShopError, ShopResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The four backend calls the client makes.
#[async_trait]
pub trait LessonsApi: Send + Sync {
    async fn list_lessons(&self) -> ShopResult<Vec<Lesson>>;
    async fn search_lessons(&self, query: &str) -> ShopResult<Vec<Lesson>>;
    async fn create_order(&self, order: &Order) -> ShopResult<()>;
    async fn update_space(&self, lesson_id: &LessonId, space: u32) -> ShopResult<()>;
}

pub struct HttpLessonsApi {
    http: Client,
    base_url: String,
}

impl HttpLessonsApi {
    pub fn new(base_url: &str) -> ShopResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ShopResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ShopError::Network {
                operation: "build http client",
                source,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> ShopResult<T> {
        let response = ensure_success(operation, response).await?;
        response
            .json()
            .await
            .map_err(|source| ShopError::Network { operation, source })
    }
}

/// Parses and validates the configured base URL, dropping any trailing slash
/// so that paths can be appended with `format!`.
pub fn normalize_base_url(raw: &str) -> ShopResult<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| ShopError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ShopError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// `{base}/lessons/{id}` with the id escaped as a single path segment.
pub(crate) fn lesson_url(base_url: &str, lesson_id: &LessonId) -> ShopResult<Url> {
    let invalid = |reason: String| ShopError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(["lessons", lesson_id.as_str()]);
    Ok(url)
}

async fn ensure_success(operation: &'static str, response: Response) -> ShopResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
    Err(ShopError::Server {
        operation,
        status,
        message,
    })
}

#[async_trait]
impl LessonsApi for HttpLessonsApi {
    async fn list_lessons(&self) -> ShopResult<Vec<Lesson>> {
        const OP: &str = "fetch lessons";
        let response = self
            .http
            .get(format!("{}/lessons", self.base_url))
            .send()
            .await
            .map_err(|source| ShopError::Network {
                operation: OP,
                source,
            })?;
        Self::read_json(OP, response).await
    }

    async fn search_lessons(&self, query: &str) -> ShopResult<Vec<Lesson>> {
        const OP: &str = "search lessons";
        debug!(query, "searching lessons");
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&SearchQuery {
                q: query.to_string(),
            })
            .send()
            .await
            .map_err(|source| ShopError::Network {
                operation: OP,
                source,
            })?;
        Self::read_json(OP, response).await
    }

    async fn create_order(&self, order: &Order) -> ShopResult<()> {
        const OP: &str = "place order";
        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .json(order)
            .send()
            .await
            .map_err(|source| ShopError::Network {
                operation: OP,
                source,
            })?;
        // The created order is echoed back but the client has no use for it.
        ensure_success(OP, response).await?;
        Ok(())
    }

    async fn update_space(&self, lesson_id: &LessonId, space: u32) -> ShopResult<()> {
        const OP: &str = "update lesson space";
        let response = self
            .http
            .put(lesson_url(&self.base_url, lesson_id)?)
            .json(&SpaceUpdate { space })
            .send()
            .await
            .map_err(|source| ShopError::Network {
                operation: OP,
                source,
            })?;
        ensure_success(OP, response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
