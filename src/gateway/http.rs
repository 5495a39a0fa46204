//! HTTP adapters for the nutrition API.

use super::wire::{self, AnalyzeRequestBody, MealRequestBody};
use super::{AnalysisGateway, MealStore};
use crate::model::{
    AnalysisError, AnalysisResult, CapturedImage, Language, MealRecord, PersistedId,
    SubmissionError,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info, warn};

const ANALYZE_PATH: &str = "/nutrition/analyze";
const MEALS_PATH: &str = "/nutrition/meals";

/// HTTP statuses the service uses to reject the image itself.
const INVALID_IMAGE_STATUSES: [u16; 4] = [400, 413, 415, 422];

/// Analysis gateway backed by `POST {base}/nutrition/analyze`.
#[derive(Debug, Clone)]
pub struct HttpAnalysisGateway {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpAnalysisGateway {
    /// Build a gateway for the API rooted at `base_url`.
    ///
    /// Timeouts are applied by the workflow driver, not by the client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(Client::builder().build()?, base_url, token))
    }

    /// Build a gateway sharing an existing client.
    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: join(base_url, ANALYZE_PATH),
            token,
        }
    }

    /// Full URL of the analyze endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    async fn analyze(
        &self,
        image: &CapturedImage,
        hint: Option<&str>,
        language: Language,
    ) -> Result<AnalysisResult, AnalysisError> {
        let body = AnalyzeRequestBody::new(image, hint, language);
        debug!(
            url = %self.endpoint,
            bytes = image.len(),
            has_hint = hint.is_some(),
            %language,
            "Sending analysis request"
        );

        let request = authorize(self.client.post(&self.endpoint), self.token.as_deref());
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(transport_message(&e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Network(transport_message(&e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Analysis request failed");
            return Err(analysis_failure(status.as_u16(), &text));
        }

        let result = wire::decode_analysis(&text).map_err(AnalysisError::Service)?;
        info!(
            status = status.as_u16(),
            items = result.items.len(),
            "Analysis response decoded"
        );
        Ok(result)
    }
}

/// Meal store backed by `POST {base}/nutrition/meals`.
#[derive(Debug, Clone)]
pub struct HttpMealStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpMealStore {
    /// Build a store for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(Client::builder().build()?, base_url, token))
    }

    /// Build a store sharing an existing client.
    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: join(base_url, MEALS_PATH),
            token,
        }
    }

    /// Full URL of the meals endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MealStore for HttpMealStore {
    async fn commit(&self, meal: &MealRecord) -> Result<PersistedId, SubmissionError> {
        let body = MealRequestBody::new(meal);
        debug!(url = %self.endpoint, items = meal.items.len(), "Sending meal");

        let request = authorize(self.client.post(&self.endpoint), self.token.as_deref());
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(transport_message(&e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(transport_message(&e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Meal submission rejected");
            return Err(SubmissionError::Rejected {
                status: Some(status.as_u16()),
                message: wire::error_message(&text),
            });
        }

        let id = wire::decode_meal_id(&text).map_err(|message| SubmissionError::Rejected {
            status: Some(status.as_u16()),
            message,
        })?;
        info!(meal_id = %id, "Meal stored");
        Ok(id)
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("could not connect: {error}")
    } else {
        error.to_string()
    }
}

/// Map a non-2xx analysis response to an error.
pub(crate) fn analysis_failure(status: u16, body: &str) -> AnalysisError {
    let message = wire::error_message(body);
    if INVALID_IMAGE_STATUSES.contains(&status) {
        AnalysisError::InvalidImage(message)
    } else {
        AnalysisError::Service(format!("HTTP {status}: {message}"))
    }
}
