//! HTTP facts provider fetching FHIR bundles.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::fhir_mapper::FhirFactsMapper;
use crate::domain::subject::Facts;
use crate::ports::{FactsError, FactsProvider};

/// Fetches a subject's record bundle over HTTP and maps it to facts.
pub struct HttpFactsProvider {
    client: Client,
    base_url: String,
    mapper: FhirFactsMapper,
}

impl HttpFactsProvider {
    /// Creates a provider against a FHIR-style base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FactsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FactsError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            mapper: FhirFactsMapper::new(),
        })
    }

    fn everything_url(&self, subject_id: &str) -> String {
        format!("{}/Patient/{}/$everything", self.base_url, subject_id)
    }
}

#[async_trait]
impl FactsProvider for HttpFactsProvider {
    async fn fetch(&self, subject_id: &str) -> Result<Facts, FactsError> {
        let url = self.everything_url(subject_id);
        debug!(%url, "fetching subject bundle");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FactsError::Transport(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(FactsError::NotFound(subject_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(FactsError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let bundle = response
            .json()
            .await
            .map_err(|e| FactsError::Malformed(e.to_string()))?;
        self.mapper.facts_from_bundle(&bundle)
    }
}
