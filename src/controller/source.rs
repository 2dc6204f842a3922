use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::sample::{QueryCount, Topology};

/// Body returned by both measurement endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EdgeReport {
    /// Handler processing time (ms)
    pub duration: f64,
    #[serde(rename = "isColdStart")]
    pub is_cold_start: bool,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{topology} endpoint timed out")]
    Timeout { topology: Topology },

    #[error("{topology} endpoint request failed: {source}")]
    Transport {
        topology: Topology,
        #[source]
        source: reqwest::Error,
    },

    #[error("{topology} endpoint returned an unreadable body: {source}")]
    Decode {
        topology: Topology,
        #[source]
        source: reqwest::Error,
    },
}

/// The external collaborator the run loop measures against.
#[async_trait]
pub trait MeasurementEndpoint: Send + Sync {
    async fn query(&self, topology: Topology, queries: QueryCount) -> Result<EdgeReport, FetchError>;
}

/// Production endpoint: plain `GET {target}/api/edge-*?numofqueries=n`.
pub struct HttpEndpoint {
    target: String,
    http: reqwest::Client,
}

impl HttpEndpoint {
    /// `timeout` of `None` means a hung request stalls the run.
    pub fn new(target: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            target: target.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    pub fn url(&self, topology: Topology) -> String {
        format!("{}{}", self.target, topology.endpoint_path())
    }
}

#[async_trait]
impl MeasurementEndpoint for HttpEndpoint {
    async fn query(&self, topology: Topology, queries: QueryCount) -> Result<EdgeReport, FetchError> {
        // Status is not inspected; a non-JSON error page fails at decode.
        let response = self
            .http
            .get(self.url(topology))
            .query(&[("numofqueries", queries.get())])
            .send()
            .await
            .map_err(|source| classify(topology, source, false))?;

        response
            .json::<EdgeReport>()
            .await
            .map_err(|source| classify(topology, source, true))
    }
}

fn classify(topology: Topology, source: reqwest::Error, reading_body: bool) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout { topology }
    } else if reading_body {
        FetchError::Decode { topology, source }
    } else {
        FetchError::Transport { topology, source }
    }
}
