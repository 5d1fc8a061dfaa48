// src/services/soms.rs

//! SOMS lookup client.
//!
//! Builds the exact query the endpoint expects and performs one GET per
//! phone. Transport failures are reported as [`LookupError`] so the caller
//! can still record the HTTP status when only the body read failed.

use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, NormalizedPhone};
use crate::utils::http::create_client;

/// Raw outcome of one lookup request: status plus the full body text.
#[derive(Debug)]
pub struct SomsResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Transport-level failure of one lookup request.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request failed before any response arrived.
    #[error("{0}")]
    Send(reqwest::Error),

    /// A response arrived but its body could not be read.
    #[error("{source}")]
    Body {
        status: StatusCode,
        source: reqwest::Error,
    },
}

impl LookupError {
    /// Short error class for the audit log.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Body { .. } => "body",
            Self::Send(e) if e.is_timeout() => "timeout",
            Self::Send(e) if e.is_connect() => "connect",
            Self::Send(_) => "request",
        }
    }

    /// HTTP status, when the transport produced a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Send(_) => None,
            Self::Body { status, .. } => Some(*status),
        }
    }
}

/// Client for the SOMS customer lookup endpoint.
pub struct SomsClient {
    client: Client,
    base_url: Url,
    id_usuario: String,
}

impl SomsClient {
    /// Build a client from validated configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.endpoint.base_url).map_err(|e| {
            AppError::config(format!(
                "invalid base URL '{}': {e}",
                config.endpoint.base_url
            ))
        })?;
        let client = create_client(&config.http)?;

        Ok(Self {
            client,
            base_url,
            id_usuario: config.endpoint.id_usuario.clone(),
        })
    }

    /// Compose the lookup URL for one normalized phone.
    ///
    /// Parameter order is fixed. The endpoint requires the trailing empty
    /// parameters even though they carry no value.
    pub fn build_url(&self, phone: &NormalizedPhone) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("lada", &phone.lada)
            .append_pair("telefono", &phone.telefono_8)
            .append_pair("idUsuario", &self.id_usuario)
            .append_pair("nombre", "")
            .append_pair("evento", "")
            .append_pair("estado", "")
            .append_pair("calle", "")
            .append_pair("colonia", "")
            .append_pair("cp", "");
        url
    }

    /// Perform one GET and read the whole body.
    pub async fn lookup(&self, url: Url) -> std::result::Result<SomsResponse, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(LookupError::Send)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LookupError::Body { status, source })?;

        Ok(SomsResponse { status, body })
    }
}
