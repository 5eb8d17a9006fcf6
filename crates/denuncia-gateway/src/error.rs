// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`DenunciaError`] to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use denuncia_core::DenunciaError;
use serde::Serialize;
use tracing::error;

/// Shown when the analysis provider rejects our credentials or calling domain.
pub const CONFIGURATION_MESSAGE: &str = "El servicio de análisis legal no está configurado correctamente. \
     Operador: revise la clave de API de Gemini y sus restricciones de dominio o referer.";

/// Shown for any failure the citizen cannot act on.
pub const INTERNAL_MESSAGE: &str =
    "Ocurrió un error inesperado. Por favor intenta de nuevo en unos minutos.";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
    /// Stable machine-readable code.
    pub code: &'static str,
}

/// A [`DenunciaError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub DenunciaError);

impl From<DenunciaError> for ApiError {
    fn from(err: DenunciaError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(DenunciaError::Validation(message.into()))
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match &self.0 {
            err if err.is_configuration() => (
                StatusCode::SERVICE_UNAVAILABLE,
                "configuration",
                CONFIGURATION_MESSAGE.to_string(),
            ),
            DenunciaError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "validation", message.clone())
            }
            DenunciaError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("session {id} not found"),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                INTERNAL_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denuncia_core::ExtractionError;

    fn status_of(err: DenunciaError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(DenunciaError::Extraction(ExtractionError::Configuration(
                "API key not valid".into()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(DenunciaError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DenunciaError::SessionNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DenunciaError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DenunciaError::Extraction(ExtractionError::Timeout {
                duration: std::time::Duration::from_secs(1)
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let (_, code, message) = ApiError(DenunciaError::Internal("sqlite locked".into())).parts();
        assert_eq!(code, "internal");
        assert!(!message.contains("sqlite"));
    }
}
