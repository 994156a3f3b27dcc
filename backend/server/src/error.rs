use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sheets::SheetsError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Método no permitido. Solo POST está permitido.")]
    MethodNotAllowed,

    #[error("RUT inválido o no proporcionado.")]
    InvalidRut,

    #[error("La hoja está vacía.")]
    EmptySheet,

    #[error("No se encontraron datos para el RUT: {0}")]
    NoMatch(String),

    #[error("Error interno al consultar Google Sheets.")]
    Internal(#[from] SheetsError),
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidRut => StatusCode::BAD_REQUEST,
            AppError::EmptySheet | AppError::NoMatch(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs what actually went wrong upstream. Callers only ever see the generic message.
    pub fn report(&self) {
        if let AppError::Internal(source) = self {
            error!("Failed to query Google Sheets: {source}");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let body = ErrorBody {
            error: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}
