use std::sync::Arc;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{State, rejection::FormRejection},
    http::{Method, StatusCode},
    response::{Html, IntoResponse},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError::{self, InvalidRut, MethodNotAllowed},
    lookup::{LookupResult, lookup, parse_rut},
    page::{ViewState, render},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RutForm {
    #[serde(default)]
    rut: String,
}

pub async fn sheets_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Json<LookupResult>, AppError> {
    if method != Method::POST {
        return Err(MethodNotAllowed);
    }

    let rut = parse_rut(&body)?;

    Ok(Json(lookup(state.source.as_ref(), &rut).await?))
}

pub async fn index_handler() -> impl IntoResponse {
    Html(render(&ViewState::default(), now_ms()))
}

/// Plain form post, for browsers running without the inline script.
pub async fn form_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<RutForm>, FormRejection>,
) -> impl IntoResponse {
    let rut = form.map(|Form(form)| form.rut).unwrap_or_default();

    let mut view = ViewState::new(rut);
    view.begin_submit();

    let outcome = if view.rut.is_empty() {
        Err(InvalidRut)
    } else {
        lookup(state.source.as_ref(), &view.rut).await
    };

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            debug!("Form lookup failed: {err:?}");
            err.report();
            err.status()
        }
    };

    view.apply(outcome.map_err(|err| err.to_string()));

    (status, Html(render(&view, now_ms())))
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
