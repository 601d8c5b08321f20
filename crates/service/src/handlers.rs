use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use cantus_filter_core::{
    normalize_name, ChoiceCatalog, CollectedValues, FieldKey, FilterDocument, FormParams,
    ParamSource,
};

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::session::{session_cookie, SessionStore, Submission};
use crate::templates;

pub const YAML_CONTENT_TYPE: &str = "application/x-yaml; charset=utf-8";
const NO_FORM_DATA: &str = "No form data found";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ChoiceCatalog>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(catalog: ChoiceCatalog, config: &ServiceConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            sessions: SessionStore::new(config.session_ttl()),
        }
    }
}

pub async fn root() -> Redirect {
    Redirect::temporary("/filter")
}

pub async fn filter_form(State(state): State<AppState>) -> Html<String> {
    Html(templates::filter_form(&state.catalog, "", None))
}

pub async fn submit_filter(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(pairs) = form.map_err(AppError::bad_request)?;
    let params = FormParams::from_pairs(pairs);
    let raw_name = params.param("name");
    let name = match normalize_name(raw_name) {
        Ok(name) => name,
        Err(err) => {
            info!(error = %err, "rejected filter submission");
            let page = templates::filter_form(
                &state.catalog,
                raw_name.unwrap_or_default(),
                Some(&err.to_string()),
            );
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
    };
    let values = CollectedValues::collect(&params);
    let unlisted = count_unlisted(&state.catalog, &values);
    if unlisted > 0 {
        debug!(unlisted, "accepted values outside the reference choices");
    }
    let session_id = SessionStore::session_id(&headers).unwrap_or_else(Uuid::new_v4);
    info!(
        filter = %name,
        values = values.value_count(),
        session = %session_id,
        "stored filter submission"
    );
    state.sessions.store(session_id, Submission { name, values });

    let cookie = HeaderValue::from_str(&session_cookie(session_id)).map_err(AppError::internal)?;
    let mut response = Redirect::to("/filter/download").into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Free-text values are accepted as-is; this only feeds the logs.
fn count_unlisted(catalog: &ChoiceCatalog, values: &CollectedValues) -> usize {
    FieldKey::all()
        .filter_map(|key| values.get(key).map(|set| (key.attribute, set)))
        .map(|(attribute, set)| {
            set.iter()
                .filter(|value| !catalog.contains(attribute, value))
                .count()
        })
        .sum()
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    download: Option<String>,
}

pub async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    let submission = SessionStore::session_id(&headers)
        .and_then(|id| state.sessions.load(id))
        .ok_or_else(|| AppError::not_found(NO_FORM_DATA))?;

    if params.download.as_deref() != Some("1") {
        return Ok(Html(templates::download_page(&submission)).into_response());
    }

    let document =
        FilterDocument::build(&submission.name, &submission.values).map_err(AppError::internal)?;
    let body = document.to_yaml().map_err(AppError::internal)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        urlencoding::encode(&document.filename())
    );
    let disposition = HeaderValue::from_str(&disposition).map_err(AppError::internal)?;
    info!(filter = %document.name, bytes = body.len(), "exported filter document");
    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(YAML_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn help() -> Html<String> {
    Html(templates::help_page())
}

pub async fn about() -> Html<String> {
    Html(templates::about_page())
}

pub async fn contact() -> Html<String> {
    Html(templates::contact_page())
}
