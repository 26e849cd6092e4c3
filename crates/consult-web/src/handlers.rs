//! Route handlers for the form UI and the JSON API

use crate::error::WebError;
use crate::markdown;
use crate::session::{Session, session_cookie, session_id_from_cookies};
use crate::state::AppState;
use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use consult_analysis::inputs::{FINANCIAL_FIELDS, MARKETING_FIELDS};
use consult_analysis::{
    AnalysisKind, AnalysisReport, BusinessInputs, FieldRule, FieldSpec, FinancialMetrics,
    MarketingMetrics,
};
use consult_llm::{ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct ProviderView {
    kind: &'static str,
    model: String,
    configured: bool,
    key_label: &'static str,
    has_key: bool,
}

impl From<&ProviderSettings> for ProviderView {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            kind: settings.kind.as_str(),
            model: settings.model().to_string(),
            configured: settings.is_configured(),
            key_label: settings.kind.key_label(),
            has_key: settings.api_key.is_some(),
        }
    }
}

#[derive(Serialize)]
struct FieldView {
    key: &'static str,
    label: &'static str,
    value: String,
    min: Option<f64>,
    max: Option<f64>,
    required: bool,
}

impl FieldView {
    fn new(spec: &FieldSpec, value: String) -> Self {
        let (min, max) = match spec.rule {
            FieldRule::Any => (None, None),
            FieldRule::NonNegative => (Some(0.0), None),
            FieldRule::AtLeastOne => (Some(1.0), None),
            FieldRule::Fraction => (Some(0.0), Some(1.0)),
        };
        Self {
            key: spec.key,
            label: spec.label,
            value,
            min,
            max,
            required: spec.default.is_none(),
        }
    }
}

#[derive(Serialize)]
struct GroupView {
    name: &'static str,
    fields: Vec<FieldView>,
}

#[derive(Serialize)]
struct IndexPage<'a> {
    app_name: &'a str,
    providers: Vec<Choice>,
    provider: ProviderView,
    groups: Vec<GroupView>,
    kinds: Vec<Choice>,
    error: Option<String>,
    has_report: bool,
}

#[derive(Serialize)]
struct Section {
    id: &'static str,
    title: &'static str,
    /// Narrative rendered from Markdown, already safe HTML
    body_html: String,
}

#[derive(Serialize)]
struct ReportPage<'a> {
    app_name: &'a str,
    kind_label: &'static str,
    provider: &'a str,
    model: &'a str,
    generated_at: String,
    sections: Vec<Section>,
    financial_json: Option<String>,
    marketing_json: Option<String>,
}

/// Sidebar form
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    provider: String,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: String,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    kind: AnalysisKind,
    inputs: BusinessInputs,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    financial: FinancialMetrics,
    marketing: MarketingMetrics,
}

/// Resolve the caller's session from the cookie header
fn caller(state: &AppState, headers: &HeaderMap) -> (Uuid, Session) {
    let id = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_id_from_cookies);
    state.sessions.get_or_create(id)
}

/// Existing session for API calls; never creates one
fn existing_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_id_from_cookies)
        .and_then(|id| state.sessions.get(id))
}

fn effective_settings(state: &AppState, session: Option<&Session>) -> ProviderSettings {
    session
        .and_then(|s| s.settings.clone())
        .unwrap_or_else(|| state.default_settings().clone())
}

fn with_cookie(state: &AppState, id: Uuid, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Ok(value) = HeaderValue::from_str(&session_cookie(id, state.sessions.ttl_seconds())) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn input_values(inputs: &BusinessInputs) -> HashMap<&'static str, String> {
    inputs
        .financial
        .values()
        .iter()
        .chain(inputs.marketing.values().iter())
        .map(|(spec, value)| (spec.key, value.to_string()))
        .collect()
}

/// Form fields grouped in display order
fn field_groups(values: &HashMap<&str, String>) -> Vec<GroupView> {
    let mut groups: Vec<GroupView> = Vec::new();
    for spec in FINANCIAL_FIELDS.iter().chain(MARKETING_FIELDS.iter()) {
        let value = values.get(spec.key).cloned().unwrap_or_default();
        let field = FieldView::new(spec, value);
        match groups.last_mut() {
            Some(group) if group.name == spec.group => group.fields.push(field),
            _ => groups.push(GroupView {
                name: spec.group,
                fields: vec![field],
            }),
        }
    }
    groups
}

fn render_index(
    state: &AppState,
    session: &Session,
    values: &HashMap<&str, String>,
    kind: AnalysisKind,
    error: Option<&WebError>,
) -> Result<Response, WebError> {
    let settings = effective_settings(state, Some(session));
    let page = IndexPage {
        app_name: &state.config.app_name,
        providers: ProviderKind::ALL
            .into_iter()
            .map(|k| Choice {
                value: k.as_str(),
                label: k.as_str(),
                selected: k == settings.kind,
            })
            .collect(),
        provider: ProviderView::from(&settings),
        groups: field_groups(values),
        kinds: AnalysisKind::ALL
            .into_iter()
            .map(|k| Choice {
                value: k.as_str(),
                label: k.label(),
                selected: k == kind,
            })
            .collect(),
        error: error.map(WebError::user_message),
        has_report: session.last_report.is_some(),
    };

    let html = state.pages.render("index.html", &page)?;
    let status = error.map_or(StatusCode::OK, WebError::status_code);
    Ok((status, Html(html)).into_response())
}

fn render_report(state: &AppState, report: &AnalysisReport) -> Result<Response, WebError> {
    let sections = [
        ("cfo", "CFO Financial Analysis", &report.financial_report),
        ("cmo", "CMO Marketing Analysis", &report.marketing_report),
        ("ceo", "CEO Business Synthesis", &report.ceo_report),
    ]
    .into_iter()
    .filter_map(|(id, title, body)| {
        body.as_ref().map(|body| Section {
            id,
            title,
            body_html: markdown::to_html(body),
        })
    })
    .collect();

    let page = ReportPage {
        app_name: &state.config.app_name,
        kind_label: report.kind.label(),
        provider: &report.provider,
        model: &report.model,
        generated_at: report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        sections,
        financial_json: report
            .financial_metrics
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()
            .map_err(|e| WebError::Internal(e.to_string()))?,
        marketing_json: report
            .marketing_metrics
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()
            .map_err(|e| WebError::Internal(e.to_string()))?,
    };

    Ok(Html(state.pages.render("report.html", &page)?).into_response())
}

/// `GET /`: the input form, pre-filled with the last inputs or the sample company
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, WebError> {
    let (id, session) = caller(&state, &headers);
    let inputs = session.last_inputs.clone().unwrap_or_default();
    let page = render_index(
        &state,
        &session,
        &input_values(&inputs),
        session.last_report.as_ref().map_or(AnalysisKind::Full, |r| r.kind),
        None,
    )?;
    Ok(with_cookie(&state, id, page))
}

/// `POST /settings`: switch provider, key or model for this session
///
/// A blank key keeps the key already held for that provider.
pub async fn save_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SettingsForm>,
) -> Result<Response, WebError> {
    let (id, session) = caller(&state, &headers);

    let kind = match form.provider.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(e) => {
            let error = WebError::BadRequest(e.to_string());
            let values = input_values(&session.last_inputs.clone().unwrap_or_default());
            let page = render_index(&state, &session, &values, AnalysisKind::Full, Some(&error))?;
            return Ok(with_cookie(&state, id, page));
        }
    };

    let mut settings = match session.settings {
        Some(current) if current.kind == kind => current,
        _ => state.baseline(kind),
    };
    let api_key = form.api_key.trim();
    if !api_key.is_empty() {
        settings = settings.with_api_key(api_key);
    }
    let model = form.model.trim();
    if !model.is_empty() {
        settings = settings.with_model(model);
    }

    info!(
        provider = %settings.kind,
        model = settings.model(),
        configured = settings.is_configured(),
        "Session provider updated"
    );
    state.sessions.update(id, |s| s.settings = Some(settings));

    Ok(with_cookie(&state, id, Redirect::to("/")))
}

/// `POST /analyze`: run the selected analysis from the form
///
/// Failures re-render the form with the submitted values and the error.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    let (id, session) = caller(&state, &headers);
    let submitted: HashMap<&str, String> = FINANCIAL_FIELDS
        .iter()
        .chain(MARKETING_FIELDS.iter())
        .filter_map(|spec| form.get(spec.key).map(|v| (spec.key, v.clone())))
        .collect();

    let kind = match form.get("kind").map(|k| k.parse::<AnalysisKind>()).transpose() {
        Ok(kind) => kind.unwrap_or_default(),
        Err(e) => {
            let error = WebError::BadRequest(e);
            let page = render_index(&state, &session, &submitted, AnalysisKind::Full, Some(&error))?;
            return Ok(with_cookie(&state, id, page));
        }
    };

    let result = async {
        let inputs = BusinessInputs::from_fields(&form).map_err(|e| WebError::Validation(e.to_string()))?;
        let consultant = state.consultant(&effective_settings(&state, Some(&session)))?;
        let report = consultant.run(kind, &inputs).await?;
        Ok::<_, WebError>((inputs, report))
    }
    .await;

    let page = match result {
        Ok((inputs, report)) => {
            let page = render_report(&state, &report)?;
            state.sessions.update(id, |s| {
                s.last_inputs = Some(inputs);
                s.last_report = Some(report);
            });
            page
        }
        Err(error) => {
            warn!(kind = %kind, "Analysis request failed: {}", error);
            render_index(&state, &session, &submitted, kind, Some(&error))?
        }
    };

    Ok(with_cookie(&state, id, page))
}

/// `GET /report`: the session's most recent report
pub async fn show_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let (id, session) = caller(&state, &headers);

    let page = match &session.last_report {
        Some(report) => render_report(&state, report)?,
        None => {
            let html = state.pages.render(
                "message.html",
                json!({
                    "app_name": state.config.app_name,
                    "title": "No report yet",
                    "message": "Run an analysis from the form to see a report here.",
                }),
            )?;
            (StatusCode::NOT_FOUND, Html(html)).into_response()
        }
    };

    Ok(with_cookie(&state, id, page))
}

/// `POST /api/metrics`: computed ratios only, no LLM call
pub async fn api_metrics(
    payload: Result<Json<BusinessInputs>, JsonRejection>,
) -> Result<Json<MetricsResponse>, WebError> {
    let Json(inputs) = payload?;
    inputs.validate().map_err(|e| WebError::Validation(e.to_string()))?;

    Ok(Json(MetricsResponse {
        financial: FinancialMetrics::compute(&inputs.financial),
        marketing: MarketingMetrics::compute(inputs.revenue(), &inputs.marketing),
    }))
}

/// `POST /api/analyze`: full report as JSON
///
/// Uses the caller's sidebar settings when a session cookie is sent, the
/// startup settings otherwise.
pub async fn api_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>, WebError> {
    let Json(request) = payload?;
    let session = existing_session(&state, &headers);
    let consultant = state.consultant(&effective_settings(&state, session.as_ref()))?;
    let report = consultant.run(request.kind, &request.inputs).await?;
    Ok(Json(report))
}

pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let settings = state.default_settings();
    Json(json!({
        "status": "ok",
        "provider": settings.kind.as_str(),
        "model": settings.model(),
        "sessions": state.sessions.len(),
    }))
}
