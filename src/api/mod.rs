use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task;

use crate::core::{
    AccumulationRequest, AccumulationResult, DecumulationRequest, DecumulationResult,
    DrawdownMonth, decumulation_schedule, project_accumulation, project_decumulation,
};
use crate::currency::Currency;
use crate::error::{Error, Result};
use crate::report;
use crate::store::{FileStore, History, KeyValueStore, Projection, SavedCalculation};

pub const DEFAULT_PORT: u16 = 8080;

/// Longest horizon accepted from callers, in whole years.
pub const MAX_YEARS: u32 = 30;

type SharedHistory<S> = Arc<Mutex<History<S>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SipPayload {
    pub monthly_amount: Option<f64>,
    pub lumpsum_amount: Option<f64>,
    #[serde(alias = "expectedReturn")]
    pub annual_rate_percent: Option<f64>,
    #[serde(alias = "tenure")]
    pub years: Option<u32>,
    pub step_up_percent: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwpPayload {
    pub initial_amount: Option<f64>,
    pub monthly_withdrawal: Option<f64>,
    #[serde(alias = "expectedReturn")]
    pub annual_rate_percent: Option<f64>,
    #[serde(alias = "withdrawalPeriod")]
    pub years: Option<u32>,
    pub include_schedule: Option<bool>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SavePayload {
    #[serde(alias = "accumulation")]
    Sip(SipPayload),
    #[serde(alias = "decumulation")]
    Swp(SwpPayload),
}

impl SavePayload {
    fn currency(&self) -> Option<&str> {
        match self {
            SavePayload::Sip(payload) => payload.currency.as_deref(),
            SavePayload::Swp(payload) => payload.currency.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrencyPayload {
    code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipResponse {
    currency: Currency,
    symbol: &'static str,
    request: AccumulationRequest,
    result: AccumulationResult,
    maturity_formatted: String,
    maturity_words: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwpResponse {
    currency: Currency,
    symbol: &'static str,
    request: DecumulationRequest,
    result: DecumulationResult,
    total_withdrawn_formatted: String,
    total_withdrawn_words: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<DrawdownMonth>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyResponse {
    code: Currency,
    symbol: &'static str,
    name: &'static str,
    supported: [Currency; 6],
}

impl From<Currency> for CurrencyResponse {
    fn from(value: Currency) -> Self {
        Self {
            code: value,
            symbol: value.symbol(),
            name: value.name(),
            supported: Currency::ALL,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn default_accumulation_request() -> AccumulationRequest {
    AccumulationRequest {
        monthly_amount: 5_000.0,
        lumpsum_amount: 0.0,
        annual_rate_percent: 12.0,
        years: 10,
        step_up_percent: 0.0,
    }
}

pub fn default_decumulation_request() -> DecumulationRequest {
    DecumulationRequest {
        initial_amount: 1_000_000.0,
        monthly_withdrawal: 10_000.0,
        annual_rate_percent: 8.0,
        years: 15,
    }
}

pub fn build_accumulation_request(payload: &SipPayload) -> Result<AccumulationRequest> {
    let defaults = default_accumulation_request();
    let request = AccumulationRequest {
        monthly_amount: payload.monthly_amount.unwrap_or(defaults.monthly_amount),
        lumpsum_amount: payload.lumpsum_amount.unwrap_or(defaults.lumpsum_amount),
        annual_rate_percent: payload
            .annual_rate_percent
            .unwrap_or(defaults.annual_rate_percent),
        years: payload.years.unwrap_or(defaults.years),
        step_up_percent: payload.step_up_percent.unwrap_or(defaults.step_up_percent),
    };
    validate_accumulation(&request)?;
    Ok(request)
}

pub fn build_decumulation_request(payload: &SwpPayload) -> Result<DecumulationRequest> {
    let defaults = default_decumulation_request();
    let request = DecumulationRequest {
        initial_amount: payload.initial_amount.unwrap_or(defaults.initial_amount),
        monthly_withdrawal: payload
            .monthly_withdrawal
            .unwrap_or(defaults.monthly_withdrawal),
        annual_rate_percent: payload
            .annual_rate_percent
            .unwrap_or(defaults.annual_rate_percent),
        years: payload.years.unwrap_or(defaults.years),
    };
    validate_decumulation(&request)?;
    Ok(request)
}

pub fn validate_accumulation(request: &AccumulationRequest) -> Result<()> {
    for (name, value) in [
        ("monthlyAmount", request.monthly_amount),
        ("lumpsumAmount", request.lumpsum_amount),
        ("stepUpPercent", request.step_up_percent),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("{name} must be a number >= 0")));
        }
    }
    validate_rate(request.annual_rate_percent)?;
    validate_years(request.years)?;

    if request.monthly_amount <= 0.0 && request.lumpsum_amount <= 0.0 {
        return Err(invalid("Please enter at least one investment amount"));
    }
    Ok(())
}

pub fn validate_decumulation(request: &DecumulationRequest) -> Result<()> {
    if !request.initial_amount.is_finite() || request.initial_amount <= 0.0 {
        return Err(invalid("initialAmount must be > 0"));
    }
    if !request.monthly_withdrawal.is_finite() || request.monthly_withdrawal <= 0.0 {
        return Err(invalid("monthlyWithdrawal must be > 0"));
    }
    validate_rate(request.annual_rate_percent)?;
    validate_years(request.years)
}

fn validate_rate(annual_rate_percent: f64) -> Result<()> {
    if !annual_rate_percent.is_finite() || annual_rate_percent <= -100.0 {
        return Err(invalid("annualRatePercent must be a number > -100"));
    }
    Ok(())
}

fn validate_years(years: u32) -> Result<()> {
    if !(1..=MAX_YEARS).contains(&years) {
        return Err(invalid(format!("years must be between 1 and {MAX_YEARS}")));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}

pub fn router<S>(history: History<S>) -> Router
where
    S: KeyValueStore + Send + 'static,
{
    Router::new()
        .route("/api/sip", get(sip_get_handler::<S>).post(sip_post_handler::<S>))
        .route("/api/swp", get(swp_get_handler::<S>).post(swp_post_handler::<S>))
        .route(
            "/api/saved",
            get(list_saved_handler::<S>)
                .post(save_handler::<S>)
                .delete(clear_saved_handler::<S>),
        )
        .route(
            "/api/saved/:id",
            get(get_saved_handler::<S>).delete(delete_saved_handler::<S>),
        )
        .route("/api/saved/:id/summary", get(summary_handler::<S>))
        .route(
            "/api/currency",
            get(get_currency_handler::<S>).put(put_currency_handler::<S>),
        )
        .fallback(not_found_handler)
        .with_state(Arc::new(Mutex::new(history)))
}

pub async fn run_http_server(port: u16, data_file: PathBuf) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("storing calculations in {}", data_file.display());
    let app = router(History::new(FileStore::new(data_file)));

    let listener = TcpListener::bind(addr).await?;
    info!("SIP/SWP HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/sip");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn sip_get_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Query(payload): Query<SipPayload>,
) -> Response {
    let body = with_history(history, move |h| accumulation_response(h, &payload)).await;
    respond(StatusCode::OK, body)
}

async fn sip_post_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Json(payload): Json<SipPayload>,
) -> Response {
    let body = with_history(history, move |h| accumulation_response(h, &payload)).await;
    respond(StatusCode::OK, body)
}

async fn swp_get_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Query(payload): Query<SwpPayload>,
) -> Response {
    let body = with_history(history, move |h| decumulation_response(h, &payload)).await;
    respond(StatusCode::OK, body)
}

async fn swp_post_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Json(payload): Json<SwpPayload>,
) -> Response {
    let body = with_history(history, move |h| decumulation_response(h, &payload)).await;
    respond(StatusCode::OK, body)
}

async fn list_saved_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let saved = with_history(history, move |h| {
        let history = lock(h)?;
        Ok(match params.query.as_deref() {
            Some(query) => history.search(query),
            None => history.list(),
        })
    })
    .await;
    respond(StatusCode::OK, saved)
}

async fn save_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Json(payload): Json<SavePayload>,
) -> Response {
    let saved = with_history(history, move |h| save_calculation(h, payload)).await;
    respond(StatusCode::CREATED, saved)
}

async fn clear_saved_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
) -> Response {
    let cleared = with_history(history, |h| {
        lock(h)?.clear()?;
        info!("cleared saved calculations");
        Ok(())
    })
    .await;
    respond_empty(cleared)
}

async fn get_saved_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Path(id): Path<String>,
) -> Response {
    let saved = with_history(history, move |h| lock(h)?.get(&id)).await;
    respond(StatusCode::OK, saved)
}

async fn delete_saved_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Path(id): Path<String>,
) -> Response {
    let deleted = with_history(history, move |h| {
        lock(h)?.delete(&id)?;
        info!("deleted saved calculation {id}");
        Ok(())
    })
    .await;
    respond_empty(deleted)
}

async fn summary_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Path(id): Path<String>,
) -> Response {
    match with_history(history, move |h| lock(h)?.get(&id)).await {
        Ok(calculation) => with_cache_control((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report::summary(&calculation),
        )),
        Err(e) => failure_response(e),
    }
}

async fn get_currency_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
) -> Response {
    let currency =
        with_history(history, |h| Ok(CurrencyResponse::from(lock(h)?.currency()))).await;
    respond(StatusCode::OK, currency)
}

async fn put_currency_handler<S: KeyValueStore + Send + 'static>(
    State(history): State<SharedHistory<S>>,
    Json(payload): Json<CurrencyPayload>,
) -> Response {
    let currency = with_history(history, move |h| update_currency(h, &payload.code)).await;
    respond(StatusCode::OK, currency)
}

/// Runs store work on the blocking pool; `FileStore` does synchronous I/O.
async fn with_history<S, T, F>(history: SharedHistory<S>, work: F) -> Result<T>
where
    S: KeyValueStore + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&SharedHistory<S>) -> Result<T> + Send + 'static,
{
    task::spawn_blocking(move || work(&history)).await?
}

fn lock<S>(history: &SharedHistory<S>) -> Result<MutexGuard<'_, History<S>>> {
    history.lock().map_err(|_| Error::LockPoisoned)
}

fn resolve_currency<S: KeyValueStore>(
    history: &History<S>,
    requested: Option<&str>,
) -> Result<Currency> {
    match requested {
        Some(code) => code.parse(),
        None => Ok(history.currency()),
    }
}

fn accumulation_response<S: KeyValueStore>(
    history: &SharedHistory<S>,
    payload: &SipPayload,
) -> Result<SipResponse> {
    let currency = resolve_currency(&*lock(history)?, payload.currency.as_deref())?;
    let request = build_accumulation_request(payload)?;
    let result = project_accumulation(&request);
    info!(
        "projected SIP: {} years at {}%, maturity {:.2}",
        request.years, request.annual_rate_percent, result.maturity_amount
    );

    Ok(SipResponse {
        currency,
        symbol: currency.symbol(),
        request,
        result,
        maturity_formatted: currency.format(result.maturity_amount),
        maturity_words: currency.to_words(result.maturity_amount),
    })
}

fn decumulation_response<S: KeyValueStore>(
    history: &SharedHistory<S>,
    payload: &SwpPayload,
) -> Result<SwpResponse> {
    let currency = resolve_currency(&*lock(history)?, payload.currency.as_deref())?;
    let request = build_decumulation_request(payload)?;
    let result = project_decumulation(&request);
    info!(
        "projected SWP: {} of {} months supported",
        result.months_supported,
        request.years * 12
    );

    Ok(SwpResponse {
        currency,
        symbol: currency.symbol(),
        request,
        result,
        total_withdrawn_formatted: currency.format(result.total_withdrawn),
        total_withdrawn_words: currency.to_words(result.total_withdrawn),
        schedule: payload
            .include_schedule
            .unwrap_or(false)
            .then(|| decumulation_schedule(&request)),
    })
}

fn save_calculation<S: KeyValueStore>(
    history: &SharedHistory<S>,
    payload: SavePayload,
) -> Result<SavedCalculation> {
    let projection = match &payload {
        SavePayload::Sip(p) => Projection::accumulation(build_accumulation_request(p)?),
        SavePayload::Swp(p) => Projection::decumulation(build_decumulation_request(p)?),
    };

    let mut history = lock(history)?;
    let currency = resolve_currency(&history, payload.currency())?;
    let saved = history.save(SavedCalculation::new(projection, currency, Utc::now()))?;
    info!("saved {} calculation {}", saved.kind().label(), saved.id);
    Ok(saved)
}

fn update_currency<S: KeyValueStore>(
    history: &SharedHistory<S>,
    code: &str,
) -> Result<CurrencyResponse> {
    let currency: Currency = code.parse()?;
    lock(history)?.set_currency(currency)?;
    info!("currency preference set to {currency}");
    Ok(currency.into())
}

fn respond<T: Serialize>(status: StatusCode, body: Result<T>) -> Response {
    match body {
        Ok(body) => json_response(status, body),
        Err(e) => failure_response(e),
    }
}

fn respond_empty(outcome: Result<()>) -> Response {
    match outcome {
        Ok(()) => with_cache_control(StatusCode::NO_CONTENT),
        Err(e) => failure_response(e),
    }
}

fn failure_response(err: Error) -> Response {
    let status = match &err {
        Error::InvalidInput(_) | Error::UnknownCurrency(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Io(_) | Error::Json(_) | Error::LockPoisoned | Error::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("request failed: {err}");
    } else {
        warn!("rejected request: {err}");
    }
    error_response(status, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
