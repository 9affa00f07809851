use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use chrono::Utc;
use infinity_common::{
    decode_report, BridgeConfig, CodecError, DeviceRoute, PollDecision, ReportEndpoint,
    StatusDocument, TimeDocument,
};
use tracing::{debug, error, info, warn};

use crate::engine::SharedEngine;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub config: Arc<BridgeConfig>,
}

/// Every path is answered with 200; the device retries hard on anything else.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(handle_device_request)
        .with_state(state)
}

async fn handle_device_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let route = DeviceRoute::classify(method == Method::POST, uri.path());
    debug!("{method} {} -> {route:?}", uri.path());

    match route {
        DeviceRoute::Alive => {
            ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], "alive").into_response()
        }
        DeviceRoute::Time => {
            xml_response(TimeDocument::new(&state.config.document, Utc::now()).to_xml())
        }
        DeviceRoute::Config => handle_config(&state).await,
        DeviceRoute::Report(ReportEndpoint::Status) => handle_status(&state, &body).await,
        DeviceRoute::Report(endpoint) => {
            handle_report(&state, endpoint, &body).await;
            StatusCode::OK.into_response()
        }
        DeviceRoute::Other => StatusCode::OK.into_response(),
    }
}

async fn handle_status(state: &AppState, body: &[u8]) -> Response {
    let decision = match decode_report(body, state.config.min_report_len) {
        Ok(report) => state.engine.exchange_status(report).await,
        Err(err) => {
            warn!("malformed status report, answering without changes: {err}");
            PollDecision::NoChange
        }
    };

    xml_response(StatusDocument::new(&state.config.document, decision, Utc::now()).to_xml())
}

async fn handle_report(state: &AppState, endpoint: ReportEndpoint, body: &[u8]) {
    match decode_report(body, state.config.min_report_len) {
        Ok(report) => state.engine.ingest_report(endpoint, report).await,
        Err(err) => warn!("malformed {} report ignored: {err}", endpoint.as_str()),
    }
}

async fn handle_config(state: &AppState) -> Response {
    match state
        .engine
        .config_document(&state.config.document, Utc::now())
        .await
    {
        Ok(document) => {
            info!(
                "serving configuration: mode={} fan={} hold={} htsp={} clsp={}",
                document.mode,
                document.fan,
                document.zones[0].hold,
                document.zones[0].htsp,
                document.zones[0].clsp
            );
            xml_response(document.to_xml())
        }
        Err(err) => {
            error!("config requested before desired state is complete: {err}");
            StatusCode::OK.into_response()
        }
    }
}

fn xml_response(rendered: Result<String, CodecError>) -> Response {
    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!("{err}");
            StatusCode::OK.into_response()
        }
    }
}
