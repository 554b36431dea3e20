//! Viewer HTTP surface
//!
//! `GET /camera/{camera}` answers with a never-ending
//! `multipart/x-mixed-replace` body fed by the camera's frames.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::HubError;
use crate::registry::CameraId;
use crate::relay::stream_headers;

use super::handler::HubHandler;
use super::listener::AppState;

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = match self {
            HubError::UnknownCamera(_) | HubError::ProducerGone(_) => StatusCode::NOT_FOUND,
            HubError::InvalidIdentity | HubError::UnknownChannel(_) => StatusCode::BAD_REQUEST,
            HubError::ConsumerGone(_) => StatusCode::GONE,
            HubError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

/// Attach the requesting viewer to the camera's stream
pub(super) async fn camera_stream<H: HubHandler>(
    Path(camera): Path<String>,
    State(state): State<Arc<AppState<H>>>,
) -> Result<Response, HubError> {
    let camera = CameraId::new(&camera)?;
    tracing::info!(camera = %camera, "Received request to get stream from camera");

    let stream = state.hub.request_stream(camera.clone()).await?;

    let mut builder = Response::builder().status(StatusCode::OK);
    for (name, value) in stream_headers(&state.boundary) {
        builder = builder.header(name, value);
    }

    match builder.body(Body::from_stream(stream)) {
        Ok(response) => Ok(response),
        Err(e) => {
            // Only reachable with a boundary that is not a valid header value
            tracing::error!(camera = %camera, error = %e, "Failed to build stream response");
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
