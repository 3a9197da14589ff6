// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events output for streaming chat completions.
//!
//! Each translated chunk becomes one `data:` event. The stream ends with
//! `data: [DONE]` on success, or with a single `event: error` whose data is
//! the JSON error envelope when the upstream stream fails midway.

use std::convert::Infallible;

use axum::response::{
    sse::{Event, KeepAlive, Sse},
    IntoResponse, Response,
};
use futures::stream::{Stream, StreamExt};
use modelgate_core::ModelgateError;
use modelgate_proxy::TranslatedEvent;
use tracing::warn;

use crate::error::{status_for, ErrorBody, ErrorResponse};
use crate::handlers::with_routing_headers;
use crate::pipeline::StreamingReply;

fn error_event(err: &ModelgateError) -> Event {
    let (_, kind) = status_for(err);
    let body = ErrorResponse {
        error: ErrorBody {
            message: err.to_string(),
            kind,
            upstream_status: err.status(),
        },
    };
    Event::default()
        .event("error")
        .data(serde_json::to_string(&body).unwrap_or_default())
}

/// Map translated events onto SSE events.
pub fn sse_events<S>(events: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = Result<TranslatedEvent, ModelgateError>>,
{
    events.map(|item| {
        Ok(match item {
            Ok(event) => Event::default().data(event.to_sse_data()),
            Err(err) => {
                warn!(error = %err, "stream failed after headers were sent");
                error_event(&err)
            }
        })
    })
}

/// Wrap a streaming reply as an SSE response.
pub fn into_response(reply: StreamingReply) -> Response {
    let StreamingReply {
        request_id,
        decision,
        events,
    } = reply;
    let response = Sse::new(sse_events(events))
        .keep_alive(KeepAlive::default())
        .into_response();
    with_routing_headers(response, &request_id, &decision.model.id)
}
