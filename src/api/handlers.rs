//! Axum request handlers for the localization API.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};

use super::dto::{
    HealthResponse, HistoryResponse, LocationRequest, PredictionsResponse, RouteRequest,
    RouteResponse, StreamPayload,
};
use super::error::{ApiError, ApiResult};
use super::ApiContext;
use crate::pipeline::route;
use crate::LocateError;

/// Normalize either request shape into a signal vector in vocabulary order.
///
/// A named mapping may omit APs (filled with the configured sentinel) but
/// must not name unknown ones; an ordered list is passed through and length-
/// checked by the normalizer.
fn signal_vector(request: LocationRequest, ctx: &ApiContext) -> ApiResult<Vec<i32>> {
    let runtime = &ctx.config.runtime;

    match (request.rssi, request.rssi_values) {
        (Some(map), None) => {
            if let Some(unknown) = map.keys().find(|k| !runtime.ap_names.contains(k)) {
                return Err(ApiError::bad_request(format!(
                    "unknown access point {unknown:?}; expected one of {:?}",
                    runtime.ap_names
                )));
            }
            Ok(runtime
                .ap_names
                .iter()
                .map(|name| map.get(name).copied().unwrap_or(runtime.sentinel_dbm))
                .collect())
        }
        (None, Some(values)) => Ok(values),
        _ => Err(ApiError::bad_request(
            "provide exactly one of 'rssi' (mapping) or 'rssi_values' (ordered list)",
        )),
    }
}

/// Classify one reading and return the ranked predictions.
#[tracing::instrument(skip_all)]
pub async fn classify_reading(
    State(ctx): State<ApiContext>,
    Json(request): Json<LocationRequest>,
) -> ApiResult<Json<PredictionsResponse>> {
    let vector = signal_vector(request, &ctx)?;
    let ranked = ctx.pipeline.process(&vector)?;

    tracing::debug!(
        version = ctx.register.version(),
        top = ranked.top().map(|e| e.label.as_str()),
        "reading classified"
    );

    Ok(Json(PredictionsResponse::from(&ranked)))
}

/// Plan a route from the smoothed current position to a destination label.
#[tracing::instrument(skip_all, fields(destination = %request.destination))]
pub async fn plan_route(
    State(ctx): State<ApiContext>,
    Json(request): Json<RouteRequest>,
) -> ApiResult<Json<RouteResponse>> {
    let grid = &ctx.config.runtime.grid;

    let current = ctx
        .register
        .smoothed_cell()
        .ok_or(LocateError::NoEstimate)?;
    let destination = grid.decode(&request.destination)?;

    let route = route::plan(current, destination, grid)?;
    Ok(Json(RouteResponse { route }))
}

/// Return the recent-fix window, newest first.
pub async fn get_history(State(ctx): State<ApiContext>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        entries: ctx.register.history_snapshot(),
    })
}

/// Long-lived SSE stream of ranked estimates.
///
/// One JSON payload is emitted per version advance of the register; a
/// subscriber that falls behind receives only the latest state. The
/// subscription is dropped, and the observer deregistered, as soon as the
/// client disconnects.
#[tracing::instrument(skip_all)]
pub async fn stream_estimates(
    State(ctx): State<ApiContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = ctx.register.subscribe();
    tracing::debug!(observers = ctx.register.observer_count(), "observer attached");

    let stream = stream::unfold(rx, |mut rx| async move {
        // Suspends until the version advances; resolves Err when the
        // register is torn down, which ends the stream.
        rx.changed().await.ok()?;

        let payload = StreamPayload::from(&*rx.borrow_and_update());
        let event = Event::default()
            .id(payload.version.to_string())
            .json_data(&payload)
            .ok()?;

        Some((Ok::<_, Infallible>(event), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Liveness probe.
pub async fn health(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ctx.register.version(),
        observers: ctx.register.observer_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::config::{AppConfig, ModelArtifact, RuntimeConfig, ScalerArtifact};
    use crate::domain::grid::GridSpec;
    use crate::pipeline::smoothing::SmoothingConfig;
    use crate::pipeline::LocatePipeline;
    use crate::state::PositionRegister;

    fn context() -> ApiContext {
        let config = AppConfig {
            runtime: RuntimeConfig {
                ap_names: vec!["AP1".into(), "AP2".into(), "AP3".into()],
                sentinel_dbm: -100,
                grid: GridSpec::default(),
                top_k: 2,
                tie_epsilon: 1e-9,
                history_capacity: 20,
                smoothing: SmoothingConfig::default(),
            },
            scaler: ScalerArtifact {
                mean: vec![-70.0, -70.0, -70.0],
                scale: vec![5.0, 5.0, 5.0],
            },
            model: ModelArtifact {
                labels: vec!["A11".into(), "B12".into()],
                centroids: vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]],
                bandwidth: 1.0,
            },
        };
        let config = Arc::new(config);
        let register = Arc::new(PositionRegister::new(
            config.estimator(),
            config.runtime.history_capacity,
        ));
        let pipeline = Arc::new(LocatePipeline::new(
            config.normalizer(),
            config.classifier(),
            config.model.labels.clone(),
            config.runtime.top_k,
            config.runtime.tie_epsilon,
            register.clone(),
        ));
        ApiContext {
            config,
            register,
            pipeline,
        }
    }

    fn map(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_named_mapping_fills_missing_aps_with_sentinel() {
        let ctx = context();
        let request = LocationRequest {
            rssi: Some(map(&[("AP1", -60), ("AP3", -80)])),
            rssi_values: None,
        };

        let vector = signal_vector(request, &ctx).unwrap();
        assert_eq!(vector, vec![-60, -100, -80]);
    }

    #[test]
    fn test_unknown_ap_is_rejected_with_vocabulary() {
        let ctx = context();
        let request = LocationRequest {
            rssi: Some(map(&[("AP1", -60), ("AP9", -70)])),
            rssi_values: None,
        };

        let err = signal_vector(request, &ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AP9"), "{message}");
        assert!(message.contains("AP1"), "expected vocabulary listed: {message}");
    }

    #[test]
    fn test_both_or_neither_request_shape_is_rejected() {
        let ctx = context();

        let neither = LocationRequest {
            rssi: None,
            rssi_values: None,
        };
        assert!(signal_vector(neither, &ctx).is_err());

        let both = LocationRequest {
            rssi: Some(map(&[("AP1", -60)])),
            rssi_values: Some(vec![-60, -70, -80]),
        };
        assert!(signal_vector(both, &ctx).is_err());
    }

    #[tokio::test]
    async fn test_route_before_any_reading_is_a_conflict() {
        let ctx = context();
        let result = plan_route(
            State(ctx),
            Json(RouteRequest {
                destination: "C13".into(),
            }),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.error_code(), "NO_ESTIMATE"),
            Ok(_) => panic!("route without an estimate must fail"),
        }
    }

    #[tokio::test]
    async fn test_classify_then_route() {
        let ctx = context();

        // A reading close to the A11 centroid (in normalized space, the
        // centroid sits at the scaler mean).
        let response = classify_reading(
            State(ctx.clone()),
            Json(LocationRequest {
                rssi: None,
                rssi_values: Some(vec![-70, -70, -70]),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.predictions.len(), 2);
        assert_eq!(response.0.predictions[0].location, "A11");

        let route = plan_route(
            State(ctx),
            Json(RouteRequest {
                destination: "C13".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(route.0.route.len(), 4, "A11 -> C13 is four unit moves");
    }
}
