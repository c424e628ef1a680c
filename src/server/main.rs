//! HTTP server exposing the constraint engine.
//!
//! Lets a browser-side editor clip drawn shapes with the same rules as the
//! native editor core.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use zonemap::config::Config;
use zonemap::constraint::{audit, AuditReport, ConstraintReport};
use zonemap::geometry::close_rings;
use zonemap::{ConstraintEngine, ConstraintError, TrimStrategy, Zone, ZoneSet};

#[derive(Parser, Debug)]
#[command(name = "zonemap-server")]
#[command(about = "Zoning map constraint server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    info!(
        "Zonemap constraint server ({:?} trimming)",
        config.constraint.trim_strategy
    );

    let state = Arc::new(AppState { config });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/constrain", post(constrain_handler))
        .route("/v1/close-rings", post(close_rings_handler))
        .route("/v1/audit", post(audit_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    trim_strategy: TrimStrategy,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        trim_strategy: state.config.constraint.trim_strategy,
    })
}

#[derive(Deserialize)]
struct ConstrainRequest {
    candidate: Geometry,
    /// Enclosing barangay; omitted for boundary shapes
    boundary: Option<Geometry>,
    /// Existing zoning zones, in the order they should be trimmed
    #[serde(default)]
    others: Vec<Geometry>,
    strategy: Option<TrimStrategy>,
}

#[derive(Serialize)]
struct ConstrainResponse {
    geometry: Geometry,
    report: ConstraintReport,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

/// Clip a candidate to its boundary and trim it against its neighbours
async fn constrain_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConstrainRequest>,
) -> ApiResult<ConstrainResponse> {
    constrain(&state.config, request).map(Json).map_err(|e| {
        debug!("Rejected candidate: {}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                kind: e.kind(),
                message: e.to_string(),
            }),
        )
    })
}

fn constrain(config: &Config, request: ConstrainRequest) -> Result<ConstrainResponse, ConstraintError> {
    let engine = ConstraintEngine::new(
        request
            .strategy
            .unwrap_or(config.constraint.trim_strategy),
        config.constraint.min_area,
    );
    let others: Vec<&Geometry> = request.others.iter().collect();
    let constrained =
        engine.constrain_with_report(&request.candidate, request.boundary.as_ref(), &others)?;
    Ok(ConstrainResponse {
        geometry: constrained.geometry,
        report: constrained.report,
    })
}

async fn close_rings_handler(Json(geometry): Json<Geometry>) -> Json<Geometry> {
    Json(close_rings(geometry))
}

/// Overlap and containment audit over a posted list of zones
async fn audit_handler(
    State(state): State<Arc<AppState>>,
    Json(zones): Json<Vec<Zone>>,
) -> Json<AuditReport> {
    let set = ZoneSet::new(zones);
    Json(audit(&set, state.config.constraint.min_area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> ConstrainRequest {
        serde_json::from_value(body).unwrap()
    }

    fn square(x0: f64, y0: f64, size: f64) -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [x0, y0], [x0 + size, y0], [x0 + size, y0 + size], [x0, y0 + size], [x0, y0]
            ]]
        })
    }

    #[test]
    fn test_constrain_reports_retained_area() {
        let response = constrain(
            &Config::default(),
            request(json!({
                "candidate": square(0.0, 0.0, 10.0),
                "boundary": square(0.0, 0.0, 20.0),
                "others": [square(6.0, 0.0, 10.0)]
            })),
        )
        .unwrap();
        assert!((response.report.retained_ratio - 0.6).abs() < 1e-9);
        assert_eq!(response.report.trimmed_against, 1);
    }

    #[tokio::test]
    async fn test_outside_boundary_is_unprocessable() {
        let state = Arc::new(AppState {
            config: Config::default(),
        });
        let result = constrain_handler(
            State(state),
            Json(request(json!({
                "candidate": square(50.0, 50.0, 1.0),
                "boundary": square(0.0, 0.0, 10.0),
                "strategy": "union"
            }))),
        )
        .await;

        let (status, Json(body)) = result.err().unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.kind, "outside_boundary");
    }

    #[tokio::test]
    async fn test_close_rings_endpoint() {
        let open: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
        }))
        .unwrap();
        let Json(closed) = close_rings_handler(Json(open)).await;
        match closed.value {
            geojson::Value::Polygon(rings) => assert_eq!(rings[0].len(), 4),
            other => panic!("unexpected {:?}", other),
        }
    }
}
