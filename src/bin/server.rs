use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use stock_nester::types::SearchLimits;
use stock_nester::{Error, NestingRequest, Outcome, Solver};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

fn env_u64(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(name, %value, "ignoring non-numeric limit");
            None
        }
    }
}

/// Server-wide limits; a request may only tighten them.
fn default_limits() -> SearchLimits {
    SearchLimits {
        max_steps: env_u64("NEST_MAX_STEPS"),
        time_limit_ms: env_u64("NEST_TIME_LIMIT_MS"),
    }
}

fn tighter(requested: Option<u64>, cap: Option<u64>) -> Option<u64> {
    match (requested, cap) {
        (Some(r), Some(c)) => Some(r.min(c)),
        (r, c) => r.or(c),
    }
}

/// Incomplete outcomes still carry their diagnostic body.
fn status_for(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::Complete(_) => StatusCode::OK,
        Outcome::Infeasible(_) | Outcome::Exhausted(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn reject(error: Error) -> (StatusCode, String) {
    tracing::info!(error = %error, "rejected request");
    (StatusCode::BAD_REQUEST, error.to_string())
}

async fn optimize(
    Json(mut req): Json<NestingRequest>,
) -> Result<(StatusCode, Json<Outcome>), (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let caps = default_limits();
    req.limits = SearchLimits {
        max_steps: tighter(req.limits.max_steps, caps.max_steps),
        time_limit_ms: tighter(req.limits.time_limit_ms, caps.time_limit_ms),
    };

    let outcome = tokio::task::spawn_blocking(move || Solver::new(req).solve())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "solver task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "solver failed".to_string())
        })?
        .map_err(reject)?;

    if let Outcome::Exhausted(exhaustion) = &outcome {
        tracing::warn!(
            unplaced = exhaustion.unplaced.len(),
            steps = exhaustion.stats.steps,
            "search exhausted"
        );
    }

    Ok((status_for(&outcome), Json(outcome)))
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
