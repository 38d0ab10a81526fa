use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use recruitment_pipeline::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Sweep worker: persists COMPLETED for interviews whose window has
    // elapsed, independent of read traffic. CAS writes keep it safe to run
    // alongside other instances.
    {
        let state = app_state.clone();
        let interval = Duration::from_secs(config.sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.sweep_service.run_once().await {
                    tracing::error!(error = ?e, "completion sweep error");
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let pipeline_api = Router::new()
        .route(
            "/api/applications",
            get(routes::application::list_applications)
                .post(routes::application::submit_application),
        )
        .route(
            "/api/applications/:id",
            get(routes::application::get_application),
        )
        .route(
            "/api/applications/:id/transition",
            post(routes::application::transition_application),
        )
        .route(
            "/api/applications/:id/hold",
            post(routes::application::hold_toggle),
        )
        .route(
            "/api/applications/:id/document-verification",
            post(routes::application::move_to_document_verification),
        )
        .route(
            "/api/applications/:id/matching",
            post(routes::application::trigger_matching),
        )
        .route(
            "/api/applications/:id/matching-score",
            post(routes::application::record_matching_score),
        )
        .route(
            "/api/applications/:id/rounds",
            post(routes::round::add_round),
        )
        .route(
            "/api/rounds/:id",
            axum::routing::patch(routes::round::edit_round).delete(routes::round::delete_round),
        )
        .route("/api/rounds/:id/result", post(routes::round::record_result))
        .route(
            "/api/rounds/:id/interviews",
            post(routes::interview::schedule_interview),
        )
        .route(
            "/api/interviews/:id",
            axum::routing::patch(routes::interview::edit_interview)
                .delete(routes::interview::delete_interview),
        )
        .route(
            "/api/interviews/:id/feedback",
            post(routes::interview::submit_feedback),
        )
        .route(
            "/api/interviews/:id/finalize",
            post(routes::interview::finalize_completion),
        )
        .layer(axum::middleware::from_fn(
            recruitment_pipeline::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            recruitment_pipeline::middleware::rate_limit::new_rps_state(config.api_rps),
            recruitment_pipeline::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(pipeline_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
