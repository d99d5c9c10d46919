mod analyzer;
mod api;
mod classifier;
mod playstore;
mod sampler;
mod text;

use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::classifier::ClassifierService;
use crate::playstore::GooglePlaySource;

#[derive(OpenApi)]
#[openapi(
    paths(api::analyze, api::health),
    components(
        schemas(
            api::AnalyzeRequest,
            api::ErrorResponse,
            api::HealthResponse,
            analyzer::AnalysisResult,
            analyzer::ReviewExample,
            classifier::Sentiment
        )
    ),
    tags(
        (name = "analysis", description = "Review Sentiment Analysis API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    // Artifacts load once; without them the service still runs, but the
    // analysis route refuses requests.
    let classifier = match ClassifierService::from_env() {
        Ok(service) => {
            println!("✅ Classifier artifacts loaded.");
            Some(Arc::new(service))
        }
        Err(e) => {
            eprintln!(
                "❌ Classifier artifacts unavailable: {:#}. /analyze is disabled.",
                e
            );
            None
        }
    };

    let state = Arc::new(api::AppState {
        source: Arc::new(GooglePlaySource::new()),
        classifier,
        lang: env::var("REVIEWS_LANG").unwrap_or_else(|_| "id".to_string()),
        country: env::var("REVIEWS_COUNTRY").unwrap_or_else(|_| "id".to_string()),
    });

    let app = Router::new()
        .merge(
            SwaggerUi::new("/review-radar-swagger")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .route("/analyze", post(api::analyze))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive()) // the dashboard is served from another origin
        .with_state(state);

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    println!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
