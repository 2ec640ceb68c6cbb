mod handlers;
mod models;
mod services;
mod web;

use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

use handlers::AnalysisController;
use services::{AnalysisService, GeminiClient, PreviewStore};
use web::create_router;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting PlateLens...");

    // Load configuration
    let api_key = env::var("GEMINI_API_KEY")
        .expect("GEMINI_API_KEY must be set in .env file");

    let model = env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| "gemini-2.5-flash".to_string());

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let gemini = Arc::new(GeminiClient::new(api_key, model.clone()));
    log::info!("✅ Analysis client initialized with model: {}", model);

    let previews = Arc::new(PreviewStore::new());
    let controller = Arc::new(AnalysisController::new(
        gemini as Arc<dyn AnalysisService>,
        previews.clone(),
    ));
    log::info!("✅ Analysis controller initialized");

    let app = create_router(controller, previews);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("🌐 Server starting on {}", addr);

    println!("\n🍽️ PlateLens is running!");
    println!("🌐 Open http://localhost:{} in your browser", port);
    println!("📸 Upload a food photo to get the dish, recipe and nutrition");
    println!("\n🛑 Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("🛑 Shutting down...");
        })
        .await?;

    Ok(())
}
