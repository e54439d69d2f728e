//! Application state, handlers not linked to a webhook and the server bootstrap

use crate::{
    config::AppConfig,
    consts,
    errors::WebhookError,
    webhook::{
        self,
        whatsapp::client::{ImplMessageSender, WhatsAppClient},
    },
};
use ntex::web;
use serde_json::json;

/// Shared by every handler of a worker
pub struct AppState {
    pub config: AppConfig,
    pub whatsapp_client: ImplMessageSender,
}

/// Service info, used as liveness check
#[web::get("/")]
pub async fn index() -> impl web::Responder {
    web::HttpResponse::Ok().json(&json!({
        "title": consts::APP_TITLE,
        "version": consts::APP_VERSION,
        "message": "Server is running",
    }))
}

/// Return a [UrlNotFound](WebhookError::UrlNotFound) error for urls not defined
pub async fn serve_not_found() -> Result<web::HttpResponse, web::Error> {
    Err(WebhookError::UrlNotFound.into())
}

/// Registers every route of the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index);
    webhook::routes::whatsapp(cfg);
}

/// Binds the web server and runs it until shutdown
pub async fn run_server(app_config: AppConfig) -> anyhow::Result<()> {
    let server_addr = (
        app_config.web_server_host.clone(),
        app_config.web_server_port,
    );
    // reqwest clients share their pool when cloned
    let whatsapp_client = WhatsAppClient::new(&app_config)?;

    logfire::info!(
        "Starting {title} {version} on {host}:{port}",
        title = consts::APP_TITLE,
        version = consts::APP_VERSION,
        host = app_config.web_server_host.clone(),
        port = app_config.web_server_port as i64
    );

    web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(AppState {
                config: app_config.clone(),
                whatsapp_client: Box::new(whatsapp_client.clone()),
            })
            .configure(configure_routes)
            .default_service(web::route().to(serve_not_found))
    })
    .bind(server_addr)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
