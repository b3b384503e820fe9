use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use photo_portfolio::{
    background_task::start_sweep_task,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    middlewares::auth::AdminSessionMiddleware,
    routes::{configure_routes, multipart_config},
    settings::AppConfig,
    AppState,
};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header("x-revalidate-token")
        .supports_credentials()
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => {
            init_tracing(cfg.is_production());
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = create_pool(&config)
        .await
        .map_err(|e| std::io::Error::other(format!("Database connection failed: {}", e)))?;

    run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Migrations failed: {}", e)))?;

    let app_state = web::Data::new(
        AppState::new(&config, pool).map_err(|e| std::io::Error::other(e.to_string()))?,
    );

    let server_addr = format!("{}:{}", config.host, config.port);
    let origins = config.cors_origins();
    let max_upload_bytes = config.max_upload_bytes;
    let multipart_limit = config.multipart_total_limit();

    tracing::info!(
        "Starting {} v{} on {} (storage: {})",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        app_state.storage_backend()
    );

    let sweep_state = app_state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(multipart_config(max_upload_bytes, multipart_limit))
            .wrap(AdminSessionMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(cors(&origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    actix_rt::spawn(start_sweep_task(sweep_state));

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
