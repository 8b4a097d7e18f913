use actix_web::{http::StatusCode, middleware::ErrorHandlers, web, App, HttpServer};
use anyhow::{bail, Context};
use blog_service::auth::{SessionKeys, SessionMiddleware};
use blog_service::config::{LogFormat, StorageBackend};
use blog_service::db::{BlogRepository, MemoryRepository, PgRepository};
use blog_service::handlers;
use blog_service::media::MediaStore;
use blog_service::metrics::RequestMetrics;
use blog_service::models::NewGroup;
use blog_service::{AppState, Config};
use db_pool::{create_pool, DbConfig};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn BlogRepository>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::from_env("blog-service", &config.database.url);
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Connected to database via db-pool crate");

            Ok(Arc::new(PgRepository::new(pool)))
        }
        StorageBackend::Memory => {
            if config.is_production() {
                bail!("STORAGE_BACKEND=memory is not allowed in production");
            }
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

/// `blog-service create-group <slug> <title> [description]`
async fn create_group(repo: &dyn BlogRepository, args: &[String]) -> anyhow::Result<()> {
    let (slug, title) = match args {
        [slug, title, ..] => (slug.clone(), title.clone()),
        _ => bail!("usage: blog-service create-group <slug> <title> [description]"),
    };
    let description = args.get(2).cloned().unwrap_or_default();

    let group = repo
        .create_group(NewGroup {
            title,
            slug,
            description,
        })
        .await
        .context("Failed to create group")?;
    tracing::info!(group_id = %group.id, slug = %group.slug, "Group created");
    Ok(())
}

/// Blog Service
///
/// Server-rendered blog: posts, groups, comments, follows and the follow feed.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/`, `/follow/` - listings
/// - `/posts/{post_id}/`, `/create/`, `/posts/{post_id}/edit/` - posts
/// - `/auth/*` - signup, login, logout
/// - `/health`, `/metrics` - operations
///
/// Runs on port 8000 unless `BLOG_SERVICE_PORT` says otherwise.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.log_format);
    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let repo = build_repository(&config).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(cmd) = args.first() {
        match cmd.as_str() {
            "create-group" => return create_group(repo.as_ref(), &args[1..]).await,
            other => bail!("unknown command '{}'", other),
        }
    }

    let media = MediaStore::from_config(&config.media);
    tokio::fs::create_dir_all(media.root())
        .await
        .with_context(|| format!("Failed to create media root {}", media.root().display()))?;

    let sessions = SessionKeys::from_config(&config.session);
    let state = web::Data::new(AppState::new(
        repo,
        sessions.clone(),
        media,
        config.pagination.posts_per_page,
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, handlers::core::render_not_found),
            )
            .wrap(SessionMiddleware::new(sessions.clone()))
            .wrap(RequestMetrics)
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
            .default_service(web::route().to(handlers::core::not_found))
    })
    .workers(config.app.workers)
    .shutdown_timeout(30)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        handle.stop(true).await;
    });

    server.await.context("HTTP server failed")?;
    tracing::info!("blog-service stopped");
    Ok(())
}
