//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::{AdminDirectory, LoginService, RouteAuthorizer};
use crate::config::Settings;
use crate::domain::{AdminRepository, IdentityProvider, RoleResolver, RoutePolicy};
use crate::infrastructure::database;
use crate::infrastructure::identity::HttpIdentityProvider;
use crate::infrastructure::rate_limit::RateLimiters;
use crate::infrastructure::repositories::PgAdminRepository;
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging, SecurityHeadersConfig};
use crate::shared::clock::Clock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub admins: Arc<dyn AdminRepository>,
    pub authorizer: Arc<RouteAuthorizer>,
    pub login: Arc<LoginService>,
    pub limiters: Arc<RateLimiters>,
    pub security_headers: Arc<SecurityHeadersConfig>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire services over the given backends.
    pub fn new(
        settings: Settings,
        identity: Arc<dyn IdentityProvider>,
        admins: Arc<dyn AdminRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiters = RateLimiters::from_settings(&settings.rate_limit, clock);
        let policy = RoutePolicy::from_settings(&settings.routes);
        let roles = RoleResolver::new(settings.master_admin_email.clone());

        let authorizer = RouteAuthorizer::new(identity.clone(), admins.clone(), policy);
        let login = LoginService::new(
            limiters.login.clone(),
            identity.clone(),
            AdminDirectory::new(admins.clone(), roles),
        );
        let security_headers = SecurityHeadersConfig::for_https(settings.server.secure_cookies);

        Self {
            identity,
            admins,
            authorizer: Arc::new(authorizer),
            login: Arc::new(login),
            limiters: Arc::new(limiters),
            security_headers: Arc::new(security_headers),
            settings: Arc::new(settings),
        }
    }

    /// Router with tracing and CORS around the guarded routes.
    pub fn into_router(self) -> Router {
        let cors = cors::create_cors_layer(&self.settings.cors);
        routes::create_router(self)
            .layer(logging::create_trace_layer())
            .layer(cors)
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        // The edge never holds a provider session of its own.
        let identity = HttpIdentityProvider::new(&settings.identity)?.persist_session(false);
        tracing::info!(url = %settings.identity.url, "Identity provider client created");

        if settings.master_admin_email.is_none() {
            tracing::warn!("MASTER_ADMIN_EMAIL not set; no identity has the master tier by email");
        }

        let addr: SocketAddr = settings.server_addr().parse()?;
        let state = AppState::new(
            settings,
            Arc::new(identity),
            Arc::new(PgAdminRepository::new(db)),
            crate::shared::clock::system_clock(),
        );
        let router = state.into_router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
