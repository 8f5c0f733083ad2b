use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use configuration::Settings;
use database::{ConnectionManager, Connector};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod adapter;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use adapter::run_adapter;

pub const ROOT_PATH: &str = "/";
pub const HEALTH_PATH: &str = "/api/health";
pub const USER_PATH: &str = "/user";
pub const GAMES_PATH: &str = "/AllGames";
pub const NOTIFICATION_PATH: &str = "/Notification";

/// The shared application state that all handlers can access.
pub struct AppState<C: Connector> {
    pub db: Arc<ConnectionManager<C>>,
}

impl<C: Connector> AppState<C> {
    pub fn new(db: Arc<ConnectionManager<C>>) -> Self {
        Self { db }
    }
}

// Manual impl: a derive would demand `C: Clone`.
impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

/// The route groups mounted under their fixed prefixes. Their handlers live
/// outside this crate; a group that is not supplied is not mounted.
pub struct RouteGroups<C: Connector> {
    user: Option<Router<AppState<C>>>,
    games: Option<Router<AppState<C>>>,
    notifications: Option<Router<AppState<C>>>,
}

impl<C: Connector> Default for RouteGroups<C> {
    fn default() -> Self {
        Self {
            user: None,
            games: None,
            notifications: None,
        }
    }
}

impl<C: Connector> RouteGroups<C> {
    /// Mounted at `/user`.
    pub fn user(mut self, router: Router<AppState<C>>) -> Self {
        self.user = Some(router);
        self
    }

    /// Mounted at `/AllGames`.
    pub fn games(mut self, router: Router<AppState<C>>) -> Self {
        self.games = Some(router);
        self
    }

    /// Mounted at `/Notification`.
    pub fn notifications(mut self, router: Router<AppState<C>>) -> Self {
        self.notifications = Some(router);
        self
    }

    fn mount(self, mut router: Router<AppState<C>>) -> Router<AppState<C>> {
        let groups = [
            (USER_PATH, self.user),
            (GAMES_PATH, self.games),
            (NOTIFICATION_PATH, self.notifications),
        ];
        for (path, group) in groups
            .into_iter()
            .filter_map(|(path, group)| group.map(|group| (path, group)))
        {
            router = router.nest(path, group);
        }
        router
    }
}

/// Assembles the application router.
///
/// Middleware runs outer to inner: request tracing, body limit, origin
/// guard, CORS headers, request context, then the routes.
pub fn build_app<C: Connector>(
    settings: &Settings,
    state: AppState<C>,
    groups: RouteGroups<C>,
) -> Router {
    let allow_list = Arc::new(settings.allowed_origins.clone());

    let routes = Router::new()
        .route(ROOT_PATH, get(handlers::root::<C>))
        .route(HEALTH_PATH, get(handlers::health::<C>));

    groups
        .mount(routes)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(from_fn(middleware::request_context))
        .layer(middleware::cors_layer(&settings.allowed_origins))
        .layer(from_fn_with_state(allow_list, middleware::origin_guard))
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Runs the long-lived server.
///
/// The database handshake happens first; if it fails the error is returned
/// before anything is bound, so the caller can exit non-zero.
pub async fn run_server<C: Connector>(
    settings: &Settings,
    manager: Arc<ConnectionManager<C>>,
    groups: RouteGroups<C>,
) -> anyhow::Result<()> {
    manager.ensure_connected().await?;

    let app = build_app(settings, AppState::new(manager), groups);

    let addr = SocketAddr::new(settings.bind_host, settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received.");
}
