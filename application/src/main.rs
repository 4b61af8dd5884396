use std::{
    future::{self, IntoFuture as _},
    io,
    sync::{Arc, OnceLock},
    time::Duration,
};

use application::{api, config, graphql, Args, Config, Service};
use axum::{
    body::Body,
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use juniper::EmptySubscription;
use service::infra::Postgres;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] to emit, set once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    init_logging();

    _ = run().await;
}

/// Splits the log output between `stdout` and `stderr`, both capped by the
/// [`LOG_LEVEL`].
fn init_logging() {
    let passes = |meta: &log::Metadata<'_>, to_stderr: bool| {
        meta.is_span()
            || STDERR_LEVELS.contains(meta.level()) == to_stderr
                && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                    >= *meta.level()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(move |meta| passes(meta, false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(move |meta| passes(meta, true))),
        )
        .init();
}

async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let service = service::Config::try_from(service).map_err(|e| {
        log::error!("invalid `service` configuration: {e}");
    })?;
    log::info!(
        currency = %service.currency,
        utc_offset = %service.utc_offset,
        "observing loans",
    );
    let service = Service::new(service, open_database(postgres).await?);

    let app = router(service, cors(&server.cors)?);

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .into_future()
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Connects to the [`Postgres`] database, bringing its schema up to date.
async fn open_database(conf: config::Postgres) -> Result<Postgres, ()> {
    let conf = conf.into();
    let mut postgres = Postgres::new(&conf).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    let report = postgres.migrate().await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;
    for m in report.applied_migrations() {
        log::info!("applied `{m}` database migration");
    }

    Ok(postgres)
}

/// Builds the [`CorsLayer`] allowing the configured origins to use the
/// GraphQL endpoint.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            conf.origins
                .iter()
                .map(|origin| {
                    origin.parse::<http::HeaderValue>().map_err(|e| {
                        log::error!("`{origin}` is not a valid CORS origin: {e}");
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(origins))
}

/// Routes the GraphQL endpoint over the provided [`Service`].
fn router(service: Service, cors: CorsLayer) -> Router {
    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response),
        )
}

/// Opens the [`tracing::Span`] of the provided HTTP request.
fn request_span(r: &http::Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.host = r.uri().host(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.scheme = r.uri().scheme().map(http::uri::Scheme::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Records the status of the provided HTTP response in its `span`.
fn log_response(r: &http::Response<Body>, dur: Duration, span: &tracing::Span) {
    _ = span.record(
        "http.status_code",
        tracing::field::display(r.status().as_u16()),
    );

    let duration = format!("{}ms", dur.as_millis());
    if r.status().is_server_error() || r.status().is_client_error() {
        tracing::error!(duration = %duration);
    } else {
        tracing::info!(duration = %duration);
    }
}

/// Resolves once the process is asked to terminate.
async fn shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        future::pending::<()>().await;
    }
    log::info!("shutting down");
}
