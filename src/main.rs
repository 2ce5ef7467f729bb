use accounts::config::{Configuration, Mode};
use accounts::{app, initialize_state, telemetry};
use opentelemetry::global;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

type BoxLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_default();
    let loaded = Configuration::default().path(path).read();
    let mode = loaded
        .as_ref()
        .map(|config| config.mode)
        .unwrap_or_default();
    let endpoint = loaded
        .as_ref()
        .ok()
        .and_then(|config| config.telemetry.as_ref())
        .and_then(|telemetry| telemetry.otlp_endpoint.clone());

    let otlp_logs = match endpoint.as_deref().map(telemetry::setup_logging) {
        Some(Ok(bridge)) => Some(bridge),
        Some(Err(err)) => {
            eprintln!("cannot export logs through OTLP: {err}");
            None
        },
        None => None,
    };

    let fmt: BoxLayer = match mode {
        Mode::Development => tracing_subscriber::fmt::layer().boxed(),
        Mode::Production => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .boxed(),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.default_directive()));

    tracing_subscriber::registry()
        .with(fmt)
        .with(filter)
        .with(otlp_logs)
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration not loaded, using defaults");
            Configuration::default()
        },
    };

    let tracer = endpoint.as_deref().and_then(|endpoint| {
        match telemetry::setup_tracer(endpoint) {
            Ok(provider) => {
                global::set_tracer_provider(provider.clone());
                Some(provider)
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot export traces through OTLP");
                None
            },
        }
    });

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(error = %err, "prometheus recorder not installed");
            None
        },
    };

    let address = config.address.clone();
    let state = initialize_state(config, metrics).await?;

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(%address, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer(tracer);

    Ok(())
}

fn shutdown_tracer(provider: Option<SdkTracerProvider>) {
    if let Some(provider) = provider {
        if let Err(err) = provider.shutdown() {
            tracing::error!(error = %err, "tracer provider not flushed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping server");
}
