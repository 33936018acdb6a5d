use std::{future::IntoFuture, process, sync::Arc};

use folio::{
    application::{
        cms::ContentStore,
        error::AppError,
        provisioning::{ProvisioningDelays, ProvisioningService},
    },
    config::{self, CmsMode, Settings},
    infra::{
        cms::build_store,
        error::InfraError,
        http::{self, RouterState},
        telemetry,
    },
};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let (store, store_kind) = build_store(&settings.cms)?;
    warn_on_missing_credentials(&settings);

    match command {
        config::Command::Serve(_) => run_serve(settings, store, store_kind).await,
        config::Command::Provision => run_provision(settings, store).await,
        config::Command::Status => run_status(settings, store, store_kind).await,
    }
}

fn warn_on_missing_credentials(settings: &Settings) {
    if settings.cms.mode != CmsMode::Contentstack {
        return;
    }

    let missing: Vec<&str> = [
        ("api_key", settings.cms.api_key.is_none()),
        ("delivery_token", settings.cms.delivery_token.is_none()),
        ("management_token", settings.cms.management_token.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    if !missing.is_empty() {
        warn!(
            target = "folio::startup",
            missing = ?missing,
            "CMS credentials are incomplete; affected requests will fail"
        );
    }
}

async fn run_serve(
    settings: Settings,
    store: Arc<dyn ContentStore>,
    store_kind: &'static str,
) -> Result<(), AppError> {
    let state = RouterState::new(store, store_kind, &settings);
    let app = http::build_app(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::serve",
        addr = %settings.server.addr,
        store = store_kind,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(wait_for_signal(shutdown.clone()));

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline => {
            warn!(
                target = "folio::serve",
                grace_seconds = grace.as_secs(),
                "in-flight requests did not drain in time"
            );
        }
    }

    info!(target = "folio::serve", "server stopped");
    Ok(())
}

async fn wait_for_signal(shutdown: Arc<Notify>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "folio::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "folio::serve", "shutdown signal received");
    shutdown.notify_one();
}

async fn run_provision(settings: Settings, store: Arc<dyn ContentStore>) -> Result<(), AppError> {
    let provisioning = ProvisioningService::new(
        store,
        ProvisioningDelays {
            after_entry: settings.provisioning.entry_delay,
            between_publishes: settings.provisioning.publish_delay,
        },
    );

    let report = provisioning.run().await?;
    info!(
        target = "folio::provision",
        schemas_created = report.schemas_created.len(),
        entries_created = report.entries_created.len(),
        published = report.published,
        "provisioning finished"
    );
    print_json(&report)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    store: &'static str,
    content_types_exist: bool,
    #[serde(flatten)]
    setup: folio::application::setup::SetupStatus,
}

async fn run_status(
    mut settings: Settings,
    store: Arc<dyn ContentStore>,
    store_kind: &'static str,
) -> Result<(), AppError> {
    // Reporting must not create anything.
    settings.provisioning.auto = false;
    let state = RouterState::new(store.clone(), store_kind, &settings);

    let provisioning = ProvisioningService::new(store, ProvisioningDelays::NONE);
    let content_types_exist = provisioning.content_types_exist().await;
    let setup = state.api.setup.status().await;

    print_json(&StatusReport {
        store: store_kind,
        content_types_exist,
        setup,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode report: {err}")))?;
    println!("{rendered}");
    Ok(())
}
