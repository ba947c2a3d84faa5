use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{BookingService, SlotService};
use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use doctor_cell::services::{AvailabilityService, ScheduleService};
use doctor_cell::store::{AvailabilityStore, InMemoryAvailabilityStore, SupabaseAvailabilityStore};
use security_cell::AuditService;
use shared_config::{AppConfig, StorageBackend};
use shared_database::SupabaseClient;

use router::Services;

fn build_services(config: &AppConfig) -> (Services, Arc<AuditService>) {
    let (availability_store, appointment_store, audit): (
        Arc<dyn AvailabilityStore>,
        Arc<dyn AppointmentStore>,
        Arc<AuditService>,
    ) = match config.effective_backend() {
        StorageBackend::Supabase => {
            info!("Using Supabase storage at {}", config.supabase_url);
            let supabase = Arc::new(SupabaseClient::new(config));
            (
                Arc::new(SupabaseAvailabilityStore::new(supabase.clone())),
                Arc::new(SupabaseAppointmentStore::new(supabase.clone())),
                Arc::new(AuditService::with_supabase(supabase)),
            )
        }
        StorageBackend::Memory => {
            if config.storage_backend == StorageBackend::Supabase {
                warn!("Supabase is not configured, falling back to in-memory storage");
            } else {
                info!("Using in-memory storage");
            }
            (
                Arc::new(InMemoryAvailabilityStore::new()),
                Arc::new(InMemoryAppointmentStore::new()),
                Arc::new(AuditService::new()),
            )
        }
    };

    let availability = Arc::new(AvailabilityService::new(availability_store.clone()));

    let services = Services {
        schedule: Arc::new(ScheduleService::new(availability_store, audit.clone())),
        booking: Arc::new(BookingService::new(
            appointment_store.clone(),
            availability.clone(),
            audit.clone(),
            config,
        )),
        slots: Arc::new(SlotService::new(availability, appointment_store, config)),
    };

    (services, audit)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    // Load configuration
    let config = AppConfig::from_env();
    info!("Slot duration: {} minutes", config.slot_duration_minutes);

    let (services, audit) = build_services(&config);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = audit.flush_audit_buffer().await {
        warn!("Failed to flush audit entries on shutdown: {}", e);
    }

    Ok(())
}
