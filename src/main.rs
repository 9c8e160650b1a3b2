use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ride_booking_backend::{
    config::Config,
    db,
    google::GoogleMaps,
    locations::{sessions::FieldSessions, LocationResolver, PlacesSearchClient},
    payment::PaymentRegistry,
    routes,
    routing::RouteDistanceCalculator,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_booking_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Invalid configuration");
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    // Curated locations are read once and never change while running
    let admin_index = db::load_admin_locations(&db)
        .await
        .expect("Failed to load admin locations");
    tracing::info!("Loaded {} admin locations", admin_index.len());

    let maps = GoogleMaps::new(&config.google_maps_api_key);
    let places = Arc::new(
        PlacesSearchClient::new(
            Arc::new(maps.clone()),
            &config.places_country,
            config.places_debounce(),
        )
        .with_types(config.places_types.clone()),
    );

    // Searches report "loading" until this finishes
    {
        let places = places.clone();
        tokio::spawn(async move {
            places.load().await;
        });
    }

    let sessions = Arc::new(FieldSessions::new(places.clone(), config.session_idle()));
    {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                sessions.evict_idle();
            }
        });
    }

    // Create app state
    let state = AppState {
        db,
        resolver: LocationResolver::new(Arc::new(admin_index), places),
        sessions,
        distance: RouteDistanceCalculator::new(Arc::new(maps)),
        payments: Arc::new(PaymentRegistry::default()),
    };

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
