use std::{process, sync::Arc};

use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use unevent::{
    application::{
        content::{ListingService, ProfileService, ReviewService, UserService},
        error::AppError,
        notify::TagFanout,
        repos::{ListingsRepo, ProfilesRepo, ReviewsRepo, UsersRepo},
        revalidation::RevalidationService,
    },
    cache::{CacheConfig, HomeStamp, PageCache},
    config,
    infra::{
        error::InfraError,
        http::{self, AdminState, FrontendState},
        kv,
        memory::MemoryRepositories,
        outbound, telemetry,
    },
};

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Revalidate(args) => run_revalidate(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let fanout = outbound::fanout_from_settings(&settings)?;
    if settings.service.token.is_none() {
        warn!(
            target = "unevent::serve",
            "service token not configured; revalidation and admin requests will be rejected"
        );
    }

    let store = kv::connect(&settings.store).await;
    let cache_config = CacheConfig::from_settings(&settings.page_cache, &settings.store);
    let page_cache = PageCache::new(cache_config.clone());
    let stamp = HomeStamp::new(store, cache_config.stamp_ttl());

    let repositories = Arc::new(MemoryRepositories::new());
    let service_token: Option<Arc<str>> = settings.service.token.as_deref().map(Arc::from);

    let listings = build_listing_service(&repositories, fanout.clone());
    let frontend_state = FrontendState {
        revalidation: RevalidationService::new(page_cache.clone(), stamp),
        page_cache,
        listings: listings.clone(),
        service_token: service_token.clone(),
    };
    let admin_state = build_admin_state(&repositories, listings, fanout, service_token);

    serve_http(&settings, frontend_state, admin_state).await
}

async fn run_revalidate(
    settings: config::Settings,
    args: config::RevalidateArgs,
) -> Result<(), AppError> {
    let fanout = outbound::fanout_from_settings(&settings)?;
    info!(
        target = "unevent::revalidate",
        tag_count = args.tags.len(),
        "sending tags"
    );

    let deliveries = fanout.fan_out(&args.tags).await;
    let failed: Vec<&str> = deliveries
        .iter()
        .filter(|delivery| delivery.outcome.is_failed())
        .map(|delivery| delivery.target)
        .collect();
    if !failed.is_empty() {
        return Err(AppError::unexpected(format!(
            "tag delivery failed for: {}",
            failed.join(", ")
        )));
    }
    if deliveries.iter().all(|delivery| delivery.outcome.is_skipped()) {
        warn!(
            target = "unevent::revalidate",
            "no notifier is configured; nothing was sent"
        );
    }
    Ok(())
}

fn build_listing_service(repositories: &Arc<MemoryRepositories>, fanout: TagFanout) -> ListingService {
    let listings_repo: Arc<dyn ListingsRepo> = repositories.clone();
    ListingService::new(listings_repo, fanout)
}

fn build_admin_state(
    repositories: &Arc<MemoryRepositories>,
    listings: ListingService,
    fanout: TagFanout,
    service_token: Option<Arc<str>>,
) -> AdminState {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let profiles_repo: Arc<dyn ProfilesRepo> = repositories.clone();
    let reviews_repo: Arc<dyn ReviewsRepo> = repositories.clone();
    let listings_repo: Arc<dyn ListingsRepo> = repositories.clone();

    AdminState {
        users: UserService::new(users_repo.clone()),
        profiles: ProfileService::new(users_repo, profiles_repo),
        reviews: ReviewService::new(reviews_repo, listings_repo, fanout),
        listings,
        service_token,
    }
}

async fn serve_http(
    settings: &config::Settings,
    frontend_state: FrontendState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_frontend_router(frontend_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "unevent::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
