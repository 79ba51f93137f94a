use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        booking::BookingUseCase, payment_gateway::DepositGateway,
        payment_webhook::PaymentWebhookUseCase, slot_catalog::SlotCatalogUseCase,
    },
};
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use crates::{
    domain::repositories::{
        bookings::BookingRepository, notifications::BookingNotifier,
        profiles::ProfileRepository, slots::SlotRepository,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, profiles::ProfilePostgres, slots::SlotPostgres,
            },
        },
        notifications::{
            dispatcher::{NotificationDispatcher, NotificationProvider},
            log_provider::LogNotificationProvider,
            webhook_provider::WebhookNotificationProvider,
        },
    },
    payments::stripe_client::{StripeClient, StripeSettings},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub struct UseCases {
    pub catalog: Arc<SlotCatalogUseCase>,
    pub booking: Arc<BookingUseCase>,
    pub webhook: Arc<PaymentWebhookUseCase>,
}

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let usecases = build_usecases(&config, db_pool)?;

    let allow_origin = if config.stage.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            config
                .app
                .origin()
                .parse()
                .context("APP_BASE_URL origin is not a valid header value")?,
        )
    };

    let app = routes(usecases)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE])
                .allow_origin(allow_origin),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        stage = %config.stage,
        "Server is running on port {}", config.backend_server.port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn routes(usecases: UseCases) -> Router {
    Router::new()
        .fallback(default_routers::not_found)
        .merge(routers::search::routes(usecases.catalog))
        .merge(routers::bookings::routes(usecases.booking))
        .merge(routers::payment_webhook::routes(usecases.webhook))
        .route("/health-check", get(default_routers::health_check))
}

fn build_usecases(config: &DotEnvyConfig, db_pool: Arc<PgPoolSquad>) -> Result<UseCases> {
    let slot_repository: Arc<dyn SlotRepository + Send + Sync> =
        Arc::new(SlotPostgres::new(Arc::clone(&db_pool)));
    let profile_repository: Arc<dyn ProfileRepository + Send + Sync> =
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool)));
    let booking_repository: Arc<dyn BookingRepository + Send + Sync> =
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));

    let gateway: Arc<dyn DepositGateway> = Arc::new(StripeClient::new(StripeSettings {
        secret_key: config.stripe.secret_key.clone(),
        webhook_secret: config.stripe.webhook_secret.clone(),
        webhook_tolerance_seconds: config.stripe.webhook_tolerance_seconds,
        success_url: config.app.checkout_success_url(),
        cancel_url: config.app.checkout_cancel_url(),
        currency: config.deposits.currency.clone(),
        payment_method_types: config.stripe.payment_method_types.clone(),
        hold_ttl_minutes: config.deposits.hold_ttl_minutes,
    }));

    let mut providers: Vec<Arc<dyn NotificationProvider>> = vec![Arc::new(LogNotificationProvider)];
    if let Some(webhook_url) = config.notifications.webhook_url.clone() {
        providers.push(Arc::new(WebhookNotificationProvider::new(webhook_url)?));
        info!("booking notifications: webhook provider enabled");
    }
    let notifier: Arc<dyn BookingNotifier + Send + Sync> =
        Arc::new(NotificationDispatcher::new(providers));

    Ok(UseCases {
        catalog: Arc::new(SlotCatalogUseCase::new(
            Arc::clone(&profile_repository),
            Arc::clone(&slot_repository),
        )),
        booking: Arc::new(BookingUseCase::new(
            Arc::clone(&slot_repository),
            profile_repository,
            Arc::clone(&booking_repository),
            Arc::clone(&gateway),
            Arc::clone(&notifier),
        )),
        webhook: Arc::new(PaymentWebhookUseCase::new(
            gateway,
            slot_repository,
            booking_repository,
            notifier,
        )),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::payment_gateway::MockDepositGateway;
    use axum::{body::Body, http::Request};
    use crates::domain::repositories::{
        bookings::MockBookingRepository, notifications::MockBookingNotifier,
        profiles::MockProfileRepository, slots::MockSlotRepository,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let slots: Arc<MockSlotRepository> = Arc::new(MockSlotRepository::new());
        let profiles: Arc<MockProfileRepository> = Arc::new(MockProfileRepository::new());
        let bookings: Arc<MockBookingRepository> = Arc::new(MockBookingRepository::new());
        let gateway: Arc<MockDepositGateway> = Arc::new(MockDepositGateway::new());
        let notifier: Arc<MockBookingNotifier> = Arc::new(MockBookingNotifier::new());

        routes(UseCases {
            catalog: Arc::new(SlotCatalogUseCase::new(profiles.clone(), slots.clone())),
            booking: Arc::new(BookingUseCase::new(
                slots.clone(),
                profiles,
                bookings.clone(),
                gateway.clone(),
                notifier.clone(),
            )),
            webhook: Arc::new(PaymentWebhookUseCase::new(gateway, slots, bookings, notifier)),
        })
    }

    #[tokio::test]
    async fn health_check_and_fallback() {
        let response = app()
            .oneshot(Request::get("/health-check").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}
