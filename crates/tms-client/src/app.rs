//! Main application orchestration.
//!
//! Mirrors the demonstration flow against the remote service:
//! 1. login, create the run's portfolio (tolerating "already exists")
//! 2. create targets from configuration; any other rejection is fatal and
//!    aborts before a single subscription exists
//! 3. open the three subscriptions, each consumed by its own task routing
//!    into one [`TradingFlow`]
//! 4. route targets to the destination with percent wave sizing and send
//!    the first wave
//! 5. block on the completion latch, then shut down cooperatively: close
//!    all request channels, join the consumers, stop the scheduler

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tms_core::fields::names;
use tms_core::{FieldMap, TargetId, WaveSizeType};
use tms_engine::{
    ActionScheduler, CompletionLatch, StreamConsumer, TradingBook, TradingFlow,
};
use tms_remote::{
    error_codes, log_remote_failure, AddTargetsRequest, CreateMarketPortfolioRequest,
    DynTradingService, LoginRequest, ModifyTargetsRequest, RemoteResult, RequestChannel,
    SendOrdersRequest, SubscribeForMarketDataRequest, SubscribeForOrdersRequest,
    SubscribeForTargetsRequest, TradingService,
};
use tracing::{info, warn};

/// Bound on waiting for consumer tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The demonstration client application.
pub struct Application {
    config: AppConfig,
    service: DynTradingService,
}

impl Application {
    /// Wire the application over a trading service.
    #[must_use]
    pub fn new(config: AppConfig, service: DynTradingService) -> Self {
        Self { config, service }
    }

    /// Run the whole flow; returns once every target has completed.
    pub async fn run(self) -> AppResult<()> {
        let Self { config, service } = self;

        if config.targets.is_empty() {
            return Err(AppError::Config("no targets configured".to_string()));
        }

        service
            .login(LoginRequest {
                user: config.user.clone(),
                password: config.password.clone(),
            })
            .await?;

        let portfolio = format!(
            "{} - {}",
            config.portfolio_prefix,
            chrono::Local::now().format("%Y%d%m %H:%M:%S")
        );
        ensure_portfolio(&service, &portfolio).await?;

        let rows: Vec<FieldMap> = config.targets.iter().map(|t| t.to_fields()).collect();
        let target_ids: Vec<TargetId> = match service
            .add_market_targets(AddTargetsRequest {
                portfolio: portfolio.clone(),
                fields: rows,
            })
            .await
        {
            Ok(ids) => ids,
            Err(err) => {
                log_remote_failure("addMarketTargets", &err);
                return Err(err.into());
            }
        };
        info!(count = target_ids.len(), portfolio = %portfolio, "Targets created");

        let latch = Arc::new(CompletionLatch::new(target_ids.len()));
        let scheduler = Arc::new(ActionScheduler::new());
        let scheduler_task = scheduler.clone().spawn();
        let flow = Arc::new(TradingFlow::new(
            Arc::new(TradingBook::new()),
            service.clone(),
            scheduler.clone(),
            latch.clone(),
            config.escalation.to_engine_config(),
            config.user.clone(),
        ));

        // Targets subscription.
        let (targets_channel, targets_requests) =
            RequestChannel::with_initial(SubscribeForTargetsRequest {
                filter: format!("Portfolio = '{portfolio}'"),
                fields: vec![
                    names::TGT_ID.to_string(),
                    names::UNRELEASED.to_string(),
                    names::TEXT.to_string(),
                ],
            });
        let target_events = service.subscribe_market_targets(targets_requests).await?;
        let targets_task = {
            let flow = flow.clone();
            StreamConsumer::spawn("market-targets", target_events, move |event| {
                flow.handle_target_event(event)
            })
        };

        // Route targets and set percent wave sizing.
        service
            .modify_market_targets(ModifyTargetsRequest {
                target_ids: target_ids.clone(),
                fields: vec![FieldMap::new()
                    .with_string(names::TRN_DESTINATION, config.destination.clone())
                    .with_numeric(names::WAVE_SIZE_TYPE, WaveSizeType::PctTgtQty.as_field())
                    .with_numeric(names::WAVE_SIZE, config.wave_size_pct)],
            })
            .await?;

        // Orders subscription.
        let (orders_channel, order_requests) =
            RequestChannel::with_initial(SubscribeForOrdersRequest {
                filter: format!("Portfolio = '{portfolio}'"),
                fields: vec![
                    names::TGT_ID.to_string(),
                    names::INSTRUMENT.to_string(),
                    names::LEAVES.to_string(),
                    names::ORD_PX.to_string(),
                ],
            });
        let order_events = service.subscribe_orders(order_requests).await?;
        let orders_task = {
            let flow = flow.clone();
            StreamConsumer::spawn("orders", order_events, move |event| {
                flow.handle_order_event(event)
            })
        };

        // Market data subscription.
        let (market_data_channel, market_data_requests) =
            RequestChannel::with_initial(SubscribeForMarketDataRequest {
                instruments: config.instruments(),
                fields: vec![names::LAST_PX.to_string(), names::MID_PX.to_string()],
            });
        let market_data_events = service.subscribe_market_data(market_data_requests).await?;
        let market_data_task = {
            let flow = flow.clone();
            StreamConsumer::spawn("market-data", market_data_events, move |event| {
                flow.handle_market_data_event(event)
            })
        };

        // First wave; subsequent waves are requested per target as orders
        // close.
        service
            .send_orders(SendOrdersRequest::for_targets(target_ids))
            .await?;

        info!("Waiting for all targets to complete");
        latch.wait().await;
        info!("All targets completed");

        // Cooperative shutdown: closing the request channels ends the
        // streams, which ends the consumers.
        targets_channel.close();
        orders_channel.close();
        market_data_channel.close();
        let consumers = async {
            for task in [targets_task, orders_task, market_data_task] {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, consumers).await.is_err() {
            warn!("Consumer tasks did not stop within shutdown timeout");
        }

        scheduler.shutdown();
        let _ = scheduler_task.await;
        Ok(())
    }
}

/// Create the run's portfolio; an already-existing portfolio is fine, any
/// other rejection aborts startup.
async fn ensure_portfolio(service: &DynTradingService, name: &str) -> AppResult<()> {
    let result: RemoteResult<()> = service
        .create_market_portfolio(CreateMarketPortfolioRequest::pure(name))
        .await;
    match result {
        Ok(()) => {
            info!(portfolio = %name, "Portfolio created");
            Ok(())
        }
        Err(err) if err.error_code() == Some(error_codes::CANNOT_CREATE_PORTFOLIO) => {
            info!(portfolio = %name, "Portfolio already exists");
            Ok(())
        }
        Err(err) => {
            log_remote_failure("createMarketPortfolio", &err);
            Err(err.into())
        }
    }
}
