use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use teloxide::Bot;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    antiplagiat::{CheckApi, RemoteCheckClient},
    config::AppConfig,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    messaging::Messenger,
    tasks::{DispatchLoop, WorkerPool},
    telegram::{TelegramMessenger, TelegramService},
};

const INBOX_CAPACITY: usize = 256;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RelayApp {
    _paths: ResolvedPaths,
    dispatch_handle: JoinHandle<()>,
    telegram: TelegramService,
    pool: WorkerPool,
    shutdown: Shutdown,
}

impl RelayApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(format!("antiplagiat-relay-bot/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.antiplagiat.request_timeout)
            .build()?;

        let api: Arc<dyn CheckApi> = Arc::new(RemoteCheckClient::new(
            http_client,
            config.antiplagiat.endpoint.clone(),
        ));

        let bot = Bot::new(&config.telegram_bot_token);
        let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
        let credentials = Arc::new(config.antiplagiat.credentials.clone());

        let pool = WorkerPool::new(config.polling.max_active_checks, shutdown.clone());
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let telegram = TelegramService::new(bot, inbox_tx);

        let dispatch = DispatchLoop::new(
            api,
            messenger,
            credentials,
            pool.clone(),
            config.polling.policy(),
        );
        let dispatch_handle = dispatch.spawn(inbox_rx, shutdown.subscribe());

        tracing::info!(
            endpoint = config.antiplagiat.endpoint.host_str().unwrap_or("-"),
            max_attempts = config.polling.max_attempts,
            interval_secs = config.polling.interval.as_secs(),
            max_active_checks = pool.capacity(),
            "relay initialized"
        );

        Ok(Self {
            _paths: paths,
            dispatch_handle,
            telegram,
            pool,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let RelayApp {
            _paths: _,
            mut dispatch_handle,
            telegram,
            pool,
            shutdown,
        } = self;

        tracing::info!("antiplagiat relay bot started");

        let shutdown_listener = shutdown.subscribe();
        let mut telegram_future = Box::pin(telegram.run(shutdown.subscribe()));
        let mut telegram_completed = false;

        tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!("shutdown signal received (Ctrl+C / SIGTERM)");
            }
            res = &mut telegram_future => {
                telegram_completed = true;
                if let Err(err) = res {
                    tracing::error!(?err, "Telegram service stopped with an error");
                } else {
                    tracing::info!("Telegram service stopped");
                }
            }
        }

        shutdown.trigger();

        if !telegram_completed {
            let wait = tokio::time::sleep(SHUTDOWN_TIMEOUT);
            tokio::pin!(wait);
            tokio::select! {
                res = &mut telegram_future => {
                    if let Err(err) = res {
                        tracing::error!(?err, "Telegram service stopped with an error");
                    }
                }
                _ = &mut wait => {
                    tracing::warn!(
                        target: "telegram",
                        "Telegram dispatcher did not stop within {:?}; forcing exit",
                        SHUTDOWN_TIMEOUT
                    );
                }
            }
        }

        let dispatch_sleep = tokio::time::sleep(SHUTDOWN_TIMEOUT);
        tokio::pin!(dispatch_sleep);
        tokio::select! {
            res = &mut dispatch_handle => {
                if let Err(err) = res {
                    if err.is_panic() {
                        tracing::error!(target: "dispatch", "dispatch loop panicked");
                    }
                }
            }
            _ = &mut dispatch_sleep => {
                tracing::warn!(
                    target: "dispatch",
                    "dispatch loop did not stop within {:?}; aborting",
                    SHUTDOWN_TIMEOUT
                );
                dispatch_handle.abort();
            }
        }

        let active = pool.active();
        if !pool.close_and_wait(SHUTDOWN_TIMEOUT).await {
            tracing::warn!(
                target: "worker",
                active,
                "poll workers did not finish within {:?}",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("antiplagiat relay bot stopped");
        Ok(())
    }
}
