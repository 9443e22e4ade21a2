//! Server startup and binding

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::calculator::OverpaymentCalculator;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::rates::{CentralBankClient, FixedRateProvider, RateProvider};
use crate::routes::{self, SharedCalculator};

/// Wire the configured rate provider into a calculator.
///
/// Builds a blocking http client when the rate service is online, so call it
/// outside the async runtime.
pub fn build_calculator(config: &AppConfig) -> Result<SharedCalculator> {
    let provider: Box<dyn RateProvider> = if config.rate_service.offline {
        tracing::info!(default_rate = %config.rate_service.default_rate(), "rate service offline");
        Box::new(FixedRateProvider::unavailable(config.rate_service.default_rate()))
    } else {
        let client = CentralBankClient::from_config(&config.rate_service)?;
        tracing::info!(url = %client.url(), "using central bank rate service");
        Box::new(client)
    };

    let calculator = OverpaymentCalculator::with_settings(provider, config.calculator_settings())?;
    Ok(Arc::new(calculator))
}

pub struct Server {
    config: Arc<AppConfig>,
    router: Router,
}

impl Server {
    pub fn new(config: AppConfig, calculator: SharedCalculator) -> Self {
        let config = Arc::new(config);
        let router = routes::build_router(config.clone(), calculator);

        Self { config, router }
    }

    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        self.config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.socket_addr()?).await?;
        self.run_with_listener(listener).await
    }

    /// serve on an already bound listener, e.g. port 0 in tests
    pub async fn run_with_listener(self, listener: TcpListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, self.router).await
    }
}
