pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    application_service::ApplicationService, interview_service::InterviewService,
    matching_service::MatchingService, round_service::RoundService, sweep_service::SweepService,
};
use crate::utils::time::{Clock, SystemClock};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub clock: Arc<dyn Clock>,
    pub application_service: ApplicationService,
    pub round_service: RoundService,
    pub interview_service: InterviewService,
    pub matching_service: MatchingService,
    pub sweep_service: SweepService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        let application_service = ApplicationService::new(pool.clone(), clock.clone());
        let round_service = RoundService::new(pool.clone(), clock.clone());
        let interview_service = InterviewService::new(pool.clone(), clock.clone());
        let matching_service =
            MatchingService::new(config.matching_service_url.clone(), http_client);
        let sweep_service = SweepService::new(pool.clone(), clock.clone());

        Self {
            pool,
            clock,
            application_service,
            round_service,
            interview_service,
            matching_service,
            sweep_service,
        }
    }

    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
