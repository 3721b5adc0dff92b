use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::{FoodService, SweepReport};

/// Periodic eviction sweeps, either on a cron expression or a fixed interval.
pub struct Scheduler {
    service: Arc<dyn FoodService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(service: Arc<dyn FoodService>, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let service = Arc::clone(&self.service);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let service = Arc::clone(&service);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                sweep_job(service.as_ref()).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.sweep_interval_minutes.max(1);

        info!("Scheduler running: sweep every {}m", interval_mins);

        let mut sweep_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            sweep_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            sweep_job(self.service.as_ref()).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs one sweep immediately, outside the schedule.
    pub async fn run_once(&self) -> Result<SweepReport> {
        info!("Running manual sweep...");
        Ok(self.service.evict_stale(Utc::now()).await?)
    }
}

async fn sweep_job(service: &dyn FoodService) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "evict_stale", "Starting scheduled cache sweep");

    match service.evict_stale(Utc::now()).await {
        Ok(report) => info!(
            event = "job_finished",
            job_name = "evict_stale",
            removed = report.total(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scheduled cache sweep finished"
        ),
        Err(e) => {
            error!(event = "job_failed", job_name = "evict_stale", error = %e, "Scheduled cache sweep failed");
        }
    }
}
