use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::Config, liveness::WorkerHealth};

// The worker reports once per fetch, so the staleness deadline needs a
// comfortable margin over the fetch deadline.
const WORKER_LIVENESS_DEADLINE: Duration = Duration::from_secs(60);

pub struct AppContext {
    pub pool: PgPool,
    pub worker_liveness: WorkerHealth,
}

impl AppContext {
    pub async fn new(config: &Config) -> Result<Self, sqlx::Error> {
        let options = PgPoolOptions::new().max_connections(config.max_pg_connections);
        let pool = options.connect(&config.database_url).await?;

        Ok(Self {
            pool,
            worker_liveness: WorkerHealth::new(WORKER_LIVENESS_DEADLINE),
        })
    }
}
