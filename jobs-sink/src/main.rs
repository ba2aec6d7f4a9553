use axum::{routing::get, Router};
use common_kafka::kafka_consumer::SingleTopicConsumer;
use futures::future::ready;
use jobs_sink::{
    app_context::AppContext,
    config::Config,
    liveness::WorkerHealth,
    pipeline::{self, PipelineSettings},
    repository::PgJobStore,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

fn setup_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder")
}

pub async fn index() -> &'static str {
    "jobs sink"
}

fn start_health_metrics_server(config: &Config, liveness: WorkerHealth) -> JoinHandle<()> {
    let recorder_handle = setup_metrics_recorder();
    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(move || ready(liveness.status())))
        .route("/metrics", get(move || ready(recorder_handle.render())));
    let bind = config.bind();
    tokio::task::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .expect("failed to bind health/metrics server");
        axum::serve(listener, router)
            .await
            .expect("failed to start serving metrics");
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_with_defaults()?;

    let consumer = SingleTopicConsumer::new(config.kafka.clone(), config.consumer.clone())?;

    let context = AppContext::new(&config).await?;

    info!(
        "Subscribed to topic: {}",
        config.consumer.kafka_consumer_topic
    );

    start_health_metrics_server(&config, context.worker_liveness.clone());

    let store = PgJobStore::new(context.pool.clone());
    let settings = PipelineSettings::from(&config);

    let result = pipeline::run(consumer, store, context.worker_liveness.clone(), settings).await;
    if let Err(e) = &result {
        error!("pipeline stopped: {e}");
    }
    result?;
    Ok(())
}
