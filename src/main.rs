use swarm_tracker::servers::signals::global_shutdown_signal;
use swarm_tracker::{app, bootstrap};
use tracing::info;

#[tokio::main]
async fn main() {
    let (config, tracker, registry) = bootstrap::app::setup();

    let jobs = app::start(&config, tracker, &registry).await;

    // handle the signals
    tokio::select! {
        () = global_shutdown_signal() => {
            info!("Swarm tracker shutting down..");

            // Await for all jobs to shutdown
            futures::future::join_all(jobs).await;
            info!("Swarm tracker successfully shutdown.");
        }
    }
}
