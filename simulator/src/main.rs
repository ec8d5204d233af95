mod measurement;

use anyhow::Context;
use clap::Parser;
use measurement::{Average, Measurement, Recorded};
use std::time::Duration;
use tracing::{info, warn};

/// Posts random sensor measurements to a running greeter.
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
struct Args {
    /// Base URL of the greeter service
    #[arg(long, env = "GREETER_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Measurements posted per second
    #[arg(long, env = "RATE", default_value_t = 1)]
    rate: u64,

    /// Stop after this many posts (0 runs until interrupted)
    #[arg(long, env = "COUNT", default_value_t = 0)]
    count: u64,

    /// Fetch and log the windowed average every N successful posts
    #[arg(long, env = "REPORT_EVERY", default_value_t = 10)]
    report_every: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting sensor simulator");
    info!(
        "Target: {}, Rate: {} posts/s, Count: {}",
        args.url,
        args.rate,
        if args.count == 0 { "unbounded".to_string() } else { args.count.to_string() }
    );

    let client = reqwest::Client::new();
    let mut rng = rand::thread_rng();
    let mut ticker = tokio::time::interval(tick_period(args.rate));
    let mut posted = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let measurement = measurement::generate(&mut rng);
                match post_measurement(&client, &args.url, &measurement).await {
                    Ok(id) => {
                        posted += 1;
                        info!(
                            "Posted measurement {}: temperature={:.2}, humidity={:.2}, moisture={:.2}",
                            id, measurement.temperature, measurement.humidity, measurement.moisture
                        );
                    }
                    Err(e) => {
                        warn!("Failed to post measurement: {:#}", e);
                        continue;
                    }
                }

                if args.report_every > 0 && posted % args.report_every == 0 {
                    match average(&client, &args.url).await {
                        Ok(avg) => info!(
                            "Average over last {}: temperature={:.2}, humidity={:.2}, moisture={:.2}",
                            avg.count, avg.avg_temperature, avg.avg_humidity, avg.avg_moisture
                        ),
                        Err(e) => warn!("Failed to fetch average: {:#}", e),
                    }
                }

                if args.count > 0 && posted >= args.count {
                    info!("Posted {} measurements, done", posted);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal after {} posts", posted);
                break;
            }
        }
    }
}

/// Time between posts; never zero, which `tokio::time::interval` rejects.
fn tick_period(rate: u64) -> Duration {
    Duration::from_secs_f64(1.0 / rate.max(1) as f64).max(Duration::from_micros(1))
}

async fn post_measurement(
    client: &reqwest::Client,
    base_url: &str,
    measurement: &Measurement,
) -> anyhow::Result<i64> {
    let recorded = client
        .post(format!("{}/measurements", base_url))
        .json(measurement)
        .send()
        .await
        .context("request failed")?
        .error_for_status()?
        .json::<Recorded>()
        .await
        .context("unexpected response body")?;

    Ok(recorded.id)
}

async fn average(client: &reqwest::Client, base_url: &str) -> anyhow::Result<Average> {
    Ok(client
        .get(format!("{}/measurements/average", base_url))
        .send()
        .await?
        .error_for_status()?
        .json::<Average>()
        .await?)
}
