use greeter::model::{AverageMeasurement, NewMeasurement};
use std::time::{Duration, Instant};
use tokio::time::sleep;

fn base_url() -> String {
    std::env::var("GREETER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn random_measurement() -> NewMeasurement {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    NewMeasurement {
        temperature: rng.gen_range(15.0..35.0),
        humidity: rng.gen_range(30.0..80.0),
        moisture: rng.gen_range(10.0..60.0),
    }
}

#[tokio::test]
#[ignore]
async fn test_100_posts_per_second() {
    println!("\nStarting load test: 100 posts/s against {}", base_url());

    let test_duration_secs = 10;
    let target_rate = 100;
    let total_posts = test_duration_secs * target_rate;

    let client = reqwest::Client::new();
    let url = format!("{}/measurements", base_url());

    let start = Instant::now();
    let mut sent_count = 0;
    let mut error_count = 0;

    let burst_size = 10;
    let delay_per_burst = Duration::from_micros((burst_size * 1_000_000) / target_rate as u64);

    for batch_start in (0..total_posts).step_by(burst_size as usize) {
        for _ in batch_start..std::cmp::min(batch_start + burst_size as usize, total_posts) {
            match client.post(&url).json(&random_measurement()).send().await {
                Ok(response) if response.status().is_success() => sent_count += 1,
                Ok(response) => {
                    error_count += 1;
                    if error_count < 10 {
                        eprintln!("Unexpected status: {}", response.status());
                    }
                }
                Err(e) => {
                    error_count += 1;
                    if error_count < 10 {
                        eprintln!("Send error: {}", e);
                    }
                }
            }
        }

        sleep(delay_per_burst).await;
    }

    let duration = start.elapsed();
    let actual_rate = sent_count as f64 / duration.as_secs_f64();

    println!("  Total Sent:  {}", sent_count);
    println!("  Errors:      {}", error_count);
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!("  Actual Rate: {:.2} posts/s", actual_rate);

    assert!(
        actual_rate >= 90.0,
        "Throughput too low: {:.2} posts/s (expected >= 90)",
        actual_rate
    );
    assert_eq!(error_count, 0, "Too many errors: {}", error_count);

    let avg = client
        .get(format!("{}/measurements/average", base_url()))
        .send()
        .await
        .unwrap()
        .json::<AverageMeasurement>()
        .await
        .unwrap();
    assert_eq!(avg.count, 50);
}
