use anyhow::Result;

use crate::cli::flags::{Cli, Command};
use crate::config::load_config;
use crate::ondemand::OnDemandScanner;
use crate::sink::{DetectionSink, FileSink};
use crate::stream::StreamConsumer;

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Monitor { stats_interval } => run_monitor(config, stats_interval).await,
        Command::Scan { target, escalate } => run_scan(config, &target, escalate).await,
        Command::Permutations { target } => run_permutations(config, &target),
        Command::QuickCheck { fqdn } => run_quick_check(config, &fqdn),
        Command::Analyze { fqdn, target } => run_analyze(config, &fqdn, target.as_deref()).await,
    }
}

async fn run_monitor(config: crate::config::TargetConfig, stats_interval: u64) -> Result<()> {
    let consumer = StreamConsumer::new(config);
    let counters = consumer.counters();
    let queue = consumer.queue();
    let sink = FileSink::new("detections.csv", "detections.jsonl");

    let consumer_task = tokio::spawn(async move { consumer.run().await });

    let stats_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(stats_interval));
        loop {
            interval.tick().await;
            sink.on_stats(&counters.snapshot());
        }
    });

    let drain_sink = FileSink::new("detections.csv", "detections.jsonl");
    let drain_task = tokio::spawn(async move {
        loop {
            let detection = queue.recv().await;
            drain_sink.on_detection(&detection);
            println!("{}", detection.to_json_line().unwrap_or_default());
        }
    });

    let _ = tokio::join!(consumer_task, stats_task, drain_task);
    Ok(())
}

async fn run_scan(config: crate::config::TargetConfig, target: &str, escalate: usize) -> Result<()> {
    let scanner = OnDemandScanner::new(config);
    let summary = scanner.scan(target, escalate).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_permutations(config: crate::config::TargetConfig, target: &str) -> Result<()> {
    let scanner = OnDemandScanner::new(config);
    let detections = scanner.permutations(target);
    for detection in detections {
        println!("{}", detection.to_json_line()?);
    }
    Ok(())
}

fn run_quick_check(config: crate::config::TargetConfig, fqdn: &str) -> Result<()> {
    let scanner = OnDemandScanner::new(config);
    let result = scanner.quick_check(fqdn);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_analyze(
    config: crate::config::TargetConfig,
    fqdn: &str,
    target: Option<&str>,
) -> Result<()> {
    let scanner = OnDemandScanner::new(config);
    let result = scanner.analyze_single(fqdn, target).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
