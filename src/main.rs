use clap::Parser;
use fcfs_claims::utils::{logger, validation::Validate};
use fcfs_claims::{ClaimAllocator, CliConfig, MemoryClaimStore, ScenarioConfig};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting fcfs-claims scenario runner");

    let config = ScenarioConfig::from_file(&cli.scenario)?;
    if let Err(e) = config.validate() {
        tracing::error!("Scenario validation failed: {}", e);
        eprintln!("❌ {}", e.user_message());
        std::process::exit(2);
    }

    let allocator = Arc::new(ClaimAllocator::new(
        config.catalog()?,
        config.build_groups()?,
        MemoryClaimStore::new(),
    )?);

    if config.submissions.is_empty() {
        tracing::warn!("Scenario has no submissions, nothing to do");
        return Ok(());
    }

    // Release all submissions at once so contention is real, not an
    // artifact of spawn order.
    let barrier = Arc::new(Barrier::new(config.submissions.len()));
    let mut handles = Vec::with_capacity(config.submissions.len());
    for submission in config.submissions.clone() {
        let allocator = Arc::clone(&allocator);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let result = allocator
                .submit(
                    &submission.group,
                    &submission.faculty,
                    &submission.domain,
                    &submission.topic,
                )
                .await;
            (submission, result)
        }));
    }

    let mut fault = false;
    for handle in handles {
        let (submission, result) = handle.await?;
        match result {
            Ok(receipt) => println!(
                "✅ {} -> ({}, {}, {}) committed as #{} (queue position {})",
                submission.group,
                submission.faculty,
                submission.domain,
                submission.topic,
                receipt.sequence,
                receipt.queue_position
            ),
            Err(e) if !e.is_fault() => {
                println!("❌ {} rejected: {}", submission.group, e.user_message())
            }
            Err(e) => {
                tracing::error!("Submission for {} hit a fault: {}", submission.group, e);
                fault = true;
            }
        }
    }

    let queue = allocator.queue().list().await;
    println!("\nFinal queue ({} committed):", queue.len());
    println!("{}", serde_json::to_string_pretty(&queue)?);

    allocator.verify_recount().await?;
    tracing::info!("Ledger counters match a recount of committed claims");

    if fault {
        std::process::exit(1);
    }
    Ok(())
}
