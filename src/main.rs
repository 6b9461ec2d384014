use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tablewatch::generator::SummaryGenerator;
use tablewatch::store::{DynamoStore, MemoryStore, Store};
use tablewatch::types::Granularity;
use tablewatch::view;
use tablewatch::web;

#[derive(Parser)]
#[command(name = "tablewatch", about = "Record-activity dashboard over DynamoDB summary tables")]
struct Cli {
    /// Run mode: demo, serve, or snapshot
    #[arg(long, default_value = "demo")]
    mode: String,

    /// Web server port (demo and serve modes)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// DynamoDB summary table (serve and snapshot modes)
    #[arg(long, default_value = "summary_table_dev")]
    table: String,

    /// AWS region for the summary table
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Most recent records fetched per entity (0 = full history)
    #[arg(long, default_value = "1440")]
    max_records: usize,

    /// Entity to render in snapshot mode (omit to list entities)
    #[arg(long)]
    entity: Option<String>,

    /// Aggregation window in snapshot mode
    #[arg(long, value_enum, default_value = "hourly")]
    granularity: Granularity,

    /// Anomaly spike rate in generated demo data (0.0-1.0)
    #[arg(long, default_value = "0.02")]
    anomaly_rate: f64,

    /// Days of demo history to generate
    #[arg(long, default_value = "3")]
    demo_days: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let max_records = if cli.max_records == 0 {
        None
    } else {
        Some(cli.max_records)
    };

    match cli.mode.as_str() {
        "demo" => {
            let store = Arc::new(Store::Memory(demo_store(cli.anomaly_rate, cli.demo_days)));
            web::run(cli.port, store, max_records).await?;
        }
        "serve" => {
            let dynamo = DynamoStore::connect(&cli.table, &cli.region).await;
            web::run(cli.port, Arc::new(Store::Dynamo(dynamo)), max_records).await?;
        }
        "snapshot" => {
            let store = Store::Dynamo(DynamoStore::connect(&cli.table, &cli.region).await);
            run_snapshot(&store, cli.entity.as_deref(), cli.granularity, max_records).await?;
        }
        other => eprintln!("Unknown mode: {other}. Use --mode demo|serve|snapshot"),
    }

    Ok(())
}

fn demo_store(anomaly_rate: f64, demo_days: u32) -> MemoryStore {
    let mut generator = SummaryGenerator::new(anomaly_rate);
    let end = chrono::Utc::now().naive_utc();
    let minutes = demo_days as usize * 24 * 60;
    MemoryStore::from_samples(generator.generate_history(end, minutes))
}

async fn run_snapshot(
    store: &Store,
    entity: Option<&str>,
    granularity: Granularity,
    max_records: Option<usize>,
) -> anyhow::Result<()> {
    let Some(entity) = entity else {
        let names = store.list_entities().await.context("listing entities")?;
        println!("=== tablewatch: entities ===");
        for name in names {
            println!("  {name}");
        }
        return Ok(());
    };

    let view = view::render(store, entity, granularity, max_records)
        .await
        .with_context(|| format!("rendering {entity}"))?;

    println!("=== {} ({}) ===", entity, granularity.label());
    println!(
        "  {:<20} {:>10} {:>10} {:>10} {:>8}",
        "Window", "Created", "Modified", "Deleted", "Alert"
    );
    let mut created_total = 0i64;
    let mut modified_total = 0i64;
    let mut deleted_total = 0i64;
    for row in &view.rows {
        created_total += row.created_records;
        modified_total += row.modified_records;
        deleted_total += row.deleted_records;
        println!(
            "  {:<20} {:>10} {:>10} {:>10} {:>8}",
            row.timestamp,
            row.created_records,
            row.modified_records,
            row.deleted_records,
            if row.anomaly_flag { "YES" } else { "" }
        );
    }
    println!();
    println!(
        "  {:<20} {:>10} {:>10} {:>10}",
        "Total", created_total, modified_total, deleted_total
    );

    Ok(())
}
