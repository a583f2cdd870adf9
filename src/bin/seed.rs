//! Provisioning script for the web traffic document store.
//!
//! Usage:
//!   shoplens-seed --emit-script init-mongo.js
//!   shoplens-seed --uri mongodb://localhost:27018   (requires `--features mongo`)

use anyhow::{Context, Result};
use shoplens::cli::SeedArgs;
use shoplens::config::Config;
use shoplens::provision::ProvisionPlan;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse_args();

    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_seed_args(&args);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level(config.general.verbose))
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let plan = ProvisionPlan::from_config(&config.store);
    debug!("Provisioning plan has {} steps", plan.steps.len());

    if let Some(ref path) = args.emit_script {
        std::fs::write(path, plan.to_script())
            .with_context(|| format!("Failed to write script to {}", path.display()))?;
        println!("[done] Wrote provisioning script to {}", path.display());
        return Ok(());
    }

    info!("Provisioning {} ({} steps)", config.store.database, plan.steps.len());
    apply_plan(&config, &plan).await
}

#[cfg(feature = "mongo")]
async fn apply_plan(config: &Config, plan: &ProvisionPlan) -> Result<()> {
    use shoplens::provision::{apply, mongo::MongoStore, StepOutcome};

    let mut store = MongoStore::connect(&config.store.uri).await?;
    let outcomes = apply(&mut store, plan).await?;

    for (step, outcome) in &outcomes {
        match outcome {
            StepOutcome::Applied => println!("[done] {}", step),
            StepOutcome::AlreadyPresent => println!("[skip] {} (already present)", step),
        }
    }
    println!("\n=== Provisioning complete ===");
    Ok(())
}

#[cfg(not(feature = "mongo"))]
async fn apply_plan(_config: &Config, _plan: &ProvisionPlan) -> Result<()> {
    Err(shoplens::provision::ProvisionError::Unsupported(
        "built without the `mongo` feature; use --emit-script or rebuild with --features mongo"
            .to_string(),
    )
    .into())
}
