use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use application::usecases::analytics::{AnalyticsUseCase, CollectReport};
use infra::adapters::build_registry_from_env;
use infra::postgres::{
    postgres_connection,
    repositories::{
        analytics::AnalyticsPostgres, linked_accounts::LinkedAccountPostgres, posts::PostPostgres,
    },
};

/// Pulls fresh analytics for every linked account and every successful
/// share. Intended to run on a schedule (cron); per-item failures are
/// counted and logged but never fail the run.
#[derive(Debug, Parser)]
#[command(name = "collect-analytics")]
struct Args {
    /// Collect account-level analytics only
    #[arg(long, conflicts_with = "posts_only")]
    accounts_only: bool,

    /// Collect post-level analytics only
    #[arg(long, conflicts_with = "accounts_only")]
    posts_only: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // A partial collection is still useful, so the scheduler must not see
    // this run as failed. An aborted run still reports its (empty) counts.
    let report = match run(args).await {
        Ok(report) => report,
        Err(err) => {
            error!("Analytics collection aborted: {err:#}");
            CollectReport {
                errors: 1,
                ..CollectReport::default()
            }
        }
    };

    println!("{}", summary(&report));
}

fn summary(report: &CollectReport) -> String {
    format!(
        "Analytics collection finished at {}: {} account snapshots, {} post snapshots, {} errors",
        Utc::now().to_rfc3339(),
        report.account_snapshots,
        report.post_snapshots,
        report.errors
    )
}

async fn run(args: Args) -> Result<CollectReport> {
    dotenvy::dotenv().ok();
    observability::init_observability("worker")?;

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid");
    let postgres_pool = postgres_connection::establish_connection(&database_url)?;
    info!("Postgres connection has been established");

    let db_pool = Arc::new(postgres_pool);
    let registry = Arc::new(build_registry_from_env()?);

    let analytics_usecase = AnalyticsUseCase::new(
        registry,
        Arc::new(LinkedAccountPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PostPostgres::new(Arc::clone(&db_pool))),
        Arc::new(AnalyticsPostgres::new(Arc::clone(&db_pool))),
    );

    let report = analytics_usecase
        .collect(args.accounts_only, args.posts_only)
        .await;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_counts_for_a_completed_run() {
        let line = summary(&CollectReport {
            account_snapshots: 3,
            post_snapshots: 7,
            errors: 1,
        });
        assert!(line.contains("3 account snapshots"));
        assert!(line.contains("7 post snapshots"));
        assert!(line.contains("1 errors"));
    }

    #[test]
    fn summary_reports_zero_counts_for_an_aborted_run() {
        let line = summary(&CollectReport {
            errors: 1,
            ..CollectReport::default()
        });
        assert!(line.contains("0 account snapshots"));
        assert!(line.contains("0 post snapshots"));
        assert!(line.contains("1 errors"));
    }
}
