use sea_orm_migration::prelude::*;

use rastro_tracking_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
