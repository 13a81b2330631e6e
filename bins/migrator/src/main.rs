//! Database migration runner for the Stowage attachments schema.
//!
//! Usage:
//!   migrator up      - Create the attachments table if missing
//!   migrator down    - Drop the attachments table
//!   migrator status  - Show migration status
//!
//! The connection string is read from `DATABASE_URL` (a `.env` file is
//! honored).

use sea_orm_migration::prelude::*;
use stowage_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
}
