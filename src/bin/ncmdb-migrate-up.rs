//! Database migration tool for ncmdb.
//!
//! Migrations are embedded into the binary at compile time from the
//! `migrations/` directory.

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(required, "SQLite database URL")]
    database_url: String,
}

const USAGE: &str = r#"Usage: ncmdb-migrate-up --database-url <URL>

Run database migrations for ncmdb.

Arguments:
  --database-url <URL>    SQLite database URL; the file is created if missing

Example:
  ncmdb-migrate-up --database-url sqlite://ncmdb.db

The migrations are embedded at compile time from the migrations/ directory."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line(USAGE);

    if !free.is_empty() {
        eprintln!("Error: Unexpected arguments: {:?}", free);
        eprintln!();
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    println!("Connecting to database: {}", options.database_url);

    let pool = ncmdb::db::connect(&options.database_url, 1).await?;

    println!("Running migrations...");

    ncmdb::db::migrate(&pool).await?;
    pool.close().await;

    println!("Migrations completed successfully!");

    Ok(())
}
