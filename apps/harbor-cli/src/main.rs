//! `harbor` command-line client.

mod config;
mod progress;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use harbor_client::validation::split_path;
use harbor_client::{Client, DirPage, TransferReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "harbor", version, about = "Object storage client for Harbor")]
struct Cli {
    /// Configuration file (defaults to ~/.config/harbor/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List buckets.
    Buckets,
    /// List a directory.
    Ls(LsArgs),
    /// Create a directory path, including missing parents.
    Mkdir(PathArgs),
    /// Delete a directory.
    Rmdir(PathArgs),
    /// Upload a file.
    Put(TransferArgs),
    /// Download an object.
    Get(TransferArgs),
    /// Delete an object.
    Rm(ObjectArgs),
    /// Share an object publicly, or make it private.
    Share(ShareArgs),
    /// Move or rename an object.
    Mv(MoveArgs),
    /// Show object or directory metadata.
    Stat(ObjectArgs),
}

#[derive(Parser, Debug)]
struct LsArgs {
    bucket: String,
    #[arg(default_value = "")]
    dir: String,
    #[arg(long)]
    per_page: Option<u32>,
    /// Follow `next` links until the listing is exhausted.
    #[arg(long)]
    all: bool,
}

#[derive(Parser, Debug)]
struct PathArgs {
    bucket: String,
    path: String,
}

#[derive(Parser, Debug)]
struct ObjectArgs {
    bucket: String,
    /// Full object path inside the bucket.
    object: String,
}

#[derive(Parser, Debug)]
struct TransferArgs {
    bucket: String,
    /// Full object path inside the bucket.
    object: String,
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Byte offset to resume from.
    #[arg(long, default_value_t = 0)]
    offset: u64,
    /// Create missing directories of the object path first (put only).
    #[arg(long)]
    parents: bool,
}

#[derive(Parser, Debug)]
struct ShareArgs {
    bucket: String,
    object: String,
    #[arg(long)]
    private: bool,
    /// Sharing period in days; 0 shares forever.
    #[arg(long, default_value_t = 0)]
    days: i64,
}

#[derive(Parser, Debug)]
struct MoveArgs {
    bucket: String,
    object: String,
    /// Destination directory.
    to: String,
    #[arg(long)]
    rename: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref())?;
    tracing::debug!(
        domain = %config.domain_name,
        version = %config.version,
        "configuration ready"
    );
    let client = Client::new(&config)?;

    match cli.command {
        Commands::Buckets => handle_buckets(&client).await,
        Commands::Ls(args) => handle_ls(&client, args).await,
        Commands::Mkdir(args) => handle_mkdir(&client, args).await,
        Commands::Rmdir(args) => handle_rmdir(&client, args).await,
        Commands::Put(args) => handle_put(&client, args).await,
        Commands::Get(args) => handle_get(&client, args).await,
        Commands::Rm(args) => handle_rm(&client, args).await,
        Commands::Share(args) => handle_share(&client, args).await,
        Commands::Mv(args) => handle_mv(&client, args).await,
        Commands::Stat(args) => handle_stat(&client, args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn handle_buckets(client: &Client) -> Result<()> {
    for bucket in client.list_buckets().await? {
        println!("{}\t{}", bucket.id, bucket.name);
    }
    Ok(())
}

async fn handle_ls(client: &Client, args: LsArgs) -> Result<()> {
    let mut page = client
        .list_dir(&args.bucket, &args.dir, args.per_page)
        .await
        .with_context(|| format!("listing {}/{}", args.bucket, args.dir))?;

    loop {
        print_page(&page);
        if !args.all {
            if page.has_next() {
                println!(
                    "({} entries, page {} of {})",
                    page.count, page.page.current, page.page.last
                );
            }
            return Ok(());
        }
        match page.next_page(client.api()).await? {
            Some(next) => page = next,
            None => return Ok(()),
        }
    }
}

fn print_page(page: &DirPage) {
    for entry in &page.files {
        if entry.is_dir() {
            println!("{}/", entry.name);
        } else {
            println!("{}", entry.name);
        }
    }
}

async fn handle_mkdir(client: &Client, args: PathArgs) -> Result<()> {
    client
        .api()
        .create_path(&args.bucket, &args.path, "")
        .await
        .with_context(|| format!("creating {}/{}", args.bucket, args.path))?;
    println!("created {}/{}", args.bucket, args.path.trim_matches('/'));
    Ok(())
}

async fn handle_rmdir(client: &Client, args: PathArgs) -> Result<()> {
    client.delete_dir(&args.bucket, &args.path).await?;
    println!("deleted {}/{}", args.bucket, args.path.trim_matches('/'));
    Ok(())
}

async fn handle_put(client: &Client, args: TransferArgs) -> Result<()> {
    let (dir, name) = split_path(&args.object);
    if args.parents && !dir.is_empty() {
        client.api().create_path(&args.bucket, dir, "").await?;
    }

    let report = client
        .bucket(&args.bucket)
        .dir(dir)
        .put_object_with_progress(
            name,
            &args.file,
            args.offset,
            Some(progress::observer()),
        )
        .await?;
    finish(report)
}

async fn handle_get(client: &Client, args: TransferArgs) -> Result<()> {
    let (dir, name) = split_path(&args.object);
    let report = client
        .bucket(&args.bucket)
        .dir(dir)
        .download_object_with_progress(
            name,
            &args.file,
            args.offset,
            Some(progress::observer()),
        )
        .await?;
    finish(report)
}

async fn handle_rm(client: &Client, args: ObjectArgs) -> Result<()> {
    client.delete_object(&args.bucket, &args.object).await?;
    println!("deleted {}/{}", args.bucket, args.object);
    Ok(())
}

async fn handle_share(client: &Client, args: ShareArgs) -> Result<()> {
    let message = client
        .share_object(&args.bucket, &args.object, !args.private, args.days)
        .await?;
    println!("{message}");
    Ok(())
}

async fn handle_mv(client: &Client, args: MoveArgs) -> Result<()> {
    let result = client
        .move_object(&args.bucket, &args.object, &args.to, args.rename.as_deref())
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn handle_stat(client: &Client, args: ObjectArgs) -> Result<()> {
    let meta = client.api().metadata(&args.bucket, &args.object).await?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

/// Prints the report; a failed transfer becomes a non-zero exit.
fn finish(report: TransferReport) -> Result<()> {
    progress::clear_line();
    if report.success {
        println!("{} (offset {})", report.message, report.offset);
        Ok(())
    } else {
        bail!(
            "{} (resume with --offset {})",
            report.message,
            report.offset
        )
    }
}
