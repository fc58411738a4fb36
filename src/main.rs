use anyhow::{bail, Context, Result};
use catalog_seed::config::Config;
use catalog_seed::emit;
use catalog_seed::ids::SupabaseTables;
use catalog_seed::storage::SupabaseStorage;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "catalog-seed")]
#[command(about = "Upload a folder of audio files and generate catalog SQL INSERT statements")]
struct Args {
    /// Music folder to process (prompted for interactively when omitted)
    folder: Option<PathBuf>,

    /// Output SQL file, overwritten on each run
    #[arg(long, default_value = "insert_songs.sql")]
    output: PathBuf,
}

fn prompt_for_folder() -> Result<PathBuf> {
    print!("Enter the path to your music folder: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read folder path")?;
    Ok(PathBuf::from(line.trim()))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let cfg = Config::from_env()?;

    let folder = match args.folder {
        Some(folder) => folder,
        None => prompt_for_folder()?,
    };
    if !folder.exists() {
        bail!("Folder {} does not exist", folder.display());
    }

    let storage = SupabaseStorage::new(&cfg);
    let tables = SupabaseTables::new(&cfg);

    let start = Instant::now();
    let summary = emit::run(&folder, &args.output, &cfg, &storage, &tables)?;
    let elapsed = start.elapsed();

    println!("\n{:=<60}", "");
    println!("SQL generation complete!");
    println!("  Songs written: {}", summary.songs_written);
    println!("  Files skipped: {}", summary.files_skipped);
    println!("  Output: {}", args.output.display());
    println!("  Elapsed: {:.2}s", elapsed.as_secs_f64());
    println!("{:=<60}", "");
    println!("Review the singer name and placeholder artwork URL in the SQL before executing it.");

    Ok(())
}
