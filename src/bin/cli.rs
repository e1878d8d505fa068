//! BlockVault CLI
//!
//! Command-line interface for exercising and inspecting a store directory.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use blockvault::{Config, Engine, Storage};

/// BlockVault CLI
#[derive(Parser, Debug)]
#[command(name = "blockvault-cli")]
#[command(about = "CLI for the BlockVault block-packed storage engine")]
#[command(version)]
struct Args {
    /// Store directory
    #[arg(short, long, default_value = "./blockvault_data")]
    dir: PathBuf,

    /// Block capacity in MiB
    #[arg(short, long, default_value = "10")]
    block_mb: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a file and print its id
    Put {
        /// File to store
        file: PathBuf,

        /// Storage key; a random id is generated when omitted
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Read a stored payload
    Get {
        /// The id to read
        id: String,

        /// Write the payload to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print store statistics
    Stat,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = Config::builder()
        .base_dir(&args.dir)
        .block_size(args.block_mb * 1024 * 1024)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> blockvault::Result<()> {
    match command {
        Commands::Put { file, key } => {
            let mut data = Vec::new();
            File::open(&file)?.read_to_end(&mut data)?;

            let id = match key {
                Some(key) => {
                    let mut reader = io::Cursor::new(data);
                    engine.save(&key, &mut reader)?
                }
                None => engine.write(&data)?,
            };
            println!("{}", id);
        }

        Commands::Get { id, output } => {
            let data = engine.read(&id)?;
            match output {
                Some(path) => File::create(path)?.write_all(&data)?,
                None => io::stdout().write_all(&data)?,
            }
        }

        Commands::Stat => {
            let (block, cursor) = engine.allocator_position();
            println!("base dir:       {}", engine.base_dir().display());
            println!("block size:     {} bytes", engine.block_size());
            println!("indexed ids:    {}", engine.indexed_ids());
            println!("open handles:   {}", engine.open_handles());
            println!("write position: block {} cursor {}", block, cursor);
        }
    }

    Ok(())
}
