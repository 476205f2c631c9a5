mod config;
mod handlers;
mod output;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filedrop_core::StorageCore;
use std::fs::File;
use std::io::{self, BufReader};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::{DEFAULT_MAX_UPLOAD_BYTES, ServerConfig};
use output::{OutputWriter, PutOutput, ResolveOutput};
use server::AppState;

/// filedrop - upload a file, share it by name
#[derive(Parser)]
#[command(name = "filedrop")]
#[command(about = "Upload-and-share file drop with a path-confined store", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage root directory
    #[arg(short, long, global = true, env = "DATA_PATH")]
    root: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "FILEDROP_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Shared upload password (uploads are refused when unset)
        #[arg(long, env = "PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Upload body limit in bytes (0 to disable)
        #[arg(long, env = "FILEDROP_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
    },

    /// Store a local file, or stdin with `-`
    Put {
        /// File to store
        path: PathBuf,

        /// Original name to store under (required for stdin)
        #[arg(long)]
        name: Option<String>,
    },

    /// Resolve a storage name to its path and content type
    Resolve {
        /// Storage name
        name: String,
    },

    /// Output stored file content to stdout
    Cat {
        /// Storage name
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Stay quiet outside of `serve` unless RUST_LOG says otherwise
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_logging(default_level);

    let output = OutputWriter::new(cli.json);
    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.write_error(&e, 1);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{krate}={level},filedrop_core={level},tower_http={level}",
                    krate = env!("CARGO_CRATE_NAME"),
                    level = default_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli, output: &OutputWriter) -> Result<()> {
    let root = cli
        .root
        .context("Storage root not configured (use --root or DATA_PATH)")?;
    let store = StorageCore::open(&root)
        .with_context(|| format!("Failed to open storage root at {}", root.display()))?;

    match cli.command {
        Commands::Serve {
            bind,
            password,
            max_upload_bytes,
        } => cmd_serve(
            store,
            ServerConfig {
                bind,
                password,
                max_upload_bytes,
            },
        ),
        Commands::Put { path, name } => cmd_put(&store, &path, name, output),
        Commands::Resolve { name } => cmd_resolve(&store, &name, output),
        Commands::Cat { name } => cmd_cat(&store, &name),
    }
}

fn cmd_serve(store: StorageCore, config: ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(server::run_server(AppState::new(store, config)))
}

fn cmd_put(
    store: &StorageCore,
    path: &Path,
    name: Option<String>,
    output: &OutputWriter,
) -> Result<()> {
    let stored = if path == Path::new("-") {
        if atty::is(atty::Stream::Stdin) {
            anyhow::bail!("Refusing to read from a terminal; pipe data into stdin");
        }
        let original = name.context("--name is required when reading from stdin")?;
        store.store_reader(&original, io::stdin().lock())
    } else {
        let original = name
            .or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        store.store_reader(&original, BufReader::new(file))
    }
    .with_context(|| format!("Failed to store {}", path.display()))?;

    let put = PutOutput::from(stored);
    output.write(&put, || format!("{}\n", put.name))
}

fn cmd_resolve(store: &StorageCore, name: &str, output: &OutputWriter) -> Result<()> {
    let resolved = store
        .retrieve(name)
        .with_context(|| format!("Failed to resolve {}", name))?;

    let resolve = ResolveOutput::new(name, resolved);
    output.write(&resolve, || {
        format!(
            "Name: {}\nPath: {}\nType: {}\nSize: {} bytes\n",
            resolve.name, resolve.path, resolve.content_type, resolve.size
        )
    })
}

fn cmd_cat(store: &StorageCore, name: &str) -> Result<()> {
    let resolved = store
        .retrieve(name)
        .with_context(|| format!("Failed to resolve {}", name))?;

    let mut file = File::open(&resolved.path)
        .with_context(|| format!("Failed to open {}", resolved.path.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    io::copy(&mut file, &mut handle).with_context(|| format!("Failed to output {}", name))?;

    Ok(())
}
