// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use clap::Parser;
use clipstore::config::Config;
use clipstore::handler::BaseHandler;
use clipstore::observability::tracing_setup;
use clipstore::server::HttpConnectionManager;
use clipstore::storage::in_memory::InMemoryBlobStore;
use clipstore::storage::sas::{SharedKeyCredential, UrlSigner};
use clipstore::storage::BlobStore;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "clipstore")]
#[command(about = "Media blob store with signed-URL delivery and a video catalog", long_about = None)]
struct Args {
    /// Address to listen on (e.g., 0.0.0.0:8080, 127.0.0.1:8080)
    #[arg(short, long)]
    listen: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Storage connection string ("AccountName=..;AccountKey=..;..").
    /// Overrides STORAGE_CONNECTION_STRING and the config file.
    #[arg(long)]
    connection_string: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with format from environment
    tracing_setup::init_tracing_from_env();

    let args = Args::parse();

    let cfg = Config::load(&args.config)?;

    // Command line args override config file
    let addr: SocketAddr = args.listen.as_ref().unwrap_or(&cfg.listen_addr).parse()?;

    let Some(conn) = cfg.resolve_connection_string(args.connection_string.as_deref()) else {
        return Err("no storage connection string: pass --connection-string, \
                    set STORAGE_CONNECTION_STRING, or add it to the config file"
            .into());
    };
    let cred = SharedKeyCredential::from_connection_string(&conn)?;
    tracing::info!(account = %cred.account, "credentials loaded");
    let signer = Arc::new(UrlSigner::new(cred));

    let storage: Arc<dyn BlobStore> = match cfg.storage.backend.as_str() {
        "in-memory" => Arc::new(InMemoryBlobStore::new()),
        other => {
            tracing::warn!(backend = other, "unknown storage backend, using in-memory");
            Arc::new(InMemoryBlobStore::new())
        }
    };

    let handler = BaseHandler::new(
        storage,
        signer,
        cfg.video_container.clone(),
        cfg.thumbnail_container.clone(),
        chrono::Duration::seconds(cfg.sas_ttl_secs as i64),
    );

    let server = HttpConnectionManager::new(handler);
    tracing::info!("clipstore HTTP server listening on {}", addr);

    tokio::select! {
        r = server.serve(addr) => {
            if let Err(e) = r {
                tracing::error!("server exited with error: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("ctrl-c received, shutting down");
        }
    }

    Ok(())
}
