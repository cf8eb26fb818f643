//! Boom gate link daemon.
//!
//! Reads `config.txt` from the working directory, then keeps a TCP link to
//! the gate controller open forever, opening the boom either on validated
//! scans or on a polled database signal.

mod logging;

use anyhow::Context;
use boomlink_core::constants::{CONFIG_PATH, LOG_PATH};
use boomlink_core::{ClientConfig, TriggerMode, VERSION};
use boomlink_network::{ConnectionManager, LinkConfig, ScanTrigger, SignalTrigger};
use boomlink_storage::{Datastore, SqlCodeRepository, SqlSignalRepository};
use std::path::Path;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init(Path::new(LOG_PATH));

    let config = ClientConfig::load(CONFIG_PATH)
        .inspect_err(|e| error!("Error reading {}: {}", CONFIG_PATH, e))
        .with_context(|| format!("cannot start without a usable {CONFIG_PATH}"))?;

    info!(
        version = VERSION,
        mode = %config.trigger_mode,
        "Starting boomlink, device at {}",
        config.target()
    );

    let datastore = Datastore::new(config.db_connection.clone())
        .connect_timeout(config.connect_timeout)
        .query_timeout(config.query_timeout);
    if let Err(e) = datastore.validate() {
        // Not fatal: every lookup fails closed until the file is fixed
        warn!("Database connection string is unusable: {}", e);
    }

    let link = LinkConfig::from(&config);
    match config.trigger_mode {
        TriggerMode::Scan => {
            let trigger = ScanTrigger::new(SqlCodeRepository::new(datastore));
            ConnectionManager::new(link, trigger).run().await;
        }
        TriggerMode::Signal => {
            let trigger = SignalTrigger::new(SqlSignalRepository::new(datastore))
                .interval(config.signal_poll_interval);
            ConnectionManager::new(link, trigger).run().await;
        }
    }

    Ok(())
}
