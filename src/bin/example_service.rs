//! Example trade service.
//!
//! ```text
//! cargo run --bin restwrap-example -- --port 5000
//! curl 'http://localhost:5000/GetTrade?TradeDate=2021-01-01'
//! curl 'http://localhost:5000/Instrument?Symbol=KRX'
//! curl -d '{"face_value":"100","symbol":"SBER"}' http://localhost:5000/Instrument
//! ```

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use restwrap::logging::init_logging;
use restwrap::{rest_api, RestProvider, ServiceConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Serve the example trade API over HTTP.
#[derive(Parser, Debug)]
#[command(name = "restwrap-example", version, about, long_about = None)]
struct Args {
    /// Listen port (overrides config and RESTWRAP_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen address (overrides config and RESTWRAP_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "RESTWRAP_CONFIG")]
    config: Option<PathBuf>,

    /// Path prefix for every route
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub face_value: Decimal,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub volume: Decimal,
    pub qty: f32,
    pub trade_id: String,
    pub trade_type: i32,
    pub trade_date: NaiveDateTime,
    pub is_otc: bool,
    pub instrument: Instrument,
    pub sides: Vec<Counterparty>,
    pub sides_by_id: HashMap<i32, Counterparty>,
    pub books: Vec<HashMap<String, Counterparty>>,
}

fn counterparty(name: &str) -> Counterparty {
    Counterparty {
        name: name.to_string(),
    }
}

pub struct TradeService;

#[rest_api]
impl TradeService {
    #[rest(name = "GetTrade")]
    pub fn get_trade(&self, #[rest(name = "TradeDate")] trade_date: NaiveDateTime) -> Trade {
        Trade {
            volume: Decimal::new(66666, 1),
            qty: 11.1,
            trade_id: ulid::Ulid::new().to_string(),
            trade_type: 1,
            trade_date,
            is_otc: true,
            instrument: Instrument {
                face_value: Decimal::new(1000, 0),
                symbol: "KRX".to_string(),
            },
            sides: vec![counterparty("ABD"), counterparty("CBOM")],
            sides_by_id: HashMap::from([(1, counterparty("VTBC")), (2, counterparty("SBERP"))]),
            books: vec![
                HashMap::from([
                    ("1".to_string(), counterparty("GAZP")),
                    ("2".to_string(), counterparty("GAZR")),
                ]),
                HashMap::from([
                    ("3".to_string(), counterparty("SGNX")),
                    ("4".to_string(), counterparty("SGNP")),
                ]),
            ],
        }
    }

    #[rest(name = "Instrument")]
    pub fn instrument_by_symbol(&self, #[rest(name = "Symbol")] symbol: String) -> Instrument {
        Instrument {
            face_value: Decimal::new(1000, 0),
            symbol,
        }
    }

    #[rest(name = "Instrument")]
    pub fn instrument_echo(&self, instrument: Instrument) -> Instrument {
        instrument
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    init_logging(&config.log)?;

    let provider = RestProvider::with_config(config);
    let report = provider
        .register_api(Arc::new(TradeService), &args.prefix)
        .context("failed to register TradeService")?;
    for route in &report.routes {
        info!(route = %route, "exposed");
    }

    let addr = provider.start().context("failed to start HTTP server")?;
    info!(%addr, "listening; try /GetTrade?TradeDate=2021-01-01");

    wait_for_shutdown()?;
    provider.stop();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "shutting down");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> anyhow::Result<()> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}
