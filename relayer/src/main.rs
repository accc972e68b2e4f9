//! Smart account relayer HTTP entrypoint.
//!
//! This binary bootstraps a [`SimpleAccountFactory`](aa_chain_eip155::factory::SimpleAccountFactory)
//! on an in-process chain and serves the relayer interface over HTTP.
//!
//! Endpoints:
//! - `GET /factory` – Factory address, versions and account implementation
//! - `POST /accounts` – Deploy the account for an owner and salt
//! - `GET /accounts/{owner}/address` – Counterfactual account address
//! - `GET /account/{address}` – Owner, version and balance of an account
//! - `POST /account/{address}/execute` – Submit a signed single call
//! - `POST /account/{address}/execute-batch` – Submit a signed batch
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON configuration file
//! - `HOST`, `PORT` control binding address
//! - `RUST_LOG` filters log output; `OTEL_*` variables enable export with the
//!   `telemetry` feature

mod config;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}
