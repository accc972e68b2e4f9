#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Local relayer for deterministic smart accounts.
//!
//! This crate provides [`RelayerLocal`], a [`Relayer`] implementation that owns an
//! in-process [`Chain`](aa_chain_eip155::chain::Chain) with a deployed account factory,
//! and submits owner-signed authorizations on behalf of account owners.
//!
//! # Modules
//!
//! - [`relayer`] - The [`Relayer`] trait
//! - [`relayer_local`] - [`RelayerLocal`], serializing access to the chain
//! - [`handlers`] - HTTP endpoints over any [`Relayer`]
//! - [`types`] - JSON request and response bodies
//! - [`util`] - Graceful shutdown and telemetry
//!
//! # Example
//!
//! ```ignore
//! use aa_chain_eip155::chain::{Chain, Eip155ChainReference};
//! use aa_chain_eip155::deployment::Deployment;
//! use aa_relayer_local::{RelayerLocal, handlers};
//! use std::sync::Arc;
//!
//! let mut chain = Chain::new(Eip155ChainReference::new(100009));
//! let deployment = Deployment::bootstrap(&mut chain, deployer)?;
//! let relayer = RelayerLocal::new(chain, deployment.factory, relayer_address);
//!
//! let app = axum::Router::new().merge(handlers::routes().with_state(Arc::new(relayer)));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod handlers;
pub mod relayer;
pub mod relayer_local;
pub mod types;
pub mod util;

pub use handlers::*;
pub use relayer::*;
pub use relayer_local::*;
