//! Legman turns heterogeneous log messages into structured records and moves
//! them through composable, back-pressured streams.
//!
//! Overview
//! - Every [`Legman`] node accepts raw messages (records, strings, blobs, errors,
//!   JSON) and produces normalized [`Record`]s carrying the node's default fields
//!   and a provenance timestamp.
//! - Nodes compose: [`Legman::influx`] creates a child feeding its parent with
//!   extra defaults, [`Legman::filter`] and [`Legman::map`] derive downstream
//!   nodes. Derived nodes are full nodes and compose further.
//! - Records are only consumed by someone: pipes, data listeners or readers.
//!   A node nobody reads from holds what it was given.
//!
//! Key behaviors and trade-offs
//! - Back-pressure: `write` returns `false` once a node's backlog reaches the
//!   high-water mark. Piped sources pause until the destination drains. With
//!   [`InfluxMode::Unbounded`] an influx node ignores this and never stalls.
//! - Ending: [`Legman::end`] severs outgoing pipes first, so ending an influx
//!   node leaves its parent open. [`Legman::end_with`] writes a final message
//!   and closes only after it has been processed.
//! - Failures: a failing transform step stops that node only. Writes then fail
//!   and readers observe the error; sibling nodes keep running.
//!
//! Examples
//! ```rust,ignore
//! use legman::{Legman, Message, fields};
//!
//! let root = Legman::with_defaults(fields! { "app" => "api" });
//! let errors = root.filter(|r| r.get_str("loglevel") == Some("error"));
//!
//! let requests = root.influx(fields! { "component" => "http" });
//! requests.write("listening on :8080")?;
//! requests.write(Message::error(&std::io::Error::other("socket closed")))?;
//!
//! while let Some(record) = errors.recv().await? {
//!     println!("{record:?}");
//! }
//! ```
//!
//! Logging
//! - Node lifecycle and back-pressure are traced at `debug`/`trace` level.
//! - Failures nobody listens for are logged at `error` level (see
//!   `LegmanConfig::log_unhandled_errors`); pipe edges dropped because the
//!   destination failed are logged at `warn` level.
#![warn(missing_docs)]

mod builder;
mod compose;
mod listener;
mod node;
mod reader;
mod shutdown;

pub use builder::LegmanBuilder;
pub use listener::ListenerId;
pub use node::Legman;

pub use legman_core::*;
