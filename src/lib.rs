//! # Wasabi Check
//!
//! Inventory lookup and stock adjustment for a single retail store's
//! catalog. Staff find a product by scanning its barcode, typing part of
//! its number or name, or photographing its label, then adjust store stock
//! one unit at a time. The catalog is replaced wholesale from an `.xlsx`
//! workbook.
//!
//! Matching, import reconciliation and variant ordering live in
//! [`wasabi_check_core`]; this crate adds SQLite storage, the workbook
//! reader, the OCR client, the HTTP server and the `wck` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ .xlsx upload │──▶│ wasabi-check-core│──▶│  SQLite   │
//! │ label photo  │   │ match / import   │   │ products  │
//! └──────────────┘   └────────┬─────────┘   │ variants  │
//!                             │             └──────────┘
//!                  ┌──────────┴──────────┐
//!                  ▼                     ▼
//!             ┌──────────┐         ┌──────────┐
//!             │   CLI    │         │   HTTP   │
//!             │  (wck)   │         │  (axum)  │
//!             └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `Store` backend |
//! | [`spreadsheet`] | `.xlsx` workbook reader |
//! | [`ocr`] | OCR providers |
//! | [`keepalive`] | Periodic database ping |
//! | [`server`] | HTTP API |
//! | [`lookup`], [`show`], [`adjust`], [`import_cmd`], [`stats`] | CLI commands |

pub mod adjust;
pub mod config;
pub mod db;
pub mod import_cmd;
pub mod keepalive;
pub mod lookup;
pub mod migrate;
pub mod ocr;
pub mod server;
pub mod show;
pub mod spreadsheet;
pub mod sqlite_store;
pub mod stats;
