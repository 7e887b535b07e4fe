//! Heatnet Console
//!
//! Operator console and tenant portal for a district-heating network.
//!
//! This library provides:
//! - Server-rendered pages for sites, meters, gateways, operations and reports
//! - A metering API client that falls back to labelled demo data
//! - Expiring operator and tenant sessions
//! - Live M-Bus reader sessions and a gateway status monitor
//! - Server-Sent Events for real-time updates

pub mod api;
pub mod auth;
pub mod bus;
pub mod charts;
pub mod config;
pub mod demo;
pub mod model;
pub mod pollers;
pub mod records;
pub mod routes;
pub mod ui;
pub mod upstream;
