//! # CPG server
//! This module hosts the HTTP surface of the church payment gateway. It is responsible for:
//! Listening for incoming webhook requests from the payment gateway.
//! Exposing the donation, fund, withdrawal and beneficiary APIs over REST.
//! Authenticating API callers and enforcing the role-based access control lists.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following route groups:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/donate`: The donor-facing donation initiation route.
//! * `/gateway/webhook`: The webhook route for receiving charge outcome events, guarded by an HMAC check.
//! * `/api/...`: The authenticated management API.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

pub mod integrations;

#[cfg(test)]
mod endpoint_tests;
