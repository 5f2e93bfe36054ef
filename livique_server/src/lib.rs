//! # Livique order server
//!
//! This crate exposes the Livique order workflow over HTTP. It is responsible for:
//! * Identifying callers from a bearer JWT and enforcing role-based access on every `/api` route.
//! * Turning request bodies into checkout drafts and handing them to the order engine.
//! * Mapping engine errors to HTTP status codes and JSON error bodies.
//! * Wiring the notification dispatcher into the engine's event hooks at startup.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payment/webhook`: Asynchronous payment gateway notifications. These are verified and logged only.
//! * `/otp/request`, `/otp/verify`: Email one-time codes.
//! * `/api/...`: Checkout, payment verification, order queries, tracking, stock, carts and push registrations. All of
//!   these need an `Authorization: Bearer <jwt>` header.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
