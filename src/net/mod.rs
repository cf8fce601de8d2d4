//! Network layer subsystem.
//!
//! Plain TCP listeners are bound directly with Tokio; when the listener
//! configuration carries a certificate and key, tls.rs builds the rustls
//! acceptor config handed to axum-server.

pub mod tls;
