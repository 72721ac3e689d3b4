//! Microsoft Access driver implementation.
//!
//! Access files are read through ODBC with the Microsoft Access driver. The
//! native backing is optional: without the `odbc` feature the handler still
//! resolves from the factory but `connect` reports a connection error.

mod connection;

#[cfg(feature = "odbc")]
mod odbc;
#[cfg(not(feature = "odbc"))]
mod unavailable;

#[cfg(feature = "odbc")]
use odbc::Session;
#[cfg(not(feature = "odbc"))]
use unavailable::Session;

pub use connection::AccessHandler;
