#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dispatch API server binary.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    orbit_server::run_server()
        .await
        .map_err(|e| match e {
            orbit_server::ServerError::Io(io) => io,
            other => std::io::Error::other(other),
        })
}
