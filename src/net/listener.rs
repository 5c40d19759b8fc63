//! TCP listener setup.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Map failures into the exporter's bind error

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::error::ExporterError;

/// Bind a TCP listener to `address` (e.g. "0.0.0.0:9094").
pub async fn bind(address: &str) -> Result<TcpListener, ExporterError> {
    let bind_error = |source| ExporterError::Bind {
        address: address.to_string(),
        source,
    };

    let addr: SocketAddr = address
        .parse()
        .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn unparsable_address_is_bind_error() {
        let err = bind("localhost").await.unwrap_err();
        match err {
            ExporterError::Bind { address, source } => {
                assert_eq!(address, "localhost");
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let err = bind(&address).await.unwrap_err();
        assert!(matches!(err, ExporterError::Bind { .. }));
    }
}
