//! Web server

use crate::cli;

use std::{io, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use thiserror::Error;
use tokio::signal;

/// Errors that prevent the server from starting or running
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid listen address
    #[error("invalid host name, IP address or port number {0}")]
    Address(String),

    /// TLS file that cannot be found
    #[error("TLS {kind} file expected at '{}' but not found", .path.display())]
    TlsFileNotFound { kind: &'static str, path: PathBuf },

    /// Failure expanding or resolving a TLS file path
    #[error("failed to resolve TLS {kind} file {path}")]
    TlsFilePath {
        kind: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failure loading TLS certificate files
    #[error("failed to load TLS certificate files")]
    TlsConfig(#[source] io::Error),

    /// Failure serving requests
    #[error("server error")]
    Serve(#[source] io::Error),
}

/// Returns the absolute path of a TLS file, which must exist.
fn tls_file(kind: &'static str, path: &str) -> Result<PathBuf, ServerError> {
    let expanded = expanduser(path).map_err(|source| ServerError::TlsFilePath {
        kind,
        path: path.to_string(),
        source,
    })?;
    if !expanded.exists() {
        return Err(ServerError::TlsFileNotFound {
            kind,
            path: expanded,
        });
    }
    expanded
        .canonicalize()
        .map_err(|source| ServerError::TlsFilePath {
            kind,
            path: path.to_string(),
            source,
        })
}

/// Serve the seq2view API
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(
    args: &cli::CommandLineArgs,
    service: crate::app::Service,
) -> Result<(), ServerError> {
    let addr = format!("{}:{}", args.host, args.port);
    let addr = SocketAddr::from_str(&addr).map_err(|_| ServerError::Address(addr))?;

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    if args.https {
        let cert_file = tls_file("certificate", &args.cert_file)?;
        let key_file = tls_file("key", &args.key_file)?;
        let tls_config = RustlsConfig::from_pem_file(cert_file, key_file)
            .await
            .map_err(ServerError::TlsConfig)?;
        tracing::info!(%addr, "serving HTTPS");
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .map_err(ServerError::Serve)
    } else {
        tracing::info!(%addr, "serving HTTP");
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .map_err(ServerError::Serve)
    }
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
    // Force shutdown if graceful shutdown takes longer than the timeout
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cert.pem");
        match tls_file("certificate", path.to_str().unwrap()).unwrap_err() {
            ServerError::TlsFileNotFound { kind, path: p } => {
                assert_eq!("certificate", kind);
                assert_eq!(path, p);
            }
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[test]
    fn tls_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");
        std::fs::write(&path, "").unwrap();
        let resolved = tls_file("key", path.to_str().unwrap()).unwrap();
        assert_eq!(path.canonicalize().unwrap(), resolved);
    }
}
