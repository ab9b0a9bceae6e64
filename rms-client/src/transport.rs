//! Transport layer (TCP and TLS) for stream connections.
//!
//! The device serves either plain HTTP on its LAN address or HTTPS with a
//! self-signed certificate. This module provides the raw byte pipe for
//! both; the HTTP conversation on top of it lives in [`crate::http`].

use crate::config::TlsSettings;
use crate::errors::StreamError;
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Transport for a stream connection: plain TCP or TLS.
pub enum Transport {
    /// Plain TCP connection (unencrypted)
    Plain(TcpStream),
    /// TLS-encrypted connection
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
}

impl Transport {
    /// Connect via plain TCP.
    ///
    /// TCP_NODELAY is enabled: frame records are small and latency matters
    /// more than throughput for a live screen.
    pub async fn connect_tcp(host: &str, port: u16) -> Result<Self, StreamError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            StreamError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
        })?;

        stream.set_nodelay(true).map_err(|e| {
            StreamError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        if let (Ok(local), Ok(peer)) = (stream.local_addr(), stream.peer_addr()) {
            tracing::info!("Connected via TCP: local={} -> remote={}", local, peer);
        } else {
            tracing::info!("Connected to {} via plain TCP", addr);
        }
        Ok(Transport::Plain(stream))
    }

    /// Connect via TLS.
    ///
    /// With `danger_accept_invalid_certs` set, certificate verification is
    /// skipped entirely; this is what talking to the device's out-of-box
    /// self-signed certificate requires, and it is loudly logged.
    pub async fn connect_tls(
        host: &str,
        port: u16,
        settings: &TlsSettings,
    ) -> Result<Self, StreamError> {
        let addr = format!("{}:{}", host, port);

        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            StreamError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
        })?;

        stream.set_nodelay(true).map_err(|e| {
            StreamError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        let config = if settings.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate verification is DISABLED - insecure!");

            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
                .with_no_client_auth()
        } else {
            let mut root_store = RootCertStore::empty();
            let native_certs = rustls_native_certs::load_native_certs().map_err(|e| {
                StreamError::Tls(format!("Failed to load system certificates: {}", e))
            })?;
            for cert in native_certs {
                root_store.add(cert).map_err(|e| {
                    StreamError::Tls(format!("Invalid system certificate: {}", e))
                })?;
            }

            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let connector = TlsConnector::from(Arc::new(config));

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| StreamError::Tls(format!("Invalid hostname '{}': {}", host, e)))?;

        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| StreamError::Tls(format!("TLS handshake failed: {}", e)))?;

        if let (Ok(local), Ok(peer)) = (
            tls_stream.get_ref().0.local_addr(),
            tls_stream.get_ref().0.peer_addr(),
        ) {
            tracing::info!("Connected via TLS: local={} -> remote={}", local, peer);
        } else {
            tracing::info!("Connected to {} via TLS", addr);
        }
        Ok(Transport::Tls(tls_stream))
    }

    /// Split the transport into read and write halves.
    pub fn split(self) -> (TransportRead, TransportWrite) {
        match self {
            Transport::Plain(stream) => {
                let (read, write) = tokio::io::split(stream);
                (TransportRead::Plain(read), TransportWrite::Plain(write))
            }
            Transport::Tls(stream) => {
                let (read, write) = tokio::io::split(stream);
                (TransportRead::Tls(read), TransportWrite::Tls(write))
            }
        }
    }
}

/// Read half of a transport (plain TCP or TLS).
pub enum TransportRead {
    /// Plain TCP read stream
    Plain(ReadHalf<TcpStream>),
    /// TLS read stream
    Tls(ReadHalf<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for TransportRead {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match &mut *self {
            TransportRead::Plain(stream) => std::pin::Pin::new(stream).poll_read(cx, buf),
            TransportRead::Tls(stream) => std::pin::Pin::new(stream).poll_read(cx, buf),
        }
    }
}

/// Write half of a transport (plain TCP or TLS).
pub enum TransportWrite {
    /// Plain TCP write stream
    Plain(WriteHalf<TcpStream>),
    /// TLS write stream
    Tls(WriteHalf<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncWrite for TransportWrite {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        match &mut *self {
            TransportWrite::Plain(stream) => std::pin::Pin::new(stream).poll_write(cx, buf),
            TransportWrite::Tls(stream) => std::pin::Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match &mut *self {
            TransportWrite::Plain(stream) => std::pin::Pin::new(stream).poll_flush(cx),
            TransportWrite::Tls(stream) => std::pin::Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match &mut *self {
            TransportWrite::Plain(stream) => std::pin::Pin::new(stream).poll_shutdown(cx),
            TransportWrite::Tls(stream) => std::pin::Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Certificate verifier that accepts all certificates (INSECURE!).
///
/// Only reachable through `danger_accept_invalid_certs`.
#[derive(Debug)]
struct NoCertificateVerification;

impl rustls::client::danger::ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
