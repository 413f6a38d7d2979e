//! Serving a [`CaService`] over a byte stream.

use std::sync::Arc;

use sshca_proto::{
    read_message, write_message, Call, CodecError, ErrorCode, Reply, Request, Response, RpcError,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::service::CaService;

/// Serve one connection until the peer goes away.
///
/// Requests are handled concurrently, each in its own task; replies funnel
/// through a single writer so frames never interleave.
pub async fn serve_connection<S>(stream: S, service: Arc<CaService>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut read_half, mut write_half) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::channel::<Response>(32);

    let write_handle = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            if let Err(e) = write_message(&mut write_half, &response).await {
                match e {
                    CodecError::Io(ref io) if io.kind() == std::io::ErrorKind::BrokenPipe => {
                        tracing::debug!("client went away before reply");
                    }
                    _ => tracing::error!(seq = response.seq, error = %e, "error writing reply"),
                }
                break;
            }
        }
    });

    loop {
        match read_message::<Request, _>(&mut read_half).await {
            Ok(request) => {
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = dispatch(&service, request).await;
                    let _ = tx.send(response).await;
                });
            }
            Err(e) if e.is_closed() => {
                tracing::debug!("client connection closed");
                break;
            }
            Err(CodecError::Malformed(e)) => {
                // The frame boundary is intact, so keep reading.
                tracing::warn!(error = %e, "discarding malformed request");
            }
            Err(e) => {
                tracing::error!(error = %e, "error reading request");
                break;
            }
        }
    }

    // In-flight handlers keep their senders until they reply.
    drop(tx);
    let _ = write_handle.await;
}

async fn dispatch(service: &CaService, request: Request) -> Response {
    let Request { seq, call } = request;
    tracing::debug!(seq, method = call.method(), "call received");

    let result = match call {
        Call::GetCaPublicKey => Ok(Reply::PublicKey {
            ca_public_key: service.ca_public_key().as_bytes().to_vec(),
        }),
        Call::SignPublicKey(args) => match args.into_request() {
            Ok(request) => service
                .sign_public_key(&request)
                .await
                .map(|signed| Reply::Signed {
                    certificate: signed.certificate,
                })
                .map_err(|e| e.to_rpc()),
            Err(e) => {
                tracing::warn!(seq, error = %e, "rejecting unparseable key");
                Err(RpcError::new(ErrorCode::InvalidKeyFormat, e.to_string()))
            }
        },
    };

    Response { seq, result }
}

/// Accept TCP clients forever, serving each on its own task.
pub async fn serve(listener: TcpListener, service: Arc<CaService>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!(%peer, "client connected");
                let service = service.clone();
                tokio::spawn(async move {
                    serve_connection(stream, service).await;
                    tracing::info!(%peer, "client disconnected");
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to accept connection");
            }
        }
    }
}
