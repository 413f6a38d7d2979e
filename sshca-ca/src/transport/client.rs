//! Calling a CA over a byte stream.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sshca_core::{SignRequest, SignResult};
use sshca_proto::{read_message, write_message, Call, Reply, Request, Response, SignArgs};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::ClientError;

/// Anything a [`Client`] can talk over.
pub trait Channel: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Channel for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

type Pending = Arc<DashMap<u64, oneshot::Sender<Response>>>;

/// A connection to a CA, local or remote.
///
/// Calls can be issued concurrently from several tasks; replies are matched
/// to callers by sequence number.
pub struct Client {
    writer: Mutex<WriteHalf<Box<dyn Channel>>>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    next_seq: AtomicU64,
    reader: JoinHandle<()>,
}

impl Client {
    /// Start a client on `stream`. Must be called inside a tokio runtime.
    pub fn new<S: Channel>(stream: S) -> Self {
        let stream: Box<dyn Channel> = Box::new(stream);
        let (read_half, write_half) = tokio::io::split(stream);
        let pending: Pending = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_loop(read_half, pending.clone(), closed.clone()));

        Self {
            writer: Mutex::new(write_half),
            pending,
            closed,
            next_seq: AtomicU64::new(1),
            reader,
        }
    }

    /// Fetch the CA's public key, byte for byte as the CA holds it.
    pub async fn get_ca_public_key(&self) -> Result<Vec<u8>, ClientError> {
        match self.call(Call::GetCaPublicKey).await? {
            Reply::PublicKey { ca_public_key } => Ok(ca_public_key),
            Reply::Signed { .. } => Err(ClientError::UnexpectedReply {
                method: "GetCAPublicKey",
            }),
        }
    }

    /// Ask the CA to certify `request.public_key`. Waits for the operator
    /// if the CA requires confirmation.
    pub async fn sign_public_key(&self, request: &SignRequest) -> Result<SignResult, ClientError> {
        match self.call(Call::SignPublicKey(SignArgs::from(request))).await? {
            Reply::Signed { certificate } => Ok(SignResult { certificate }),
            Reply::PublicKey { .. } => Err(ClientError::UnexpectedReply {
                method: "SignPublicKey",
            }),
        }
    }

    async fn call(&self, call: Call) -> Result<Reply, ClientError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(seq, tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            seq,
        };

        // The reader sets `closed` before draining `pending`, so either it
        // drains our entry or we see the flag here.
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }

        let request = Request { seq, call };
        {
            let mut writer = self.writer.lock().await;
            write_message(&mut *writer, &request).await?;
        }

        let response = rx.await.map_err(|_| ClientError::ConnectionClosed)?;
        response.result.map_err(ClientError::from)
    }
}

/// Forgets a call's reply slot when the call finishes or is abandoned.
struct PendingSlot<'a> {
    pending: &'a Pending,
    seq: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.seq);
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("pending", &self.pending.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

async fn read_loop(mut reader: ReadHalf<Box<dyn Channel>>, pending: Pending, closed: Arc<AtomicBool>) {
    loop {
        match read_message::<Response, _>(&mut reader).await {
            Ok(response) => match pending.remove(&response.seq) {
                Some((_, tx)) => {
                    let _ = tx.send(response);
                }
                None => tracing::warn!(seq = response.seq, "reply for unknown call"),
            },
            Err(e) if e.is_closed() => {
                tracing::debug!("CA connection closed");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "error reading from CA");
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    // Dropping the senders wakes every waiting caller with ConnectionClosed.
    pending.clear();
}
