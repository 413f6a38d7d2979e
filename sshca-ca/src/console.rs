//! The service's interactive terminal.
//!
//! Two things share it: the operator who confirms each request, and
//! `ssh-keygen`, which may prompt for the CA passphrase. [`ConsoleLock`]
//! serializes the latter; [`Operator`] abstracts the former so tests can
//! script it.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{Mutex, MutexGuard};

/// Exclusive access to the terminal. Hold the guard for the whole of a
/// subprocess run that may prompt.
#[derive(Debug, Default)]
pub struct ConsoleLock {
    inner: Mutex<()>,
}

/// Proof of holding the [`ConsoleLock`]. Released on drop.
#[derive(Debug)]
pub struct ConsoleGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ConsoleLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no one else holds the terminal.
    pub async fn acquire(&self) -> ConsoleGuard<'_> {
        ConsoleGuard {
            _guard: self.inner.lock().await,
        }
    }
}

/// The human operating the CA.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Show a request summary.
    async fn announce(&self, summary: &str);

    /// Block until the operator confirms. `false` means input ended first.
    async fn confirm(&self) -> bool;
}

/// An operator reading confirmations line by line from `R` and printing
/// summaries on stdout.
#[derive(Debug)]
pub struct LineOperator<R> {
    input: Mutex<R>,
}

/// The operator at the service's own terminal.
pub type TerminalOperator = LineOperator<BufReader<Stdin>>;

impl<R> LineOperator<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl TerminalOperator {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> Operator for LineOperator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn announce(&self, summary: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{summary}");
        let _ = stdout.flush();
    }

    async fn confirm(&self) -> bool {
        let mut input = self.input.lock().await;
        let mut line = String::new();
        match input.read_line(&mut line).await {
            // A partial line at EOF has no terminator and doesn't count.
            Ok(_) => line.ends_with('\n'),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_line_confirms() {
        let operator = LineOperator::new(Cursor::new(b"\nyes\n".to_vec()));
        assert!(operator.confirm().await);
        assert!(operator.confirm().await);
        assert!(!operator.confirm().await);
    }

    #[tokio::test]
    async fn test_eof_aborts() {
        let operator = LineOperator::new(Cursor::new(Vec::new()));
        assert!(!operator.confirm().await);
    }

    #[tokio::test]
    async fn test_unterminated_input_aborts() {
        let operator = LineOperator::new(Cursor::new(b"y".to_vec()));
        assert!(!operator.confirm().await);
    }

    #[tokio::test]
    async fn test_console_lock_is_exclusive() {
        let lock = Arc::new(ConsoleLock::new());
        let guard = lock.acquire().await;

        let contender = {
            let lock = lock.clone();
            tokio::spawn(async move {
                let _guard = lock.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }
}
