use std::io;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use tracing_subscriber::fmt::MakeWriter;

use crate::config::SQL_ORACLE_PREFIX;

/// Runs a function with every SQL_ORACLE_ environment variable unset
pub(crate) fn with_no_oracle_vars<F: FnOnce() -> R, R>(f: F) -> R {
    let prefix = format!("{SQL_ORACLE_PREFIX}_");
    let vars = std::env::vars()
        .map(|(k, _v)| k)
        .filter(|k| k.starts_with(&prefix))
        .collect::<Vec<_>>();

    temp_env::with_vars_unset(&vars, f)
}

// Captures formatted log output, after the mock writer in tracing_subscriber's own tests
// https://github.com/tokio-rs/tracing/blob/b02a700ba6850ad813f77e65144114f866074a8f/tracing-subscriber/src/fmt/mod.rs#L1247-L1314
pub(crate) struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockWriter {
    fn buf(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
        self.buf.try_lock().map_err(|err| match err {
            TryLockError::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            TryLockError::Poisoned(_) => io::Error::from(io::ErrorKind::Other),
        })
    }
}

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf()?.flush()
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockMakeWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockMakeWriter {
    /// Everything written so far, clearing the buffer.
    pub(crate) fn get_string(&self) -> String {
        let mut buf = self.buf.lock().expect("lock shouldn't be poisoned");
        let string = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        string
    }
}

impl<'a> MakeWriter<'a> for MockMakeWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MockWriter {
            buf: self.buf.clone(),
        }
    }
}
