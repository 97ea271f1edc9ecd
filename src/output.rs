//! Output sinks shared by the driver, the loggers and the engine
//!
//! Instead of swapping the process-wide stdout/stderr, a run carries an
//! [`OutputContext`] holding the active output and error [`Sink`]s.
//! [`OutputContext::redirect`] installs replacement sinks for a scope and the
//! returned [`Redirection`] puts the previous ones back when it is dropped,
//! whichever way the scope is left.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Cloneable handle to a writer; clones write to the same destination
#[derive(Clone)]
pub struct Sink {
    inner: Rc<RefCell<Box<dyn Write>>>,
}

impl Sink {
    /// Wrap any writer
    pub fn new<W: Write + 'static>(writer: W) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(writer))),
        }
    }

    /// Process standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Process standard error
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Whether both handles write to the same destination
    #[cfg(test)]
    pub fn same_as(&self, other: &Sink) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.try_borrow_mut() {
            Ok(mut writer) => writer.write(buf),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "sink written to while already writing",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.try_borrow_mut() {
            Ok(mut writer) => writer.flush(),
            Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("handle", &Rc::as_ptr(&self.inner))
            .finish()
    }
}

/// The output and error sinks active for a run
#[derive(Debug, Clone)]
pub struct OutputContext {
    out: Sink,
    err: Sink,
}

impl OutputContext {
    pub fn new(out: Sink, err: Sink) -> Self {
        Self { out, err }
    }

    /// Context writing to the process standard streams
    pub fn stdio() -> Self {
        Self::new(Sink::stdout(), Sink::stderr())
    }

    /// Current output sink
    pub fn out(&self) -> Sink {
        self.out.clone()
    }

    /// Current error sink
    pub fn err(&self) -> Sink {
        self.err.clone()
    }

    /// Replace both sinks for the rest of the run (`-logfile`)
    pub fn replace(&mut self, out: Sink, err: Sink) {
        self.out = out;
        self.err = err;
    }

    /// Install `out` and `err` until the returned guard is dropped
    pub fn redirect(&mut self, out: Sink, err: Sink) -> Redirection<'_> {
        let saved_out = std::mem::replace(&mut self.out, out);
        let saved_err = std::mem::replace(&mut self.err, err);
        Redirection {
            context: self,
            saved: Some((saved_out, saved_err)),
        }
    }
}

/// Scoped redirection of an [`OutputContext`]
///
/// Dereferences to the redirected context. Dropping it flushes the
/// redirected sinks and restores the ones captured by `redirect`.
pub struct Redirection<'a> {
    context: &'a mut OutputContext,
    saved: Option<(Sink, Sink)>,
}

impl Deref for Redirection<'_> {
    type Target = OutputContext;

    fn deref(&self) -> &OutputContext {
        self.context
    }
}

impl DerefMut for Redirection<'_> {
    fn deref_mut(&mut self) -> &mut OutputContext {
        self.context
    }
}

impl Drop for Redirection<'_> {
    fn drop(&mut self) {
        let _ = self.context.out.flush();
        let _ = self.context.err.flush();
        if let Some((out, err)) = self.saved.take() {
            self.context.out = out;
            self.context.err = err;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory writer whose contents stay readable after being handed out
    #[derive(Clone, Default)]
    pub struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Captured {
        pub fn sink(&self) -> Sink {
            Sink::new(self.clone())
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Context whose output and error are captured separately
    pub fn captured_context() -> (OutputContext, Captured, Captured) {
        let out = Captured::default();
        let err = Captured::default();
        (OutputContext::new(out.sink(), err.sink()), out, err)
    }
}
