//! Routes formatted tracing events to the system log.

use std::ffi::{CStr, CString, c_int};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

const IDENT: &CStr = c"tcsimd";

static OPEN: AtomicBool = AtomicBool::new(false);

/// Connects to the system logger under the `tcsimd` tag with the daemon
/// facility.
pub(super) fn open() {
    // SAFETY: IDENT is a static NUL-terminated string, so the pointer stays
    // valid for as long as syslog may keep it.
    unsafe { libc::openlog(IDENT.as_ptr(), libc::LOG_PID | libc::LOG_NDELAY, libc::LOG_DAEMON) };
    OPEN.store(true, Ordering::SeqCst);
}

pub(super) fn close() {
    if OPEN.swap(false, Ordering::SeqCst) {
        // SAFETY: closelog takes no arguments and tolerates a closed log.
        unsafe { libc::closelog() };
    }
}

/// [`MakeWriter`] that hands each event a writer tagged with the matching
/// syslog priority.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyslogMakeWriter;

impl SyslogMakeWriter {
    /// Builds a writer factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogWriter::new(libc::LOG_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogWriter::new(priority(meta.level()))
    }
}

/// Buffers one formatted event and submits it to syslog when dropped.
#[derive(Debug)]
pub struct SyslogWriter {
    priority: c_int,
    buffer: Vec<u8>,
}

impl SyslogWriter {
    fn new(priority: c_int) -> Self {
        Self {
            priority,
            buffer: Vec::new(),
        }
    }

    fn message(&self) -> Option<CString> {
        let trimmed = self.buffer.trim_ascii_end();
        if trimmed.is_empty() {
            return None;
        }
        let cleaned: Vec<u8> = trimmed.iter().copied().filter(|byte| *byte != 0).collect();
        CString::new(cleaned).ok()
    }
}

impl Write for SyslogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogWriter {
    fn drop(&mut self) {
        if let Some(message) = self.message() {
            // SAFETY: both format and argument are NUL-terminated and outlive
            // the call; "%s" stops syslog interpreting the message.
            unsafe { libc::syslog(self.priority, c"%s".as_ptr(), message.as_ptr()) };
        }
    }
}

fn priority(level: &Level) -> c_int {
    if *level == Level::ERROR {
        libc::LOG_ERR
    } else if *level == Level::WARN {
        libc::LOG_WARNING
    } else if *level == Level::INFO {
        libc::LOG_INFO
    } else {
        libc::LOG_DEBUG
    }
}
