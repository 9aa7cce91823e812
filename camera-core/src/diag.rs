//! Write-only diagnostic text output.
//!
//! Diagnostics are human-readable lines for a serial console or host log.
//! Nothing ever parses them; they are not part of the behavioral contract and
//! the control loop works identically against [`NullDiagnostics`].

use core::fmt;

/// Sink for one-line diagnostic notes.
pub trait DiagnosticSink {
    /// Emits a single preformatted line.
    fn note(&mut self, line: fmt::Arguments<'_>);
}

/// Sink that discards every note.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullDiagnostics;

impl NullDiagnostics {
    /// Creates a new discarding sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for NullDiagnostics {
    fn note(&mut self, _: fmt::Arguments<'_>) {}
}
