//! Common types shared by every stage of the Palisade compiler.
//!
//! - Source spans (`Span`, `Spanned`, `SpanBuilder`)
//! - The source file model used to render diagnostics
//! - The diagnostics sink (errors, security errors, notes, debug output)

pub mod span;
pub use span::{ByteSpan, Span, SpanBuilder, Spanned};

pub mod source;
pub use source::SourceFile;

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, Sink};
