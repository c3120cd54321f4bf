//! Type annotator/checker (§4.4), security labeller (§4.5), explicit-flow
//! checker (§4.6), and flow analyser (§4.7).
//!
//! [`check`] runs all four passes in order against an already-bound
//! [`File`](palisade_ast::File). Each pass is fatal-on-error through the
//! shared [`Sink`]; a program that survives all four satisfies every
//! invariant in §3 of the specification.

mod context;
mod explicit_flow;
mod flow;
mod label;
mod type_check;

pub use context::SecurityContext;

use palisade_ast::File;
use palisade_common::Sink;

/// Runs the full checker pipeline over `file` in place.
pub fn check(file: &mut File, sink: &Sink) {
    let _span = tracing::debug_span!("check").entered();

    let statements = std::mem::take(&mut file.statements);
    file.statements = type_check::check_stmts(statements, file, sink);
    tracing::debug!("type annotation and checking complete");

    let statements = std::mem::take(&mut file.statements);
    file.statements = label::label_stmts(statements, file, sink);
    tracing::debug!("security labelling complete");

    explicit_flow::check_stmts(&file.statements, file, sink);
    tracing::debug!("explicit-flow check complete");

    flow::analyze(file, sink);
    tracing::debug!("flow analysis complete");
}
