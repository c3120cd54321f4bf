//! The compile driver (§7): reads one source file and runs it through the
//! whole pipeline — lex, parse, bind, check (type/label/explicit-flow/flow)
//! — then prints the decorated AST. Every fatal diagnostic exits the process
//! with code 1 from inside the [`Sink`] before this function returns, so a
//! normal return here always means success.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use palisade_common::{Sink, SourceFile};

use crate::printer;

pub fn compile(path: &Path, color: bool) -> Result<()> {
    let _span = tracing::info_span!("compile", path = %path.display()).entered();

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    let source = SourceFile::new(path.display().to_string(), text);
    let sink = Sink::new(&source);
    let sink = if color { sink } else { sink.without_color() };

    let mut file = palisade_parser::parse(&source, &sink);
    palisade_binder::bind(&mut file, &sink);
    palisade_checker::check(&mut file, &sink);

    tracing::debug!("compilation succeeded");
    printer::print_file(&file);
    Ok(())
}
