//! Pipeline execution.
//!
//! `C1 | C2 | ... | Cn`: adjacent stages are connected with anonymous OS
//! pipes; every stage evaluates against its own deep copy of the scope so
//! side effects never escape the pipeline. All but the last stage run on
//! threads; the last runs in the calling thread and supplies the
//! pipeline's exit status. A backgrounded pipeline detaches entirely and
//! reports success immediately.

use std::io::Write;

use tracing::debug;

use crate::ast::{Node, PipeNode};
use crate::interpreter::errors::ShellError;
use crate::interpreter::io::{ByteSink, ByteSource, ExitStatus, IoContainer};
use crate::scope::Scope;

pub fn eval_pipe(
    pipe: &PipeNode,
    scope: &mut Scope,
    io: &mut IoContainer,
) -> Result<ExitStatus, ShellError> {
    debug!(stages = pipe.commands.len(), background = pipe.background, "pipeline");

    if pipe.background {
        let commands = pipe.commands.clone();
        let base = scope.clone();
        let out = io.output.try_clone()?;
        let err = io.error.try_clone()?;
        std::thread::spawn(move || {
            let _ = run_stages(&commands, &base, out, err);
        });
        return Ok(ExitStatus::SUCCESS);
    }

    let base = scope.clone();
    let out = io.output.try_clone()?;
    let err = io.error.try_clone()?;
    run_stages(&pipe.commands, &base, out, err)
}

fn run_stages(
    commands: &[Node],
    base: &Scope,
    out: ByteSink,
    err: ByteSink,
) -> Result<ExitStatus, ShellError> {
    let Some((last, leading)) = commands.split_last() else {
        return Ok(ExitStatus::SUCCESS);
    };

    std::thread::scope(|s| {
        // The first stage reads immediate EOF; each later stage reads the
        // previous stage's pipe.
        let mut prev = ByteSource::Null;
        for cmd in leading {
            let (reader, writer) = std::io::pipe()?;
            let input = std::mem::replace(&mut prev, ByteSource::Pipe(reader));
            let stage_err = err.try_clone()?;
            let mut stage_scope = base.clone();
            s.spawn(move || {
                let mut stage_io = IoContainer {
                    input,
                    output: ByteSink::Pipe(writer),
                    error: stage_err,
                };
                if let Err(e) = cmd.eval(&mut stage_scope, &mut stage_io) {
                    let _ = writeln!(stage_io.error, "husk: {e}");
                }
                // Dropping stage_io closes the write end; downstream sees EOF.
            });
        }

        let mut last_scope = base.clone();
        let mut last_io = IoContainer { input: prev, output: out, error: err };
        last.eval(&mut last_scope, &mut last_io)
    })
}
