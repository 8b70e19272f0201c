//! local - declare variables in the current frame.

use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::scope::Scope;

/// `local name...`: each bare name becomes a local holding the currently
/// visible value (empty when unset); `NAME=VALUE` assigns locally.
pub fn local_cmd(scope: &mut Scope, _io: &mut IoContainer, args: &[String]) -> ExitStatus {
    for arg in args {
        if arg.contains('=') {
            let _ = scope.set_from_assignment(arg, true);
        } else {
            let visible = scope.get(arg);
            let value = if visible.set { visible.value } else { String::new() };
            scope.set_local(arg, value);
        }
    }
    ExitStatus::SUCCESS
}
