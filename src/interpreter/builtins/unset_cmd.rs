//! unset - forget variables.

use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::scope::Scope;

pub fn unset_cmd(scope: &mut Scope, _io: &mut IoContainer, args: &[String]) -> ExitStatus {
    for name in args {
        scope.unset(name);
    }
    ExitStatus::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::io::{ByteSink, ByteSource};

    #[test]
    fn test_unset_clears_value() {
        let mut scope = Scope::new();
        let mut io =
            IoContainer { input: ByteSource::Null, output: ByteSink::Null, error: ByteSink::Null };
        scope.set("x", "1").unwrap();
        unset_cmd(&mut scope, &mut io, &["x".to_string()]);
        let v = scope.get("x");
        assert!(!v.set);
        assert_eq!(v.value, "");
    }
}
