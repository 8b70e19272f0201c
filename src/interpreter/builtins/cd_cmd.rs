//! cd - change working directory.

use std::io::Write;

use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::scope::Scope;

/// `cd [dir]`: change to `dir`, or to `$HOME` (falling back to the
/// process environment) when no argument is given. Failure prints a
/// message on stderr and returns 1.
pub fn cd_cmd(scope: &mut Scope, io: &mut IoContainer, args: &[String]) -> ExitStatus {
    let target = match args.first() {
        Some(dir) => dir.clone(),
        None => {
            let home = scope.get("HOME");
            if home.set && !home.value.is_empty() {
                home.value
            } else if let Ok(home) = std::env::var("HOME") {
                home
            } else {
                let _ = writeln!(io.error, "husk: cd: HOME not set");
                return ExitStatus::FAILURE;
            }
        }
    };

    match scope.set_pwd(&target) {
        Ok(()) => ExitStatus::SUCCESS,
        Err(e) => {
            let _ = writeln!(io.error, "husk: cd: {target}: {e}");
            ExitStatus::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::io::{ByteSink, ByteSource};

    fn null_io() -> IoContainer {
        IoContainer { input: ByteSource::Null, output: ByteSink::Null, error: ByteSink::Null }
    }

    #[test]
    fn test_cd_to_missing_directory_fails() {
        let mut scope = Scope::new();
        let mut io = null_io();
        let args = vec!["/definitely/not/a/real/path".to_string()];
        assert_eq!(cd_cmd(&mut scope, &mut io, &args), ExitStatus::FAILURE);
    }

    #[test]
    fn test_cd_updates_pwd_and_oldpwd() {
        let mut scope = Scope::new();
        let mut io = null_io();
        let before = scope.pwd.clone();
        let tmp = tempfile::tempdir().unwrap();
        let args = vec![tmp.path().to_string_lossy().into_owned()];
        assert!(cd_cmd(&mut scope, &mut io, &args).is_success());
        assert_eq!(scope.get("OLDPWD").value, before);
        assert_eq!(scope.get("PWD").value, scope.pwd);
        // Return so other tests see a stable working directory.
        assert!(cd_cmd(&mut scope, &mut io, &[before.clone()]).is_success());
    }
}
