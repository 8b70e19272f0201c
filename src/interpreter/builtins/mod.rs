//! Built-in commands.
//!
//! Each builtin takes the scope, the command's io and the arguments after
//! the command name, and returns an exit status. Anything not in the
//! table dispatches to the OS.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::scope::Scope;

pub mod cd_cmd;
pub mod echo_cmd;
pub mod local_cmd;
pub mod unset_cmd;

pub type Builtin = fn(&mut Scope, &mut IoContainer, &[String]) -> ExitStatus;

lazy_static! {
    static ref ALL: HashMap<&'static str, Builtin> = {
        let mut m: HashMap<&'static str, Builtin> = HashMap::new();
        m.insert("true", true_cmd as Builtin);
        m.insert(":", true_cmd as Builtin);
        m.insert("false", false_cmd as Builtin);
        m.insert("cd", cd_cmd::cd_cmd as Builtin);
        m.insert("local", local_cmd::local_cmd as Builtin);
        m.insert("echo", echo_cmd::echo_cmd as Builtin);
        m.insert("unset", unset_cmd::unset_cmd as Builtin);
        m
    };
}

pub fn lookup(name: &str) -> Option<Builtin> {
    ALL.get(name).copied()
}

fn true_cmd(_: &mut Scope, _: &mut IoContainer, _: &[String]) -> ExitStatus {
    ExitStatus::SUCCESS
}

fn false_cmd(_: &mut Scope, _: &mut IoContainer, _: &[String]) -> ExitStatus {
    ExitStatus::FAILURE
}
