//! Command AST
//!
//! Node types produced by the shell parser and consumed by the evaluator.

pub mod types;

pub use types::{
    BinaryNode, CaseClauseNode, CaseNode, CommandNode, ForNode, FunctionNode, IfNode, LoopNode,
    Node, PipeNode, Substitution, VarSubKind, Word,
};
