//! AST and Core IR types for the Aster front-end.
//!
//! Every surface node carries a [`Span`]; every Core IR node additionally
//! carries an [`Origin`] naming the file it came from. The Core IR types
//! serialize to the versioned JSON envelope defined in [`json`].

mod ast;
mod common;
mod core_ir;
pub mod json;
mod span;
mod token;

pub use ast::{
    Block, Data, Decl, EnumDecl, Expr, Field, Func, Import, MatchCase, Module, Pattern, Stmt,
    Type,
};
pub use common::{Capability, Constraint, Effect, Sensitivity};
pub use core_ir::{
    CoreBlock, CoreConstructField, CoreData, CoreDecl, CoreEnum, CoreExpr, CoreField, CoreFunc,
    CoreImport, CoreMatchCase, CoreModule, CorePattern, CoreStmt, CoreType, Origin,
};
pub use span::{Position, Span};
pub use token::{Channel, Token, TokenKind};
