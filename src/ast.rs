//! # SQL/JSON Path - Abstract Syntax Tree
//!
//! This module defines the syntax tree produced by the parser and consumed by
//! the evaluator. Trees can also be built by hand with the validating
//! constructors on [`Expr`] and [`Predicate`] and turned back into path text
//! through `Display`.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Value-producing nodes (literals, arithmetic, accessors, methods)
//! - **[predicates]** - Truth-valued nodes (comparisons, `exists`, `like_regex`, ...)
//! - **[path]** - The complete path with its lax/strict mode
//! - **[display]** - Serialization back to path text
//!
//! ## Quick Start
//!
//! ```text
//! strict $.orders[*] ? (@.total > $min).id
//! ```
//!
//! This path selects the `id` of every order whose `total` exceeds the
//! caller-supplied `$min`, raising an error for structural mismatches.
//!
//! ## Core Concepts
//!
//! ### Expressions and Predicates
//!
//! Expressions produce sequences of items; predicates produce `true`,
//! `false` or `unknown`. A predicate may appear wherever a whole path is
//! expected, and a parenthesized predicate may be the base of an accessor.
//!
//! ### Lax and Strict Mode
//!
//! Lax mode (the default) unwraps arrays and wraps scalars as needed and
//! turns structural errors into empty results. Strict mode reports them.
//!
//! ## Examples
//!
//! ```
//! use sqljson_path::ast::{Expr, JsonPath, Literal};
//!
//! let path = JsonPath::new(
//!     Expr::key(Expr::Root, Some("price".to_string())),
//!     true,
//! );
//! assert_eq!(path.to_string(), "strict $.price");
//! assert_eq!(
//!     Expr::minus(Expr::literal(Literal::Integer(3))),
//!     Expr::literal(Literal::Integer(-3)),
//! );
//! ```
pub mod display;
pub mod expressions;
pub mod path;
pub mod predicates;
pub mod tokens;

pub use crate::error::AstError;
pub use expressions::{Depth, Expr, IndexElement, Literal, Method};
pub use path::{ExprOrPredicate, JsonPath};
pub use predicates::{CompareOp, LikeRegexFlags, Predicate};
pub use tokens::Token;
