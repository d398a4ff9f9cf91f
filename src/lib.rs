pub mod ast;
pub mod cli;
pub mod datetime;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod posix;
pub mod query;
pub mod value;

pub use ast::{Expr, ExprOrPredicate, JsonPath, Predicate, Token};
pub use error::{Error, LexError, ParseError, QueryError};
pub use evaluator::{Item, Tri};
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use query::{
    CompiledQuery, IntoQuery, Options, QueryResults, RegexDialect, exists, path_match, query,
    query_first,
};
pub use value::Value;
