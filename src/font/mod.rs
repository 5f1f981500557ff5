//! Drum-font parsing: lexer, parser, value tree, and schema validator
//! (spec sections 4.5-4.7).

pub mod lexer;
pub mod parser;
pub mod validator;
pub mod value;

pub use lexer::{Lexer, SyntaxMode, Token, TokenKind};
pub use parser::parse;
pub use validator::{validate, ValidationLog};
pub use value::Value;
