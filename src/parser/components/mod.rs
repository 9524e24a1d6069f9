// Parser Components
//
// Grammar productions split by concern: shared parser state, SELECT clause
// parsing, and expression parsing.

pub mod parser_core;
pub mod parser_expressions;
pub mod parser_select;
