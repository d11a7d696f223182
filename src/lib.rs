pub mod compiler;
pub mod debugger;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod machine;
pub mod parser;
pub mod value;
