//! An in-memory relational database engine: a hand-written lexer and
//! recursive-descent parser over a small SQL-like dialect, a typed
//! catalog of tables/columns/keys, and an engine that executes
//! CREATE/ALTER/DROP TABLE, INSERT, and point-query SELECT statements
//! against it.
//!
//! ```text
//! text -> tokens -> AST -> typed execution against the catalog -> validation -> tabular result
//! ```
//!
//! Supported statements:
//!
//! | Statement     | Notes                                              |
//! |---------------|-----------------------------------------------------|
//! | `CREATE TABLE`| columns, one `PRIMARY_KEY`, `FOREIGN_KEY` clauses    |
//! | `ALTER TABLE` | `ADD COLUMN`, `DROP COLUMN`, `ADD FOREIGN_KEY`       |
//! | `DROP TABLE`  |                                                       |
//! | `INSERT`      | positional or named column list                      |
//! | `SELECT`      | column list or `*`, optional `WHERE` with AND/OR      |
//!
//! Not supported, by design: UPDATE, DELETE, joins, aggregates,
//! sub-queries, indexes, transactions, persistence, and anything
//! beyond a single in-process, single-threaded `Engine` instance.
//!
//! The REPL shell, query history, backup file I/O, and colored
//! terminal output are external collaborators built on top of
//! [`Engine::execute`] and [`Engine::get_table`] — not part of this
//! crate.

pub mod ast;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod validate;
pub mod value;

pub use ast::Statement;
pub use catalog::{Catalog, Column, ForeignKey, PrimaryKey, Relation, Row, Table};
pub use engine::{ColumnSnapshot, Engine, ResultSet, TableSnapshot};
pub use error::{Error, Result};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use token::{Keyword, Token, TokenKind};
pub use value::{BoxedValue, DataType};
