//! Recursive-descent parser keeping exactly one look-ahead token,
//! grounded in `oxide_sql_core::parser::Parser`'s single-lookahead
//! `expect`/`check` idiom but producing this engine's own, much
//! smaller grammar (five statement kinds, no joins or expressions).

use std::fmt;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Keyword, Token, TokenKind};
use crate::value::DataType;

/// An unexpected token or premature end of input, naming the expected
/// set and the offending lexeme.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span_start: usize,
    pub span_end: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, token: &Token) -> Self {
        ParseError {
            message: message.into(),
            span_start: token.span.start,
            span_end: token.span.end,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span_start, self.span_end
        )
    }
}

impl std::error::Error for ParseError {}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn fail<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::Parse(ParseError::new(message, &self.current)))
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            self.fail(format!(
                "expected {expected}, found '{}'",
                self.current.lexeme
            ))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        self.expect_kind(TokenKind::Keyword(kw), kw.as_str())
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if self.current.kind == TokenKind::Identifier {
            Ok(self.advance()?.lexeme)
        } else {
            self.fail(format!(
                "expected an identifier, found '{}'",
                self.current.lexeme
            ))
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.current.kind == TokenKind::Keyword(kw)
    }

    /// Parses exactly one statement, requiring `EndOfQuery` at the end.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let statement = match self.current.as_keyword() {
            Some(Keyword::Select) => Statement::Select(self.parse_select()?),
            Some(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            Some(Keyword::Create) => Statement::CreateTable(self.parse_create_table()?),
            Some(Keyword::Alter) => Statement::AlterTable(self.parse_alter_table()?),
            Some(Keyword::Drop) => Statement::DropTable(self.parse_drop_table()?),
            _ => {
                return self.fail(format!(
                    "expected a statement keyword, found '{}'",
                    self.current.lexeme
                ))
            }
        };
        Ok(statement)
    }

    // ---- SELECT ----

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword(Keyword::Select)?;
        let columns = self.parse_select_columns()?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let where_clause = if self.at_keyword(Keyword::Where) {
            self.advance()?;
            Some(self.parse_or()?)
        } else {
            None
        };
        self.expect_kind(TokenKind::EndOfQuery, "';'")?;
        Ok(SelectStatement {
            columns,
            table,
            where_clause,
        })
    }

    fn parse_select_columns(&mut self) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Star => {
                    self.advance()?;
                    columns.push("*".to_string());
                }
                TokenKind::Identifier => {
                    columns.push(self.expect_identifier()?);
                }
                TokenKind::EndOfQuery => {
                    return self.fail("unexpected end of query while parsing column list");
                }
                _ => {
                    return self.fail(format!(
                        "expected a column name or '*', found '{}'",
                        self.current.lexeme
                    ))
                }
            }
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
                continue;
            }
            break;
        }
        if columns.is_empty() {
            return self.fail("SELECT requires at least one column");
        }
        Ok(columns)
    }

    // ---- WHERE: or := and (OR and)*; and := expr (AND expr)*; expr := '(' or ')' | condition ----

    fn parse_or(&mut self) -> Result<ConditionGroup> {
        let mut children = vec![ConditionNode::Group(self.parse_and()?)];
        while self.at_keyword(Keyword::Or) {
            self.advance()?;
            children.push(ConditionNode::Group(self.parse_and()?));
        }
        Ok(ConditionGroup {
            op: LogicalOp::Or,
            children,
        })
    }

    fn parse_and(&mut self) -> Result<ConditionGroup> {
        let mut children = vec![self.parse_where_expr()?];
        while self.at_keyword(Keyword::And) {
            self.advance()?;
            children.push(self.parse_where_expr()?);
        }
        Ok(ConditionGroup {
            op: LogicalOp::And,
            children,
        })
    }

    fn parse_where_expr(&mut self) -> Result<ConditionNode> {
        if self.current.kind == TokenKind::LeftParen {
            self.advance()?;
            let group = self.parse_or()?;
            self.expect_kind(TokenKind::RightParen, "')'")?;
            Ok(ConditionNode::Group(group))
        } else {
            Ok(ConditionNode::Condition(self.parse_condition()?))
        }
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.expect_identifier()?;
        if self.at_keyword(Keyword::IsNull) {
            self.advance()?;
            return Ok(Condition::IsNull { column });
        }
        if self.at_keyword(Keyword::IsNotNull) {
            self.advance()?;
            return Ok(Condition::IsNotNull { column });
        }
        let op = match self.current.kind {
            TokenKind::Equal => ComparisonOp::Eq,
            TokenKind::NotEqual => ComparisonOp::NotEq,
            TokenKind::Less => ComparisonOp::Lt,
            TokenKind::LessEqual => ComparisonOp::LtEq,
            TokenKind::Greater => ComparisonOp::Gt,
            TokenKind::GreaterEqual => ComparisonOp::GtEq,
            _ => {
                return self.fail(format!(
                    "expected a comparison operator or IS_NULL/IS_NOT_NULL, found '{}'",
                    self.current.lexeme
                ))
            }
        };
        self.advance()?;
        let value = self.parse_literal()?;
        Ok(Condition::Compare { column, op, value })
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::String => {
                Ok(Literal(self.advance()?.lexeme))
            }
            _ => self.fail(format!(
                "expected an identifier, number, or string, found '{}'",
                self.current.lexeme
            )),
        }
    }

    // ---- INSERT ----

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;
        let columns = if self.current.kind == TokenKind::LeftParen {
            self.parse_identifier_list()?
        } else {
            Vec::new()
        };
        self.expect_keyword(Keyword::Values)?;
        self.expect_kind(TokenKind::LeftParen, "'('")?;
        let mut values = Vec::new();
        if self.current.kind != TokenKind::RightParen {
            loop {
                values.push(self.parse_literal()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                    continue;
                }
                break;
            }
        }
        self.expect_kind(TokenKind::RightParen, "')'")?;
        self.expect_kind(TokenKind::EndOfQuery, "';'")?;
        Ok(InsertStatement {
            table,
            columns,
            values,
        })
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        self.expect_kind(TokenKind::LeftParen, "'('")?;
        let mut names = Vec::new();
        if self.current.kind != TokenKind::RightParen {
            loop {
                names.push(self.expect_identifier()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                    continue;
                }
                break;
            }
        }
        self.expect_kind(TokenKind::RightParen, "')'")?;
        Ok(names)
    }

    // ---- CREATE TABLE ----

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;
        self.expect_kind(TokenKind::LeftParen, "'('")?;
        let mut columns = Vec::new();
        let mut foreign_keys = Vec::new();
        loop {
            if self.at_keyword(Keyword::ForeignKey) {
                foreign_keys.push(self.parse_foreign_key_clause()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
                continue;
            }
            break;
        }
        self.expect_kind(TokenKind::RightParen, "')'")?;
        self.expect_kind(TokenKind::EndOfQuery, "';'")?;
        Ok(CreateTableStatement {
            table,
            columns,
            foreign_keys,
        })
    }

    fn parse_foreign_key_clause(&mut self) -> Result<ForeignKeyDef> {
        self.expect_keyword(Keyword::ForeignKey)?;
        let column = self.expect_identifier()?;
        self.expect_keyword(Keyword::References)?;
        let referenced_table = self.expect_identifier()?;
        let referenced_column = self.expect_identifier()?;
        Ok(ForeignKeyDef {
            column,
            referenced_table,
            referenced_column,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let type_name = self.expect_identifier()?;
        let Some(data_type) = DataType::from_ddl_name(&type_name) else {
            return self.fail(format!("unknown data type '{type_name}'"));
        };
        let mut constraints = Vec::new();
        loop {
            let constraint = match self.current.as_keyword() {
                Some(Keyword::PrimaryKey) => ColumnConstraint::PrimaryKey,
                Some(Keyword::NotNull) => ColumnConstraint::NotNull,
                Some(Keyword::Unique) => ColumnConstraint::Unique,
                _ => break,
            };
            self.advance()?;
            constraints.push(constraint);
        }
        Ok(ColumnDef {
            name,
            data_type,
            constraints,
        })
    }

    // ---- ALTER TABLE ----

    fn parse_alter_table(&mut self) -> Result<AlterTableStatement> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;
        let mut operations = Vec::new();
        loop {
            if self.at_keyword(Keyword::Add) {
                self.advance()?;
                if self.at_keyword(Keyword::ForeignKey) {
                    operations.push(AlterOperation::AddForeignKey(
                        self.parse_foreign_key_clause()?,
                    ));
                } else {
                    self.expect_keyword(Keyword::Column)?;
                    operations.push(AlterOperation::AddColumn(self.parse_column_def()?));
                }
            } else if self.at_keyword(Keyword::Drop) {
                self.advance()?;
                self.expect_keyword(Keyword::Column)?;
                operations.push(AlterOperation::DropColumn(self.expect_identifier()?));
            } else if self.current.kind == TokenKind::EndOfQuery {
                break;
            } else {
                return self.fail(format!(
                    "expected ADD or DROP, found '{}'",
                    self.current.lexeme
                ));
            }
        }
        if operations.is_empty() {
            return self.fail("ALTER TABLE requires at least one operation");
        }
        self.expect_kind(TokenKind::EndOfQuery, "';'")?;
        Ok(AlterTableStatement { table, operations })
    }

    // ---- DROP TABLE ----

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;
        self.expect_kind(TokenKind::EndOfQuery, "';'")?;
        Ok(DropTableStatement { table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<Statement> {
        Parser::new(sql)?.parse_statement()
    }

    #[test]
    fn parses_select_star() {
        let stmt = parse("SELECT * FROM people;").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.columns, vec!["*".to_string()]);
                assert_eq!(s.table, "people");
                assert!(s.where_clause.is_none());
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn select_requires_at_least_one_column() {
        assert!(parse("SELECT FROM people;").is_err());
    }

    #[test]
    fn where_and_binds_tighter_than_or() {
        let stmt = parse("SELECT name FROM people WHERE id = 1 OR id = 2 AND name = 'Lin';").unwrap();
        let Statement::Select(s) = stmt else { panic!() };
        let or_group = s.where_clause.unwrap();
        assert_eq!(or_group.op, LogicalOp::Or);
        assert_eq!(or_group.children.len(), 2);
        let ConditionNode::Group(second) = &or_group.children[1] else { panic!() };
        assert_eq!(second.op, LogicalOp::And);
        assert_eq!(second.children.len(), 2);
    }

    #[test]
    fn parenthesized_where_overrides_precedence() {
        let stmt = parse(
            "SELECT name FROM people WHERE (id = 1 OR id = 2) AND name = 'Lin';",
        )
        .unwrap();
        let Statement::Select(s) = stmt else { panic!() };
        let or_wrapper = s.where_clause.unwrap();
        assert_eq!(or_wrapper.op, LogicalOp::Or);
        let ConditionNode::Group(and_group) = &or_wrapper.children[0] else { panic!() };
        assert_eq!(and_group.op, LogicalOp::And);
        assert_eq!(and_group.children.len(), 2);
        let ConditionNode::Group(inner) = &and_group.children[0] else { panic!() };
        assert_eq!(inner.op, LogicalOp::Or);
    }

    #[test]
    fn is_null_and_is_not_null_conditions() {
        let stmt = parse("SELECT name FROM people WHERE age IS_NULL;").unwrap();
        let Statement::Select(s) = stmt else { panic!() };
        let group = s.where_clause.unwrap();
        let ConditionNode::Group(and) = &group.children[0] else { panic!() };
        assert!(matches!(and.children[0], ConditionNode::Condition(Condition::IsNull { .. })));
    }

    #[test]
    fn parses_insert_with_explicit_columns() {
        let stmt = parse("INSERT INTO people (id, name) VALUES (1, 'Ada');").unwrap();
        let Statement::Insert(s) = stmt else { panic!() };
        assert_eq!(s.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(s.values.len(), 2);
    }

    #[test]
    fn parses_insert_with_positional_columns() {
        let stmt = parse("INSERT INTO people VALUES (1, 'Ada');").unwrap();
        let Statement::Insert(s) = stmt else { panic!() };
        assert!(s.columns.is_empty());
    }

    #[test]
    fn parses_create_table_with_primary_key_and_foreign_key() {
        let stmt = parse(
            "CREATE TABLE pets (pid INTEGER PRIMARY_KEY, owner INTEGER, FOREIGN_KEY owner REFERENCES people id);",
        )
        .unwrap();
        let Statement::CreateTable(s) = stmt else { panic!() };
        assert_eq!(s.columns.len(), 2);
        assert_eq!(s.foreign_keys.len(), 1);
        assert_eq!(s.foreign_keys[0].referenced_table, "people");
    }

    #[test]
    fn parses_alter_table_add_and_drop() {
        let stmt = parse("ALTER TABLE people ADD COLUMN age INTEGER;").unwrap();
        let Statement::AlterTable(s) = stmt else { panic!() };
        assert_eq!(s.operations.len(), 1);
        assert!(matches!(s.operations[0], AlterOperation::AddColumn(_)));

        let stmt = parse("ALTER TABLE people DROP COLUMN age;").unwrap();
        let Statement::AlterTable(s) = stmt else { panic!() };
        assert!(matches!(s.operations[0], AlterOperation::DropColumn(_)));
    }

    #[test]
    fn parses_drop_table() {
        let stmt = parse("DROP TABLE people;").unwrap();
        assert!(matches!(stmt, Statement::DropTable(_)));
    }

    #[test]
    fn unknown_data_type_is_a_parse_error() {
        assert!(parse("CREATE TABLE t (a NOTATYPE);").is_err());
    }

    #[test]
    fn unexpected_token_reports_parse_error() {
        let err = parse("SELECT * people;").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
