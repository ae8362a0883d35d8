//! Row filters for interval tables.
//!
//! A query compares columns with literals and combines the comparisons:
//!
//! ```text
//! size > 20 and size < 30
//! chromosome == 'chrX' or not (group != "A")
//! ```
//!
//! Comparisons against a number parse the cell as a number; a cell that is
//! empty or not numeric only satisfies `!=`. Comparisons against a quoted
//! string compare the raw cell text.

use std::cmp::Ordering;

use crate::error::{AvtadIoError, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (CompareOp::Ne, None) => true,
            (_, None) => false,
            (CompareOp::Eq, Some(o)) => o == Ordering::Equal,
            (CompareOp::Ne, Some(o)) => o != Ordering::Equal,
            (CompareOp::Lt, Some(o)) => o == Ordering::Less,
            (CompareOp::Le, Some(o)) => o != Ordering::Greater,
            (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
            (CompareOp::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Literal),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Compare {
        column: String,
        op: CompareOp,
        value: Literal,
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
}

///
/// A parsed row filter.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    root: Node,
}

fn invalid(query: &str, reason: impl Into<String>) -> AvtadIoError {
    AvtadIoError::InvalidQuery {
        query: query.to_string(),
        reason: reason.into(),
    }
}

fn tokenize(query: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' => {
                tokens.push(Token::And);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Or);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' | '!' | '<' | '>' => {
                let two_char = chars.get(i + 1) == Some(&'=');
                let op = match (c, two_char) {
                    ('=', true) => CompareOp::Eq,
                    ('!', true) => CompareOp::Ne,
                    ('<', true) => CompareOp::Le,
                    ('>', true) => CompareOp::Ge,
                    ('<', false) => CompareOp::Lt,
                    ('>', false) => CompareOp::Gt,
                    _ => return Err(invalid(query, format!("unexpected '{}' at position {}", c, i))),
                };
                tokens.push(Token::Op(op));
                i += if two_char { 2 } else { 1 };
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| invalid(query, format!("unterminated string at position {}", i)))?;
                let text: String = chars[i + 1..i + 1 + end].iter().collect();
                tokens.push(Token::Literal(Literal::Text(text)));
                i += end + 2;
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric()
                        || chars[i] == '.'
                        || ((chars[i] == '-' || chars[i] == '+') && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| invalid(query, format!("bad number {:?} at position {}", text, start)))?;
                tokens.push(Token::Literal(Literal::Number(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(invalid(query, format!("unexpected '{}' at position {}", other, i))),
        }
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses, `not` or `and`/`or` chains accepted.
pub const MAX_QUERY_DEPTH: usize = 256;

/// Parse rules return the height of the tree they built, capped at
/// [MAX_QUERY_DEPTH] together with the parser's own recursion.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn too_deep(&self) -> AvtadIoError {
        invalid(self.source, format!("nested deeper than {} levels", MAX_QUERY_DEPTH))
    }

    fn checked(&self, node: Node, height: usize) -> Result<(Node, usize)> {
        if height > MAX_QUERY_DEPTH {
            return Err(self.too_deep());
        }
        Ok((node, height))
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_QUERY_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn or(&mut self) -> Result<(Node, usize)> {
        let (mut lhs, mut height) = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let (rhs, rh) = self.and()?;
            (lhs, height) = self.checked(Node::Or(Box::new(lhs), Box::new(rhs)), height.max(rh) + 1)?;
        }
        Ok((lhs, height))
    }

    fn and(&mut self) -> Result<(Node, usize)> {
        let (mut lhs, mut height) = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let (rhs, rh) = self.not()?;
            (lhs, height) = self.checked(Node::And(Box::new(lhs), Box::new(rhs)), height.max(rh) + 1)?;
        }
        Ok((lhs, height))
    }

    fn not(&mut self) -> Result<(Node, usize)> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            self.descend()?;
            let (inner, height) = self.not()?;
            self.depth -= 1;
            return self.checked(Node::Not(Box::new(inner)), height + 1);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<(Node, usize)> {
        match self.next() {
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.or()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(invalid(self.source, "missing closing parenthesis")),
                }
            }
            Some(Token::Ident(column)) => {
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    _ => return Err(invalid(self.source, format!("expected a comparison after {}", column))),
                };
                let value = match self.next() {
                    Some(Token::Literal(value)) => value,
                    _ => return Err(invalid(self.source, format!("expected a literal to compare {} with", column))),
                };
                Ok((Node::Compare { column, op, value }, 1))
            }
            _ => Err(invalid(self.source, "expected a column name, 'not' or '('")),
        }
    }
}

impl Query {
    pub fn parse(source: &str) -> Result<Query> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
            depth: 0,
        };
        let (root, _) = parser.or()?;
        if parser.pos < parser.tokens.len() {
            return Err(invalid(source, "unexpected trailing tokens"));
        }
        Ok(Query {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Column names the query refers to, in order of appearance.
    pub fn columns(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a Node, out: &mut Vec<&'a str>) {
            match node {
                Node::Compare { column, .. } => out.push(column),
                Node::And(a, b) | Node::Or(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
                Node::Not(inner) => walk(inner, out),
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    ///
    /// Resolve column names against a table.
    pub fn bind(&self, table: &Table) -> Result<BoundQuery<'_>> {
        let columns = self
            .columns()
            .iter()
            .map(|name| table.column(name))
            .collect::<Result<Vec<usize>>>()?;
        Ok(BoundQuery {
            root: &self.root,
            columns,
        })
    }
}

///
/// A query whose columns have been resolved to positions in one table.
///
pub struct BoundQuery<'a> {
    root: &'a Node,
    /// Column positions in the order [Query::columns] lists them.
    columns: Vec<usize>,
}

impl BoundQuery<'_> {
    pub fn matches(&self, table: &Table, row: usize) -> bool {
        let mut next_column = 0;
        self.eval(self.root, table, row, &mut next_column)
    }

    fn eval(&self, node: &Node, table: &Table, row: usize, next_column: &mut usize) -> bool {
        match node {
            Node::Compare { op, value, .. } => {
                let cell = table.cell(row, self.columns[*next_column]);
                *next_column += 1;
                let ordering = match value {
                    Literal::Number(n) => cell.parse::<f64>().ok().and_then(|v| v.partial_cmp(n)),
                    Literal::Text(s) => Some(cell.cmp(s.as_str())),
                };
                op.holds(ordering)
            }
            // both sides are always visited so column positions stay in step
            Node::And(a, b) => {
                let left = self.eval(a, table, row, next_column);
                let right = self.eval(b, table, row, next_column);
                left && right
            }
            Node::Or(a, b) => {
                let left = self.eval(a, table, row, next_column);
                let right = self.eval(b, table, row, next_column);
                left || right
            }
            Node::Not(inner) => !self.eval(inner, table, row, next_column),
        }
    }
}
