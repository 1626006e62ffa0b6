use crate::filter::{
    FilterError,
    lexer::{Token, TokenKind},
};

/// Arithmetic and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `and`, short-circuiting.
    And,
    /// `or`, short-circuiting.
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`, integer division.
    Div,
    /// `%`
    Rem,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A reference to a bound name.
    Name(String),
    /// A string literal.
    Str(String),
    /// An integer literal.
    Int(i64),
    /// `True` or `False`.
    Bool(bool),
    /// `None`.
    None,
    /// `[a, b, ...]`
    List(Vec<Expr>),
    /// `not x`
    Not(Box<Expr>),
    /// `-x`
    Neg(Box<Expr>),
    /// `x <op> y`
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `x <cmp> y`
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    /// `f(args)`
    Call(Box<Expr>, Vec<Expr>),
    /// `x[i]`
    Index(Box<Expr>, Box<Expr>),
    /// `x.name(args)`
    Method(Box<Expr>, String, Vec<Expr>),
}

impl Expr {
    /// Appends every name the expression refers to (variables, call targets
    /// and method names) to `names`, skipping ones already present.
    pub fn free_names(&self, names: &mut Vec<String>) {
        match self {
            Self::Name(name) => push_unique(names, name),
            Self::Str(_) | Self::Int(_) | Self::Bool(_) | Self::None => {}
            Self::List(items) => items.iter().for_each(|item| item.free_names(names)),
            Self::Not(inner) | Self::Neg(inner) => inner.free_names(names),
            Self::Binary(_, lhs, rhs) | Self::Compare(_, lhs, rhs) | Self::Index(lhs, rhs) => {
                lhs.free_names(names);
                rhs.free_names(names);
            }
            Self::Call(target, args) => {
                target.free_names(names);
                args.iter().for_each(|arg| arg.free_names(names));
            }
            Self::Method(target, name, args) => {
                target.free_names(names);
                push_unique(names, name);
                args.iter().for_each(|arg| arg.free_names(names));
            }
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|known| known == name) {
        names.push(name.to_string());
    }
}

const END: &TokenKind = &TokenKind::End;

/// How deeply brackets, calls and prefix operators may nest.
const MAX_DEPTH: usize = 64;

/// The longest token stream accepted. Binary chains nest as deeply as they
/// are long.
const MAX_TOKENS: usize = 1024;

/// Parses a token stream (ending in [`TokenKind::End`]) into an expression.
pub fn parse(tokens: &[Token]) -> Result<Expr, FilterError> {
    if tokens.len() > MAX_TOKENS {
        return Err(FilterError::Syntax {
            column: tokens.get(MAX_TOKENS).map_or(1, |token| token.column),
            message: format!("expression is longer than {MAX_TOKENS} tokens"),
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        TokenKind::End => Ok(expr),
        other => Err(parser.error(format!("unexpected {}", describe(other)))),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Name(name) => format!("name '{name}'"),
        TokenKind::Str(_) => "string".to_string(),
        TokenKind::Int(value) => format!("number {value}"),
        TokenKind::End => "end of expression".to_string(),
        other => format!("{other:?}"),
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map_or(END, |token| &token.kind)
    }

    fn column(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.column)
    }

    fn error(&self, message: impl Into<String>) -> FilterError {
        FilterError::Syntax {
            column: self.column(),
            message: message.into(),
        }
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Name(name) if name == keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), FilterError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {}", describe(self.peek()))))
        }
    }

    fn expr(&mut self) -> Result<Expr, FilterError> {
        self.nested(Self::or)
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, FilterError>,
    ) -> Result<Expr, FilterError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression is nested too deeply"));
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    fn or(&mut self) -> Result<Expr, FilterError> {
        let mut lhs = self.and()?;
        while self.is_keyword("or") {
            self.advance();
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, FilterError> {
        let mut lhs = self.not()?;
        while self.is_keyword("and") {
            self.advance();
            let rhs = self.not()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, FilterError> {
        if self.is_keyword("not") {
            self.advance();
            return Ok(Expr::Not(Box::new(self.nested(Self::not)?)));
        }
        self.compare()
    }

    fn compare_op(&self) -> Option<(CompareOp, usize)> {
        let op = match self.peek() {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Ge => CompareOp::Ge,
            TokenKind::Name(name) if name == "in" => CompareOp::In,
            TokenKind::Name(name)
                if name == "not" && matches!(self.peek_at(1), TokenKind::Name(n) if n == "in") =>
            {
                return Some((CompareOp::NotIn, 2));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn compare(&mut self) -> Result<Expr, FilterError> {
        let lhs = self.sum()?;
        let Some((op, width)) = self.compare_op() else {
            return Ok(lhs);
        };
        for _ in 0..width {
            self.advance();
        }
        let rhs = self.sum()?;
        if self.compare_op().is_some() {
            return Err(self.error("chained comparisons are not supported"));
        }
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn sum(&mut self) -> Result<Expr, FilterError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, FilterError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FilterError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Neg(Box::new(self.nested(Self::unary)?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, FilterError> {
        let mut expr = self.atom()?;
        loop {
            if self.eat(&TokenKind::LParen) {
                let args = self.args(&TokenKind::RParen, "')'")?;
                expr = Expr::Call(Box::new(expr), args);
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.expr()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat(&TokenKind::Dot) {
                let TokenKind::Name(name) = self.peek().clone() else {
                    return Err(self.error("expected method name after '.'"));
                };
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after method name")?;
                let args = self.args(&TokenKind::RParen, "')'")?;
                expr = Expr::Method(Box::new(expr), name, args);
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to `close`, which is consumed. A
    /// trailing comma is allowed.
    fn args(&mut self, close: &TokenKind, what: &str) -> Result<Vec<Expr>, FilterError> {
        let mut args = Vec::new();
        while !self.eat(close) {
            args.push(self.expr()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close, what)?;
                break;
            }
        }
        Ok(args)
    }

    fn atom(&mut self) -> Result<Expr, FilterError> {
        let expr = match self.peek().clone() {
            TokenKind::Name(name) => match name.as_str() {
                "True" => Expr::Bool(true),
                "False" => Expr::Bool(false),
                "None" => Expr::None,
                "and" | "or" | "not" | "in" => {
                    return Err(self.error(format!("unexpected keyword '{name}'")));
                }
                _ => Expr::Name(name),
            },
            TokenKind::Str(text) => Expr::Str(text),
            TokenKind::Int(value) => Expr::Int(value),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                return Ok(Expr::List(self.args(&TokenKind::RBracket, "']'")?));
            }
            other => return Err(self.error(format!("unexpected {}", describe(&other)))),
        };
        self.advance();
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::lexer::tokenize;

    fn parse_str(source: &str) -> Expr {
        parse(&tokenize(source).unwrap()).unwrap()
    }

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.to_string()))
    }

    #[test]
    fn precedence() {
        assert_eq!(
            parse_str("a or b and not c == 1 + 2 * 3"),
            Expr::Binary(
                BinaryOp::Or,
                name("a"),
                Box::new(Expr::Binary(
                    BinaryOp::And,
                    name("b"),
                    Box::new(Expr::Not(Box::new(Expr::Compare(
                        CompareOp::Eq,
                        name("c"),
                        Box::new(Expr::Binary(
                            BinaryOp::Add,
                            Box::new(Expr::Int(1)),
                            Box::new(Expr::Binary(
                                BinaryOp::Mul,
                                Box::new(Expr::Int(2)),
                                Box::new(Expr::Int(3)),
                            )),
                        )),
                    )))),
                )),
            )
        );
    }

    #[test]
    fn not_in() {
        assert_eq!(
            parse_str("a not in b"),
            Expr::Compare(CompareOp::NotIn, name("a"), name("b"))
        );
    }

    #[test]
    fn postfix_chain() {
        assert_eq!(
            parse_str("f(x)[0].startswith('a', )"),
            Expr::Method(
                Box::new(Expr::Index(
                    Box::new(Expr::Call(name("f"), vec![Expr::Name("x".into())])),
                    Box::new(Expr::Int(0)),
                )),
                "startswith".into(),
                vec![Expr::Str("a".into())],
            )
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            parse_str("[True, False, None, -1, []]"),
            Expr::List(vec![
                Expr::Bool(true),
                Expr::Bool(false),
                Expr::None,
                Expr::Neg(Box::new(Expr::Int(1))),
                Expr::List(vec![]),
            ])
        );
    }

    #[test]
    fn errors() {
        for source in ["", "a b", "a ==", "f(a b)", "a.1", "a < b < c", "and", "[1, 2"] {
            assert!(
                matches!(parse(&tokenize(source).unwrap()), Err(FilterError::Syntax { .. })),
                "{source}"
            );
        }
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let source = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        assert!(matches!(
            parse(&tokenize(&source).unwrap()),
            Err(FilterError::Syntax { .. })
        ));

        let negations = format!("{}1", "not ".repeat(100));
        assert!(matches!(
            parse(&tokenize(&negations).unwrap()),
            Err(FilterError::Syntax { .. })
        ));

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&tokenize(&shallow).unwrap()), Ok(Expr::Int(1)));
    }

    #[test]
    fn long_chains_are_a_syntax_error() {
        let source = vec!["a"; 2000].join(" or ");
        assert!(matches!(
            parse(&tokenize(&source).unwrap()),
            Err(FilterError::Syntax { .. })
        ));
    }
}
