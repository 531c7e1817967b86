//! Restricted expression lexer, AST, parser, and evaluator.
//!
//! This is the sandbox that field expressions are handed to after placeholder
//! substitution. The grammar is deliberately small: numeric and list
//! literals, arithmetic (`+ - * / // % **` and `@` for matrix multiply),
//! unary negation, calls to allow-listed functions, the `T`/`transpose`
//! attribute on arrays, and subscripting with multi-axis slices. Anything
//! else is rejected before it runs.
//!
//! Operator precedence (lowest → highest):
//!   additive  →  multiplicative  →  unary  →  power  →  postfix  →  primary

use crate::array::{AxisIndex, Indexed};
use crate::error::Error;
use crate::funcs;
use crate::value::{ArithOp, Value};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Name-resolution interface used by the evaluator.
///
/// The resolver implements this over its partially built result registry;
/// tests implement it over a plain map.
pub trait EvalContext {
    /// Look up a resolved field value.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Invoke an allow-listed function. Implementations should reject
    /// anything outside the fixed set with [`Error::CallNotAllowed`].
    fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, Error>;
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    At,
    Dot,

    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// Unrecognised input byte — surfaces as a grammar rejection.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.src.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn digits_into(&mut self, s: &mut String) {
        while let Some(c @ b'0'..=b'9') = self.peek() {
            s.push(c as char);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: u8) -> Token {
        let mut s = String::new();
        s.push(first as char);
        let mut is_float = first == b'.';

        self.digits_into(&mut s);
        if !is_float && self.peek() == Some(b'.') {
            is_float = true;
            s.push('.');
            self.pos += 1;
            self.digits_into(&mut s);
        }
        if matches!(self.peek(), Some(b'e' | b'E'))
            && matches!(self.peek2(), Some(b'0'..=b'9' | b'+' | b'-'))
        {
            is_float = true;
            s.push('e');
            self.pos += 1;
            if let Some(sign @ (b'+' | b'-')) = self.peek() {
                s.push(sign as char);
                self.pos += 1;
            }
            self.digits_into(&mut s);
        }

        if is_float {
            Token::Float(s.parse().unwrap_or(0.0))
        } else {
            // Overlong integer literals degrade to float rather than failing.
            match s.parse::<i64>() {
                Ok(n) => Token::Int(n),
                Err(_) => Token::Float(s.parse().unwrap_or(0.0)),
            }
        }
    }

    // Delimiters and escapes are ASCII, so multi-byte sequences pass
    // through whole; the bytes stay valid UTF-8.
    fn read_string(&mut self, quote: u8) -> Token {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None => break,
                Some(b'\\') => match self.advance() {
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(c) => bytes.push(c),
                    None => break,
                },
                Some(c) if c == quote => break,
                Some(c) => bytes.push(c),
            }
        }
        Token::Str(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_ident(&mut self, first: u8) -> Token {
        let mut s = String::new();
        s.push(first as char);
        while let Some(c @ (b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) = self.peek() {
            s.push(c as char);
            self.pos += 1;
        }
        Token::Ident(s)
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Token::Eof,
            Some(c) => c,
        };

        match ch {
            b'0'..=b'9' => self.read_number(ch),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => self.read_number(ch),
            b'"' => self.read_string(b'"'),
            b'\'' => self.read_string(b'\''),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_ident(ch),
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => {
                if self.eat(b'*') {
                    Token::StarStar
                } else {
                    Token::Star
                }
            }
            b'/' => {
                if self.eat(b'/') {
                    Token::SlashSlash
                } else {
                    Token::Slash
                }
            }
            b'%' => Token::Percent,
            b'@' => Token::At,
            b'.' => Token::Dot,
            b',' => Token::Comma,
            b':' => Token::Colon,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            c => Token::Unknown(c as char),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Neg(Box<Expr>),
    Binary(ArithOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Attr(Box<Expr>, String),
    Index(Box<Expr>, Vec<Subscript>),
}

/// One comma-separated part of a subscript.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Item(Expr),
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                Token::SlashSlash => ArithOp::FloorDiv,
                Token::Percent => ArithOp::Rem,
                Token::At => ArithOp::MatMul,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if self.eat(&Token::Minus) {
            Ok(Expr::Neg(Box::new(self.parse_unary()?)))
        } else {
            self.parse_power()
        }
    }

    fn parse_power(&mut self) -> Result<Expr, Error> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::StarStar) {
            // Right-associative; the exponent may carry its own unary minus.
            let exp = self.parse_unary()?;
            Ok(Expr::Binary(ArithOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut e = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.advance() {
                    Token::Ident(attr) => e = Expr::Attr(Box::new(e), attr),
                    other => {
                        return Err(Error::UnsupportedExpression(format!(
                            "expected attribute name after '.', got {other:?}"
                        )))
                    }
                }
            } else if self.eat(&Token::LBracket) {
                let subs = self.parse_subscripts()?;
                if !self.eat(&Token::RBracket) {
                    return Err(Error::UnsupportedExpression("expected ']'".into()));
                }
                e = Expr::Index(Box::new(e), subs);
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_subscripts(&mut self) -> Result<Vec<Subscript>, Error> {
        let mut subs = vec![self.parse_subscript()?];
        while self.eat(&Token::Comma) {
            subs.push(self.parse_subscript()?);
        }
        Ok(subs)
    }

    fn parse_subscript(&mut self) -> Result<Subscript, Error> {
        let at_bound = |t: &Token| {
            matches!(t, Token::Colon | Token::Comma | Token::RBracket)
        };
        let start = if at_bound(self.peek()) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        if !self.eat(&Token::Colon) {
            return match start {
                Some(e) => Ok(Subscript::Item(*e)),
                None => Err(Error::UnsupportedExpression("empty subscript".into())),
            };
        }
        let stop = if at_bound(self.peek()) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let step = if self.eat(&Token::Colon) {
            if at_bound(self.peek()) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            }
        } else {
            None
        };
        Ok(Subscript::Slice { start, stop, step })
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.advance();
        match tok {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        args.push(self.parse_expr()?);
                        while self.eat(&Token::Comma) {
                            args.push(self.parse_expr()?);
                        }
                    }
                    if !self.eat(&Token::RParen) {
                        return Err(Error::UnsupportedExpression(format!(
                            "expected ')' after args to {name}"
                        )));
                    }
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if self.peek() != &Token::RBracket {
                    items.push(self.parse_expr()?);
                    while self.eat(&Token::Comma) {
                        if self.peek() == &Token::RBracket {
                            break; // trailing comma
                        }
                        items.push(self.parse_expr()?);
                    }
                }
                if !self.eat(&Token::RBracket) {
                    return Err(Error::UnsupportedExpression("expected ']'".into()));
                }
                Ok(Expr::List(items))
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(Error::UnsupportedExpression("expected ')'".into()));
                }
                Ok(inner)
            }
            Token::Unknown(c) => Err(Error::UnsupportedExpression(format!(
                "unexpected character {c:?}"
            ))),
            other => Err(Error::UnsupportedExpression(format!(
                "unexpected token {other:?}"
            ))),
        }
    }
}

/// Parse an expression string into an AST.
pub fn parse(src: &str) -> Result<Expr, Error> {
    let tokens = Lexer::new(src).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    if parser.peek() != &Token::Eof {
        return Err(Error::UnsupportedExpression(format!(
            "unexpected trailing token {:?}",
            parser.peek()
        )));
    }
    Ok(expr)
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] against the given context.
pub fn eval(expr: &Expr, ctx: &dyn EvalContext) -> Result<Value, Error> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        // Allow-listed constants shadow fields, as the fixed context is
        // layered on top of the user registry.
        Expr::Name(name) => funcs::constant(name)
            .or_else(|| ctx.lookup(name))
            .ok_or_else(|| Error::NameUndefined(name.clone())),

        Expr::List(items) => {
            let mut vals = Vec::with_capacity(items.len());
            for item in items {
                vals.push(eval(item, ctx)?);
            }
            Ok(Value::Seq(vals))
        }

        Expr::Neg(inner) => eval(inner, ctx)?.neg(),

        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            Value::binary(*op, &l, &r)
        }

        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for ae in arg_exprs {
                args.push(eval(ae, ctx)?);
            }
            ctx.call(name, args)
        }

        Expr::Attr(base, attr) => {
            let v = eval(base, ctx)?;
            match (v.to_array(), attr.as_str()) {
                (Some(a), "T" | "transpose") => Ok(Value::Array(a.transpose())),
                _ => Err(Error::AttributeNotAllowed(attr.clone())),
            }
        }

        Expr::Index(base, subs) => {
            let v = eval(base, ctx)?;
            eval_index(&v, subs, ctx)
        }
    }
}

fn eval_index(base: &Value, subs: &[Subscript], ctx: &dyn EvalContext) -> Result<Value, Error> {
    match base {
        Value::Array(a) => {
            let mut axes = Vec::with_capacity(subs.len());
            for s in subs {
                axes.push(eval_axis(s, ctx)?);
            }
            match a.index(&axes)? {
                Indexed::Scalar(x) => Ok(Value::Float(x)),
                Indexed::Array(arr) => Ok(Value::Array(arr)),
            }
        }
        Value::Seq(items) => {
            if subs.len() != 1 {
                return Err(Error::Evaluation(
                    "sequences take a single subscript".into(),
                ));
            }
            match eval_axis(&subs[0], ctx)? {
                AxisIndex::At(i) => {
                    let len = items.len() as i64;
                    let pos = if i < 0 { i + len } else { i };
                    if !(0..len).contains(&pos) {
                        return Err(Error::Evaluation(format!(
                            "index {i} out of range for sequence of length {len}"
                        )));
                    }
                    Ok(items[pos as usize].clone())
                }
                AxisIndex::Span { .. } => {
                    // Delegate the span arithmetic to a throwaway 1-D array of
                    // positions, then gather.
                    let axes = [eval_axis(&subs[0], ctx)?];
                    let positions = crate::array::NdArray::from_vec(
                        (0..items.len()).map(|i| i as f64).collect(),
                    );
                    match positions.index(&axes)? {
                        Indexed::Array(picked) => Ok(Value::Seq(
                            picked
                                .data()
                                .iter()
                                .map(|&p| items[p as usize].clone())
                                .collect(),
                        )),
                        Indexed::Scalar(_) => unreachable!("span keeps its axis"),
                    }
                }
            }
        }
        other => Err(Error::Evaluation(format!(
            "{} is not subscriptable",
            other.type_name()
        ))),
    }
}

fn eval_axis(sub: &Subscript, ctx: &dyn EvalContext) -> Result<AxisIndex, Error> {
    let as_int = |e: &Expr| -> Result<i64, Error> {
        match eval(e, ctx)? {
            Value::Int(n) => Ok(n),
            Value::Float(x) if x.fract() == 0.0 => Ok(x as i64),
            other => Err(Error::Evaluation(format!(
                "subscript must be an integer, got {}",
                other.type_name()
            ))),
        }
    };
    match sub {
        Subscript::Item(e) => Ok(AxisIndex::At(as_int(e)?)),
        Subscript::Slice { start, stop, step } => Ok(AxisIndex::Span {
            start: start.as_deref().map(&as_int).transpose()?,
            stop: stop.as_deref().map(&as_int).transpose()?,
            step: step.as_deref().map(&as_int).transpose()?,
        }),
    }
}

/// Convenience: parse and evaluate an expression string.
pub fn eval_str(src: &str, ctx: &dyn EvalContext) -> Result<Value, Error> {
    let expr = parse(src)?;
    eval(&expr, ctx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use std::collections::HashMap;

    struct TestCtx {
        vars: HashMap<String, Value>,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx { vars: HashMap::new() }
        }
        fn with(mut self, k: &str, v: Value) -> Self {
            self.vars.insert(k.into(), v);
            self
        }
    }

    impl EvalContext for TestCtx {
        fn lookup(&self, name: &str) -> Option<Value> {
            self.vars.get(name).cloned()
        }
        fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
            funcs::call_allowed(name, args)
                .unwrap_or_else(|| Err(Error::CallNotAllowed(name.to_owned())))
        }
    }

    fn ev(src: &str) -> Value {
        eval_str(src, &TestCtx::new()).expect("eval failed")
    }

    fn ev_ctx(src: &str, ctx: &TestCtx) -> Value {
        eval_str(src, ctx).expect("eval failed")
    }

    #[test]
    fn literals() {
        assert_eq!(ev("42"), Value::Int(42));
        assert_eq!(ev("2.5"), Value::Float(2.5));
        assert_eq!(ev("\"hi\""), Value::Text("hi".into()));
        assert_eq!(ev("[1, 2.0, \"x\"]"),
            Value::Seq(vec![Value::Int(1), Value::Float(2.0), Value::Text("x".into())]));
    }

    #[test]
    fn non_ascii_string_literal() {
        assert_eq!(ev("\"héllo\""), Value::Text("héllo".into()));
        assert_eq!(
            ev("\"héllo\" + \" wörld\""),
            Value::Text("héllo wörld".into())
        );
    }

    #[test]
    fn precedence() {
        assert_eq!(ev("2 + 3 * 4"), Value::Int(14));
        assert_eq!(ev("(2 + 3) * 4"), Value::Int(20));
        assert_eq!(ev("2 ** 3 ** 2"), Value::Int(512)); // right-assoc
        assert_eq!(ev("-2 ** 2"), Value::Int(-4)); // power binds tighter
    }

    #[test]
    fn floor_div_and_rem() {
        assert_eq!(ev("10 // 3"), Value::Int(3));
        assert_eq!(ev("10 % 3"), Value::Int(1));
    }

    #[test]
    fn name_lookup() {
        let ctx = TestCtx::new().with("x", Value::Int(7));
        assert_eq!(ev_ctx("x + 1", &ctx), Value::Int(8));
    }

    #[test]
    fn undefined_name() {
        let err = eval_str("nope + 1", &TestCtx::new()).unwrap_err();
        assert_eq!(err, Error::NameUndefined("nope".into()));
    }

    #[test]
    fn constants_available() {
        match ev("pi") {
            Value::Float(x) => assert!((x - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn allowed_call() {
        match ev("sin(0)") {
            Value::Float(x) => assert!(x.abs() < 1e-12),
            other => panic!("expected float, got {other:?}"),
        }
        assert_eq!(ev("pow(2, 10)"), Value::Float(1024.0));
    }

    #[test]
    fn call_not_allowed() {
        let err = eval_str("system(\"rm\")", &TestCtx::new()).unwrap_err();
        assert_eq!(err, Error::CallNotAllowed("system".into()));
    }

    #[test]
    fn attribute_allow_list() {
        let row = NdArray::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let ctx = TestCtx::new().with("b", Value::Array(row));
        match ev_ctx("b.T", &ctx) {
            Value::Array(a) => assert_eq!(a.shape(), &[2, 1]),
            other => panic!("expected array, got {other:?}"),
        }
        // Same through the long name.
        match ev_ctx("b.transpose", &ctx) {
            Value::Array(a) => assert_eq!(a.shape(), &[2, 1]),
            other => panic!("expected array, got {other:?}"),
        }
        let err = eval_str("b.shape", &ctx).unwrap_err();
        assert_eq!(err, Error::AttributeNotAllowed("shape".into()));
    }

    #[test]
    fn matmul_through_attr() {
        let row = NdArray::from_rows(vec![vec![1.0, 0.5]]).unwrap();
        let ctx = TestCtx::new().with("b", Value::Array(row));
        match ev_ctx("b.T @ b", &ctx) {
            Value::Array(a) => assert_eq!(a.shape(), &[2, 2]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn seq_indexing() {
        let ctx = TestCtx::new().with(
            "a",
            Value::Seq(vec![Value::Int(0), Value::Int(1), Value::Int(2)]),
        );
        assert_eq!(ev_ctx("a[1]", &ctx), Value::Int(1));
        assert_eq!(ev_ctx("a[-1]", &ctx), Value::Int(2));
        assert_eq!(
            ev_ctx("a[0:2]", &ctx),
            Value::Seq(vec![Value::Int(0), Value::Int(1)])
        );
        assert!(eval_str("a[9]", &ctx).is_err());
    }

    #[test]
    fn array_multi_axis() {
        let m = NdArray::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let ctx = TestCtx::new().with("m", Value::Array(m));
        assert_eq!(ev_ctx("m[0, 1]", &ctx), Value::Float(2.0));
        match ev_ctx("m[:, 1]", &ctx) {
            Value::Array(a) => assert_eq!(a.data(), &[2.0, 4.0]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn grammar_rejections() {
        assert!(matches!(parse("x = 1"), Err(Error::UnsupportedExpression(_))));
        assert!(matches!(parse("a ? b : c"), Err(Error::UnsupportedExpression(_))));
        assert!(matches!(parse("1 + "), Err(Error::UnsupportedExpression(_))));
        assert!(matches!(
            parse("the result is: 1"),
            Err(Error::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn trailing_comma_in_list() {
        assert_eq!(ev("[1, 2,]"), Value::Seq(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn division_by_zero_is_error() {
        assert!(matches!(eval_str("1/0", &TestCtx::new()), Err(Error::Evaluation(_))));
    }
}
