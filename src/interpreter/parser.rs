use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenKind};
use super::error::SyntaxError;
use std::rc::Rc;
use tracing::{debug, trace};

const MAX_ARGUMENTS: usize = 255;

type ParseStep<T> = Result<T, SyntaxError>;

#[derive(Debug)]
pub struct ParseResult {
    pub statements: Vec<Stmt>,
    pub errors: Vec<SyntaxError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Recursive-descent parser. Errors are collected rather than returned: a
/// statement that fails is skipped and parsing resumes at the next statement
/// boundary.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SyntaxError>,
    loop_depth: usize,
    function_depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, offset) = tokens.last().map_or((1, 0), |t| (t.line, t.span.end));
            tokens.push(Token::eof(line, offset));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            loop_depth: 0,
            function_depth: 0,
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        debug!(statements = statements.len(), errors = self.errors.len(), "parsed program");
        ParseResult {
            statements,
            errors: self.errors,
        }
    }

    // ---- token cursor ----

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.current + 1).is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|&kind| self.check(kind)) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseStep<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::at(self.peek(), message))
        }
    }

    /// Record an error without unwinding the current statement.
    fn report(&mut self, token: &Token, message: impl Into<String>) {
        let error = SyntaxError::at(token, message);
        trace!(line = error.line, message = %error.message, "syntax error");
        self.errors.push(error);
    }

    /// Skip to the start of the next statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Let
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn in_loop<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        self.loop_depth += 1;
        let result = parse(self);
        self.loop_depth -= 1;
        result
    }

    fn in_function<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let result = parse(self);
        self.function_depth -= 1;
        self.loop_depth = enclosing_loops;
        result
    }

    // ---- statements ----

    /// Parse one declaration, or `None` if any error was reported inside it.
    fn declaration(&mut self) -> Option<Stmt> {
        let errors_before = self.errors.len();
        let result = if self.match_kind(&[TokenKind::Class]) {
            self.class_declaration()
        } else if self.check(TokenKind::Fun) && self.check_next(TokenKind::Identifier) {
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.match_kind(&[TokenKind::Let]) {
            self.let_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) if self.errors.len() == errors_before => Some(stmt),
            Ok(_) => None,
            Err(error) => {
                trace!(line = error.line, message = %error.message, "syntax error");
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseStep<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;
        let superclass = if self.match_kind(&[TokenKind::Less]) {
            let name = self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable { name })
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> ParseStep<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {} name.", kind))?;
        self.function_body(Some(name), kind, &format!("Expect '(' after {} name.", kind))
    }

    fn function_body(&mut self, name: Option<Token>, kind: &str, open_paren: &str) -> ParseStep<Rc<FunctionDecl>> {
        self.consume(TokenKind::LeftParen, open_paren)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {} body.", kind))?;
        let body = self.in_function(|parser| parser.block())?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn let_declaration(&mut self) -> ParseStep<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Let { name, initializer })
    }

    fn statement(&mut self) -> ParseStep<Stmt> {
        match self.peek().kind {
            TokenKind::For => {
                self.advance();
                self.for_statement()
            }
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::Print => {
                self.advance();
                let value = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Stmt::Print(value))
            }
            TokenKind::Return => {
                let keyword = self.advance();
                self.return_statement(keyword)
            }
            TokenKind::While => {
                self.advance();
                self.while_statement()
            }
            TokenKind::Break | TokenKind::Continue => {
                let keyword = self.advance();
                self.loop_jump(keyword)
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            _ => self.expression_statement(),
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) body <then incr> }`.
    fn for_statement(&mut self) -> ParseStep<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_kind(&[TokenKind::Semicolon]) {
            None
        } else if self.match_kind(&[TokenKind::Let]) {
            Some(self.let_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(Literal::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = self.in_loop(|parser| parser.statement())?;
        let looped = Stmt::While {
            condition,
            body: Box::new(body),
            increment,
        };

        Ok(match initializer {
            Some(initializer) => Stmt::Block(vec![initializer, looped]),
            None => looped,
        })
    }

    fn if_statement(&mut self) -> ParseStep<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn return_statement(&mut self, keyword: Token) -> ParseStep<Stmt> {
        if self.function_depth == 0 {
            self.report(&keyword, "Can't return from top-level code.");
        }
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> ParseStep<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = self.in_loop(|parser| parser.statement())?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
            increment: None,
        })
    }

    fn loop_jump(&mut self, keyword: Token) -> ParseStep<Stmt> {
        if self.loop_depth == 0 {
            let message = format!("Can't use '{}' outside of a loop.", keyword.lexeme);
            self.report(&keyword, message);
        }
        self.consume(TokenKind::Semicolon, &format!("Expect ';' after '{}'.", keyword.lexeme))?;
        Ok(if keyword.kind == TokenKind::Break {
            Stmt::Break { keyword }
        } else {
            Stmt::Continue { keyword }
        })
    }

    fn block(&mut self) -> ParseStep<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseStep<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions, lowest precedence first ----

    fn expression(&mut self) -> ParseStep<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> ParseStep<Expr> {
        let mut expr = self.assignment()?;
        while self.match_kind(&[TokenKind::Comma]) {
            let operator = self.previous().clone();
            let right = self.assignment()?;
            expr = Expr::Comma {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn assignment(&mut self) -> ParseStep<Expr> {
        let expr = self.conditional()?;

        if self.match_kind(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);
            return Ok(match expr {
                Expr::Variable { name } => Expr::Assign { name, value },
                Expr::Get { object, name } => Expr::Set { object, name, value },
                other => {
                    self.report(&equals, "Invalid assignment target.");
                    other
                }
            });
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> ParseStep<Expr> {
        let condition = self.or()?;

        if self.match_kind(&[TokenKind::Question]) {
            let then_branch = self.expression()?;
            self.consume(TokenKind::Colon, "Expect ':' after then branch of conditional expression.")?;
            let else_branch = self.conditional()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn or(&mut self) -> ParseStep<Expr> {
        let mut expr = self.and()?;
        while self.match_kind(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseStep<Expr> {
        let mut expr = self.equality()?;
        while self.match_kind(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    /// One left-associative binary level: `next (op next)*`.
    fn binary_level(&mut self, operators: &[TokenKind], next: fn(&mut Self) -> ParseStep<Expr>) -> ParseStep<Expr> {
        let mut expr = next(self)?;
        while self.match_kind(operators) {
            let operator = self.previous().clone();
            let right = next(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseStep<Expr> {
        self.binary_level(&[TokenKind::BangEqual, TokenKind::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseStep<Expr> {
        self.binary_level(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseStep<Expr> {
        self.binary_level(&[TokenKind::Minus, TokenKind::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseStep<Expr> {
        self.binary_level(&[TokenKind::Slash, TokenKind::Star], Self::unary)
    }

    fn unary(&mut self) -> ParseStep<Expr> {
        if self.match_kind(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ParseStep<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_kind(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseStep<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.report(&token, "Can't have more than 255 arguments.");
                }
                arguments.push(self.assignment()?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseStep<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(Literal::Nil))
            }
            TokenKind::Number | TokenKind::String => {
                self.advance();
                Ok(Expr::Literal(token.literal.unwrap_or(Literal::Nil)))
            }
            TokenKind::Super => {
                self.advance();
                self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
                let method = self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
                Ok(Expr::Super { keyword: token, method })
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr::This { keyword: token })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Variable { name: token })
            }
            TokenKind::Fun => {
                self.advance();
                let declaration = self.function_body(None, "function", "Expect '(' after 'fun'.")?;
                Ok(Expr::AnonymousFunction(declaration))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            TokenKind::BangEqual
            | TokenKind::EqualEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Plus
            | TokenKind::Slash
            | TokenKind::Star
            | TokenKind::Comma
            | TokenKind::Question
            | TokenKind::And
            | TokenKind::Or => {
                self.advance();
                self.missing_left_operand(token)
            }
            _ => Err(SyntaxError::at(&token, "Expect expression.")),
        }
    }

    /// `operator` showed up where an operand was expected. Report it, then
    /// parse and throw away what would have been its right operand so the
    /// rest of the statement lines up.
    fn missing_left_operand(&mut self, operator: Token) -> ParseStep<Expr> {
        let message = format!("Binary operator '{}' appears without a left-hand operand.", operator.lexeme);
        self.report(&operator, message);

        match operator.kind {
            TokenKind::Comma => {
                self.assignment()?;
            }
            TokenKind::Question => {
                self.expression()?;
                if self.match_kind(&[TokenKind::Colon]) {
                    self.conditional()?;
                }
            }
            TokenKind::Or => {
                self.and()?;
            }
            TokenKind::And => {
                self.equality()?;
            }
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                self.comparison()?;
            }
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => {
                self.term()?;
            }
            TokenKind::Plus => {
                self.factor()?;
            }
            _ => {
                self.unary()?;
            }
        }

        Ok(Expr::Literal(Literal::Nil))
    }
}

/// Convenience wrapper for callers holding a token vector.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::scan;
    use pretty_assertions::assert_eq;

    fn parse_source(source: &str) -> ParseResult {
        let scanned = scan(source);
        assert!(scanned.is_ok(), "scan errors: {:?}", scanned.errors);
        parse(scanned.tokens)
    }

    /// Parenthesized prefix form, for checking tree shape.
    fn show(expr: &Expr) -> String {
        match expr {
            Expr::Literal(Literal::String(s)) => format!("\"{}\"", s),
            Expr::Literal(literal) => literal.to_string(),
            Expr::Variable { name } => name.lexeme.to_string(),
            Expr::Assign { name, value } => format!("(= {} {})", name.lexeme, show(value)),
            Expr::Binary { left, operator, right }
            | Expr::Logical { left, operator, right }
            | Expr::Comma { left, operator, right } => {
                format!("({} {} {})", operator.lexeme, show(left), show(right))
            }
            Expr::Unary { operator, right } => format!("({} {})", operator.lexeme, show(right)),
            Expr::Grouping(inner) => format!("(group {})", show(inner)),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!("(? {} {} {})", show(condition), show(then_branch), show(else_branch)),
            Expr::Call { callee, arguments, .. } => {
                let args: Vec<String> = arguments.iter().map(show).collect();
                format!("(call {} [{}])", show(callee), args.join(" "))
            }
            Expr::AnonymousFunction(decl) => format!("(fun/{})", decl.params.len()),
            Expr::Get { object, name } => format!("(. {} {})", show(object), name.lexeme),
            Expr::Set { object, name, value } => format!("(.= {} {} {})", show(object), name.lexeme, show(value)),
            Expr::This { .. } => "this".to_string(),
            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    fn expr_of(source: &str) -> String {
        let result = parse_source(source);
        assert!(result.is_ok(), "parse errors: {:?}", result.errors);
        match &result.statements[..] {
            [Stmt::Expression(expr)] => show(expr),
            other => panic!("expected one expression statement, got {:?}", other),
        }
    }

    fn messages(source: &str) -> Vec<String> {
        parse_source(source)
            .errors
            .iter()
            .map(|e| e.to_diagnostic().to_string())
            .collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expr_of("1 + 2 * 3;"), "(+ 1 (* 2 3))");
        assert_eq!(expr_of("(1 + 2) * 3;"), "(* (group (+ 1 2)) 3)");
        assert_eq!(expr_of("-a - b;"), "(- (- a) b)");
        assert_eq!(expr_of("!true == false;"), "(== (! true) false)");
        assert_eq!(expr_of("1 < 2 == 3 >= 4;"), "(== (< 1 2) (>= 3 4))");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(expr_of("1 - 2 - 3;"), "(- (- 1 2) 3)");
        assert_eq!(expr_of("8 / 4 / 2;"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_logical_binds_looser_than_equality() {
        assert_eq!(expr_of("a or b and c == d;"), "(or a (and b (== c d)))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(expr_of("a = b = 3;"), "(= a (= b 3))");
        assert_eq!(expr_of("obj.field = 1;"), "(.= obj field 1)");
    }

    #[test]
    fn test_conditional() {
        assert_eq!(expr_of("a ? b : c;"), "(? a b c)");
        assert_eq!(expr_of("a ? b : c ? d : e;"), "(? a b (? c d e))");
        assert_eq!(expr_of("x = a or b ? 1 : 2;"), "(= x (? (or a b) 1 2))");
    }

    #[test]
    fn test_comma_is_lowest() {
        assert_eq!(expr_of("a = 1, b = 2;"), "(, (= a 1) (= b 2))");
    }

    #[test]
    fn test_call_arguments_split_on_comma() {
        assert_eq!(expr_of("f(1, 2)(3);"), "(call (call f [1 2]) [3])");
        assert_eq!(expr_of("a.b.c();"), "(call (. (. a b) c) [])");
    }

    #[test]
    fn test_anonymous_function() {
        assert_eq!(expr_of("fun (a, b) { return a; };"), "(fun/2)");
    }

    #[test]
    fn test_for_desugars_to_while() {
        let result = parse_source("for (let i = 0; i < 3; i = i + 1) print i;");
        assert!(result.is_ok());
        let Stmt::Block(parts) = &result.statements[0] else {
            panic!("expected block, got {:?}", result.statements[0]);
        };
        assert!(matches!(parts[0], Stmt::Let { .. }));
        let Stmt::While { condition, increment, .. } = &parts[1] else {
            panic!("expected while, got {:?}", parts[1]);
        };
        assert_eq!(show(condition), "(< i 3)");
        assert_eq!(increment.as_ref().map(show).as_deref(), Some("(= i (+ i 1))"));
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let result = parse_source("for (;;) break;");
        assert!(result.is_ok());
        let Stmt::While { condition, increment, .. } = &result.statements[0] else {
            panic!("expected while");
        };
        assert_eq!(show(condition), "true");
        assert!(increment.is_none());
    }

    #[test]
    fn test_class_is_parsed_structurally() {
        let result = parse_source("class B < A { init(x) { this.x = x; } get() { return super.get(); } }");
        assert!(result.is_ok(), "{:?}", result.errors);
        let Stmt::Class { name, superclass, methods } = &result.statements[0] else {
            panic!("expected class");
        };
        assert_eq!(name.lexeme.as_ref(), "B");
        assert!(superclass.is_some());
        assert_eq!(methods.len(), 2);
    }

    #[test]
    fn test_missing_expression() {
        assert_eq!(messages("let x = ;"), vec!["[line: 1 Error at ';': Expect expression.]"]);
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(messages("print 1"), vec!["[line: 1 Error at end: Expect ';' after value.]"]);
    }

    #[test]
    fn test_recovery_keeps_later_statements() {
        let result = parse_source("let a = ;\nprint 1;\nlet b = 2;");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.statements.len(), 2);
        assert!(result.had_error());
    }

    #[test]
    fn test_synchronize_stops_before_keyword() {
        let result = parse_source("let = 1 2 3 print 4;");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.statements[..], [Stmt::Print(_)]));
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let result = parse_source("1 + 2 = 3; print 5;");
        assert_eq!(
            result.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            vec!["Invalid assignment target."]
        );
        // The faulty statement is dropped; parsing carries on normally.
        assert_eq!(result.statements.len(), 1);
    }

    #[test]
    fn test_binary_operator_without_left_operand() {
        let result = parse_source("* 3; print 1;");
        assert_eq!(
            result.errors[0].to_diagnostic().to_string(),
            "[line: 1 Error at '*': Binary operator '*' appears without a left-hand operand.]"
        );
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.statements[..], [Stmt::Print(_)]));
    }

    #[test]
    fn test_missing_left_operand_consumes_whole_right_side() {
        let result = parse_source("== 1 + 2 * 3; print 1;");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.statements.len(), 1);
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            messages("return 1;"),
            vec!["[line: 1 Error at 'return': Can't return from top-level code.]"]
        );
        assert!(messages("fun f() { return 1; }").is_empty());
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            messages("break;"),
            vec!["[line: 1 Error at 'break': Can't use 'break' outside of a loop.]"]
        );
        assert_eq!(
            messages("if (true) continue;"),
            vec!["[line: 1 Error at 'continue': Can't use 'continue' outside of a loop.]"]
        );
        assert!(messages("while (true) { if (true) break; else continue; }").is_empty());
    }

    #[test]
    fn test_function_body_resets_loop_depth() {
        let errors = messages("while (true) { fun f() { break; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't use 'break' outside of a loop."));
        // After the function body the loop is in scope again.
        assert!(messages("while (true) { fun f() {} break; }").is_empty());
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let errors = messages(&format!("f({});", args));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 arguments."));
    }

    #[test]
    fn test_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let errors = messages(&format!("fun f({}) {{}}", params.join(", ")));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 parameters."));
    }

    #[test]
    fn test_error_inside_block_drops_block() {
        let result = parse_source("{ let a = 1; let b = ; } print 2;");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.statements[..], [Stmt::Print(_)]));
    }

    #[test]
    fn test_missing_token_without_eof_is_handled() {
        let result = Parser::new(Vec::new()).parse();
        assert!(result.is_ok());
        assert!(result.statements.is_empty());
    }
}
