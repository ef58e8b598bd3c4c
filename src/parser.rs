// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;
use crate::number::Number;

use std::rc::Rc;

use anyhow::{bail, Result};

#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    end: u32,
    eidx: u32,
    // Set while parsing a `for` head, where `in` ends the init expression.
    no_in: bool,
    in_generator: bool,
    depth: u32,
}

enum Infix {
    Binary(BinOp),
    Logical(LogicalOp),
}

/// Deepest nesting of statements, expressions and patterns accepted.
pub const MAX_NESTING_DEPTH: u32 = 128;

// `**` is the only right-associative binary operator.
const EXP_PRECEDENCE: u8 = 12;

fn is_reserved(word: &str) -> bool {
    matches!(
        word,
        "await"
            | "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "implements"
            | "import"
            | "in"
            | "instanceof"
            | "interface"
            | "let"
            | "new"
            | "null"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "static"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
    )
}

fn assign_op(text: &str) -> Option<AssignOp> {
    Some(match text {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Arith(BinOp::Add),
        "-=" => AssignOp::Arith(BinOp::Sub),
        "*=" => AssignOp::Arith(BinOp::Mul),
        "/=" => AssignOp::Arith(BinOp::Div),
        "%=" => AssignOp::Arith(BinOp::Mod),
        "**=" => AssignOp::Arith(BinOp::Exp),
        "<<=" => AssignOp::Arith(BinOp::Shl),
        ">>=" => AssignOp::Arith(BinOp::Shr),
        ">>>=" => AssignOp::Arith(BinOp::UShr),
        "&=" => AssignOp::Arith(BinOp::BitAnd),
        "|=" => AssignOp::Arith(BinOp::BitOr),
        "^=" => AssignOp::Arith(BinOp::BitXor),
        "&&=" => AssignOp::Logical(LogicalOp::And),
        "||=" => AssignOp::Logical(LogicalOp::Or),
        "??=" => AssignOp::Logical(LogicalOp::Nullish),
        _ => return None,
    })
}

fn parse_number(span: &Span) -> Result<Number> {
    Number::from_literal(span.text()).map_err(|e| span.error(&e.to_string()))
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            end: 0,
            eidx: 0,
            no_in: false,
            in_generator: false,
            depth: 0,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol
            | TokenKind::Number
            | TokenKind::BigInt
            | TokenKind::Ident
            | TokenKind::PrivateName
            | TokenKind::Eof => self.tok.1.text(),
            TokenKind::String | TokenKind::Template | TokenKind::Regex => "",
        }
    }

    pub fn next_token(&mut self) -> Result<()> {
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn peek_token(&self) -> Result<Token> {
        self.lexer.clone().next_token()
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.token_text() == text {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.tok.1.error(msg.trim_end()))
        }
    }

    fn is(&self, text: &str) -> bool {
        self.token_text() == text
    }

    fn eat(&mut self, text: &str) -> Result<bool> {
        if self.is(text) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn at_eof(&self) -> bool {
        self.tok.0 == TokenKind::Eof
    }

    fn span(&self, start: u32) -> Span {
        Span::new(&self.source, start, self.end)
    }

    fn next_eidx(&mut self) -> u32 {
        let eidx = self.eidx;
        self.eidx += 1;
        eidx
    }

    // Automatic semicolon insertion: a missing `;` is accepted before `}`, at the
    // end of input or when a line terminator precedes the offending token.
    fn consume_semicolon(&mut self, context: &str) -> Result<()> {
        if self.is(";") {
            return self.next_token();
        }
        if self.is("}") || self.at_eof() || self.tok.2 {
            return Ok(());
        }
        Err(self.tok.1.error(&format!("expecting `;` {context}")))
    }

    // Runs `f` one nesting level deeper. Every recursive production passes
    // through here, which bounds the stack used by the parser and by the
    // folding of nested literals.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            bail!(self.tok.1.error("nesting too deep"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // Runs `f` with `in` allowed as an operator again.
    fn with_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let no_in = core::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = no_in;
        result
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut body = vec![];
        while !self.at_eof() {
            body.push(self.parse_stmt()?);
        }
        Ok(Program {
            span: Span::new(&self.source, 0, self.source.contents().len() as u32),
            body,
            num_expressions: self.eidx,
        })
    }

    fn parse_binding_ident(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident if is_reserved(span.text()) => {
                Err(span.error(&format!("unexpected keyword `{}`", span.text())))
            }
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            _ => Err(span.error("expecting identifier")),
        }
    }

    // Property names may be keywords.
    fn parse_ident_name(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            _ => Err(span.error("expecting identifier")),
        }
    }

    fn let_starts_decl(&self) -> Result<bool> {
        let next = self.peek_token()?;
        Ok(match next.0 {
            TokenKind::Ident => !matches!(next.1.text(), "in" | "instanceof"),
            TokenKind::Symbol => matches!(next.1.text(), "[" | "{"),
            _ => false,
        })
    }

    fn async_function_follows(&self) -> Result<bool> {
        let next = self.peek_token()?;
        Ok(next.0 == TokenKind::Ident && next.1.text() == "function" && !next.2)
    }

    // `import(...)` and `import.meta` are expressions.
    fn import_is_expr(&self) -> Result<bool> {
        let next = self.peek_token()?;
        Ok(next.0 == TokenKind::Symbol && matches!(next.1.text(), "(" | "."))
    }

    // True if the contextual keyword under the cursor (`static`, `get`, `set`,
    // `async`) modifies the member that follows rather than naming it.
    fn is_modifier(&self) -> Result<bool> {
        let next = self.peek_token()?;
        Ok(match next.0 {
            TokenKind::Symbol => matches!(next.1.text(), "[" | "*" | "{"),
            TokenKind::Eof => false,
            _ => true,
        })
    }

    fn parse_stmt(&mut self) -> Result<Ref<Stmt>> {
        self.nested(Self::parse_stmt_inner)
    }

    fn parse_stmt_inner(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        let span = self.tok.1.clone();

        if self.tok.0 != TokenKind::Ident {
            return match self.token_text() {
                "{" => {
                    let body = self.parse_block()?;
                    Ok(Ref::new(Stmt::Block {
                        span: self.span(start),
                        body,
                    }))
                }
                ";" => {
                    self.next_token()?;
                    Ok(Ref::new(Stmt::Empty {
                        span: self.span(start),
                    }))
                }
                _ => self.parse_expr_stmt(),
            };
        }

        match span.text() {
            "var" | "const" => self.parse_var_stmt(),
            "let" if self.let_starts_decl()? => self.parse_var_stmt(),
            "function" => {
                let func = self.parse_function(start, false, true)?;
                Ok(Ref::new(Stmt::Function {
                    span: self.span(start),
                    func,
                }))
            }
            "async" if self.async_function_follows()? => {
                self.next_token()?;
                let func = self.parse_function(start, true, true)?;
                Ok(Ref::new(Stmt::Function {
                    span: self.span(start),
                    func,
                }))
            }
            "class" => {
                let class = self.parse_class(true)?;
                Ok(Ref::new(Stmt::Class {
                    span: self.span(start),
                    class,
                }))
            }
            "if" => self.parse_if(),
            "for" => self.parse_for(),
            "while" => {
                self.next_token()?;
                let test = self.parse_paren_expr()?;
                let body = self.parse_stmt()?;
                Ok(Ref::new(Stmt::While {
                    span: self.span(start),
                    test,
                    body,
                }))
            }
            "do" => {
                self.next_token()?;
                let body = self.parse_stmt()?;
                self.expect("while", "after do-while body")?;
                let test = self.parse_paren_expr()?;
                self.eat(";")?;
                Ok(Ref::new(Stmt::DoWhile {
                    span: self.span(start),
                    body,
                    test,
                }))
            }
            "return" => {
                self.next_token()?;
                let arg = if self.is(";") || self.is("}") || self.at_eof() || self.tok.2 {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume_semicolon("after return statement")?;
                Ok(Ref::new(Stmt::Return {
                    span: self.span(start),
                    arg,
                }))
            }
            "break" | "continue" => {
                let is_break = span.text() == "break";
                self.next_token()?;
                let label = if self.tok.0 == TokenKind::Ident && !self.tok.2 {
                    Some(self.parse_binding_ident()?)
                } else {
                    None
                };
                self.consume_semicolon("after jump statement")?;
                let span = self.span(start);
                Ok(Ref::new(if is_break {
                    Stmt::Break { span, label }
                } else {
                    Stmt::Continue { span, label }
                }))
            }
            "throw" => {
                self.next_token()?;
                if self.tok.2 {
                    bail!(self.tok.1.error("illegal newline after throw"));
                }
                let arg = self.parse_expr()?;
                self.consume_semicolon("after throw statement")?;
                Ok(Ref::new(Stmt::Throw {
                    span: self.span(start),
                    arg,
                }))
            }
            "try" => self.parse_try(),
            "switch" => self.parse_switch(),
            "debugger" => {
                self.next_token()?;
                self.consume_semicolon("after debugger statement")?;
                Ok(Ref::new(Stmt::Debugger {
                    span: self.span(start),
                }))
            }
            "import" if !self.import_is_expr()? => self.parse_import(),
            "export" => self.parse_export(),
            text if !is_reserved(text) && self.peek_token()?.1.text() == ":" => {
                self.next_token()?;
                self.next_token()?;
                let body = self.parse_stmt()?;
                Ok(Ref::new(Stmt::Labeled {
                    span: self.span(start),
                    label: span.clone(),
                    body,
                }))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        let expr = self.parse_expr()?;
        self.consume_semicolon("after expression")?;
        Ok(Ref::new(Stmt::Expr {
            span: self.span(start),
            expr,
        }))
    }

    fn parse_block(&mut self) -> Result<Vec<Ref<Stmt>>> {
        self.expect("{", "to start block")?;
        let mut body = vec![];
        while !self.is("}") {
            if self.at_eof() {
                bail!(self.tok.1.error("expecting `}` to close block"));
            }
            body.push(self.parse_stmt()?);
        }
        self.next_token()?;
        Ok(body)
    }

    fn parse_paren_expr(&mut self) -> Result<Ref<Expr>> {
        self.expect("(", "")?;
        let expr = self.with_in(|p| p.parse_expr())?;
        self.expect(")", "to close condition")?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("if", "")?;
        let test = self.parse_paren_expr()?;
        let cons = self.parse_stmt()?;
        let alt = if self.eat("else")? {
            Some(self.parse_stmt()?)
        } else {
            None
        };
        Ok(Ref::new(Stmt::If {
            span: self.span(start),
            test,
            cons,
            alt,
        }))
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl> {
        let start = self.tok.1.start;
        let kind = match self.token_text() {
            "var" => VarKind::Var,
            "let" => VarKind::Let,
            _ => VarKind::Const,
        };
        self.next_token()?;

        let mut decls = vec![];
        loop {
            let dstart = self.tok.1.start;
            let id = self.parse_binding_target()?;
            let init = if self.eat("=")? {
                Some(self.parse_assign()?)
            } else {
                None
            };
            decls.push(VarDeclarator {
                span: self.span(dstart),
                id,
                init,
            });
            if !self.eat(",")? {
                break;
            }
        }

        Ok(VarDecl {
            span: self.span(start),
            kind,
            decls,
        })
    }

    fn parse_var_stmt(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        let decl = self.parse_var_decl()?;
        self.consume_semicolon("after variable declaration")?;
        Ok(Ref::new(Stmt::Var {
            span: self.span(start),
            decl,
        }))
    }

    fn parse_for_init(&mut self) -> Result<Option<ForInit>> {
        if self.is(";") {
            return Ok(None);
        }
        if self.is("var") || self.is("const") || (self.is("let") && self.let_starts_decl()?) {
            return Ok(Some(ForInit::Var(self.parse_var_decl()?)));
        }
        Ok(Some(ForInit::Expr(self.parse_expr()?)))
    }

    fn parse_for(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("for", "")?;
        let is_await = self.eat("await")?;
        self.expect("(", "after `for`")?;

        let no_in = core::mem::replace(&mut self.no_in, true);
        let init = self.parse_for_init();
        self.no_in = no_in;
        let init = init?;

        if self.is("of") || self.is("in") {
            let is_of = self.is("of");
            let left = match init {
                Some(ForInit::Var(decl)) => {
                    if decl.decls.len() != 1 {
                        bail!(decl.span.error("expecting a single loop variable"));
                    }
                    ForHead::Var(decl)
                }
                Some(ForInit::Expr(expr)) => ForHead::Pattern(self.expr_to_pattern(&expr)?),
                None => bail!(self.tok.1.error("expecting loop variable")),
            };
            self.next_token()?;
            let right = if is_of {
                self.with_in(|p| p.parse_assign())?
            } else {
                self.with_in(|p| p.parse_expr())?
            };
            self.expect(")", "to close for loop head")?;
            let body = self.parse_stmt()?;
            let span = self.span(start);
            return Ok(Ref::new(if is_of {
                Stmt::ForOf {
                    span,
                    left,
                    right,
                    body,
                    is_await,
                }
            } else {
                Stmt::ForIn {
                    span,
                    left,
                    right,
                    body,
                }
            }));
        }

        self.expect(";", "in for loop head")?;
        let test = if self.is(";") {
            None
        } else {
            Some(self.with_in(|p| p.parse_expr())?)
        };
        self.expect(";", "in for loop head")?;
        let update = if self.is(")") {
            None
        } else {
            Some(self.with_in(|p| p.parse_expr())?)
        };
        self.expect(")", "to close for loop head")?;
        let body = self.parse_stmt()?;
        Ok(Ref::new(Stmt::For {
            span: self.span(start),
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_try(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("try", "")?;
        let block = self.parse_block()?;

        let handler = if self.is("catch") {
            let cstart = self.tok.1.start;
            self.next_token()?;
            let param = if self.eat("(")? {
                let param = self.parse_binding_target()?;
                self.expect(")", "to close catch parameter")?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                span: self.span(cstart),
                param,
                body,
            })
        } else {
            None
        };

        let finalizer = if self.eat("finally")? {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            bail!(self.tok.1.error("expecting `catch` or `finally` after try block"));
        }

        Ok(Ref::new(Stmt::Try {
            span: self.span(start),
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_switch(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("switch", "")?;
        let discriminant = self.parse_paren_expr()?;
        self.expect("{", "to start switch body")?;

        let mut cases = vec![];
        while !self.is("}") {
            let cstart = self.tok.1.start;
            let test = if self.eat("case")? {
                Some(self.with_in(|p| p.parse_expr())?)
            } else if self.eat("default")? {
                None
            } else {
                bail!(self.tok.1.error("expecting `case` or `default`"));
            };
            self.expect(":", "after switch case")?;

            let mut body = vec![];
            while !(self.is("case") || self.is("default") || self.is("}")) {
                if self.at_eof() {
                    bail!(self.tok.1.error("expecting `}` to close switch body"));
                }
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase {
                span: self.span(cstart),
                test,
                body,
            });
        }
        self.next_token()?;

        Ok(Ref::new(Stmt::Switch {
            span: self.span(start),
            discriminant,
            cases,
        }))
    }

    fn parse_module_specifier(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        if self.tok.0 != TokenKind::String {
            bail!(span.error("expecting module specifier"));
        }
        self.next_token()?;
        Ok(span)
    }

    // `with { type: "json" }` after a module specifier.
    fn skip_import_attributes(&mut self) -> Result<()> {
        if !(self.is("with") || (self.is("assert") && !self.tok.2)) {
            return Ok(());
        }
        self.next_token()?;
        self.expect("{", "to start import attributes")?;
        while !self.is("}") {
            match self.tok.0 {
                TokenKind::Ident | TokenKind::String => self.next_token()?,
                _ => bail!(self.tok.1.error("expecting import attribute key")),
            }
            self.expect(":", "after import attribute key")?;
            if self.tok.0 != TokenKind::String {
                bail!(self.tok.1.error("expecting string import attribute value"));
            }
            self.next_token()?;
            if !self.is("}") {
                self.expect(",", "or `}` in import attributes")?;
            }
        }
        self.next_token()
    }

    fn parse_specifier_name(&mut self) -> Result<()> {
        match self.tok.0 {
            TokenKind::Ident | TokenKind::String => self.next_token(),
            _ => Err(self.tok.1.error("expecting name in import/export list")),
        }
    }

    fn parse_named_specifiers(&mut self) -> Result<()> {
        self.expect("{", "to start import/export list")?;
        while !self.is("}") {
            self.parse_specifier_name()?;
            if self.eat("as")? {
                self.parse_specifier_name()?;
            }
            if !self.is("}") {
                self.expect(",", "or `}` in import/export list")?;
            }
        }
        self.next_token()
    }

    fn parse_import(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("import", "")?;

        if self.tok.0 != TokenKind::String {
            let mut more = true;
            if self.tok.0 == TokenKind::Ident {
                self.parse_binding_ident()?;
                more = self.eat(",")?;
            }
            if more {
                if self.eat("*")? {
                    self.expect("as", "after `*` in import declaration")?;
                    self.parse_binding_ident()?;
                } else {
                    self.parse_named_specifiers()?;
                }
            }
            self.expect("from", "in import declaration")?;
        }

        let source = self.parse_module_specifier()?;
        self.skip_import_attributes()?;
        self.consume_semicolon("after import declaration")?;
        Ok(Ref::new(Stmt::Import {
            span: self.span(start),
            source,
        }))
    }

    fn parse_export(&mut self) -> Result<Ref<Stmt>> {
        let start = self.tok.1.start;
        self.expect("export", "")?;
        let span = self.tok.1.clone();

        let kind = match (self.tok.0, span.text()) {
            (TokenKind::Ident, "default") => {
                self.next_token()?;
                let dstart = self.tok.1.start;
                if self.is("function") || (self.is("async") && self.async_function_follows()?) {
                    let is_async = self.eat("async")?;
                    let func = self.parse_function(dstart, is_async, false)?;
                    ExportKind::DefaultDecl(Ref::new(Stmt::Function {
                        span: self.span(dstart),
                        func,
                    }))
                } else if self.is("class") {
                    let class = self.parse_class(false)?;
                    ExportKind::DefaultDecl(Ref::new(Stmt::Class {
                        span: self.span(dstart),
                        class,
                    }))
                } else {
                    let expr = self.parse_assign()?;
                    self.consume_semicolon("after export default")?;
                    ExportKind::DefaultExpr(expr)
                }
            }
            (TokenKind::Symbol, "*") => {
                self.next_token()?;
                if self.eat("as")? {
                    self.parse_specifier_name()?;
                }
                self.expect("from", "in export declaration")?;
                let source = self.parse_module_specifier()?;
                self.skip_import_attributes()?;
                self.consume_semicolon("after export declaration")?;
                ExportKind::All { source }
            }
            (TokenKind::Symbol, "{") => {
                self.parse_named_specifiers()?;
                let source = if self.eat("from")? {
                    let source = self.parse_module_specifier()?;
                    self.skip_import_attributes()?;
                    Some(source)
                } else {
                    None
                };
                self.consume_semicolon("after export declaration")?;
                ExportKind::Named { source }
            }
            (TokenKind::Ident, "var" | "let" | "const" | "function" | "class" | "async") => {
                ExportKind::Decl(self.parse_stmt()?)
            }
            _ => bail!(span.error("unexpected token after `export`")),
        };

        Ok(Ref::new(Stmt::Export {
            span: self.span(start),
            kind,
        }))
    }

    // Parses `function [*] [name] (params) { body }`.
    fn parse_function(
        &mut self,
        start: u32,
        is_async: bool,
        needs_id: bool,
    ) -> Result<Ref<Function>> {
        self.expect("function", "")?;
        let is_generator = self.eat("*")?;
        let id = if self.tok.0 == TokenKind::Ident {
            Some(self.parse_binding_ident()?)
        } else if needs_id {
            bail!(self.tok.1.error("expecting function name"));
        } else {
            None
        };
        self.parse_function_rest(start, id, is_async, is_generator)
    }

    // Parses `(params) { body }`.
    fn parse_function_rest(
        &mut self,
        start: u32,
        id: Option<Span>,
        is_async: bool,
        is_generator: bool,
    ) -> Result<Ref<Function>> {
        let in_generator = core::mem::replace(&mut self.in_generator, is_generator);
        let result = self.with_in(|p| {
            let params = p.parse_params()?;
            let body = p.parse_block()?;
            Ok((params, body))
        });
        self.in_generator = in_generator;
        let (params, body) = result?;

        Ok(Ref::new(Function {
            span: self.span(start),
            id,
            params,
            body,
            is_async,
            is_generator,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<Pattern>> {
        self.expect("(", "to start parameter list")?;
        let mut params = vec![];
        while !self.is(")") {
            if self.is("...") {
                params.push(self.parse_rest_element()?);
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.is(")") {
                self.expect(",", "or `)` in parameter list")?;
            }
        }
        self.expect(")", "to close parameter list")?;
        Ok(params)
    }

    fn parse_binding_target(&mut self) -> Result<Pattern> {
        self.nested(Self::parse_binding_target_inner)
    }

    fn parse_binding_target_inner(&mut self) -> Result<Pattern> {
        match self.token_text() {
            "[" => self.parse_array_binding(),
            "{" => self.parse_object_binding(),
            _ => Ok(Pattern::Ident(self.parse_binding_ident()?)),
        }
    }

    fn parse_binding_element(&mut self) -> Result<Pattern> {
        let start = self.tok.1.start;
        let target = self.parse_binding_target()?;
        if self.eat("=")? {
            let default = self.parse_assign()?;
            return Ok(Pattern::Assign {
                span: self.span(start),
                target: Box::new(target),
                default,
            });
        }
        Ok(target)
    }

    fn parse_rest_element(&mut self) -> Result<Pattern> {
        let start = self.tok.1.start;
        self.expect("...", "")?;
        let arg = self.parse_binding_target()?;
        Ok(Pattern::Rest {
            span: self.span(start),
            arg: Box::new(arg),
        })
    }

    fn parse_array_binding(&mut self) -> Result<Pattern> {
        let start = self.tok.1.start;
        self.expect("[", "")?;
        let items = self.with_in(|p| {
            let mut items = vec![];
            while !p.is("]") {
                if p.eat(",")? {
                    items.push(None);
                    continue;
                }
                if p.is("...") {
                    items.push(Some(p.parse_rest_element()?));
                    break;
                }
                items.push(Some(p.parse_binding_element()?));
                if !p.is("]") {
                    p.expect(",", "or `]` in array pattern")?;
                }
            }
            Ok(items)
        })?;
        self.expect("]", "to close array pattern")?;
        Ok(Pattern::Array {
            span: self.span(start),
            items,
        })
    }

    fn parse_object_binding(&mut self) -> Result<Pattern> {
        let start = self.tok.1.start;
        self.expect("{", "")?;
        let props = self.with_in(|p| {
            let mut props = vec![];
            while !p.is("}") {
                if p.eat("...")? {
                    props.push(PatternProp::Rest(Pattern::Ident(p.parse_binding_ident()?)));
                    break;
                }
                let pstart = p.tok.1.start;
                let key = p.parse_prop_key()?;
                let value = if p.eat(":")? {
                    p.parse_binding_element()?
                } else {
                    let ident = match &key {
                        PropKey::Ident(span) if !is_reserved(span.text()) => span.clone(),
                        _ => bail!(key.span().error("expecting `:` after property key")),
                    };
                    let target = Pattern::Ident(ident);
                    if p.eat("=")? {
                        let default = p.parse_assign()?;
                        Pattern::Assign {
                            span: p.span(pstart),
                            target: Box::new(target),
                            default,
                        }
                    } else {
                        target
                    }
                };
                props.push(PatternProp::KeyValue { key, value });
                if !p.is("}") {
                    p.expect(",", "or `}` in object pattern")?;
                }
            }
            Ok(props)
        })?;
        self.expect("}", "to close object pattern")?;
        Ok(Pattern::Object {
            span: self.span(start),
            props,
        })
    }

    fn parse_prop_key(&mut self) -> Result<PropKey> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                self.next_token()?;
                Ok(PropKey::Ident(span))
            }
            TokenKind::String => {
                let value = cook_string(&span)?.map(Rc::from);
                self.next_token()?;
                Ok(PropKey::String { span, value })
            }
            TokenKind::Number => {
                let value = parse_number(&span)?;
                self.next_token()?;
                Ok(PropKey::Number { span, value })
            }
            // BigInt keys are lowered to a computed key holding the literal.
            TokenKind::BigInt => {
                let expr = self.parse_primary()?;
                Ok(PropKey::Computed { span, expr })
            }
            TokenKind::PrivateName => {
                self.next_token()?;
                Ok(PropKey::Private(span))
            }
            TokenKind::Symbol if span.text() == "[" => {
                self.next_token()?;
                let expr = self.with_in(|p| p.parse_assign())?;
                self.expect("]", "to close computed property key")?;
                Ok(PropKey::Computed {
                    span: self.span(span.start),
                    expr,
                })
            }
            _ => Err(span.error("expecting property key")),
        }
    }

    // Returns the kind and async/generator flags that precede a method key.
    fn parse_method_modifiers(&mut self) -> Result<(MethodKind, bool, bool)> {
        let mut kind = MethodKind::Method;
        let mut is_async = false;
        if self.is("async") && self.is_modifier()? && !self.peek_token()?.2 {
            self.next_token()?;
            is_async = true;
        } else if (self.is("get") || self.is("set")) && self.is_modifier()? {
            kind = if self.is("get") {
                MethodKind::Get
            } else {
                MethodKind::Set
            };
            self.next_token()?;
        }
        let is_generator = self.eat("*")?;
        Ok((kind, is_async, is_generator))
    }

    fn parse_class(&mut self, needs_id: bool) -> Result<Ref<Class>> {
        let start = self.tok.1.start;
        self.expect("class", "")?;
        let id = if self.tok.0 == TokenKind::Ident && !self.is("extends") {
            Some(self.parse_binding_ident()?)
        } else if needs_id {
            bail!(self.tok.1.error("expecting class name"));
        } else {
            None
        };
        let super_class = if self.eat("extends")? {
            Some(self.parse_lhs()?)
        } else {
            None
        };

        self.expect("{", "to start class body")?;
        let members = self.with_in(|p| {
            let mut members = vec![];
            while !p.is("}") {
                if p.eat(";")? {
                    continue;
                }
                if p.at_eof() {
                    bail!(p.tok.1.error("expecting `}` to close class body"));
                }
                members.push(p.parse_class_member()?);
            }
            Ok(members)
        })?;
        self.next_token()?;

        Ok(Ref::new(Class {
            span: self.span(start),
            id,
            super_class,
            members,
        }))
    }

    fn parse_class_member(&mut self) -> Result<ClassMember> {
        let start = self.tok.1.start;
        let mut is_static = false;
        if self.is("static") && self.is_modifier()? {
            self.next_token()?;
            if self.is("{") {
                let in_generator = core::mem::replace(&mut self.in_generator, false);
                let body = self.parse_block();
                self.in_generator = in_generator;
                return Ok(ClassMember::StaticBlock {
                    span: self.span(start),
                    body: body?,
                });
            }
            is_static = true;
        }

        let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
        let key = self.parse_prop_key()?;
        if self.is("(") || kind != MethodKind::Method || is_async || is_generator {
            let fstart = self.tok.1.start;
            let func = self.parse_function_rest(fstart, None, is_async, is_generator)?;
            return Ok(ClassMember::Method {
                span: self.span(start),
                is_static,
                kind,
                key,
                func,
            });
        }

        let value = if self.eat("=")? {
            Some(self.parse_assign()?)
        } else {
            None
        };
        self.consume_semicolon("after class field")?;
        Ok(ClassMember::Field {
            span: self.span(start),
            is_static,
            key,
            value,
        })
    }

    pub fn parse_expr(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let first = self.parse_assign()?;
        if !self.is(",") {
            return Ok(first);
        }

        let mut exprs = vec![first];
        while self.eat(",")? {
            exprs.push(self.parse_assign()?);
        }
        let span = self.span(start);
        Ok(Ref::new(Expr::Sequence {
            span,
            exprs,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_assign(&mut self) -> Result<Ref<Expr>> {
        self.nested(Self::parse_assign_inner)
    }

    fn parse_assign_inner(&mut self) -> Result<Ref<Expr>> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }
        if self.in_generator && self.is("yield") {
            return self.parse_yield();
        }

        let start = self.tok.1.start;
        let lhs = self.parse_conditional()?;
        let op = match self.tok.0 {
            TokenKind::Symbol => assign_op(self.tok.1.text()),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };

        let target = match op {
            AssignOp::Assign => self.expr_to_pattern(&lhs)?,
            _ => self.simple_target(&lhs)?,
        };
        self.next_token()?;
        let value = self.parse_assign()?;
        let span = self.span(start);
        Ok(Ref::new(Expr::Assign {
            span,
            op,
            target,
            value,
            eidx: self.next_eidx(),
        }))
    }

    // Arrow functions are detected by parsing the parameters on a snapshot of
    // the parser and checking for `=>`. On failure the snapshot is restored.
    fn try_parse_arrow(&mut self) -> Result<Option<Ref<Expr>>> {
        let start = self.tok.1.start;
        let span = self.tok.1.clone();

        match self.tok.0 {
            TokenKind::Ident if !is_reserved(span.text()) => {
                let next = self.peek_token()?;
                if next.0 == TokenKind::Symbol && next.1.text() == "=>" && !next.2 {
                    self.next_token()?;
                    let params = vec![Pattern::Ident(span)];
                    return self.parse_arrow_body(start, params, false).map(Some);
                }
                if span.text() != "async" || next.2 {
                    return Ok(None);
                }

                let state = self.clone();
                self.next_token()?;
                let params = match self.tok.0 {
                    TokenKind::Ident => self.parse_binding_ident().map(|p| vec![Pattern::Ident(p)]),
                    _ if self.is("(") => self.with_in(|p| p.parse_params()),
                    _ => {
                        *self = state;
                        return Ok(None);
                    }
                };
                match params {
                    Ok(params) if self.is("=>") && !self.tok.2 => {
                        self.parse_arrow_body(start, params, true).map(Some)
                    }
                    _ => {
                        *self = state;
                        Ok(None)
                    }
                }
            }
            TokenKind::Symbol if span.text() == "(" => {
                let state = self.clone();
                match self.with_in(|p| p.parse_params()) {
                    Ok(params) if self.is("=>") && !self.tok.2 => {
                        self.parse_arrow_body(start, params, false).map(Some)
                    }
                    _ => {
                        *self = state;
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    fn parse_arrow_body(
        &mut self,
        start: u32,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Ref<Expr>> {
        self.expect("=>", "in arrow function")?;
        let in_generator = core::mem::replace(&mut self.in_generator, false);
        let body = if self.is("{") {
            self.with_in(|p| p.parse_block()).map(ArrowBody::Block)
        } else {
            self.parse_assign().map(ArrowBody::Expr)
        };
        self.in_generator = in_generator;
        let body = body?;

        let span = self.span(start);
        Ok(Ref::new(Expr::Arrow {
            span,
            params,
            body,
            is_async,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_yield(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        self.expect("yield", "")?;
        let mut delegate = false;
        let mut arg = None;
        if !self.tok.2 {
            delegate = self.eat("*")?;
            let ends = self.at_eof()
                || (self.tok.0 == TokenKind::Symbol
                    && matches!(self.tok.1.text(), ")" | "]" | "}" | "," | ";" | ":"));
            if delegate || !ends {
                arg = Some(self.parse_assign()?);
            }
        }
        let span = self.span(start);
        Ok(Ref::new(Expr::Yield {
            span,
            arg,
            delegate,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_conditional(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let test = self.parse_binary(1)?;
        if !self.is("?") {
            return Ok(test);
        }
        self.next_token()?;
        let cons = self.with_in(|p| p.parse_assign())?;
        self.expect(":", "in conditional expression")?;
        let alt = self.parse_assign()?;
        let span = self.span(start);
        Ok(Ref::new(Expr::Conditional {
            span,
            test,
            cons,
            alt,
            eidx: self.next_eidx(),
        }))
    }

    fn infix_op(&self) -> Option<(Infix, u8)> {
        let text = match self.tok.0 {
            TokenKind::Symbol => self.tok.1.text(),
            TokenKind::Ident => match self.tok.1.text() {
                "instanceof" => "instanceof",
                "in" if !self.no_in => "in",
                _ => return None,
            },
            _ => return None,
        };
        Some(match text {
            "??" => (Infix::Logical(LogicalOp::Nullish), 1),
            "||" => (Infix::Logical(LogicalOp::Or), 2),
            "&&" => (Infix::Logical(LogicalOp::And), 3),
            "|" => (Infix::Binary(BinOp::BitOr), 4),
            "^" => (Infix::Binary(BinOp::BitXor), 5),
            "&" => (Infix::Binary(BinOp::BitAnd), 6),
            "==" => (Infix::Binary(BinOp::Eq), 7),
            "!=" => (Infix::Binary(BinOp::Ne), 7),
            "===" => (Infix::Binary(BinOp::StrictEq), 7),
            "!==" => (Infix::Binary(BinOp::StrictNe), 7),
            "<" => (Infix::Binary(BinOp::Lt), 8),
            "<=" => (Infix::Binary(BinOp::Le), 8),
            ">" => (Infix::Binary(BinOp::Gt), 8),
            ">=" => (Infix::Binary(BinOp::Ge), 8),
            "instanceof" => (Infix::Binary(BinOp::InstanceOf), 8),
            "in" => (Infix::Binary(BinOp::In), 8),
            "<<" => (Infix::Binary(BinOp::Shl), 9),
            ">>" => (Infix::Binary(BinOp::Shr), 9),
            ">>>" => (Infix::Binary(BinOp::UShr), 9),
            "+" => (Infix::Binary(BinOp::Add), 10),
            "-" => (Infix::Binary(BinOp::Sub), 10),
            "*" => (Infix::Binary(BinOp::Mul), 11),
            "/" => (Infix::Binary(BinOp::Div), 11),
            "%" => (Infix::Binary(BinOp::Mod), 11),
            "**" => (Infix::Binary(BinOp::Exp), EXP_PRECEDENCE),
            _ => return None,
        })
    }

    // Precedence climbing over the binary and logical operators.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = self.infix_op() {
            if prec < min_prec {
                break;
            }
            self.next_token()?;
            let next_min = if prec == EXP_PRECEDENCE { prec } else { prec + 1 };
            let rhs = self.nested(|p| p.parse_binary(next_min))?;
            let span = self.span(start);
            let eidx = self.next_eidx();
            lhs = Ref::new(match op {
                Infix::Binary(op) => Expr::Binary {
                    span,
                    op,
                    lhs,
                    rhs,
                    eidx,
                },
                Infix::Logical(op) => Expr::Logical {
                    span,
                    op,
                    lhs,
                    rhs,
                    eidx,
                },
            });
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let span = self.tok.1.clone();
        let op = match (self.tok.0, span.text()) {
            (TokenKind::Symbol, "-") => Some(UnaryOp::Neg),
            (TokenKind::Symbol, "+") => Some(UnaryOp::Plus),
            (TokenKind::Symbol, "!") => Some(UnaryOp::Not),
            (TokenKind::Symbol, "~") => Some(UnaryOp::BitNot),
            (TokenKind::Ident, "typeof") => Some(UnaryOp::TypeOf),
            (TokenKind::Ident, "void") => Some(UnaryOp::Void),
            (TokenKind::Ident, "delete") => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.next_token()?;
            let arg = self.nested(Self::parse_unary)?;
            let span = self.span(start);
            return Ok(Ref::new(Expr::Unary {
                span,
                op,
                arg,
                eidx: self.next_eidx(),
            }));
        }

        match (self.tok.0, span.text()) {
            (TokenKind::Symbol, "++" | "--") => {
                let op = if span.text() == "++" {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                self.next_token()?;
                let arg = self.nested(Self::parse_unary)?;
                self.simple_target(&arg)?;
                let span = self.span(start);
                Ok(Ref::new(Expr::Update {
                    span,
                    op,
                    prefix: true,
                    arg,
                    eidx: self.next_eidx(),
                }))
            }
            // Module code: `await` is always an operator.
            (TokenKind::Ident, "await") => {
                self.next_token()?;
                let arg = self.nested(Self::parse_unary)?;
                let span = self.span(start);
                Ok(Ref::new(Expr::Await {
                    span,
                    arg,
                    eidx: self.next_eidx(),
                }))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let expr = self.parse_lhs()?;
        if self.tok.0 != TokenKind::Symbol || self.tok.2 {
            return Ok(expr);
        }
        let op = match self.tok.1.text() {
            "++" => UpdateOp::Inc,
            "--" => UpdateOp::Dec,
            _ => return Ok(expr),
        };
        self.simple_target(&expr)?;
        self.next_token()?;
        let span = self.span(start);
        Ok(Ref::new(Expr::Update {
            span,
            op,
            prefix: false,
            arg: expr,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_member_prop(&mut self) -> Result<MemberProp> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                self.next_token()?;
                Ok(MemberProp::Ident(span))
            }
            TokenKind::PrivateName => {
                self.next_token()?;
                Ok(MemberProp::Private(span))
            }
            _ => Err(span.error("expecting property name")),
        }
    }

    // Parses `.name`, `[expr]` and tagged templates following `expr`.
    // Returns None when no such suffix follows.
    fn parse_member_suffix(&mut self, start: u32, expr: &Ref<Expr>) -> Result<Option<Ref<Expr>>> {
        let object = expr.clone();
        let result = match (self.tok.0, self.token_text()) {
            (TokenKind::Symbol, ".") => {
                self.next_token()?;
                let prop = self.parse_member_prop()?;
                let span = self.span(start);
                Expr::Member {
                    span,
                    object,
                    prop,
                    optional: false,
                    eidx: self.next_eidx(),
                }
            }
            (TokenKind::Symbol, "[") => {
                self.next_token()?;
                let index = self.with_in(|p| p.parse_expr())?;
                self.expect("]", "to close member access")?;
                let span = self.span(start);
                Expr::Member {
                    span,
                    object,
                    prop: MemberProp::Computed(index),
                    optional: false,
                    eidx: self.next_eidx(),
                }
            }
            (TokenKind::Template, _) => {
                let quasi = self.parse_template()?;
                let span = self.span(start);
                Expr::TaggedTemplate {
                    span,
                    tag: object,
                    quasi,
                    eidx: self.next_eidx(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(Ref::new(result)))
    }

    fn parse_lhs(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let mut expr = if self.is("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            if let Some(e) = self.parse_member_suffix(start, &expr)? {
                expr = e;
                continue;
            }
            match self.token_text() {
                "(" => {
                    let args = self.parse_args()?;
                    let span = self.span(start);
                    expr = Ref::new(Expr::Call {
                        span,
                        callee: expr,
                        args,
                        optional: false,
                        eidx: self.next_eidx(),
                    });
                }
                "?." => {
                    self.next_token()?;
                    if self.is("(") {
                        let args = self.parse_args()?;
                        let span = self.span(start);
                        expr = Ref::new(Expr::Call {
                            span,
                            callee: expr,
                            args,
                            optional: true,
                            eidx: self.next_eidx(),
                        });
                    } else {
                        let prop = if self.eat("[")? {
                            let index = self.with_in(|p| p.parse_expr())?;
                            self.expect("]", "to close member access")?;
                            MemberProp::Computed(index)
                        } else {
                            self.parse_member_prop()?
                        };
                        let span = self.span(start);
                        expr = Ref::new(Expr::Member {
                            span,
                            object: expr,
                            prop,
                            optional: true,
                            eidx: self.next_eidx(),
                        });
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        self.expect("new", "")?;
        if self.eat(".")? {
            // new.target
            self.parse_ident_name()?;
            let span = self.span(start);
            return Ok(Ref::new(Expr::MetaProperty {
                span,
                eidx: self.next_eidx(),
            }));
        }

        let cstart = self.tok.1.start;
        let mut callee = if self.is("new") {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };
        while let Some(e) = self.parse_member_suffix(cstart, &callee)? {
            callee = e;
        }
        let args = if self.is("(") {
            self.parse_args()?
        } else {
            vec![]
        };
        let span = self.span(start);
        Ok(Ref::new(Expr::New {
            span,
            callee,
            args,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_spread_or_assign(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        if self.eat("...")? {
            let arg = self.parse_assign()?;
            let span = self.span(start);
            return Ok(Ref::new(Expr::Spread {
                span,
                arg,
                eidx: self.next_eidx(),
            }));
        }
        self.parse_assign()
    }

    fn parse_args(&mut self) -> Result<Vec<Ref<Expr>>> {
        self.expect("(", "")?;
        let args = self.with_in(|p| {
            let mut args = vec![];
            while !p.is(")") {
                args.push(p.parse_spread_or_assign()?);
                if !p.is(")") {
                    p.expect(",", "or `)` in argument list")?;
                }
            }
            Ok(args)
        })?;
        self.expect(")", "to close argument list")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Number => {
                let value = parse_number(&span)?;
                self.next_token()?;
                Ok(Ref::new(Expr::Number {
                    span,
                    value,
                    eidx: self.next_eidx(),
                }))
            }
            TokenKind::BigInt => {
                self.next_token()?;
                Ok(Ref::new(Expr::BigInt {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            TokenKind::String => {
                let value = cook_string(&span)?.map(Rc::from);
                self.next_token()?;
                Ok(Ref::new(Expr::String {
                    span,
                    value,
                    eidx: self.next_eidx(),
                }))
            }
            TokenKind::Template => self.parse_template(),
            TokenKind::PrivateName => {
                self.next_token()?;
                if !self.is("in") {
                    bail!(span.error("private name must be followed by `in`"));
                }
                Ok(Ref::new(Expr::PrivateName {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            TokenKind::Ident => self.parse_ident_primary(span),
            TokenKind::Symbol => match span.text() {
                "[" => self.parse_array(),
                "{" => self.parse_object(),
                "(" => {
                    self.next_token()?;
                    let expr = self.with_in(|p| p.parse_expr())?;
                    self.expect(")", "to close parenthesized expression")?;
                    let span = self.span(start);
                    Ok(Ref::new(Expr::Paren {
                        span,
                        expr,
                        eidx: self.next_eidx(),
                    }))
                }
                "/" | "/=" => {
                    self.tok = self.lexer.read_regex(start)?;
                    self.next_token()?;
                    let span = self.span(start);
                    Ok(Ref::new(Expr::Regex {
                        span,
                        eidx: self.next_eidx(),
                    }))
                }
                _ => Err(span.error("unexpected token")),
            },
            TokenKind::Eof => Err(span.error("unexpected end of input")),
            TokenKind::Regex => Err(span.error("unexpected token")),
        }
    }

    fn parse_ident_primary(&mut self, span: Span) -> Result<Ref<Expr>> {
        let start = span.start;
        match span.text() {
            "null" => {
                self.next_token()?;
                Ok(Ref::new(Expr::Null {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            "true" | "false" => {
                let value = span.text() == "true";
                self.next_token()?;
                Ok(Ref::new(Expr::Bool {
                    span,
                    value,
                    eidx: self.next_eidx(),
                }))
            }
            "this" => {
                self.next_token()?;
                Ok(Ref::new(Expr::This {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            "super" => {
                self.next_token()?;
                Ok(Ref::new(Expr::Super {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            "function" => {
                let func = self.parse_function(start, false, false)?;
                let span = self.span(start);
                Ok(Ref::new(Expr::Function {
                    span,
                    func,
                    eidx: self.next_eidx(),
                }))
            }
            "async" if self.async_function_follows()? => {
                self.next_token()?;
                let func = self.parse_function(start, true, false)?;
                let span = self.span(start);
                Ok(Ref::new(Expr::Function {
                    span,
                    func,
                    eidx: self.next_eidx(),
                }))
            }
            "class" => {
                let class = self.parse_class(false)?;
                let span = self.span(start);
                Ok(Ref::new(Expr::Class {
                    span,
                    class,
                    eidx: self.next_eidx(),
                }))
            }
            "import" => {
                self.next_token()?;
                if self.eat(".")? {
                    // import.meta
                    self.parse_ident_name()?;
                    let span = self.span(start);
                    return Ok(Ref::new(Expr::MetaProperty {
                        span,
                        eidx: self.next_eidx(),
                    }));
                }
                if !self.is("(") {
                    bail!(self.tok.1.error("expecting `(` after `import`"));
                }
                // The callee of a dynamic import.
                Ok(Ref::new(Expr::Ident {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
            "new" => self.parse_new(),
            text if is_reserved(text) => Err(span.error(&format!("unexpected keyword `{text}`"))),
            _ => {
                self.next_token()?;
                Ok(Ref::new(Expr::Ident {
                    span,
                    eidx: self.next_eidx(),
                }))
            }
        }
    }

    fn parse_template(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        let mut quasis = vec![];
        let mut exprs = vec![];
        loop {
            let chunk = self.tok.1.clone();
            if self.tok.0 != TokenKind::Template {
                bail!(chunk.error("expecting template literal"));
            }
            quasis.push(chunk.clone());
            self.next_token()?;
            // A chunk either closes the literal or opens a substitution.
            if !chunk.text().ends_with("${") {
                break;
            }

            exprs.push(self.with_in(|p| p.parse_expr())?);
            if !self.is("}") {
                bail!(self.tok.1.error("expecting `}` to close template substitution"));
            }
            self.tok = self.lexer.read_template_continuation(self.tok.1.start)?;
        }

        let span = self.span(start);
        Ok(Ref::new(Expr::Template {
            span,
            quasis,
            exprs,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_array(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        self.expect("[", "")?;
        let items = self.with_in(|p| {
            let mut items = vec![];
            while !p.is("]") {
                // Elision.
                if p.eat(",")? {
                    items.push(None);
                    continue;
                }
                items.push(Some(p.parse_spread_or_assign()?));
                if !p.is("]") {
                    p.expect(",", "or `]` in array literal")?;
                }
            }
            Ok(items)
        })?;
        self.expect("]", "to close array literal")?;
        let span = self.span(start);
        Ok(Ref::new(Expr::Array {
            span,
            items,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_object(&mut self) -> Result<Ref<Expr>> {
        let start = self.tok.1.start;
        self.expect("{", "")?;
        let props = self.with_in(|p| {
            let mut props = vec![];
            while !p.is("}") {
                props.push(p.parse_property()?);
                if !p.is("}") {
                    p.expect(",", "or `}` in object literal")?;
                }
            }
            Ok(props)
        })?;
        self.expect("}", "to close object literal")?;
        let span = self.span(start);
        Ok(Ref::new(Expr::Object {
            span,
            props,
            eidx: self.next_eidx(),
        }))
    }

    fn parse_property(&mut self) -> Result<Property> {
        let start = self.tok.1.start;
        if self.eat("...")? {
            let arg = self.parse_assign()?;
            return Ok(Property::Spread {
                span: self.span(start),
                arg,
            });
        }

        let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
        let key = self.parse_prop_key()?;
        if self.is("(") || kind != MethodKind::Method || is_async || is_generator {
            let fstart = self.tok.1.start;
            let func = self.parse_function_rest(fstart, None, is_async, is_generator)?;
            return Ok(Property::Method {
                span: self.span(start),
                kind,
                key,
                func,
            });
        }

        if self.eat(":")? {
            let value = self.parse_assign()?;
            return Ok(Property::Init {
                span: self.span(start),
                key,
                value,
                shorthand: false,
            });
        }

        // Shorthand `{a}`, or `{a = 1}` which is only valid as a pattern.
        let ident = match &key {
            PropKey::Ident(span) if !is_reserved(span.text()) => span.clone(),
            _ => bail!(self.tok.1.error("expecting `:` after property key")),
        };
        let value = if self.eat("=")? {
            let default = self.parse_assign()?;
            let span = self.span(start);
            Ref::new(Expr::Assign {
                span,
                op: AssignOp::Assign,
                target: Pattern::Ident(ident),
                value: default,
                eidx: self.next_eidx(),
            })
        } else {
            Ref::new(Expr::Ident {
                span: ident,
                eidx: self.next_eidx(),
            })
        };
        Ok(Property::Init {
            span: self.span(start),
            key,
            value,
            shorthand: true,
        })
    }

    // Reinterprets an expression as an assignment pattern (`[a, b] = x`).
    fn expr_to_pattern(&self, expr: &Ref<Expr>) -> Result<Pattern> {
        Ok(match expr.as_ref() {
            Expr::Ident { span, .. } => Pattern::Ident(span.clone()),
            Expr::Member {
                optional: false, ..
            } => Pattern::Expr(expr.clone()),
            Expr::Paren { expr: inner, .. } => self.simple_target(inner)?,
            Expr::Array { span, items, .. } => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let Some(item) = item else {
                        out.push(None);
                        continue;
                    };
                    out.push(Some(match item.as_ref() {
                        Expr::Spread { span, arg, .. } if idx + 1 == items.len() => {
                            Pattern::Rest {
                                span: span.clone(),
                                arg: Box::new(self.expr_to_pattern(arg)?),
                            }
                        }
                        _ => self.element_to_pattern(item)?,
                    }));
                }
                Pattern::Array {
                    span: span.clone(),
                    items: out,
                }
            }
            Expr::Object { span, props, .. } => {
                let mut out = Vec::with_capacity(props.len());
                for prop in props {
                    out.push(match prop {
                        Property::Init { key, value, .. } => PatternProp::KeyValue {
                            key: key.clone(),
                            value: self.element_to_pattern(value)?,
                        },
                        Property::Spread { arg, .. } => {
                            PatternProp::Rest(self.expr_to_pattern(arg)?)
                        }
                        Property::Method { span, .. } => {
                            bail!(span.error("invalid destructuring target"))
                        }
                    });
                }
                Pattern::Object {
                    span: span.clone(),
                    props: out,
                }
            }
            _ => bail!(expr.span().error("invalid assignment target")),
        })
    }

    // Destructuring elements may carry a default: `[a = 1] = x`.
    fn element_to_pattern(&self, expr: &Ref<Expr>) -> Result<Pattern> {
        match expr.as_ref() {
            Expr::Assign {
                span,
                op: AssignOp::Assign,
                target,
                value,
                ..
            } => Ok(Pattern::Assign {
                span: span.clone(),
                target: Box::new(target.clone()),
                default: value.clone(),
            }),
            _ => self.expr_to_pattern(expr),
        }
    }

    fn simple_target(&self, expr: &Ref<Expr>) -> Result<Pattern> {
        match expr.as_ref() {
            Expr::Ident { span, .. } => Ok(Pattern::Ident(span.clone())),
            Expr::Member {
                optional: false, ..
            } => Ok(Pattern::Expr(expr.clone())),
            Expr::Paren { expr: inner, .. } => self.simple_target(inner),
            _ => bail!(expr.span().error("invalid assignment target")),
        }
    }
}
