// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Syntax tree traversal.
//!
//! Override the `visit_*` methods to act on particular nodes. The default
//! implementations call the matching `walk_*` function, which visits every
//! child node. An override that wants the children visited too calls the
//! `walk_*` function itself.

use crate::ast::*;

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Ref<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Ref<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        walk_pattern(self, pattern);
    }

    fn visit_function(&mut self, func: &Function) {
        walk_function(self, func);
    }

    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }

    // Only computed keys hold expressions.
    fn visit_prop_key(&mut self, key: &PropKey) {
        if let PropKey::Computed { expr, .. } = key {
            self.visit_expr(expr);
        }
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    walk_stmts(visitor, &program.body);
}

fn walk_stmts<V: Visitor + ?Sized>(visitor: &mut V, stmts: &[Ref<Stmt>]) {
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
}

fn walk_var_decl<V: Visitor + ?Sized>(visitor: &mut V, decl: &VarDecl) {
    for d in &decl.decls {
        visitor.visit_pattern(&d.id);
        if let Some(init) = &d.init {
            visitor.visit_expr(init);
        }
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Ref<Stmt>) {
    match stmt.as_ref() {
        Stmt::Expr { expr, .. } => visitor.visit_expr(expr),
        Stmt::Var { decl, .. } => walk_var_decl(visitor, decl),
        Stmt::Function { func, .. } => visitor.visit_function(func),
        Stmt::Class { class, .. } => visitor.visit_class(class),
        Stmt::Return { arg, .. } => {
            if let Some(arg) = arg {
                visitor.visit_expr(arg);
            }
        }
        Stmt::If {
            test, cons, alt, ..
        } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(cons);
            if let Some(alt) = alt {
                visitor.visit_stmt(alt);
            }
        }
        Stmt::Block { body, .. } => walk_stmts(visitor, body),
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(ForInit::Var(decl)) => walk_var_decl(visitor, decl),
                Some(ForInit::Expr(expr)) => visitor.visit_expr(expr),
                None => (),
            }
            if let Some(test) = test {
                visitor.visit_expr(test);
            }
            if let Some(update) = update {
                visitor.visit_expr(update);
            }
            visitor.visit_stmt(body);
        }
        Stmt::ForIn {
            left, right, body, ..
        }
        | Stmt::ForOf {
            left, right, body, ..
        } => {
            match left {
                ForHead::Var(decl) => walk_var_decl(visitor, decl),
                ForHead::Pattern(pattern) => visitor.visit_pattern(pattern),
            }
            visitor.visit_expr(right);
            visitor.visit_stmt(body);
        }
        Stmt::While { test, body, .. } | Stmt::DoWhile { test, body, .. } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(body);
        }
        Stmt::Throw { arg, .. } => visitor.visit_expr(arg),
        Stmt::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            walk_stmts(visitor, block);
            if let Some(handler) = handler {
                if let Some(param) = &handler.param {
                    visitor.visit_pattern(param);
                }
                walk_stmts(visitor, &handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_stmts(visitor, finalizer);
            }
        }
        Stmt::Switch {
            discriminant,
            cases,
            ..
        } => {
            visitor.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expr(test);
                }
                walk_stmts(visitor, &case.body);
            }
        }
        Stmt::Labeled { body, .. } => visitor.visit_stmt(body),
        Stmt::Export { kind, .. } => match kind {
            ExportKind::Decl(stmt) | ExportKind::DefaultDecl(stmt) => visitor.visit_stmt(stmt),
            ExportKind::DefaultExpr(expr) => visitor.visit_expr(expr),
            ExportKind::Named { .. } | ExportKind::All { .. } => (),
        },
        Stmt::Break { .. }
        | Stmt::Continue { .. }
        | Stmt::Empty { .. }
        | Stmt::Debugger { .. }
        | Stmt::Import { .. } => (),
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Ref<Expr>) {
    match expr.as_ref() {
        Expr::Null { .. }
        | Expr::Bool { .. }
        | Expr::Number { .. }
        | Expr::String { .. }
        | Expr::BigInt { .. }
        | Expr::Regex { .. }
        | Expr::Ident { .. }
        | Expr::This { .. }
        | Expr::Super { .. }
        | Expr::PrivateName { .. }
        | Expr::MetaProperty { .. } => (),

        Expr::Template { exprs, .. } | Expr::Sequence { exprs, .. } => {
            for e in exprs {
                visitor.visit_expr(e);
            }
        }
        Expr::TaggedTemplate { tag, quasi, .. } => {
            visitor.visit_expr(tag);
            visitor.visit_expr(quasi);
        }
        Expr::Array { items, .. } => {
            for item in items.iter().flatten() {
                visitor.visit_expr(item);
            }
        }
        Expr::Object { props, .. } => {
            for prop in props {
                match prop {
                    Property::Init { key, value, .. } => {
                        visitor.visit_prop_key(key);
                        visitor.visit_expr(value);
                    }
                    Property::Method { key, func, .. } => {
                        visitor.visit_prop_key(key);
                        visitor.visit_function(func);
                    }
                    Property::Spread { arg, .. } => visitor.visit_expr(arg),
                }
            }
        }
        Expr::Function { func, .. } => visitor.visit_function(func),
        Expr::Arrow { params, body, .. } => {
            for param in params {
                visitor.visit_pattern(param);
            }
            match body {
                ArrowBody::Expr(e) => visitor.visit_expr(e),
                ArrowBody::Block(stmts) => walk_stmts(visitor, stmts),
            }
        }
        Expr::Class { class, .. } => visitor.visit_class(class),
        Expr::Unary { arg, .. }
        | Expr::Update { arg, .. }
        | Expr::Spread { arg, .. }
        | Expr::Await { arg, .. } => visitor.visit_expr(arg),
        Expr::Paren { expr, .. } => visitor.visit_expr(expr),
        Expr::Binary { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        Expr::Assign { target, value, .. } => {
            visitor.visit_pattern(target);
            visitor.visit_expr(value);
        }
        Expr::Conditional {
            test, cons, alt, ..
        } => {
            visitor.visit_expr(test);
            visitor.visit_expr(cons);
            visitor.visit_expr(alt);
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args, .. } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Member { object, prop, .. } => {
            visitor.visit_expr(object);
            if let MemberProp::Computed(index) = prop {
                visitor.visit_expr(index);
            }
        }
        Expr::Yield { arg, .. } => {
            if let Some(arg) = arg {
                visitor.visit_expr(arg);
            }
        }
    }
}

pub fn walk_pattern<V: Visitor + ?Sized>(visitor: &mut V, pattern: &Pattern) {
    match pattern {
        Pattern::Ident(_) => (),
        Pattern::Object { props, .. } => {
            for prop in props {
                match prop {
                    PatternProp::KeyValue { key, value } => {
                        visitor.visit_prop_key(key);
                        visitor.visit_pattern(value);
                    }
                    PatternProp::Rest(rest) => visitor.visit_pattern(rest),
                }
            }
        }
        Pattern::Array { items, .. } => {
            for item in items.iter().flatten() {
                visitor.visit_pattern(item);
            }
        }
        Pattern::Assign {
            target, default, ..
        } => {
            visitor.visit_pattern(target);
            visitor.visit_expr(default);
        }
        Pattern::Rest { arg, .. } => visitor.visit_pattern(arg),
        Pattern::Expr(expr) => visitor.visit_expr(expr),
    }
}

pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, func: &Function) {
    for param in &func.params {
        visitor.visit_pattern(param);
    }
    walk_stmts(visitor, &func.body);
}

pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &Class) {
    if let Some(super_class) = &class.super_class {
        visitor.visit_expr(super_class);
    }
    for member in &class.members {
        match member {
            ClassMember::Method { key, func, .. } => {
                visitor.visit_prop_key(key);
                visitor.visit_function(func);
            }
            ClassMember::Field { key, value, .. } => {
                visitor.visit_prop_key(key);
                if let Some(value) = value {
                    visitor.visit_expr(value);
                }
            }
            ClassMember::StaticBlock { body, .. } => walk_stmts(visitor, body),
        }
    }
}
