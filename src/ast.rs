// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::number::Number;

use core::{cmp, fmt, ops::Deref};
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UpdateOp {
    Inc,
    Dec,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstanceOf,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssignOp {
    Assign,
    Arith(BinOp),
    Logical(LogicalOp),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> cmp::Ord for NodeRef<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Rc::as_ptr(&self.r).cmp(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::PartialOrd for NodeRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

/// Key of an object literal property, class member or destructuring property.
#[derive(Debug, Clone)]
pub enum PropKey {
    Ident(Span),
    String {
        span: Span,
        // None if the literal holds an unpaired surrogate.
        value: Option<Rc<str>>,
    },
    Number {
        span: Span,
        value: Number,
    },
    // `[expr]`
    Computed {
        span: Span,
        expr: Ref<Expr>,
    },
    Private(Span),
}

impl PropKey {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Ident(ref span)
            | Self::String { ref span, .. }
            | Self::Number { ref span, .. }
            | Self::Computed { ref span, .. }
            | Self::Private(ref span) => span,
        }
    }
}

#[derive(Debug)]
pub enum Property {
    // `key: value`, or `key` when shorthand.
    Init {
        span: Span,
        key: PropKey,
        value: Ref<Expr>,
        shorthand: bool,
    },
    Method {
        span: Span,
        kind: MethodKind,
        key: PropKey,
        func: Ref<Function>,
    },
    Spread {
        span: Span,
        arg: Ref<Expr>,
    },
}

impl Property {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Init { ref span, .. }
            | Self::Method { ref span, .. }
            | Self::Spread { ref span, .. } => span,
        }
    }
}

#[derive(Debug)]
pub struct Function {
    pub span: Span,
    pub id: Option<Span>,
    pub params: Vec<Pattern>,
    pub body: Vec<Ref<Stmt>>,
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug)]
pub enum ArrowBody {
    Expr(Ref<Expr>),
    Block(Vec<Ref<Stmt>>),
}

#[derive(Debug)]
pub struct Class {
    pub span: Span,
    pub id: Option<Span>,
    pub super_class: Option<Ref<Expr>>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug)]
pub enum ClassMember {
    Method {
        span: Span,
        is_static: bool,
        kind: MethodKind,
        key: PropKey,
        func: Ref<Function>,
    },
    Field {
        span: Span,
        is_static: bool,
        key: PropKey,
        value: Option<Ref<Expr>>,
    },
    StaticBlock {
        span: Span,
        body: Vec<Ref<Stmt>>,
    },
}

/// Binding and assignment targets.
#[derive(Debug, Clone)]
pub enum Pattern {
    Ident(Span),
    Object {
        span: Span,
        props: Vec<PatternProp>,
    },
    Array {
        span: Span,
        items: Vec<Option<Pattern>>,
    },
    // `target = default`
    Assign {
        span: Span,
        target: Box<Pattern>,
        default: Ref<Expr>,
    },
    Rest {
        span: Span,
        arg: Box<Pattern>,
    },
    // Member expressions in assignment position.
    Expr(Ref<Expr>),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Self::Ident(span)
            | Self::Object { span, .. }
            | Self::Array { span, .. }
            | Self::Assign { span, .. }
            | Self::Rest { span, .. } => span,
            Self::Expr(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PatternProp {
    KeyValue { key: PropKey, value: Pattern },
    Rest(Pattern),
}

#[derive(Debug, Clone)]
pub enum MemberProp {
    Ident(Span),
    Private(Span),
    Computed(Ref<Expr>),
}

#[derive(Debug)]
pub enum Expr {
    // Literals.
    Null {
        span: Span,
        eidx: u32,
    },

    Bool {
        span: Span,
        value: bool,
        eidx: u32,
    },

    Number {
        span: Span,
        value: Number,
        eidx: u32,
    },

    String {
        span: Span,
        // None if the literal holds an unpaired surrogate.
        value: Option<Rc<str>>,
        eidx: u32,
    },

    BigInt {
        span: Span,
        eidx: u32,
    },

    Regex {
        span: Span,
        eidx: u32,
    },

    Template {
        span: Span,
        quasis: Vec<Span>,
        exprs: Vec<Ref<Expr>>,
        eidx: u32,
    },

    TaggedTemplate {
        span: Span,
        tag: Ref<Expr>,
        quasi: Ref<Expr>,
        eidx: u32,
    },

    Ident {
        span: Span,
        eidx: u32,
    },

    This {
        span: Span,
        eidx: u32,
    },

    Super {
        span: Span,
        eidx: u32,
    },

    // `#x` on the left of `in`.
    PrivateName {
        span: Span,
        eidx: u32,
    },

    // Holes are None.
    Array {
        span: Span,
        items: Vec<Option<Ref<Expr>>>,
        eidx: u32,
    },

    Object {
        span: Span,
        props: Vec<Property>,
        eidx: u32,
    },

    Function {
        span: Span,
        func: Ref<Function>,
        eidx: u32,
    },

    Arrow {
        span: Span,
        params: Vec<Pattern>,
        body: ArrowBody,
        is_async: bool,
        eidx: u32,
    },

    Class {
        span: Span,
        class: Ref<Class>,
        eidx: u32,
    },

    Unary {
        span: Span,
        op: UnaryOp,
        arg: Ref<Expr>,
        eidx: u32,
    },

    Update {
        span: Span,
        op: UpdateOp,
        prefix: bool,
        arg: Ref<Expr>,
        eidx: u32,
    },

    Binary {
        span: Span,
        op: BinOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
        eidx: u32,
    },

    Logical {
        span: Span,
        op: LogicalOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
        eidx: u32,
    },

    Assign {
        span: Span,
        op: AssignOp,
        target: Pattern,
        value: Ref<Expr>,
        eidx: u32,
    },

    Conditional {
        span: Span,
        test: Ref<Expr>,
        cons: Ref<Expr>,
        alt: Ref<Expr>,
        eidx: u32,
    },

    Call {
        span: Span,
        callee: Ref<Expr>,
        args: Vec<Ref<Expr>>,
        optional: bool,
        eidx: u32,
    },

    New {
        span: Span,
        callee: Ref<Expr>,
        args: Vec<Ref<Expr>>,
        eidx: u32,
    },

    Member {
        span: Span,
        object: Ref<Expr>,
        prop: MemberProp,
        optional: bool,
        eidx: u32,
    },

    Sequence {
        span: Span,
        exprs: Vec<Ref<Expr>>,
        eidx: u32,
    },

    Spread {
        span: Span,
        arg: Ref<Expr>,
        eidx: u32,
    },

    Paren {
        span: Span,
        expr: Ref<Expr>,
        eidx: u32,
    },

    Yield {
        span: Span,
        arg: Option<Ref<Expr>>,
        delegate: bool,
        eidx: u32,
    },

    Await {
        span: Span,
        arg: Ref<Expr>,
        eidx: u32,
    },

    // `new.target`, `import.meta`
    MetaProperty {
        span: Span,
        eidx: u32,
    },
}

impl Expr {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Null { ref span, .. }
            | Self::Bool { ref span, .. }
            | Self::Number { ref span, .. }
            | Self::String { ref span, .. }
            | Self::BigInt { ref span, .. }
            | Self::Regex { ref span, .. }
            | Self::Template { ref span, .. }
            | Self::TaggedTemplate { ref span, .. }
            | Self::Ident { ref span, .. }
            | Self::This { ref span, .. }
            | Self::Super { ref span, .. }
            | Self::PrivateName { ref span, .. }
            | Self::Array { ref span, .. }
            | Self::Object { ref span, .. }
            | Self::Function { ref span, .. }
            | Self::Arrow { ref span, .. }
            | Self::Class { ref span, .. }
            | Self::Unary { ref span, .. }
            | Self::Update { ref span, .. }
            | Self::Binary { ref span, .. }
            | Self::Logical { ref span, .. }
            | Self::Assign { ref span, .. }
            | Self::Conditional { ref span, .. }
            | Self::Call { ref span, .. }
            | Self::New { ref span, .. }
            | Self::Member { ref span, .. }
            | Self::Sequence { ref span, .. }
            | Self::Spread { ref span, .. }
            | Self::Paren { ref span, .. }
            | Self::Yield { ref span, .. }
            | Self::Await { ref span, .. }
            | Self::MetaProperty { ref span, .. } => span,
        }
    }

    pub const fn eidx(&self) -> u32 {
        match *self {
            Self::Null { eidx, .. }
            | Self::Bool { eidx, .. }
            | Self::Number { eidx, .. }
            | Self::String { eidx, .. }
            | Self::BigInt { eidx, .. }
            | Self::Regex { eidx, .. }
            | Self::Template { eidx, .. }
            | Self::TaggedTemplate { eidx, .. }
            | Self::Ident { eidx, .. }
            | Self::This { eidx, .. }
            | Self::Super { eidx, .. }
            | Self::PrivateName { eidx, .. }
            | Self::Array { eidx, .. }
            | Self::Object { eidx, .. }
            | Self::Function { eidx, .. }
            | Self::Arrow { eidx, .. }
            | Self::Class { eidx, .. }
            | Self::Unary { eidx, .. }
            | Self::Update { eidx, .. }
            | Self::Binary { eidx, .. }
            | Self::Logical { eidx, .. }
            | Self::Assign { eidx, .. }
            | Self::Conditional { eidx, .. }
            | Self::Call { eidx, .. }
            | Self::New { eidx, .. }
            | Self::Member { eidx, .. }
            | Self::Sequence { eidx, .. }
            | Self::Spread { eidx, .. }
            | Self::Paren { eidx, .. }
            | Self::Yield { eidx, .. }
            | Self::Await { eidx, .. }
            | Self::MetaProperty { eidx, .. } => eidx,
        }
    }
}

#[derive(Debug)]
pub struct VarDeclarator {
    pub span: Span,
    pub id: Pattern,
    pub init: Option<Ref<Expr>>,
}

#[derive(Debug)]
pub struct VarDecl {
    pub span: Span,
    pub kind: VarKind,
    pub decls: Vec<VarDeclarator>,
}

#[derive(Debug)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Ref<Expr>),
}

#[derive(Debug)]
pub enum ForHead {
    Var(VarDecl),
    Pattern(Pattern),
}

#[derive(Debug)]
pub struct CatchClause {
    pub span: Span,
    pub param: Option<Pattern>,
    pub body: Vec<Ref<Stmt>>,
}

#[derive(Debug)]
pub struct SwitchCase {
    pub span: Span,
    // None for `default:`
    pub test: Option<Ref<Expr>>,
    pub body: Vec<Ref<Stmt>>,
}

#[derive(Debug)]
pub enum ExportKind {
    // `export var|let|const|function|class ...`
    Decl(Ref<Stmt>),
    // `export default function ...` and `export default class ...`
    DefaultDecl(Ref<Stmt>),
    DefaultExpr(Ref<Expr>),
    // `export { a, b as c } [from "m"]`
    Named { source: Option<Span> },
    // `export * [as ns] from "m"`
    All { source: Span },
}

#[derive(Debug)]
pub enum Stmt {
    Expr {
        span: Span,
        expr: Ref<Expr>,
    },
    Var {
        span: Span,
        decl: VarDecl,
    },
    Function {
        span: Span,
        func: Ref<Function>,
    },
    Class {
        span: Span,
        class: Ref<Class>,
    },
    Return {
        span: Span,
        arg: Option<Ref<Expr>>,
    },
    If {
        span: Span,
        test: Ref<Expr>,
        cons: Ref<Stmt>,
        alt: Option<Ref<Stmt>>,
    },
    Block {
        span: Span,
        body: Vec<Ref<Stmt>>,
    },
    For {
        span: Span,
        init: Option<ForInit>,
        test: Option<Ref<Expr>>,
        update: Option<Ref<Expr>>,
        body: Ref<Stmt>,
    },
    ForIn {
        span: Span,
        left: ForHead,
        right: Ref<Expr>,
        body: Ref<Stmt>,
    },
    ForOf {
        span: Span,
        left: ForHead,
        right: Ref<Expr>,
        body: Ref<Stmt>,
        is_await: bool,
    },
    While {
        span: Span,
        test: Ref<Expr>,
        body: Ref<Stmt>,
    },
    DoWhile {
        span: Span,
        body: Ref<Stmt>,
        test: Ref<Expr>,
    },
    Break {
        span: Span,
        label: Option<Span>,
    },
    Continue {
        span: Span,
        label: Option<Span>,
    },
    Throw {
        span: Span,
        arg: Ref<Expr>,
    },
    Try {
        span: Span,
        block: Vec<Ref<Stmt>>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Ref<Stmt>>>,
    },
    Switch {
        span: Span,
        discriminant: Ref<Expr>,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        span: Span,
        label: Span,
        body: Ref<Stmt>,
    },
    Empty {
        span: Span,
    },
    Debugger {
        span: Span,
    },
    // Import declarations bind names only; they hold no expressions.
    Import {
        span: Span,
        source: Span,
    },
    Export {
        span: Span,
        kind: ExportKind,
    },
}

impl Stmt {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Expr { ref span, .. }
            | Self::Var { ref span, .. }
            | Self::Function { ref span, .. }
            | Self::Class { ref span, .. }
            | Self::Return { ref span, .. }
            | Self::If { ref span, .. }
            | Self::Block { ref span, .. }
            | Self::For { ref span, .. }
            | Self::ForIn { ref span, .. }
            | Self::ForOf { ref span, .. }
            | Self::While { ref span, .. }
            | Self::DoWhile { ref span, .. }
            | Self::Break { ref span, .. }
            | Self::Continue { ref span, .. }
            | Self::Throw { ref span, .. }
            | Self::Try { ref span, .. }
            | Self::Switch { ref span, .. }
            | Self::Labeled { ref span, .. }
            | Self::Empty { ref span, .. }
            | Self::Debugger { ref span, .. }
            | Self::Import { ref span, .. }
            | Self::Export { ref span, .. } => span,
        }
    }
}

/// A parsed module.
#[derive(Debug)]
pub struct Program {
    pub span: Span,
    pub body: Vec<Ref<Stmt>>,
    // Number of expressions in the program. `eidx` values lie in 0..num_expressions.
    pub num_expressions: u32,
}
