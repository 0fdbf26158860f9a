use crate::token::Token;

/// Parse-time identity of an expression node.
///
/// The parser hands every `Variable`, `Assign`, `This`, and `Super` node an
/// id drawn from a session-wide counter; the resolver keys its
/// scope-distance table on these ids, so a node's resolution is fixed once
/// and survives repeated walks of the same AST and later submissions in the
/// same interactive session.
pub type ExprId = usize;

/// A literal constant that appears directly in the source code.
///
/// These variants are the terminal leaves of the expression tree and do
/// **not** retain a reference to the originating [`Token`]: the parser
/// copies the value at parse-time so the AST owns its literals.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE-754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// AST node for every kind of Lox *expression*.
///
/// Nodes form a tree with no sharing; each variant holds only its operand
/// sub-expressions and the tokens needed for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression: `!isReady`, `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,

        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,

        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,

        right: Box<Expr>,
    },

    /// Short-circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable access, resolved against the scope-distance table.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function or method call: `clock()`, `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable.
        callee: Box<Expr>,

        /// The closing `)` token, retained for error reporting.
        paren: Token,

        /// Argument list (at most 255 entries).
        arguments: Vec<Expr>,
    },

    /// Property access: `object.property`.
    Get { object: Box<Expr>, name: Token },

    /// Property assignment: `object.property = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method body.
    This { id: ExprId, keyword: Token },

    /// `super.method` inside a subclass method body.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}
