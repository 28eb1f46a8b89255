#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

pub mod span {
    use serde::Serialize;

    /// Half-open `[start, end)` byte range into the source buffer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }

    impl Span {
        pub fn new(start: u32, end: u32) -> Self {
            Self { start, end }
        }

        /// Smallest span covering both `self` and `other`.
        pub fn merge(self, other: Span) -> Span {
            Span {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            }
        }
    }
}

pub mod types {
    use serde::Serialize;

    /// Scalar types DL knows natively.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
    pub enum BuiltinType {
        U8,
        I8,
        U16,
        I16,
        U32,
        I32,
        U64,
        I64,
        F32,
        F64,
        Char,
    }

    impl BuiltinType {
        pub fn from_name(name: &str) -> Option<Self> {
            Some(match name {
                "u8" => BuiltinType::U8,
                "i8" => BuiltinType::I8,
                "u16" => BuiltinType::U16,
                "i16" => BuiltinType::I16,
                "u32" => BuiltinType::U32,
                "i32" => BuiltinType::I32,
                "u64" => BuiltinType::U64,
                "i64" => BuiltinType::I64,
                "f32" => BuiltinType::F32,
                "f64" => BuiltinType::F64,
                "char" => BuiltinType::Char,
                _ => return None,
            })
        }

        pub fn name(self) -> &'static str {
            match self {
                BuiltinType::U8 => "u8",
                BuiltinType::I8 => "i8",
                BuiltinType::U16 => "u16",
                BuiltinType::I16 => "i16",
                BuiltinType::U32 => "u32",
                BuiltinType::I32 => "i32",
                BuiltinType::U64 => "u64",
                BuiltinType::I64 => "i64",
                BuiltinType::F32 => "f32",
                BuiltinType::F64 => "f64",
                BuiltinType::Char => "char",
            }
        }

        /// The C type this scalar lowers to in the emitted source.
        pub fn c_type(self) -> &'static str {
            match self {
                BuiltinType::U8 => "unsigned char",
                BuiltinType::I8 => "char",
                BuiltinType::U16 => "unsigned short",
                BuiltinType::I16 => "short",
                BuiltinType::U32 => "unsigned int",
                BuiltinType::I32 => "int",
                BuiltinType::U64 => "unsigned long",
                BuiltinType::I64 => "long",
                BuiltinType::F32 => "float",
                BuiltinType::F64 => "double",
                BuiltinType::Char => "char",
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
    pub enum CustomTypeKind {
        Struct,
        Enum,
    }

    /// A user-declared struct or enum name. Equality is structural on both
    /// fields: a struct and an enum of the same name are distinct types.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
    pub struct CustomType {
        pub name: String,
        pub kind: CustomTypeKind,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub enum Type {
        Builtin(BuiltinType),
        Custom(CustomType),
    }

    impl Type {
        /// Lower to target-language spelling. Struct names pass through
        /// verbatim; enum values live in the `__dl_` backing struct, so
        /// declarations of enum type name that struct.
        pub fn c_type(&self) -> String {
            match self {
                Type::Builtin(builtin) => builtin.c_type().to_string(),
                Type::Custom(custom) => match custom.kind {
                    CustomTypeKind::Struct => custom.name.clone(),
                    CustomTypeKind::Enum => format!("__dl_{}", custom.name),
                },
            }
        }
    }

    /// One `[mut] <type><extensions> <name>` declaration, as written in
    /// function parameters, struct members and variable statements.
    ///
    /// `type_extensions` is the raw suffix between the type name and the
    /// variable name: pointer stars (`*`, `**`) or a fixed-size array
    /// suffix (`[16]`).
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct VariableDeclaration {
        pub is_mutable: bool,
        pub ty: Type,
        pub type_extensions: String,
        pub name: String,
    }

    impl VariableDeclaration {
        /// A `[N]` extension makes this an array declaration rather than a
        /// scalar one; the parser routes it to an array statement.
        pub fn is_fixed_size_array(&self) -> bool {
            self.type_extensions.starts_with('[') && self.type_extensions.ends_with(']')
        }
    }
}

pub mod ast {
    use super::span::Span;
    use super::types::{Type, VariableDeclaration};
    use indexmap::IndexMap;
    use serde::Serialize;
    use std::fmt;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub enum UnOp {
        /// `-`
        Neg,
        /// `!`
        Not,
        /// `++`
        Inc,
        /// `&`
        AddrOf,
        /// `*`
        Deref,
    }

    impl fmt::Display for UnOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                UnOp::Neg => "-",
                UnOp::Not => "!",
                UnOp::Inc => "++",
                UnOp::AddrOf => "&",
                UnOp::Deref => "*",
            })
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub enum BinOp {
        // field accessors
        Dot,
        Arrow,
        Scope,
        // arithmetic
        Add,
        Sub,
        Mul,
        Div,
        // equality
        Eq,
        Ne,
        // relational
        Lt,
        Le,
        Gt,
        Ge,
    }

    impl BinOp {
        /// Field accessors render without surrounding parentheses; every
        /// other binary operator is parenthesised on emission.
        pub fn is_field_accessor(self) -> bool {
            matches!(self, BinOp::Dot | BinOp::Arrow | BinOp::Scope)
        }
    }

    impl fmt::Display for BinOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                BinOp::Dot => ".",
                BinOp::Arrow => "->",
                BinOp::Scope => "::",
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div => "/",
                BinOp::Eq => "==",
                BinOp::Ne => "!=",
                BinOp::Lt => "<",
                BinOp::Le => "<=",
                BinOp::Gt => ">",
                BinOp::Ge => ">=",
            })
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub enum LogicalOp {
        And,
        Or,
    }

    impl fmt::Display for LogicalOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                LogicalOp::And => "&&",
                LogicalOp::Or => "||",
            })
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub enum AssignOp {
        Assign,
        AddAssign,
    }

    impl fmt::Display for AssignOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                AssignOp::Assign => "=",
                AssignOp::AddAssign => "+=",
            })
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub enum Expr {
        /// Number, string or boolean literal; the text is the verbatim
        /// lexeme (string literals keep their quotes).
        Literal {
            text: String,
            span: Span,
        },
        Variable {
            name: String,
            span: Span,
        },
        Unary {
            op: UnOp,
            expr: Box<Expr>,
            span: Span,
        },
        Binary {
            lhs: Box<Expr>,
            op: BinOp,
            rhs: Box<Expr>,
            span: Span,
        },
        Logical {
            lhs: Box<Expr>,
            op: LogicalOp,
            rhs: Box<Expr>,
            span: Span,
        },
        Grouping {
            inner: Box<Expr>,
            span: Span,
        },
        Call {
            callee: Box<Expr>,
            args: Vec<Expr>,
            span: Span,
        },
        Index {
            target: Box<Expr>,
            index: Box<Expr>,
            span: Span,
        },
        Assign {
            lhs: Box<Expr>,
            op: AssignOp,
            rhs: Box<Expr>,
            span: Span,
        },
        /// `Base::Variant` or `Base::Variant(args)` where `Base` names a
        /// declared enum.
        EnumPath {
            base: Box<Expr>,
            variant: Box<Expr>,
            span: Span,
        },
    }

    impl Expr {
        pub fn span(&self) -> Span {
            match self {
                Expr::Literal { span, .. }
                | Expr::Variable { span, .. }
                | Expr::Unary { span, .. }
                | Expr::Binary { span, .. }
                | Expr::Logical { span, .. }
                | Expr::Grouping { span, .. }
                | Expr::Call { span, .. }
                | Expr::Index { span, .. }
                | Expr::Assign { span, .. }
                | Expr::EnumPath { span, .. } => *span,
            }
        }

        /// Whether this expression may stand on the left of `=` / `+=`:
        /// a variable, an index, a dereference, or a field access.
        pub fn is_lvalue(&self) -> bool {
            match self {
                Expr::Variable { .. } | Expr::Index { .. } => true,
                Expr::Unary { op, .. } => *op == UnOp::Deref,
                Expr::Binary { op, .. } => matches!(op, BinOp::Dot | BinOp::Arrow),
                _ => false,
            }
        }
    }

    /// Statement sequence inside `{ }` (or a module section).
    #[derive(Clone, Debug, Default, PartialEq, Serialize)]
    pub struct Block {
        pub stmts: Vec<Stmt>,
    }

    impl Block {
        pub fn new(stmts: Vec<Stmt>) -> Self {
            Self { stmts }
        }

        pub fn is_empty(&self) -> bool {
            self.stmts.is_empty()
        }
    }

    /// One compilation unit. Sections are kept separate so the emitter can
    /// order the output: includes, enums, structs, functions.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct ModuleDef {
        pub name: String,
        /// Raw `include` path lexemes, quotes still attached.
        pub includes: Vec<String>,
        pub structs: Block,
        pub enums: Block,
        pub functions: Block,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct FunctionDef {
        pub name: String,
        pub params: Vec<VariableDeclaration>,
        /// DL-level return type spelling, including any extensions
        /// (`i32`, `Point`, `u8*`). `void` when omitted.
        pub return_type: String,
        pub body: Block,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct StructDef {
        pub name: String,
        pub fields: Vec<VariableDeclaration>,
    }

    /// Variant map is insertion-ordered: the emitter relies on declaration
    /// order for switch labels and constructor parameters.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct EnumDef {
        pub name: String,
        pub variants: IndexMap<String, Vec<Type>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub enum MatchLabel {
        Variant { base: String, variant: String },
        /// The `_` case.
        Default,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct MatchCase {
        pub label: MatchLabel,
        /// Names bound to the variant's payload fields, in field order.
        pub bindings: Vec<String>,
        pub body: Block,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub enum Stmt {
        Empty,
        Block(Block),
        Module(ModuleDef),
        Function(FunctionDef),
        If {
            cond: Expr,
            then_block: Block,
            else_block: Block,
        },
        Return {
            expr: Expr,
        },
        Variable {
            decl: VariableDeclaration,
            init: Expr,
        },
        While {
            cond: Expr,
            body: Block,
        },
        For {
            init: Box<Stmt>,
            cond: Expr,
            step: Expr,
            body: Block,
        },
        Expression {
            expr: Expr,
        },
        Array {
            decl: VariableDeclaration,
            elements: Vec<Expr>,
        },
        Struct(StructDef),
        Enum(EnumDef),
        Match {
            scrutinee: Expr,
            cases: Vec<MatchCase>,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::ast::{BinOp, Expr, UnOp};
    use super::span::Span;
    use super::types::{BuiltinType, CustomType, CustomTypeKind, Type, VariableDeclaration};

    fn var(name: &str) -> Expr {
        Expr::Variable {
            name: name.into(),
            span: Span::new(0, name.len() as u32),
        }
    }

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(4, 9);
        let b = Span::new(7, 15);
        assert_eq!(a.merge(b), Span::new(4, 15));
        assert_eq!(b.merge(a), Span::new(4, 15));
    }

    #[test]
    fn builtin_round_trips_names() {
        for name in [
            "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "f32", "f64", "char",
        ] {
            let ty = BuiltinType::from_name(name).unwrap();
            assert_eq!(ty.name(), name);
        }
        assert!(BuiltinType::from_name("void").is_none());
        assert!(BuiltinType::from_name("Point").is_none());
    }

    #[test]
    fn custom_type_equality_is_structural() {
        let struct_point = CustomType {
            name: "Point".into(),
            kind: CustomTypeKind::Struct,
        };
        let enum_point = CustomType {
            name: "Point".into(),
            kind: CustomTypeKind::Enum,
        };
        assert_ne!(struct_point, enum_point);
        assert_eq!(struct_point, struct_point.clone());
    }

    #[test]
    fn array_extension_classifies_declaration() {
        let mut decl = VariableDeclaration {
            is_mutable: false,
            ty: Type::Builtin(BuiltinType::I32),
            type_extensions: "[3]".into(),
            name: "xs".into(),
        };
        assert!(decl.is_fixed_size_array());
        decl.type_extensions = "*".into();
        assert!(!decl.is_fixed_size_array());
        decl.type_extensions.clear();
        assert!(!decl.is_fixed_size_array());
    }

    #[test]
    fn lvalue_rule() {
        assert!(var("x").is_lvalue());
        let deref = Expr::Unary {
            op: UnOp::Deref,
            expr: Box::new(var("p")),
            span: Span::new(0, 2),
        };
        assert!(deref.is_lvalue());
        let neg = Expr::Unary {
            op: UnOp::Neg,
            expr: Box::new(var("x")),
            span: Span::new(0, 2),
        };
        assert!(!neg.is_lvalue());
        let field = Expr::Binary {
            lhs: Box::new(var("p")),
            op: BinOp::Dot,
            rhs: Box::new(var("x")),
            span: Span::new(0, 3),
        };
        assert!(field.is_lvalue());
        let sum = Expr::Binary {
            lhs: Box::new(var("a")),
            op: BinOp::Add,
            rhs: Box::new(var("b")),
            span: Span::new(0, 5),
        };
        assert!(!sum.is_lvalue());
        let lit = Expr::Literal {
            text: "1".into(),
            span: Span::new(0, 1),
        };
        assert!(!lit.is_lvalue());
    }
}
