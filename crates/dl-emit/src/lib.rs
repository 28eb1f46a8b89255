//! AST → C++17 text. A pure function of the tree: no diagnostics, no
//! registry lookups, no semantic checks. Everything the lowering needs is
//! already on the nodes.

#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

use dl_ast::ast::{
    Block, EnumDef, Expr, FunctionDef, MatchCase, MatchLabel, ModuleDef, Stmt, StructDef,
};
use dl_ast::types::{BuiltinType, VariableDeclaration};

/// Emit a whole project, one module after another.
pub fn emit_modules(modules: &[ModuleDef]) -> String {
    let rendered: Vec<String> = modules.iter().map(emit_module).collect();
    rendered.join("\n")
}

/// Sections in fixed order: includes, enums, structs, functions.
pub fn emit_module(module: &ModuleDef) -> String {
    let mut sections = Vec::new();
    for include in &module.includes {
        sections.push(format!("#include <{}>", strip_quotes(include)));
    }
    for block in [&module.enums, &module.structs, &module.functions] {
        let text = emit_block(block);
        if !text.is_empty() {
            sections.push(text);
        }
    }
    sections.join("\n")
}

/// The include path lexeme still carries its source quotes; drop them and
/// let the emitter pick the bracket form.
fn strip_quotes(lexeme: &str) -> &str {
    if lexeme.len() >= 2 {
        &lexeme[1..lexeme.len() - 1]
    } else {
        lexeme
    }
}

pub fn emit_block(block: &Block) -> String {
    let rendered: Vec<String> = block
        .stmts
        .iter()
        .map(emit_stmt)
        .filter(|text| !text.is_empty())
        .collect();
    rendered.join("\n")
}

fn braced(body: &str) -> String {
    if body.is_empty() {
        String::from("{\n}")
    } else {
        format!("{{\n{body}\n}}")
    }
}

pub fn emit_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Empty => String::new(),
        Stmt::Block(block) => emit_block(block),
        Stmt::Module(module) => emit_module(module),
        Stmt::Function(def) => emit_function(def),
        Stmt::If {
            cond,
            then_block,
            else_block,
        } => {
            let mut out = format!(
                "if ({}) {}",
                emit_expr(cond),
                braced(&emit_block(then_block))
            );
            if !else_block.is_empty() {
                out.push_str(&format!(" else {}", braced(&emit_block(else_block))));
            }
            out
        }
        Stmt::Return { expr } => format!("return {};", emit_expr(expr)),
        Stmt::Variable { decl, init } => {
            format!(
                "{}{}{} {} = {};",
                mutability(decl),
                decl.ty.c_type(),
                decl.type_extensions,
                decl.name,
                emit_expr(init)
            )
        }
        Stmt::While { cond, body } => {
            format!("while ({}) {}", emit_expr(cond), braced(&emit_block(body)))
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => format!(
            "for ({} {}; {}) {}",
            emit_stmt(init),
            emit_expr(cond),
            emit_expr(step),
            braced(&emit_block(body))
        ),
        Stmt::Expression { expr } => format!("{};", emit_expr(expr)),
        Stmt::Array { decl, elements } => {
            let elements: Vec<String> = elements.iter().map(emit_expr).collect();
            format!(
                "{}{} {}{} = {{{}}};",
                mutability(decl),
                decl.ty.c_type(),
                decl.name,
                decl.type_extensions,
                elements.join(", ")
            )
        }
        Stmt::Struct(def) => emit_struct(def),
        Stmt::Enum(def) => emit_enum(def),
        Stmt::Match { scrutinee, cases } => emit_match(scrutinee, cases),
    }
}

fn mutability(decl: &VariableDeclaration) -> &'static str {
    if decl.is_mutable {
        ""
    } else {
        "const "
    }
}

fn emit_function(def: &FunctionDef) -> String {
    let return_type = BuiltinType::from_name(&def.return_type)
        .map(|builtin| builtin.c_type().to_string())
        .unwrap_or_else(|| def.return_type.clone());
    let params: Vec<String> = def
        .params
        .iter()
        .map(|param| {
            format!(
                "{}{}{} {}",
                mutability(param),
                param.ty.c_type(),
                param.type_extensions,
                param.name
            )
        })
        .collect();
    format!(
        "{} {}({}) {}",
        return_type,
        def.name,
        params.join(", "),
        braced(&emit_block(&def.body))
    )
}

/// A record plus a `create` factory returning a designated-initialiser
/// value, fields in declaration order.
fn emit_struct(def: &StructDef) -> String {
    let mut out = format!("struct {} {{\n", def.name);
    for field in &def.fields {
        out.push_str(&format!(
            "{}{} {};\n",
            field.ty.c_type(),
            field.type_extensions,
            field.name
        ));
    }
    let params: Vec<String> = def
        .fields
        .iter()
        .map(|field| {
            format!(
                "{}{} {}",
                field.ty.c_type(),
                field.type_extensions,
                field.name
            )
        })
        .collect();
    out.push_str(&format!(
        "static {} create({}) {{\n",
        def.name,
        params.join(", ")
    ));
    if def.fields.is_empty() {
        out.push_str("return {};\n");
    } else {
        let inits: Vec<String> = def
            .fields
            .iter()
            .map(|field| format!(".{} = {}", field.name, field.name))
            .collect();
        out.push_str(&format!("return {{ {} }};\n", inits.join(", ")));
    }
    out.push_str("}\n};");
    out
}

/// Two emissions per enum: the plain `enum class` used as the tag, and the
/// `__dl_` backing struct holding the tag plus a union with one field
/// record per variant, filled by per-variant static factories. Variant
/// order follows the declaration.
fn emit_enum(def: &EnumDef) -> String {
    let name = &def.name;
    let mut out = format!("enum class {name} : unsigned char {{\n");
    for variant in def.variants.keys() {
        out.push_str(&format!("{variant},\n"));
    }
    out.push_str("};\n");

    out.push_str(&format!("struct __dl_{name} {{\n"));
    out.push_str(&format!("{name} type;\n"));
    out.push_str("union {\n");
    for (variant, fields) in &def.variants {
        out.push_str("struct {\n");
        for (index, field) in fields.iter().enumerate() {
            out.push_str(&format!("{} data_{index};\n", field.c_type()));
        }
        out.push_str(&format!("}} {variant}_data;\n"));
    }
    out.push_str("};\n");

    for (variant, fields) in &def.variants {
        let params: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(index, field)| format!("{} {variant}_{index}", field.c_type()))
            .collect();
        out.push_str(&format!(
            "static __dl_{name} {variant}({}) {{\n",
            params.join(", ")
        ));
        out.push_str(&format!("__dl_{name} result;\n"));
        out.push_str(&format!("result.type = {name}::{variant};\n"));
        for index in 0..fields.len() {
            out.push_str(&format!(
                "result.{variant}_data.data_{index} = {variant}_{index};\n"
            ));
        }
        out.push_str("return result;\n}\n");
    }
    out.push_str("};");
    out
}

/// `match` lowers to a `switch` on the backing struct's tag. Destructuring
/// names alias the matched variant's union fields; the `_` case becomes
/// `default`.
fn emit_match(scrutinee: &Expr, cases: &[MatchCase]) -> String {
    let scrutinee = emit_expr(scrutinee);
    let mut out = format!("switch ({scrutinee}.type) {{\n");
    for case in cases {
        match &case.label {
            MatchLabel::Variant { base, variant } => {
                out.push_str(&format!("case {base}::{variant}: {{\n"));
                for (index, binding) in case.bindings.iter().enumerate() {
                    out.push_str(&format!(
                        "const auto {binding} = {scrutinee}.{variant}_data.data_{index};\n"
                    ));
                }
            }
            MatchLabel::Default => out.push_str("default: {\n"),
        }
        let body = emit_block(&case.body);
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }
        out.push_str("break;\n}\n");
    }
    out.push('}');
    out
}

pub fn emit_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { text, .. } => text.clone(),
        Expr::Variable { name, .. } => name.clone(),
        Expr::Unary { op, expr, .. } => format!("({op}{})", emit_expr(expr)),
        Expr::Binary { lhs, op, rhs, .. } => {
            let lhs = emit_expr(lhs);
            let rhs = emit_expr(rhs);
            if op.is_field_accessor() {
                format!("{lhs}{op}{rhs}")
            } else {
                format!("({lhs} {op} {rhs})")
            }
        }
        Expr::Logical { lhs, op, rhs, .. } => {
            format!("{} {op} {}", emit_expr(lhs), emit_expr(rhs))
        }
        Expr::Grouping { inner, .. } => {
            let rendered = emit_expr(inner);
            // binary and unary nodes already render parenthesised; wrapping
            // them again would double the parentheses
            match inner.as_ref() {
                Expr::Binary { op, .. } if !op.is_field_accessor() => rendered,
                Expr::Unary { .. } | Expr::Grouping { .. } => rendered,
                _ => format!("({rendered})"),
            }
        }
        Expr::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(emit_expr).collect();
            format!("{}({})", emit_expr(callee), args.join(", "))
        }
        Expr::Index { target, index, .. } => {
            format!("{}[{}]", emit_expr(target), emit_expr(index))
        }
        Expr::Assign { lhs, op, rhs, .. } => {
            format!("{} {op} {}", emit_expr(lhs), emit_expr(rhs))
        }
        Expr::EnumPath { base, variant, .. } => {
            format!("__dl_{}::{}", emit_expr(base), emit_expr(variant))
        }
    }
}
