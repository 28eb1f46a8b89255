use dl_ast::ast::{Expr, ModuleDef, Stmt};
use dl_ast::types::{BuiltinType, CustomTypeKind, Type};
use dl_parse::{lex, parse, Supervisor};

fn parse_ok(src: &str) -> Vec<ModuleDef> {
    let mut sup = Supervisor::new(src.to_string(), "test.dl");
    let tokens = lex(src, &mut sup);
    assert!(!sup.has_errors(), "lex errors: {:?}", sup.errors());
    let modules = parse(tokens, &mut sup);
    assert!(!sup.has_errors(), "parse errors: {:?}", sup.errors());
    modules
}

fn first_function(modules: &[ModuleDef]) -> &dl_ast::ast::FunctionDef {
    let Stmt::Function(f) = &modules[0].functions.stmts[0] else {
        panic!("expected a function");
    };
    f
}

#[test]
fn function_signature_with_params_and_return_type() {
    let modules = parse_ok("fn id(i32 x) -> i32 { return x }");
    let f = first_function(&modules);
    assert_eq!(f.name, "id");
    assert_eq!(f.return_type, "i32");
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.params[0].name, "x");
    assert!(!f.params[0].is_mutable);
    assert_eq!(f.params[0].ty, Type::Builtin(BuiltinType::I32));
}

#[test]
fn return_type_defaults_to_void() {
    let modules = parse_ok("fn noop() { }");
    assert_eq!(first_function(&modules).return_type, "void");
}

#[test]
fn pointer_extension_on_mut_param() {
    let modules = parse_ok("fn f(mut u8* buffer) { }");
    let param = &first_function(&modules).params[0];
    assert!(param.is_mutable);
    assert_eq!(param.type_extensions, "*");
    assert_eq!(param.name, "buffer");
}

#[test]
fn pointer_return_type_keeps_its_extension() {
    let modules = parse_ok("fn f() -> u8* { return 0 }");
    assert_eq!(first_function(&modules).return_type, "u8*");
}

#[test]
fn leading_type_name_starts_a_declaration() {
    let modules = parse_ok("fn f() { i32 x = 1 }");
    let f = first_function(&modules);
    let Stmt::Variable { decl, init } = &f.body.stmts[0] else {
        panic!("expected a variable statement");
    };
    assert_eq!(decl.name, "x");
    assert!(!decl.is_mutable);
    assert!(matches!(init, Expr::Literal { .. }));
}

#[test]
fn leading_unknown_identifier_starts_an_expression() {
    let modules = parse_ok("fn f(mut i32 y) { y = 1 }");
    let f = first_function(&modules);
    let Stmt::Expression { expr } = &f.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    assert!(matches!(expr, Expr::Assign { .. }));
}

#[test]
fn leading_identifier_followed_by_paren_is_a_call() {
    // `print` is not a declared type, but even a declared name would be a
    // call statement when '(' follows
    let modules = parse_ok("fn f() { print(1) }");
    let f = first_function(&modules);
    let Stmt::Expression { expr } = &f.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    assert!(matches!(expr, Expr::Call { .. }));
}

#[test]
fn array_extension_routes_to_an_array_statement() {
    let modules = parse_ok("fn g() { i32[3] xs = [1, 2, 3] }");
    let f = first_function(&modules);
    let Stmt::Array { decl, elements } = &f.body.stmts[0] else {
        panic!("expected an array statement");
    };
    assert_eq!(decl.type_extensions, "[3]");
    assert_eq!(decl.name, "xs");
    assert_eq!(elements.len(), 3);
}

#[test]
fn one_line_function_body_parses() {
    let modules = parse_ok("fn f() -> i32 { mut i32 n = 0 n = (n + 1) return n }");
    let f = first_function(&modules);
    assert_eq!(f.body.stmts.len(), 3);
    assert!(matches!(f.body.stmts[0], Stmt::Variable { .. }));
    assert!(matches!(f.body.stmts[1], Stmt::Expression { .. }));
    assert!(matches!(f.body.stmts[2], Stmt::Return { .. }));
}

#[test]
fn newlines_separate_statements() {
    let modules = parse_ok("fn f() -> i32 {\nmut i32 n = 0\nn = 1\nreturn n\n}");
    let f = first_function(&modules);
    assert!(matches!(f.body.stmts[0], Stmt::Variable { .. }));
    assert!(matches!(f.body.stmts[1], Stmt::Expression { .. }));
    assert!(matches!(f.body.stmts[2], Stmt::Return { .. }));
    // a trailing newline in the block shows up as an empty statement,
    // which the emitter drops
    assert!(f.body.stmts[3..]
        .iter()
        .all(|stmt| matches!(stmt, Stmt::Empty)));
}

#[test]
fn if_without_else() {
    let modules = parse_ok("fn f(i32 x) { if (x == 0) { return x } }");
    let f = first_function(&modules);
    let Stmt::If { else_block, .. } = &f.body.stmts[0] else {
        panic!("expected if");
    };
    assert!(else_block.is_empty());
}

#[test]
fn if_with_else_on_the_next_line() {
    let modules = parse_ok("fn f(i32 x) {\nif (x == 0) {\nreturn 1\n}\nelse {\nreturn 2\n}\n}");
    let f = first_function(&modules);
    let Stmt::If { then_block, else_block, .. } = &f.body.stmts[0] else {
        panic!("expected if");
    };
    assert_eq!(then_block.stmts.len(), 1);
    assert_eq!(else_block.stmts.len(), 1);
}

#[test]
fn while_loop() {
    let modules = parse_ok("fn f(mut i32 n) { while (n < 10) { n += 1 } }");
    let f = first_function(&modules);
    let Stmt::While { body, .. } = &f.body.stmts[0] else {
        panic!("expected while");
    };
    assert_eq!(body.stmts.len(), 1);
}

#[test]
fn for_loop_with_semicolon_separated_header() {
    let modules = parse_ok("fn f() { for (mut i32 i = 0; i < 10; i += 1) { i = i } }");
    let f = first_function(&modules);
    let Stmt::For { init, .. } = &f.body.stmts[0] else {
        panic!("expected for");
    };
    assert!(matches!(**init, Stmt::Variable { .. }));
}

#[test]
fn empty_file_yields_one_empty_module() {
    let modules = parse_ok("");
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "main");
    assert!(modules[0].includes.is_empty());
    assert!(modules[0].structs.is_empty());
    assert!(modules[0].enums.is_empty());
    assert!(modules[0].functions.is_empty());
}

#[test]
fn comments_and_blank_lines_are_an_empty_module() {
    let modules = parse_ok("// nothing here\n\n// still nothing\n");
    assert_eq!(modules.len(), 1);
    assert!(modules[0].functions.is_empty());
}

#[test]
fn include_paths_keep_their_quotes_until_emission() {
    let modules = parse_ok("include \"stdio.h\"\nfn main() { }");
    assert_eq!(modules[0].includes, vec!["\"stdio.h\"".to_string()]);
}

#[test]
fn module_keyword_names_the_module() {
    let modules = parse_ok("module math\nfn main() { }");
    assert_eq!(modules[0].name, "math");
}

#[test]
fn custom_type_name_starts_a_declaration_after_registration() {
    let modules = parse_ok("struct Point { i32 x }\nfn f(Point q) { Point p = q }");
    let f = first_function(&modules);
    let Stmt::Variable { decl, .. } = &f.body.stmts[0] else {
        panic!("expected a variable statement");
    };
    let Type::Custom(custom) = &decl.ty else {
        panic!("expected a custom type");
    };
    assert_eq!(custom.name, "Point");
    assert_eq!(custom.kind, CustomTypeKind::Struct);
}
