use crate::diag::Supervisor;
use crate::env::Environment;
use crate::lexer;
use crate::token::{Token, TokenKind};
use dl_ast::ast::{
    AssignOp, BinOp, Block, EnumDef, Expr, FunctionDef, LogicalOp, MatchCase, MatchLabel,
    ModuleDef, Stmt, StructDef, UnOp,
};
use dl_ast::span::Span;
use dl_ast::types::{BuiltinType, CustomType, CustomTypeKind, Type, VariableDeclaration};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parse a token stream into the modules of a project. `import` statements
/// are resolved against the directory of the sink's project root, lexed and
/// parsed recursively, and spliced before the importing module.
///
/// Errors are pushed into the sink; the result is meaningless (and must not
/// be emitted) when `sup.has_errors()` afterwards.
pub fn parse(tokens: Vec<Token>, sup: &mut Supervisor) -> Vec<ModuleDef> {
    let mut active_imports = vec![canonical(sup.project_root())];
    parse_with_imports(tokens, sup, &mut active_imports)
}

fn parse_with_imports(
    tokens: Vec<Token>,
    sup: &mut Supervisor,
    active_imports: &mut Vec<PathBuf>,
) -> Vec<ModuleDef> {
    Parser::new(tokens, sup).parse_project(active_imports)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    sup: &'a mut Supervisor,
    /// Struct/enum names seen so far; drives the declaration-vs-expression
    /// disambiguation and `::` enum detection. Registration is single-pass:
    /// a type name must be declared before its first use.
    user_types: HashMap<String, CustomTypeKind>,
    env: Environment,
}

impl<'a> Parser<'a> {
    fn new(mut tokens: Vec<Token>, sup: &'a mut Supervisor) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EndOfFile, "", Span::new(0, 0)));
        }
        Self {
            tokens,
            pos: 0,
            sup,
            user_types: HashMap::new(),
            env: Environment::new(),
        }
    }

    // ======= cursor =======

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    /// Current token, advancing the cursor. The `EndOfFile` sentinel is
    /// never advanced past.
    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn advance_one(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn at_eof(&self) -> bool {
        self.peek().matches(TokenKind::EndOfFile)
    }

    fn eol(&self) -> bool {
        self.peek().matches(TokenKind::EndOfLine)
    }

    fn skip_newlines(&mut self) {
        while self.eol() {
            self.advance_one();
        }
    }

    fn previous_span(&self) -> Span {
        match self.pos {
            0 => Span::new(0, 0),
            n => self.tokens[n - 1].span,
        }
    }

    fn matches_and_consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().matches(kind) {
            self.advance_one();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<()> {
        if self.matches_and_consume(kind) {
            return Some(());
        }
        let span = self.peek().span;
        self.sup.push_error(message, span);
        None
    }

    /// Run `body` until the delimiter is next. Bails on end of input or a
    /// non-empty sink, so callers still check the delimiter afterwards.
    fn consume_tokens_until<F: FnMut(&mut Self)>(&mut self, delimiter: TokenKind, mut body: F) {
        while !self.peek().matches(delimiter) {
            if self.at_eof() || self.sup.has_errors() {
                return;
            }
            body(self);
        }
    }

    // ======= project / modules =======

    fn parse_project(mut self, active_imports: &mut Vec<PathBuf>) -> Vec<ModuleDef> {
        let mut modules = Vec::new();
        while !self.sup.has_errors() {
            if self.eol() {
                self.advance_one();
                continue;
            }
            if self.peek().matches(TokenKind::Import) {
                self.parse_import(active_imports, &mut modules);
                continue;
            }
            if self.at_eof() {
                if modules.is_empty() {
                    modules.push(empty_module());
                }
                break;
            }
            if let Some(module) = self.parse_module() {
                modules.push(module);
            }
        }
        modules
    }

    fn parse_import(&mut self, active_imports: &mut Vec<PathBuf>, modules: &mut Vec<ModuleDef>) {
        let import_token = self.next();
        let name_token = self.next();
        if !name_token.matches(TokenKind::Identifier) {
            self.sup.push_error(
                "expected module name after 'import' while parsing",
                import_token.span,
            );
            return;
        }
        let span = import_token.span.merge(name_token.span);
        let file_name = format!("{}.dl", name_token.lexeme);
        let directory = self
            .sup
            .project_root()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let path = canonical(&directory.join(&file_name));
        if active_imports.contains(&path) {
            self.sup.push_error(
                format!(
                    "import cycle detected while importing '{}'",
                    name_token.lexeme
                ),
                span,
            );
            return;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            self.sup
                .push_error(format!("could not import module '{file_name}'"), span);
            return;
        };
        active_imports.push(path);
        let tokens = lexer::lex(&content, self.sup);
        let imported = if self.sup.has_errors() {
            Vec::new()
        } else {
            parse_with_imports(tokens, self.sup, active_imports)
        };
        active_imports.pop();
        modules.extend(imported);
    }

    /// A module runs to end of input (or to the next `import`, which
    /// belongs to the surrounding project loop).
    fn parse_module(&mut self) -> Option<ModuleDef> {
        let mut name = String::from("main");
        let mut includes = Vec::new();
        let mut structs = Vec::new();
        let mut enums = Vec::new();
        let mut functions = Vec::new();

        while !self.at_eof() && !self.sup.has_errors() {
            if self.eol() {
                self.advance_one();
                continue;
            }
            match self.peek().kind {
                TokenKind::Import => break,
                TokenKind::Module => {
                    self.advance_one();
                    if let Some(module_name) = self.parse_identifier() {
                        name = module_name;
                    }
                }
                TokenKind::Include => {
                    if let Some(path) = self.parse_include() {
                        includes.push(path);
                    }
                }
                TokenKind::Struct => {
                    if let Some(def) = self.parse_struct_statement() {
                        structs.push(Stmt::Struct(def));
                    }
                }
                TokenKind::Enum => {
                    if let Some(def) = self.parse_enum_statement() {
                        enums.push(Stmt::Enum(def));
                    }
                }
                _ => {
                    if let Some(def) = self.parse_function_statement() {
                        functions.push(Stmt::Function(def));
                    }
                }
            }
        }

        Some(ModuleDef {
            name,
            includes,
            structs: Block::new(structs),
            enums: Block::new(enums),
            functions: Block::new(functions),
        })
    }

    /// `include "header.h"` — the path lexeme is kept verbatim, quotes and
    /// all; the emitter strips them.
    fn parse_include(&mut self) -> Option<String> {
        let include_token = self.next();
        let path_token = self.next();
        if !path_token.matches(TokenKind::DoubleQuotedString) {
            self.sup.push_error(
                "expected path after 'include' while parsing",
                include_token.span,
            );
            return None;
        }
        Some(path_token.lexeme)
    }

    // ======= declarations =======

    fn parse_function_statement(&mut self) -> Option<FunctionDef> {
        // each function body gets a fresh scope chain
        self.env = Environment::new();

        let fn_token = self.next();
        if !fn_token.matches(TokenKind::Fn) {
            self.sup.push_error(
                format!(
                    "unexpected token '{}' at module level while parsing",
                    fn_token.lexeme
                ),
                fn_token.span,
            );
            return None;
        }
        let name_token = self.next();
        if !name_token.matches(TokenKind::Identifier) {
            self.sup.push_error(
                "expected function name after 'fn' keyword while parsing",
                fn_token.span,
            );
            return None;
        }

        self.expect(
            TokenKind::LeftParen,
            "expected '(' after function name while parsing",
        )?;
        let mut params = Vec::new();
        self.consume_tokens_until(TokenKind::RightParen, |p| {
            if p.peek().matches(TokenKind::Comma) {
                p.advance_one();
            }
            if let Some(declaration) = p.parse_variable_declaration() {
                p.env.enscope(declaration.clone());
                params.push(declaration);
            }
        });
        self.expect(
            TokenKind::RightParen,
            "expected ')' after args while parsing",
        )?;

        let mut return_type = String::from("void");
        if self.matches_and_consume(TokenKind::Arrow) {
            if !self.peek().matches(TokenKind::Identifier) {
                self.sup.push_error(
                    "expected return type after '->' while parsing",
                    self.previous_span(),
                );
                return None;
            }
            return_type.clear();
            self.consume_tokens_until(TokenKind::LeftBrace, |p| {
                if p.eol() {
                    p.advance_one();
                    return;
                }
                return_type.push_str(&p.next().lexeme);
            });
        }

        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after function return type while parsing",
        )?;
        self.skip_newlines();
        let body = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after function body while parsing",
        )?;

        Some(FunctionDef {
            name: name_token.lexeme,
            params,
            return_type,
            body,
        })
    }

    fn parse_struct_statement(&mut self) -> Option<StructDef> {
        self.advance_one(); // struct
        let name = self.parse_identifier()?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after struct name while parsing",
        )?;
        self.skip_newlines();
        let fields = self.parse_member_variables();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after struct body while parsing",
        )?;
        self.skip_newlines();
        self.user_types.insert(name.clone(), CustomTypeKind::Struct);
        Some(StructDef { name, fields })
    }

    fn parse_member_variables(&mut self) -> Vec<VariableDeclaration> {
        let mut members = Vec::new();
        self.consume_tokens_until(TokenKind::RightBrace, |p| {
            if let Some(declaration) = p.parse_variable_declaration() {
                members.push(declaration);
            }
        });
        members
    }

    fn parse_enum_statement(&mut self) -> Option<EnumDef> {
        self.advance_one(); // enum
        let name = self.parse_identifier()?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after enum name while parsing",
        )?;
        self.skip_newlines();
        let variants = self.parse_enum_variants();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after enum variants while parsing",
        )?;
        self.skip_newlines();
        self.user_types.insert(name.clone(), CustomTypeKind::Enum);
        Some(EnumDef { name, variants })
    }

    fn parse_enum_variants(&mut self) -> IndexMap<String, Vec<Type>> {
        let mut variants = IndexMap::new();
        self.consume_tokens_until(TokenKind::RightBrace, |p| {
            let Some(variant_name) = p.parse_identifier() else {
                return;
            };
            let mut fields = Vec::new();
            if p.matches_and_consume(TokenKind::LeftParen) {
                p.consume_tokens_until(TokenKind::RightParen, |p| {
                    if p.peek().matches(TokenKind::Comma) {
                        p.advance_one();
                    }
                    let Some(field_type) = p.parse_identifier() else {
                        return;
                    };
                    match p.resolve_type(&field_type) {
                        Some(ty) => fields.push(ty),
                        None => {
                            let span = p.previous_span();
                            p.sup.push_error(
                                format!(
                                    "'{field_type}' is not a valid type while parsing enum variant"
                                ),
                                span,
                            );
                        }
                    }
                });
                if p.expect(
                    TokenKind::RightParen,
                    "expected ')' after enum variant fields while parsing",
                )
                .is_none()
                {
                    return;
                }
            }
            p.skip_newlines();
            variants.insert(variant_name, fields);
        });
        variants
    }

    /// `[mut] <type><extensions> <name>`. Everything between the type name
    /// and the variable name is collected verbatim into the extension
    /// string (`*`, `**`, `[16]`).
    fn parse_variable_declaration(&mut self) -> Option<VariableDeclaration> {
        let is_mutable = self.peek().matches(TokenKind::Mut);
        if is_mutable {
            self.advance_one();
        }

        let type_token = self.peek().clone();
        let builtin = BuiltinType::from_name(&type_token.lexeme);
        let custom = self.defined_custom_type(&type_token.lexeme);
        if builtin.is_none() && custom.is_none() {
            self.sup.push_error(
                format!(
                    "'{}' is not a valid variable type while parsing",
                    type_token.lexeme
                ),
                type_token.span,
            );
            return None;
        }
        self.advance_one();

        let mut type_extensions = String::new();
        self.consume_tokens_until(TokenKind::Identifier, |p| {
            if p.eol() {
                let span = p.previous_span();
                p.sup.push_error(
                    "expected variable name after variable type while parsing",
                    span,
                );
                return;
            }
            type_extensions.push_str(&p.next().lexeme);
        });

        let name = self.parse_identifier()?;
        self.skip_newlines();

        let ty = match custom {
            Some(custom) => Type::Custom(custom),
            None => Type::Builtin(builtin?),
        };
        Some(VariableDeclaration {
            is_mutable,
            ty,
            type_extensions,
            name,
        })
    }

    fn defined_custom_type(&self, name: &str) -> Option<CustomType> {
        self.user_types.get(name).map(|kind| CustomType {
            name: name.to_string(),
            kind: *kind,
        })
    }

    fn is_type_name(&self, name: &str) -> bool {
        BuiltinType::from_name(name).is_some() || self.user_types.contains_key(name)
    }

    fn resolve_type(&self, name: &str) -> Option<Type> {
        BuiltinType::from_name(name)
            .map(Type::Builtin)
            .or_else(|| self.defined_custom_type(name).map(Type::Custom))
    }

    // ======= statements =======

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek().kind {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Match => self.parse_match_statement(),
            TokenKind::EndOfLine => {
                self.advance_one();
                Some(Stmt::Empty)
            }
            TokenKind::Mut | TokenKind::Identifier => {
                if self.identifier_is_function_call() {
                    self.parse_expression_statement()
                } else {
                    self.parse_variable_statement(TokenKind::EndOfLine)
                }
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn identifier_is_function_call(&self) -> bool {
        self.peek_ahead(1).matches(TokenKind::LeftParen)
    }

    fn parse_statement_block(&mut self) -> Block {
        let parent = std::mem::take(&mut self.env);
        self.env = Environment::child_of(parent);

        let mut stmts = Vec::new();
        self.consume_tokens_until(TokenKind::RightBrace, |p| {
            if let Some(stmt) = p.parse_statement() {
                stmts.push(stmt);
            }
        });

        self.env = std::mem::take(&mut self.env).into_parent();
        Block::new(stmts)
    }

    fn parse_if_statement(&mut self) -> Option<Stmt> {
        self.advance_one(); // if
        self.expect(
            TokenKind::LeftParen,
            "expected '(' after if keyword while parsing",
        )?;
        let cond = self.parse_expression()?;
        self.expect(
            TokenKind::RightParen,
            "expected ')' after if condition while parsing",
        )?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after if condition while parsing",
        )?;
        let then_block = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after if statement's 'then branch' while parsing",
        )?;

        self.skip_newlines();
        if !self.matches_and_consume(TokenKind::Else) {
            return Some(Stmt::If {
                cond,
                then_block,
                else_block: Block::default(),
            });
        }
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after if statement's 'else branch' while parsing",
        )?;
        let else_block = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after if statement's 'else branch' while parsing",
        )?;
        Some(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.advance_one(); // return
        let expr = self.parse_expression()?;
        Some(Stmt::Return { expr })
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        self.advance_one(); // while
        self.expect(
            TokenKind::LeftParen,
            "expected '(' after while keyword while parsing",
        )?;
        let cond = self.parse_expression()?;
        self.expect(
            TokenKind::RightParen,
            "expected ')' after while-loop condition while parsing",
        )?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after while-loop condition while parsing",
        )?;
        let body = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after while-loop body while parsing",
        )?;
        Some(Stmt::While { cond, body })
    }

    fn parse_for_statement(&mut self) -> Option<Stmt> {
        self.advance_one(); // for
        self.expect(
            TokenKind::LeftParen,
            "expected '(' after for keyword while parsing",
        )?;
        let init = self.parse_variable_statement(TokenKind::Semicolon)?;
        let cond = self.parse_expression()?;
        self.expect(
            TokenKind::Semicolon,
            "expected ';' after for-loop condition while parsing",
        )?;
        let step = self.parse_expression()?;
        self.expect(
            TokenKind::RightParen,
            "expected ')' after for-loop increment while parsing",
        )?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after for-loop increment while parsing",
        )?;
        let body = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after for-loop body while parsing",
        )?;
        Some(Stmt::For {
            init: Box::new(init),
            cond,
            step,
            body,
        })
    }

    /// Either a declaration (`[mut] <type> <name> = <expr>`, or its array
    /// form) or, when the leading identifier is not a known type name, a
    /// plain expression statement. The terminator is `;` inside a for-loop
    /// header; elsewhere trailing newlines are simply consumed, since
    /// statements self-delimit.
    fn parse_variable_statement(&mut self, terminator: TokenKind) -> Option<Stmt> {
        let leading = self.peek().clone();
        if !leading.matches(TokenKind::Mut) && !self.is_type_name(&leading.lexeme) {
            let expr = self.parse_assignment_expression()?;
            self.skip_newlines();
            return Some(Stmt::Expression { expr });
        }

        let decl = self.parse_variable_declaration()?;
        if decl.is_fixed_size_array() {
            return self.parse_array_statement(decl);
        }

        self.expect(
            TokenKind::Equal,
            "expected '=' after variable name while parsing",
        )?;
        let init = self.parse_expression()?;
        if terminator == TokenKind::Semicolon {
            self.expect(
                TokenKind::Semicolon,
                "expected ';' after variable declaration while parsing",
            )?;
        } else {
            self.skip_newlines();
        }

        self.env.enscope(decl.clone());
        Some(Stmt::Variable { decl, init })
    }

    /// `<type>[N] <name> = [e0, e1, …]` — the right-hand side must be a
    /// bracketed element list, lowered to brace initialisation.
    fn parse_array_statement(&mut self, decl: VariableDeclaration) -> Option<Stmt> {
        self.expect(
            TokenKind::Equal,
            "expected '=' after array declaration while parsing",
        )?;
        self.expect(
            TokenKind::LeftBracket,
            "expected '[' after array declaration while parsing",
        )?;
        let mut elements = Vec::new();
        self.consume_tokens_until(TokenKind::RightBracket, |p| {
            if p.peek().matches(TokenKind::Comma) {
                p.advance_one();
            }
            if let Some(element) = p.parse_expression() {
                elements.push(element);
            }
        });
        self.expect(
            TokenKind::RightBracket,
            "expected ']' after array declaration while parsing",
        )?;
        self.skip_newlines();

        self.env.enscope(decl.clone());
        Some(Stmt::Array { decl, elements })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.skip_newlines();
        Some(Stmt::Expression { expr })
    }

    fn parse_match_statement(&mut self) -> Option<Stmt> {
        let match_token = self.next();
        self.expect(
            TokenKind::LeftParen,
            "expected '(' after match keyword while parsing",
        )?;
        let scrutinee = self.parse_expression()?;
        self.expect(
            TokenKind::RightParen,
            "expected ')' after match expression while parsing",
        )?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after match expression while parsing",
        )?;
        self.skip_newlines();

        let mut cases = Vec::new();
        self.consume_tokens_until(TokenKind::RightBrace, |p| {
            if let Some(case) = p.parse_match_case() {
                cases.push(case);
            }
        });
        if cases.is_empty() {
            if !self.sup.has_errors() {
                self.sup.push_error(
                    "expected at least one match case while parsing",
                    match_token.span,
                );
            }
            return None;
        }
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after match cases while parsing",
        )?;
        self.skip_newlines();

        Some(Stmt::Match { scrutinee, cases })
    }

    fn parse_match_case(&mut self) -> Option<MatchCase> {
        let label_expr = self.parse_expression()?;
        let (label, bindings) = self.match_case_label(label_expr)?;
        self.expect(
            TokenKind::FatArrow,
            "expected '=>' after match label while parsing",
        )?;
        self.expect(
            TokenKind::LeftBrace,
            "expected '{' after match label while parsing",
        )?;
        let body = self.parse_statement_block();
        self.expect(
            TokenKind::RightBrace,
            "expected '}' after match body while parsing",
        )?;
        self.skip_newlines();
        Some(MatchCase {
            label,
            bindings,
            body,
        })
    }

    /// A case label is `Base::Variant`, `Base::Variant(names…)`, or the
    /// `_` default. Call-form argument names become the destructuring
    /// bindings for the case body.
    fn match_case_label(&mut self, label: Expr) -> Option<(MatchLabel, Vec<String>)> {
        match label {
            Expr::Variable { ref name, .. } if name == "_" => {
                Some((MatchLabel::Default, Vec::new()))
            }
            Expr::EnumPath { base, variant, .. } => {
                let Expr::Variable { name: base_name, .. } = *base else {
                    let span = self.previous_span();
                    self.sup
                        .push_error("expected enum variant while parsing match cases", span);
                    return None;
                };
                match *variant {
                    Expr::Variable { name, .. } => Some((
                        MatchLabel::Variant {
                            base: base_name,
                            variant: name,
                        },
                        Vec::new(),
                    )),
                    Expr::Call { callee, args, .. } => {
                        let Expr::Variable { name, .. } = *callee else {
                            let span = self.previous_span();
                            self.sup
                                .push_error("expected enum variant while parsing match cases", span);
                            return None;
                        };
                        let mut bindings = Vec::new();
                        for arg in args {
                            match arg {
                                Expr::Variable { name, .. } => bindings.push(name),
                                other => {
                                    self.sup.push_error(
                                        "expected identifier in match case destructuring while parsing",
                                        other.span(),
                                    );
                                    return None;
                                }
                            }
                        }
                        Some((
                            MatchLabel::Variant {
                                base: base_name,
                                variant: name,
                            },
                            bindings,
                        ))
                    }
                    other => {
                        self.sup
                            .push_error("expected enum variant while parsing match cases", other.span());
                        None
                    }
                }
            }
            other => {
                self.sup
                    .push_error("expected enum variant while parsing match cases", other.span());
                None
            }
        }
    }

    // ======= expressions =======

    fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> Option<Expr> {
        let expr = self.parse_logical_expression()?;

        if self.peek().is_assignment_operator() {
            let op_token = self.next();
            // right-associative
            let value = self.parse_assignment_expression()?;
            if !expr.is_lvalue() {
                self.sup.push_error(
                    "expected variable on left side of assignment while parsing",
                    expr.span(),
                );
                return None;
            }
            let op = match op_token.kind {
                TokenKind::Equal => AssignOp::Assign,
                TokenKind::PlusEqual => AssignOp::AddAssign,
                _ => {
                    self.sup
                        .push_error("unsupported assignment operator while parsing", op_token.span);
                    return None;
                }
            };
            let span = expr.span().merge(value.span());
            return Some(Expr::Assign {
                lhs: Box::new(expr),
                op,
                rhs: Box::new(value),
                span,
            });
        }

        Some(expr)
    }

    fn parse_logical_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_equality_expression()?;
        while self.peek().is_logical_operator() {
            let op_token = self.next();
            let rhs = self.parse_equality_expression()?;
            let op = if op_token.matches(TokenKind::And) {
                LogicalOp::And
            } else {
                LogicalOp::Or
            };
            let span = expr.span().merge(rhs.span());
            expr = Expr::Logical {
                lhs: Box::new(expr),
                op,
                rhs: Box::new(rhs),
                span,
            };
        }
        Some(expr)
    }

    fn parse_equality_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_comparison_expression()?;
        while self.peek().is_equality_operator() {
            let op_token = self.next();
            let rhs = self.parse_comparison_expression()?;
            expr = self.binary(expr, op_token, rhs)?;
        }
        Some(expr)
    }

    fn parse_comparison_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_arithmetic_expression()?;
        while self.peek().is_comparison_operator() {
            let op_token = self.next();
            let rhs = self.parse_arithmetic_expression()?;
            expr = self.binary(expr, op_token, rhs)?;
        }
        Some(expr)
    }

    fn parse_arithmetic_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_index_expression()?;
        while self.peek().is_arithmetic_operator() {
            let op_token = self.next();
            let rhs = self.parse_index_expression()?;
            expr = self.binary(expr, op_token, rhs)?;
        }
        Some(expr)
    }

    fn parse_index_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_field_accessor_expression()?;
        while self.matches_and_consume(TokenKind::LeftBracket) {
            let index = self.parse_expression()?;
            self.expect(
                TokenKind::RightBracket,
                "expected ']' after index operator while parsing",
            )?;
            let span = expr.span().merge(self.previous_span());
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
                span,
            };
        }
        Some(expr)
    }

    /// `.`, `->` and `::`. When the left side of `::` is a registered enum
    /// name the pair becomes an enum path instead of a plain binary node.
    fn parse_field_accessor_expression(&mut self) -> Option<Expr> {
        let mut expr = self.parse_unary_expression()?;
        while self.peek().is_field_accessor() {
            let op_token = self.next();
            let rhs = self.parse_unary_expression()?;

            if op_token.matches(TokenKind::ColonColon) {
                if let Expr::Variable { name, .. } = &expr {
                    if self.user_types.get(name) == Some(&CustomTypeKind::Enum) {
                        let span = expr.span().merge(rhs.span());
                        expr = Expr::EnumPath {
                            base: Box::new(expr),
                            variant: Box::new(rhs),
                            span,
                        };
                        continue;
                    }
                }
            }

            expr = self.binary(expr, op_token, rhs)?;
        }
        Some(expr)
    }

    fn parse_unary_expression(&mut self) -> Option<Expr> {
        if self.peek().is_unary_operator() {
            let op_token = self.next();
            let rhs = self.parse_unary_expression()?;
            let op = unary_op(op_token.kind)?;
            let span = op_token.span.merge(rhs.span());
            return Some(Expr::Unary {
                op,
                expr: Box::new(rhs),
                span,
            });
        }
        self.parse_call_expression()
    }

    fn parse_call_expression(&mut self) -> Option<Expr> {
        let callee = self.parse_primary_expression()?;
        if !self.matches_and_consume(TokenKind::LeftParen) {
            return Some(callee);
        }
        let mut args = Vec::new();
        self.consume_tokens_until(TokenKind::RightParen, |p| {
            if p.peek().matches(TokenKind::Comma) {
                p.advance_one();
            }
            if let Some(arg) = p.parse_expression() {
                args.push(arg);
            }
        });
        self.expect(
            TokenKind::RightParen,
            "expected ')' after function call while parsing",
        )?;
        let span = callee.span().merge(self.previous_span());
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    fn parse_primary_expression(&mut self) -> Option<Expr> {
        let token = self.next();

        if token.is_literal() || token.is_boolean() {
            return Some(Expr::Literal {
                text: token.lexeme,
                span: token.span,
            });
        }
        if token.matches(TokenKind::Identifier) {
            return Some(Expr::Variable {
                name: token.lexeme,
                span: token.span,
            });
        }
        if token.matches(TokenKind::LeftParen) {
            let inner = self.parse_expression()?;
            self.expect(
                TokenKind::RightParen,
                "expected ')' after expression while parsing",
            )?;
            let span = token.span.merge(self.previous_span());
            return Some(Expr::Grouping {
                inner: Box::new(inner),
                span,
            });
        }

        self.sup.push_error(
            format!("unexpected token '{}' while parsing", token.lexeme),
            token.span,
        );
        None
    }

    fn binary(&mut self, lhs: Expr, op_token: Token, rhs: Expr) -> Option<Expr> {
        let Some(op) = binary_op(op_token.kind) else {
            self.sup.push_error(
                format!("unsupported binary operator '{}' while parsing", op_token.lexeme),
                op_token.span,
            );
            return None;
        };
        let span = lhs.span().merge(rhs.span());
        Some(Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            span,
        })
    }

    fn parse_identifier(&mut self) -> Option<String> {
        let token = self.next();
        if !token.matches(TokenKind::Identifier) {
            let (lexeme, span) = match self.tokens.get(self.pos.wrapping_sub(2)) {
                Some(previous) => (previous.lexeme.clone(), previous.span),
                None => (String::new(), token.span),
            };
            self.sup.push_error(
                format!("expected identifier after '{lexeme}' while parsing"),
                span,
            );
            return None;
        }
        Some(token.lexeme)
    }
}

fn empty_module() -> ModuleDef {
    ModuleDef {
        name: String::from("main"),
        includes: Vec::new(),
        structs: Block::default(),
        enums: Block::default(),
        functions: Block::default(),
    }
}

fn binary_op(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Dot => BinOp::Dot,
        TokenKind::Arrow => BinOp::Arrow,
        TokenKind::ColonColon => BinOp::Scope,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::EqualEqual => BinOp::Eq,
        TokenKind::BangEqual => BinOp::Ne,
        TokenKind::Less => BinOp::Lt,
        TokenKind::LessEqual => BinOp::Le,
        TokenKind::Greater => BinOp::Gt,
        TokenKind::GreaterEqual => BinOp::Ge,
        _ => return None,
    })
}

fn unary_op(kind: TokenKind) -> Option<UnOp> {
    Some(match kind {
        TokenKind::Minus => UnOp::Neg,
        TokenKind::Bang => UnOp::Not,
        TokenKind::PlusPlus => UnOp::Inc,
        TokenKind::Ampersand => UnOp::AddrOf,
        TokenKind::Star => UnOp::Deref,
        _ => return None,
    })
}
