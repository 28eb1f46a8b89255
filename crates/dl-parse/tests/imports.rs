use dl_ast::ast::ModuleDef;
use dl_parse::{lex, parse, Supervisor};
use std::fs;

/// Lay the project files out in a tempdir, then lex and parse the root.
fn parse_project(root_src: &str, files: &[(&str, &str)]) -> (Vec<ModuleDef>, Supervisor) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let root = dir.path().join("main.dl");
    fs::write(&root, root_src).expect("write root source");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("write module source");
    }
    let mut sup = Supervisor::new(root_src.to_string(), root);
    let tokens = lex(root_src, &mut sup);
    let modules = parse(tokens, &mut sup);
    (modules, sup)
}

#[test]
fn imported_modules_are_spliced_before_the_importer() {
    let (modules, sup) = parse_project(
        "import util\nfn main() { }\n",
        &[("util.dl", "module util\nfn helper() { }\n")],
    );
    assert!(!sup.has_errors(), "errors: {:?}", sup.errors());
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].name, "util");
    assert_eq!(modules[1].name, "main");
    assert_eq!(modules[0].functions.stmts.len(), 1);
}

#[test]
fn imports_may_nest() {
    let (modules, sup) = parse_project(
        "import middle\nfn main() { }\n",
        &[
            ("middle.dl", "import leaf\nmodule middle\nfn mid() { }\n"),
            ("leaf.dl", "module leaf\nfn low() { }\n"),
        ],
    );
    assert!(!sup.has_errors(), "errors: {:?}", sup.errors());
    let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["leaf", "middle", "main"]);
}

#[test]
fn unreadable_import_is_a_diagnostic() {
    let (_, sup) = parse_project("import nowhere\n", &[]);
    assert!(sup.has_errors());
    assert!(sup.errors()[0]
        .message
        .contains("could not import module 'nowhere.dl'"));
}

#[test]
fn mutual_imports_are_rejected_as_a_cycle() {
    let (_, sup) = parse_project(
        "import a\nfn main() { }\n",
        &[
            ("a.dl", "import b\nfn fa() { }\n"),
            ("b.dl", "import a\nfn fb() { }\n"),
        ],
    );
    assert!(sup.has_errors());
    assert!(sup.errors()[0].message.contains("import cycle detected"));
}

#[test]
fn importing_the_root_file_is_a_cycle() {
    let (_, sup) = parse_project("import main\nfn main() { }\n", &[]);
    assert!(sup.has_errors());
    assert!(sup.errors()[0]
        .message
        .contains("import cycle detected while importing 'main'"));
}
