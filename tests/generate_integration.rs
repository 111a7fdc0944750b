use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use middlewarer::{
    generate, run, Config, FormatterConfig, MiddlewarerError, Outcome, OutputTarget,
};
use pretty_assertions::assert_eq;

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "middlewarer_generate_{}_{}_{}",
            prefix,
            std::process::id(),
            stamp
        ));
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn write(&self, file: &str, content: &str) {
        let dest = self.path.join(file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(dest, content).expect("write temp file");
    }

    fn read(&self, file: &str) -> String {
        fs::read_to_string(self.path.join(file)).expect("read temp file")
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

fn crate_with_lib(prefix: &str, lib: &str) -> TempDir {
    let dir = TempDir::new(prefix);
    dir.write("Cargo.toml", "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n");
    dir.write("src/lib.rs", lib);
    dir
}

fn config(dir: &TempDir, type_name: &str) -> Config {
    Config::new(type_name)
        .unwrap()
        .with_source(dir.path.clone())
        .with_formatter(FormatterConfig::Disabled)
}

#[test]
fn foo_bar_wrapper_end_to_end() {
    let dir = crate_with_lib(
        "foo",
        "pub struct Baz;\npub struct Quz;\n\npub trait Foo {\n    fn bar(&self, b: Baz) -> Quz;\n}\n",
    );

    let mut stdout = Vec::new();
    let outcome = run(&config(&dir, "Foo"), &mut stdout).unwrap();
    let expected_path = dir.path.join("src").join("foo_middleware.rs");
    assert_eq!(outcome, Outcome::Written(expected_path));
    assert!(stdout.is_empty());

    let text = dir.read("src/foo_middleware.rs");
    assert!(text.starts_with("// Code generated by \"middlewarer --type Foo\"; DO NOT EDIT.\n"));
    assert!(text.contains("// Declare it next to the trait with `mod foo_middleware;`.\n"));
    assert!(text.contains("use super::*;\n"));
    assert!(text.contains(
        "pub fn wrap_foo(original: impl Foo + 'static, mut wrapper: FooMiddleware) -> Box<dyn Foo> {\n"
    ));
    assert!(text.contains("pub type BarHandler<'h> = Box<dyn FnMut(Baz) -> Quz + 'h>;\n"));
    assert!(text.contains("    fn bar(&self, a0: Baz) -> Quz {\n"));
    assert!(text.contains("        handler(a0)\n"));

    // Constructor, wrapper type, aliases, bodies.
    let ctor = text.find("pub fn wrap_foo").unwrap();
    let wrapper = text.find("pub struct FooMiddleware").unwrap();
    let alias = text.find("pub type BarHandler").unwrap();
    let body = text.find("impl Foo for FooMiddleware").unwrap();
    assert!(ctor < wrapper && wrapper < alias && alias < body);
}

#[test]
fn every_method_gets_alias_field_and_body_in_declaration_order() {
    let dir = crate_with_lib(
        "order",
        r#"
pub trait Inventory {
    fn zeta(&self);
    fn alpha(&mut self, count: u32) -> bool;
    fn mid(&self, name: &'static str, tags: Vec<String>) -> Option<u64>;
}
"#,
    );

    let generated = generate(&config(&dir, "Inventory")).unwrap();
    let text = &generated.source;

    assert_eq!(text.matches("Handler<'h> = Box<dyn FnMut").count(), 3);
    assert_eq!(text.matches("_middleware: Option<Box<dyn for<'h> Fn(").count(), 3);
    assert_eq!(text.matches("        let wrapped = self\n").count(), 3);

    let names: Vec<&str> = generated.spec.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);

    let positions: Vec<usize> = ["fn zeta(", "fn alpha(", "fn mid("]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    assert!(text.contains("pub type ZetaHandler<'h> = Box<dyn FnMut() + 'h>;\n"));
    assert!(text.contains("    fn zeta(&self) {\n"));
    assert!(text.contains("                handler()\n"));
    assert!(text.contains("            None => wrapped.zeta(),\n"));
    assert!(text.contains(
        "pub type MidHandler<'h> = Box<dyn FnMut(&'static str, Vec<String>) -> Option<u64> + 'h>;\n"
    ));
    assert!(text.contains("Box::new(|a0: &'static str, a1: Vec<String>| wrapped.mid(a0, a1))"));
}

#[test]
fn multiple_results_are_a_parenthesized_tuple() {
    let dir = crate_with_lib(
        "tuple",
        "pub trait Splitter {\n    fn split(&self, input: String) -> (String, String, usize);\n}\n",
    );

    let text = generate(&config(&dir, "Splitter")).unwrap().source;
    assert!(text.contains(
        "pub type SplitHandler<'h> = Box<dyn FnMut(String) -> (String, String, usize) + 'h>;\n"
    ));
    assert!(text.contains("    fn split(&self, a0: String) -> (String, String, usize) {\n"));
}

#[test]
fn foreign_types_are_qualified_and_imported() {
    let dir = crate_with_lib(
        "qualify",
        r#"
use std::collections::HashMap;
use std::sync::Arc;

pub struct Account;

pub trait Ledger: Send + Sync {
    fn balances(&self) -> HashMap<String, Arc<Account>>;
    fn history(&self, limit: usize) -> Vec<std::time::Duration>;
    fn owner(&self) -> crate::Account;
}
"#,
    );

    let generated = generate(&config(&dir, "Ledger")).unwrap();
    let text = &generated.source;

    assert_eq!(generated.spec.imports, vec!["std::collections", "std::sync", "std::time"]);
    assert!(text.contains("use super::*;\nuse std::collections;\nuse std::sync;\nuse std::time;\n"));
    assert!(text.contains("-> collections::HashMap<String, sync::Arc<Account>>"));
    assert!(text.contains("-> Vec<time::Duration>"));
    assert!(text.contains("    fn owner(&self) -> Account {\n"));
    assert!(text.contains("Fn(BalancesHandler<'h>) -> BalancesHandler<'h> + Send + Sync>>,\n"));
}

#[test]
fn nested_module_traits_spell_crate_paths_in_full() {
    let dir = TempDir::new("nested");
    dir.write("Cargo.toml", "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n");
    dir.write("src/lib.rs", "pub mod store;\npub struct Config;\n");
    dir.write(
        "src/store.rs",
        "use crate::Config;\n\npub trait Store {\n    fn config(&self) -> Config;\n    fn sibling(&self) -> super::Config;\n}\n",
    );

    let config = config(&dir, "Store").with_source(dir.path.join("src/store.rs"));
    let mut stdout = Vec::new();
    let outcome = run(&config, &mut stdout).unwrap();
    assert_eq!(
        outcome,
        Outcome::Written(dir.path.join("src").join("store").join("store_middleware.rs"))
    );

    let text = dir.read("src/store/store_middleware.rs");
    assert!(text.contains("    fn config(&self) -> crate::Config {\n"), "{text}");
    assert!(text.contains("    fn sibling(&self) -> crate::Config {\n"), "{text}");
    assert!(!text.contains("use crate;"));
}

#[test]
fn custom_lib_root_is_the_crate_module() {
    let dir = TempDir::new("libroot");
    dir.write(
        "Cargo.toml",
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[lib]\npath = \"src/api.rs\"\n",
    );
    dir.write(
        "src/api.rs",
        "use self::models::User;\n\npub mod models {\n    pub struct User;\n}\n\npub trait Api {\n    fn user(&self, id: u64) -> User;\n}\n",
    );

    let generated = generate(&config(&dir, "Api")).unwrap();
    assert_eq!(generated.spec.imports, vec!["crate::models"]);
    assert!(generated.source.contains("use crate::models;\n"));
    assert!(generated.source.contains("    fn user(&self, a0: u64) -> models::User {\n"));
    assert_eq!(
        generated.target,
        OutputTarget::File(dir.path.join("src").join("api_middleware.rs"))
    );
}

#[test]
fn bin_targets_are_crate_roots() {
    let dir = TempDir::new("binroot");
    dir.write("Cargo.toml", "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n");
    dir.write(
        "src/bin/tool.rs",
        "use self::jobs::Job;\n\nmod jobs {\n    pub struct Job;\n}\n\ntrait Runner {\n    fn next(&mut self) -> Option<Job>;\n}\n\nfn main() {}\n",
    );

    let config = config(&dir, "Runner").with_source(dir.path.join("src/bin/tool.rs"));
    let generated = generate(&config).unwrap();
    assert_eq!(generated.spec.imports, vec!["crate::jobs"]);
    assert!(generated.source.contains("    fn next(&mut self) -> Option<jobs::Job> {\n"));
    assert_eq!(
        generated.target,
        OutputTarget::File(dir.path.join("src").join("bin").join("runner_middleware.rs"))
    );
}

#[test]
fn borrowed_results_of_shared_methods_are_wrapped() {
    let dir = crate_with_lib(
        "borrowed",
        "pub trait Named {\n    fn name(&self) -> &str;\n    fn rename(&mut self, to: String);\n}\n",
    );

    let text = generate(&config(&dir, "Named")).unwrap().source;
    assert!(text.contains("pub type NameHandler<'h> = Box<dyn FnMut() -> &'h str + 'h>;\n"));
    assert!(text.contains("    fn name(&self) -> &str {\n"));
    assert!(text.contains("            None => wrapped.name(),\n"));
}

#[test]
fn methods_with_clashing_generated_names_fail() {
    let dir = crate_with_lib(
        "clash",
        "pub trait Users {\n    fn get_user(&self) -> u64;\n    #[allow(non_snake_case)]\n    fn getUser(&self) -> u64;\n}\n",
    );
    dir.write("src/users_middleware.rs", "previous contents\n");

    let err = run(&config(&dir, "Users"), &mut Vec::new()).unwrap_err();
    assert_eq!(err.stage(), "translation");
    assert_eq!(dir.read("src/users_middleware.rs"), "previous contents\n");
}

#[test]
fn failed_generation_leaves_existing_output_untouched() {
    let dir = crate_with_lib("untouched", "pub trait Empty {}\npub struct Thing;\n");
    dir.write("out.rs", "previous contents\n");

    let config = config(&dir, "Empty").with_output(Some(dir.path.join("out.rs")));
    let err = run(&config, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, MiddlewarerError::EmptyContract(_)));
    assert_eq!(dir.read("out.rs"), "previous contents\n");

    let fresh = config
        .clone()
        .with_output(Some(dir.path.join("fresh.rs")));
    let fresh = Config {
        type_name: "Thing".to_string(),
        ..fresh
    };
    let err = run(&fresh, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, MiddlewarerError::NotAContract { kind: "struct", .. }));
    assert!(!dir.path.join("fresh.rs").exists());
}

#[cfg(unix)]
#[test]
fn formatter_failure_writes_nothing() {
    let dir = crate_with_lib("fmtfail", "pub trait Ping { fn ping(&self); }\n");
    let config = config(&dir, "Ping").with_formatter(FormatterConfig::Command {
        program: "false".to_string(),
        args: Vec::new(),
    });

    let err = run(&config, &mut Vec::new()).unwrap_err();
    assert_eq!(err.stage(), "format");
    assert!(!dir.path.join("src/ping_middleware.rs").exists());
}

#[test]
fn debug_mode_prints_instead_of_writing() {
    let dir = crate_with_lib("debug", "pub trait Ping { fn ping(&self); }\n");
    let config = config(&dir, "Ping").with_debug(true);

    let mut stdout = Vec::new();
    assert_eq!(run(&config, &mut stdout).unwrap(), Outcome::Printed);

    let text = String::from_utf8(stdout).unwrap();
    assert!(text.contains("pub struct PingMiddleware {\n"));
    assert!(!text.contains("mod ping_middleware;"));
    assert!(!dir.path.join("src/ping_middleware.rs").exists());
}

#[test]
fn describe_reports_generated_names_as_json() {
    let dir = crate_with_lib(
        "describe",
        "pub trait UserStore {\n    fn find_user(&self, id: u64) -> Option<String>;\n}\n",
    );
    let config = config(&dir, "UserStore").with_describe(true);

    let mut stdout = Vec::new();
    assert_eq!(run(&config, &mut stdout).unwrap(), Outcome::Printed);

    let json: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(json["contract"], "UserStore");
    assert_eq!(json["wrapper_type"], "UserStoreMiddleware");
    assert_eq!(json["constructor"], "wrap_user_store");
    assert_eq!(json["methods"][0]["handler_type"], "FindUserHandler");
    assert_eq!(json["methods"][0]["override_field"], "find_user_middleware");
    assert!(!dir.path.join("src/user_store_middleware.rs").exists());
}

#[test]
fn unsupported_methods_report_translation_errors() {
    let dir = crate_with_lib(
        "unsupported",
        "pub trait Maker {\n    fn make(&self) -> impl Iterator<Item = u8>;\n}\n",
    );

    let err = generate(&config(&dir, "Maker")).unwrap_err();
    assert_eq!(err.stage(), "translation");
    assert!(matches!(err, MiddlewarerError::TranslateError { ref method, .. } if method == "make"));
}
