//! Wrapper assembly: turns a resolved contract into the four generated sections.
//!
//! The sections share names (wrapper type, handler aliases, override fields), so
//! they are all derived from one [`WrapperSpec`] and rendered in a single pass
//! over the contract's methods.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::MiddlewarerError;
use crate::naming;
use crate::resolve::Contract;
use crate::translate::{translate_method, TranslatedSignature};
use crate::types::{ChildModulePolicy, ModulePath};

/// Lifetime parameter of every handler alias.
const HANDLER_LIFETIME: &str = "'h";

#[derive(Debug, Clone, Serialize)]
/// Generated names and translated signature for one contract method.
pub struct MethodPlan {
    pub name: String,
    pub handler_type: String,
    pub override_field: String,
    pub signature: TranslatedSignature,
}

#[derive(Debug, Clone, Serialize)]
/// Everything needed to render a wrapper, derived once per run.
pub struct WrapperSpec {
    pub contract: String,
    pub wrapper_type: String,
    pub constructor: String,
    pub visibility: String,
    /// Auto-trait bounds carried by the override closures (`Send`, `Sync`).
    pub bounds: Vec<String>,
    /// Foreign modules to import in the header, spelled from the generated module.
    pub imports: Vec<String>,
    /// One entry per contract method, in declaration order.
    pub methods: Vec<MethodPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The four generated code sections, each ending in a newline.
pub struct Sections {
    pub constructor: String,
    pub wrapper_type: String,
    pub handler_aliases: String,
    pub method_bodies: String,
}

impl Sections {
    /// Sections in output order.
    pub fn ordered(&self) -> [&str; 4] {
        [
            &self.constructor,
            &self.wrapper_type,
            &self.handler_aliases,
            &self.method_bodies,
        ]
    }
}

impl WrapperSpec {
    /// Translates every method of `contract` and derives the generated names.
    pub fn plan(contract: &Contract) -> Result<Self, MiddlewarerError> {
        let policy = ChildModulePolicy::new(contract.scope.own_module().cloned());

        let mut methods = Vec::with_capacity(contract.methods.len());
        let mut short_names: BTreeMap<String, ModulePath> = BTreeMap::new();
        let mut imports = Vec::new();
        let mut generated_names = BTreeSet::new();

        for method in &contract.methods {
            let signature =
                translate_method(method, &contract.scope, &policy, HANDLER_LIFETIME)?;

            for path in &signature.namespaces {
                if !policy.needs_import(path) {
                    continue;
                }
                match short_names.get(path.short_name()) {
                    Some(existing) if existing == path => {}
                    Some(existing) => {
                        return Err(MiddlewarerError::translate(
                            &method.name,
                            format!(
                                "modules `{existing}` and `{path}` would both be qualified as `{}`",
                                path.short_name()
                            ),
                        ))
                    }
                    None => {
                        short_names.insert(path.short_name().to_string(), path.clone());
                        imports.push(path.from_child());
                    }
                }
            }

            let handler_type = naming::handler_type_name(&method.name);
            let override_field = naming::override_field_name(&method.name);
            for generated in [&handler_type, &override_field] {
                if !generated_names.insert(generated.clone()) {
                    return Err(MiddlewarerError::translate(
                        &method.name,
                        format!("generated name `{generated}` is already used by another method"),
                    ));
                }
            }

            methods.push(MethodPlan {
                name: method.name.clone(),
                handler_type,
                override_field,
                signature,
            });
        }
        imports.sort();

        Ok(Self {
            contract: contract.name.clone(),
            wrapper_type: naming::wrapper_type_name(&contract.name),
            constructor: naming::constructor_name(&contract.name),
            visibility: contract.item_visibility().to_string(),
            bounds: contract.auto_bounds.clone(),
            imports,
            methods,
        })
    }

    /// Renders the constructor, wrapper type, handler aliases and method bodies.
    pub fn assemble(&self) -> Sections {
        let mut sections = Sections {
            constructor: self.render_constructor(),
            ..Sections::default()
        };

        let vis = &self.visibility;
        let bounds: String = self.bounds.iter().map(|b| format!(" + {b}")).collect();

        sections.wrapper_type.push_str(&format!(
            "/// `{wrapper}` implements `{contract}` by forwarding every call to a wrapped\n\
             /// delegate. Set a `*_middleware` field to decorate the matching method; the\n\
             /// delegate is installed by [`{ctor}`].\n",
            wrapper = self.wrapper_type,
            contract = self.contract,
            ctor = self.constructor,
        ));
        sections.wrapper_type.push_str("#[derive(Default)]\n");
        sections
            .wrapper_type
            .push_str(&format!("{vis} struct {} {{\n", self.wrapper_type));
        sections
            .wrapper_type
            .push_str(&format!("    wrapped: Option<Box<dyn {}>>,\n\n", self.contract));

        sections
            .method_bodies
            .push_str(&format!("impl {} for {} {{\n", self.contract, self.wrapper_type));

        for (index, method) in self.methods.iter().enumerate() {
            let handler = &method.handler_type;
            sections.wrapper_type.push_str(&format!(
                "    {vis} {field}: Option<Box<dyn for<{lt}> Fn({handler}<{lt}>) -> {handler}<{lt}>{bounds}>>,\n",
                field = method.override_field,
                lt = HANDLER_LIFETIME,
            ));

            sections.handler_aliases.push_str(&format!(
                "{vis} type {handler}<{lt}> = Box<dyn FnMut({params}){arrow} + {lt}>;\n",
                lt = HANDLER_LIFETIME,
                params = method.signature.param_types(),
                arrow = method.signature.handler_return_arrow(),
            ));

            if index > 0 {
                sections.method_bodies.push('\n');
            }
            sections.method_bodies.push_str(&self.render_method(method));
        }

        sections.wrapper_type.push_str("}\n");
        sections.method_bodies.push_str("}\n");
        sections
    }

    fn render_constructor(&self) -> String {
        format!(
            "/// Wraps `original` so that calls go through the middleware installed on `wrapper`.\n\
             {vis} fn {ctor}(original: impl {contract} + 'static, mut wrapper: {wrapper}) -> Box<dyn {contract}> {{\n\
             \x20   wrapper.wrapped = Some(Box::new(original));\n\
             \x20   Box::new(wrapper)\n\
             }}\n",
            vis = self.visibility,
            ctor = self.constructor,
            contract = self.contract,
            wrapper = self.wrapper_type,
        )
    }

    fn render_method(&self, method: &MethodPlan) -> String {
        let sig = &method.signature;
        let params = sig.param_list();
        let args = sig.arg_list();
        let receiver = if params.is_empty() {
            sig.receiver.as_str().to_string()
        } else {
            format!("{}, {params}", sig.receiver.as_str())
        };

        format!(
            "    fn {name}({receiver}){arrow} {{\n\
             \x20       let wrapped = self\n\
             \x20           .wrapped\n\
             \x20           .{accessor}()\n\
             \x20           .expect(\"{wrapper} has no delegate; build it with {ctor}\");\n\
             \x20       match &self.{field} {{\n\
             \x20           Some(middleware) => {{\n\
             \x20               let handler: {handler}<'_> = Box::new(|{params}| wrapped.{name}({args}));\n\
             \x20               let mut handler = middleware(handler);\n\
             \x20               handler({args})\n\
             \x20           }}\n\
             \x20           None => wrapped.{name}({args}),\n\
             \x20       }}\n\
             \x20   }}\n",
            name = method.name,
            arrow = sig.return_arrow(),
            accessor = sig.receiver.delegate_accessor(),
            wrapper = self.wrapper_type,
            ctor = self.constructor,
            handler = method.handler_type,
            field = method.override_field,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::WrapperSpec;
    use crate::error::MiddlewarerError;
    use crate::resolve::{Contract, Method};
    use crate::types::{ModulePath, Scope};

    fn contract(source: &str, name: &str) -> Contract {
        let file = syn::parse_file(source).expect("valid source");
        let own = Some(ModulePath::new(vec!["crate".to_string()]));
        let item = file
            .items
            .iter()
            .find_map(|item| match item {
                syn::Item::Trait(t) if t.ident == name => Some(t.clone()),
                _ => None,
            })
            .expect("trait present");
        Contract {
            name: name.to_string(),
            visibility: item.vis.clone(),
            auto_bounds: Vec::new(),
            methods: item
                .items
                .iter()
                .filter_map(|item| match item {
                    syn::TraitItem::Fn(f) => Some(Method {
                        name: f.sig.ident.to_string(),
                        signature: f.sig.clone(),
                        line: 1,
                    }),
                    _ => None,
                })
                .collect(),
            scope: Scope::from_items(&file.items, own),
            source: "lib.rs".into(),
        }
    }

    #[test]
    fn assembles_single_method_contract() {
        let contract = contract(
            "pub struct Baz; pub struct Quz; pub trait Foo { fn bar(&self, b: Baz) -> Quz; }",
            "Foo",
        );
        let sections = WrapperSpec::plan(&contract).unwrap().assemble();

        assert_eq!(
            sections.constructor,
            "/// Wraps `original` so that calls go through the middleware installed on `wrapper`.\n\
             pub fn wrap_foo(original: impl Foo + 'static, mut wrapper: FooMiddleware) -> Box<dyn Foo> {\n\
             \x20   wrapper.wrapped = Some(Box::new(original));\n\
             \x20   Box::new(wrapper)\n\
             }\n"
        );
        assert!(sections.wrapper_type.contains("pub struct FooMiddleware {\n"));
        assert!(sections.wrapper_type.contains("    wrapped: Option<Box<dyn Foo>>,\n"));
        assert!(sections.wrapper_type.contains(
            "    pub bar_middleware: Option<Box<dyn for<'h> Fn(BarHandler<'h>) -> BarHandler<'h>>>,\n"
        ));
        assert_eq!(
            sections.handler_aliases,
            "pub type BarHandler<'h> = Box<dyn FnMut(Baz) -> Quz + 'h>;\n"
        );
        assert_eq!(
            sections.method_bodies,
            "impl Foo for FooMiddleware {\n\
             \x20   fn bar(&self, a0: Baz) -> Quz {\n\
             \x20       let wrapped = self\n\
             \x20           .wrapped\n\
             \x20           .as_deref()\n\
             \x20           .expect(\"FooMiddleware has no delegate; build it with wrap_foo\");\n\
             \x20       match &self.bar_middleware {\n\
             \x20           Some(middleware) => {\n\
             \x20               let handler: BarHandler<'_> = Box::new(|a0: Baz| wrapped.bar(a0));\n\
             \x20               let mut handler = middleware(handler);\n\
             \x20               handler(a0)\n\
             \x20           }\n\
             \x20           None => wrapped.bar(a0),\n\
             \x20       }\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn void_methods_call_without_returning() {
        let contract = contract("trait Pinger { fn ping(&mut self); }", "Pinger");
        let sections = WrapperSpec::plan(&contract).unwrap().assemble();

        assert!(sections.method_bodies.contains("    fn ping(&mut self) {\n"));
        assert!(sections.method_bodies.contains(".as_deref_mut()"));
        assert!(sections
            .method_bodies
            .contains("Box::new(|| wrapped.ping());"));
        assert!(sections.method_bodies.contains("                handler()\n"));
        assert!(sections.method_bodies.contains("            None => wrapped.ping(),\n"));
        assert!(!sections.method_bodies.contains("return"));
        assert_eq!(
            sections.handler_aliases,
            "pub(super) type PingHandler<'h> = Box<dyn FnMut() + 'h>;\n"
        );
    }

    #[test]
    fn borrowed_results_name_the_handler_lifetime() {
        let contract = contract("pub trait Named { fn name(&self) -> &str; }", "Named");
        let sections = WrapperSpec::plan(&contract).unwrap().assemble();

        assert_eq!(
            sections.handler_aliases,
            "pub type NameHandler<'h> = Box<dyn FnMut() -> &'h str + 'h>;\n"
        );
        assert!(sections.method_bodies.contains("    fn name(&self) -> &str {\n"));
        assert!(sections
            .method_bodies
            .contains("let handler: NameHandler<'_> = Box::new(|| wrapped.name());"));
    }

    #[test]
    fn methods_mapping_to_the_same_generated_names_are_rejected() {
        let contract = contract(
            "pub trait Users { fn get_user(&self) -> u64; #[allow(non_snake_case)] fn getUser(&self) -> u64; }",
            "Users",
        );
        let err = WrapperSpec::plan(&contract).err().expect("name clash");
        match err {
            MiddlewarerError::TranslateError { method, message } => {
                assert_eq!(method, "getUser");
                assert!(message.contains("`GetUserHandler`"), "{message}");
            }
            other => panic!("expected TranslateError, got {other:?}"),
        }
    }

    #[test]
    fn colliding_short_names_are_rejected() {
        let contract = contract(
            "use std::fmt; use crate::fmt as local_fmt; pub trait Show { fn a(&self) -> fmt::Error; fn b(&self) -> local_fmt::Style; }",
            "Show",
        );
        let err = WrapperSpec::plan(&contract).err().expect("collision");
        assert!(err.to_string().contains("would both be qualified as `fmt`"), "{err}");
    }

    #[test]
    fn imports_are_spelled_from_the_child_module() {
        let contract = contract(
            "use std::collections::{BTreeMap, BTreeSet}; use self::models::User; mod models {} \
             pub trait Directory { fn all(&self) -> BTreeMap<u64, User>; fn root(&self) -> crate::Root; }",
            "Directory",
        );
        let spec = WrapperSpec::plan(&contract).unwrap();
        assert_eq!(spec.imports, vec!["crate::models", "std::collections"]);
        assert_eq!(
            spec.methods[0].signature.result_type().as_deref(),
            Some("collections::BTreeMap<u64, models::User>")
        );
        assert_eq!(spec.methods[1].signature.result_type().as_deref(), Some("Root"));
    }
}
