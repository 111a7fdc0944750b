//! Target resolution: finds the named trait in a unit and checks it can be wrapped.

use std::collections::HashSet;
use std::path::PathBuf;

use quote::ToTokens;
use tracing::debug;

use crate::error::MiddlewarerError;
use crate::types::Scope;
use crate::unit::CompilationUnit;

/// Supertraits the wrapper can satisfy by carrying the same bounds.
const AUTO_SUPERTRAITS: &[&str] = &["Send", "Sync"];

/// Outcome of looking a name up among a unit's top-level items.
pub enum ResolvedSymbol<'a> {
    Contract(&'a syn::ItemTrait),
    NotAContract { kind: &'static str },
    NotFound,
}

/// One trait method, as declared.
#[derive(Debug, Clone)]
pub struct Method {
    /// Method identifier as written (raw identifiers keep their `r#`).
    pub name: String,
    pub signature: syn::Signature,
    /// 1-based source line of the method name.
    pub line: usize,
}

/// A trait that passed resolution, with everything later stages need.
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub visibility: syn::Visibility,
    /// `Send`/`Sync` supertraits, in declaration order.
    pub auto_bounds: Vec<String>,
    /// Methods in declaration order; never empty.
    pub methods: Vec<Method>,
    /// Import scope of the declaring module.
    pub scope: Scope,
    /// File the trait was found in.
    pub source: PathBuf,
}

impl Contract {
    /// Visibility for generated items, reachable wherever the trait is.
    ///
    /// The generated file is a child module, so anything narrower than
    /// `pub(crate)` widens to `pub(super)`.
    pub fn item_visibility(&self) -> &'static str {
        match &self.visibility {
            syn::Visibility::Public(_) => "pub",
            syn::Visibility::Restricted(restricted)
                if restricted.in_token.is_none() && restricted.path.is_ident("crate") =>
            {
                "pub(crate)"
            }
            _ => "pub(super)",
        }
    }
}

/// Looks `name` up among the unit's top-level items.
pub fn lookup<'a>(unit: &'a CompilationUnit, name: &str) -> ResolvedSymbol<'a> {
    for item in &unit.file.items {
        let kind = match item {
            syn::Item::Trait(item) if item.ident == name => return ResolvedSymbol::Contract(item),
            syn::Item::Struct(item) if item.ident == name => "struct",
            syn::Item::Enum(item) if item.ident == name => "enum",
            syn::Item::Union(item) if item.ident == name => "union",
            syn::Item::Type(item) if item.ident == name => "type alias",
            syn::Item::TraitAlias(item) if item.ident == name => "trait alias",
            syn::Item::Fn(item) if item.sig.ident == name => "function",
            syn::Item::Const(item) if item.ident == name => "const",
            syn::Item::Static(item) if item.ident == name => "static",
            syn::Item::Mod(item) if item.ident == name => "module",
            syn::Item::Macro(item) if item.ident.as_ref().is_some_and(|i| i == name) => "macro",
            syn::Item::ExternCrate(item) if item.ident == name => "extern crate",
            syn::Item::Use(item) if use_tree_binds(&item.tree, name) => "use import",
            _ => continue,
        };
        return ResolvedSymbol::NotAContract { kind };
    }
    ResolvedSymbol::NotFound
}

/// Resolves `name` in `unit` to a wrappable [`Contract`].
pub fn resolve_contract(
    unit: &CompilationUnit,
    name: &str,
) -> Result<Contract, MiddlewarerError> {
    let item = match lookup(unit, name) {
        ResolvedSymbol::Contract(item) => item,
        ResolvedSymbol::NotAContract { kind } => {
            return Err(MiddlewarerError::NotAContract {
                name: name.to_string(),
                kind,
            })
        }
        ResolvedSymbol::NotFound => {
            return Err(MiddlewarerError::NotFound {
                name: name.to_string(),
                unit: unit.path.clone(),
            })
        }
    };

    let unsupported = |reason: String| MiddlewarerError::UnsupportedContract {
        name: name.to_string(),
        reason,
    };

    let mut methods = Vec::new();
    let mut seen = HashSet::new();
    for trait_item in &item.items {
        match trait_item {
            syn::TraitItem::Fn(method) => {
                let method_name = method.sig.ident.to_string();
                if !seen.insert(method_name.clone()) {
                    return Err(unsupported(format!("method '{method_name}' is declared twice")));
                }
                methods.push(Method {
                    name: method_name,
                    signature: method.sig.clone(),
                    line: method.sig.ident.span().start().line,
                });
            }
            syn::TraitItem::Type(assoc) => {
                return Err(unsupported(format!(
                    "associated type '{}' cannot be named by the wrapper",
                    assoc.ident
                )))
            }
            syn::TraitItem::Const(assoc) => {
                return Err(unsupported(format!(
                    "associated const '{}' cannot be forwarded",
                    assoc.ident
                )))
            }
            syn::TraitItem::Macro(mac) => {
                return Err(unsupported(format!(
                    "macro invocation `{}!` in trait body",
                    mac.mac.path.to_token_stream()
                )))
            }
            _ => return Err(unsupported("unrecognized trait item".to_string())),
        }
    }

    if methods.is_empty() {
        return Err(MiddlewarerError::EmptyContract(name.to_string()));
    }

    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        return Err(unsupported(
            "generic traits cannot be wrapped behind a single `dyn` delegate".to_string(),
        ));
    }
    if item.unsafety.is_some() {
        return Err(unsupported("unsafe traits".to_string()));
    }
    if item.auto_token.is_some() {
        return Err(unsupported("auto traits".to_string()));
    }

    let mut auto_bounds = Vec::new();
    for bound in &item.supertraits {
        match bound {
            syn::TypeParamBound::Lifetime(_) => {}
            syn::TypeParamBound::Trait(trait_bound)
                if AUTO_SUPERTRAITS
                    .iter()
                    .any(|auto| trait_bound.path.is_ident(auto)) =>
            {
                auto_bounds.push(trait_bound.path.to_token_stream().to_string());
            }
            other => {
                return Err(unsupported(format!(
                    "supertrait `{}` would also have to be implemented by the wrapper",
                    other.to_token_stream()
                )))
            }
        }
    }

    debug!(
        contract = name,
        methods = methods.len(),
        bounds = ?auto_bounds,
        "resolved contract"
    );

    Ok(Contract {
        name: name.to_string(),
        visibility: item.vis.clone(),
        auto_bounds,
        methods,
        scope: Scope::from_items(&unit.file.items, unit.module_path.clone()),
        source: unit.path.clone(),
    })
}

fn use_tree_binds(tree: &syn::UseTree, name: &str) -> bool {
    match tree {
        syn::UseTree::Path(path) => use_tree_binds(&path.tree, name),
        syn::UseTree::Name(leaf) => leaf.ident == name,
        syn::UseTree::Rename(rename) => rename.rename == name,
        syn::UseTree::Glob(_) => false,
        syn::UseTree::Group(group) => group.items.iter().any(|tree| use_tree_binds(tree, name)),
    }
}
