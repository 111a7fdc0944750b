//! Namespace-aware type model used to render method signatures.
//!
//! `syn` types are lowered into [`TypeReference`] trees whose named leaves carry
//! the [`Namespace`] they originate from. Rendering walks the tree and asks a
//! [`QualificationPolicy`] how to spell each namespace.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use quote::ToTokens;
use serde::Serialize;
use tracing::warn;

const PRELUDE_NAMES: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result", "Box", "Fn", "FnMut",
    "FnOnce", "Send", "Sync", "Sized", "Unpin", "Copy", "Clone", "Default", "Drop", "Eq",
    "PartialEq", "Ord", "PartialOrd", "AsRef", "AsMut", "Into", "From", "TryFrom", "TryInto",
    "Iterator", "IntoIterator", "DoubleEndedIterator", "ExactSizeIterator", "Extend",
    "FromIterator", "ToOwned", "ToString",
];

const PATH_KEYWORDS: &[&str] = &["crate", "self", "super"];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
/// A `::`-separated module path such as `crate::store` or `std::collections`.
pub struct ModulePath {
    segments: Vec<String>,
}

impl ModulePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Display name used as the qualifier, like a package name: the last segment.
    pub fn short_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// True for paths that end in `crate`, `self` or `super`; these cannot be
    /// imported under a short name and are always spelled in full.
    pub fn is_anchor(&self) -> bool {
        PATH_KEYWORDS.contains(&self.short_name())
    }

    /// Rewrites leading `self`/`super` against the module the path was written in.
    pub fn normalize(self, own: Option<&ModulePath>) -> ModulePath {
        let Some(own) = own else {
            return self;
        };
        let first = self.segments.first().cloned();
        let (keep, skip) = match first.as_deref() {
            Some("self") => (own.segments.len(), 1),
            Some("super") => {
                let supers = self
                    .segments
                    .iter()
                    .take_while(|segment| segment.as_str() == "super")
                    .count();
                if supers >= own.segments.len() {
                    return self;
                }
                (own.segments.len() - supers, supers)
            }
            _ => return self,
        };
        let mut base = own.segments[..keep].to_vec();
        base.extend(self.segments[skip..].iter().cloned());
        ModulePath::new(base)
    }

    /// Spelling of this path from a module declared inside the unit.
    pub fn from_child(&self) -> String {
        match self.segments.first().map(String::as_str) {
            Some("self") => {
                let mut segments = vec!["super".to_string()];
                segments.extend(self.segments[1..].iter().cloned());
                segments.join("::")
            }
            Some("super") => format!("super::{self}"),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a named type comes from.
pub enum Namespace {
    /// Declared in (or only reachable through) the unit's own module.
    Local,
    /// Primitive or standard-prelude name; never qualified.
    Prelude,
    /// Another module.
    Module(ModulePath),
}

/// Maps a namespace to the qualifier written before names from it.
///
/// An empty string means the name is written bare.
pub trait QualificationPolicy {
    fn qualifier(&self, namespace: &Namespace) -> String;
}

/// Qualification for text emitted into a child module of the unit.
///
/// Types from the unit's own module render bare (they are reached through
/// `use super::*`); other modules render with their short name.
pub struct ChildModulePolicy {
    own: Option<ModulePath>,
}

impl ChildModulePolicy {
    pub fn new(own: Option<ModulePath>) -> Self {
        Self { own }
    }

    /// True when `path` needs a `use` line in the generated header.
    pub fn needs_import(&self, path: &ModulePath) -> bool {
        Some(path) != self.own.as_ref() && !path.is_anchor()
    }
}

impl QualificationPolicy for ChildModulePolicy {
    fn qualifier(&self, namespace: &Namespace) -> String {
        match namespace {
            Namespace::Local | Namespace::Prelude => String::new(),
            Namespace::Module(path) if Some(path) == self.own.as_ref() => String::new(),
            Namespace::Module(path) if path.is_anchor() => path.from_child(),
            Namespace::Module(path) => path.short_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A type spelled against the namespaces its names come from.
pub enum TypeReference {
    Named {
        namespace: Namespace,
        name: String,
        args: PathArgs,
    },
    Reference {
        lifetime: Option<String>,
        mutable: bool,
        inner: Box<TypeReference>,
    },
    Pointer {
        mutable: bool,
        inner: Box<TypeReference>,
    },
    Slice(Box<TypeReference>),
    Array {
        elem: Box<TypeReference>,
        len: String,
    },
    Tuple(Vec<TypeReference>),
    FnPointer {
        inputs: Vec<TypeReference>,
        output: Option<Box<TypeReference>>,
    },
    TraitObject(Vec<Bound>),
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArgs {
    None,
    Angle(Vec<GenericArg>),
    /// `Fn(A, B) -> C` sugar.
    Parenthesized {
        inputs: Vec<TypeReference>,
        output: Option<Box<TypeReference>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericArg {
    Lifetime(String),
    Type(TypeReference),
    /// `Item = T`
    Binding { name: String, ty: TypeReference },
    Const(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Trait(TypeReference),
    Lifetime(String),
}

impl TypeReference {
    /// Renders the type with every namespace spelled by `policy`.
    pub fn render(&self, policy: &dyn QualificationPolicy) -> String {
        match self {
            Self::Named {
                namespace,
                name,
                args,
            } => {
                let qualifier = policy.qualifier(namespace);
                let args = render_path_args(args, policy);
                if qualifier.is_empty() {
                    format!("{name}{args}")
                } else {
                    format!("{qualifier}::{name}{args}")
                }
            }
            Self::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                let mut out = String::from("&");
                if let Some(lifetime) = lifetime {
                    out.push_str(lifetime);
                    out.push(' ');
                }
                if *mutable {
                    out.push_str("mut ");
                }
                out.push_str(&inner.render_operand(policy));
                out
            }
            Self::Pointer { mutable, inner } => {
                let kind = if *mutable { "mut" } else { "const" };
                format!("*{kind} {}", inner.render_operand(policy))
            }
            Self::Slice(elem) => format!("[{}]", elem.render(policy)),
            Self::Array { elem, len } => format!("[{}; {len}]", elem.render(policy)),
            Self::Tuple(elems) => match elems.as_slice() {
                [single] => format!("({},)", single.render(policy)),
                _ => format!("({})", render_list(elems, policy)),
            },
            Self::FnPointer { inputs, output } => {
                format!(
                    "fn({}){}",
                    render_list(inputs, policy),
                    render_arrow(output.as_deref(), policy)
                )
            }
            Self::TraitObject(bounds) => {
                let bounds: Vec<String> = bounds
                    .iter()
                    .map(|bound| match bound {
                        Bound::Trait(path) => path.render(policy),
                        Bound::Lifetime(lifetime) => lifetime.clone(),
                    })
                    .collect();
                format!("dyn {}", bounds.join(" + "))
            }
            Self::Never => "!".to_string(),
        }
    }

    /// Renders as the operand of `&` or `*`, where `dyn A + B` needs parentheses.
    fn render_operand(&self, policy: &dyn QualificationPolicy) -> String {
        match self {
            Self::TraitObject(bounds) if bounds.len() > 1 => format!("({})", self.render(policy)),
            _ => self.render(policy),
        }
    }

    /// Calls `visit` for every module namespace referenced anywhere in the tree.
    pub fn for_each_module(&self, visit: &mut dyn FnMut(&ModulePath)) {
        match self {
            Self::Named {
                namespace, args, ..
            } => {
                if let Namespace::Module(path) = namespace {
                    visit(path);
                }
                match args {
                    PathArgs::None => {}
                    PathArgs::Angle(args) => {
                        for arg in args {
                            match arg {
                                GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => {
                                    ty.for_each_module(visit)
                                }
                                GenericArg::Lifetime(_) | GenericArg::Const(_) => {}
                            }
                        }
                    }
                    PathArgs::Parenthesized { inputs, output } => {
                        inputs.iter().for_each(|ty| ty.for_each_module(visit));
                        if let Some(output) = output {
                            output.for_each_module(visit);
                        }
                    }
                }
            }
            Self::Reference { inner, .. } | Self::Pointer { inner, .. } => {
                inner.for_each_module(visit)
            }
            Self::Slice(elem) | Self::Array { elem, .. } => elem.for_each_module(visit),
            Self::Tuple(elems) => elems.iter().for_each(|ty| ty.for_each_module(visit)),
            Self::FnPointer { inputs, output } => {
                inputs.iter().for_each(|ty| ty.for_each_module(visit));
                if let Some(output) = output {
                    output.for_each_module(visit);
                }
            }
            Self::TraitObject(bounds) => {
                for bound in bounds {
                    if let Bound::Trait(path) = bound {
                        path.for_each_module(visit);
                    }
                }
            }
            Self::Never => {}
        }
    }

    /// True if the type borrows through an elided (`&T`, `'_`) lifetime outside
    /// of any nested fn signature.
    pub fn has_elided_lifetime(&self) -> bool {
        match self {
            Self::Reference {
                lifetime, inner, ..
            } => matches!(lifetime.as_deref(), None | Some("'_")) || inner.has_elided_lifetime(),
            Self::Named {
                args: PathArgs::Angle(args),
                ..
            } => args.iter().any(|arg| match arg {
                GenericArg::Lifetime(lifetime) => lifetime == "'_",
                GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => ty.has_elided_lifetime(),
                GenericArg::Const(_) => false,
            }),
            Self::Named { .. } | Self::FnPointer { .. } | Self::Never => false,
            Self::Pointer { inner, .. } => inner.has_elided_lifetime(),
            Self::Slice(elem) | Self::Array { elem, .. } => elem.has_elided_lifetime(),
            Self::Tuple(elems) => elems.iter().any(TypeReference::has_elided_lifetime),
            Self::TraitObject(bounds) => bounds.iter().any(|bound| match bound {
                Bound::Trait(path) => path.has_elided_lifetime(),
                Bound::Lifetime(lifetime) => lifetime == "'_",
            }),
        }
    }

    /// Copy of the type with every elided lifetime found by
    /// [`has_elided_lifetime`](Self::has_elided_lifetime) spelled as `lifetime`.
    pub fn bind_elided_lifetimes(&self, lifetime: &str) -> TypeReference {
        let bind = |written: &String| {
            if written == "'_" {
                lifetime.to_string()
            } else {
                written.clone()
            }
        };
        match self {
            Self::Reference {
                lifetime: written,
                mutable,
                inner,
            } => Self::Reference {
                lifetime: Some(written.as_ref().map_or_else(|| lifetime.to_string(), bind)),
                mutable: *mutable,
                inner: Box::new(inner.bind_elided_lifetimes(lifetime)),
            },
            Self::Named {
                namespace,
                name,
                args: PathArgs::Angle(args),
            } => Self::Named {
                namespace: namespace.clone(),
                name: name.clone(),
                args: PathArgs::Angle(
                    args.iter()
                        .map(|arg| match arg {
                            GenericArg::Lifetime(written) => GenericArg::Lifetime(bind(written)),
                            GenericArg::Type(ty) => {
                                GenericArg::Type(ty.bind_elided_lifetimes(lifetime))
                            }
                            GenericArg::Binding { name, ty } => GenericArg::Binding {
                                name: name.clone(),
                                ty: ty.bind_elided_lifetimes(lifetime),
                            },
                            GenericArg::Const(expr) => GenericArg::Const(expr.clone()),
                        })
                        .collect(),
                ),
            },
            Self::Pointer { mutable, inner } => Self::Pointer {
                mutable: *mutable,
                inner: Box::new(inner.bind_elided_lifetimes(lifetime)),
            },
            Self::Slice(elem) => Self::Slice(Box::new(elem.bind_elided_lifetimes(lifetime))),
            Self::Array { elem, len } => Self::Array {
                elem: Box::new(elem.bind_elided_lifetimes(lifetime)),
                len: len.clone(),
            },
            Self::Tuple(elems) => Self::Tuple(
                elems
                    .iter()
                    .map(|ty| ty.bind_elided_lifetimes(lifetime))
                    .collect(),
            ),
            Self::TraitObject(bounds) => Self::TraitObject(
                bounds
                    .iter()
                    .map(|bound| match bound {
                        Bound::Trait(path) => Bound::Trait(path.bind_elided_lifetimes(lifetime)),
                        Bound::Lifetime(written) => Bound::Lifetime(bind(written)),
                    })
                    .collect(),
            ),
            Self::Named { .. } | Self::FnPointer { .. } | Self::Never => self.clone(),
        }
    }
}

fn render_list(types: &[TypeReference], policy: &dyn QualificationPolicy) -> String {
    types
        .iter()
        .map(|ty| ty.render(policy))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_arrow(output: Option<&TypeReference>, policy: &dyn QualificationPolicy) -> String {
    output
        .map(|ty| format!(" -> {}", ty.render(policy)))
        .unwrap_or_default()
}

fn render_path_args(args: &PathArgs, policy: &dyn QualificationPolicy) -> String {
    match args {
        PathArgs::None => String::new(),
        PathArgs::Angle(args) => {
            let rendered: Vec<String> = args
                .iter()
                .map(|arg| match arg {
                    GenericArg::Lifetime(lifetime) => lifetime.clone(),
                    GenericArg::Type(ty) => ty.render(policy),
                    GenericArg::Binding { name, ty } => format!("{name} = {}", ty.render(policy)),
                    GenericArg::Const(expr) => expr.clone(),
                })
                .collect();
            format!("<{}>", rendered.join(", "))
        }
        PathArgs::Parenthesized { inputs, output } => format!(
            "({}){}",
            render_list(inputs, policy),
            render_arrow(output.as_deref(), policy)
        ),
    }
}

/// Names visible in a unit's module: its `use` imports and its own declarations.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    own: Option<ModulePath>,
    /// Local name -> full path of the imported item (module path + item name).
    imports: BTreeMap<String, Vec<String>>,
    declared: BTreeSet<String>,
}

impl Scope {
    /// Builds the scope of a module from its top-level items.
    pub fn from_items(items: &[syn::Item], own: Option<ModulePath>) -> Self {
        let mut scope = Scope {
            own,
            ..Scope::default()
        };
        for item in items {
            match item {
                syn::Item::Use(item) => scope.collect_use(&item.tree, Vec::new()),
                syn::Item::ExternCrate(item) => {
                    let local = item
                        .rename
                        .as_ref()
                        .map(|(_, rename)| rename.to_string())
                        .unwrap_or_else(|| item.ident.to_string());
                    scope.imports.insert(local, vec![item.ident.to_string()]);
                }
                syn::Item::Struct(item) => scope.declare(&item.ident),
                syn::Item::Enum(item) => scope.declare(&item.ident),
                syn::Item::Union(item) => scope.declare(&item.ident),
                syn::Item::Type(item) => scope.declare(&item.ident),
                syn::Item::Trait(item) => scope.declare(&item.ident),
                syn::Item::Mod(item) => scope.declare(&item.ident),
                _ => {}
            }
        }
        scope
    }

    /// Module path of the unit, when known.
    pub fn own_module(&self) -> Option<&ModulePath> {
        self.own.as_ref()
    }

    fn declare(&mut self, ident: &syn::Ident) {
        self.declared.insert(ident.to_string());
    }

    fn collect_use(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.collect_use(&path.tree, prefix);
            }
            syn::UseTree::Name(name) if name.ident == "self" => {
                if let Some(last) = prefix.last().cloned() {
                    self.imports.insert(last, prefix);
                }
            }
            syn::UseTree::Name(name) => {
                let local = name.ident.to_string();
                prefix.push(local.clone());
                self.imports.insert(local, prefix);
            }
            syn::UseTree::Rename(rename) => {
                if rename.ident != "self" {
                    prefix.push(rename.ident.to_string());
                }
                self.imports.insert(rename.rename.to_string(), prefix);
            }
            syn::UseTree::Glob(_) => {
                warn!(
                    path = %prefix.join("::"),
                    "glob import skipped; names it brings in are treated as local"
                );
            }
            syn::UseTree::Group(group) => {
                for tree in &group.items {
                    self.collect_use(tree, prefix.clone());
                }
            }
        }
    }

    /// Lowers a `syn` type, resolving every path against this scope.
    ///
    /// Returns a description of the offending construct for shapes that cannot be
    /// rendered faithfully.
    pub fn lower(&self, ty: &syn::Type) -> Result<TypeReference, String> {
        match ty {
            syn::Type::Path(type_path) => {
                if type_path.qself.is_some() {
                    return Err(format!(
                        "qualified paths like `{}` are not supported",
                        spelled(ty)
                    ));
                }
                self.lower_path(&type_path.path)
            }
            syn::Type::Reference(reference) => Ok(TypeReference::Reference {
                lifetime: reference.lifetime.as_ref().map(ToString::to_string),
                mutable: reference.mutability.is_some(),
                inner: Box::new(self.lower(&reference.elem)?),
            }),
            syn::Type::Ptr(ptr) => Ok(TypeReference::Pointer {
                mutable: ptr.mutability.is_some(),
                inner: Box::new(self.lower(&ptr.elem)?),
            }),
            syn::Type::Slice(slice) => Ok(TypeReference::Slice(Box::new(self.lower(&slice.elem)?))),
            syn::Type::Array(array) => Ok(TypeReference::Array {
                elem: Box::new(self.lower(&array.elem)?),
                len: array.len.to_token_stream().to_string(),
            }),
            syn::Type::Tuple(tuple) => Ok(TypeReference::Tuple(
                tuple
                    .elems
                    .iter()
                    .map(|elem| self.lower(elem))
                    .collect::<Result<_, _>>()?,
            )),
            syn::Type::BareFn(bare_fn) => {
                if bare_fn.lifetimes.is_some()
                    || bare_fn.unsafety.is_some()
                    || bare_fn.abi.is_some()
                    || bare_fn.variadic.is_some()
                {
                    return Err(format!(
                        "function pointer `{}` is not supported",
                        spelled(ty)
                    ));
                }
                Ok(TypeReference::FnPointer {
                    inputs: bare_fn
                        .inputs
                        .iter()
                        .map(|arg| self.lower(&arg.ty))
                        .collect::<Result<_, _>>()?,
                    output: self.lower_return(&bare_fn.output)?.map(Box::new),
                })
            }
            syn::Type::TraitObject(object) => Ok(TypeReference::TraitObject(
                object
                    .bounds
                    .iter()
                    .map(|bound| self.lower_bound(bound))
                    .collect::<Result<_, _>>()?,
            )),
            syn::Type::Paren(paren) => self.lower(&paren.elem),
            syn::Type::Group(group) => self.lower(&group.elem),
            syn::Type::Never(_) => Ok(TypeReference::Never),
            syn::Type::ImplTrait(_) => Err(format!(
                "`{}` cannot be stored in a handler; use a concrete or `dyn` type",
                spelled(ty)
            )),
            syn::Type::Infer(_) => Err("inferred type `_` is not allowed here".to_string()),
            _ => Err(format!("type `{}` is not supported", spelled(ty))),
        }
    }

    /// Lowers a return type; `-> ()` and no arrow both yield `None`.
    pub fn lower_return(&self, output: &syn::ReturnType) -> Result<Option<TypeReference>, String> {
        match output {
            syn::ReturnType::Default => Ok(None),
            syn::ReturnType::Type(_, ty) => match self.lower(ty)? {
                TypeReference::Tuple(elems) if elems.is_empty() => Ok(None),
                lowered => Ok(Some(lowered)),
            },
        }
    }

    fn lower_bound(&self, bound: &syn::TypeParamBound) -> Result<Bound, String> {
        match bound {
            syn::TypeParamBound::Trait(trait_bound) => {
                if trait_bound.lifetimes.is_some()
                    || !matches!(trait_bound.modifier, syn::TraitBoundModifier::None)
                {
                    return Err(format!(
                        "bound `{}` is not supported",
                        trait_bound.to_token_stream()
                    ));
                }
                Ok(Bound::Trait(self.lower_path(&trait_bound.path)?))
            }
            syn::TypeParamBound::Lifetime(lifetime) => Ok(Bound::Lifetime(lifetime.to_string())),
            other => Err(format!(
                "bound `{}` is not supported",
                other.to_token_stream()
            )),
        }
    }

    fn lower_path(&self, path: &syn::Path) -> Result<TypeReference, String> {
        let segments: Vec<&syn::PathSegment> = path.segments.iter().collect();
        let Some((last, prefix)) = segments.split_last() else {
            return Err("empty type path".to_string());
        };
        if segments.iter().any(|segment| segment.ident == "Self") {
            return Err(format!(
                "`{}` refers to `Self`, which the wrapper cannot name",
                path.to_token_stream()
            ));
        }
        if prefix
            .iter()
            .any(|segment| !matches!(segment.arguments, syn::PathArguments::None))
        {
            return Err(format!(
                "generic arguments inside path `{}` are not supported",
                path.to_token_stream()
            ));
        }

        let mut name = last.ident.to_string();
        let args = self.lower_path_args(&last.arguments)?;

        let namespace = if prefix.is_empty() && path.leading_colon.is_none() {
            if let Some(imported) = self.imports.get(&name) {
                match imported.split_last() {
                    Some((original, module)) if !module.is_empty() => {
                        name = original.clone();
                        self.module_namespace(module.to_vec())
                    }
                    _ => Namespace::Local,
                }
            } else if self.declared.contains(&name) {
                Namespace::Local
            } else if PRELUDE_NAMES.contains(&name.as_str()) {
                Namespace::Prelude
            } else {
                Namespace::Local
            }
        } else {
            let written: Vec<String> = prefix.iter().map(|s| s.ident.to_string()).collect();
            let first = written[0].as_str();
            let base = if path.leading_colon.is_some() || PATH_KEYWORDS.contains(&first) {
                written
            } else if let Some(imported) = self.imports.get(first) {
                let mut base = imported.clone();
                base.extend(written[1..].iter().cloned());
                base
            } else if self.declared.contains(first) {
                let mut base = vec!["self".to_string()];
                base.extend(written);
                base
            } else {
                written
            };
            self.module_namespace(base)
        };

        Ok(TypeReference::Named {
            namespace,
            name,
            args,
        })
    }

    fn module_namespace(&self, segments: Vec<String>) -> Namespace {
        let path = ModulePath::new(segments).normalize(self.own.as_ref());
        if path.segments() == ["self"] || Some(&path) == self.own.as_ref() {
            Namespace::Local
        } else {
            Namespace::Module(path)
        }
    }

    fn lower_path_args(&self, args: &syn::PathArguments) -> Result<PathArgs, String> {
        match args {
            syn::PathArguments::None => Ok(PathArgs::None),
            syn::PathArguments::AngleBracketed(angle) => {
                let mut lowered = Vec::new();
                for arg in &angle.args {
                    lowered.push(match arg {
                        syn::GenericArgument::Lifetime(lifetime) => {
                            GenericArg::Lifetime(lifetime.to_string())
                        }
                        syn::GenericArgument::Type(ty) => GenericArg::Type(self.lower(ty)?),
                        syn::GenericArgument::AssocType(assoc) if assoc.generics.is_none() => {
                            GenericArg::Binding {
                                name: assoc.ident.to_string(),
                                ty: self.lower(&assoc.ty)?,
                            }
                        }
                        syn::GenericArgument::Const(expr) => {
                            GenericArg::Const(expr.to_token_stream().to_string())
                        }
                        other => {
                            return Err(format!(
                                "generic argument `{}` is not supported",
                                other.to_token_stream()
                            ))
                        }
                    });
                }
                Ok(PathArgs::Angle(lowered))
            }
            syn::PathArguments::Parenthesized(paren) => Ok(PathArgs::Parenthesized {
                inputs: paren
                    .inputs
                    .iter()
                    .map(|ty| self.lower(ty))
                    .collect::<Result<_, _>>()?,
                output: self.lower_return(&paren.output)?.map(Box::new),
            }),
        }
    }
}

fn spelled(ty: &syn::Type) -> String {
    ty.to_token_stream().to_string()
}
