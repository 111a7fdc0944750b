//! Per-method signature translation into positional, qualified text.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::MiddlewarerError;
use crate::resolve::Method;
use crate::types::{ModulePath, QualificationPolicy, Scope, TypeReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// How a method borrows its receiver.
pub enum Receiver {
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
}

impl Receiver {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "&self",
            Self::Exclusive => "&mut self",
        }
    }

    /// `Option<Box<dyn T>>` accessor that borrows the delegate the same way.
    pub fn delegate_accessor(self) -> &'static str {
        match self {
            Self::Shared => "as_deref",
            Self::Exclusive => "as_deref_mut",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A synthesized positional parameter, `a0: T0`.
pub struct ParamBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Serialize)]
/// A method signature rendered under a qualification policy.
pub struct TranslatedSignature {
    pub receiver: Receiver,
    pub params: Vec<ParamBinding>,
    /// Rendered result types; empty when the method returns nothing.
    pub results: Vec<String>,
    /// Result types as written in the handler alias, with elided borrows
    /// spelled as the alias lifetime.
    pub handler_results: Vec<String>,
    /// Modules the rendered text refers to.
    #[serde(skip)]
    pub namespaces: BTreeSet<ModulePath>,
}

impl TranslatedSignature {
    /// `a0: T0, a1: T1`
    pub fn param_list(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `a0, a1`
    pub fn arg_list(&self) -> String {
        self.params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `T0, T1`
    pub fn param_types(&self) -> String {
        self.params
            .iter()
            .map(|p| p.ty.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `None` for no results, `R` for one, `(R0, R1)` for several.
    pub fn result_type(&self) -> Option<String> {
        joined_results(&self.results)
    }

    /// ` -> R`, or nothing for methods without results.
    pub fn return_arrow(&self) -> String {
        arrow(self.result_type())
    }

    /// Return arrow of the handler alias.
    pub fn handler_return_arrow(&self) -> String {
        arrow(joined_results(&self.handler_results))
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

fn joined_results(results: &[String]) -> Option<String> {
    match results {
        [] => None,
        [single] => Some(single.clone()),
        many => Some(format!("({})", many.join(", "))),
    }
}

fn arrow(result: Option<String>) -> String {
    result.map(|ty| format!(" -> {ty}")).unwrap_or_default()
}

/// Translates one method into positional bindings and rendered types.
///
/// Source parameter names are discarded in favour of `a0`, `a1`, ... so the
/// generated code never collides with keywords or patterns.
///
/// Results that borrow through an elided lifetime are accepted for `&self`
/// methods: the handler alias spells them with `handler_lifetime`, which the
/// generated body ties to the borrow of `self`.
pub fn translate_method(
    method: &Method,
    scope: &Scope,
    policy: &dyn QualificationPolicy,
    handler_lifetime: &str,
) -> Result<TranslatedSignature, MiddlewarerError> {
    let sig = &method.signature;
    let fail = |message: String| MiddlewarerError::translate(&method.name, message);

    if sig.asyncness.is_some() {
        return Err(fail("async methods are not supported".to_string()));
    }
    if sig.unsafety.is_some() {
        return Err(fail("unsafe methods are not supported".to_string()));
    }
    if sig.abi.is_some() || sig.variadic.is_some() {
        return Err(fail("extern and variadic methods are not supported".to_string()));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(fail(
            "generic methods cannot be stored as handler values".to_string(),
        ));
    }

    let mut inputs = sig.inputs.iter();
    let receiver = match inputs.next() {
        Some(syn::FnArg::Receiver(receiver)) => translate_receiver(receiver).map_err(fail)?,
        _ => {
            return Err(fail(
                "methods without a `self` receiver cannot be called through a delegate"
                    .to_string(),
            ))
        }
    };

    let mut namespaces = BTreeSet::new();
    let mut collect = |ty: &TypeReference| {
        ty.for_each_module(&mut |path| {
            namespaces.insert(path.clone());
        })
    };

    let mut params = Vec::new();
    for (index, input) in inputs.enumerate() {
        let syn::FnArg::Typed(typed) = input else {
            return Err(fail("unexpected second receiver".to_string()));
        };
        let lowered = scope.lower(&typed.ty).map_err(fail)?;
        collect(&lowered);
        params.push(ParamBinding {
            name: format!("a{index}"),
            ty: lowered.render(policy),
        });
    }

    let result_types = match scope.lower_return(&sig.output).map_err(fail)? {
        None => Vec::new(),
        Some(TypeReference::Tuple(elems)) if elems.len() >= 2 => elems,
        Some(single) => vec![single],
    };
    if receiver == Receiver::Exclusive
        && result_types.iter().any(TypeReference::has_elided_lifetime)
    {
        return Err(fail(
            "`&mut self` results that borrow through an elided lifetime cannot be returned \
             from a handler; use owned or `'static` types"
                .to_string(),
        ));
    }
    let mut results = Vec::new();
    let mut handler_results = Vec::new();
    for ty in &result_types {
        collect(ty);
        results.push(ty.render(policy));
        handler_results.push(ty.bind_elided_lifetimes(handler_lifetime).render(policy));
    }

    let translated = TranslatedSignature {
        receiver,
        params,
        results,
        handler_results,
        namespaces,
    };
    debug!(
        method = %method.name,
        line = method.line,
        params = %translated.param_list(),
        result = ?translated.result_type(),
        "translated method"
    );
    Ok(translated)
}

fn translate_receiver(receiver: &syn::Receiver) -> Result<Receiver, String> {
    if receiver.colon_token.is_some() {
        return Err(format!(
            "typed receiver `self: {}` is not supported",
            quote::ToTokens::to_token_stream(&receiver.ty)
        ));
    }
    match &receiver.reference {
        Some((_, None)) if receiver.mutability.is_some() => Ok(Receiver::Exclusive),
        Some((_, None)) => Ok(Receiver::Shared),
        Some((_, Some(lifetime))) => Err(format!(
            "receiver lifetime `{lifetime}` cannot be expressed by the wrapper"
        )),
        None => Err("by-value `self` cannot be forwarded out of a boxed delegate".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{translate_method, Receiver};
    use crate::resolve::Method;
    use crate::types::{ChildModulePolicy, ModulePath, Scope};

    fn method(source: &str) -> Method {
        let item: syn::TraitItemFn = syn::parse_str(source).expect("valid method");
        Method {
            name: item.sig.ident.to_string(),
            signature: item.sig,
            line: 1,
        }
    }

    fn scope(source: &str) -> Scope {
        let file = syn::parse_file(source).expect("valid source");
        Scope::from_items(&file.items, Some(ModulePath::new(vec!["crate".to_string()])))
    }

    fn policy() -> ChildModulePolicy {
        ChildModulePolicy::new(Some(ModulePath::new(vec!["crate".to_string()])))
    }

    #[test]
    fn synthesizes_positional_parameters() {
        let scope = scope("pub struct Baz; pub struct Quz;");
        let sig = translate_method(&method("fn bar(&self, input: Baz, mut n: u32) -> Quz;"), &scope, &policy(), "'h")
            .unwrap();
        assert_eq!(sig.receiver, Receiver::Shared);
        assert_eq!(sig.param_list(), "a0: Baz, a1: u32");
        assert_eq!(sig.arg_list(), "a0, a1");
        assert_eq!(sig.param_types(), "Baz, u32");
        assert_eq!(sig.return_arrow(), " -> Quz");
    }

    #[test]
    fn result_shapes_follow_arity() {
        let scope = scope("");
        let none = translate_method(&method("fn ping(&mut self);"), &scope, &policy(), "'h").unwrap();
        assert_eq!(none.receiver, Receiver::Exclusive);
        assert!(none.params.is_empty());
        assert_eq!(none.result_type(), None);

        let unit = translate_method(&method("fn ping(&self) -> ();"), &scope, &policy(), "'h").unwrap();
        assert!(!unit.has_results());

        let one = translate_method(&method("fn len(&self) -> Option<u64>;"), &scope, &policy(), "'h")
            .unwrap();
        assert_eq!(one.result_type().as_deref(), Some("Option<u64>"));

        let many = translate_method(
            &method("fn split(&self, at: usize) -> (Vec<u8>, Vec<u8>, bool);"),
            &scope,
            &policy(),
            "'h",
        )
        .unwrap();
        assert_eq!(many.results.len(), 3);
        assert_eq!(many.result_type().as_deref(), Some("(Vec<u8>, Vec<u8>, bool)"));
    }

    #[test]
    fn records_foreign_namespaces() {
        let scope = scope("use std::collections::HashMap; use crate::models::User;");
        let sig = translate_method(
            &method("fn index(&self, users: &[User]) -> HashMap<u64, User>;"),
            &scope,
            &policy(),
            "'h",
        )
        .unwrap();
        assert_eq!(sig.param_list(), "a0: &[models::User]");
        assert_eq!(sig.return_arrow(), " -> collections::HashMap<u64, models::User>");
        let namespaces: Vec<String> = sig.namespaces.iter().map(ToString::to_string).collect();
        assert_eq!(namespaces, vec!["crate::models", "std::collections"]);
    }

    #[test]
    fn rejects_signatures_a_handler_cannot_express() {
        let scope = scope("");
        for source in [
            "fn build() -> u8;",
            "fn consume(self) -> u8;",
            "fn boxed(self: Box<Self>);",
            "fn pick<T>(&self, t: T);",
            "async fn fetch(&self) -> u8;",
            "unsafe fn raw(&self);",
            "fn name_mut(&mut self) -> &str;",
            "fn tied<'a>(&'a self) -> &'a str;",
            "fn iter(&self, it: impl Iterator<Item = u8>);",
        ] {
            assert!(
                translate_method(&method(source), &scope, &policy(), "'h").is_err(),
                "expected `{source}` to be rejected"
            );
        }
    }

    #[test]
    fn shared_receiver_borrows_bind_to_the_handler_lifetime() {
        let scope = scope("");
        let sig = translate_method(&method("fn name(&self) -> &str;"), &scope, &policy(), "'h")
            .unwrap();
        assert_eq!(sig.return_arrow(), " -> &str");
        assert_eq!(sig.handler_return_arrow(), " -> &'h str");

        let sig = translate_method(
            &method("fn lookup(&self, key: &str) -> (Option<&[u8]>, usize);"),
            &scope,
            &policy(),
            "'h",
        )
        .unwrap();
        assert_eq!(sig.param_types(), "&str");
        assert_eq!(sig.handler_return_arrow(), " -> (Option<&'h [u8]>, usize)");
    }

    #[test]
    fn static_borrows_in_results_are_allowed() {
        let scope = scope("");
        let sig = translate_method(&method("fn label(&self, key: &str) -> &'static str;"), &scope, &policy(), "'h")
            .unwrap();
        assert_eq!(sig.param_list(), "a0: &str");
        assert_eq!(sig.return_arrow(), " -> &'static str");
    }
}
