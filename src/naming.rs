//! Deterministic identifier derivation for generated items.
//!
//! Callers write override code against these names, so the same trait and
//! method names must always map to the same identifiers.

/// Suffix of the wrapper type and of every override field.
pub const MIDDLEWARE_SUFFIX: &str = "Middleware";

/// `UserStore` -> `UserStoreMiddleware`.
pub fn wrapper_type_name(contract: &str) -> String {
    format!("{}{MIDDLEWARE_SUFFIX}", unraw(contract))
}

/// `UserStore` -> `wrap_user_store`.
pub fn constructor_name(contract: &str) -> String {
    format!("wrap_{}", to_snake_case(contract))
}

/// `get_user` -> `GetUserHandler`.
pub fn handler_type_name(method: &str) -> String {
    format!("{}Handler", to_pascal_case(method))
}

/// `get_user` -> `get_user_middleware`.
pub fn override_field_name(method: &str) -> String {
    format!("{}_middleware", to_snake_case(method))
}

/// Strips the `r#` prefix of raw identifiers.
pub fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

pub fn to_pascal_case(raw: &str) -> String {
    let mut out = String::new();
    for token in identifier_tokens(unraw(raw)) {
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}

pub fn to_snake_case(raw: &str) -> String {
    identifier_tokens(unraw(raw)).join("_")
}

fn identifier_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        if chunk.is_empty() {
            continue;
        }
        tokens.extend(split_camel_tokens(chunk));
    }
    tokens
}

fn split_camel_tokens(chunk: &str) -> Vec<String> {
    let chars: Vec<char> = chunk.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut start = 0usize;

    for i in 1..chars.len() {
        let prev = chars[i - 1];
        let curr = chars[i];
        let next = chars.get(i + 1).copied();

        let boundary = ((prev.is_ascii_lowercase() || prev.is_ascii_digit())
            && curr.is_ascii_uppercase())
            || (prev.is_ascii_uppercase()
                && curr.is_ascii_uppercase()
                && next.map(|n| n.is_ascii_lowercase()).unwrap_or(false));

        if boundary {
            tokens.push(chars[start..i].iter().collect::<String>().to_ascii_lowercase());
            start = i;
        }
    }

    tokens.push(chars[start..].iter().collect::<String>().to_ascii_lowercase());
    tokens
}
