/// Reduces a registration path to its canonical form: one leading `/` is
/// dropped, and for service paths one trailing `/` as well.
pub fn normalize_path(path: &str, is_service_path: bool) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return String::new();
    }

    if is_service_path {
        return path.strip_suffix('/').unwrap_or(path).to_string();
    }

    path.to_string()
}

/// `SayHello` -> `sayHello`.
///
/// Every capital starts a new word in UpperCamel, so only the first
/// character changes case: `HTTPCall` becomes `hTTPCall`.
pub fn to_lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
