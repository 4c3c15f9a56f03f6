//! Name comparison helpers.

use heck::ToSnakeCase;
use std::collections::HashSet;

/// Lowercase slug keeping only alphanumeric characters.
///
/// Two names with the same slug would collide once a renderer applies its naming conventions,
/// so every duplicate check compares slugs rather than raw names.
pub fn alnum(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Append `_1`, `_2`, ... to `name` until its slug is not reserved.
pub fn unique_name(name: &str, reserved: &HashSet<String>) -> String {
    if !reserved.contains(&alnum(name)) {
        return name.to_string();
    }

    let mut index = 1;
    loop {
        let candidate = format!("{name}_{index}");
        if !reserved.contains(&alnum(&candidate)) {
            return candidate;
        }
        index += 1;
    }
}

/// Snake case identifier suitable for a package or module segment.
pub fn module_name(value: &str) -> String {
    let snake = value.to_snake_case();
    let cleaned: String = snake
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    match cleaned.chars().next() {
        None => "mod".to_string(),
        Some(first) if first.is_ascii_digit() => format!("v{cleaned}"),
        Some(_) => cleaned,
    }
}
