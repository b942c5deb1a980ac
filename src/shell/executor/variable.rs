use std::env;

/// Substitutes `$NAME` and `${NAME}` in `input` from the process environment.
///
/// Unset variables expand to the empty string. A `$` that does not start a
/// name is kept literally; `${` without a closing brace falls back to the
/// `$NAME` form. Substituted text is not expanded again.
pub fn expand(input: &str) -> String {
    expand_with(input, |name| env::var(name).ok())
}

pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                result.push_str(&lookup(&braced[..end]).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
        }

        let name_len = after
            .find(|c: char| !is_name_char(c))
            .unwrap_or(after.len());
        if name_len > 0 {
            result.push_str(&lookup(&after[..name_len]).unwrap_or_default());
        } else {
            result.push('$');
        }
        rest = &after[name_len..];
    }

    result.push_str(rest);
    result
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
