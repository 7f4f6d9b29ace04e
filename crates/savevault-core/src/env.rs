use std::collections::HashMap;

/// Source of environment variables for placeholder expansion and
/// shell-folder lookup.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the current process environment.
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        // Windows variable names are case-insensitive.
        self.get(key).cloned().or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        })
    }
}

/// Expand `%VAR%`, `${VAR}` and `$VAR` placeholders.
///
/// Returns `None` when any referenced variable is undefined, so callers
/// never probe a half-expanded path.
pub fn expand_env_vars(template: &str, env: &dyn Environment) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['%', '$']) {
        out.push_str(&rest[..pos]);
        let marker = rest.as_bytes()[pos];
        let after = &rest[pos + 1..];

        let (name, consumed) = if marker == b'%' {
            match after.find('%') {
                Some(end) if end > 0 => (&after[..end], end + 1),
                _ => {
                    out.push('%');
                    rest = after;
                    continue;
                }
            }
        } else if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => (&braced[..end], end + 2),
                _ => {
                    out.push('$');
                    rest = after;
                    continue;
                }
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if end == 0 {
                out.push('$');
                rest = after;
                continue;
            }
            (&after[..end], end)
        };

        out.push_str(&env.var(name)?);
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> HashMap<String, String> {
        HashMap::from([
            ("USERPROFILE".to_string(), "C:\\Users\\ana".to_string()),
            ("HOME".to_string(), "/home/ana".to_string()),
        ])
    }

    #[test]
    fn test_expand_percent() {
        assert_eq!(
            expand_env_vars("%USERPROFILE%\\Saves\\Foo", &env()).as_deref(),
            Some("C:\\Users\\ana\\Saves\\Foo")
        );
    }

    #[test]
    fn test_expand_percent_case_insensitive() {
        assert_eq!(
            expand_env_vars("%UserProfile%\\Saves", &env()).as_deref(),
            Some("C:\\Users\\ana\\Saves")
        );
    }

    #[test]
    fn test_expand_dollar_forms() {
        assert_eq!(
            expand_env_vars("$HOME/.local/${HOME}", &env()).as_deref(),
            Some("/home/ana/.local//home/ana")
        );
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(expand_env_vars("%NOPE%\\Saves", &env()), None);
    }

    #[test]
    fn test_literal_markers_kept() {
        assert_eq!(
            expand_env_vars("100% done $", &env()).as_deref(),
            Some("100% done $")
        );
    }
}
