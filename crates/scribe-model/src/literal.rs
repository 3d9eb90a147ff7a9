//! PHP literal text for property and constant values

/// Renders canonical PHP literal source text
///
/// Arrays with at least one element are laid out one element per line so
/// the result satisfies [`crate::model::is_array_layout`].
#[derive(Debug, Clone, Copy)]
pub struct Literal;

impl Literal {
    /// Single-quoted string
    #[must_use]
    pub fn string(value: &str) -> String {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{escaped}'")
    }

    /// `true` / `false`
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> String {
        if value { "true" } else { "false" }.to_string()
    }

    /// Integer
    #[inline]
    #[must_use]
    pub fn int(value: i64) -> String {
        value.to_string()
    }

    /// `null`
    #[inline]
    #[must_use]
    pub fn null() -> String {
        "null".to_string()
    }

    /// List of already-rendered values
    #[must_use]
    pub fn list<I, S>(items: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = items
            .into_iter()
            .map(|item| format!("{},", indent(item.as_ref())))
            .collect();
        block(&lines)
    }

    /// List of strings
    #[must_use]
    pub fn string_list<I, S>(items: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::list(items.into_iter().map(|s| Self::string(s.as_ref())))
    }

    /// Map of string keys to already-rendered values
    #[must_use]
    pub fn map<I, K, V>(entries: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let lines: Vec<String> = entries
            .into_iter()
            .map(|(key, value)| {
                format!("{} => {},", indent(&Self::string(key.as_ref())), value.as_ref().replace('\n', "\n    "))
            })
            .collect();
        block(&lines)
    }
}

fn indent(value: &str) -> String {
    format!("    {}", value.replace('\n', "\n    "))
}

fn block(lines: &[String]) -> String {
    if lines.is_empty() {
        "[]".to_string()
    } else {
        format!("[\n{}\n]", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::is_array_layout;

    #[test]
    fn scalars() {
        assert_eq!(Literal::string("it's"), "'it\\'s'");
        assert_eq!(Literal::bool(false), "false");
        assert_eq!(Literal::int(-3), "-3");
        assert_eq!(Literal::null(), "null");
    }

    #[test]
    fn empty_list() {
        assert_eq!(Literal::list(Vec::<String>::new()), "[]");
    }

    #[test]
    fn string_list_layout() {
        let value = Literal::string_list(["name", "email"]);
        assert_eq!(value, "[\n    'name',\n    'email',\n]");
        assert!(is_array_layout(&value));
    }

    #[test]
    fn nested_map() {
        let value = Literal::map([("casts", Literal::string_list(["a"]))]);
        assert_eq!(value, "[\n    'casts' => [\n        'a',\n    ],\n]");
    }
}
