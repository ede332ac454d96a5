//! Identifier case conversion.
//!
//! Names are split into words at separators, case boundaries and known
//! initialisms, then reassembled for the target style. The initialism set and
//! the prefix applied to names that do not start with a letter are part of an
//! immutable [`Naming`] value rather than process-wide state.

use std::fmt;
use std::sync::Arc;

/// Acronyms kept as whole upper-cased words.
pub const COMMON_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTPS", "HTTP", "ID", "IP",
    "IPv4", "IPv6", "JSON", "LHS", "OAI", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH",
    "TCP", "TLS", "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP",
    "XSRF", "XSS",
];

/// Builds a prefix for names that would not start with a letter.
pub type PrefixFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexem {
    Casual(String),
    Initialism { original: String, matched: String },
}

impl Lexem {
    fn original(&self) -> &str {
        match self {
            Lexem::Casual(original) | Lexem::Initialism { original, .. } => original,
        }
    }

    fn go_name(&self) -> String {
        match self {
            Lexem::Initialism { matched, .. } => matched.trim().to_uppercase(),
            Lexem::Casual(original) => {
                let mut chars = original.chars();
                match chars.next() {
                    Some(first) if original.chars().count() > 1 => {
                        first.to_uppercase().chain(chars.as_str().trim().to_lowercase().chars()).collect()
                    }
                    _ => original.clone(),
                }
            }
        }
    }
}

/// Naming configuration shared by all case conversions.
#[derive(Clone)]
pub struct Naming {
    /// Sorted longest first so that `HTTPS` wins over `HTTP`.
    initialisms: Vec<String>,
    prefix: Option<PrefixFn>,
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Naming")
            .field("initialisms", &self.initialisms)
            .field("prefix", &self.prefix.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(COMMON_INITIALISMS.iter().copied())
    }
}

impl Naming {
    pub fn new<I, S>(initialisms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut initialisms: Vec<String> = initialisms.into_iter().map(Into::into).collect();
        initialisms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        initialisms.dedup();
        Self {
            initialisms,
            prefix: None,
        }
    }

    /// Replaces the default `X` prefix used for names not starting with a letter.
    #[must_use]
    pub fn with_prefix<F>(mut self, prefix: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.prefix = Some(Arc::new(prefix));
        self
    }

    pub fn is_initialism(&self, word: &str) -> bool {
        self.initialisms.iter().any(|i| i == word)
    }

    /// Sanitizes a name for a public Go identifier.
    pub fn to_go_name(&self, name: &str) -> String {
        let mut result: String = self.split(name, true).iter().map(Lexem::go_name).collect();

        let Some(first) = result.chars().next() else {
            return result;
        };

        if !first.is_alphabetic() || (!first.is_ascii() && !first.is_uppercase()) {
            match &self.prefix {
                None => return format!("X{result}"),
                Some(prefix) => result = format!("{}{result}", prefix(name)),
            }
        }

        let mut chars = result.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() && !first.is_uppercase() => {
                first.to_uppercase().chain(chars).collect()
            }
            _ => result,
        }
    }

    /// Sanitizes a name for a private Go identifier.
    pub fn to_var_name(&self, name: &str) -> String {
        let res = self.to_go_name(name);
        if self.is_initialism(&res) || res.chars().count() <= 1 {
            return res.to_lowercase();
        }

        let mut chars = res.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => res,
        }
    }

    /// Lower-cased words joined with `_`.
    pub fn to_file_name(&self, name: &str) -> String {
        self.joined_lowercase(name, "_")
    }

    /// Lower-cased words joined with `-`.
    pub fn to_command_name(&self, name: &str) -> String {
        self.joined_lowercase(name, "-")
    }

    pub fn to_go_package_name(&self, name: &str) -> String {
        self.to_go_name(name).to_lowercase()
    }

    /// Space separated words with the first letter of each capitalized.
    pub fn to_human_name_title(&self, name: &str) -> String {
        self.split(name, true)
            .iter()
            .map(|lexem| match lexem {
                Lexem::Casual(original) => camelize(original),
                Lexem::Initialism { original, .. } => original.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn joined_lowercase(&self, name: &str, separator: &str) -> String {
        self.split(name, false)
            .iter()
            .map(|lexem| lexem.original().trim().to_lowercase())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn split(&self, name: &str, post_split_check: bool) -> Vec<Lexem> {
        let chars: Vec<char> = name.chars().collect();
        let mut lexems = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            match self.initialism_at(&chars, i) {
                Some(len) => {
                    self.break_casual(&chars[start..i], post_split_check, &mut lexems);
                    let matched: String = chars[i..i + len].iter().collect();
                    lexems.push(Lexem::Initialism {
                        original: matched.clone(),
                        matched,
                    });
                    i += len;
                    start = i;
                }
                None => i += 1,
            }
        }

        self.break_casual(&chars[start..], post_split_check, &mut lexems);
        lexems
    }

    /// Length of the initialism starting at `i`, unless the next character
    /// is lower case (then it is the start of a regular word).
    fn initialism_at(&self, chars: &[char], i: usize) -> Option<usize> {
        self.initialisms.iter().find_map(|initialism| {
            let body: Vec<char> = initialism.chars().collect();
            let end = i + body.len();
            if end > chars.len() || chars[i..end] != body[..] {
                return None;
            }
            if chars.get(end).is_some_and(|c| c.is_lowercase()) {
                return None;
            }
            Some(body.len())
        })
    }

    fn break_casual(&self, chars: &[char], post_split_check: bool, out: &mut Vec<Lexem>) {
        let mut current = String::new();

        let push = |word: &str, out: &mut Vec<Lexem>| {
            if post_split_check {
                let upper = word.trim().to_uppercase();
                if let Some(initialism) = self.initialisms.iter().find(|i| i.to_uppercase() == upper) {
                    out.push(Lexem::Initialism {
                        original: word.to_string(),
                        matched: initialism.clone(),
                    });
                    return;
                }
            }
            out.push(Lexem::Casual(word.to_string()));
        };

        for &c in chars {
            if let Some(replacement) = symbol_replacement(c) {
                if !current.is_empty() {
                    push(&current, out);
                    current.clear();
                }
                if !replacement.is_empty() {
                    push(replacement, out);
                }
                continue;
            }

            if !c.is_alphanumeric() {
                if !current.is_empty() {
                    push(&current, out);
                    current.clear();
                }
                continue;
            }

            if c.is_uppercase() && !current.is_empty() {
                push(&current, out);
                current.clear();
            }

            current.push(c);
        }

        if !current.is_empty() {
            push(&current, out);
        }
    }
}

fn symbol_replacement(c: char) -> Option<&'static str> {
    match c {
        '@' => Some("At"),
        '&' => Some("And"),
        '|' => Some("Pipe"),
        '$' => Some("Dollar"),
        '!' => Some("Bang"),
        '-' | '_' => Some(""),
        _ => None,
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn camelize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_go_name() {
        let naming = Naming::default();
        assert_eq!(naming.to_go_name("user_id"), "UserID");
        assert_eq!(naming.to_go_name("http_server"), "HTTPServer");
        assert_eq!(naming.to_go_name("HTTPServer"), "HTTPServer");
        assert_eq!(naming.to_go_name("foo-bar baz"), "FooBarBaz");
        assert_eq!(naming.to_go_name("123abc"), "X123abc");
        assert_eq!(naming.to_go_name(""), "");
    }

    #[test]
    fn test_to_go_name_custom_prefix() {
        let naming = Naming::default().with_prefix(|_| "N".to_string());
        assert_eq!(naming.to_go_name("123abc"), "N123abc");
    }

    #[test]
    fn test_custom_initialisms() {
        let naming = Naming::new(["ABC"]);
        assert_eq!(naming.to_go_name("abc_thing"), "ABCThing");
        assert_eq!(naming.to_go_name("user_id"), "UserId");
        assert!(naming.is_initialism("ABC"));
        assert!(!naming.is_initialism("ID"));
    }

    #[test]
    fn test_to_var_name() {
        let naming = Naming::default();
        assert_eq!(naming.to_var_name("user_id"), "userID");
        assert_eq!(naming.to_var_name("FooBar"), "fooBar");
        assert_eq!(naming.to_var_name("id"), "id");
        assert_eq!(naming.to_var_name("x"), "x");
    }

    #[test]
    fn test_to_file_and_command_name() {
        let naming = Naming::default();
        assert_eq!(naming.to_file_name("HTTPServer"), "http_server");
        assert_eq!(naming.to_file_name("userID"), "user_id");
        assert_eq!(naming.to_command_name("FooBarBaz"), "foo-bar-baz");
    }

    #[test]
    fn test_to_go_package_name() {
        let naming = Naming::default();
        assert_eq!(naming.to_go_package_name("my-service"), "myservice");
    }

    #[test]
    fn test_to_human_name_title() {
        let naming = Naming::default();
        assert_eq!(naming.to_human_name_title("fooBar"), "Foo Bar");
        assert_eq!(naming.to_human_name_title("some_HTTP_thing"), "Some HTTP Thing");
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("hELLO"), "Hello");
        assert_eq!(camelize(""), "");
    }
}
