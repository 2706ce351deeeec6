//! Path-prefix rewriting.
//!
//! A vpath rule is a directory prefix. When a recorded path starts with a
//! rule followed by a directory separator, the prefix and separator are
//! stripped so dependency lists stay relative to the source tree. Leading
//! `./` segments are removed from every path, rewritten or not.

/// Returns `true` for the host's directory separators.
fn is_dir_separator(c: u8) -> bool {
    c == b'/' || (cfg!(windows) && c == b'\\')
}

/// Ordered set of vpath prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VpathTable {
    rules: Vec<String>,
}

impl VpathTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every prefix in a `:`-separated spec.
    ///
    /// Empty segments (`a::b`, a trailing `:`) are ignored.
    pub fn add_spec(&mut self, spec: &str) {
        self.rules.extend(
            spec.split(':')
                .filter(|elem| !elem.is_empty())
                .map(str::to_string),
        );
    }

    /// Registered prefixes in registration order.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite a path through the table.
    ///
    /// Rules are tried newest first. A rule applies only when its prefix is
    /// followed by a separator that is not itself followed by `../`; the
    /// first applicable rule wins.
    pub fn apply<'a>(&self, path: &'a str) -> &'a str {
        let mut t = path;
        for rule in self.rules.iter().rev() {
            let Some(rest) = t.strip_prefix(rule.as_str()) else {
                continue;
            };
            let bytes = rest.as_bytes();
            if !bytes.first().copied().is_some_and(is_dir_separator) {
                continue;
            }
            // $(vpath)/../whatever stays as written.
            if bytes.len() > 3
                && bytes[1] == b'.'
                && bytes[2] == b'.'
                && is_dir_separator(bytes[3])
            {
                continue;
            }
            t = &rest[1..];
            break;
        }
        strip_leading_dot_slash(t)
    }
}

/// Remove leading `./` segments along with any separators that follow them.
fn strip_leading_dot_slash(mut t: &str) -> &str {
    loop {
        let bytes = t.as_bytes();
        if bytes.len() < 2 || bytes[0] != b'.' || !is_dir_separator(bytes[1]) {
            return t;
        }
        t = &t[2..];
        let skip = t.bytes().take_while(|&c| is_dir_separator(c)).count();
        t = &t[skip..];
    }
}
