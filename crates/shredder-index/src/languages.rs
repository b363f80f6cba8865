//! File classification and tree-sitter grammar registry.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Language with a structural front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Python,
}

impl Lang {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
        }
    }

    /// Language parsed for a normalized extension (`"py"`, not `".py"`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" | "pyw" => Some(Self::Python),
            _ => None,
        }
    }

    /// Get the tree-sitter grammar. Returns `None` if the
    /// corresponding feature is not enabled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// How a file is routed during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Structured(Lang),
    Opaque,
    /// Extension is on the denylist.
    Skipped,
}

pub const DEFAULT_STRUCTURED_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Binary and non-text formats never read.
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "pdf", "zip", "gz", "tar", "tgz", "xz",
    "bz2", "7z", "jar", "class", "bin", "exe", "dll", "so", "dylib", "o", "a", "pyc", "pyo",
    "whl", "mp3", "mp4", "wav", "woff", "woff2", "ttf", "otf", "sqlite", "db",
];

/// Extension rules, normalized to lowercase without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRules {
    structured: Vec<String>,
    ignored: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self::new(DEFAULT_STRUCTURED_EXTENSIONS, DEFAULT_IGNORED_EXTENSIONS)
    }
}

impl FileRules {
    #[must_use]
    pub fn new<S: AsRef<str>, I: AsRef<str>>(structured: &[S], ignored: &[I]) -> Self {
        Self {
            structured: structured.iter().map(|e| normalize_extension(e.as_ref())).collect(),
            ignored: ignored.iter().map(|e| normalize_extension(e.as_ref())).collect(),
        }
    }

    #[must_use]
    pub fn classify(&self, path: &Path) -> FileClass {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if ext.is_empty() {
            return FileClass::Opaque;
        }
        if self.ignored.contains(&ext) {
            FileClass::Skipped
        } else if let Some(lang) =
            Lang::from_extension(&ext).filter(|_| self.structured.contains(&ext))
        {
            FileClass::Structured(lang)
        } else {
            FileClass::Opaque
        }
    }
}

/// `".PY"` and `"py"` both become `"py"`.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_is_structured() {
        let rules = FileRules::default();
        assert_eq!(
            rules.classify(Path::new("src/app.py")),
            FileClass::Structured(Lang::Python)
        );
        assert_eq!(
            rules.classify(Path::new("stubs/app.PYI")),
            FileClass::Structured(Lang::Python)
        );
    }

    #[test]
    fn structured_extension_without_a_parser_stays_opaque() {
        let rules = FileRules::new(&["py", ".js"], &[] as &[&str]);
        assert_eq!(rules.classify(Path::new("app.js")), FileClass::Opaque);
        assert_eq!(
            rules.classify(Path::new("app.py")),
            FileClass::Structured(Lang::Python)
        );
    }

    #[test]
    fn from_extension_knows_python_only() {
        assert_eq!(Lang::from_extension("pyw"), Some(Lang::Python));
        assert_eq!(Lang::from_extension("js"), None);
        assert_eq!(Lang::from_extension(".py"), None);
    }

    #[test]
    fn text_and_extensionless_are_opaque() {
        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new("notes.txt")), FileClass::Opaque);
        assert_eq!(rules.classify(Path::new("Makefile")), FileClass::Opaque);
        assert_eq!(rules.classify(Path::new(".env")), FileClass::Opaque);
    }

    #[test]
    fn denylist_is_case_insensitive() {
        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new("logo.PNG")), FileClass::Skipped);
        assert_eq!(rules.classify(Path::new("Main.class")), FileClass::Skipped);
    }

    #[test]
    fn leading_dots_are_normalized() {
        let rules = FileRules::new(&[".py"], &[".TXT", "md"]);
        assert_eq!(rules.classify(Path::new("a.txt")), FileClass::Skipped);
        assert_eq!(rules.classify(Path::new("a.md")), FileClass::Skipped);
        assert_eq!(
            rules.classify(Path::new("a.py")),
            FileClass::Structured(Lang::Python)
        );
        assert_eq!(rules.classify(Path::new("a.pyi")), FileClass::Opaque);
    }

    #[test]
    fn denylist_wins_over_structured() {
        let rules = FileRules::new(&["py"], &["py"]);
        assert_eq!(rules.classify(Path::new("a.py")), FileClass::Skipped);
    }

    #[test]
    fn lang_display() {
        assert_eq!(Lang::Python.to_string(), "python");
        #[cfg(feature = "lang-python")]
        assert!(Lang::Python.grammar().is_some());
    }
}
