//! Source file records and language detection

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Languages the parser has a grammar for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
        }
    }

    /// Detect a language from a file path's extension.
    pub fn from_path(path: &str) -> Option<Language> {
        let ext = path.rsplit('.').next()?;
        match ext {
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "typescript" | "ts" => Ok(Language::TypeScript),
            "tsx" => Ok(Language::Tsx),
            "javascript" | "js" => Ok(Language::JavaScript),
            _ => Err(Error::InvalidValue(format!("Unknown language: {}", s))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One source file in a repository indexing run.
///
/// Path is unique within a repository. File rows are owned by the run that
/// created them and are replaced wholesale on re-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Repository identifier
    pub repository: String,
    /// Path relative to the repository root, forward slashes
    pub path: String,
    /// blake3 hash of the file content
    pub hash: String,
    /// Detected (or hinted) language; None for files we cannot parse
    pub language: Option<Language>,
}

impl SourceFile {
    /// Build a file record, hashing the content.
    pub fn new(repository: impl Into<String>, path: impl Into<String>, content: &str) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            repository: repository.into(),
            hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
            path,
            language,
        }
    }

    /// Override the detected language with an explicit hint.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path("src/app.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("src/App.tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_path("lib/util.mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("README.md"), None);
    }

    #[test]
    fn test_language_roundtrip() {
        for lang in [Language::TypeScript, Language::Tsx, Language::JavaScript] {
            let parsed: Language = lang.as_str().parse().unwrap();
            assert_eq!(lang, parsed);
        }
    }

    #[test]
    fn test_file_hashing_is_stable() {
        let a = SourceFile::new("repo", "src/a.ts", "export const x = 1;");
        let b = SourceFile::new("repo", "src/a.ts", "export const x = 1;");
        assert_eq!(a.hash, b.hash);

        let c = SourceFile::new("repo", "src/a.ts", "export const x = 2;");
        assert_ne!(a.hash, c.hash);
    }
}
