use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Language codes understood by the Codequiry check engine.
///
/// The numeric values are owned by the remote service, they are not
/// contiguous and must not be derived.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, Hash, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum Language {
    Java = 13,
    Python = 14,
    C = 16,
    Cpp = 17,
    CSharp = 18,
    Perl = 20,
    Php = 21,
    Sql = 22,
    VisualBasic = 23,
    Xml = 24,
    Haskell = 28,
    Pascal = 29,
    Go = 30,
    Matlab = 31,
    Lisp = 32,
    Ruby = 33,
    Assembly = 34,
    HtmlJavaScript = 38,
    JavaScript = 39,
    Html = 40,
    TextByWord = 41,
    TextByCharacter = 42,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("{0} is not a known Codequiry language code")]
    UnknownCode(u8),
    #[error("'{0}' is not a known Codequiry language")]
    UnknownName(String),
}

impl Language {
    const ALL: [Self; 22] = [
        Self::Java,
        Self::Python,
        Self::C,
        Self::Cpp,
        Self::CSharp,
        Self::Perl,
        Self::Php,
        Self::Sql,
        Self::VisualBasic,
        Self::Xml,
        Self::Haskell,
        Self::Pascal,
        Self::Go,
        Self::Matlab,
        Self::Lisp,
        Self::Ruby,
        Self::Assembly,
        Self::HtmlJavaScript,
        Self::JavaScript,
        Self::Html,
        Self::TextByWord,
        Self::TextByCharacter,
    ];

    /// Every supported language, ordered by code.
    pub const fn all() -> &'static [Self] {
        &Self::ALL
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Java => "Java",
            Self::Python => "Python",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Perl => "Perl",
            Self::Php => "PHP",
            Self::Sql => "SQL",
            Self::VisualBasic => "VB",
            Self::Xml => "XML",
            Self::Haskell => "Haskell",
            Self::Pascal => "Pascal",
            Self::Go => "Go",
            Self::Matlab => "Matlab",
            Self::Lisp => "Lisp",
            Self::Ruby => "Ruby",
            Self::Assembly => "Assembly",
            Self::HtmlJavaScript => "HTML containing JavaScript",
            Self::JavaScript => "JavaScript",
            Self::Html => "HTML",
            Self::TextByWord => "Text by word",
            Self::TextByCharacter => "Text by character",
        }
    }
}

impl TryFrom<u8> for Language {
    type Error = LanguageError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == code)
            .ok_or(LanguageError::UnknownCode(code))
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    /// Accepts either the numeric code (`"14"`) or the display name,
    /// compared case-insensitively (`"python"`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::try_from(code);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LanguageError::UnknownName(raw.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Language code sent with `check/create`.
///
/// Wraps either a known [`Language`] or a raw integer, since the remote
/// service may accept codes this crate doesn't know about yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LanguageCode(u8);

impl LanguageCode {
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<Language> for LanguageCode {
    fn from(lang: Language) -> Self {
        Self(lang.code())
    }
}

impl From<u8> for LanguageCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(Language::Java.code(), 13);
        assert_eq!(Language::Python.code(), 14);
        assert_eq!(Language::C.code(), 16);
        assert_eq!(Language::HtmlJavaScript.code(), 38);
        assert_eq!(Language::TextByCharacter.code(), 42);
    }

    #[test]
    fn test_all_sorted_and_unique() {
        let codes: Vec<u8> = Language::all().iter().map(|l| l.code()).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(codes, sorted);
        assert_eq!(codes.len(), 22);
    }

    #[test]
    fn test_try_from_code() {
        assert_eq!(Language::try_from(30), Ok(Language::Go));
        assert_eq!(Language::try_from(15), Err(LanguageError::UnknownCode(15)));
    }

    #[test]
    fn test_from_str_by_code_and_name() {
        assert_eq!("14".parse::<Language>(), Ok(Language::Python));
        assert_eq!("c++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!(
            " Text by word ".parse::<Language>(),
            Ok(Language::TextByWord)
        );
        assert_eq!(
            "Brainfuck".parse::<Language>(),
            Err(LanguageError::UnknownName("Brainfuck".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_integer_code() {
        let json = serde_json::to_string(&Language::Php).unwrap();
        assert_eq!(json, "21");
        let parsed: Language = serde_json::from_str("33").unwrap();
        assert_eq!(parsed, Language::Ruby);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Language::CSharp), "C#");
        assert_eq!(format!("{}", LanguageCode::from(99)), "99");
        assert_eq!(LanguageCode::from(Language::Go).get(), 30);
    }

    #[test]
    fn test_error_display() {
        let error = LanguageError::UnknownCode(1);
        assert_eq!(format!("{error}"), "1 is not a known Codequiry language code");
    }
}
