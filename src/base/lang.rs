//! Source-language tags.

use std::fmt;

/// The input language an entity was declared in.
///
/// The resolver is language-approximate, not language-exact: the tag only
/// influences the scope separator used in rendered names, the transitive
/// using-namespace walk (C++ only) and a handful of lookup fallbacks
/// (Objective-C protocol suffixes, PHP separator normalization).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SrcLang {
    #[default]
    Cpp,
    Java,
    CSharp,
    Python,
    Php,
    ObjC,
    D,
    Fortran,
    Tcl,
    Idl,
    JavaScript,
    Unknown,
}

impl SrcLang {
    /// The scope separator used when rendering qualified names in this
    /// language. Internally all qualified names use `::`.
    pub fn separator(self) -> &'static str {
        match self {
            SrcLang::Java | SrcLang::CSharp | SrcLang::Python | SrcLang::JavaScript => ".",
            SrcLang::Php => "\\",
            _ => "::",
        }
    }
}

impl fmt::Display for SrcLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SrcLang::Cpp => "C++",
            SrcLang::Java => "Java",
            SrcLang::CSharp => "C#",
            SrcLang::Python => "Python",
            SrcLang::Php => "PHP",
            SrcLang::ObjC => "Objective-C",
            SrcLang::D => "D",
            SrcLang::Fortran => "Fortran",
            SrcLang::Tcl => "Tcl",
            SrcLang::Idl => "IDL",
            SrcLang::JavaScript => "JavaScript",
            SrcLang::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        assert_eq!(SrcLang::Cpp.separator(), "::");
        assert_eq!(SrcLang::Java.separator(), ".");
        assert_eq!(SrcLang::Php.separator(), "\\");
    }
}
