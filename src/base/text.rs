//! Name and type-text utilities.
//!
//! Qualified names use `::` as the internal separator regardless of source
//! language; conversion to the language-specific separator happens only at
//! the rendering boundary. Template-specifier spans (`<...>`) are treated
//! as opaque while splitting names, so `A<B::C>::D` has exactly two scope
//! fragments.

use std::fmt::Write as _;

use unicode_ident::{is_xid_continue, is_xid_start};

/// Whether `c` can start an identifier.
pub fn is_id_start(c: char) -> bool {
    c == '_' || is_xid_start(c) || (c as u32) >= 0x80
}

/// Whether `c` can continue an identifier.
pub fn is_id_char(c: char) -> bool {
    c == '_' || is_xid_continue(c) || (c as u32) >= 0x80
}

// ============================================================================
// SCOPE FRAGMENTS
// ============================================================================

/// Iterator over the `::`-separated fragments of a qualified name,
/// skipping template-specifier spans.
pub struct ScopeFragments<'a> {
    s: &'a str,
    pos: usize,
}

/// Split a qualified name into scope fragments.
///
/// `"A<B::C>::D"` yields `["A<B::C>", "D"]`; leading separators are skipped.
pub fn scope_fragments(s: &str) -> ScopeFragments<'_> {
    ScopeFragments { s, pos: 0 }
}

impl<'a> Iterator for ScopeFragments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.s.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos] == b':' {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b':' if depth == 0 => break,
                b'<' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'>' => {
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Some(&self.s[start..self.pos])
    }
}

/// Byte offset of the last `::` that separates an explicit scope qualifier
/// from the trailing name, ignoring any `::` inside or after a template
/// specifier. `None` when the name is unqualified.
pub fn compute_qualified_index(name: &str) -> Option<usize> {
    let limit = name.find('<').unwrap_or(name.len());
    name[..limit].rfind("::")
}

/// Split a name into `(explicit scope qualifier, trailing name)`.
pub fn split_qualifier(name: &str) -> (Option<&str>, &str) {
    match compute_qualified_index(name) {
        Some(i) => (Some(&name[..i]), &name[i + 2..]),
        None => (None, name),
    }
}

/// The last scope fragment of a name, template-aware.
///
/// `"A::B<C::D>::E"` gives `"E"`, `"A"` gives `"A"`.
pub fn strip_scope(name: &str) -> &str {
    let bytes = name.as_bytes();
    let mut depth = 0i32;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'>' => depth += 1,
            b'<' => depth -= 1,
            b':' if depth == 0 && i > 0 && bytes[i - 1] == b':' => {
                return &name[i + 1..];
            }
            _ => {}
        }
    }
    name
}

/// `scope` starts with `name` on a fragment boundary.
pub fn left_scope_match(scope: &str, name: &str) -> bool {
    scope.starts_with(name)
        && (scope.len() == name.len() || scope[name.len()..].starts_with("::"))
}

/// `scope` ends with `name` on a fragment boundary.
pub fn right_scope_match(scope: &str, name: &str) -> bool {
    scope.ends_with(name)
        && (scope.len() == name.len() || scope[..scope.len() - name.len()].ends_with("::"))
}

// ============================================================================
// TEMPLATE SPANS
// ============================================================================

/// Byte offset one past the `>` matching the `<` at `open`, shift-token
/// aware (`<<` and `>>` do not change nesting).
pub fn template_span_end(s: &str, open: usize) -> usize {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes[open], b'<');
    let mut i = open + 1;
    let mut depth = 1usize;
    while i < bytes.len() && depth > 0 {
        match bytes[i] {
            b'<' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'<' {
                    i += 1;
                } else {
                    depth += 1;
                }
            }
            b'>' => {
                // ">>" closes two levels at once when nested deep enough,
                // otherwise it would be a shift token
                if i + 1 < bytes.len() && bytes[i + 1] == b'>' && depth >= 2 {
                    i += 1;
                    depth -= 2;
                } else {
                    depth -= 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// Split a trailing balanced `<...>` span off a name.
///
/// `"A<int>"` gives `("A", Some("<int>"))`; a `<` that does not close at the
/// end of the string is left in place.
pub fn split_template_suffix(name: &str) -> (&str, Option<&str>) {
    let trimmed = name.trim_end();
    if !trimmed.ends_with('>') {
        return (name, None);
    }
    if let Some(open) = trimmed.find('<') {
        if template_span_end(trimmed, open) == trimmed.len() {
            return (trimmed[..open].trim_end(), Some(&trimmed[open..]));
        }
    }
    (name, None)
}

// ============================================================================
// TYPE-TEXT SCANNING
// ============================================================================

/// One identifier-like token inside a type string, with any directly
/// attached template specifier.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeToken<'a> {
    /// Byte offset of the token in the scanned text.
    pub start: usize,
    /// The (possibly scope-qualified) identifier, e.g. `A::B`.
    pub word: &'a str,
    /// The balanced `<...>` span following the word, if any.
    pub template_spec: Option<&'a str>,
    /// Byte offset to continue scanning from.
    pub next: usize,
}

/// Find the next identifier-like token in `type_text` starting at `pos`.
///
/// Words may span scope separators (`A::B` is one token); a template
/// specifier directly following the word (ignoring spaces) is captured
/// separately.
pub fn next_type_identifier(type_text: &str, pos: usize) -> Option<TypeToken<'_>> {
    let mut start = None;
    let mut prev_id = false;
    for (off, c) in type_text[pos..].char_indices() {
        // a digit right after another word ("1x" in "Foo 1x") never starts one
        if is_id_start(c) && !prev_id {
            start = Some(pos + off);
            break;
        }
        prev_id = is_id_char(c);
    }
    let start = start?;

    let mut end = start;
    for (off, c) in type_text[start..].char_indices() {
        if !(is_id_char(c) || c == ':') {
            break;
        }
        end = start + off + c.len_utf8();
    }
    // do not capture a dangling separator
    let word_end = {
        let bytes = type_text.as_bytes();
        let mut e = end;
        while e > start && bytes[e - 1] == b':' {
            e -= 1;
        }
        e
    };

    let mut ts = end;
    let bytes = type_text.as_bytes();
    while ts < bytes.len() && bytes[ts] == b' ' {
        ts += 1;
    }
    if ts < bytes.len() && bytes[ts] == b'<' {
        let te = template_span_end(type_text, ts);
        return Some(TypeToken {
            start,
            word: &type_text[start..word_end],
            template_spec: Some(&type_text[ts..te]),
            next: te,
        });
    }
    Some(TypeToken {
        start,
        word: &type_text[start..word_end],
        template_spec: None,
        next: end,
    })
}

/// Find the next plain identifier (no scope separators) in `s` at or after
/// `pos`, returning its byte span.
pub fn next_identifier(s: &str, pos: usize) -> Option<(usize, usize)> {
    let mut start = None;
    let mut prev_id = false;
    for (off, c) in s[pos..].char_indices() {
        if is_id_start(c) && !prev_id {
            start = Some(pos + off);
            break;
        }
        prev_id = is_id_char(c);
    }
    let start = start?;
    let mut end = start;
    for (off, c) in s[start..].char_indices() {
        if !is_id_char(c) {
            break;
        }
        end = start + off + c.len_utf8();
    }
    Some((start, end))
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Strip a literal prefix, typically a declaration keyword with its
/// trailing space (`"const "`, `"struct "`).
pub fn strip_keyword_prefix<'a>(s: &'a str, prefix: &str) -> &'a str {
    s.strip_prefix(prefix).unwrap_or(s)
}

/// Collapse whitespace in a type string to the minimum that keeps tokens
/// apart: a space survives only between two word characters, or between
/// two `>` closing nested template specifiers.
///
/// This covers the comparison half of type-text normalization; prettifying
/// spacing for output is a renderer concern.
pub fn normalize_type_spacing(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_whitespace() {
            out.push(c);
            continue;
        }
        while chars.peek().is_some_and(|n| n.is_whitespace()) {
            chars.next();
        }
        let prev = out.chars().last();
        let next = chars.peek().copied();
        let keep = match (prev, next) {
            (Some(p), Some(n)) => {
                (is_id_char(p) && is_id_char(n)) || (p == '>' && n == '>')
            }
            _ => false,
        };
        if keep {
            out.push(' ');
        }
    }
    out
}

/// Remove `const`, `volatile` and `final` keywords where they do not
/// distinguish the type.
///
/// `const T param` → `T param` (not relevant), while `const T*` keeps its
/// qualifier (it is part of the pointee type) and is hoisted to the front:
///
/// ```
/// use crossdoc::base::text::strip_irrelevant_qualifiers;
/// assert_eq!(strip_irrelevant_qualifiers("const int"), "int");
/// assert_eq!(strip_irrelevant_qualifiers("int * const"), "int *");
/// assert_eq!(strip_irrelevant_qualifiers("const int *"), "const int *");
/// ```
pub fn strip_irrelevant_qualifiers(s: &str) -> String {
    let mut t = s.to_string();
    for word in ["const", "volatile", "final"] {
        strip_irrelevant_keyword(&mut t, word);
    }
    t
}

fn strip_irrelevant_keyword(target: &mut String, word: &str) {
    if target == word {
        target.clear();
        return;
    }
    let l = word.len();
    let mut p = 0usize;
    while let Some(rel) = target[p..].find(word) {
        let i = p + rel;
        let before_ok = i == 0 || !target[..i].chars().next_back().is_some_and(is_id_char);
        let after_ok =
            i + l == target.len() || !target[i + l..].chars().next().is_some_and(is_id_char);
        if before_ok && after_ok {
            let rest = &target[i + l..];
            if rest.contains('*') || rest.contains('&') {
                // qualifier applies before a pointer or reference: it is
                // significant, hoist it to the front once
                target.replace_range(i..i + l, "");
                let mut hoisted = String::with_capacity(target.len() + l + 1);
                let _ = write!(hoisted, "{word} {}", target.trim_start());
                *target = hoisted;
                p = i + l + 1;
            } else {
                target.replace_range(i..i + l, "");
                p = i;
            }
        } else {
            p = i + l;
        }
        if p >= target.len() {
            break;
        }
    }
    let trimmed = target.trim();
    if trimmed.len() != target.len() {
        *target = trimmed.to_string();
    }
}

/// Byte offset of the `(` opening a trailing parameter list, if any.
///
/// Operator names are part of the member name: `operator()(int)` has its
/// parameter list at the second `(`, `operator<<(int)` right after the
/// symbol run.
pub fn find_parameter_list(name: &str) -> Option<usize> {
    let search_from = match name.rfind("operator") {
        Some(op) => {
            let bytes = name.as_bytes();
            let mut i = op + "operator".len();
            while i < bytes.len()
                && matches!(
                    bytes[i],
                    b' ' | b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'&' | b'|' | b'~' | b'!'
                        | b'=' | b'<' | b'>' | b','
                )
            {
                i += 1;
            }
            if name[i..].starts_with("()") || name[i..].starts_with("[]") {
                i += 2;
            }
            i
        }
        None => 0,
    };
    name[search_from..].find('(').map(|i| search_from + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_scope_fragments_plain() {
        let parts: Vec<_> = scope_fragments("A::B::C").collect();
        assert_eq!(parts, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_scope_fragments_template() {
        let parts: Vec<_> = scope_fragments("A<B::C>::D").collect();
        assert_eq!(parts, vec!["A<B::C>", "D"]);
    }

    #[test]
    fn test_scope_fragments_leading_separator() {
        let parts: Vec<_> = scope_fragments("::A::B").collect();
        assert_eq!(parts, vec!["A", "B"]);
    }

    #[rstest]
    #[case("A::B", Some(1))]
    #[case("A", None)]
    #[case("A::B<C::D>", Some(1))]
    #[case("N::A::B", Some(4))]
    fn test_compute_qualified_index(#[case] name: &str, #[case] expected: Option<usize>) {
        assert_eq!(compute_qualified_index(name), expected);
    }

    #[test]
    fn test_split_qualifier() {
        assert_eq!(split_qualifier("N::M::x"), (Some("N::M"), "x"));
        assert_eq!(split_qualifier("x"), (None, "x"));
    }

    #[test]
    fn test_strip_scope() {
        assert_eq!(strip_scope("A::B<C::D>::E"), "E");
        assert_eq!(strip_scope("A"), "A");
        assert_eq!(strip_scope("A<X>::B"), "B");
    }

    #[test]
    fn test_scope_matches() {
        assert!(left_scope_match("A::B::C", "A::B"));
        assert!(!left_scope_match("AB::C", "A"));
        assert!(right_scope_match("A::B::C", "B::C"));
        assert!(!right_scope_match("A::BC", "C"));
    }

    #[test]
    fn test_split_template_suffix() {
        assert_eq!(split_template_suffix("A<int>"), ("A", Some("<int>")));
        assert_eq!(split_template_suffix("A"), ("A", None));
        assert_eq!(
            split_template_suffix("Map<K, V<int>>"),
            ("Map", Some("<K, V<int>>"))
        );
    }

    #[test]
    fn test_next_type_identifier() {
        let tok = next_type_identifier("const A<T>*", 0).unwrap();
        assert_eq!(tok.word, "const");
        let tok = next_type_identifier("const A<T>*", tok.next).unwrap();
        assert_eq!(tok.word, "A");
        assert_eq!(tok.template_spec, Some("<T>"));
        assert!(next_type_identifier("const A<T>*", tok.next).is_none());
    }

    #[test]
    fn test_next_type_identifier_scoped() {
        let tok = next_type_identifier("N::A x", 0).unwrap();
        assert_eq!(tok.word, "N::A");
        let tok = next_type_identifier("N::A x", tok.next).unwrap();
        assert_eq!(tok.word, "x");
    }

    #[rstest]
    #[case("const  T  &", "const T&")]
    #[case("A < int >", "A<int>")]
    #[case("unsigned   long  int", "unsigned long int")]
    #[case("vector<vector<int> >", "vector<vector<int> >")]
    fn test_normalize_type_spacing(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_type_spacing(input), expected);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_type_spacing("const  A < B ,C >  *");
        assert_eq!(normalize_type_spacing(&once), once);
    }

    #[test]
    fn test_strip_irrelevant_qualifiers() {
        assert_eq!(strip_irrelevant_qualifiers("const"), "");
        assert_eq!(strip_irrelevant_qualifiers("const T"), "T");
        assert_eq!(strip_irrelevant_qualifiers("const T*"), "const T*");
    }

    #[test]
    fn test_find_parameter_list() {
        assert_eq!(find_parameter_list("f(int)"), Some(1));
        assert_eq!(find_parameter_list("operator()(int)"), Some(10));
        assert_eq!(find_parameter_list("operator<<(int)"), Some(10));
        assert_eq!(find_parameter_list("f"), None);
    }
}
