//! Slug derivation for display names.
//!
//! Names are lowercased and then normalized through [`SLUG_RULES`] in a single
//! pass. Characters not covered by a rule are kept as-is, so CJK titles
//! survive intact.

/// What happens to a character matched by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Character is removed.
    Drop,
    /// Character becomes a word separator (`-`). Runs collapse to one.
    Separator,
}

/// Character classes recognized by the slug table.
#[derive(Debug, Clone, Copy)]
pub enum CharClass {
    /// Any of the listed characters.
    OneOf(&'static [char]),
    /// Any Unicode whitespace.
    Whitespace,
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        match self {
            CharClass::OneOf(chars) => chars.contains(&c),
            CharClass::Whitespace => c.is_whitespace(),
        }
    }
}

pub const SEPARATOR: char = '-';

/// Normalization table, checked in order.
pub const SLUG_RULES: &[(CharClass, Replacement)] = &[
    (
        CharClass::OneOf(&[
            ',', ':', '\'', '\u{2019}', '"', '!', '?', '.', '(', ')', '\u{2122}', '\u{00AE}',
            '\u{00A9}',
        ]),
        Replacement::Drop,
    ),
    (CharClass::Whitespace, Replacement::Separator),
    (
        CharClass::OneOf(&['/', '\\', '_', '&', SEPARATOR]),
        Replacement::Separator,
    ),
];

fn classify(c: char) -> Option<Replacement> {
    SLUG_RULES
        .iter()
        .find(|(class, _)| class.contains(c))
        .map(|(_, replacement)| *replacement)
}

/// Derives a URL-safe slug from a display name.
///
/// `slugify(&slugify(name)) == slugify(name)` for every input.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        match classify(c) {
            Some(Replacement::Drop) => {}
            Some(Replacement::Separator) => pending_separator = true,
            None => {
                if pending_separator && !slug.is_empty() {
                    slug.push(SEPARATOR);
                }
                pending_separator = false;
                slug.push(c);
            }
        }
    }

    slug
}
