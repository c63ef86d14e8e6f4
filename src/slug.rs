//! URL slugs for entity titles.

const TRANSLITERATIONS: &[(&str, &[char])] = &[
    ("a", &['à', 'á', 'â', 'ã', 'å', 'À', 'Á', 'Â', 'Ã', 'Å']),
    ("ae", &['æ', 'Æ', 'ä', 'Ä']),
    ("and", &['&']),
    ("c", &['ç', 'Ç', '©']),
    ("d", &['∂']),
    ("e", &['è', 'é', 'ê', 'ë', 'È', 'É', 'Ê', 'Ë', '€']),
    ("i", &['ì', 'í', 'î', 'ï', 'Ì', 'Í', 'Î', 'Ï']),
    ("n", &['ñ', 'Ñ']),
    ("o", &['ò', 'ó', 'ô', 'õ', 'ø', 'Ò', 'Ó', 'Ô', 'Õ', 'Ø']),
    ("oe", &['œ', 'Œ', 'ö', 'Ö']),
    ("r", &['®']),
    ("s", &['$']),
    ("ss", &['ß']),
    ("u", &['ù', 'ú', 'û', 'µ', 'Ù', 'Ú', 'Û']),
    ("ue", &['ü', 'Ü']),
    ("y", &['ÿ', 'Ÿ', '¥']),
    ("tm", &['™']),
    ("pi", &['∏', 'π', 'Π']),
    (" ", &['\'', '`']),
];

fn transliterate(c: char) -> Option<&'static str> {
    TRANSLITERATIONS
        .iter()
        .find(|(_, sources)| sources.contains(&c))
        .map(|(output, _)| *output)
}

/// Lowercase ASCII slug of `input`, words joined by `separator`.
///
/// Accented letters are transliterated (`è` → `e`, `ß` → `ss`), `&` becomes `and`, every
/// other character outside `[a-z0-9]` splits words. Returns `None` when nothing is left.
///
/// ```
/// assert_eq!(crudkit::slug::slugify("Crème Brûlée & co.", "-").as_deref(), Some("creme-brulee-and-co"));
/// assert_eq!(crudkit::slug::slugify("test.dot", "-").as_deref(), Some("test-dot"));
/// assert_eq!(crudkit::slug::slugify("  ", "-"), None);
/// ```
#[must_use]
pub fn slugify(input: &str, separator: &str) -> Option<String> {
    let mut plain = String::with_capacity(input.len());
    for c in input.chars().filter(|c| *c != '\r' && *c != '\n') {
        match transliterate(c) {
            Some(replacement) => plain.push_str(replacement),
            None => plain.push(c),
        }
    }

    let words: Vec<String> = plain
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(separator))
    }
}
