use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Letters NFKD leaves alone but which have an obvious ASCII spelling
fn ascii_spelling(c: char) -> Option<&'static str> {
    match c {
        'ß' => Some("ss"),
        'æ' | 'Æ' => Some("ae"),
        'œ' | 'Œ' => Some("oe"),
        'ø' | 'Ø' => Some("o"),
        'ł' | 'Ł' => Some("l"),
        'đ' | 'Đ' => Some("d"),
        'þ' | 'Þ' => Some("th"),
        _ => None,
    }
}

fn push_word_char(slug: &mut String, c: char, pending_dash: &mut bool) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push(c);
}

/// Lowercase ASCII rendering of `text`, words joined by single dashes.
///
/// Accents are folded, anything else outside `[a-z0-9]` separates words
/// and characters with no ASCII spelling are dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            push_word_char(&mut slug, c.to_ascii_lowercase(), &mut pending_dash);
        } else if c == '&' {
            pending_dash = true;
            for s in "and".chars() {
                push_word_char(&mut slug, s, &mut pending_dash);
            }
            pending_dash = true;
        } else if let Some(spelling) = ascii_spelling(c) {
            for s in spelling.chars() {
                push_word_char(&mut slug, s, &mut pending_dash);
            }
        } else if !c.is_alphanumeric() {
            pending_dash = true;
        }
    }

    slug
}
