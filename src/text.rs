//! Text Normalizer - shortening and soft line-break hints
//!
//! The layout code in [`crate::font`] only wraps at whitespace and
//! zero-width spaces, so break opportunities inside words are inserted here.

/// Zero-width break opportunity.
pub const ZWSP: char = '\u{200B}';
/// Narrower than a regular space, wider than U+200A which looks too tight.
pub const THIN_SPACE: char = '\u{2009}';
/// Replaces `'`: keeps the tick without horizontal advance.
pub const APOSTROPHE: char = '\u{0301}';

/// Text longer than this gets break hints, starting after this many chars.
pub const BREAK_THRESHOLD: usize = 4;

const FILLER_PREFIXES: [&str; 4] = ["A", "a", "The", "pair of"];
/// Compared after uppercasing, so lowercase vowels block a break as well.
const VOWELS: [char; 6] = ['A', 'E', 'I', 'O', 'U', 'Y'];

/// Full normalization: shorten, then add break hints to long text.
pub fn normalize(raw: &str) -> String {
    normalize_with_start(raw, BREAK_THRESHOLD)
}

/// Same as [`normalize`] with a configurable break start index.
pub fn normalize_with_start(raw: &str, start: usize) -> String {
    let text = shorten(raw);
    if text.chars().count() > start {
        insert_breaks(&text, start)
    } else {
        text
    }
}

/// Strip uninformative prefixes and state suffixes, escape `&`.
pub fn shorten(raw: &str) -> String {
    let text = strip_filler_prefix(raw);
    let text = strip_state_suffix(text);
    text.replace('&', "|")
}

fn strip_filler_prefix(text: &str) -> &str {
    for prefix in FILLER_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if chars.next().is_some_and(char::is_whitespace) {
                return chars.as_str();
            }
        }
    }
    text
}

/// Removes `(x)` at the very end, where `x` is any single char but `(`.
fn strip_state_suffix(text: &str) -> &str {
    let Some(body) = text.strip_suffix(')') else {
        return text;
    };
    let mut chars = body.chars();
    match (chars.next_back(), chars.next_back()) {
        (Some(state), Some('(')) if state != '(' => chars.as_str(),
        _ => text,
    }
}

/// Copies `text` up to `start` chars, then inserts [`ZWSP`] where a word may
/// be broken and swaps spaces and apostrophes for thinner equivalents.
pub fn insert_breaks(text: &str, start: usize) -> String {
    let mut result: String = text.chars().take(start).collect();
    let rest: Vec<char> = text.chars().skip(start).collect();

    for (prev, current, next1, next2) in context_window(&rest) {
        match current {
            ' ' => result.push(THIN_SPACE),
            '\'' => result.push(APOSTROPHE),
            c if is_upper_invariant(c) || prev == Some(' ') => result.push(c),
            c => {
                result.push(c);
                if !no_break_before(next1) && !no_break_before(next2) {
                    result.push(ZWSP);
                }
            }
        }
    }

    result
}

/// (previous, current, next, after-next) for every char; `None` past the ends.
fn context_window(chars: &[char]) -> impl Iterator<Item = (Option<char>, char, Option<char>, Option<char>)> + '_ {
    chars.iter().enumerate().map(move |(i, &c)| {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        (prev, c, chars.get(i + 1).copied(), chars.get(i + 2).copied())
    })
}

/// True for uppercase letters and for chars without case (digits, punctuation).
fn is_upper_invariant(c: char) -> bool {
    let mut upper = c.to_uppercase();
    upper.next() == Some(c) && upper.next().is_none()
}

fn no_break_before(c: Option<char>) -> bool {
    match c {
        None | Some(' ') => true,
        Some(c) => VOWELS.contains(&c.to_ascii_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_single_filler_prefix() {
        assert_eq!(shorten("A rock"), "rock");
        assert_eq!(shorten("The The band"), "The band");
        assert_eq!(shorten("pair of boots"), "boots");
        assert_eq!(shorten("Apple"), "Apple");
    }

    #[test]
    fn test_strips_state_suffix() {
        assert_eq!(shorten("lamp(x)"), "lamp");
        assert_eq!(shorten("lamp (on)"), "lamp (on)");
        assert_eq!(shorten("odd(()"), "odd(()");
        assert_eq!(shorten("pair of socks(x)"), "socks");
        assert_eq!(shorten("(x)"), "");
    }

    #[test]
    fn test_replaces_ampersand() {
        assert_eq!(shorten("salt & pepper"), "salt | pepper");
    }

    #[test]
    fn test_short_text_has_no_breaks() {
        for name in ["", "a b", "dog", "Wolf", "A cat", "The rat(s)"] {
            let out = normalize(name);
            assert!(!out.contains(ZWSP), "{name:?} -> {out:?}");
            assert!(!out.contains(THIN_SPACE));
        }
    }

    #[test]
    fn test_break_inserted_between_consonants() {
        let out = insert_breaks("strength", 4);
        assert_eq!(out, "stren\u{200B}g\u{200B}th");
    }

    #[test]
    fn test_no_break_before_vowel_or_end() {
        assert_eq!(insert_breaks("Test Creature", 4), "Test\u{2009}Creature");
    }

    #[test]
    fn test_space_and_apostrophe_substitution() {
        let out = insert_breaks("Bob's hat", 3);
        assert_eq!(out, "Bob\u{0301}s\u{2009}hat");
    }

    #[test]
    fn test_first_remainder_char_has_no_previous() {
        // a space before the remainder does not count as the previous char
        let out = insert_breaks("ab xkcd", 3);
        assert_eq!(out, "ab x\u{200B}k\u{200B}cd");
    }

    #[test]
    fn test_no_break_after_word_start() {
        // `x` follows a space, so only `k` gets a break
        assert_eq!(insert_breaks("abcd xkcd", 4), "abcd\u{2009}xk\u{200B}cd");
    }

    #[test]
    fn test_no_break_after_uppercase_or_digit() {
        assert_eq!(insert_breaks("abcdBXkcd", 4), "abcdBXk\u{200B}cd");
        assert_eq!(insert_breaks("abcd12kcd", 4), "abcd12k\u{200B}cd");
    }

    #[test]
    fn test_lowercase_vowel_blocks_break() {
        assert_eq!(insert_breaks("abcdkakk", 4), "abcdka\u{200B}kk");
    }

    #[test]
    fn test_empty_remainder_is_noop() {
        assert_eq!(insert_breaks("abc", 4), "abc");
        assert_eq!(insert_breaks("", 0), "");
    }
}
