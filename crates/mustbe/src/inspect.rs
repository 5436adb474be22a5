//! Debug representations and length-bounded "short inspect".
//!
//! Notes embed the receiver, the arguments and sometimes a whole container in
//! their message. `short_inspect` keeps those readable by cutting the middle
//! out of long representations, preferring to cut at word boundaries.

pub const SHORT_INSPECT_CUTOFF_LENGTH: usize = 200;
pub const SHORT_INSPECT_WORD_BREAK_LENGTH: usize = 20;
pub const SHORT_INSPECT_ELLIPSES: &str = "...";

/// Debug representation used in note messages.
pub trait Inspect {
    fn inspect(&self) -> String;
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn inspect(&self) -> String {
        (**self).inspect()
    }
}

/// Inspect `value` and shorten the result to at most
/// [`SHORT_INSPECT_CUTOFF_LENGTH`] characters.
pub fn short_inspect<T: Inspect + ?Sized>(value: &T) -> String {
    shorten(value.inspect())
}

/// Shorten an already rendered representation.
///
/// Strings at or under the cutoff are returned unchanged. Longer ones keep a
/// head and a tail joined by the ellipsis; each cut point moves to a nearby
/// word boundary when one exists within the word-break window.
pub fn shorten(s: String) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= SHORT_INSPECT_CUTOFF_LENGTH {
        return s;
    }

    let real_cutoff = SHORT_INSPECT_CUTOFF_LENGTH - SHORT_INSPECT_ELLIPSES.len();
    let left_side = real_cutoff.div_ceil(2);
    let right_side = chars.len() - real_cutoff / 2;

    let left_start = left_side - SHORT_INSPECT_WORD_BREAK_LENGTH;
    let start = last_word_break(&chars[left_start..left_side])
        .map_or(left_side, |i| left_start + i + 1);

    let right_end = (right_side + SHORT_INSPECT_WORD_BREAK_LENGTH).min(chars.len());
    let stop = first_word_break(&chars[right_side..right_end]).map_or(right_side, |i| right_side + i);

    let mut out: String = chars[..start].iter().collect();
    out.push_str(SHORT_INSPECT_ELLIPSES);
    out.extend(&chars[stop..]);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Last whitespace that directly follows a word character.
fn last_word_break(area: &[char]) -> Option<usize> {
    (1..area.len())
        .rev()
        .find(|&i| area[i].is_whitespace() && is_word_char(area[i - 1]))
}

/// First whitespace that is directly followed by a word character.
fn first_word_break(area: &[char]) -> Option<usize> {
    (0..area.len().saturating_sub(1))
        .find(|&i| area[i].is_whitespace() && is_word_char(area[i + 1]))
}
