//! Placeholder vault: shields literal regions (code) from markup transforms.
//!
//! Extracted fragments live in a dense arena. The working text references
//! them by index, wrapped in a private-use marker codepoint that is chosen so
//! it does not occur anywhere in the text being processed. No transform in the
//! pipeline touches digits or private-use codepoints, so a token survives every
//! pass unchanged and restoration is a single linear scan.

use std::collections::HashSet;

use regex::{Captures, Regex};

/// Arena of protected fragments for one extraction pass.
#[derive(Debug, Clone)]
pub struct Vault {
    mark: char,
    fragments: Vec<String>,
}

impl Vault {
    /// Replace every match of `pattern` with a token and remember the match.
    pub fn extract(text: &str, pattern: &Regex) -> (String, Vault) {
        let mark = pick_mark(text);
        let mut fragments = Vec::new();

        let replaced = pattern
            .replace_all(text, |caps: &Captures| {
                let index = fragments.len();
                fragments.push(caps[0].to_string());
                format!("{mark}{index}{mark}")
            })
            .into_owned();

        (replaced, Vault { mark, fragments })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Put the original fragments back, verbatim.
    pub fn restore(&self, text: &str) -> String {
        self.restore_with(text, str::to_string)
    }

    /// Put the fragments back, passing each through `render` first.
    ///
    /// Marker sequences that do not name a fragment of this vault are left
    /// as they are.
    pub fn restore_with<F>(&self, text: &str, render: F) -> String
    where
        F: Fn(&str) -> String,
    {
        if self.fragments.is_empty() {
            return text.to_string();
        }

        let mark_len = self.mark.len_utf8();
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(self.mark) {
            out.push_str(&rest[..start]);
            let after = &rest[start + mark_len..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();

            let fragment = if digits > 0 && after[digits..].starts_with(self.mark) {
                after[..digits]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.fragments.get(index))
            } else {
                None
            };

            match fragment {
                Some(original) => {
                    out.push_str(&render(original));
                    rest = &after[digits + mark_len..];
                }
                None => {
                    out.push(self.mark);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// First private-use codepoint that does not appear in `text`.
fn pick_mark(text: &str) -> char {
    let present: HashSet<char> = text
        .chars()
        .filter(|c| is_private_use(*c))
        .collect();

    ('\u{E000}'..='\u{F8FF}')
        .chain('\u{F0000}'..='\u{FFFFD}')
        .chain('\u{100000}'..='\u{10FFFD}')
        .find(|c| !present.contains(c))
        // Unreachable: no message holds all ~137k private-use codepoints.
        .unwrap_or('\u{E000}')
}

pub(crate) fn is_private_use(c: char) -> bool {
    matches!(c, '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{FFFFD}' | '\u{100000}'..='\u{10FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_code() -> Regex {
        Regex::new(r"`[^`\n]+`").unwrap()
    }

    #[test]
    fn extract_replaces_each_match() {
        let (text, vault) = Vault::extract("a `x` b `y` c", &inline_code());
        assert_eq!(vault.len(), 2);
        assert!(!text.contains('`'));
        assert!(text.starts_with("a "));
        assert!(text.ends_with(" c"));
    }

    #[test]
    fn restore_is_inverse_of_extract() {
        let source = "run `cargo test` then `cargo run`";
        let (text, vault) = Vault::extract(source, &inline_code());
        assert_eq!(vault.restore(&text), source);
    }

    #[test]
    fn restore_with_renders_fragments() {
        let (text, vault) = Vault::extract("use `a<b`", &inline_code());
        let restored = vault.restore_with(&text, |frag| format!("[{}]", frag.trim_matches('`')));
        assert_eq!(restored, "use [a<b]");
    }

    #[test]
    fn marker_never_collides_with_input() {
        let source = "\u{E000}0\u{E000} literal and `code`";
        let (text, vault) = Vault::extract(source, &inline_code());
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.restore(&text), source);
        assert_eq!(
            vault.restore_with(&text, |_| "X".into()),
            "\u{E000}0\u{E000} literal and X"
        );
    }

    #[test]
    fn nested_vaults_restore_in_reverse_order() {
        let fences = Regex::new(r"(?s)```.*?```").unwrap();
        let source = "```\nlet `a` = 1;\n```\nand `b`";
        let (step1, outer) = Vault::extract(source, &fences);
        let (step2, inner) = Vault::extract(&step1, &inline_code());
        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);

        let back = outer.restore(&inner.restore(&step2));
        assert_eq!(back, source);
    }

    #[test]
    fn unknown_index_is_left_verbatim() {
        let (_, vault) = Vault::extract("`only`", &inline_code());
        let stray = format!("{m}7{m}", m = vault.mark);
        assert_eq!(vault.restore(&stray), stray);
    }

    #[test]
    fn empty_vault_passes_text_through() {
        let (text, vault) = Vault::extract("nothing here", &inline_code());
        assert!(vault.is_empty());
        assert_eq!(vault.restore(&text), "nothing here");
    }
}
