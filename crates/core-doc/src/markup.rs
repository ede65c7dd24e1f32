//! Markup grammar (spec.md §6.3, bit-exact) embedded in rendered line text.
//!
//! `render_line` may return text containing inline markup: attribute-set
//! opens/closes, a literal-`<` escape, tabs, and an end-of-page marker.
//! This module turns that text into a flat token stream plus a plain-text
//! projection with byte offsets, which is what `core-viewport` needs to
//! measure and draw a line.

/// One token of the markup grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupToken {
    /// `<a,b,c>` — opens an attribute set; comma-separated attribute names.
    Open(Vec<String>),
    /// `</>` — closes the innermost open.
    Close,
    /// A run of plain display text (after `<<` → `<` and control-char
    /// escaping has been applied).
    Text(String),
    /// `\f` — end-of-page; nothing after is displayed (spec.md §9 Open
    /// Question: the source doesn't uniformly enforce this. This
    /// implementation resolves it by truncating the token stream here,
    /// see DESIGN.md).
    EndOfPage,
}

/// Tokenize one rendered line's raw text (as returned by `Doc::render_line`)
/// into markup tokens. `\n` is not itself a token: callers already receive
/// one line's worth of text per `render_line` call, so a trailing newline
/// is stripped before tokenizing and is implicit in "one token stream per
/// line".
pub fn tokenize(raw: &str) -> Vec<MarkupToken> {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = raw.chars().peekable();

    macro_rules! flush_text {
        () => {
            if !text.is_empty() {
                tokens.push(MarkupToken::Text(std::mem::take(&mut text)));
            }
        };
    }

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                if chars.peek() == Some(&'<') {
                    chars.next();
                    text.push('<');
                    continue;
                }
                // Collect until the matching '>'.
                let mut body = String::new();
                let mut closed = false;
                for c2 in chars.by_ref() {
                    if c2 == '>' {
                        closed = true;
                        break;
                    }
                    body.push(c2);
                }
                if !closed {
                    // Unterminated open; treat literally to avoid losing data.
                    text.push('<');
                    text.push_str(&body);
                    continue;
                }
                flush_text!();
                if body == "/" {
                    tokens.push(MarkupToken::Close);
                } else {
                    let names = body.split(',').map(|s| s.to_string()).collect();
                    tokens.push(MarkupToken::Open(names));
                }
            }
            '\u{000c}' => {
                flush_text!();
                tokens.push(MarkupToken::EndOfPage);
                break; // nothing after is displayed
            }
            '\t' => {
                text.push('\t');
            }
            c if is_escaped_control(c) => {
                text.push_str(&format!("<fg:red>^{}</>", escape_letter(c)));
            }
            c => text.push(c),
        }
    }
    flush_text!();
    tokens
}

/// Controls other than `\n`/`\f`/`\t` render as `<fg:red>^X</>`.
fn is_escaped_control(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\u{000c}' && c != '\t'
}

fn escape_letter(c: char) -> char {
    // Caret notation: ^@ for NUL, ^A..^Z for 0x01..0x1a, etc.
    let code = c as u32;
    char::from_u32((code + 0x40) & 0x7f).unwrap_or('?')
}

/// Expand a tab to the next multiple-of-8 column, per spec.md §6.3.
pub fn next_tab_stop(col: usize) -> usize {
    (col / 8 + 1) * 8
}

/// Plain-text projection of a token stream, with the running open-set
/// depth at each point discarded (viewport drawing tracks attribute state
/// itself by replaying tokens; this is for tests and for components that
/// only need the displayable text, such as the completion filter's
/// substring matching).
pub fn plain_text(tokens: &[MarkupToken]) -> String {
    let mut out = String::new();
    let mut col = 0usize;
    for tok in tokens {
        if let MarkupToken::Text(t) = tok {
            for c in t.chars() {
                if c == '\t' {
                    let next = next_tab_stop(col);
                    for _ in col..next {
                        out.push(' ');
                    }
                    col = next;
                } else {
                    out.push(c);
                    col += 1;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_close() {
        let toks = tokenize("<bold,italic>hi</>");
        assert_eq!(
            toks,
            vec![
                MarkupToken::Open(vec!["bold".into(), "italic".into()]),
                MarkupToken::Text("hi".into()),
                MarkupToken::Close,
            ]
        );
    }

    #[test]
    fn literal_less_than() {
        let toks = tokenize("a<<b");
        assert_eq!(toks, vec![MarkupToken::Text("a<b".into())]);
    }

    #[test]
    fn end_of_page_truncates() {
        let toks = tokenize("abc\u{000c}def");
        assert_eq!(
            toks,
            vec![MarkupToken::Text("abc".into()), MarkupToken::EndOfPage]
        );
    }

    #[test]
    fn control_char_escaped() {
        let toks = tokenize("\u{0001}");
        assert_eq!(toks, vec![MarkupToken::Text("<fg:red>^A</>".into())]);
    }

    #[test]
    fn tab_stop_math() {
        assert_eq!(next_tab_stop(0), 8);
        assert_eq!(next_tab_stop(7), 8);
        assert_eq!(next_tab_stop(8), 16);
        assert_eq!(next_tab_stop(9), 16);
    }

    #[test]
    fn plain_text_projection_expands_tabs() {
        let toks = tokenize("a\tb");
        assert_eq!(plain_text(&toks), "a       b");
    }

    #[test]
    fn nested_opens_preserved_in_order() {
        let toks = tokenize("<a><b>x</></>");
        assert_eq!(
            toks,
            vec![
                MarkupToken::Open(vec!["a".into()]),
                MarkupToken::Open(vec!["b".into()]),
                MarkupToken::Text("x".into()),
                MarkupToken::Close,
                MarkupToken::Close,
            ]
        );
    }
}
