//! Completion filter (spec.md §4.6, L5): narrows a candidate list as the
//! user types, in either prefix or substring mode, and computes how much
//! text is safe to auto-insert (`common`/`common_pre`).
//!
//! Follows the same convention `core-attrs::collation` uses elsewhere in
//! this workspace: rank matches with an explicit ordered enum rather than
//! ad hoc booleans, so the ranking rule reads as a single `Ord` impl.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Candidate must start with the typed text.
    Prefix,
    /// Candidate may contain the typed text anywhere.
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchQuality {
    Substring,
    CasePrefix,
    ExactPrefix,
}

/// A narrowing stack of typed patterns: pushing a character narrows the
/// match set; popping (backspace) widens it back to the previous pattern
/// without re-deriving it from the candidate list (spec.md §4.6 "substring
/// stack").
pub struct Filter {
    pub mode: MatchMode,
    stack: Vec<String>,
}

impl Filter {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            stack: vec![String::new()],
        }
    }

    pub fn push_char(&mut self, c: char) {
        let mut next = self.stack.last().expect("stack never empty").clone();
        next.push(c);
        self.stack.push(next);
    }

    /// Pop one level of narrowing. Returns `false` if already at the empty
    /// pattern (nothing left to pop).
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn pattern(&self) -> &str {
        self.stack.last().expect("stack never empty")
    }

    /// Discard all narrowing and go back to the empty pattern. Callers
    /// invoke this right after a document edit invalidates the candidate
    /// list this filter was narrowing, the same explicit-call contract
    /// `core_marks::MarkStore::clip_for_replace` asks of its callers.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
    }

    fn quality(&self, candidate: &str) -> Option<MatchQuality> {
        let pat = self.pattern();
        if pat.is_empty() {
            return Some(MatchQuality::Substring);
        }
        if candidate.starts_with(pat) {
            return Some(MatchQuality::ExactPrefix);
        }
        let lower_c = candidate.to_lowercase();
        let lower_p = pat.to_lowercase();
        if lower_c.starts_with(&lower_p) {
            return Some(MatchQuality::CasePrefix);
        }
        if self.mode == MatchMode::Substring && lower_c.contains(&lower_p) {
            return Some(MatchQuality::Substring);
        }
        None
    }

    fn match_position(&self, candidate: &str) -> usize {
        let pat = self.pattern();
        if pat.is_empty() {
            return 0;
        }
        candidate
            .to_lowercase()
            .find(&pat.to_lowercase())
            .unwrap_or(0)
    }

    /// Candidates matching the current pattern, best quality first, ties
    /// broken alphabetically.
    pub fn matches<'a>(&self, candidates: &'a [String]) -> Vec<&'a str> {
        let mut scored: Vec<(MatchQuality, &str)> = candidates
            .iter()
            .filter_map(|c| self.quality(c).map(|q| (q, c.as_str())))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().map(|(_, s)| s).collect()
    }

    /// Longest run common to every current match, from the start of the
    /// candidate string. Case is taken from the best-ranked match rather
    /// than from the typed pattern (spec.md §9 Open Question: this
    /// implementation resolves "common_pre case-preservation" by
    /// preferring the candidate's own casing, since that's what ends up
    /// inserted into the document).
    pub fn common(&self, candidates: &[String]) -> Option<String> {
        let matches = self.matches(candidates);
        common_prefix(&matches)
    }

    /// Longest run common to every current match *starting at the typed
    /// pattern's position* in each candidate, rather than at column 0.
    /// Identical to [`Filter::common`] in `Prefix` mode (the match position
    /// is always 0 there); differs in `Substring` mode, where candidates can
    /// match the pattern at different offsets.
    pub fn common_pre(&self, candidates: &[String]) -> Option<String> {
        let matches = self.matches(candidates);
        if matches.is_empty() {
            return None;
        }
        let suffixes: Vec<&str> = matches
            .iter()
            .map(|m| {
                let pos = self.match_position(m);
                &m[pos..]
            })
            .collect();
        common_prefix(&suffixes)
    }
}

fn common_prefix(strs: &[&str]) -> Option<String> {
    let first = *strs.first()?;
    let mut len = first.len();
    for s in &strs[1..] {
        let shared = first
            .bytes()
            .zip(s.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        len = len.min(shared);
    }
    Some(first[..len].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<String> {
        ["alpha", "alphabet", "alphanumeric", "beta", "Beta"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn prefix_mode_narrows_as_pattern_grows() {
        let mut f = Filter::new(MatchMode::Prefix);
        let c = candidates();
        assert_eq!(f.matches(&c).len(), 5);
        f.push_char('a');
        f.push_char('l');
        assert_eq!(f.matches(&c), vec!["alpha", "alphabet", "alphanumeric"]);
        f.push_char('p');
        f.push_char('h');
        f.push_char('a');
        assert_eq!(f.matches(&c), vec!["alpha", "alphabet", "alphanumeric"]);
        f.push_char('b');
        assert_eq!(f.matches(&c), vec!["alphabet"]);
    }

    #[test]
    fn pop_widens_back_to_the_previous_pattern() {
        let mut f = Filter::new(MatchMode::Prefix);
        let c = candidates();
        f.push_char('a');
        f.push_char('l');
        f.push_char('p');
        f.push_char('h');
        f.push_char('a');
        f.push_char('b');
        assert_eq!(f.matches(&c), vec!["alphabet"]);
        assert!(f.pop());
        assert_eq!(f.matches(&c), vec!["alpha", "alphabet", "alphanumeric"]);
        assert_eq!(f.pattern(), "alpha");
    }

    #[test]
    fn case_prefix_ranks_below_exact_prefix() {
        let mut f = Filter::new(MatchMode::Prefix);
        let c = candidates();
        f.push_char('b');
        // "beta" (exact lowercase prefix) outranks "Beta" (case-insensitive only).
        assert_eq!(f.matches(&c), vec!["beta", "Beta"]);
    }

    #[test]
    fn substring_mode_matches_mid_word() {
        let mut f = Filter::new(MatchMode::Substring);
        let c = candidates();
        f.push_char('n');
        f.push_char('u');
        f.push_char('m');
        assert_eq!(f.matches(&c), vec!["alphanumeric"]);
    }

    #[test]
    fn common_is_the_shared_prefix_of_all_matches() {
        let mut f = Filter::new(MatchMode::Prefix);
        let c = candidates();
        f.push_char('a');
        f.push_char('l');
        assert_eq!(f.common(&c).as_deref(), Some("alpha"));
    }

    #[test]
    fn reset_discards_narrowing_back_to_empty_pattern() {
        let mut f = Filter::new(MatchMode::Prefix);
        f.push_char('a');
        f.push_char('l');
        assert_eq!(f.pattern(), "al");
        f.reset();
        assert_eq!(f.pattern(), "");
        assert!(!f.pop());
    }

    #[test]
    fn common_pre_anchors_at_the_substring_match_position() {
        let mut f = Filter::new(MatchMode::Substring);
        let c = vec!["foobar_xyz".to_string(), "quux_bar_xyzzy".to_string()];
        f.push_char('b');
        f.push_char('a');
        f.push_char('r');
        // "bar" starts at different offsets in each candidate; common_pre
        // anchors there rather than at column 0 (where they share nothing).
        assert_eq!(f.common(&c).as_deref(), Some(""));
        assert_eq!(f.common_pre(&c).as_deref(), Some("bar_xyz"));
    }
}
