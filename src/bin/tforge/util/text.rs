/// Greedy word wrap; always returns at least one (possibly empty) line.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let fits = current.is_empty() || current.chars().count() + 1 + word.chars().count() <= width;
        if !fits {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `…`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    match max_len {
        0 => String::new(),
        n => {
            let mut out: String = s.chars().take(n - 1).collect();
            out.push('…');
            out
        }
    }
}

/// Joins up to `limit` items and summarizes the rest.
pub fn join_limited<S: AsRef<str>>(items: &[S], limit: usize) -> String {
    let shown: Vec<&str> = items.iter().take(limit).map(AsRef::as_ref).collect();
    let mut out = shown.join(", ");
    if items.len() > limit {
        out.push_str(&format!(" (+{} more)", items.len() - limit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_width() {
        assert_eq!(wrap("no typing rule matches", 12), vec!["no typing", "rule matches"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("ca", 4), "ca");
        assert_eq!(truncate("aromatic carbon", 8), "aromati…");
        assert_eq!(truncate("芳香族炭素", 3), "芳香…");
    }

    #[test]
    fn join_limited_summarizes_tail() {
        assert_eq!(join_limited(&["c2", "ca"], 5), "c2, ca");
        assert_eq!(join_limited(&["a", "b", "c", "d"], 2), "a, b (+2 more)");
    }
}
