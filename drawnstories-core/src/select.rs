use tracing::warn;

use crate::Books;

/// Keeps the books whose identifier ends with `-<issue>` for any of the requested `issues`.
/// No requested issue means all books are kept.
pub fn select_books(books: Books, issues: &[impl AsRef<str>]) -> Books {
    if issues.is_empty() {
        return books;
    }

    let suffixes = issues
        .iter()
        .map(|issue| format!("-{}", issue.as_ref()))
        .collect::<Vec<_>>();

    let selected = books
        .into_iter()
        .filter(|(identifier, _)| suffixes.iter().any(|suffix| identifier.ends_with(suffix)))
        .collect::<Books>();

    if selected.is_empty() {
        warn!("no book matches the requested issues {suffixes:?}");
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Book;

    fn books(identifiers: &[&str]) -> Books {
        identifiers
            .iter()
            .map(|identifier| {
                (
                    (*identifier).to_string(),
                    Book::new(*identifier, "", "Oni press"),
                )
            })
            .collect()
    }

    #[test]
    fn selects_requested_issues() {
        let all = books(&["rick-001", "rick-002", "rick-003", "rick-0010"]);

        let selected = select_books(all, &["001", "003"]);

        assert_eq!(
            selected.keys().collect::<Vec<_>>(),
            vec!["rick-001", "rick-003"]
        );
    }

    #[test]
    fn no_issue_keeps_everything() {
        let all = books(&["rick-001", "rick-002"]);

        let selected = select_books(all.clone(), &[] as &[&str]);

        assert_eq!(selected, all);
    }

    #[test]
    fn unmatched_issue_is_an_empty_selection() {
        let all = books(&["rick-001", "rick-002"]);

        let selected = select_books(all, &["042".to_string()]);

        assert!(selected.is_empty());
    }
}
