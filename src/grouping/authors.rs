//! Per-author narration volume over the included books.

use std::collections::HashMap;

use serde::Serialize;

use crate::project::model::Project;
use crate::project::reference::{book_index, sort_books, Author};

/// Narration keystrokes of one author, counted over included books only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    pub author_name: String,
    /// Included books of this author, in canonical order.
    pub book_ids: Vec<String>,
    /// Narration keystrokes of each entry of `book_ids`.
    pub book_keystrokes: Vec<u64>,
    pub keystrokes: u64,
    pub speaking_character_id: Option<String>,
}

impl AuthorStats {
    pub fn new<S: AsRef<str>>(
        author: &Author,
        included_book_ids: &[S],
        keystrokes_by_book: &HashMap<String, u64>,
    ) -> Self {
        let mut book_ids: Vec<String> = author
            .books
            .iter()
            .filter(|b| included_book_ids.iter().any(|i| i.as_ref() == b.as_str()))
            .cloned()
            .collect();
        sort_books(&mut book_ids);
        let book_keystrokes: Vec<u64> = book_ids
            .iter()
            .map(|b| keystrokes_by_book.get(b).copied().unwrap_or(0))
            .collect();
        Self {
            author_name: author.name.clone(),
            book_ids,
            keystrokes: book_keystrokes.iter().sum(),
            book_keystrokes,
            speaking_character_id: author.speaking_character_id.clone(),
        }
    }

    /// Stats for every author with at least one of `book_ids`. Books without a
    /// known author count as their own author.
    pub fn for_books(
        project: &Project,
        book_ids: &[String],
        keystrokes_by_book: &HashMap<String, u64>,
    ) -> Vec<AuthorStats> {
        let authors = project.reference().authors();
        let mut seen: Vec<&str> = Vec::new();
        let mut stats = Vec::new();
        for book in book_ids {
            let author = authors.author_of(book);
            let name = author.map(|a| a.name.as_str()).unwrap_or(book.as_str());
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let author = author
                .cloned()
                .unwrap_or_else(|| Author::new(book.as_str(), &[book.as_str()]));
            stats.push(AuthorStats::new(&author, book_ids, keystrokes_by_book));
        }
        stats.sort_by_key(|s| s.book_ids.first().map(|b| book_index(b)).unwrap_or(usize::MAX));
        stats
    }

    /// Stats for the authors of the project's included books.
    pub fn for_project(project: &Project) -> Vec<AuthorStats> {
        Self::for_books(
            project,
            &project.included_book_ids(),
            &project.keystrokes_by_book(),
        )
    }

    /// One pseudo-author per book.
    pub fn one_per_book(book_ids: &[String], keystrokes_by_book: &HashMap<String, u64>) -> Vec<AuthorStats> {
        book_ids
            .iter()
            .map(|b| {
                let keystrokes = keystrokes_by_book.get(b).copied().unwrap_or(0);
                AuthorStats {
                    author_name: b.clone(),
                    book_ids: vec![b.clone()],
                    book_keystrokes: vec![keystrokes],
                    keystrokes,
                    speaking_character_id: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_stats_only_count_included_books() {
        let keystrokes: HashMap<String, u64> = [("JER", 52000), ("LAM", 9000), ("1KI", 30000)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let author = Author::new("Jeremiah", &["1KI", "2KI", "JER", "LAM"]);
        let stats = AuthorStats::new(&author, &["LAM", "JER"], &keystrokes);

        assert_eq!(stats.book_ids, vec!["JER", "LAM"]);
        assert_eq!(stats.book_keystrokes, vec![52000, 9000]);
        assert_eq!(stats.keystrokes, 61000);
    }

    #[test]
    fn test_project_stats_group_books_by_author() {
        let project = fixtures::prophets_project(&[
            ("JER", 52000),
            ("LAM", 8000),
            ("EZK", 48000),
            ("HOS", 12000),
            ("JUD", 1000),
        ]);
        let stats = AuthorStats::for_project(&project);
        let names: Vec<&str> = stats.iter().map(|s| s.author_name.as_str()).collect();
        assert_eq!(names, vec!["Jeremiah", "Ezekiel", "Hosea", "Jude"]);
        assert_eq!(stats[0].book_ids, vec!["JER", "LAM"]);
        assert_eq!(stats[0].keystrokes, 60000);
        assert_eq!(stats[0].speaking_character_id.as_deref(), Some("Jeremiah"));
    }

    #[test]
    fn test_excluded_book_drops_out_of_totals() {
        let mut project = fixtures::prophets_project(&[("JER", 52000), ("LAM", 8000)]);
        project.set_book_included("LAM", false);
        let stats = AuthorStats::for_project(&project);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].book_ids, vec!["JER"]);
        assert_eq!(stats[0].keystrokes, 52000);
    }
}
