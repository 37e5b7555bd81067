//! Immutable reference tables injected into the grouping components.
//!
//! `ReferenceData` bundles character details, related-character sets and the
//! author/book table. It is built once (from fixtures, a JSON file, or the
//! built-in author table) and shared behind an `Arc`; nothing in the crate
//! mutates it after construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::character::{
    CharacterAge, CharacterDetail, CharacterGender, GOD, HOLY_SPIRIT, JESUS, SCRIPTURE,
};

// =============================================================================
// BOOKS AND AUTHORS
// =============================================================================

/// Canonical order of the 66 books by their three-letter codes.
pub const BOOK_ORDER: [&str; 66] = [
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "1SA", "2SA", "1KI", "2KI", "1CH",
    "2CH", "EZR", "NEH", "EST", "JOB", "PSA", "PRO", "ECC", "SNG", "ISA", "JER", "LAM", "EZK",
    "DAN", "HOS", "JOL", "AMO", "OBA", "JON", "MIC", "NAM", "HAB", "ZEP", "HAG", "ZEC", "MAL",
    "MAT", "MRK", "LUK", "JHN", "ACT", "ROM", "1CO", "2CO", "GAL", "EPH", "PHP", "COL", "1TH",
    "2TH", "1TI", "2TI", "TIT", "PHM", "HEB", "JAS", "1PE", "2PE", "1JN", "2JN", "3JN", "JUD",
    "REV",
];

/// Position of a book in canonical order; unknown codes sort after REV.
pub fn book_index(book_id: &str) -> usize {
    BOOK_ORDER
        .iter()
        .position(|b| *b == book_id)
        .unwrap_or(BOOK_ORDER.len())
}

/// Sorts book ids canonically, falling back to code order for unknown books.
pub fn sort_books(books: &mut [String]) {
    books.sort_by(|a, b| book_index(a).cmp(&book_index(b)).then_with(|| a.cmp(b)));
}

/// A biblical author and the books attributed to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub books: Vec<String>,
    /// Id of the author's own speaking part, voiced by the narrator when
    /// narrating by author.
    #[serde(default)]
    pub speaking_character_id: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, books: &[&str]) -> Self {
        Self {
            name: name.into(),
            books: books.iter().map(|b| b.to_string()).collect(),
            speaking_character_id: None,
        }
    }

    pub fn with_speaking_character(mut self, character_id: impl Into<String>) -> Self {
        self.speaking_character_id = Some(character_id.into());
        self
    }
}

/// Author lookup keyed by book.
#[derive(Debug, Clone, Default)]
pub struct BiblicalAuthors {
    authors: Vec<Author>,
    by_book: HashMap<String, usize>,
}

impl BiblicalAuthors {
    pub fn new(authors: Vec<Author>) -> Self {
        let mut by_book = HashMap::new();
        for (i, author) in authors.iter().enumerate() {
            for book in &author.books {
                by_book.entry(book.clone()).or_insert(i);
            }
        }
        Self { authors, by_book }
    }

    /// The traditional attribution of all 66 books.
    pub fn standard() -> Self {
        Self::new(vec![
            Author::new("Moses", &["GEN", "EXO", "LEV", "NUM", "DEU"]),
            Author::new("Joshua", &["JOS"]),
            Author::new("Samuel", &["JDG", "RUT", "1SA", "2SA"]),
            Author::new("Jeremiah", &["1KI", "2KI", "JER", "LAM"])
                .with_speaking_character("Jeremiah"),
            Author::new("Ezra", &["1CH", "2CH", "EZR", "NEH"]),
            Author::new("Mordecai", &["EST"]),
            Author::new("Job", &["JOB"]),
            Author::new("David", &["PSA"]),
            Author::new("Solomon", &["PRO", "ECC", "SNG"]),
            Author::new("Isaiah", &["ISA"]).with_speaking_character("Isaiah"),
            Author::new("Ezekiel", &["EZK"]).with_speaking_character("Ezekiel"),
            Author::new("Daniel", &["DAN"]).with_speaking_character("Daniel"),
            Author::new("Hosea", &["HOS"]).with_speaking_character("Hosea"),
            Author::new("Joel", &["JOL"]),
            Author::new("Amos", &["AMO"]).with_speaking_character("Amos"),
            Author::new("Obadiah", &["OBA"]),
            Author::new("Jonah", &["JON"]),
            Author::new("Micah", &["MIC"]),
            Author::new("Nahum", &["NAM"]),
            Author::new("Habakkuk", &["HAB"]).with_speaking_character("Habakkuk"),
            Author::new("Zephaniah", &["ZEP"]),
            Author::new("Haggai", &["HAG"]),
            Author::new("Zechariah", &["ZEC"]),
            Author::new("Malachi", &["MAL"]),
            Author::new("Matthew", &["MAT"]),
            Author::new("Mark", &["MRK"]),
            Author::new("Luke", &["LUK", "ACT"]),
            Author::new("John", &["JHN", "1JN", "2JN", "3JN", "REV"]),
            Author::new("Paul", &[
                "ROM", "1CO", "2CO", "GAL", "EPH", "PHP", "COL", "1TH", "2TH", "1TI", "2TI",
                "TIT", "PHM",
            ])
            .with_speaking_character("Paul"),
            Author::new("Hebrews", &["HEB"]),
            Author::new("James", &["JAS"]),
            Author::new("Peter", &["1PE", "2PE"]),
            Author::new("Jude", &["JUD"]),
        ])
    }

    /// One author per book, named after the book. Used when distributing books
    /// without regard to authorship.
    pub fn one_per_book<S: AsRef<str>>(book_ids: &[S]) -> Self {
        Self::new(
            book_ids
                .iter()
                .map(|b| Author::new(b.as_ref(), &[b.as_ref()]))
                .collect(),
        )
    }

    pub fn author_of(&self, book_id: &str) -> Option<&Author> {
        self.by_book.get(book_id).map(|&i| &self.authors[i])
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }
}

// =============================================================================
// RELATED CHARACTERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// The same person at different ages.
    AgeVariants,
    /// Either of the characters speaks the line.
    Alternates,
}

/// A set of ids that must always be cast together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCharacters {
    pub kind: RelationshipKind,
    pub character_ids: Vec<String>,
}

impl RelatedCharacters {
    pub fn new(kind: RelationshipKind, ids: &[&str]) -> Self {
        Self {
            kind,
            character_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// =============================================================================
// REFERENCE DATA
// =============================================================================

/// Serializable form of the reference tables, as read by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTables {
    #[serde(default)]
    pub characters: Vec<CharacterDetail>,
    #[serde(default)]
    pub related: Vec<RelatedCharacters>,
    /// Author table; the standard attribution is used when absent.
    #[serde(default)]
    pub authors: Option<Vec<Author>>,
}

/// Character-detail, related-character and author lookups.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    details: HashMap<String, CharacterDetail>,
    related: Vec<RelatedCharacters>,
    /// Character id -> canonical representative of its related set.
    unit_by_id: HashMap<String, String>,
    authors: BiblicalAuthors,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::new(BiblicalAuthors::standard())
    }
}

impl ReferenceData {
    /// Creates reference data holding only the deity details.
    pub fn new(authors: BiblicalAuthors) -> Self {
        let mut data = Self {
            details: HashMap::new(),
            related: Vec::new(),
            unit_by_id: HashMap::new(),
            authors,
        };
        for (id, gender) in [
            (JESUS, CharacterGender::Male),
            (GOD, CharacterGender::Male),
            (HOLY_SPIRIT, CharacterGender::Either),
            (SCRIPTURE, CharacterGender::Either),
        ] {
            data.details.insert(
                id.to_string(),
                CharacterDetail::new(id, gender, CharacterAge::Adult),
            );
        }
        data
    }

    pub fn from_tables(tables: ReferenceTables) -> Self {
        let authors = match tables.authors {
            Some(authors) => BiblicalAuthors::new(authors),
            None => BiblicalAuthors::standard(),
        };
        let mut data = Self::new(authors);
        for detail in tables.characters {
            data = data.with_character(detail);
        }
        for related in tables.related {
            data = data.with_related(related);
        }
        data
    }

    /// Builder: add or replace a character detail.
    pub fn with_character(mut self, detail: CharacterDetail) -> Self {
        self.details.insert(detail.character_id.clone(), detail);
        self
    }

    /// Builder: register a related-character set. Overlapping sets are merged.
    pub fn with_related(mut self, related: RelatedCharacters) -> Self {
        self.related.push(related);
        self.rebuild_units();
        self
    }

    fn rebuild_units(&mut self) {
        // Union-find over the related sets so chains (A~B, B~C) collapse too.
        let mut parent: HashMap<String, String> = HashMap::new();
        fn find(parent: &mut HashMap<String, String>, id: &str) -> String {
            let next = parent.get(id).cloned().unwrap_or_else(|| id.to_string());
            if next == id {
                return next;
            }
            let root = find(parent, &next);
            parent.insert(id.to_string(), root.clone());
            root
        }
        for set in &self.related {
            for pair in set.character_ids.windows(2) {
                let a = find(&mut parent, &pair[0]);
                let b = find(&mut parent, &pair[1]);
                if a != b {
                    let (root, child) = if a < b { (a, b) } else { (b, a) };
                    parent.insert(child, root);
                }
            }
        }
        let ids: Vec<String> = self
            .related
            .iter()
            .flat_map(|r| r.character_ids.iter().cloned())
            .collect();
        self.unit_by_id.clear();
        for id in ids {
            let root = find(&mut parent, &id);
            self.unit_by_id.insert(id, root);
        }
    }

    /// Details for a character; unknown characters are treated as adults of
    /// either gender.
    pub fn detail(&self, character_id: &str) -> CharacterDetail {
        self.details.get(character_id).cloned().unwrap_or_else(|| {
            CharacterDetail::new(character_id, CharacterGender::Either, CharacterAge::Adult)
        })
    }

    /// The representative id of the related set containing `character_id`
    /// (the id itself when it has no relatives).
    pub fn unit_of<'a>(&'a self, character_id: &'a str) -> &'a str {
        self.unit_by_id
            .get(character_id)
            .map(String::as_str)
            .unwrap_or(character_id)
    }

    pub fn are_related(&self, a: &str, b: &str) -> bool {
        self.unit_of(a) == self.unit_of(b)
    }

    pub fn authors(&self) -> &BiblicalAuthors {
        &self.authors
    }

    pub fn author_of(&self, book_id: &str) -> Option<&Author> {
        self.authors.author_of(book_id)
    }
}
