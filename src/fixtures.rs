//! Shared test projects and rosters.

use std::sync::Arc;

use crate::casting::model::{ActorAge, ActorGender, CastingRoot, VoiceActor};
use crate::project::character::{CharacterAge, CharacterDetail, CharacterGender};
use crate::project::model::{BookScript, Project, ScriptBlock};
use crate::project::reference::{ReferenceData, RelatedCharacters, RelationshipKind};

pub fn reference() -> Arc<ReferenceData> {
    let male = |id: &str| CharacterDetail::new(id, CharacterGender::Male, CharacterAge::Adult);
    let female = |id: &str| CharacterDetail::new(id, CharacterGender::Female, CharacterAge::Adult);
    let data = [
        male("John the Baptist"),
        male("Peter (Simon)"),
        male("disciples"),
        male("man with evil spirit"),
        male("demons (Legion)"),
        male("angel Gabriel"),
        male("Zechariah"),
        male("Paul"),
        female("Mary (Jesus' mother)"),
        female("Elizabeth"),
        CharacterDetail::new("little girl", CharacterGender::Female, CharacterAge::Child),
    ]
    .into_iter()
    .fold(ReferenceData::default(), |data, detail| data.with_character(detail))
    .with_related(RelatedCharacters::new(
        RelationshipKind::Alternates,
        &["man with evil spirit", "demons (Legion)"],
    ));
    Arc::new(data)
}

pub fn mark_book() -> BookScript {
    let mut book = BookScript::new("MRK")
        .with_block(1, 1, "BC-MRK", 10)
        .with_block(1, 1, "narrator-MRK", 120)
        .with_block(1, 2, "scripture", 200)
        .with_block(1, 4, "narrator-MRK", 300)
        .with_block(1, 7, "John the Baptist", 150)
        .with_block(1, 9, "narrator-MRK", 250)
        .with_block(1, 11, "God", 60);
    book.blocks
        .push(ScriptBlock::new("MRK", 1, 12, "narrator-MRK", 400).with_last_verse(15));
    book.with_block(1, 16, "narrator-MRK", 200)
        .with_block(1, 17, "Jesus", 80)
        .with_block(1, 18, "narrator-MRK", 300)
        .with_block(5, 1, "BC-MRK", 10)
        .with_block(5, 1, "narrator-MRK", 500)
        .with_block(5, 7, "man with evil spirit", 90)
        .with_block(5, 8, "narrator-MRK", 40)
        .with_block(5, 8, "Jesus", 40)
        .with_block(5, 9, "narrator-MRK", 30)
        .with_block(5, 9, "demons (Legion)", 30)
        .with_block(5, 10, "narrator-MRK", 200)
        .with_block(8, 1, "BC-MRK", 10)
        .with_block(8, 27, "narrator-MRK", 100)
        .with_block(8, 28, "disciples", 60)
        .with_block(8, 29, "narrator-MRK", 20)
        .with_block(8, 29, "Peter (Simon)", 30)
        .with_block(8, 30, "narrator-MRK", 50)
        .with_block(8, 31, "narrator-MRK", 150)
        .with_block(8, 33, "Jesus", 80)
}

pub fn luke_book() -> BookScript {
    BookScript::new("LUK")
        .with_block(1, 1, "BC-LUK", 10)
        .with_block(1, 1, "narrator-LUK", 300)
        .with_block(1, 13, "angel Gabriel", 120)
        .with_block(1, 18, "Zechariah", 80)
        .with_block(1, 19, "angel Gabriel", 100)
        .with_block(1, 21, "narrator-LUK", 250)
        .with_block(1, 28, "angel Gabriel", 90)
        .with_block(1, 29, "narrator-LUK", 60)
        .with_block(1, 34, "Mary (Jesus' mother)", 60)
        .with_block(1, 35, "angel Gabriel", 150)
        .with_block(1, 38, "Mary (Jesus' mother)", 60)
        .with_block(1, 39, "narrator-LUK", 200)
        .with_block(1, 42, "Elizabeth", 150)
        .with_block(1, 46, "narrator-LUK", 20)
        .with_block(1, 46, "Mary (Jesus' mother)", 400)
        .with_block(2, 1, "BC-LUK", 10)
        .with_block(2, 1, "narrator-LUK", 600)
        .with_block(2, 48, "Mary (Jesus' mother)", 50)
        .with_block(2, 49, "Jesus", 40)
}

/// Mark alone.
pub fn mark_project() -> Project {
    Project::new(reference()).with_book(mark_book())
}

/// Mark and Luke.
pub fn two_gospel_project() -> Project {
    Project::new(reference())
        .with_book(mark_book())
        .with_book(luke_book())
}

/// Galatians, where Paul speaks right after the narrator.
pub fn epistle_project() -> Project {
    Project::new(reference()).with_book(
        BookScript::new("GAL")
            .with_block(1, 1, "BC-GAL", 10)
            .with_block(1, 1, "narrator-GAL", 400)
            .with_block(1, 1, "Paul", 300)
            .with_block(1, 2, "narrator-GAL", 900)
            .with_block(3, 6, "scripture", 60)
            .with_block(3, 7, "narrator-GAL", 700),
    )
}

/// One narrator block per book with the given keystrokes.
pub fn prophets_project(books: &[(&str, u64)]) -> Project {
    books.iter().fold(Project::new(reference()), |project, (book, keystrokes)| {
        project.with_book(BookScript::new(*book).with_block(1, 1, &format!("narrator-{}", book), *keystrokes))
    })
}

/// A book of `scenes` scenes with two speakers each. Speakers of different
/// scenes are always more than 40 blocks apart.
pub fn scene_project(book_id: &str, scenes: usize) -> Project {
    let narrator = format!("narrator-{}", book_id);
    let mut book = BookScript::new(book_id);
    let mut verse = 1;
    for scene in 0..scenes {
        let first = format!("speaker {:02}a", scene);
        let second = format!("speaker {:02}b", scene);
        for id in [&narrator, &first, &narrator, &second, &first] {
            book = book.with_block(1, verse, id, 100 + scene as u64);
            verse += 1;
        }
        for _ in 0..40 {
            book = book.with_block(1, verse, &narrator, 10);
            verse += 1;
        }
    }
    Project::new(reference()).with_book(book)
}

/// Active roster of adult men, adult women and children, ids `m1`, `f1`, `c1`...
pub fn roster(male: usize, female: usize, child: usize) -> CastingRoot {
    let mut root = CastingRoot::new();
    for i in 1..=male {
        root.insert_actor(VoiceActor::new(format!("m{}", i), ActorGender::Male));
    }
    for i in 1..=female {
        root.insert_actor(VoiceActor::new(format!("f{}", i), ActorGender::Female));
    }
    for i in 1..=child {
        root.insert_actor(
            VoiceActor::new(format!("c{}", i), ActorGender::Female).with_age(ActorAge::Child),
        );
    }
    root
}
