use fake::faker::company::en::CatchPhrase;
use fake::faker::lorem::en::Paragraphs;
use fake::Fake;

use crate::models::GeneratedArticle;

/// Placeholder article used when no provider produced anything.
pub fn synthetic_article() -> GeneratedArticle {
    GeneratedArticle {
        title: catch_phrase(),
        content: paragraphs(3),
    }
}

pub fn catch_phrase() -> String {
    CatchPhrase().fake()
}

/// `count` lorem paragraphs separated by blank lines.
pub fn paragraphs(count: usize) -> String {
    let paragraphs: Vec<String> = Paragraphs(count..count + 1).fake();
    paragraphs.join("\n\n")
}
