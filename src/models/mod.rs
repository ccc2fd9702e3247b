mod article;

pub use article::{format_timestamp, Article, GeneratedArticle};
