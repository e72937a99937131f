//! Post extraction from the rendered listing markup.
//!
//! Titles are the `h3` headings of the container and descriptions are the
//! excerpt elements, both taken in document order and paired by position.
//! If the two lists differ in length the markup is considered malformed and
//! nothing is returned; no attempt is made to realign them.

use crate::models::Post;
use crate::page::{Page, PageError};
use crate::utils::truncate_for_log;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Selectors and options for [`extract`].
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub container_selector: String,
    pub title_selector: String,
    pub excerpt_selector: String,
    /// Collapse posts sharing a title into one entry.
    pub dedupe_titles: bool,
}

/// Errors raised while turning the container markup into posts.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("posts container `{0}` not found")]
    ContainerMissing(String),

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("found {titles} titles but {descriptions} descriptions")]
    CountMismatch { titles: usize, descriptions: usize },

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Read the container markup from the page and extract its posts.
#[instrument(level = "info", skip_all, fields(container = %settings.container_selector))]
pub fn extract<P>(page: &P, settings: &ExtractorSettings) -> Result<Vec<Post>, ExtractError>
where
    P: Page + ?Sized,
{
    info!("Extracting posts");
    let markup = page
        .inner_html(&settings.container_selector)
        .map_err(|e| match e {
            PageError::ElementNotFound(_) => {
                ExtractError::ContainerMissing(settings.container_selector.clone())
            }
            other => ExtractError::Page(other),
        })?;
    debug!(
        bytes = markup.len(),
        preview = %truncate_for_log(&markup, 200),
        "Fetched container markup"
    );

    let posts = parse_posts(&markup, settings)?;
    info!(count = posts.len(), "Extracted posts");
    Ok(posts)
}

/// Parse posts out of the container's inner markup.
///
/// Pairs the n-th title with the n-th description. Pairs whose title is
/// empty are dropped after pairing, so they never shift the alignment of
/// the others.
pub fn parse_posts(markup: &str, settings: &ExtractorSettings) -> Result<Vec<Post>, ExtractError> {
    let title_selector = parse_selector(&settings.title_selector)?;
    let excerpt_selector = parse_selector(&settings.excerpt_selector)?;

    let fragment = Html::parse_fragment(markup);
    let titles: Vec<String> = fragment.select(&title_selector).map(element_text).collect();
    let descriptions: Vec<String> = fragment.select(&excerpt_selector).map(element_text).collect();

    if titles.len() != descriptions.len() {
        return Err(ExtractError::CountMismatch {
            titles: titles.len(),
            descriptions: descriptions.len(),
        });
    }

    let mut posts = Vec::with_capacity(titles.len());
    for (index, (title, description)) in titles.into_iter().zip(descriptions).enumerate() {
        if title.is_empty() {
            warn!(index, "Dropping post with an empty title");
            continue;
        }
        posts.push(Post::new(title, description));
    }

    if settings.dedupe_titles {
        let before = posts.len();
        posts = collapse_duplicate_titles(posts);
        if posts.len() != before {
            info!(before, after = posts.len(), "Collapsed posts with duplicate titles");
        }
    }

    Ok(posts)
}

/// Keep one post per title: the position of the first occurrence with the
/// description of the last one.
fn collapse_duplicate_titles(posts: Vec<Post>) -> Vec<Post> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut collapsed: Vec<Post> = Vec::with_capacity(posts.len());

    for post in posts {
        match positions.get(&post.title) {
            Some(&index) => collapsed[index].description = post.description,
            None => {
                positions.insert(post.title.clone(), collapsed.len());
                collapsed.push(post);
            }
        }
    }
    collapsed
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::FakePage;

    fn settings() -> ExtractorSettings {
        ExtractorSettings {
            container_selector: ".cc-posts".to_string(),
            title_selector: "h3".to_string(),
            excerpt_selector: ".cc-post-excerpt".to_string(),
            dedupe_titles: false,
        }
    }

    fn post_markup(title: &str, excerpt: &str) -> String {
        format!(
            r#"<div class="cc-post"><a href="/n/1"><h3>
                {title}
            </h3></a><p class="cc-post-excerpt"> {excerpt} </p></div>"#
        )
    }

    #[test]
    fn test_parse_posts_pairs_in_document_order() {
        let markup = [
            post_markup("Vestibular 2025", "Inscrições abertas"),
            post_markup("Semana Universitária", "Programação completa"),
            post_markup("Bolsas de extensão", "Edital publicado"),
        ]
        .concat();

        let posts = parse_posts(&markup, &settings()).unwrap();
        assert_eq!(
            posts,
            vec![
                Post::new("Vestibular 2025", "Inscrições abertas"),
                Post::new("Semana Universitária", "Programação completa"),
                Post::new("Bolsas de extensão", "Edital publicado"),
            ]
        );
    }

    #[test]
    fn test_parse_posts_collects_nested_text() {
        let markup = r#"<h3>Campus <em>Itaperi</em></h3><div class="cc-post-excerpt">Obras <b>concluídas</b></div>"#;
        let posts = parse_posts(markup, &settings()).unwrap();
        assert_eq!(posts, vec![Post::new("Campus Itaperi", "Obras concluídas")]);
    }

    #[test]
    fn test_parse_posts_count_mismatch() {
        let markup = [
            post_markup("A", "a"),
            post_markup("B", "b"),
            r#"<p class="cc-post-excerpt">orphan</p>"#.to_string(),
        ]
        .concat();

        match parse_posts(&markup, &settings()) {
            Err(ExtractError::CountMismatch {
                titles,
                descriptions,
            }) => {
                assert_eq!(titles, 2);
                assert_eq!(descriptions, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let markup = [post_markup("A", "a"), "<h3>B</h3>".to_string()].concat();
        assert!(matches!(
            parse_posts(&markup, &settings()),
            Err(ExtractError::CountMismatch {
                titles: 2,
                descriptions: 1
            })
        ));
    }

    #[test]
    fn test_parse_posts_empty_markup() {
        assert!(parse_posts("", &settings()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_posts_keeps_duplicate_titles_by_default() {
        let markup = [
            post_markup("A", "first"),
            post_markup("B", "b"),
            post_markup("A", "second"),
        ]
        .concat();

        let posts = parse_posts(&markup, &settings()).unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[2], Post::new("A", "second"));
    }

    #[test]
    fn test_parse_posts_dedupe_keeps_first_position_last_description() {
        let markup = [
            post_markup("A", "first"),
            post_markup("B", "b"),
            post_markup("A", "second"),
        ]
        .concat();
        let mut settings = settings();
        settings.dedupe_titles = true;

        let posts = parse_posts(&markup, &settings).unwrap();
        assert_eq!(posts, vec![Post::new("A", "second"), Post::new("B", "b")]);
    }

    #[test]
    fn test_parse_posts_drops_empty_titles_without_shifting() {
        let markup = [
            post_markup("A", "a"),
            post_markup("   ", "untitled"),
            post_markup("C", "c"),
        ]
        .concat();

        let posts = parse_posts(&markup, &settings()).unwrap();
        assert_eq!(posts, vec![Post::new("A", "a"), Post::new("C", "c")]);
    }

    #[test]
    fn test_parse_posts_invalid_selector() {
        let mut settings = settings();
        settings.excerpt_selector = "..broken".to_string();
        assert!(matches!(
            parse_posts("<h3>A</h3>", &settings),
            Err(ExtractError::Selector { .. })
        ));
    }

    #[test]
    fn test_extract_reads_container_markup() {
        let page = FakePage::new(2, 0).with_markup(
            &[post_markup("A", "a"), post_markup("B", "b")].concat(),
        );
        let posts = extract(&page, &settings()).unwrap();
        assert_eq!(posts, vec![Post::new("A", "a"), Post::new("B", "b")]);
    }

    #[test]
    fn test_extract_container_missing() {
        let page = FakePage::new(0, 0).without_container();
        match extract(&page, &settings()) {
            Err(ExtractError::ContainerMissing(selector)) => assert_eq!(selector, ".cc-posts"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
