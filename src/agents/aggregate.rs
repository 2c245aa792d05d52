//! Merging the selections of several runs.

use std::collections::HashSet;

use crate::domain::PostChoice;

/// Keep the first choice seen for each link, in encounter order.
pub fn unique_by_link<I>(choices: I) -> Vec<PostChoice>
where
    I: IntoIterator<Item = PostChoice>,
{
    let mut seen = HashSet::new();
    choices
        .into_iter()
        .filter(|choice| seen.insert(choice.post.link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostHeader;

    fn choice(link: &str, justification: &str) -> PostChoice {
        PostChoice {
            post: PostHeader::new("title", link),
            justification: justification.to_string(),
        }
    }

    #[test]
    fn test_first_justification_wins() {
        let merged = unique_by_link(vec![choice("https://x/1", "A"), choice("https://x/1", "B")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].justification, "A");
    }

    #[test]
    fn test_order_of_first_occurrence_preserved() {
        let merged = unique_by_link(vec![
            choice("https://x/3", "a"),
            choice("https://x/1", "b"),
            choice("https://x/3", "c"),
            choice("https://x/2", "d"),
            choice("https://x/1", "e"),
        ]);
        let links: Vec<&str> = merged.iter().map(|c| c.post.link.as_str()).collect();
        assert_eq!(links, vec!["https://x/3", "https://x/1", "https://x/2"]);
    }

    #[test]
    fn test_idempotent() {
        let once = unique_by_link(vec![
            choice("https://x/1", "a"),
            choice("https://x/1", "b"),
            choice("https://x/2", "c"),
        ]);
        let twice = unique_by_link(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_same_title_different_links_kept() {
        let merged = unique_by_link(vec![choice("https://x/1", "a"), choice("https://x/2", "a")]);
        assert_eq!(merged.len(), 2);
    }
}
