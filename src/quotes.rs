//! Quote collection
//!
//! The quotes file holds one `quote@author` record per line. The author is
//! everything after the last `@`; a line without `@` is a quote with no
//! author.

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl Quote {
    pub fn parse(line: &str) -> Option<Quote> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (text, author) = match line.rsplit_once('@') {
            Some((text, author)) => (text.trim(), author.trim()),
            None => (line, ""),
        };
        Some(Quote {
            text: text.to_string(),
            author: author.to_string(),
        })
    }

    /// Shown when no quotes are available
    pub fn fallback() -> Quote {
        Quote {
            text: "Well begun is half done.".to_string(),
            author: "~Aristotle".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: Vec<Quote>,
}

impl QuoteBook {
    pub fn parse(content: &str) -> Self {
        Self {
            quotes: content.lines().filter_map(Quote::parse).collect(),
        }
    }

    /// Read the quotes file; a missing or unreadable file gives an empty book
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let book = Self::parse(&content);
                tracing::info!("Loaded {} quotes from {}", book.len(), path.display());
                book
            }
            Err(e) => {
                tracing::warn!("No quotes from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Uniformly random quote, or the fallback when the book is empty
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Quote {
        self.quotes
            .choose(rng)
            .cloned()
            .unwrap_or_else(Quote::fallback)
    }

    pub fn random(&self) -> Quote {
        self.pick(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            Quote::parse("Stay hungry, stay foolish.@~Steve Jobs"),
            Some(Quote {
                text: "Stay hungry, stay foolish.".to_string(),
                author: "~Steve Jobs".to_string(),
            })
        );
    }

    #[test]
    fn test_author_split_at_last_marker() {
        let quote = Quote::parse("mail me at a@b.c@~Someone").unwrap();
        assert_eq!(quote.text, "mail me at a@b.c");
        assert_eq!(quote.author, "~Someone");
    }

    #[test]
    fn test_line_without_author() {
        let quote = Quote::parse("Just words").unwrap();
        assert_eq!(quote.text, "Just words");
        assert_eq!(quote.author, "");
        assert_eq!(Quote::parse("   "), None);
    }

    #[test]
    fn test_book_skips_blank_lines() {
        let book = QuoteBook::parse("a@x\n\nb@y\n   \nc\n");
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_pick_is_from_book() {
        let book = QuoteBook::parse("a@x\nb@y\nc@z\n");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let quote = book.pick(&mut rng);
            assert!(["a", "b", "c"].contains(&quote.text.as_str()));
        }
    }

    #[test]
    fn test_empty_book_gives_fallback() {
        let book = QuoteBook::default();
        assert!(book.is_empty());
        assert_eq!(book.random(), Quote::fallback());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let book = QuoteBook::load(&dir.path().join("nope"));
        assert!(book.is_empty());

        let path = dir.path().join("quotes");
        fs::write(&path, "one@~a\ntwo@~b\n").unwrap();
        assert_eq!(QuoteBook::load(&path).len(), 2);
    }
}
