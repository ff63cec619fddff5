//! Per-address head/tail comments.

use crate::error::ReachError;

/// An optional head comment (rendered above the line) and tail comment
/// (rendered at the end of the line). Tail comments cannot contain newlines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub head: Option<String>,
    tail: Option<String>,
}

impl Comment {
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn set_tail(&mut self, text: impl Into<String>) -> Result<(), ReachError> {
        let text = text.into();
        if text.contains(['\r', '\n']) {
            return Err(ReachError::InputShape(
                "tail comment cannot contain newline characters".into(),
            ));
        }
        self.tail = Some(text);
        Ok(())
    }

    /// The head comment split into lines, ready for a line-oriented renderer
    /// to prefix with a comment marker.
    pub fn head_lines(&self) -> Vec<&str> {
        self.head
            .as_deref()
            .map(|h| h.trim_end().lines().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_rejects_newlines() {
        let mut c = Comment::default();
        assert!(c.set_tail("line1\nline2").is_err());
        assert!(c.set_tail("fine").is_ok());
        assert_eq!(c.tail(), Some("fine"));
    }

    #[test]
    fn head_lines_splits_and_trims() {
        let mut c = Comment::default();
        c.head = Some("first\nsecond\n".to_string());
        assert_eq!(c.head_lines(), vec!["first", "second"]);
    }
}
