//! Named queries over a [`TreeSource`].
//!
//! [`TreeReader`] holds no state besides the borrowed source and its
//! selectors. Each call is a fresh snapshot of the live tree.

use crate::config::Selectors;
use crate::traits::{TreeError, TreeSource};

pub struct TreeReader<'a, T: TreeSource> {
    source: &'a T,
    selectors: &'a Selectors,
}

impl<'a, T: TreeSource> Clone for TreeReader<'a, T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            selectors: self.selectors,
        }
    }
}

impl<'a, T: TreeSource> TreeReader<'a, T> {
    pub fn new(source: &'a T, selectors: &'a Selectors) -> Self {
        Self { source, selectors }
    }

    pub fn source(&self) -> &'a T {
        self.source
    }

    /// Runs `pattern` against the whole document or under `scope`.
    pub async fn query(
        &self,
        pattern: &str,
        scope: Option<&T::Node>,
    ) -> Result<Vec<T::Node>, TreeError> {
        self.source.query(pattern, scope).await
    }

    pub async fn first(
        &self,
        pattern: &str,
        scope: Option<&T::Node>,
    ) -> Result<Option<T::Node>, TreeError> {
        Ok(self.query(pattern, scope).await?.into_iter().next())
    }

    pub async fn comments(&self) -> Result<Vec<T::Node>, TreeError> {
        self.query(&self.selectors.comments, None).await
    }

    pub async fn comment_list(&self) -> Result<Option<T::Node>, TreeError> {
        self.first(&self.selectors.comment_list, None).await
    }

    pub async fn expand_controls(&self) -> Result<Vec<T::Node>, TreeError> {
        self.query(&self.selectors.expand_replies, None).await
    }

    pub async fn reply_threads(&self) -> Result<Vec<T::Node>, TreeError> {
        self.query(&self.selectors.reply_threads, None).await
    }

    pub async fn author_info(&self) -> Result<Option<T::Node>, TreeError> {
        self.first(&self.selectors.author_info, None).await
    }

    pub async fn counters(&self) -> Result<Vec<T::Node>, TreeError> {
        self.query(&self.selectors.counters, None).await
    }

    pub async fn description(&self) -> Result<Option<T::Node>, TreeError> {
        self.first(&self.selectors.description, None).await
    }

    /// Text of the comment body under `comment`, or `None` when the node has
    /// no text child or went stale before it could be read.
    pub async fn comment_text(&self, comment: &T::Node) -> Result<Option<String>, TreeError> {
        let child = match self.first(&self.selectors.comment_text, Some(comment)).await {
            Ok(Some(child)) => child,
            Ok(None) => return Ok(None),
            Err(e) if e.is_stale() => return Ok(None),
            Err(e) => return Err(e),
        };
        match self.source.text(&child).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_stale() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
