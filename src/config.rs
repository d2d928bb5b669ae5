//! Harvest configuration.
//!
//! Selectors and loop timings are plain data supplied by the caller. Nothing
//! here reads files or the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Structural patterns used to locate landmarks in the tree.
///
/// Defaults are XPath expressions matching the TikTok web player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Scrollable container around the comment list
    pub comment_list: String,
    /// Every rendered comment, first-level and reply alike
    pub comments: String,
    /// Containers that hold a thread's replies
    pub reply_threads: String,
    /// "View N replies" / "View more" controls
    pub expand_replies: String,
    /// `nickname · date` line under the author
    pub author_info: String,
    /// Post counter labels (likes, comments, shares)
    pub counters: String,
    pub description: String,
    /// Text child of a comment node, relative to that node
    pub comment_text: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            comment_list: r#"//div[contains(@class, "DivCommentListContainer")]"#.to_string(),
            comments: r#"//div[contains(@class, "DivCommentContentContainer")]"#.to_string(),
            reply_threads: r#"//div[contains(@class, "DivReplyContainer")]"#.to_string(),
            expand_replies: r#"//p[contains(@class, "PReplyAction") and contains(., "View")]"#
                .to_string(),
            author_info: r#"//span[contains(@class, "SpanOtherInfos")]"#.to_string(),
            counters: r#"//strong[contains(@class, 'StrongText')]"#.to_string(),
            description: r#"//h4[contains(@class, "H4Link")]/preceding-sibling::div"#.to_string(),
            comment_text: "./div[1]/p".to_string(),
        }
    }
}

impl Selectors {
    fn all(&self) -> [(&'static str, &str); 8] {
        [
            ("comment_list", self.comment_list.as_str()),
            ("comments", self.comments.as_str()),
            ("reply_threads", self.reply_threads.as_str()),
            ("expand_replies", self.expand_replies.as_str()),
            ("author_info", self.author_info.as_str()),
            ("counters", self.counters.as_str()),
            ("description", self.description.as_str()),
            ("comment_text", self.comment_text.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub selectors: Selectors,

    /// Consecutive no-growth polls before first-level loading is declared done
    #[serde(default = "default_first_level_patience")]
    pub first_level_patience: u32,

    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Upper bound on reply expansion passes. `None` drains until no
    /// expand control is left.
    #[serde(default)]
    pub max_reply_passes: Option<u32>,
}

fn default_first_level_patience() -> u32 {
    30
}

fn default_scroll_delay_ms() -> u64 {
    300
}

fn default_reply_delay_ms() -> u64 {
    500
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            first_level_patience: default_first_level_patience(),
            scroll_delay_ms: default_scroll_delay_ms(),
            reply_delay_ms: default_reply_delay_ms(),
            max_reply_passes: None,
        }
    }
}

impl HarvestConfig {
    /// Parses a JSON config; absent fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_first_level_patience(mut self, patience: u32) -> Self {
        self.first_level_patience = patience;
        self
    }

    pub fn with_scroll_delay(mut self, delay: Duration) -> Self {
        self.scroll_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_reply_passes(mut self, passes: Option<u32>) -> Self {
        self.max_reply_passes = passes;
        self
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_level_patience == 0 {
            return Err(ConfigError::Invalid(
                "first_level_patience must be at least 1".to_string(),
            ));
        }
        if self.max_reply_passes == Some(0) {
            return Err(ConfigError::Invalid(
                "max_reply_passes must be at least 1 when set".to_string(),
            ));
        }
        for (name, pattern) in self.selectors.all() {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("selector '{}' is empty", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.first_level_patience, 30);
        assert_eq!(config.scroll_delay(), Duration::from_millis(300));
        assert_eq!(config.reply_delay(), Duration::from_millis(500));
        assert!(config.max_reply_passes.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = HarvestConfig::from_json_str(
            r#"{ "first_level_patience": 5, "selectors": { "comments": "//li" } }"#,
        )
        .unwrap();
        assert_eq!(config.first_level_patience, 5);
        assert_eq!(config.scroll_delay_ms, 300);
        assert_eq!(config.selectors.comments, "//li");
        assert_eq!(config.selectors.comment_text, "./div[1]/p");
    }

    #[test]
    fn test_zero_patience_rejected() {
        let err = HarvestConfig::from_json_str(r#"{ "first_level_patience": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_selector_rejected() {
        let mut selectors = Selectors::default();
        selectors.counters = "  ".to_string();
        let config = HarvestConfig::default().with_selectors(selectors);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_reply_pass_cap_rejected() {
        let config = HarvestConfig::default().with_max_reply_passes(Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = HarvestConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
