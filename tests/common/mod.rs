//! Scripted in-memory tree that grows the way the live page does.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use comment_harvester::{Selectors, TreeError, TreeSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Comment(usize),
    CommentText(usize),
    List,
    Control(usize),
    ReplyThread(usize),
    Info,
    Counter(usize),
    Description,
}

#[derive(Debug, Clone)]
struct Control {
    replies: Vec<Option<String>>,
    follow_ups: VecDeque<Vec<Option<String>>>,
    alive: bool,
    stale: bool,
}

#[derive(Debug, Default)]
struct Inner {
    comments: Vec<Option<String>>,
    /// Comments detached from the page; their handles report `Stale`
    removed: HashSet<usize>,
    pending: VecDeque<Vec<Option<String>>>,
    controls: Vec<Control>,
    reply_threads: usize,
    has_list: bool,
    info: Option<String>,
    counters: Vec<String>,
    description: Option<String>,
    url: String,
    tail_scrolls: usize,
    list_scrolls: usize,
    stale_scrolls_left: usize,
    stale_scrolls: usize,
    activations: usize,
}

pub struct ScriptedTree {
    selectors: Selectors,
    inner: Mutex<Inner>,
}

pub fn texts(raw: &[&str]) -> Vec<Option<String>> {
    raw.iter().map(|t| Some(t.to_string())).collect()
}

impl ScriptedTree {
    /// A post with a comment list container and a full set of landmarks.
    pub fn new() -> Self {
        Self {
            selectors: Selectors::default(),
            inner: Mutex::new(Inner {
                has_list: true,
                info: Some("creator\n·\n03-15".to_string()),
                counters: vec!["1.2K".into(), "5".into(), "58".into()],
                description: Some("a post about things".to_string()),
                url: "https://www.tiktok.com/@creator/video/42?is_from_webapp=1".to_string(),
                ..Inner::default()
            }),
        }
    }

    pub fn with_comments(self, comments: Vec<Option<String>>) -> Self {
        self.inner.lock().unwrap().comments = comments;
        self
    }

    /// Each tail scroll reveals the next batch; an empty batch is a stall.
    pub fn with_pending(self, batch: Vec<Option<String>>) -> Self {
        self.inner.lock().unwrap().pending.push_back(batch);
        self
    }

    /// An expand control revealing `replies`, then one follow-up control per
    /// entry of `follow_ups`, chained.
    pub fn with_control(
        self,
        replies: Vec<Option<String>>,
        follow_ups: Vec<Vec<Option<String>>>,
    ) -> Self {
        self.inner.lock().unwrap().controls.push(Control {
            replies,
            follow_ups: follow_ups.into(),
            alive: true,
            stale: false,
        });
        self
    }

    /// A control that vanishes as soon as it is activated.
    pub fn with_stale_control(self) -> Self {
        self.inner.lock().unwrap().controls.push(Control {
            replies: Vec::new(),
            follow_ups: VecDeque::new(),
            alive: true,
            stale: true,
        });
        self
    }

    /// The next `count` tail scrolls fail with `Stale` and reveal nothing.
    pub fn with_stale_scrolls(self, count: usize) -> Self {
        self.inner.lock().unwrap().stale_scrolls_left = count;
        self
    }

    /// Detaches comment `index`, as the page does when it re-renders.
    pub fn remove_comment(&self, index: usize) {
        self.inner.lock().unwrap().removed.insert(index);
    }

    pub fn without_list(self) -> Self {
        self.inner.lock().unwrap().has_list = false;
        self
    }

    pub fn with_info(self, info: Option<&str>) -> Self {
        self.inner.lock().unwrap().info = info.map(str::to_string);
        self
    }

    pub fn with_counters(self, counters: &[&str]) -> Self {
        self.inner.lock().unwrap().counters = counters.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_description(self, description: Option<&str>) -> Self {
        self.inner.lock().unwrap().description = description.map(str::to_string);
        self
    }

    pub fn tail_scrolls(&self) -> usize {
        self.inner.lock().unwrap().tail_scrolls
    }

    pub fn list_scrolls(&self) -> usize {
        self.inner.lock().unwrap().list_scrolls
    }

    pub fn stale_scrolls(&self) -> usize {
        self.inner.lock().unwrap().stale_scrolls
    }

    pub fn activations(&self) -> usize {
        self.inner.lock().unwrap().activations
    }

    pub fn comment_count(&self) -> usize {
        self.inner.lock().unwrap().comments.len()
    }
}

#[async_trait]
impl TreeSource for ScriptedTree {
    type Node = Node;

    async fn query(&self, pattern: &str, scope: Option<&Node>) -> Result<Vec<Node>, TreeError> {
        let inner = self.inner.lock().unwrap();
        let s = &self.selectors;

        if let Some(scope) = scope {
            return match scope {
                Node::Comment(i) if inner.removed.contains(i) => {
                    Err(TreeError::Stale(format!("comment {}", i)))
                }
                Node::Comment(i) if pattern == s.comment_text => match inner.comments.get(*i) {
                    Some(Some(_)) => Ok(vec![Node::CommentText(*i)]),
                    Some(None) => Ok(vec![]),
                    None => Err(TreeError::Stale(format!("comment {}", i))),
                },
                _ => Ok(vec![]),
            };
        }

        let nodes = if pattern == s.comments {
            (0..inner.comments.len())
                .filter(|i| !inner.removed.contains(i))
                .map(Node::Comment)
                .collect()
        } else if pattern == s.comment_list {
            if inner.has_list {
                vec![Node::List]
            } else {
                vec![]
            }
        } else if pattern == s.expand_replies {
            inner
                .controls
                .iter()
                .enumerate()
                .filter(|(_, c)| c.alive)
                .map(|(i, _)| Node::Control(i))
                .collect()
        } else if pattern == s.reply_threads {
            (0..inner.reply_threads).map(Node::ReplyThread).collect()
        } else if pattern == s.author_info {
            inner.info.iter().map(|_| Node::Info).collect()
        } else if pattern == s.counters {
            (0..inner.counters.len()).map(Node::Counter).collect()
        } else if pattern == s.description {
            inner.description.iter().map(|_| Node::Description).collect()
        } else {
            return Err(TreeError::Query {
                pattern: pattern.to_string(),
                message: "unknown pattern".to_string(),
            });
        };
        Ok(nodes)
    }

    async fn text(&self, node: &Node) -> Result<String, TreeError> {
        let inner = self.inner.lock().unwrap();
        let text = match node {
            Node::Comment(i) | Node::CommentText(i) if inner.removed.contains(i) => {
                return Err(TreeError::Stale(format!("comment {}", i)));
            }
            Node::Comment(i) | Node::CommentText(i) => inner
                .comments
                .get(*i)
                .ok_or_else(|| TreeError::Stale(format!("comment {}", i)))?
                .clone()
                .unwrap_or_default(),
            Node::Info => inner.info.clone().unwrap_or_default(),
            Node::Counter(i) => inner.counters[*i].clone(),
            Node::Description => inner.description.clone().unwrap_or_default(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn scroll_into_view(&self, node: &Node) -> Result<(), TreeError> {
        let mut inner = self.inner.lock().unwrap();
        match node {
            Node::Comment(i) if *i + 1 == inner.comments.len() => {
                inner.tail_scrolls += 1;
                if inner.stale_scrolls_left > 0 {
                    inner.stale_scrolls_left -= 1;
                    inner.stale_scrolls += 1;
                    return Err(TreeError::Stale(format!("comment {}", i)));
                }
                if let Some(batch) = inner.pending.pop_front() {
                    inner.comments.extend(batch);
                }
            }
            Node::List => inner.list_scrolls += 1,
            _ => {}
        }
        Ok(())
    }

    async fn activate(&self, node: &Node) -> Result<(), TreeError> {
        let mut inner = self.inner.lock().unwrap();
        let Node::Control(i) = node else {
            return Ok(());
        };
        let control = inner.controls[*i].clone();
        inner.controls[*i].alive = false;
        if control.stale {
            return Err(TreeError::Stale(format!("control {}", i)));
        }

        inner.activations += 1;
        inner.reply_threads += 1;
        inner.comments.extend(control.replies);

        let mut follow_ups = control.follow_ups;
        if let Some(next) = follow_ups.pop_front() {
            inner.controls.push(Control {
                replies: next,
                follow_ups,
                alive: true,
                stale: false,
            });
        }
        Ok(())
    }

    async fn location(&self) -> Result<String, TreeError> {
        Ok(self.inner.lock().unwrap().url.clone())
    }
}
