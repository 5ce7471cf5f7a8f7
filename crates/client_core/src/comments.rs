use shared::domain::{ArticleId, Comment, CommentId, LikeState};
use thiserror::Error;

use crate::{api::BlogClient, error::ClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

/// Nests replies under their parents, keeping input order at every level.
/// Replies whose parent is absent from `comments` are dropped.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut roots = Vec::new();
    let mut replies = Vec::new();
    for comment in comments {
        match comment.parent_id {
            None => roots.push(CommentNode {
                comment,
                children: Vec::new(),
            }),
            Some(_) => replies.push(comment),
        }
    }
    for root in &mut roots {
        attach_replies(root, &replies);
    }
    roots
}

fn attach_replies(node: &mut CommentNode, replies: &[Comment]) {
    node.children = replies
        .iter()
        .filter(|reply| reply.parent_id.as_ref() == Some(&node.comment.comment_id))
        .map(|reply| CommentNode {
            comment: reply.clone(),
            children: Vec::new(),
        })
        .collect();
    for child in &mut node.children {
        attach_replies(child, replies);
    }
}

fn find_in<'a>(nodes: &'a [CommentNode], id: &CommentId) -> Option<&'a Comment> {
    nodes.iter().find_map(|node| {
        if &node.comment.comment_id == id {
            Some(&node.comment)
        } else {
            find_in(&node.children, id)
        }
    })
}

fn find_mut<'a>(nodes: &'a mut [CommentNode], id: &CommentId) -> Option<&'a mut Comment> {
    for node in nodes {
        if &node.comment.comment_id == id {
            return Some(&mut node.comment);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("log in to like comments")]
    NotLoggedIn,
    #[error("comment {0} is not on this board")]
    NotFound(CommentId),
    #[error("server reported {reported:?} but {expected:?} was expected")]
    StateMismatch {
        expected: LikeState,
        reported: LikeState,
    },
    #[error(transparent)]
    Request(#[from] ClientError),
}

/// Comment thread of one article with optimistic like toggling.
#[derive(Debug, Clone, Default)]
pub struct CommentBoard {
    article_id: Option<ArticleId>,
    roots: Vec<CommentNode>,
}

impl CommentBoard {
    pub fn from_comments(article_id: ArticleId, comments: Vec<Comment>) -> Self {
        Self {
            article_id: Some(article_id),
            roots: build_comment_tree(comments),
        }
    }

    pub async fn load(client: &BlogClient, article_id: &ArticleId) -> Result<Self, ClientError> {
        let comments = client.list_comments(article_id).await?;
        Ok(Self::from_comments(article_id.clone(), comments))
    }

    pub async fn reload(&mut self, client: &BlogClient) -> Result<(), ClientError> {
        if let Some(article_id) = self.article_id.clone() {
            *self = Self::load(client, &article_id).await?;
        }
        Ok(())
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        find_in(&self.roots, id)
    }

    /// Flips the like locally, then reconciles with what the server reports.
    /// Any failure or disagreement restores the previous count and flag.
    pub async fn toggle_like(
        &mut self,
        client: &BlogClient,
        comment_id: &CommentId,
    ) -> Result<LikeState, LikeError> {
        if !client.session().is_logged_in().await {
            return Err(LikeError::NotLoggedIn);
        }

        let target = find_mut(&mut self.roots, comment_id)
            .ok_or_else(|| LikeError::NotFound(comment_id.clone()))?;
        let previous = (target.liked_by_me, target.like_count);
        let expected = if target.liked_by_me == 0 {
            target.liked_by_me = 1;
            target.like_count += 1;
            LikeState::Liked
        } else {
            target.liked_by_me = 0;
            target.like_count -= 1;
            LikeState::Unliked
        };

        let outcome = client.like_comment(comment_id).await;

        let restore = |roots: &mut Vec<CommentNode>| {
            if let Some(target) = find_mut(roots, comment_id) {
                (target.liked_by_me, target.like_count) = previous;
            }
        };
        match outcome {
            Ok(reported) if reported == expected => Ok(reported),
            Ok(reported) => {
                restore(&mut self.roots);
                tracing::warn!(%comment_id, ?expected, ?reported, "like state disagreed with server");
                Err(LikeError::StateMismatch { expected, reported })
            }
            Err(err) => {
                restore(&mut self.roots);
                Err(LikeError::Request(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/comments_tests.rs"]
mod tests;
