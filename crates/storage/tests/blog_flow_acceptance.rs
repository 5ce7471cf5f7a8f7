use shared::{
    domain::{ArticleStatus, Identity},
    protocol::ArticleDraft,
};
use storage::Storage;

#[tokio::test]
async fn threaded_discussion_survives_author_removal_and_reply_cleanup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        temp.path()
            .join("blog.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let storage = Storage::new(&database_url).await.expect("db");

    let alice = storage
        .create_user("flow-alice", "hash", Identity::User)
        .await
        .expect("alice");
    let bob = storage
        .create_user("flow-bob", "hash", Identity::User)
        .await
        .expect("bob");
    let article = storage
        .insert_article(&ArticleDraft {
            title: Some("Threads".to_string()),
            content: Some("body".to_string()),
            status: Some(ArticleStatus::Published),
            ..ArticleDraft::default()
        })
        .await
        .expect("article");

    let root = storage
        .insert_comment(&article.id, &alice, "root", None)
        .await
        .expect("root");
    let reply = storage
        .insert_comment(&article.id, &bob, "reply", Some(&root.comment_id))
        .await
        .expect("reply");
    storage
        .toggle_comment_like(&reply.comment_id, &alice.id)
        .await
        .expect("like")
        .expect("comment exists");

    let comments = storage
        .list_comments(&article.id, Some(&alice.id))
        .await
        .expect("comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment_id, root.comment_id);
    assert_eq!(comments[1].parent_id.as_ref(), Some(&root.comment_id));
    assert_eq!(comments[1].liked_by_me, 1);

    // Removing the author keeps the comment text but drops the author link.
    assert!(storage.delete_user(&bob.id).await.expect("delete bob"));
    let stored_reply = storage
        .find_comment(&reply.comment_id)
        .await
        .expect("lookup")
        .expect("reply kept");
    assert!(stored_reply.author_id.is_none());

    assert!(storage
        .delete_comment(&root.comment_id)
        .await
        .expect("delete root"));
    let remaining = storage
        .list_comments(&article.id, None)
        .await
        .expect("comments");
    assert!(remaining.is_empty());
}
