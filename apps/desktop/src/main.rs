use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use bridge::{BridgeConfig, CommandHost};
use clap::{Parser, Subcommand};
use client_core::{
    BlogClient, CommandInvoker, CommentBoard, CommentNode, Dispatcher, Environment, FileStore,
    Method, RequestOptions, SessionContext,
};
use serde_json::Value;
use shared::{
    domain::{ArticleId, ArticleStatus, CommentId, Identity, LikeState, UserId},
    protocol::{ArticleDraft, EditAccountPayload, RegisterRequest},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Blog client over REST or the local command bridge")]
struct Cli {
    #[arg(long, env = "BLOG_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server_url: String,
    /// Answer requests from the local database instead of the REST server.
    #[arg(long, env = "BLOG_LOCAL")]
    local: bool,
    #[arg(long, env = "BLOG_DATABASE_URL", default_value = "sqlite://./data/blog-local.db")]
    database_url: String,
    #[arg(long, env = "BLOG_SESSION_DIR")]
    session_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        username: String,
        password: String,
        #[arg(long)]
        visitor: bool,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Whoami,
    Articles {
        #[arg(long, default_value = "visitor")]
        identity: Identity,
        #[arg(long)]
        search: Option<String>,
    },
    Article {
        id: String,
    },
    Publish {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        draft: bool,
    },
    SetStatus {
        id: String,
        status: ArticleStatus,
    },
    DeleteArticle {
        id: String,
    },
    Comments {
        article_id: String,
    },
    Comment {
        article_id: String,
        content: String,
        #[arg(long)]
        reply_to: Option<String>,
    },
    Like {
        article_id: String,
        comment_id: String,
    },
    DeleteComment {
        comment_id: String,
    },
    Suggest {
        keyword: String,
    },
    Users {
        #[arg(long)]
        limit: Option<i64>,
    },
    DeleteUser {
        user_id: String,
    },
    EditAccount {
        user_id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        identity: Option<Identity>,
    },
    /// Dispatches an arbitrary operation and prints the envelope.
    Raw {
        method: Method,
        path: String,
        #[arg(long)]
        data: Option<String>,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let client = connect(&cli).await?;
    run(&client, cli.command).await
}

fn environment(cli: &Cli) -> Environment {
    if cli.local {
        Environment::LocalBridge
    } else {
        Environment::Networked
    }
}

fn session_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.session_dir {
        return Ok(dir.clone());
    }
    let base = dirs::data_local_dir().ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
    Ok(base.join("blog_client"))
}

fn session_scope(environment: Environment) -> &'static str {
    match environment {
        Environment::Networked => "networked",
        Environment::LocalBridge => "local",
    }
}

async fn connect(cli: &Cli) -> Result<BlogClient> {
    let environment = environment(cli);
    let store = FileStore::scoped(session_dir(cli)?, session_scope(environment));
    debug!(path = %store.path().display(), "session store");

    let session = SessionContext::new(environment, Arc::new(store));
    session.restore().await.context("failed to restore session")?;

    let invoker: Option<Arc<dyn CommandInvoker>> = if cli.local {
        let mut config = BridgeConfig::from_env();
        config.database_url = cli.database_url.clone();
        config.backend_url = Some(cli.server_url.clone());
        Some(Arc::new(CommandHost::open(&config).await?))
    } else {
        None
    };

    let dispatcher = Dispatcher::connect(session, &cli.server_url, invoker)?;
    Ok(BlogClient::new(dispatcher))
}

async fn run(client: &BlogClient, command: Command) -> Result<()> {
    match command {
        Command::Register {
            username,
            password,
            visitor,
        } => {
            let request = RegisterRequest {
                username,
                password,
                identity: visitor.then_some(Identity::Visitor),
            };
            let auth = client.register(&request).await?;
            println!("registered {} ({}) as {}", auth.username, auth.user_id, auth.identity);
        }
        Command::Login { username, password } => {
            let auth = client.login(&username, &password).await?;
            println!("logged in as {} ({})", auth.username, auth.identity);
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Whoami => match client.session().username().await {
            Some(username) => println!("{username} [{:?}]", client.session().environment()),
            None => println!("not logged in [{:?}]", client.session().environment()),
        },
        Command::Articles { identity, search } => {
            for article in client.list_articles(identity, search.as_deref()).await? {
                println!(
                    "{}  [{}] {}  ({} views)",
                    article.id, article.status, article.title, article.views
                );
            }
        }
        Command::Article { id } => {
            let article = client.get_article(&ArticleId(id)).await?;
            println!("{} [{}]", article.title, article.status);
            println!("{}", article.created_at);
            if !article.tags.is_empty() {
                println!("tags: {}", article.tags);
            }
            println!();
            println!("{}", article.content);
        }
        Command::Publish {
            title,
            content,
            summary,
            tags,
            draft,
        } => {
            let status = if draft {
                ArticleStatus::Draft
            } else {
                ArticleStatus::Published
            };
            let article = client
                .create_article(&ArticleDraft {
                    title: Some(title),
                    content: Some(content),
                    summary,
                    tags,
                    status: Some(status),
                    ..ArticleDraft::default()
                })
                .await?;
            println!("created {} [{}]", article.id, article.status);
        }
        Command::SetStatus { id, status } => {
            let article = client.toggle_article_status(&ArticleId(id), status).await?;
            println!("{} is now {}", article.id, article.status);
        }
        Command::DeleteArticle { id } => {
            client.delete_article(&ArticleId(id)).await?;
            println!("deleted");
        }
        Command::Comments { article_id } => {
            let board = CommentBoard::load(client, &ArticleId(article_id)).await?;
            if board.is_empty() {
                println!("no comments");
            }
            print_thread(board.roots(), 0);
        }
        Command::Comment {
            article_id,
            content,
            reply_to,
        } => {
            let parent = reply_to.map(CommentId);
            let comment = client
                .post_comment(&ArticleId(article_id), &content, parent.as_ref())
                .await?;
            println!("posted {}", comment.comment_id);
        }
        Command::Like {
            article_id,
            comment_id,
        } => {
            let mut board = CommentBoard::load(client, &ArticleId(article_id)).await?;
            let state = board.toggle_like(client, &CommentId(comment_id)).await?;
            match state {
                LikeState::Liked => println!("liked"),
                LikeState::Unliked => println!("unliked"),
            }
        }
        Command::DeleteComment { comment_id } => {
            client.delete_comment(&CommentId(comment_id)).await?;
            println!("deleted");
        }
        Command::Suggest { keyword } => {
            for suggestion in client.suggestions(&keyword).await? {
                println!("{}  {}", suggestion.id, suggestion.title);
            }
        }
        Command::Users { limit } => {
            for user in client.list_users(limit).await? {
                println!("{}  {}  {}", user.id, user.username, user.identity);
            }
        }
        Command::DeleteUser { user_id } => {
            client.delete_user(&UserId(user_id)).await?;
            println!("deleted");
        }
        Command::EditAccount {
            user_id,
            username,
            password,
            identity,
        } => {
            client
                .edit_account(&EditAccountPayload {
                    edited_id: UserId(user_id),
                    edited_username: username,
                    edited_password: password,
                    edited_identity: identity,
                })
                .await?;
            println!("updated");
        }
        Command::Raw {
            method,
            path,
            data,
            params,
        } => {
            let mut options = RequestOptions::default();
            for (key, value) in params {
                options = options.with_param(key, value);
            }
            if let Some(raw) = data {
                let data: Value = serde_json::from_str(&raw).context("--data must be JSON")?;
                options = options.with_data(data);
            }
            let envelope = client
                .dispatcher()
                .dispatch(method, &path, Some(options))
                .await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    Ok(())
}

fn print_thread(nodes: &[CommentNode], depth: usize) {
    for node in nodes {
        let c = &node.comment;
        let heart = if c.liked_by_me == 1 { "*" } else { " " };
        println!(
            "{:indent$}{} {} {}: {}  [{} likes]",
            "",
            heart,
            c.comment_id,
            c.user,
            c.content,
            c.like_count,
            indent = depth * 2
        );
        print_thread(&node.children, depth + 1);
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
