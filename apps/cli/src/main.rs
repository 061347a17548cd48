use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    views, ClientHandle, Registration, Services, StoreState, SyncClient, TracingNavigator,
};
use shared::{
    domain::{Account, AccountId, AccountProfile, CommentId, ProfessionId, QualityId},
    protocol::{Credentials, NewComment},
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        profession: Option<String>,
        #[arg(long = "quality")]
        qualities: Vec<String>,
        #[arg(long)]
        sex: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "/users")]
        redirect: String,
    },
    Logout,
    Whoami,
    Accounts,
    Account {
        id: String,
    },
    Catalogs,
    Comments {
        page_id: String,
    },
    Comment {
        page_id: String,
        content: String,
    },
    DeleteComment {
        comment_id: String,
    },
    Rename {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let settings = load_settings(&cli.config);
    let database_url = prepare_database_url(&settings.database_url);
    let storage = Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open session store at '{database_url}'"))?;
    storage.health_check().await?;
    let tokens = Arc::new(storage);
    let services = Services::http(
        reqwest::Client::new(),
        settings.service_url()?,
        settings.auth_url()?,
        settings.auth_api_key.clone(),
        tokens.clone(),
    );
    let client = SyncClient::bootstrap(services, tokens, Arc::new(TracingNavigator)).await?;
    info!(service_url = %settings.service_url, "client ready");

    run(&client, cli.command).await
}

async fn run(client: &SyncClient, command: Command) -> Result<()> {
    match command {
        Command::Register {
            email,
            password,
            name,
            profession,
            qualities,
            sex,
        } => {
            let profile = AccountProfile {
                name,
                profession: profession.map(ProfessionId),
                qualities: qualities.into_iter().map(QualityId).collect(),
                sex,
            };
            let account = client
                .register(Registration {
                    email,
                    password,
                    profile,
                })
                .await?;
            println!("registered account_id={}", account.id);
        }
        Command::Login {
            email,
            password,
            redirect,
        } => {
            let user_id = client
                .login(Credentials::new(email, password), &redirect)
                .await?;
            println!("logged in as account_id={user_id}");
        }
        Command::Logout => {
            client.logout().await;
            println!("logged out");
        }
        Command::Whoami => {
            client.load_initial_data().await?;
            client.select(|state| match views::current_user(state) {
                Some(account) => print_account(state, account),
                None => println!("status={:?} (no account loaded)", views::session_status(state)),
            });
        }
        Command::Accounts => {
            client.load_initial_data().await?;
            client.ensure_accounts_loaded().await?;
            client.select(|state| {
                for account in views::accounts(state).unwrap_or_default() {
                    print_account(state, account);
                }
            });
        }
        Command::Account { id } => {
            client.load_initial_data().await?;
            client.ensure_accounts_loaded().await?;
            let id = AccountId(id);
            let found = client.select(|state| match views::account_by_id(state, &id) {
                Some(account) => {
                    print_account(state, account);
                    true
                }
                None => false,
            });
            if !found {
                bail!("no account with id '{id}'");
            }
        }
        Command::Catalogs => {
            client.load_initial_data().await?;
            client.select(|state| {
                println!("professions:");
                for profession in views::professions(state).unwrap_or_default() {
                    println!("  {} {}", profession.id, profession.name);
                }
                println!("qualities:");
                for quality in views::qualities(state).unwrap_or_default() {
                    println!("  {} {} ({})", quality.id, quality.name, quality.color);
                }
            });
        }
        Command::Comments { page_id } => {
            let page_id = AccountId(page_id);
            client.load_comments(&page_id).await?;
            client.select(|state| {
                for comment in views::comments_for_page(state, &page_id) {
                    println!(
                        "{} {} {}: {}",
                        comment.created_at.to_rfc3339(),
                        comment.id,
                        comment.author_id,
                        comment.content
                    );
                }
            });
        }
        Command::Comment { page_id, content } => {
            let comment = client
                .create_comment(NewComment {
                    page_id: AccountId(page_id),
                    content,
                })
                .await?;
            println!("created comment_id={}", comment.id);
        }
        Command::DeleteComment { comment_id } => {
            let comment_id = CommentId(comment_id);
            if client.delete_comment(&comment_id).await? {
                println!("deleted comment_id={comment_id}");
            } else {
                println!("removal of comment_id={comment_id} was not confirmed");
            }
        }
        Command::Rename { name } => {
            client.load_initial_data().await?;
            let Some(mut account) = client.select(|state| views::current_user(state).cloned())
            else {
                bail!("not logged in or account record missing");
            };
            account.profile.name = name;
            let updated = client.update_account(account).await?;
            println!("renamed account_id={} to {}", updated.id, updated.profile.name);
        }
    }
    Ok(())
}

fn print_account(state: &StoreState, account: &Account) {
    let profession = account
        .profile
        .profession
        .as_ref()
        .and_then(|id| views::profession_by_id(state, id))
        .map(|profession| profession.name.as_str())
        .unwrap_or("-");
    let qualities: Vec<&str> = views::qualities_by_ids(state, &account.profile.qualities)
        .into_iter()
        .map(|quality| quality.name.as_str())
        .collect();
    println!(
        "{} {} <{}> profession={} qualities=[{}] rate={} meetings={}",
        account.id,
        account.profile.name,
        account.email,
        profession,
        qualities.join(", "),
        account.rate,
        account.completed_meetings
    );
}
