use std::{future::Future, ops::RangeInclusive, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use reqwest::Client;
use shared::{
    domain::{Account, AccountId, AccountProfile, Comment, CommentId, Profession, Quality},
    protocol::{AuthResponse, Credentials, Envelope, NewComment, DEFAULT_TOKEN_LIFETIME_SECS},
};
use storage::{SessionTokenStore, StoredTokens};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use url::Url;

pub mod container;
pub mod error;
pub mod navigation;
pub mod session;
pub mod staleness;
pub mod store;
pub mod transport;
pub mod views;

pub use container::{ContainerEvent, EntityContainer, Mutation};
pub use error::{classify_auth_error, AuthErrorCategory, ClientError, ErrorInfo};
pub use navigation::{Navigator, RecordingNavigator, TracingNavigator};
pub use session::{Session, SessionEvent, SessionStatus};
pub use store::{Store, StoreEvent, StoreState};
pub use transport::{
    AuthService, EntityService, HttpAuthService, HttpEntityService, UnavailableAuthService,
    UnavailableEntityService,
};

use navigation::{account_path, ACCOUNTS_PATH, ROOT_PATH};
use staleness::is_outdated;

const AVATAR_URL_PREFIX: &str = "https://avatars.dicebear.com/api/avataaars/";
const AVATAR_SEED_LEN: usize = 6;
const RATE_RANGE: RangeInclusive<u8> = 1..=5;
const COMPLETED_MEETINGS_RANGE: RangeInclusive<u32> = 0..=200;

const ACCOUNTS_ENDPOINT: &str = "user";
const COMMENTS_ENDPOINT: &str = "comment";
const QUALITIES_ENDPOINT: &str = "quality";
const PROFESSIONS_ENDPOINT: &str = "profession";
const COMMENT_OWNER_FIELD: &str = "pageId";

pub fn avatar_url(seed: &str) -> String {
    format!("{AVATAR_URL_PREFIX}{seed}.svg")
}

/// Builds the profile record created right after a successful sign-up.
pub fn new_account_record<R: Rng + ?Sized>(
    user_id: AccountId,
    email: String,
    profile: AccountProfile,
    rng: &mut R,
) -> Account {
    let seed: String = (0..AVATAR_SEED_LEN)
        .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();
    Account {
        id: user_id,
        email,
        rate: rng.gen_range(RATE_RANGE),
        completed_meetings: rng.gen_range(COMPLETED_MEETINGS_RANGE),
        image: avatar_url(&seed),
        profile,
    }
}

/// Absolute token expiry. A lifetime that does not fit a timestamp falls back to the default.
fn token_expiry(now: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    if let Some(expires_at) =
        Duration::try_seconds(lifetime_secs).and_then(|lifetime| now.checked_add_signed(lifetime))
    {
        return expires_at;
    }
    warn!(lifetime_secs, "token lifetime out of range, using default");
    now.checked_add_signed(Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
        .unwrap_or(now)
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub profile: AccountProfile,
}

/// Remote collaborators, one per entity kind plus authentication.
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<dyn EntityService<Account>>,
    pub comments: Arc<dyn EntityService<Comment>>,
    pub qualities: Arc<dyn EntityService<Quality>>,
    pub professions: Arc<dyn EntityService<Profession>>,
    pub auth: Arc<dyn AuthService>,
}

impl Services {
    pub fn http(
        http: Client,
        service_url: Url,
        auth_url: Url,
        api_key: impl Into<String>,
        tokens: Arc<dyn SessionTokenStore>,
    ) -> Self {
        Self {
            accounts: Arc::new(
                HttpEntityService::new(http.clone(), service_url.clone(), ACCOUNTS_ENDPOINT)
                    .with_token_store(tokens.clone()),
            ),
            comments: Arc::new(
                HttpEntityService::new(http.clone(), service_url.clone(), COMMENTS_ENDPOINT)
                    .with_owner_field(COMMENT_OWNER_FIELD)
                    .with_token_store(tokens.clone()),
            ),
            qualities: Arc::new(
                HttpEntityService::new(http.clone(), service_url.clone(), QUALITIES_ENDPOINT)
                    .with_token_store(tokens.clone()),
            ),
            professions: Arc::new(
                HttpEntityService::new(http.clone(), service_url, PROFESSIONS_ENDPOINT)
                    .with_token_store(tokens),
            ),
            auth: Arc::new(HttpAuthService::new(http, auth_url, api_key)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            accounts: Arc::new(UnavailableEntityService::new("accounts")),
            comments: Arc::new(UnavailableEntityService::new("comments")),
            qualities: Arc::new(UnavailableEntityService::new("qualities")),
            professions: Arc::new(UnavailableEntityService::new("professions")),
            auth: Arc::new(UnavailableAuthService),
        }
    }
}

/// Identity established by the first step of registration.
#[derive(Debug, Clone)]
struct Authenticated {
    user_id: AccountId,
    email: String,
}

#[derive(Debug, Clone, Copy)]
enum AuthKind {
    Register,
    Login,
}

impl AuthKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

/// The orchestrator surface driven by the presentation layer.
///
/// Every operation records its own failure in the relevant `error` slot before returning it.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    async fn load_accounts(&self) -> Result<(), ClientError>;
    async fn ensure_accounts_loaded(&self) -> Result<(), ClientError>;
    async fn load_qualities(&self) -> Result<(), ClientError>;
    async fn load_professions(&self) -> Result<(), ClientError>;
    async fn load_initial_data(&self) -> Result<(), ClientError>;
    async fn load_comments(&self, page_id: &AccountId) -> Result<(), ClientError>;
    async fn register(&self, registration: Registration) -> Result<Account, ClientError>;
    async fn login(&self, credentials: Credentials, redirect: &str)
        -> Result<AccountId, ClientError>;
    async fn logout(&self);
    async fn update_account(&self, account: Account) -> Result<Account, ClientError>;
    async fn create_comment(&self, data: NewComment) -> Result<Comment, ClientError>;
    async fn delete_comment(&self, comment_id: &CommentId) -> Result<bool, ClientError>;
    fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent>;
}

pub struct SyncClient {
    store: Arc<Store>,
    services: Services,
    tokens: Arc<dyn SessionTokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl SyncClient {
    /// Restores the session from persisted tokens and builds the process-wide store.
    pub async fn bootstrap(
        services: Services,
        tokens: Arc<dyn SessionTokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>, ClientError> {
        let persisted = tokens.load().await?;
        let state = StoreState::bootstrap(persisted.as_ref());
        info!(
            status = ?state.session.status(),
            user_id = ?state.session.current_user_id(),
            "session bootstrapped"
        );
        Ok(Self::new_with_store(
            Store::new(state),
            services,
            tokens,
            navigator,
        ))
    }

    pub fn new_with_store(
        store: Arc<Store>,
        services: Services,
        tokens: Arc<dyn SessionTokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            services,
            tokens,
            navigator,
        })
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn select<R>(&self, view: impl FnOnce(&StoreState) -> R) -> R {
        self.store.select(view)
    }

    async fn fetch_into<T, F>(
        &self,
        container: &'static str,
        wrap: fn(ContainerEvent<T>) -> StoreEvent,
        fetch: F,
    ) -> Result<(), ClientError>
    where
        T: Send,
        F: Future<Output = Result<Envelope<Vec<T>>, ClientError>> + Send,
    {
        self.store.dispatch(wrap(ContainerEvent::Requested));
        match fetch.await {
            Ok(Envelope { content }) => {
                info!(container, count = content.len(), "received");
                self.store.dispatch(wrap(ContainerEvent::Received(content)));
                Ok(())
            }
            Err(err) => {
                error!(container, "fetch failed: {err}");
                self.store
                    .dispatch(wrap(ContainerEvent::Failed(ErrorInfo::from(&err))));
                Err(err)
            }
        }
    }

    async fn authenticate(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<AuthResponse, ClientError> {
        self.store
            .dispatch(StoreEvent::Session(SessionEvent::AuthRequested));
        let result = match kind {
            AuthKind::Register => self.services.auth.register(credentials).await,
            AuthKind::Login => self.services.auth.login(credentials).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let info = classify_auth_error(&err);
                warn!(
                    action = kind.as_str(),
                    category = ?info.category,
                    "authentication rejected: {err}"
                );
                self.store
                    .dispatch(StoreEvent::Session(SessionEvent::AuthFailed(info)));
                return Err(err);
            }
        };

        let persisted = StoredTokens {
            user_id: response.local_id.clone(),
            access_token: response.id_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: token_expiry(Utc::now(), response.expires_in_secs()),
        };
        if let Err(err) = self.tokens.set_tokens(&persisted).await {
            let err = ClientError::from(err);
            error!(action = kind.as_str(), "failed to persist session: {err}");
            self.store
                .dispatch(StoreEvent::Session(SessionEvent::AuthFailed(
                    ErrorInfo::from(&err),
                )));
            return Err(err);
        }

        info!(action = kind.as_str(), user_id = %response.local_id, "authenticated");
        self.store
            .dispatch(StoreEvent::Session(SessionEvent::AuthSucceeded {
                user_id: response.local_id.clone(),
            }));
        Ok(response)
    }

    /// Second registration step. A failure here leaves the session logged in without a
    /// matching account record; nothing is rolled back.
    async fn create_account_record(
        &self,
        authenticated: Authenticated,
        profile: AccountProfile,
    ) -> Result<Account, ClientError> {
        let record = new_account_record(
            authenticated.user_id,
            authenticated.email,
            profile,
            &mut rand::thread_rng(),
        );
        self.store
            .dispatch(StoreEvent::Accounts(ContainerEvent::MutationRequested(
                Mutation::Create,
            )));

        match self.services.accounts.create(&record).await {
            Ok(Envelope { content }) => {
                info!(account_id = %content.id, "account record created");
                self.store
                    .dispatch(StoreEvent::Accounts(ContainerEvent::Appended(content.clone())));
                self.navigator.navigate(ACCOUNTS_PATH);
                Ok(content)
            }
            Err(err) => {
                error!(
                    account_id = %record.id,
                    "account record creation failed after sign-up: {err}"
                );
                self.store
                    .dispatch(StoreEvent::Accounts(ContainerEvent::Failed(ErrorInfo::from(
                        &err,
                    ))));
                Err(err)
            }
        }
    }
}

#[async_trait]
impl ClientHandle for SyncClient {
    async fn load_accounts(&self) -> Result<(), ClientError> {
        self.fetch_into("accounts", StoreEvent::Accounts, self.services.accounts.get())
            .await
    }

    async fn ensure_accounts_loaded(&self) -> Result<(), ClientError> {
        if self.store.select(views::accounts_loaded) {
            return Ok(());
        }
        self.load_accounts().await
    }

    async fn load_qualities(&self) -> Result<(), ClientError> {
        let last_fetch = self.store.select(|state| state.qualities.last_fetch());
        if !is_outdated(last_fetch) {
            debug!("qualities are fresh, skipping fetch");
            return Ok(());
        }
        self.fetch_into(
            "qualities",
            StoreEvent::Qualities,
            self.services.qualities.get(),
        )
        .await
    }

    async fn load_professions(&self) -> Result<(), ClientError> {
        let last_fetch = self.store.select(|state| state.professions.last_fetch());
        if !is_outdated(last_fetch) {
            debug!("professions are fresh, skipping fetch");
            return Ok(());
        }
        self.fetch_into(
            "professions",
            StoreEvent::Professions,
            self.services.professions.get(),
        )
        .await
    }

    async fn load_initial_data(&self) -> Result<(), ClientError> {
        let load_accounts = async {
            if self.store.select(views::is_logged_in) {
                self.load_accounts().await
            } else {
                Ok(())
            }
        };
        let (qualities, professions, accounts) = futures::join!(
            self.load_qualities(),
            self.load_professions(),
            load_accounts
        );
        qualities.and(professions).and(accounts)
    }

    async fn load_comments(&self, page_id: &AccountId) -> Result<(), ClientError> {
        self.fetch_into(
            "comments",
            StoreEvent::Comments,
            self.services.comments.get_by_owner(page_id.as_str()),
        )
        .await
    }

    async fn register(&self, registration: Registration) -> Result<Account, ClientError> {
        let Registration {
            email,
            password,
            profile,
        } = registration;
        let credentials = Credentials::new(email, password);
        let response = self
            .authenticate(AuthKind::Register, &credentials)
            .await?;
        let authenticated = Authenticated {
            user_id: response.local_id,
            email: credentials.email,
        };
        self.create_account_record(authenticated, profile).await
    }

    async fn login(
        &self,
        credentials: Credentials,
        redirect: &str,
    ) -> Result<AccountId, ClientError> {
        let response = self.authenticate(AuthKind::Login, &credentials).await?;
        self.navigator.navigate(redirect);
        Ok(response.local_id)
    }

    async fn logout(&self) {
        if let Err(err) = self.tokens.clear().await {
            error!("failed to clear persisted session: {err:#}");
        }
        self.store
            .dispatch(StoreEvent::Session(SessionEvent::LoggedOut));
        info!("logged out");
        self.navigator.navigate(ROOT_PATH);
    }

    async fn update_account(&self, account: Account) -> Result<Account, ClientError> {
        self.store
            .dispatch(StoreEvent::Accounts(ContainerEvent::MutationRequested(
                Mutation::Update,
            )));
        match self.services.accounts.update(&account).await {
            Ok(Envelope { content }) => {
                self.store
                    .dispatch(StoreEvent::Accounts(ContainerEvent::ReplacedById(
                        content.clone(),
                    )));
                self.navigator.navigate(&account_path(&content.id));
                Ok(content)
            }
            Err(err) => {
                error!(account_id = %account.id, "account update failed: {err}");
                self.store
                    .dispatch(StoreEvent::Accounts(ContainerEvent::Failed(ErrorInfo::from(
                        &err,
                    ))));
                Err(err)
            }
        }
    }

    async fn create_comment(&self, data: NewComment) -> Result<Comment, ClientError> {
        self.store
            .dispatch(StoreEvent::Comments(ContainerEvent::MutationRequested(
                Mutation::Create,
            )));
        let Some(author_id) = self
            .store
            .select(|state| state.session.current_user_id().cloned())
        else {
            let err = ClientError::Validation("cannot comment without a signed-in user".into());
            warn!(page_id = %data.page_id, "{err}");
            self.store
                .dispatch(StoreEvent::Comments(ContainerEvent::Failed(ErrorInfo::from(
                    &err,
                ))));
            return Err(err);
        };

        let draft = Comment {
            id: CommentId::generate(),
            page_id: data.page_id,
            author_id,
            content: data.content,
            created_at: Utc::now(),
        };
        match self.services.comments.create(&draft).await {
            Ok(Envelope { content }) => {
                info!(comment_id = %content.id, page_id = %content.page_id, "comment created");
                self.store
                    .dispatch(StoreEvent::Comments(ContainerEvent::Appended(content.clone())));
                Ok(content)
            }
            Err(err) => {
                error!(comment_id = %draft.id, "comment creation failed: {err}");
                self.store
                    .dispatch(StoreEvent::Comments(ContainerEvent::Failed(ErrorInfo::from(
                        &err,
                    ))));
                Err(err)
            }
        }
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<bool, ClientError> {
        self.store
            .dispatch(StoreEvent::Comments(ContainerEvent::MutationRequested(
                Mutation::Remove,
            )));
        match self.services.comments.remove(comment_id.as_str()).await {
            Ok(Envelope { content: None }) => {
                info!(%comment_id, "comment deleted");
                self.store
                    .dispatch(StoreEvent::Comments(ContainerEvent::RemovedById(
                        comment_id.to_string(),
                    )));
                Ok(true)
            }
            Ok(Envelope { content: Some(_) }) => {
                debug!(%comment_id, "removal not confirmed, keeping local comment");
                Ok(false)
            }
            Err(err) => {
                error!(%comment_id, "comment deletion failed: {err}");
                self.store
                    .dispatch(StoreEvent::Comments(ContainerEvent::Failed(ErrorInfo::from(
                        &err,
                    ))));
                Err(err)
            }
        }
    }

    fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
