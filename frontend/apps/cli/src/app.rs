//! Application Context
//!
//! Builds the backend client, the gateways and the use cases every command
//! shares. Everything durable lives under the state directory.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use account::use_cases::{CurrentProfileUseCase, Guards, ResumeSessionUseCase, SessionStore};
use account::{AccountConfig, AccountError, BaasAccountGateway};
use anyhow::{Context, Result};
use baas::{BaasClient, BaasConfig};
use marketplace::{BaasMarketGateway, MarketConfig, Viewer};
use platform::cache::QueryCache;
use platform::password::HibpClient;
use platform::storage::FileStore;

pub const HOME_ENV: &str = "MICROINTERN_HOME";
const DEFAULT_HOME: &str = ".microintern";
const REDIRECT_ENV: &str = "MICROINTERN_REDIRECT_URL";

pub type AccountGuards = Guards<BaasAccountGateway, BaasAccountGateway>;

pub struct App {
    pub home: PathBuf,
    pub storage: Arc<FileStore>,
    pub sessions: Arc<SessionStore<FileStore>>,
    pub account: Arc<BaasAccountGateway>,
    pub market: Arc<BaasMarketGateway>,
    pub breach: Arc<HibpClient>,
    pub guards: Arc<AccountGuards>,
    pub account_config: Arc<AccountConfig>,
    pub market_config: Arc<MarketConfig>,
    pub cache: Arc<QueryCache>,
}

impl App {
    /// State directory from `MICROINTERN_HOME`, or `./.microintern`
    pub fn home_dir() -> PathBuf {
        env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME))
    }

    pub fn from_env(home: &Path) -> Result<Self> {
        let baas_config = BaasConfig::from_env().context("Backend is not configured")?;
        let client = BaasClient::new(baas_config).context("Failed to build the backend client")?;

        let mut account_config = if cfg!(debug_assertions) {
            AccountConfig::development()
        } else {
            AccountConfig::default()
        };
        if let Ok(url) = env::var(REDIRECT_ENV) {
            account_config.redirect_url = url;
        }
        let market_config = if cfg!(debug_assertions) {
            MarketConfig::development()
        } else {
            MarketConfig::default()
        };

        let storage = Arc::new(FileStore::new(home));
        let sessions = Arc::new(SessionStore::new(storage.clone()));
        let account = Arc::new(BaasAccountGateway::new(
            client.clone(),
            account_config.redirect_url.clone(),
        ));
        let market = Arc::new(BaasMarketGateway::new(client));
        let account_config = Arc::new(account_config);
        let guards = Arc::new(Guards::new(
            account.clone(),
            account.clone(),
            account_config.clone(),
        ));

        tracing::debug!(home = %home.display(), "Application context ready");
        Ok(Self {
            home: home.to_path_buf(),
            storage,
            sessions,
            account,
            market,
            breach: Arc::new(HibpClient::new(reqwest::Client::new())),
            guards,
            cache: Arc::new(QueryCache::new(market_config.stale_time)),
            account_config,
            market_config: Arc::new(market_config),
        })
    }

    /// Restore and refresh the stored session, if any
    pub async fn resume(&self) -> Result<bool> {
        let resumed = ResumeSessionUseCase::new(
            self.account.clone(),
            self.sessions.clone(),
            self.account_config.refresh_margin_secs(),
        )
        .execute()
        .await?;
        Ok(resumed.is_some())
    }

    /// The signed-in user as the marketplace sees them
    pub async fn viewer(&self) -> Result<Viewer> {
        if !self.resume().await? {
            return Err(AccountError::NotSignedIn.into());
        }
        let profile = CurrentProfileUseCase::new(self.account.clone(), self.sessions.clone())
            .execute()
            .await?;
        Ok(Viewer::from_profile(&profile))
    }
}
