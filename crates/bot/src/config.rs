//! Bot configuration loaded from the process environment.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use ledger::LedgerConfig;

/// Configuration required to start the bot process.
#[derive(Clone)]
pub struct BotConfig {
    /// Gateway credential. Never logged.
    pub token: String,
    /// Role that grants access to admin commands.
    pub admin_role_id: String,
    pub ledger: LedgerConfig,
    /// Overrides the platform log directory.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TOKEN` - Gateway credential (required)
    /// - `ADMIN_ROLE_ID` - Role allowed to run admin commands (required)
    /// - `CHOCOBLAST_DATA_DIR` - Directory of the score files (default: `.`)
    /// - `CHOCOBLAST_ARCHIVE_DIR` - Archive root (default: `archives_chocoblast`)
    /// - `CHOCOBLAST_COOLDOWN_SECS` - Chocoblast cooldown (default: 180)
    /// - `CHOCOBLAST_LEADERBOARD_SIZE` - Rows shown by `/leaderboard` (default: 10)
    /// - `CHOCOBLAST_LOG_DIR` - Log directory (default: platform-specific)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(vars: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = vars("TOKEN")
            .filter(|value| !value.is_empty())
            .context("TOKEN is not set")?;
        let admin_role_id = vars("ADMIN_ROLE_ID")
            .filter(|value| !value.is_empty())
            .context("ADMIN_ROLE_ID is not set")?;

        let mut ledger = LedgerConfig::default();
        if let Some(dir) = vars("CHOCOBLAST_DATA_DIR") {
            ledger.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = vars("CHOCOBLAST_ARCHIVE_DIR") {
            ledger.archive_dir = PathBuf::from(dir);
        }
        if let Some(secs) = read_env::<u64>(&vars, "CHOCOBLAST_COOLDOWN_SECS") {
            ledger.cooldown = Duration::from_secs(secs);
        }
        if let Some(size) = read_env::<usize>(&vars, "CHOCOBLAST_LEADERBOARD_SIZE") {
            ledger.leaderboard_size = size.max(1);
        }

        Ok(Self {
            token,
            admin_role_id,
            ledger,
            log_dir: vars("CHOCOBLAST_LOG_DIR").map(PathBuf::from),
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("admin_role_id", &self.admin_role_id)
            .field("ledger", &self.ledger)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

fn read_env<T>(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    vars(key)?.parse().ok()
}
