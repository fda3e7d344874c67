//! Maps command invocations onto the ledger and renders plain-text replies.
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDateTime;
use ledger::{Category, LedgerError, LedgerHandle, UserId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::console::Invocation;

/// Points accepted by `/add_score` and `/remove_score`.
const POINTS_RANGE: RangeInclusive<i64> = 1..=10;

#[derive(Debug, Error)]
enum DispatchError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command /{0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

type Result<T> = std::result::Result<T, DispatchError>;

/// Routes invocations to the ledger. Admin commands require the admin role.
pub struct Dispatcher {
    handle: LedgerHandle,
    admin_role: String,
}

impl Dispatcher {
    pub fn new(handle: LedgerHandle, admin_role: impl Into<String>) -> Self {
        Self {
            handle,
            admin_role: admin_role.into(),
        }
    }

    /// Run one invocation and return the reply shown to the invoker.
    pub async fn dispatch(&self, invocation: &Invocation, now: NaiveDateTime) -> String {
        debug!(
            "Dispatching /{} from {} ({} args)",
            invocation.command,
            invocation.invoker,
            invocation.args.len()
        );

        match self.run(invocation, now).await {
            Ok(reply) => reply,
            Err(e) => {
                if !matches!(&e, DispatchError::Ledger(err) if err.is_rejection()) {
                    warn!("/{} failed: {}", invocation.command, e);
                }
                render_error(&e)
            }
        }
    }

    async fn run(&self, invocation: &Invocation, now: NaiveDateTime) -> Result<String> {
        let authorized = invocation.has_role(&self.admin_role);
        let args = &invocation.args;

        match invocation.command.as_str() {
            "chocoblaste" => self.chocoblaste(invocation, now).await,
            "leaderboard" => {
                let category = category_arg(args.first(), "/leaderboard <chocoblasteds|blagueurs>")?;
                self.leaderboard(category).await
            }
            "sauvegarde" => {
                let outcome = self.handle.backup(now, authorized).await?;
                Ok(format!(
                    "Sauvegarde manuelle réussie : {}",
                    outcome.file_name()
                ))
            }
            "reset_scores" => {
                let outcome = self.handle.reset_scores(now, authorized).await?;
                Ok(format!(
                    "Classements remis à zéro. Sauvegarde avant reset : reset_score/{}",
                    outcome.file_name()
                ))
            }
            "restore_last" => {
                let outcome = self.handle.restore_last(authorized).await?;
                Ok(format!(
                    "Scores restaurés depuis l'archive {} ({} chocoblasté(e)s, {} blagueurs)",
                    outcome.file_name, outcome.chocoblasteds, outcome.blagueurs
                ))
            }
            "add_score" => self.adjust(args, 1, authorized).await,
            "remove_score" => self.adjust(args, -1, authorized).await,
            other => Err(DispatchError::UnknownCommand(other.to_string())),
        }
    }

    async fn chocoblaste(&self, invocation: &Invocation, now: NaiveDateTime) -> Result<String> {
        let co_actors = invocation.args.iter().map(UserId::new).collect();
        let outcome = self
            .handle
            .chocoblast(invocation.invoker.clone(), co_actors, now)
            .await?;

        let names = outcome
            .co_actors
            .iter()
            .map(UserId::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "CHOCOBLAST ! {} a été chocoblasté(e). Blagueur(s) : {}. Score : {} chocoblast(s) subi(s).",
            outcome.credited, names, outcome.credited_total
        ))
    }

    async fn leaderboard(&self, category: Category) -> Result<String> {
        let rows = self.handle.leaderboard(category, None).await?;

        let mut text = match category {
            Category::Chocoblasted => "CLASSEMENT DES CHOCOBLASTÉ(E)S".to_string(),
            Category::Blagueur => "CLASSEMENT DES BLAGUEURS DU CHOCOBLAST".to_string(),
        };
        if rows.is_empty() {
            text.push_str("\nLe classement est vide pour le moment.");
        }
        for (rank, (user, count)) in rows.iter().enumerate() {
            text.push_str(&format!("\n{}. {} : {}", rank + 1, user, count));
        }
        Ok(text)
    }

    /// `/add_score` and `/remove_score`: `<user> <category> [points]`.
    async fn adjust(&self, args: &[String], sign: i64, authorized: bool) -> Result<String> {
        const USAGE: &str = "/add_score|/remove_score <user> <chocoblasteds|blagueurs> [1-10]";

        let user = args.first().map(UserId::new).ok_or(DispatchError::Usage(USAGE))?;
        let category = category_arg(args.get(1), USAGE)?;
        let points = match args.get(2) {
            Some(raw) => i64::from_str(raw)
                .ok()
                .filter(|points| POINTS_RANGE.contains(points))
                .ok_or(DispatchError::Usage(USAGE))?,
            None => 1,
        };

        let score = self
            .handle
            .adjust_score(category, user.clone(), sign * points, authorized)
            .await?;

        let verb = if sign > 0 { "ajouté(s) à" } else { "retiré(s) de" };
        Ok(format!(
            "{points} point(s) {verb} {user} ({category}). Nouveau score : {score}"
        ))
    }
}

/// Parse a category argument; `chocoblastedes` is accepted as an alias.
fn category_arg(raw: Option<&String>, usage: &'static str) -> Result<Category> {
    let raw = raw.ok_or(DispatchError::Usage(usage))?;
    if raw.eq_ignore_ascii_case("chocoblastedes") {
        return Ok(Category::Chocoblasted);
    }
    Category::from_str(raw).map_err(|_| DispatchError::Usage(usage))
}

fn render_error(error: &DispatchError) -> String {
    match error {
        DispatchError::Ledger(LedgerError::CooldownActive { remaining }) => {
            let secs = remaining.as_secs();
            format!(
                "CALMEZ-VOUS ! Prochain chocoblast possible dans {}m {}s.",
                secs / 60,
                secs % 60
            )
        }
        DispatchError::Ledger(LedgerError::NoEligibleCoActor) => {
            "Vous devez mentionner au moins un utilisateur différent de vous-même.".to_string()
        }
        DispatchError::Ledger(LedgerError::Unauthorized) => {
            "Vous n'avez pas le rôle requis pour utiliser cette commande.".to_string()
        }
        other => format!("Erreur : {other}"),
    }
}
