use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::AppStateError;
use crate::league_api::{LeagueLookup, Manager, sort_managers};
use crate::store::KeyValueStore;

pub const USER_LEAGUE_DATA_KEY: &str = "userLeagueData";
pub const USER_LEAGUES_KEY: &str = "userLeagues";
pub const SELECTED_LEAGUE_KEY: &str = "selectedLeague";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSummary {
    pub league_id: String,
    pub league_name: String,
}

/// A league the user follows. `manager` is set once they have picked one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub league_id: String,
    pub league_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<Manager>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managers: Vec<Manager>,
}

/// The active league and manager the home view is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeagueData {
    pub league_id: String,
    pub league_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    pub manager: Manager,
}

impl UserLeagueData {
    fn from_entry(entry: &LeagueEntry, manager: Manager) -> Self {
        Self {
            league_id: entry.league_id.clone(),
            league_name: entry.league_name.clone(),
            referral_code: entry.referral_code.clone(),
            manager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialRoute {
    LeagueInput,
    Home,
}

/// Typed access to the selected league, selected manager and followed
/// leagues. Every read and write of that state goes through here.
#[derive(Clone)]
pub struct AppStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl AppStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn initial_route(&self) -> InitialRoute {
        match self.user_league_data() {
            Ok(Some(_)) => InitialRoute::Home,
            Ok(None) => InitialRoute::LeagueInput,
            Err(err) => {
                error!(%err, "error checking persistent data");
                InitialRoute::LeagueInput
            }
        }
    }

    pub fn user_league_data(&self) -> Result<Option<UserLeagueData>, AppStateError> {
        self.read(USER_LEAGUE_DATA_KEY)
    }

    pub fn leagues(&self) -> Result<Vec<LeagueEntry>, AppStateError> {
        Ok(self.read(USER_LEAGUES_KEY)?.unwrap_or_default())
    }

    pub fn selected_league(&self) -> Result<Option<LeagueSummary>, AppStateError> {
        self.read(SELECTED_LEAGUE_KEY)
    }

    /// Follows a freshly looked-up league and makes it the selected one.
    pub fn add_league(&self, lookup: &LeagueLookup) -> Result<LeagueEntry, AppStateError> {
        let mut leagues = self.leagues()?;
        if leagues.iter().any(|l| l.league_id == lookup.league_id) {
            return Err(AppStateError::DuplicateLeague(lookup.league_id.clone()));
        }

        let mut managers = lookup.managers.clone();
        sort_managers(&mut managers);
        let entry = LeagueEntry {
            league_id: lookup.league_id.clone(),
            league_name: lookup.league_name.clone(),
            referral_code: lookup.referral_code.clone(),
            manager: None,
            managers,
        };
        leagues.push(entry.clone());
        self.write(USER_LEAGUES_KEY, &leagues)?;
        self.write(SELECTED_LEAGUE_KEY, &summary_of(&entry))?;
        info!(league_id = %entry.league_id, "league added");
        Ok(entry)
    }

    /// Picks a manager from the selected league's roster by id or by name.
    pub fn select_manager(&self, who: &str) -> Result<UserLeagueData, AppStateError> {
        let selected = self
            .selected_league()?
            .ok_or(AppStateError::NoLeagueSelected)?;
        let mut leagues = self.leagues()?;
        let Some(entry) = leagues
            .iter_mut()
            .find(|l| l.league_id == selected.league_id)
        else {
            return Err(AppStateError::UnknownLeague(selected.league_id));
        };

        let wanted = who.trim();
        let manager = entry
            .managers
            .iter()
            .find(|m| m.id == wanted)
            .or_else(|| {
                entry
                    .managers
                    .iter()
                    .find(|m| m.player_name.eq_ignore_ascii_case(wanted))
            })
            .cloned()
            .ok_or_else(|| AppStateError::UnknownManager(wanted.to_string()))?;

        entry.manager = Some(manager.clone());
        let user = UserLeagueData::from_entry(entry, manager);
        self.write(USER_LEAGUE_DATA_KEY, &user)?;
        self.write(USER_LEAGUES_KEY, &leagues)?;
        info!(
            league_id = %user.league_id,
            manager = %user.manager.player_name,
            "manager selected"
        );
        Ok(user)
    }

    /// Makes a followed league the selected one; restores its manager if one was picked.
    pub fn switch_league(&self, league_id: &str) -> Result<LeagueEntry, AppStateError> {
        let leagues = self.leagues()?;
        let Some(entry) = leagues.into_iter().find(|l| l.league_id == league_id) else {
            return Err(AppStateError::UnknownLeague(league_id.to_string()));
        };
        self.write(SELECTED_LEAGUE_KEY, &summary_of(&entry))?;
        match entry.manager.clone() {
            Some(manager) => {
                self.write(USER_LEAGUE_DATA_KEY, &UserLeagueData::from_entry(&entry, manager))?;
            }
            None => self.store.remove(USER_LEAGUE_DATA_KEY)?,
        }
        debug!(league_id, "switched league");
        Ok(entry)
    }

    /// Returns whether anything was removed.
    pub fn remove_league(&self, league_id: &str) -> Result<bool, AppStateError> {
        let mut leagues = self.leagues()?;
        let before = leagues.len();
        leagues.retain(|l| l.league_id != league_id);
        if leagues.len() == before {
            return Ok(false);
        }
        self.write(USER_LEAGUES_KEY, &leagues)?;

        if self
            .selected_league()?
            .is_some_and(|s| s.league_id == league_id)
        {
            self.store.remove(SELECTED_LEAGUE_KEY)?;
        }
        if self
            .user_league_data()?
            .is_some_and(|u| u.league_id == league_id)
        {
            self.store.remove(USER_LEAGUE_DATA_KEY)?;
        }
        info!(league_id, "league removed");
        Ok(true)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppStateError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppStateError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)?;
        Ok(())
    }
}

fn summary_of(entry: &LeagueEntry) -> LeagueSummary {
    LeagueSummary {
        league_id: entry.league_id.clone(),
        league_name: entry.league_name.clone(),
    }
}
