use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current gameweek plus the next three.
pub const WINDOW_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: u32,
    // The instant this gameweek becomes the active one in the app.
    #[serde(rename = "app_switch_time", alias = "switchTime")]
    pub switch_time: DateTime<Utc>,
}

impl Gameweek {
    pub fn new(id: u32, switch_time: DateTime<Utc>) -> Self {
        Self { id, switch_time }
    }
}

/// Ascending by switch time, at most [`WINDOW_SIZE`] entries, unique ids.
/// Empty means "no data available".
pub type ScheduleWindow = Vec<Gameweek>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGameweek {
    pub id: u32,
    pub switch_time: DateTime<Utc>,
    pub is_current: bool,
}

impl RemoteGameweek {
    pub fn to_gameweek(&self) -> Gameweek {
        Gameweek::new(self.id, self.switch_time)
    }
}
