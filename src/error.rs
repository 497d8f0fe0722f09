use reqwest::StatusCode;

/// Failures inside the gameweek core. None of these reach the UI; they are
/// logged and degrade to "no data" or "keep what's cached".
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule request failed: {0}")]
    NetworkFailure(String),

    #[error("malformed schedule response: {0}")]
    MalformedResponse(String),

    #[error("stored schedule unreadable: {0}")]
    DeserializationFailure(#[from] serde_json::Error),

    #[error("no gameweek flagged current in schedule")]
    NoCurrentMarker,
}

impl From<reqwest::Error> for ScheduleError {
    fn from(err: reqwest::Error) -> Self {
        ScheduleError::NetworkFailure(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store file unreadable: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid league id {0:?}: expected 5-7 digits")]
    InvalidLeagueId(String),

    #[error("league {0} does not exist")]
    LeagueNotFound(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("stored app state unreadable: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("league {0} has already been added")]
    DuplicateLeague(String),

    #[error("no league selected")]
    NoLeagueSelected,

    #[error("manager {0:?} is not in the league roster")]
    UnknownManager(String),

    #[error("league {0} is not in the saved league list")]
    UnknownLeague(String),
}
