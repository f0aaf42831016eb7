use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Players are identified by their (unique) display name
pub type PlayerName = String;

/// Total number of cells on the cup board
pub const CUP_COUNT: usize = 20;
/// Cells per team half (Team 1: 0..10, Team 2: 10..20)
pub const CUPS_PER_TEAM: usize = 10;
/// Players per team
pub const TEAM_SIZE: usize = 2;

/// The cup board: exactly [`CUP_COUNT`] cells, `true` = cup still active.
/// Length is enforced at the snapshot decode boundary.
pub type CupBoard = Vec<bool>;

/// A fresh board with every cup active
pub fn fresh_board() -> CupBoard {
    vec![true; CUP_COUNT]
}

/// Closed set of question categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Geographie,
    Allgemeinwissen,
    #[serde(rename = "Fußball")]
    Fussball,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Geographie,
        Category::Allgemeinwissen,
        Category::Fussball,
    ];

    /// Parse a category from its display label (case-sensitive, as on the wire)
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Geographie" => Some(Category::Geographie),
            "Allgemeinwissen" => Some(Category::Allgemeinwissen),
            "Fußball" => Some(Category::Fussball),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Geographie => "Geographie",
            Category::Allgemeinwissen => "Allgemeinwissen",
            Category::Fussball => "Fußball",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One record from the question bank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub question: String,
    pub answer: String,
    pub category: Category,
}

/// Per-player counters, persisted under `games/{id}/stats/{name}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub correct: u32,
    pub wrong: u32,
    pub games_won: u32,
}

/// One of the two board halves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn number(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// The board half owned by this team
    pub fn cells(self) -> Range<usize> {
        match self {
            Team::One => 0..CUPS_PER_TEAM,
            Team::Two => CUPS_PER_TEAM..CUP_COUNT,
        }
    }

    /// Which team a board cell belongs to
    pub fn of_cell(index: usize) -> Team {
        if index < CUPS_PER_TEAM {
            Team::One
        } else {
            Team::Two
        }
    }
}

/// Two disjoint pairs drawn from the roster at "generate teams" time
#[derive(Debug, Clone, PartialEq)]
pub struct Teams {
    pub first: Vec<PlayerName>,
    pub second: Vec<PlayerName>,
}

impl Teams {
    pub fn members(&self, team: Team) -> &[PlayerName] {
        match team {
            Team::One => &self.first,
            Team::Two => &self.second,
        }
    }

    /// Which team a player belongs to, if any
    pub fn team_of(&self, name: &str) -> Option<Team> {
        if self.first.iter().any(|n| n == name) {
            Some(Team::One)
        } else if self.second.iter().any(|n| n == name) {
            Some(Team::Two)
        } else {
            None
        }
    }
}

/// The in-flight question attached to a cup hit
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQuestion {
    pub cup_index: usize,
    pub question: Question,
}

/// User-visible outcome message after an answer or team generation
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Correct,
    Wrong,
    TeamWins(Team),
    TeamStarts(Team, Vec<PlayerName>),
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Correct => write!(f, "✅ Richtig!"),
            Feedback::Wrong => write!(f, "❌ Falsch!"),
            Feedback::TeamWins(team) => write!(f, "🏆 Team {} gewinnt!", team.number()),
            Feedback::TeamStarts(team, members) => {
                write!(f, "Team {} beginnt: {}", team.number(), members.join(", "))
            }
        }
    }
}

/// Transient join notification, drained FIFO by the session client
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    /// ISO8601 timestamp of when the notification was enqueued
    pub at: String,
}

impl Notification {
    pub fn joined(name: &str) -> Self {
        Self {
            message: format!("{} ist beigetreten", name),
            at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Result of decoding an untrusted store payload.
///
/// The store's payload shape is never trusted implicitly: a missing node
/// decodes to `Absent`, anything that fails to deserialize to `Malformed`.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Present(T),
    Absent,
    Malformed,
}

/// Decode a snapshot value into a typed shape
pub fn decode<T: serde::de::DeserializeOwned>(value: &serde_json::Value) -> Decoded<T> {
    if value.is_null() {
        return Decoded::Absent;
    }
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Decoded::Present(decoded),
        Err(_) => Decoded::Malformed,
    }
}

/// Decode a cup board snapshot, enforcing the fixed board size
pub fn decode_cups(value: &serde_json::Value) -> Decoded<CupBoard> {
    match decode::<CupBoard>(value) {
        Decoded::Present(cups) if cups.len() == CUP_COUNT => Decoded::Present(cups),
        Decoded::Present(_) => Decoded::Malformed,
        other => other,
    }
}
