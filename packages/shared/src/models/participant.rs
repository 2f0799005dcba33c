use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rating assigned to every participant on registration.
pub const DEFAULT_RATING: i32 = 1200;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Participant {
    pub id: String,
    pub username: String,
    pub rating: i32,
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_tied: u32,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: &str, username: &str) -> Self {
        Participant {
            id: id.to_string(),
            username: username.to_string(),
            rating: DEFAULT_RATING,
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            games_tied: 0,
            created_at: Utc::now(),
        }
    }

    /// Percentage of decided games won, rounded to one decimal place.
    /// Ties are left out of the denominator.
    pub fn win_rate(&self) -> f64 {
        let decided = self.games_won + self.games_lost;
        if decided == 0 {
            return 0.0;
        }
        let rate = f64::from(self.games_won) / f64::from(decided) * 100.0;
        (rate * 10.0).round() / 10.0
    }
}
