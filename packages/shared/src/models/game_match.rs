use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A choice a participant can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }
}

/// A move as recorded on a match. `Forfeit` is written when a turn timer
/// expires before the participant chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
    Forfeit,
}

/// Move handed to an opponent who had not chosen when the other side timed out.
pub const DEFAULT_MOVE: Move = Move::Rock;

impl Move {
    pub fn choice(self) -> Option<Choice> {
        match self {
            Move::Rock => Some(Choice::Rock),
            Move::Paper => Some(Choice::Paper),
            Move::Scissors => Some(Choice::Scissors),
            Move::Forfeit => None,
        }
    }

    pub fn is_forfeit(self) -> bool {
        self == Move::Forfeit
    }
}

impl From<Choice> for Move {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Rock => Move::Rock,
            Choice::Paper => Move::Paper,
            Choice::Scissors => Move::Scissors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Active,
    Resolved,
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Resolved | MatchStatus::Cancelled)
    }
}

/// Result of a match from participant A's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PlayerAWins,
    PlayerBWins,
    Tie,
}

impl Outcome {
    /// The same result seen from the other seat.
    pub fn flip(self) -> Self {
        match self {
            Outcome::PlayerAWins => Outcome::PlayerBWins,
            Outcome::PlayerBWins => Outcome::PlayerAWins,
            Outcome::Tie => Outcome::Tie,
        }
    }

    /// Fixed lookup: rock beats scissors, scissors beats paper, paper beats
    /// rock. A forfeit loses to any real move; two forfeits tie.
    pub fn from_moves(move_a: Move, move_b: Move) -> Self {
        match (move_a.choice(), move_b.choice()) {
            (None, None) => Outcome::Tie,
            (None, Some(_)) => Outcome::PlayerBWins,
            (Some(_), None) => Outcome::PlayerAWins,
            (Some(a), Some(b)) if a == b => Outcome::Tie,
            (Some(a), Some(b)) if a.beats(b) => Outcome::PlayerAWins,
            (Some(_), Some(_)) => Outcome::PlayerBWins,
        }
    }
}

/// Seat of a participant within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

pub fn match_room(match_id: &str) -> String {
    format!("match_{}", match_id)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub match_id: String,
    pub participant_a_id: String,
    pub participant_b_id: Option<String>,
    pub move_a: Option<Move>,
    pub move_b: Option<Move>,
    /// `None` means tie once the match is resolved; check `status` first.
    pub winner_id: Option<String>,
    pub status: MatchStatus,
    pub quickplay: bool,
    pub delta_a: i32,
    pub delta_b: i32,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rematch_id: Option<String>,
}

impl Match {
    pub fn new(participant_a_id: &str, quickplay: bool) -> Self {
        Match {
            match_id: Uuid::new_v4().to_string(),
            participant_a_id: participant_a_id.to_string(),
            participant_b_id: None,
            move_a: None,
            move_b: None,
            winner_id: None,
            status: MatchStatus::Waiting,
            quickplay,
            delta_a: 0,
            delta_b: 0,
            created_at: Utc::now(),
            resolved_at: None,
            rematch_id: None,
        }
    }

    /// A match that starts with both seats filled, used for rematches.
    pub fn new_active(participant_a_id: &str, participant_b_id: &str) -> Self {
        let mut game_match = Match::new(participant_a_id, false);
        game_match.participant_b_id = Some(participant_b_id.to_string());
        game_match.status = MatchStatus::Active;
        game_match
    }

    pub fn room(&self) -> String {
        match_room(&self.match_id)
    }

    pub fn side_of(&self, participant_id: &str) -> Option<Side> {
        if self.participant_a_id == participant_id {
            Some(Side::A)
        } else if self.participant_b_id.as_deref() == Some(participant_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn is_participant(&self, participant_id: &str) -> bool {
        self.side_of(participant_id).is_some()
    }

    pub fn participant_id(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => Some(self.participant_a_id.as_str()),
            Side::B => self.participant_b_id.as_deref(),
        }
    }

    pub fn opponent_of(&self, participant_id: &str) -> Option<&str> {
        self.side_of(participant_id)
            .and_then(|side| self.participant_id(side.other()))
    }

    pub fn move_of(&self, side: Side) -> Option<Move> {
        match side {
            Side::A => self.move_a,
            Side::B => self.move_b,
        }
    }

    pub fn set_move(&mut self, side: Side, mv: Move) {
        match side {
            Side::A => self.move_a = Some(mv),
            Side::B => self.move_b = Some(mv),
        }
    }

    pub fn both_moves_recorded(&self) -> bool {
        self.move_a.is_some() && self.move_b.is_some()
    }

    /// Participant ids of both seats that still owe a move.
    pub fn pending_participants(&self) -> Vec<String> {
        [Side::A, Side::B]
            .into_iter()
            .filter(|side| self.move_of(*side).is_none())
            .filter_map(|side| self.participant_id(side).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Move::Rock, Move::Rock, Outcome::Tie ; "rock vs rock")]
    #[test_case(Move::Rock, Move::Paper, Outcome::PlayerBWins ; "rock vs paper")]
    #[test_case(Move::Rock, Move::Scissors, Outcome::PlayerAWins ; "rock vs scissors")]
    #[test_case(Move::Paper, Move::Rock, Outcome::PlayerAWins ; "paper vs rock")]
    #[test_case(Move::Paper, Move::Paper, Outcome::Tie ; "paper vs paper")]
    #[test_case(Move::Paper, Move::Scissors, Outcome::PlayerBWins ; "paper vs scissors")]
    #[test_case(Move::Scissors, Move::Rock, Outcome::PlayerBWins ; "scissors vs rock")]
    #[test_case(Move::Scissors, Move::Paper, Outcome::PlayerAWins ; "scissors vs paper")]
    #[test_case(Move::Scissors, Move::Scissors, Outcome::Tie ; "scissors vs scissors")]
    fn test_outcome_table(move_a: Move, move_b: Move, expected: Outcome) {
        assert_eq!(Outcome::from_moves(move_a, move_b), expected);
        assert_eq!(Outcome::from_moves(move_b, move_a), expected.flip());
    }

    #[test_case(Move::Rock ; "against rock")]
    #[test_case(Move::Paper ; "against paper")]
    #[test_case(Move::Scissors ; "against scissors")]
    fn test_forfeit_loses_to_real_move(real: Move) {
        assert_eq!(
            Outcome::from_moves(Move::Forfeit, real),
            Outcome::PlayerBWins
        );
        assert_eq!(
            Outcome::from_moves(real, Move::Forfeit),
            Outcome::PlayerAWins
        );
    }

    #[test]
    fn test_double_forfeit_ties() {
        assert_eq!(
            Outcome::from_moves(Move::Forfeit, Move::Forfeit),
            Outcome::Tie
        );
    }

    #[test]
    fn test_new_match_is_waiting() {
        let game_match = Match::new("player-a", true);

        assert_eq!(game_match.status, MatchStatus::Waiting);
        assert!(game_match.quickplay);
        assert!(game_match.participant_b_id.is_none());
        assert!(game_match.move_a.is_none());
        assert!(game_match.move_b.is_none());
        assert!(game_match.resolved_at.is_none());
        assert_eq!(game_match.room(), format!("match_{}", game_match.match_id));
    }

    #[test]
    fn test_new_active_match_has_both_seats() {
        let game_match = Match::new_active("player-a", "player-b");

        assert_eq!(game_match.status, MatchStatus::Active);
        assert!(!game_match.quickplay);
        assert_eq!(game_match.participant_b_id.as_deref(), Some("player-b"));
        assert_eq!(
            game_match.pending_participants(),
            vec!["player-a".to_string(), "player-b".to_string()]
        );
    }

    #[test]
    fn test_match_ids_are_unique() {
        let first = Match::new("player-a", true);
        let second = Match::new("player-a", true);

        assert_ne!(first.match_id, second.match_id);
    }

    #[test]
    fn test_seats_and_moves() {
        let mut game_match = Match::new_active("player-a", "player-b");

        assert_eq!(game_match.side_of("player-a"), Some(Side::A));
        assert_eq!(game_match.side_of("player-b"), Some(Side::B));
        assert_eq!(game_match.side_of("stranger"), None);
        assert_eq!(game_match.opponent_of("player-a"), Some("player-b"));
        assert_eq!(game_match.opponent_of("stranger"), None);

        game_match.set_move(Side::B, Move::Paper);
        assert_eq!(game_match.move_of(Side::B), Some(Move::Paper));
        assert!(!game_match.both_moves_recorded());
        assert_eq!(game_match.pending_participants(), vec!["player-a".to_string()]);

        game_match.set_move(Side::A, Move::Forfeit);
        assert!(game_match.both_moves_recorded());
        assert!(game_match.pending_participants().is_empty());
    }

    #[test]
    fn test_move_serialization() {
        assert_eq!(serde_json::to_string(&Move::Forfeit).unwrap(), "\"forfeit\"");
        assert_eq!(serde_json::to_string(&Move::Rock).unwrap(), "\"rock\"");

        let choice: Choice = serde_json::from_str("\"scissors\"").unwrap();
        assert_eq!(choice, Choice::Scissors);
        assert!(serde_json::from_str::<Choice>("\"forfeit\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!MatchStatus::Waiting.is_terminal());
        assert!(!MatchStatus::Active.is_terminal());
        assert!(MatchStatus::Resolved.is_terminal());
        assert!(MatchStatus::Cancelled.is_terminal());
    }
}
