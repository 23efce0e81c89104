use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Type alias for chip amounts. All stacks, bets and pots are whole chips.
///
/// Signed so that arithmetic on deltas stays in one type; every persisted
/// value is non-negative by invariant.
pub type Chips = i64;

pub type GameId = Uuid;
pub type PlayerId = Uuid;
pub type HandId = Uuid;

/// Seat position within a game. Assigned once at seating, immutable after.
pub type SeatIndex = i32;

/// A betting street, plus the terminal showdown state.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// The street that follows this one. Showdown is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Preflop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Showdown => Self::Showdown,
        }
    }

    pub fn is_betting(self) -> bool {
        !matches!(self, Self::Showdown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preflop" => Some(Self::Preflop),
            "flop" => Some(Self::Flop),
            "turn" => Some(Self::Turn),
            "river" => Some(Self::River),
            "showdown" => Some(Self::Showdown),
            _ => None,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player action, both on the wire and in the `players.action` column.
///
/// `None` is the empty string: the seat has not acted on the current street.
/// `Raise` and `ReRaise` are processed identically; the distinction is kept
/// for the log and the clients.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "bet")]
    Bet,
    #[serde(rename = "fold")]
    Fold,
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "check")]
    Check,
    #[serde(rename = "raise")]
    Raise,
    #[serde(rename = "re-raise")]
    ReRaise,
    #[serde(rename = "all-in")]
    AllIn,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Bet => "bet",
            Self::Fold => "fold",
            Self::Call => "call",
            Self::Check => "check",
            Self::Raise => "raise",
            Self::ReRaise => "re-raise",
            Self::AllIn => "all-in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::None),
            "bet" => Some(Self::Bet),
            "fold" => Some(Self::Fold),
            "call" => Some(Self::Call),
            "check" => Some(Self::Check),
            "raise" => Some(Self::Raise),
            "re-raise" => Some(Self::ReRaise),
            "all-in" => Some(Self::AllIn),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tournament session. At most one game is active (`end_time` null).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Game {
    pub id: GameId,
    /// Seconds per blind level.
    pub blind_time: i64,
    /// Current blind level, 1-based.
    pub level: i32,
    /// Starting stack handed to every seat (and to rebuys).
    pub chips: Chips,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Game {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One row of the blind schedule, keyed by level (not by game).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameBlind {
    pub game_level: i32,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub ante: Chips,
}

/// A seat occupant within a game.
///
/// Seat order is fixed at seating time (`seat`, ascending) and never changes
/// for the lifetime of the game; busted seats keep their slot so rotation
/// accounting stays stable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub game_id: GameId,
    pub name: String,
    /// Current stack.
    pub amount: Chips,
    pub is_online: bool,
    /// Still in the tournament. Cleared on elimination, restored by rebuy.
    pub is_active: bool,
    /// Last action on the current street (`None` = has not acted).
    pub action: ActionKind,
    /// Total chips committed on the current street.
    pub action_amount: Chips,
    /// Total chips committed over the whole hand.
    pub all_bet_sum: Chips,
    /// The hand at which this seat busted, if it has.
    pub inactive_time_hand_id: Option<HandId>,
    pub seat: SeatIndex,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Contesting the pot: active and not folded.
    pub fn is_live(&self) -> bool {
        self.is_active && self.action != ActionKind::Fold
    }

    /// Live with chips behind, i.e. still able to bet.
    pub fn is_live_not_all_in(&self) -> bool {
        self.is_live() && self.action != ActionKind::AllIn
    }
}

/// One dealt hand.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Hand {
    pub id: HandId,
    pub game_id: GameId,
    pub level: i32,
    pub dealer: PlayerId,
    /// Null when the small blind is dead (the seat busted last hand) or
    /// cannot be seated.
    pub small_blind: Option<PlayerId>,
    pub big_blind: PlayerId,
    pub current_player_turn_id: PlayerId,
    pub pot_amount: Chips,
    pub ante: Chips,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    /// Chips paid by the most recent caller.
    pub last_call_amount: Chips,
    /// Largest per-player commitment on the current street.
    pub current_max_bet: Chips,
    /// Size of the last full raise increment; governs the minimum raise.
    pub last_raise_amount: Chips,
    /// `action_order` of the last full bet or raise on the current street.
    /// A player whose last voluntary action is at or past this order may
    /// not raise again until a new full raise arrives.
    pub last_raise_order: Option<i64>,
    pub current_round: Street,
    /// Set when a street has just been advanced and no actor has moved yet,
    /// so the next-actor scan anchors at the dealer instead of the last
    /// actor. Cleared once an actor is chosen within the street.
    pub is_changed_current_round: bool,
}

impl Hand {
    pub fn is_complete(&self) -> bool {
        self.current_round == Street::Showdown
    }

    /// The minimum total a raise must reach on the current street.
    pub fn min_raise_target(&self) -> Chips {
        self.current_max_bet + self.last_raise_amount.max(self.big_blind_amount)
    }

    /// Number of synthesized blind posts at the head of the preflop log.
    pub fn forced_post_count(&self) -> i64 {
        1 + i64::from(self.small_blind.is_some())
    }
}

/// Append-only action log row. Ground truth for per-street totals.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HandAction {
    pub id: Uuid,
    pub hand_id: HandId,
    pub player_id: PlayerId,
    pub round: Street,
    /// Monotonic per hand, 1-based.
    pub betting_round: i64,
    /// Monotonic per hand, 1-based, gapless.
    pub action_order: i64,
    pub action_type: ActionKind,
    pub bet_amount: Chips,
    pub created_at: DateTime<Utc>,
}

impl HandAction {
    /// Whether this log entry was a player's own decision, as opposed to a
    /// synthesized blind post at the head of the preflop log.
    pub fn is_voluntary(&self, hand: &Hand) -> bool {
        self.round != Street::Preflop || self.action_order > hand.forced_post_count()
    }
}

/// The legal-action set for the player on turn.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionChoices {
    pub is_can_fold: bool,
    pub is_can_call: bool,
    pub is_can_check: bool,
    pub is_can_bet: bool,
    pub is_can_raise: bool,
    pub is_can_re_raise: bool,
    pub is_can_all_in: bool,
    pub bet_min_amount: Chips,
    pub raise_min_amount: Chips,
    pub all_in_amount: Chips,
}

/// A winner share supplied by the caller at hand end. Not validated against
/// the pot; showdown evaluation happens outside the core.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Winner {
    pub id: PlayerId,
    pub amount: Chips,
}

/// The state returned to clients after every command.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub players: Vec<Player>,
    pub hand: Hand,
    pub level: i32,
    pub blind_time: i64,
    pub player_actions: ActionChoices,
}
