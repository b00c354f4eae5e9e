use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ActionError, ConfigError, PieceKind};

/// Default number of upcoming pieces guaranteed to be visible.
pub const DEFAULT_LOOKAHEAD: usize = 3;

/// Produces upcoming piece kinds with the bag randomizer and owns the hold slot.
///
/// # Bag system
///
/// 1. A "bag" holds every configured kind once (all seven by default)
/// 2. The bag is shuffled with Fisher-Yates
/// 3. Pieces are drawn in order
/// 4. A new shuffled bag is appended whenever `lookahead` or fewer remain
///
/// No kind repeats before every other kind of the bag has appeared.
///
/// # Hold
///
/// - The first hold stores the current kind and draws from the queue
/// - Later holds swap the current kind with the held one
/// - Only one hold is allowed between two locks ([`Self::reset_hold`])
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceKind, PieceSequencer, PieceSeed};
///
/// let mut sequencer = PieceSequencer::standard(PieceSeed::from_bytes([7; 16]));
/// let current = sequencer.next();
///
/// let swap = sequencer.hold(current).unwrap();
/// assert_eq!(swap.held, current);
/// assert!(sequencer.hold(swap.active).is_err());
///
/// sequencer.reset_hold();
/// assert_eq!(sequencer.hold(swap.active).unwrap().active, current);
/// ```
#[derive(Debug, Clone)]
pub struct PieceSequencer {
    rng: Pcg32,
    bag: Vec<PieceKind>,
    lookahead: usize,
    queue: VecDeque<PieceKind>,
    held: Option<PieceKind>,
    can_hold: bool,
}

/// Result of a successful hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSwap {
    /// Kind that becomes the active piece.
    pub active: PieceKind,
    /// Kind now stored in the hold slot.
    pub held: PieceKind,
    /// Whether `active` was drawn from the queue (the slot was empty).
    pub drew_from_queue: bool,
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed serialized as a 32-character hex string. The same seed
/// always produces the same piece sequence.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceSequencer, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut a = PieceSequencer::standard(seed);
/// let mut b = PieceSequencer::standard(seed);
/// assert_eq!(a.next(), b.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for PieceSeed {
    type Err = String;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            ));
        }
        let num = u128::from_str_radix(hex_str, 16)
            .map_err(|e| format!("invalid hex: {hex_str} ({e})"))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl std::fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceSequencer {
    /// Creates a sequencer drawing from all seven kinds with the default lookahead.
    #[must_use]
    pub fn standard(seed: PieceSeed) -> Self {
        Self::build(PieceKind::ALL.to_vec(), DEFAULT_LOOKAHEAD, seed)
    }

    /// Creates a sequencer over an arbitrary bag.
    ///
    /// The bag may repeat kinds or contain a single kind (useful for rigged
    /// sequences). It must not be empty, and `lookahead` must be at least 1.
    pub fn new(bag: &[PieceKind], lookahead: usize, seed: PieceSeed) -> Result<Self, ConfigError> {
        if bag.is_empty() {
            return Err(ConfigError::EmptyBag);
        }
        if lookahead == 0 {
            return Err(ConfigError::ZeroLookahead);
        }
        Ok(Self::build(bag.to_vec(), lookahead, seed))
    }

    fn build(bag: Vec<PieceKind>, lookahead: usize, seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(lookahead + bag.len() * 2),
            bag,
            lookahead,
            held: None,
            can_hold: true,
        };
        this.refill();
        this
    }

    /// Appends shuffled bags until more than `lookahead` kinds are queued.
    fn refill(&mut self) {
        while self.queue.len() <= self.lookahead {
            let mut new_bag = self.bag.clone();
            new_bag.shuffle(&mut self.rng);
            self.queue.extend(new_bag);
        }
    }

    /// Draws the next kind.
    ///
    /// At least `lookahead` kinds remain visible after this returns.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (should never happen with proper refill logic).
    #[expect(clippy::should_implement_trait)]
    pub fn next(&mut self) -> PieceKind {
        let kind = self
            .queue
            .pop_front()
            .expect("piece queue should never be empty");
        self.refill();
        kind
    }

    /// Returns an iterator over every queued kind, front first.
    pub fn upcoming(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    /// Returns the next `lookahead` kinds.
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.upcoming().take(self.lookahead)
    }

    #[must_use]
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    #[must_use]
    pub fn held(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    /// Returns what kind would become active if hold is used now.
    ///
    /// - If a kind is held: the held kind
    /// - Otherwise: the front of the queue
    #[must_use]
    pub fn peek_hold_result(&self) -> PieceKind {
        self.held.unwrap_or_else(|| self.queue[0])
    }

    /// Stores `current` in the hold slot.
    ///
    /// Fails without changing anything when hold was already used since the
    /// last [`Self::reset_hold`].
    pub fn hold(&mut self, current: PieceKind) -> Result<HoldSwap, ActionError> {
        if !self.can_hold {
            return Err(ActionError::HoldUsed);
        }
        let previous = self.held.replace(current);
        let active = previous.unwrap_or_else(|| self.next());
        self.can_hold = false;
        Ok(HoldSwap {
            active,
            held: current,
            drew_from_queue: previous.is_none(),
        })
    }

    /// Re-enables hold. Called once per lock.
    pub fn reset_hold(&mut self) {
        self.can_hold = true;
    }
}
