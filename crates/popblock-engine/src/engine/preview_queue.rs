use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    ParseSeedError,
    core::shape::{PieceKind, ShapeCatalog},
};

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the queue's random number generator, written as 32
/// hexadecimal digits. The same seed always yields the same piece sequence,
/// which makes sessions reproducible in tests and headless runs.
///
/// # Example
///
/// ```
/// use popblock_engine::PieceSeed;
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let parsed: PieceSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSeedError {
            input: s.to_owned(),
        };
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| err())?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
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

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Fixed-length queue of upcoming piece kinds.
///
/// Each kind is drawn uniformly and independently from the catalog: repeats
/// are allowed and there is no bag. Popping a kind for spawning appends a
/// fresh one, so the length never changes.
///
/// # Example
///
/// ```
/// use popblock_engine::{PieceSeed, PreviewQueue};
///
/// let seed = PieceSeed::from_bytes([7; 16]);
/// let mut queue = PreviewQueue::with_seed(10, seed);
/// let upcoming: Vec<_> = queue.visible(4).collect();
///
/// assert_eq!(queue.pop_next(), upcoming[0]);
/// assert_eq!(queue.len(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct PreviewQueue {
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
    depth: usize,
}

impl PreviewQueue {
    /// Creates a queue of `depth` kinds seeded from the OS random source.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self::with_seed(depth, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    ///
    /// A `depth` of zero is raised to one.
    #[must_use]
    pub fn with_seed(depth: usize, seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(depth.max(1) + 1),
            depth: depth.max(1),
        };
        this.refill();
        this
    }

    fn draw(&mut self) -> PieceKind {
        ShapeCatalog::random_kind(&mut self.rng)
    }

    /// Discards the current contents and draws `depth` fresh kinds.
    ///
    /// The random stream continues where it left off.
    pub fn refill(&mut self) {
        self.queue.clear();
        while self.queue.len() < self.depth {
            let kind = self.draw();
            self.queue.push_back(kind);
        }
    }

    /// Removes the front kind and appends a new random one.
    pub fn pop_next(&mut self) -> PieceKind {
        let kind = self.draw();
        self.queue.push_back(kind);
        let next = self.queue.pop_front().unwrap_or(kind);
        debug_assert_eq!(self.queue.len(), self.depth);
        next
    }

    /// Returns the first `n` upcoming kinds, front first.
    pub fn visible(&self, n: usize) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied().take(n)
    }

    /// Returns every queued kind, front first.
    pub fn iter(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    #[must_use]
    pub fn peek(&self) -> Option<PieceKind> {
        self.queue.front().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
