/*!
 * Conflict Rule
 *
 * Pure predicate deciding whether two paths may be occupied at the same time,
 * and the per-path "forbids" sets the intersection gate derives from it.
 */

use super::direction::Path;
use serde::{Deserialize, Serialize};

/// Whether vehicles on `p` and `q` may collide
///
/// - Same approach: never (they queue behind each other)
/// - Opposite directions along one route: never
/// - Either is a right turn and they leave by different exits: never
/// - Anything else: conflict
#[inline]
#[must_use]
pub fn conflicts(p: Path, q: Path) -> bool {
    if p.origin == q.origin {
        return false;
    }
    if q == p.reverse() {
        return false;
    }
    if p.destination != q.destination && (p.is_right_turn() || q.is_right_turn()) {
        return false;
    }
    true
}

/// How an admitted vehicle blocks other paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Every conflicting path is blocked, U-turns included
    #[default]
    Symmetric,
    /// U-turn paths are never blocked by other traffic, while a vehicle making
    /// a U-turn still blocks the paths it conflicts with
    Directional,
}

impl ConflictPolicy {
    /// Whether admitting a vehicle on `entering` must block `other`
    #[inline]
    #[must_use]
    pub fn forbids(self, entering: Path, other: Path) -> bool {
        match self {
            ConflictPolicy::Symmetric => conflicts(entering, other),
            ConflictPolicy::Directional => !other.is_u_turn() && conflicts(entering, other),
        }
    }

    /// Bitmask over path indices of everything `entering` blocks
    #[must_use]
    pub fn forbidden_mask(self, entering: Path) -> u16 {
        Path::all()
            .filter(|other| self.forbids(entering, *other))
            .fold(0u16, |mask, other| mask | (1 << other.index()))
    }

    /// Forbidden masks for all 16 paths, indexed by [`Path::index`]
    #[must_use]
    pub fn table(self) -> ConflictTable {
        let mut masks = [0u16; Path::COUNT];
        for path in Path::all() {
            masks[path.index()] = self.forbidden_mask(path);
        }
        ConflictTable {
            policy: self,
            masks,
        }
    }

    /// Parse the configuration spelling of a policy
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "symmetric" => Some(ConflictPolicy::Symmetric),
            "directional" => Some(ConflictPolicy::Directional),
            _ => None,
        }
    }
}

/// Precomputed forbids-sets for one policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictTable {
    policy: ConflictPolicy,
    masks: [u16; Path::COUNT],
}

impl ConflictTable {
    #[inline]
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    #[inline(always)]
    pub fn mask(&self, entering: Path) -> u16 {
        self.masks[entering.index()]
    }

    /// Paths blocked while a vehicle on `entering` is inside
    pub fn forbidden(&self, entering: Path) -> impl Iterator<Item = Path> {
        let mask = self.mask(entering);
        (0..Path::COUNT)
            .filter(move |i| mask & (1 << i) != 0)
            .map(Path::from_index)
    }
}
