/// Sky primitives: catalog entities, stars, edges and rounds.
/// Positions are percent-of-field fractions; the renderer maps them to cells.

use std::fmt;

/// Catalog category an entity belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    Stars,
    Constellations,
    Galaxies,
}

impl Category {
    pub fn from_name(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "stars" | "star" => Some(Category::Stars),
            "constellations" | "constellation" => Some(Category::Constellations),
            "galaxies" | "galaxy" => Some(Category::Galaxies),
            _ => None,
        }
    }

    /// Singular noun used in summaries ("constellation", "galaxy").
    pub fn singular(self) -> &'static str {
        match self {
            Category::Stars => "star",
            Category::Constellations => "constellation",
            Category::Galaxies => "galaxy",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Category::Stars => "stars",
            Category::Constellations => "constellations",
            Category::Galaxies => "galaxies",
        }
    }
}

/// A named catalog entry. Used only as a round label, never mutated.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub description: Option<String>,
}

impl Entity {
    pub fn new(id: &str, name: &str, category: Category) -> Self {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            category,
            description: None,
        }
    }
}

/// Index of a star within its round (0-based, dense).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StarId(pub usize);

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "star-{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Star {
    pub id: StarId,
    pub x: f32,
    pub y: f32,
}

/// Unordered pair of distinct stars.
///
/// Equality and hashing use the sorted endpoints only, so `{a,b}` and
/// `{b,a}` are the same edge. `from`/`to` keep the click order.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    lo: StarId,
    hi: StarId,
    pub from: StarId,
    pub to: StarId,
}

impl Edge {
    /// Returns None for a self-loop.
    pub fn new(from: StarId, to: StarId) -> Option<Edge> {
        if from == to {
            return None;
        }
        Some(Edge {
            lo: from.min(to),
            hi: from.max(to),
            from,
            to,
        })
    }

    pub fn endpoints(&self) -> (StarId, StarId) {
        (self.lo, self.hi)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.lo == other.lo && self.hi == other.hi
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lo.hash(state);
        self.hi.hash(state);
    }
}

/// One puzzle instance. `target` is the hidden ground truth and is fixed
/// for the lifetime of the round.
#[derive(Clone, Debug)]
pub struct Round {
    pub entity: Entity,
    pub stars: Vec<Star>,
    target: Vec<Edge>,
}

impl Round {
    /// Build a round, dropping any target edge that references a star
    /// outside `stars` or repeats an earlier edge.
    pub fn new(entity: Entity, stars: Vec<Star>, target: Vec<Edge>) -> Self {
        let mut kept: Vec<Edge> = Vec::with_capacity(target.len());
        for e in target {
            let (a, b) = e.endpoints();
            if b.0 < stars.len() && a.0 < stars.len() && !kept.contains(&e) {
                kept.push(e);
            }
        }
        Round { entity, stars, target: kept }
    }

    pub fn target(&self) -> &[Edge] {
        &self.target
    }

    pub fn has_star(&self, id: StarId) -> bool {
        id.0 < self.stars.len()
    }

    pub fn is_target(&self, edge: &Edge) -> bool {
        self.target.contains(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn stars(n: usize) -> Vec<Star> {
        (0..n).map(|i| Star { id: StarId(i), x: 50.0, y: 50.0 }).collect()
    }

    #[test]
    fn self_loop_is_not_an_edge() {
        assert!(Edge::new(StarId(3), StarId(3)).is_none());
    }

    #[test]
    fn edge_keeps_click_order_for_drawing() {
        let e = Edge::new(StarId(4), StarId(1)).unwrap();
        assert_eq!(e.from, StarId(4));
        assert_eq!(e.to, StarId(1));
        assert_eq!(e.endpoints(), (StarId(1), StarId(4)));
    }

    #[test]
    fn round_drops_foreign_and_repeated_targets() {
        let target = vec![
            Edge::new(StarId(0), StarId(1)).unwrap(),
            Edge::new(StarId(1), StarId(0)).unwrap(),
            Edge::new(StarId(2), StarId(9)).unwrap(),
        ];
        let r = Round::new(Entity::new("orion", "Orion", Category::Constellations), stars(3), target);
        assert_eq!(r.target().len(), 1);
        assert!(r.has_star(StarId(2)));
        assert!(!r.has_star(StarId(3)));
    }

    #[test]
    fn category_names() {
        assert_eq!(Category::from_name(" Galaxy "), Some(Category::Galaxies));
        assert_eq!(Category::from_name("nebulae"), None);
        assert_eq!(Category::Constellations.singular(), "constellation");
    }

    proptest! {
        #[test]
        fn edge_equality_is_symmetric(a in 0usize..64, b in 0usize..64) {
            prop_assume!(a != b);
            let ab = Edge::new(StarId(a), StarId(b)).unwrap();
            let ba = Edge::new(StarId(b), StarId(a)).unwrap();
            prop_assert_eq!(ab, ba);
            let set: HashSet<Edge> = [ab, ba].into_iter().collect();
            prop_assert_eq!(set.len(), 1);
        }
    }
}
