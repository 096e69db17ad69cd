use serde::{Deserialize, Serialize};

/// Normalizes a creature identifier the way every lookup and comparison expects it.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reference data for a single creature, as resolved by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureProfile {
    pub name: String,
    /// Base experience; scales every experience gain during training.
    pub base_power_level: u32,
    /// Pokédex id, used to locate the sprite.
    pub sprite_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub species: String,
    /// Indices into `EvolutionChain::nodes`; only the first entry is ever followed.
    pub evolves_to: Vec<usize>,
}

/// An evolution tree flattened into an array of nodes, root first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvolutionChain {
    pub nodes: Vec<EvolutionNode>,
}

impl EvolutionChain {
    /// Builds a straight line `a -> b -> c`, the common shape for starters.
    pub fn linear<S: AsRef<str>>(species: &[S]) -> Self {
        let count = species.len();
        let nodes = species
            .iter()
            .enumerate()
            .map(|(index, name)| EvolutionNode {
                species: normalize_name(name.as_ref()),
                evolves_to: if index + 1 < count {
                    vec![index + 1]
                } else {
                    Vec::new()
                },
            })
            .collect();
        Self { nodes }
    }

    /// Appends a node and returns its index. Links are added with `link`.
    pub fn push(&mut self, species: &str) -> usize {
        self.nodes.push(EvolutionNode {
            species: normalize_name(species),
            evolves_to: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn link(&mut self, parent: usize, child: usize) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.evolves_to.push(child);
        }
    }

    pub fn root(&self) -> Option<&EvolutionNode> {
        self.nodes.first()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the chain from the root along first successors looking for `name`.
    pub fn find(&self, name: &str) -> Option<&EvolutionNode> {
        let wanted = normalize_name(name);
        let mut cursor = self.root();
        // Bounded by node count so a malformed cycle cannot spin forever.
        for _ in 0..self.nodes.len() {
            let node = cursor?;
            if node.species == wanted {
                return Some(node);
            }
            cursor = node
                .evolves_to
                .first()
                .and_then(|&child| self.nodes.get(child));
        }
        None
    }

    /// The species `name` evolves into, if it is on the chain and has a successor.
    pub fn successor_of(&self, name: &str) -> Option<&str> {
        self.find(name)?
            .evolves_to
            .first()
            .and_then(|&child| self.nodes.get(child))
            .map(|node| node.species.as_str())
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.species.as_str())
    }
}
