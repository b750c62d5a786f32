//! Dependency graph construction and start ordering.
//!
//! Edges point from a dependent to its providers. The graph is rebuilt
//! from the services' declarations on every `start`, validated, and
//! flattened into a deterministic topological order (providers first)
//! using Kahn's algorithm with a ranked ready set.

use crate::registry::ServiceRegistry;
use apollo_core::config::TieBreak;
use apollo_core::error::KernelError;
use apollo_core::key::ServiceKey;
use apollo_core::service::abstract_service_key;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Reject declarations that can never be satisfied, regardless of what
/// else is installed: a dependency on oneself or on the abstract
/// service marker.
pub fn validate_declarations<'a>(
    service: ServiceKey,
    declared: impl IntoIterator<Item = &'a ServiceKey>,
) -> Result<(), KernelError> {
    let marker = abstract_service_key();
    for dependency in declared {
        if *dependency == service {
            return Err(KernelError::SelfDependency(service));
        }
        if *dependency == marker {
            return Err(KernelError::DependencyOnAbstractBase(service));
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Node {
    /// Providers handed over through `connect_to`, declaration order.
    connect: Vec<ServiceKey>,
    /// Providers that only have to be started first.
    require: Vec<ServiceKey>,
    /// Every provider (connect then require), no duplicates.
    providers: Vec<ServiceKey>,
    /// Services depending on this one.
    dependents: Vec<ServiceKey>,
}

/// A validated, acyclic dependency graph over the installed services.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: HashMap<ServiceKey, Node>,
    order: Vec<ServiceKey>,
}

impl DependencyGraph {
    /// Build the graph for every service in `registry`.
    ///
    /// Fails with the first wiring error found, checking services in
    /// installation order: self or abstract dependencies, then missing
    /// providers, then cycles.
    pub fn build(registry: &ServiceRegistry, tie_break: TieBreak) -> Result<Self, KernelError> {
        let mut nodes: HashMap<ServiceKey, Node> = HashMap::with_capacity(registry.len());

        for (key, service) in registry.iter() {
            let connect = dedup(service.services_to_connect_to());
            let require: Vec<ServiceKey> = dedup(service.services_required())
                .into_iter()
                .filter(|k| !connect.contains(k))
                .collect();
            validate_declarations(key, connect.iter().chain(require.iter()))?;

            let providers: Vec<ServiceKey> = connect.iter().chain(require.iter()).copied().collect();
            if let Some(missing) = providers.iter().find(|p| !registry.contains(p)) {
                return Err(KernelError::UnresolvedDependency {
                    service: key,
                    dependency: *missing,
                });
            }

            nodes.insert(
                key,
                Node {
                    connect,
                    require,
                    providers,
                    dependents: Vec::new(),
                },
            );
        }

        let keys = registry.keys();
        for key in &keys {
            let providers = nodes[key].providers.clone();
            for provider in providers {
                if let Some(node) = nodes.get_mut(&provider) {
                    node.dependents.push(*key);
                }
            }
        }

        let ranked = rank(registry, &keys, tie_break);
        let order = topological_order(&nodes, &ranked)?;
        Ok(Self { nodes, order })
    }

    /// Every service, providers before dependents.
    pub fn order(&self) -> &[ServiceKey] {
        &self.order
    }

    /// Providers `service` must be connected to, in declaration order.
    pub fn connections(&self, service: &ServiceKey) -> &[ServiceKey] {
        self.nodes
            .get(service)
            .map(|n| n.connect.as_slice())
            .unwrap_or_default()
    }

    /// Providers `service` requires started but not connected.
    pub fn requirements(&self, service: &ServiceKey) -> &[ServiceKey] {
        self.nodes
            .get(service)
            .map(|n| n.require.as_slice())
            .unwrap_or_default()
    }

    /// Every provider of `service`.
    pub fn providers(&self, service: &ServiceKey) -> &[ServiceKey] {
        self.nodes
            .get(service)
            .map(|n| n.providers.as_slice())
            .unwrap_or_default()
    }

    /// Services that depend on `service`, in installation order.
    pub fn dependents(&self, service: &ServiceKey) -> &[ServiceKey] {
        self.nodes
            .get(service)
            .map(|n| n.dependents.as_slice())
            .unwrap_or_default()
    }

    /// Number of services in the graph.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn dedup(keys: Vec<ServiceKey>) -> Vec<ServiceKey> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.into_iter().filter(|k| seen.insert(*k)).collect()
}

/// Keys in tie-break order; a key's position is its rank.
fn rank(registry: &ServiceRegistry, keys: &[ServiceKey], tie_break: TieBreak) -> Vec<ServiceKey> {
    let mut ranked = keys.to_vec();
    if tie_break == TieBreak::TypeName {
        ranked.sort_by(|a, b| {
            a.type_name()
                .cmp(b.type_name())
                .then_with(|| registry.installation_index(a).cmp(&registry.installation_index(b)))
        });
    }
    ranked
}

fn topological_order(
    nodes: &HashMap<ServiceKey, Node>,
    ranked: &[ServiceKey],
) -> Result<Vec<ServiceKey>, KernelError> {
    let rank_of: HashMap<ServiceKey, usize> =
        ranked.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut pending: HashMap<ServiceKey, usize> =
        nodes.iter().map(|(k, n)| (*k, n.providers.len())).collect();

    let mut ready: BTreeSet<usize> = ranked
        .iter()
        .enumerate()
        .filter(|(_, k)| pending[*k] == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(ranked.len());
    while let Some(next) = ready.pop_first() {
        let key = ranked[next];
        order.push(key);
        for dependent in &nodes[&key].dependents {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(rank_of[dependent]);
                }
            }
        }
    }

    if order.len() < ranked.len() {
        let placed: HashSet<ServiceKey> = order.iter().copied().collect();
        let remaining: Vec<ServiceKey> =
            ranked.iter().filter(|k| !placed.contains(*k)).copied().collect();
        return Err(KernelError::CyclicDependency {
            cycle: find_cycle(nodes, &remaining),
        });
    }
    Ok(order)
}

/// Find one cycle among the services Kahn's algorithm could not place.
///
/// Every such service still has an unplaced provider, so a walk along
/// unplaced providers must revisit a service. The returned members are
/// in dependency order: each depends on the next, the last on the first.
fn find_cycle(nodes: &HashMap<ServiceKey, Node>, remaining: &[ServiceKey]) -> Vec<ServiceKey> {
    let unplaced: HashSet<ServiceKey> = remaining.iter().copied().collect();
    let mut path: Vec<ServiceKey> = Vec::new();
    let mut on_path: HashMap<ServiceKey, usize> = HashMap::new();

    let Some(&start) = remaining.first() else {
        return Vec::new();
    };
    let mut current = start;
    loop {
        if let Some(&pos) = on_path.get(&current) {
            return path.split_off(pos);
        }
        on_path.insert(current, path.len());
        path.push(current);

        match nodes[&current]
            .providers
            .iter()
            .find(|p| unplaced.contains(*p))
        {
            Some(next) => current = *next,
            None => return path,
        }
    }
}
