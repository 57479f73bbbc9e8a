//! Plugin load-order resolution.
//!
//! [`resolve`] validates the activation list and orders the requested
//! plugins so that every plugin comes after the providers of the
//! capabilities it requires. Problems are collected and reported together;
//! nothing is constructed unless resolution succeeds.

use std::collections::{HashMap, HashSet, VecDeque};

use chime_core::CapabilityKey;

use crate::error::{ProviderHint, ResolveError, ResolveIssue};
use crate::plugin::{PluginDescriptor, PluginRegistry, ValueStore};

/// Computes the load order for `requested`.
///
/// An empty `requested` list activates every registered plugin in
/// registration order. Capabilities already present in `core` are never
/// treated as requirements.
///
/// Ties are broken first-in first-out in request order.
pub fn resolve(
    registry: &PluginRegistry,
    requested: &[String],
    core: &ValueStore,
) -> Result<Vec<String>, ResolveError> {
    let requested: Vec<String> = if requested.is_empty() {
        registry.names()
    } else {
        requested.to_vec()
    };

    let mut issues = Vec::new();

    // Step 1: every name is registered and requested once.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported_twice: HashSet<&str> = HashSet::new();
    let mut active: Vec<&PluginDescriptor> = Vec::new();
    for name in &requested {
        let Some(descriptor) = registry.get(name) else {
            issues.push(ResolveIssue::UnknownPlugin(name.clone()));
            continue;
        };
        if !seen.insert(name.as_str()) {
            if reported_twice.insert(name.as_str()) {
                issues.push(ResolveIssue::RequestedTwice(name.clone()));
            }
            continue;
        }
        active.push(descriptor);
    }

    // Step 2: one provider per capability.
    let mut provided_by: HashMap<CapabilityKey, usize> = HashMap::new();
    for (i, plugin) in active.iter().enumerate() {
        for key in plugin.provided() {
            match provided_by.get(key) {
                Some(&first) => issues.push(ResolveIssue::MultipleProviders {
                    capability: key.id(),
                    first: active[first].name().to_string(),
                    second: plugin.name().to_string(),
                }),
                None => {
                    provided_by.insert(*key, i);
                }
            }
        }
    }

    if !issues.is_empty() {
        return Err(ResolveError { issues });
    }

    // Step 3: Kahn's algorithm over the remaining requirements.
    let n = active.len();
    let mut requires: Vec<HashSet<CapabilityKey>> = active
        .iter()
        .map(|p| {
            p.required()
                .iter()
                .filter(|key| !core.contains(key))
                .copied()
                .collect()
        })
        .collect();

    let mut queued = vec![false; n];
    let mut loaded = vec![false; n];
    let mut queue = VecDeque::new();
    for i in 0..n {
        if requires[i].is_empty() {
            queued[i] = true;
            queue.push_back(i);
        }
    }

    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        loaded[i] = true;
        order.push(active[i].name().to_string());
        for key in active[i].provided() {
            for j in 0..n {
                if loaded[j] || queued[j] {
                    continue;
                }
                if requires[j].remove(key) && requires[j].is_empty() {
                    queued[j] = true;
                    queue.push_back(j);
                }
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    // Step 4: explain every stuck plugin.
    for j in (0..n).filter(|&j| !loaded[j]) {
        let mut missing: Vec<&CapabilityKey> = requires[j].iter().collect();
        missing.sort_by_key(|key| key.id());
        for key in missing {
            let provider = match provided_by.get(key) {
                Some(&p) => ProviderHint::Requested(active[p].name().to_string()),
                None => {
                    let names: Vec<String> = registry
                        .iter()
                        .filter(|d| d.provided().contains(key))
                        .map(|d| d.name().to_string())
                        .collect();
                    if names.is_empty() {
                        ProviderHint::Nobody
                    } else {
                        ProviderHint::Unrequested(names)
                    }
                }
            };
            issues.push(ResolveIssue::Unsatisfied {
                plugin: active[j].name().to_string(),
                capability: key.id(),
                provider,
            });
        }
    }

    Err(ResolveError { issues })
}
