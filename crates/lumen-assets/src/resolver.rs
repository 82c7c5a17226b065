//! Dependency ordering and change propagation.

use std::collections::VecDeque;

use lumen_core::alloc::{HashMap, HashSet};
use lumen_core::profiling::profile_function;

use crate::cache::AssetCache;
use crate::error::{AssetError, AssetResult};
use crate::importer::ImportEnv;
use crate::index::AssetIndex;
use crate::key::AssetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Expanding,
    Done,
}

enum Step {
    Visit(AssetId),
    Finish(AssetId),
}

/// Order `seeds` and everything they transitively require so that each id
/// comes after all of its requirements.
///
/// Each id appears once. Fails with [`AssetError::CycleDetected`] naming the
/// first id reached twice on the current path.
pub fn resolve(index: &AssetIndex, seeds: &[AssetId]) -> AssetResult<Vec<AssetId>> {
    profile_function!();

    let mut marks: HashMap<AssetId, Mark> = HashMap::default();
    let mut order = Vec::new();
    let mut stack = Vec::new();

    for &seed in seeds {
        if marks.contains_key(&seed) {
            continue;
        }
        stack.push(Step::Visit(seed));

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(id) => match marks.get(&id) {
                    Some(Mark::Done) => {}
                    Some(Mark::Expanding) => return Err(AssetError::CycleDetected { id }),
                    None => {
                        marks.insert(id, Mark::Expanding);
                        stack.push(Step::Finish(id));
                        // Reversed so requirements are emitted in declaration order.
                        for &required in index.requires(id).iter().rev() {
                            match marks.get(&required) {
                                Some(Mark::Done) => {}
                                Some(Mark::Expanding) => {
                                    return Err(AssetError::CycleDetected { id: required });
                                }
                                None => stack.push(Step::Visit(required)),
                            }
                        }
                    }
                },
                Step::Finish(id) => {
                    marks.insert(id, Mark::Done);
                    order.push(id);
                }
            }
        }
    }

    Ok(order)
}

/// Record every indexed `dependent -> required` edge on the cached record of
/// `required`. Returns the number of newly linked edges.
pub fn link_dependents(index: &AssetIndex, cache: &mut AssetCache) -> usize {
    let mut linked = 0;
    for (dependent, required) in index.edges() {
        if let Some(record) = cache.find_mut(required)
            && record.add_dependent(dependent)
        {
            linked += 1;
        }
    }
    linked
}

/// Re-import everything that depends on `changed`, hop by hop.
///
/// Each dependent is updated at most once per call, so cyclic dependencies
/// terminate. Returns the ids that were re-imported, in order.
pub(crate) fn propagate_change(env: &mut ImportEnv<'_>, changed: AssetId) -> Vec<AssetId> {
    profile_function!();

    let mut visited: HashSet<AssetId> = HashSet::default();
    visited.insert(changed);
    let mut queue: VecDeque<AssetId> = VecDeque::new();
    queue.push_back(changed);
    let mut updated = Vec::new();

    while let Some(id) = queue.pop_front() {
        let dependents = match env.cache.find(id) {
            Some(record) => record.dependents().to_vec(),
            None => continue,
        };
        for dependent in dependents {
            if !visited.insert(dependent) {
                continue;
            }
            tracing::debug!("Re-importing {} after change to {}", dependent, id);
            if env.update_id(dependent) {
                updated.push(dependent);
                queue.push_back(dependent);
            }
        }
    }

    updated
}
