//! Startup loading of the assets marked as never lazy.

use lumen_core::profiling::profile_function;

use crate::importer::ImportEnv;
use crate::key::AssetId;
use crate::resolver;

/// Import every `no_lazy_load` id, requirements first.
///
/// If the eager set's requirements contain a cycle, the error is logged and
/// the eager ids are imported in listed order instead. Returns the number of
/// ids cached afterwards.
pub(crate) fn load_eager(env: &mut ImportEnv<'_>) -> usize {
    profile_function!();

    let seeds: Vec<AssetId> = env.index.no_lazy_load().to_vec();
    if seeds.is_empty() {
        return 0;
    }

    let order = match resolver::resolve(env.index, &seeds) {
        Ok(order) => order,
        Err(e) => {
            tracing::error!("Eager load order unavailable, using listed order: {}", e);
            seeds
        }
    };

    let loaded = order.iter().filter(|&&id| env.import_id(id)).count();
    tracing::debug!("Eager-loaded {}/{} assets", loaded, order.len());
    loaded
}
