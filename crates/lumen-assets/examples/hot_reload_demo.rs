//! Asset Hot-Reloading Demo
//!
//! Seeds a small project (a shader and a material using it), loads the
//! material and then watches the project for a minute. Edit
//! `surface.shader`, `surface.frag` or `standard/standard.mat` while it runs
//! and watch the reload events.
//!
//! ```text
//! cargo run -p lumen-assets --example hot_reload_demo -- [project dir]
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lumen_assets::kinds::{Material, Shader};
use lumen_assets::{AssetConfig, AssetEvent, AssetManager, AssetResult};
use lumen_core::profiling::{ProfilingBackend, init_profiling, new_frame, profile_scope};

const RUN_FOR: Duration = Duration::from_secs(60);

fn seed(root: &Path) -> std::io::Result<()> {
    let files = [
        ("surface.vert", "void main() { gl_Position = vec4(0.0); }\n"),
        ("surface.frag", "void main() { color = vec4(1.0); }\n"),
        ("surface.shader", "vertex surface.vert\nfragment surface.frag\n"),
        (
            "standard/standard.mat",
            "{\n  \"shader\": \"surface.shader\",\n  \"properties\": { \"roughness\": { \"float\": 0.5 } }\n}\n",
        ),
    ];
    for (relative, content) in files {
        let path = root.join(relative);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    }
    Ok(())
}

fn describe(material: &Material) -> String {
    let stages = material
        .shader()
        .map(|shader| {
            let shader: &Shader = &shader.read();
            shader
                .modules()
                .iter()
                .map(|m| m.stage.name())
                .collect::<Vec<_>>()
                .join("+")
        })
        .unwrap_or_else(|| "<no shader>".to_string());
    format!(
        "shader stages: {}, roughness: {:?}",
        stages,
        material.float("roughness")
    )
}

fn main() -> AssetResult<()> {
    lumen_core::logging::init();
    init_profiling(ProfilingBackend::PuffinHttp);

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo_assets"));
    if let Err(e) = seed(&root) {
        tracing::error!("Cannot seed {}: {}", root.display(), e);
        return Ok(());
    }

    let mut assets = AssetManager::new(AssetConfig::new(&root).with_hot_reload(true));
    assets.register_default_importers();
    assets.initialize()?;

    let Some(material) = assets.get_typed::<Material>("standard.standard.mat") else {
        tracing::error!("standard.standard.mat did not load");
        return Ok(());
    };
    let mut tracked = material.tracked();
    tracing::info!("Edit files under {} to trigger reloads", assets.root().display());

    let started = Instant::now();
    while started.elapsed() < RUN_FOR {
        new_frame();
        {
            profile_scope!("process_file_events");
            assets.process_file_events();
        }

        for event in assets.drain_events() {
            match event {
                AssetEvent::Reloaded { id, kind, version } => {
                    tracing::info!("{} {} reloaded (version {})", kind, id, version);
                }
                AssetEvent::ImportFailed { id, kind, error } => {
                    tracing::warn!("{} {} failed, keeping previous content: {}", kind, id, error);
                }
                AssetEvent::Imported { .. } => {}
            }
        }

        if tracked.check_changed() {
            tracing::info!("Material: {}", describe(&material.read()));
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    assets.shutdown();
    Ok(())
}
