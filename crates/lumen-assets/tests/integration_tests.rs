//! Integration tests for the asset pipeline.
//!
//! These tests use tempfile to create isolated project roots.

use std::path::{Path, PathBuf};
use std::thread;

use lumen_assets::kinds::{Material, Script, Shader, ShaderStage, Texture};
use lumen_assets::*;
use tempfile::TempDir;

// ============================================================================
// Test Project
// ============================================================================

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_png(&self, relative: &str, rgba: [u8; 4]) -> PathBuf {
        let path = self.path(relative);
        image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba))
            .save(&path)
            .unwrap();
        path
    }

    /// Manager with the built-in importers and no watcher.
    fn manager(&self) -> AssetManager {
        let mut manager = AssetManager::new(AssetConfig::new(self.root()).with_hot_reload(false));
        manager.register_default_importers();
        manager
    }

    fn started(&self) -> AssetManager {
        let mut manager = self.manager();
        manager.initialize().unwrap();
        manager
    }

    /// `surface.shader` and `standard/standard.mat` requiring it.
    fn with_surface_material(self) -> Self {
        self.write("surface.vert", "void main() { gl_Position = vec4(0.0); }");
        self.write("surface.frag", "void main() { color = vec4(1.0); }");
        self.write(
            "surface.shader",
            "# lit surface\nvertex surface.vert\nfragment surface.frag\n",
        );
        self.write(
            "standard/standard.mat",
            r#"{
                "shader": "surface.shader",
                "properties": {
                    "roughness": { "float": 0.5 },
                    "tint": { "color": [1.0, 0.5, 0.25, 1.0] }
                }
            }"#,
        );
        self
    }
}

fn post_modified(manager: &AssetManager, path: PathBuf) {
    assert!(manager.dispatcher().post(FileEvent::modified(path)));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_material_shares_shader_with_cache() {
    let project = Project::new().with_surface_material();
    let mut manager = project.started();

    let material = manager.get_typed::<Material>("standard.standard.mat").unwrap();
    let shader = manager.get_typed::<Shader>("surface.shader").unwrap();

    let guard = material.read();
    assert!(guard.shader().unwrap().ptr_eq(&shader));
    assert_eq!(guard.float("roughness"), Some(0.5));
    assert_eq!(shader.read().modules().len(), 2);
    assert!(shader.read().stage(ShaderStage::Fragment).is_some());
}

#[test]
fn test_unknown_extension_is_skipped() {
    let project = Project::new();
    project.write("notes.xyz", "?");
    project.write("main.lua", "print('hi')");
    let mut manager = project.started();

    assert!(manager.get("notes.xyz").is_none());
    assert!(!manager.contains("notes.xyz"));
    assert!(manager.contains("main.lua"));
}

#[test]
fn test_shader_edit_recompiles_in_place() {
    let project = Project::new().with_surface_material();
    let mut manager = project.started();
    let material = manager.get_typed::<Material>("standard.standard.mat").unwrap();
    let shader = manager.get_typed::<Shader>("surface.shader").unwrap();
    manager.drain_events().for_each(drop);

    project.write("surface.shader", "vertex surface.vert\n");
    post_modified(&manager, project.path("surface.shader"));
    let reimported = manager.process_file_events();

    assert_eq!(reimported, 2);
    assert_eq!(shader.read().modules().len(), 1);
    assert_eq!(shader.version(), 2);
    assert!(manager.get_typed::<Shader>("surface.shader").unwrap().ptr_eq(&shader));
    assert!(
        manager
            .get_typed::<Material>("standard.standard.mat")
            .unwrap()
            .ptr_eq(&material)
    );
    assert!(material.read().shader().unwrap().ptr_eq(&shader));

    let events: Vec<_> = manager.drain_events().collect();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(AssetEvent::is_reloaded));
}

#[test]
fn test_path_without_key_is_not_found() {
    let project = Project::new();
    project.write("resources.json", r#"{ "id_path": { "7": "a.mat" } }"#);
    let mut manager = project.started();

    assert!(manager.get("a.mat").is_none());
    assert!(manager.get_typed::<Material>("a.mat").is_none());
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_ids_survive_restart() {
    let project = Project::new().with_surface_material();

    let mut first = project.started();
    let shader_id = first.id_of("surface.shader").unwrap();
    let material_id = first.id_of("standard.standard.mat").unwrap();
    first.shutdown();
    assert!(project.path("resources.json").is_file());

    let second = project.started();
    assert_eq!(second.id_of("surface.shader"), Some(shader_id));
    assert_eq!(second.id_of("standard.standard.mat"), Some(material_id));
    assert_ne!(shader_id, material_id);
}

#[test]
fn test_corrupt_index_refuses_to_start() {
    let project = Project::new();
    project.write("main.lua", "");
    project.write("resources.json", "{ not json");

    let mut manager = project.manager();
    let result = manager.initialize();

    assert!(matches!(result, Err(AssetError::IndexCorruption { .. })));
    assert!(!manager.is_initialized());
    assert_eq!(
        std::fs::read_to_string(project.path("resources.json")).unwrap(),
        "{ not json"
    );
}

#[test]
fn test_index_is_written_after_scan() {
    let project = Project::new();
    project.write("scripts/main.lua", "");
    let _manager = project.started();

    let index = AssetIndex::load(project.path("resources.json")).unwrap();
    assert!(index.id_of(&"scripts.main.lua".into()).is_some());
    assert_eq!(index.len(), 1);
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_assets_load_lazily() {
    let project = Project::new();
    project.write("main.lua", "print('hi')");
    let mut manager = project.started();

    assert!(manager.contains("main.lua"));
    assert!(!manager.is_loaded("main.lua"));
    assert!(manager.peek("main.lua").is_none());

    let script = manager.get_typed::<Script>("main.lua").unwrap();
    assert_eq!(script.read().source(), "print('hi')");
    assert!(manager.is_loaded("main.lua"));
    assert!(manager.peek_typed::<Script>("main.lua").unwrap().ptr_eq(&script));
}

#[test]
fn test_repeated_get_returns_same_payload() {
    let project = Project::new();
    project.write("main.lua", "a");
    let mut manager = project.started();

    let first = manager.get_typed::<Script>("main.lua").unwrap();
    let second = manager.get_typed::<Script>("main.lua").unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(first.version(), 1);
    assert_eq!(manager.drain_events().count(), 1);
}

#[test]
fn test_eager_assets_load_on_startup_requirements_first() {
    let project = Project::new().with_surface_material();

    let mut first = project.started();
    first.get("standard.standard.mat").unwrap();
    assert!(first.mark_eager("standard.standard.mat"));
    assert!(!first.mark_eager("standard.standard.mat"));
    first.shutdown();

    let mut second = project.started();
    assert!(second.is_loaded("standard.standard.mat"));
    assert!(second.is_loaded("surface.shader"));

    let shader_id = second.id_of("surface.shader").unwrap();
    let material_id = second.id_of("standard.standard.mat").unwrap();
    let imported: Vec<AssetId> = second
        .drain_events()
        .filter(AssetEvent::is_imported)
        .map(|e| e.id())
        .collect();
    assert_eq!(imported, vec![shader_id, material_id]);
}

#[test]
fn test_eager_load_can_be_disabled() {
    let project = Project::new();
    project.write("main.lua", "");

    let mut first = project.started();
    first.mark_eager("main.lua");
    first.shutdown();

    let mut manager = AssetManager::new(
        AssetConfig::new(project.root())
            .with_hot_reload(false)
            .with_eager_load(false),
    );
    manager.register_default_importers();
    manager.initialize().unwrap();
    assert!(!manager.is_loaded("main.lua"));
}

#[test]
fn test_missing_dependency_leaves_none() {
    let project = Project::new();
    project.write("broken.mat", r#"{ "shader": "nothing.shader" }"#);
    let mut manager = project.started();

    let material = manager.get_typed::<Material>("broken.mat").unwrap();
    let guard = material.read();
    assert!(guard.shader().is_none());
    assert_eq!(guard.shader_key().map(AssetKey::as_str), Some("nothing.shader"));
}

#[test]
fn test_kind_mismatch_is_none() {
    let project = Project::new();
    project.write("main.lua", "");
    let mut manager = project.started();

    assert!(manager.get_typed::<Shader>("main.lua").is_none());
    assert!(manager.get_typed::<Script>("main.lua").is_some());
}

#[test]
fn test_malformed_source_yields_default_payload() {
    let project = Project::new();
    project.write("bad.shader", "tessellation bad.tess\n");
    let mut manager = project.started();

    let shader = manager.get_typed::<Shader>("bad.shader").unwrap();
    assert!(!shader.read().is_compiled());
    assert_eq!(shader.version(), 0);

    let id = manager.id_of("bad.shader").unwrap();
    assert!(manager.cache().find(id).unwrap().state().is_failed());
    assert!(manager.drain_events().any(|e| e.is_failed()));
}

#[test]
fn test_texture_property_resolves() {
    let project = Project::new().with_surface_material();
    project.write_png("bricks.png", [200, 100, 50, 255]);
    project.write(
        "bricks.mat",
        r#"{ "shader": "surface.shader", "properties": { "albedo_map": { "texture": "bricks.png" } } }"#,
    );
    let mut manager = project.started();

    let material = manager.get_typed::<Material>("bricks.mat").unwrap();
    let texture = manager.get_typed::<Texture>("bricks.png").unwrap();

    assert!(material.read().texture("albedo_map").unwrap().ptr_eq(&texture));
    assert_eq!(texture.read().dimensions(), (2, 2));
    assert_eq!(texture.read().pixel(1, 1), Some([200, 100, 50, 255]));
}

// ============================================================================
// Importers
// ============================================================================

/// Reads `.cfg` files as scripts with the text upper-cased.
struct ShoutingImporter;

impl AssetImporter for ShoutingImporter {
    type Asset = Script;

    fn extensions(&self) -> &[&str] {
        &["cfg"]
    }

    fn read_asset_data(&self, asset: &mut Script, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        *asset = Script::new(ctx.path(), ctx.text()?.to_uppercase());
        Ok(())
    }
}

#[test]
fn test_custom_importer() {
    let project = Project::new();
    project.write("settings.cfg", "volume = 3");
    let mut manager = project.manager();
    manager.register_importer(ShoutingImporter);
    manager.initialize().unwrap();

    let script = manager.get_typed::<Script>("settings.cfg").unwrap();
    assert_eq!(script.read().source(), "VOLUME = 3");
}

#[test]
fn test_reregistering_extension_replaces_importer() {
    let project = Project::new();
    project.write("main.lua", "quiet");
    let mut manager = project.manager();
    manager.register_importer_for(&["lua"], ShoutingImporter);
    manager.initialize().unwrap();

    let script = manager.get_typed::<Script>("main.lua").unwrap();
    assert_eq!(script.read().source(), "QUIET");
}

// ============================================================================
// Hot Reload
// ============================================================================

#[test]
fn test_each_dependent_reimported_once() {
    let project = Project::new().with_surface_material();
    project.write("other.mat", r#"{ "shader": "surface.shader" }"#);
    let mut manager = project.started();
    let standard = manager.get_typed::<Material>("standard.standard.mat").unwrap();
    let other = manager.get_typed::<Material>("other.mat").unwrap();
    manager.drain_events().for_each(drop);

    project.write("surface.frag", "void main() { color = vec4(0.5); }");
    project.write("surface.shader", "vertex surface.vert\nfragment surface.frag\n");
    post_modified(&manager, project.path("surface.shader"));

    assert_eq!(manager.process_file_events(), 3);
    assert_eq!(standard.version(), 2);
    assert_eq!(other.version(), 2);
    assert_eq!(manager.drain_events().filter(AssetEvent::is_reloaded).count(), 3);
}

#[test]
fn test_texture_edit_cascades_to_material() {
    let project = Project::new().with_surface_material();
    project.write_png("bricks.png", [0, 0, 0, 255]);
    project.write(
        "bricks.mat",
        r#"{ "shader": "surface.shader", "properties": { "albedo_map": { "texture": "bricks.png" } } }"#,
    );
    let mut manager = project.started();
    let material = manager.get_typed::<Material>("bricks.mat").unwrap();
    let texture = manager.get_typed::<Texture>("bricks.png").unwrap();

    let path = project.write_png("bricks.png", [255, 255, 255, 255]);
    post_modified(&manager, path);
    assert_eq!(manager.process_file_events(), 2);

    assert_eq!(texture.read().pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(material.version(), 2);
    assert!(material.read().texture("albedo_map").unwrap().ptr_eq(&texture));
}

#[test]
fn test_stage_edit_recompiles_shader() {
    let project = Project::new().with_surface_material();
    let mut manager = project.started();
    let material = manager.get_typed::<Material>("standard.standard.mat").unwrap();
    let shader = manager.get_typed::<Shader>("surface.shader").unwrap();
    manager.drain_events().for_each(drop);

    let frag = project.write("surface.frag", "void main() { color = vec4(0.25); }");
    post_modified(&manager, frag);

    assert_eq!(manager.process_file_events(), 2);
    assert_eq!(
        shader.read().stage(ShaderStage::Fragment).unwrap().source,
        "void main() { color = vec4(0.25); }"
    );
    assert_eq!(shader.version(), 2);
    assert_eq!(material.version(), 2);
    assert!(material.read().shader().unwrap().ptr_eq(&shader));
    assert_eq!(manager.drain_events().filter(AssetEvent::is_reloaded).count(), 2);
}

#[test]
fn test_missing_stage_loads_once_created() {
    let project = Project::new();
    project.write("late.shader", "vertex late.vert\n");
    let mut manager = project.started();
    let shader = manager.get_typed::<Shader>("late.shader").unwrap();
    assert!(!shader.read().is_compiled());

    let vert = project.write("late.vert", "void main() {}");
    manager
        .dispatcher()
        .post(FileEvent::new(vert, FileEventKind::Created));

    assert_eq!(manager.process_file_events(), 1);
    assert!(shader.read().is_compiled());
}

#[cfg(unix)]
#[test]
fn test_event_through_symlinked_root_reloads() {
    let project = Project::new().with_surface_material();
    let mut manager = project.started();
    let shader = manager.get_typed::<Shader>("surface.shader").unwrap();

    let alias_dir = TempDir::new().unwrap();
    let alias = alias_dir.path().join("project");
    std::os::unix::fs::symlink(manager.root(), &alias).unwrap();

    project.write("surface.frag", "void main() { color = vec4(0.75); }");
    post_modified(&manager, alias.join("surface.frag"));

    assert_eq!(manager.process_file_events(), 2);
    assert_eq!(shader.version(), 2);
}

#[test]
fn test_switched_requirement_stops_propagating() {
    let project = Project::new();
    project.write("a.vert", "void main() {}");
    project.write("b.vert", "void main() {}");
    project.write("a.shader", "vertex a.vert\n");
    project.write("b.shader", "vertex b.vert\n");
    project.write("m.mat", r#"{ "shader": "a.shader" }"#);
    let mut manager = project.started();
    let material = manager.get_typed::<Material>("m.mat").unwrap();
    let m = manager.id_of("m.mat").unwrap();
    let b = manager.id_of("b.shader").unwrap();

    let path = project.write("m.mat", r#"{ "shader": "b.shader" }"#);
    post_modified(&manager, path);
    assert_eq!(manager.process_file_events(), 1);
    assert_eq!(material.read().shader_key(), Some(&AssetKey::new("b.shader")));
    assert_eq!(manager.index().requires(m), &[b]);

    post_modified(&manager, project.path("a.shader"));
    assert_eq!(manager.process_file_events(), 1);
    assert_eq!(material.version(), 2);

    manager.shutdown();
    let restarted = project.started();
    assert_eq!(restarted.index().requires(m), &[b]);
}

#[test]
fn test_failed_reload_keeps_previous_content() {
    let project = Project::new();
    project.write("main.lua", "good");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    project.write("main.lua", [0xff, 0xfe, 0x00]);
    assert!(manager.reload("main.lua"));

    assert_eq!(script.read().source(), "good");
    assert_eq!(script.version(), 1);
    assert!(manager.drain_events().any(|e| e.is_failed()));

    project.write("main.lua", "fixed");
    assert!(manager.reload("main.lua"));
    assert_eq!(script.read().source(), "fixed");
}

#[test]
fn test_reload_uncached_imports() {
    let project = Project::new();
    project.write("main.lua", "x");
    let mut manager = project.started();

    assert!(manager.reload("main.lua"));
    assert!(manager.is_loaded("main.lua"));
    assert!(!manager.reload("missing.lua"));
}

#[test]
fn test_events_for_uncached_files_are_ignored() {
    let project = Project::new();
    project.write("main.lua", "x");
    let mut manager = project.started();

    post_modified(&manager, project.path("main.lua"));
    assert_eq!(manager.process_file_events(), 0);
    assert!(!manager.is_loaded("main.lua"));
}

#[test]
fn test_removed_event_keeps_payload() {
    let project = Project::new();
    let path = project.write("main.lua", "x");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    std::fs::remove_file(&path).unwrap();
    manager
        .dispatcher()
        .post(FileEvent::new(&path, FileEventKind::Removed));

    assert_eq!(manager.process_file_events(), 0);
    assert_eq!(script.read().source(), "x");
    assert!(manager.is_loaded("main.lua"));
}

#[test]
fn test_created_file_becomes_loadable() {
    let project = Project::new();
    let mut manager = project.started();
    assert!(!manager.contains("late.lua"));

    let path = project.write("late.lua", "late");
    manager
        .dispatcher()
        .post(FileEvent::new(path, FileEventKind::Created));
    manager.process_file_events();

    assert!(manager.contains("late.lua"));
    let script = manager.get_typed::<Script>("late.lua").unwrap();
    assert_eq!(script.read().source(), "late");
}

#[test]
fn test_each_event_reimports() {
    let project = Project::new();
    let path = project.write("main.lua", "0");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    for _ in 0..3 {
        post_modified(&manager, path.clone());
    }
    assert_eq!(manager.process_file_events(), 3);
    assert_eq!(script.version(), 4);
}

#[test]
fn test_events_posted_from_other_threads() {
    let project = Project::new();
    let path = project.write("main.lua", "before");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    project.write("main.lua", "after");
    let sender = manager.dispatcher();
    thread::spawn(move || {
        assert!(sender.post(FileEvent::modified(path)));
    })
    .join()
    .unwrap();

    assert_eq!(manager.process_file_events(), 1);
    assert_eq!(script.read().source(), "after");
}

#[test]
fn test_refs_are_readable_from_other_threads() {
    let project = Project::new();
    project.write("main.lua", "shared");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    let reader = thread::spawn(move || script.read().source().to_string());
    assert_eq!(reader.join().unwrap(), "shared");
}

#[test]
fn test_shutdown_detaches_refs() {
    let project = Project::new();
    project.write("main.lua", "kept");
    let mut manager = project.started();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    manager.shutdown();

    assert!(!manager.is_initialized());
    assert!(manager.cache().is_empty());
    assert_eq!(script.read().source(), "kept");
    assert_eq!(script.ref_count(), 1);
}

#[cfg(feature = "hot-reload")]
#[test]
fn test_watcher_reloads_edited_file() {
    use std::time::{Duration, Instant};

    let project = Project::new();
    project.write("main.lua", "before");
    let mut manager = AssetManager::new(AssetConfig::new(project.root()).with_hot_reload(true));
    manager.register_default_importers();
    manager.initialize().unwrap();
    let script = manager.get_typed::<Script>("main.lua").unwrap();

    // Give the OS watch time to arm.
    thread::sleep(Duration::from_millis(100));
    project.write("main.lua", "after");

    let deadline = Instant::now() + Duration::from_secs(5);
    while script.read().source() != "after" && Instant::now() < deadline {
        manager.process_file_events();
        thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(script.read().source(), "after");
    manager.shutdown();
}
