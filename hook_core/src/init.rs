/*
One-time setup on the first intercepted call: load `glhook.yaml`, point the log at the hook root,
and hand the runtime settings to the process state.
 */
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use global_state::{process_state, RuntimeSettings};
use runtime::EffectSource;
use shared_gl::util::{get_log_file_path, set_log_file_path, write_log_file};
use util::conf::HookConfig;

lazy_static! {
    static ref CONFIG: RwLock<Option<HookConfig>> = RwLock::new(None);
}

fn log_dir(root: &Path, conf: &HookConfig) -> PathBuf {
    match conf.log_dir.as_ref() {
        Some(d) => PathBuf::from(d),
        None => {
            let mut p = root.to_path_buf();
            p.push("Logs");
            p
        }
    }
}

fn init_logging(root: &Path, conf: &HookConfig) {
    // tests and embedders may already have redirected it
    if !get_log_file_path().is_empty() {
        return;
    }
    let dir = log_dir(root, conf);
    let dir = match std::fs::create_dir_all(&dir) {
        Ok(_) => dir,
        Err(_) => std::env::temp_dir(),
    };
    let name = format!("glhook.{}.log", util::module_stem());
    if let Err(e) = set_log_file_path(&dir.to_string_lossy(), &name) {
        eprintln!("glhook: failed to set log path: {:?}", e);
    }
}

fn load() -> HookConfig {
    let root = match util::hook_root_dir() {
        Ok(r) => r,
        Err(e) => {
            write_log_file(&format!("Error: no hook root directory, using defaults: {:?}", e));
            return HookConfig::new();
        }
    };
    let conf = HookConfig::load_or_default(&root);
    init_logging(&root, &conf);
    write_log_file(&format!("glhook initialized in {}", util::get_module_name().unwrap_or_default()));
    write_log_file(&format!("hook root: {:?}", root));
    write_log_file(&format!("{}", conf));
    conf
}

/// Settings handed to every runtime created from now on.
pub fn runtime_settings(conf: &HookConfig) -> RuntimeSettings {
    let effect_source = match conf.effect_source() {
        Ok(Some(source)) => Some(EffectSource {
            source,
            pragmas: conf.effect_pragmas.clone(),
        }),
        Ok(None) => None,
        Err(e) => {
            write_log_file(&format!(
                "Error: can't read effect source {:?}: {:?}",
                conf.effect_path, e
            ));
            None
        }
    };
    RuntimeSettings {
        capability_floor: conf.capability_floor,
        depth_detection: conf.depth_detection,
        effect_source,
    }
}

/// Make `conf` the active configuration.
pub fn install_config(conf: HookConfig) {
    if let Err(e) = process_state().set_settings(runtime_settings(&conf)) {
        write_log_file(&format!("Error: failed to apply runtime settings: {:?}", e));
    }
    match CONFIG.write() {
        Ok(mut c) => *c = Some(conf),
        Err(_) => write_log_file("Error: config lock poisoned"),
    }
}

/// The active configuration, loading it on first use.
pub fn config() -> HookConfig {
    if let Ok(c) = CONFIG.read() {
        if let Some(c) = c.as_ref() {
            return c.clone();
        }
    }
    let conf = load();
    install_config(conf.clone());
    conf
}

/// False turns every entry into a plain pass-through.
pub fn is_active() -> bool {
    if let Ok(c) = CONFIG.read() {
        if let Some(c) = c.as_ref() {
            return c.active;
        }
    }
    config().active
}
