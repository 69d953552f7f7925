//! Module path resolution for load sites.
//!
//! Mirrors the emitter: the bundle key comes from [`naming::bundle_key`],
//! the file from [`naming::bundle_file_name`]. Application bundles are
//! served from `./loveJS/`, library bundles from
//! `./_content/{package}/loveJS/`.

use arcstr::ArcStr;

use super::owner::{Origin, OwnerInfo};
use super::params::SiteConfig;
use super::RuntimeError;
use crate::naming::{self, JS_OUTPUT_DIR, LIBRARY_CONTENT_ROOT};

/// Relative path of the bundle `key` emitted for `owner`'s package.
pub fn bundle_path(owner: &OwnerInfo, key: &str) -> String {
    let file = naming::bundle_file_name(key);
    match owner.origin {
        Origin::App => format!("./{JS_OUTPUT_DIR}/{file}"),
        Origin::Library => format!(
            "./{LIBRARY_CONTENT_ROOT}/{}/{JS_OUTPUT_DIR}/{file}",
            owner.package_id
        ),
    }
}

/// Resolve the script path a site loads.
///
/// `ScriptFile` wins verbatim. Otherwise an owner is required.
pub fn resolve_script_path(
    config: &SiteConfig,
    owner: Option<&OwnerInfo>,
) -> Result<ArcStr, RuntimeError> {
    if let Some(file) = &config.script_file {
        return Ok(ArcStr::from(file.as_str()));
    }

    let owner = owner.ok_or_else(|| {
        RuntimeError::OwnerResolution("no enclosing component and no ScriptFile supplied".into())
    })?;
    let key = naming::bundle_key(
        config.global_bundle,
        config.bundle_name.as_deref(),
        &owner.identity,
    );
    Ok(ArcStr::from(bundle_path(owner, &key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_owner() -> OwnerInfo {
        OwnerInfo {
            identity: arcstr::literal!("App.Widget"),
            package_id: arcstr::literal!("App"),
            origin: Origin::App,
            class_name: arcstr::literal!("App_Widget"),
        }
    }

    fn lib_owner() -> OwnerInfo {
        OwnerInfo {
            identity: arcstr::literal!("Lib.Grid"),
            package_id: arcstr::literal!("Lib"),
            origin: Origin::Library,
            class_name: arcstr::literal!("Lib_Grid"),
        }
    }

    #[test]
    fn app_component_bundle() {
        let path = resolve_script_path(&SiteConfig::default(), Some(&app_owner())).unwrap();
        assert_eq!(path.as_str(), "./loveJS/App.Widget.index.g.js");
    }

    #[test]
    fn library_component_bundle() {
        let config = SiteConfig {
            bundle_name: Some("test".into()),
            ..SiteConfig::default()
        };
        let path = resolve_script_path(&config, Some(&lib_owner())).unwrap();
        assert_eq!(path.as_str(), "./_content/Lib/loveJS/Lib.Grid.test.g.js");
    }

    #[test]
    fn global_bundle_ignores_owner_identity() {
        let config = SiteConfig {
            global_bundle: true,
            bundle_name: None,
            ..SiteConfig::default()
        };
        let path = resolve_script_path(&config, Some(&lib_owner())).unwrap();
        assert_eq!(path.as_str(), "./_content/Lib/loveJS/index.g.js");
    }

    #[test]
    fn script_file_is_verbatim() {
        let config = SiteConfig {
            script_file: Some("testFile.js".into()),
            global_bundle: true,
            bundle_name: Some("ignored".into()),
            ..SiteConfig::default()
        };
        let path = resolve_script_path(&config, None).unwrap();
        assert_eq!(path.as_str(), "testFile.js");
    }

    #[test]
    fn missing_owner_is_an_error() {
        let err = resolve_script_path(&SiteConfig::default(), None).unwrap_err();
        assert!(matches!(err, RuntimeError::OwnerResolution(_)));
    }
}
