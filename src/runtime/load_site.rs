//! Load site lifecycle.
//!
//! ```text
//! Uninitialized --attach--> Attached --set_parameters--> Resolving --load--> Ready
//!                                                            \------------> Failed
//!   any state --dispose--> Disposed
//! ```
//!
//! The module load is a single memoized future per site. Every caller
//! (explicit invocations, the first-render signal, disposal) awaits that same
//! future, so the import happens once and `OnInit` has finished before any
//! of them proceeds. A failed load is memoized as well and reported to every
//! caller; it is not retried, and the site stays `Failed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arcstr::ArcStr;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::bridge::{import_module, ModuleHandle, ScriptEngine};
use super::owner::{OwnerIdentityLookup, OwnerInfo, RenderHandle};
use super::params::{ParameterView, SiteConfig};
use super::registry::ModuleRegistry;
use super::resolver;
use super::RuntimeError;

/// Observable lifecycle state of a [`LoadSite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    Uninitialized,
    Attached,
    Resolving,
    Ready,
    /// The import or the init hook failed.
    Failed,
    Disposed,
}

/// One runtime instance of the `Script` component.
pub struct LoadSite {
    engine: Arc<dyn ScriptEngine>,
    registry: Arc<ModuleRegistry>,
    owners: Arc<dyn OwnerIdentityLookup>,

    render_handle: Option<RenderHandle>,
    initialized: bool,
    config: Option<SiteConfig>,
    script_path: Option<ArcStr>,

    module: OnceCell<Result<ModuleHandle, RuntimeError>>,
    load_triggered: AtomicBool,
    waiting_for_first_render: AtomicBool,
    disposed: AtomicBool,
    wrap_in_class: bool,
}

impl LoadSite {
    pub fn new(
        engine: Arc<dyn ScriptEngine>,
        registry: Arc<ModuleRegistry>,
        owners: Arc<dyn OwnerIdentityLookup>,
    ) -> Self {
        Self {
            engine,
            registry,
            owners,
            render_handle: None,
            initialized: false,
            config: None,
            script_path: None,
            module: OnceCell::new(),
            load_triggered: AtomicBool::new(false),
            waiting_for_first_render: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            wrap_in_class: false,
        }
    }

    /// When enabled, an `AsClass` site without `ClassName` qualifies its calls
    /// with the owner's JS class name, as the class-wrapping build emits them.
    pub fn with_class_wrapping(mut self, enabled: bool) -> Self {
        self.wrap_in_class = enabled;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SiteState {
        if self.disposed.load(Ordering::SeqCst) {
            return SiteState::Disposed;
        }
        if self.script_path.is_none() {
            return match self.render_handle {
                Some(_) => SiteState::Attached,
                None => SiteState::Uninitialized,
            };
        }
        match self.module.get() {
            Some(Ok(_)) => SiteState::Ready,
            Some(Err(_)) => SiteState::Failed,
            None => SiteState::Resolving,
        }
    }

    /// Path resolved at parameter assignment.
    pub fn script_path(&self) -> Option<&str> {
        self.script_path.as_deref()
    }

    pub fn config(&self) -> Option<&SiteConfig> {
        self.config.as_ref()
    }

    pub fn is_global_bundle(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.global_bundle)
    }

    /// Whether anything has asked for the module yet.
    pub fn load_triggered(&self) -> bool {
        self.load_triggered.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Host lifecycle
    // -----------------------------------------------------------------------

    /// Attach the host render handle. Only allowed once.
    pub fn attach(&mut self, handle: RenderHandle) -> Result<(), RuntimeError> {
        if self.render_handle.is_some() {
            return Err(RuntimeError::DoubleAttach);
        }
        self.render_handle = Some(handle);
        Ok(())
    }

    /// Accept the site's parameters and resolve its script path.
    ///
    /// The site must be attached first. Only the first assignment is
    /// accepted; the site counts as initialized even if that assignment is
    /// rejected. The module load is armed here but not started.
    pub fn set_parameters(&mut self, params: ParameterView) -> Result<(), RuntimeError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(RuntimeError::Disposed);
        }
        if self.initialized {
            return Err(RuntimeError::Reinitialization);
        }
        let handle = self.render_handle.as_ref().ok_or(RuntimeError::NotAttached)?;
        self.initialized = true;

        let mut config = SiteConfig::from_parameters(params)?;
        let owner = match config.script_file {
            Some(_) => self.resolve_owner(handle).ok(),
            None => Some(self.resolve_owner(handle)?),
        };
        let path = resolver::resolve_script_path(&config, owner.as_ref())?;

        if self.wrap_in_class && config.as_class && config.class_name.is_none() {
            config.class_name = owner.map(|o| o.class_name.to_string());
        }

        info!(path = %path, global = config.global_bundle, "script site configured");
        self.script_path = Some(path);
        self.config = Some(config);
        Ok(())
    }

    fn resolve_owner(&self, handle: &RenderHandle) -> Result<OwnerInfo, RuntimeError> {
        let enclosing = handle.enclosing_type().ok_or_else(|| {
            RuntimeError::OwnerResolution("the Script has no enclosing component".into())
        })?;
        self.owners.owner_of(enclosing).ok_or_else(|| {
            RuntimeError::OwnerResolution(format!("no owner identity for type {enclosing}"))
        })
    }

    /// First-render signal from the host. Forces the module load once.
    pub async fn after_render(&self) -> Result<(), RuntimeError> {
        if self.config.is_none() {
            return Ok(());
        }
        if self.waiting_for_first_render.swap(false, Ordering::SeqCst) {
            self.module().await?;
        }
        Ok(())
    }

    /// Release the site.
    ///
    /// A non-global site whose load was triggered runs `OnUnload` and
    /// disposes its module. Shared handles of global bundles belong to the
    /// registry and are left alone. Disposing twice is a no-op.
    pub async fn dispose(&self) -> Result<(), RuntimeError> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let (Some(config), Some(path)) = (&self.config, &self.script_path) else {
            return Ok(());
        };
        if config.global_bundle {
            debug!(%path, "keeping shared module on dispose");
            return Ok(());
        }
        if !self.load_triggered() {
            return Ok(());
        }

        let module = match self.load(config, path).await {
            Ok(module) => module,
            Err(e) => {
                debug!(%path, error = %e, "nothing to release, load had failed");
                return Ok(());
            }
        };

        let unload = match &config.on_unload {
            Some(hook) => self
                .call(&module, &config.qualify(hook), vec![config.host_ref_arg()])
                .await
                .map(drop),
            None => Ok(()),
        };

        self.engine
            .dispose(&module)
            .await
            .map_err(|e| RuntimeError::Dispose {
                path: path.to_string(),
                reason: format!("{e:#}"),
            })?;
        debug!(%path, "disposed module");
        unload
    }

    // -----------------------------------------------------------------------
    // Invocation
    // -----------------------------------------------------------------------

    /// The loaded module, loading it (and running `OnInit`) on first use.
    /// Waits for an in-flight load instead of starting another.
    pub async fn module(&self) -> Result<ModuleHandle, RuntimeError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(RuntimeError::Disposed);
        }
        let (Some(config), Some(path)) = (&self.config, &self.script_path) else {
            return Err(RuntimeError::NotConfigured);
        };
        self.load(config, path).await
    }

    /// Call an export and return its raw result.
    pub async fn invoke(&self, identifier: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let module = self.module().await?;
        let config = self.config.as_ref().ok_or(RuntimeError::NotConfigured)?;
        self.call(&module, &config.qualify(identifier), args).await
    }

    /// Call an export and deserialize its result.
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        identifier: &str,
        args: Vec<Value>,
    ) -> Result<T, RuntimeError> {
        let value = self.invoke(identifier, args).await?;
        serde_json::from_value(value).map_err(|e| RuntimeError::Invocation {
            identifier: identifier.to_string(),
            reason: format!("unexpected result: {e}"),
        })
    }

    /// Call an export, discarding its result.
    pub async fn invoke_void(&self, identifier: &str, args: Vec<Value>) -> Result<(), RuntimeError> {
        self.invoke(identifier, args).await.map(drop)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load(&self, config: &SiteConfig, path: &ArcStr) -> Result<ModuleHandle, RuntimeError> {
        self.load_triggered.store(true, Ordering::SeqCst);
        self.module
            .get_or_init(|| self.load_module(config, path))
            .await
            .clone()
    }

    async fn load_module(
        &self,
        config: &SiteConfig,
        path: &ArcStr,
    ) -> Result<ModuleHandle, RuntimeError> {
        let module = if config.global_bundle {
            self.registry.get_or_import(self.engine.as_ref(), path).await?
        } else {
            debug!(%path, "importing module");
            import_module(self.engine.as_ref(), path).await?
        };

        if let Some(hook) = &config.on_init {
            let identifier = config.qualify(hook);
            if let Err(e) = self
                .call(&module, &identifier, vec![config.host_ref_arg()])
                .await
            {
                if !config.global_bundle {
                    if let Err(dispose_err) = self.engine.dispose(&module).await {
                        warn!(%path, error = %dispose_err, "failed to release module after init failure");
                    }
                }
                return Err(e);
            }
            debug!(%path, hook = %identifier, "init hook completed");
        }

        Ok(module)
    }

    async fn call(
        &self,
        module: &ModuleHandle,
        identifier: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.engine
            .invoke(module, identifier, args)
            .await
            .map_err(|e| RuntimeError::Invocation {
                identifier: identifier.to_string(),
                reason: format!("{e:#}"),
            })
    }
}
