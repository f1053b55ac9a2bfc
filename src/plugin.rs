//! Dynamic loading of components from shared libraries.
//!
//! Grounded on `DSPatch::Plugin` / `internal::Plugin`
//! (`examples/original_source/include/dspatch/Plugin.h`,
//! `examples/original_source/src/Plugin.cpp`): open a shared library,
//! resolve one well-known factory symbol, and fail the whole load if
//! either step fails. The original open-codes `dlopen`/`dlsym` vs.
//! `LoadLibrary`/`GetProcAddress` behind a `#ifdef _WIN32`; `libloading`
//! (used elsewhere in the retrieval pack, e.g.
//! `manifests/mkaudio-company-mkaudiolibrary/Cargo.toml`) covers both
//! platforms through one safe-ish `Library`/`Symbol` API instead.
//!
//! A plugin library exports `flowmesh_create_component` by building its
//! component with [`crate::component::Component::new_boxed`] and handing
//! back the raw pointer via `Box::into_raw`:
//!
//! ```ignore
//! #[no_mangle]
//! pub extern "C" fn flowmesh_create_component() -> *mut flowmesh::component::Component {
//!     Box::into_raw(flowmesh::component::Component::new_boxed(
//!         ProcessOrder::InOrder,
//!         vec!["in".into()],
//!         vec!["out".into()],
//!         MyProcess::default(),
//!     ))
//! }
//! ```

use crate::component::ComponentHandle;
use crate::error::PluginError;
use libloading::{Library, Symbol};
use log::debug;
use std::path::Path;
use std::sync::Arc;

/// The symbol a plugin library must export: a parameterless factory
/// returning a freshly constructed, boxed component.
const FACTORY_SYMBOL: &[u8] = b"flowmesh_create_component";

type CreateFn = unsafe extern "C" fn() -> *mut crate::component::Component;

/// A loaded plugin library. Dropping it unloads the library — any
/// component handles it produced keep working (their state lives in the
/// `Arc` the factory handed back, not in the library's data segment)
/// until those `Arc`s themselves are dropped, but calling back into
/// library code (e.g. a `Process::process` whose vtable lives in the
/// unloaded library) after this point is undefined behavior, same as the
/// original's `~Plugin` closing the handle unconditionally.
pub struct Plugin {
    _library: Library,
    create: CreateFn,
}

impl Plugin {
    /// Load a plugin from `path`, resolving its factory symbol.
    ///
    /// # Safety
    /// Loading and calling into an arbitrary shared library is inherently
    /// unsafe: the library must actually export `flowmesh_create_component`
    /// with the exact signature above, built against a compatible version
    /// of this crate.
    pub unsafe fn load(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref();
        let library = Library::new(path).map_err(PluginError::Load)?;
        let create: Symbol<CreateFn> = library
            .get(FACTORY_SYMBOL)
            .map_err(PluginError::MissingFactory)?;
        let create = *create;
        debug!("loaded plugin {}", path.display());
        Ok(Plugin {
            _library: library,
            create,
        })
    }

    /// Always `true`: a `Plugin` only exists once [`Plugin::load`] has
    /// already succeeded, unlike the original where a default-constructed
    /// `Plugin` could carry a null handle. Kept for parity with the
    /// original API.
    pub fn is_loaded(&self) -> bool {
        true
    }

    /// Construct a new component instance via the plugin's factory.
    pub fn create(&self) -> ComponentHandle {
        let raw = unsafe { (self.create)() };
        let boxed = unsafe { Box::from_raw(raw) };
        Arc::new(*boxed)
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        debug!("unloading plugin");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SignalBus;
    use crate::component::{Component, Process, ProcessOrder};

    struct Echo;
    impl Process for Echo {
        fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
            if let Some(&v) = inputs.get::<i64>(0) {
                outputs.set(0, v);
            }
        }
    }

    /// Stands in for an actual `cdylib`'s exported `flowmesh_create_component`:
    /// builds a component with [`Component::new_boxed`] and hands back the raw
    /// pointer the same way a real plugin's factory export would, then
    /// reclaims it exactly as [`Plugin::create`] does. Building and loading a
    /// real shared library isn't possible without the Rust toolchain, so this
    /// round-trips the raw-pointer contract in-crate instead.
    unsafe extern "C" fn fake_factory() -> *mut crate::component::Component {
        let boxed = Component::new_boxed(
            ProcessOrder::InOrder,
            vec!["in".into()],
            vec!["out".into()],
            Echo,
        );
        Box::into_raw(boxed)
    }

    #[test]
    fn raw_pointer_contract_round_trips_like_a_plugin_factory() {
        let create: CreateFn = fake_factory;
        let raw = unsafe { create() };
        let boxed = unsafe { Box::from_raw(raw) };
        let handle: ComponentHandle = Arc::new(*boxed);

        assert_eq!(handle.input_count(), 1);
        assert_eq!(handle.output_count(), 1);
        assert_eq!(handle.input_name(0), "in");
        assert_eq!(handle.output_name(0), "out");
    }
}
