//! The demo's plugins, registered explicitly by `main`.

pub mod echo;
pub mod greet;
pub mod karma;
pub mod karma_store;
pub mod logger;
pub mod version;

use chime::prelude::*;
use chime::runtime::RuntimeResult;

/// Makes every demo plugin available for activation.
pub fn register_all(runtime: &mut ChimeRuntime) -> RuntimeResult<()> {
    for descriptor in [
        logger::descriptor(),
        echo::descriptor(),
        karma_store::descriptor(),
        karma::descriptor(),
        greet::descriptor(),
        version::descriptor(),
    ] {
        runtime.register_plugin(descriptor)?;
    }
    Ok(())
}
