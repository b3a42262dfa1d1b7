//! JavaScript shipped with every build.

/// The browser-side module loader, emitted as `<modules_dir>/webrequire.js`.
///
/// It defines `window.registerModule(requirements, name, body)`, runs each
/// body once all of its requirements have run, and drains
/// `window.moduleQueue` once the document has loaded.
pub const LOADER_SOURCE: &str = include_str!("../assets/webrequire.js");

/// Prepended to every pack.
///
/// Until the loader initializes, `registerModule` calls are queued on
/// `window.moduleQueue`, so packs can arrive in any order.
pub const PACK_PROLOGUE: &str = include_str!("../assets/prologue.js");

/// Inline snippet for pages that want the queue in place before any pack
/// script is parsed.
pub const BOOTSTRAP_SNIPPET: &str =
    "<script>window.moduleQueue=window.moduleQueue||[];window.registerModule=window.registerModule||function(){window.moduleQueue.push(Array.prototype.slice.call(arguments))};</script>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_defines_register_module() {
        assert!(LOADER_SOURCE.contains("window.registerModule = registerModule"));
        assert!(LOADER_SOURCE.contains("DOMContentLoaded"));
    }

    #[test]
    fn prologue_only_installs_queue_when_missing() {
        assert!(PACK_PROLOGUE.contains("window.registerModule || function"));
        assert!(PACK_PROLOGUE.ends_with('\n'));
    }
}
