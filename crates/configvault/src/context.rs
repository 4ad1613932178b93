//! Record keys and `@context` dialect URIs derived from a module name.

/// Storage key of a module's single config record.
pub fn record_key(module_name: &str) -> String {
    format!("{module_name}-config")
}

/// Dialect URI stamped into a config document's `@context` field.
///
/// The two credential modules keep their historic `/credentials` URIs;
/// every other module gets a `/config` document.
pub fn context_uri(module_name: &str) -> String {
    match module_name {
        "sockethub-credentials" | "irc-credentials" => {
            format!("http://remotestorage.io/spec/modules/{module_name}/credentials")
        }
        _ => format!("http://remotestorage.io/spec/modules/{module_name}/config"),
    }
}
