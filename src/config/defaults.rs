//! Default values for the host configuration keys.

use serde_json::{Value, json};

pub const DEFAULT_PORT: u16 = 8000;

/// Defaults for the core options and the options of the built-in plugins.
pub fn builtin_defaults() -> Value {
    json!({
        "port": DEFAULT_PORT,
        "https": false,
        "historyApiFallback": false,
        "serve": true,
        "livereload": true,
        "cors": true,
        "open": "local",
        "logger": { "level": "warn" },
        "urls": {
            "style": "/devserver/client.css",
            "script": "/devserver/client.js",
        },
    })
}
