use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use super::assets::PluginAssets;
use super::error::PluginError;
use super::module::{ModuleManifest, PluginHooks, PluginModule};

/// A request to load one plugin.
///
/// Descriptors come from the host's `plugins` list, from the command line
/// (`[@scope/]name[@version][?key=value&...]`), or are built in code. A
/// descriptor carrying hooks or assets is the plugin itself and needs no
/// resolution.
#[derive(Clone, Debug, Default)]
pub struct PluginDescriptor {
    pub name: String,
    /// Local source directory, relative to the project root unless absolute.
    pub path: Option<PathBuf>,
    /// Version constraint used when installing.
    pub version: Option<String>,
    /// Install even when `path` is given.
    pub install: bool,
    pub inplace: bool,
    /// Initial plugin-scoped configuration.
    pub options: Map<String, Value>,
    pub module: PluginModule,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn force_install(mut self) -> Self {
        self.install = true;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_hooks(mut self, hooks: PluginHooks) -> Self {
        self.module.hooks = hooks;
        self
    }

    pub fn with_assets(mut self, assets: PluginAssets) -> Self {
        self.module.assets = Some(assets);
        self
    }

    /// Embed a whole module; the descriptor becomes an in-place plugin.
    pub fn with_module(mut self, module: PluginModule) -> Self {
        self.module = module;
        self.inplace = true;
        self
    }

    pub fn is_inplace(&self) -> bool {
        self.inplace || !self.module.hooks.is_empty() || self.module.assets.is_some()
    }
}

impl FromStr for PluginDescriptor {
    type Err = PluginError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PluginError::InvalidDescriptor {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (spec, query) = match input.split_once('?') {
            Some((spec, query)) => (spec, Some(query)),
            None => (input, None),
        };

        // A leading '@' belongs to the scope, not the version.
        let version_at = spec
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .map(|(i, _)| i);
        let (name, version) = match version_at {
            Some(i) => (&spec[..i], Some(&spec[i + 1..])),
            None => (spec, None),
        };

        if name.is_empty() || name == "@" {
            return Err(invalid("missing plugin name"));
        }
        if name.starts_with('@') && !name.contains('/') {
            return Err(invalid("scoped name must look like @scope/name"));
        }
        if version.is_some_and(str::is_empty) {
            return Err(invalid("empty version"));
        }

        let mut descriptor = PluginDescriptor::new(name);
        descriptor.version = version.map(str::to_string);

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, raw) = pair.split_once('=').unwrap_or((pair, "true"));
            let key = urlencoding::decode(key).map_err(|e| invalid(&e.to_string()))?;
            let raw = urlencoding::decode(raw).map_err(|e| invalid(&e.to_string()))?;
            descriptor
                .options
                .insert(key.into_owned(), parse_option_value(&raw));
        }

        Ok(descriptor)
    }
}

fn parse_option_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescriptorInput {
    Name(String),
    Full(RawDescriptor),
}

#[derive(Deserialize)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    install: bool,
    #[serde(default)]
    inplace: bool,
    #[serde(default, alias = "config")]
    options: Map<String, Value>,
    #[serde(flatten)]
    module: ModuleManifest,
}

impl<'de> Deserialize<'de> for PluginDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawDescriptorInput::deserialize(deserializer)? {
            RawDescriptorInput::Name(input) => input.parse().map_err(serde::de::Error::custom),
            RawDescriptorInput::Full(raw) => Ok(PluginDescriptor {
                name: raw.name,
                path: raw.path,
                version: raw.version,
                install: raw.install,
                inplace: raw.inplace,
                options: raw.options,
                module: raw.module.into(),
            }),
        }
    }
}

/// Package name for a plugin: `qrcode` becomes `<prefix>qrcode` and
/// `@acme/qrcode` becomes `@acme/<prefix>qrcode`.
pub fn normalize_plugin_name(name: &str, prefix: &str) -> String {
    let (scope, bare) = match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((scope, bare)) => (Some(scope), bare),
        None => (None, name),
    };
    let bare = if bare.starts_with(prefix) {
        bare.to_string()
    } else {
        format!("{prefix}{bare}")
    };
    match scope {
        Some(scope) => format!("@{scope}/{bare}"),
        None => bare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "devserver-plugin-";

    #[test]
    fn test_parse_name_only() {
        let d: PluginDescriptor = "qrcode".parse().unwrap();
        assert_eq!(d.name, "qrcode");
        assert!(d.version.is_none());
        assert!(d.options.is_empty());
        assert!(!d.is_inplace());
    }

    #[test]
    fn test_parse_version_and_options() {
        let d: PluginDescriptor = "qrcode@^1.2.0?ui=false&size=200&label=hello%20world&ratio=0.5&flag"
            .parse()
            .unwrap();
        assert_eq!(d.name, "qrcode");
        assert_eq!(d.version.as_deref(), Some("^1.2.0"));
        assert_eq!(d.options.get("ui"), Some(&json!(false)));
        assert_eq!(d.options.get("size"), Some(&json!(200)));
        assert_eq!(d.options.get("label"), Some(&json!("hello world")));
        assert_eq!(d.options.get("ratio"), Some(&json!(0.5)));
        assert_eq!(d.options.get("flag"), Some(&json!(true)));
    }

    #[test]
    fn test_parse_scoped() {
        let d: PluginDescriptor = "@acme/qrcode@1.0.0".parse().unwrap();
        assert_eq!(d.name, "@acme/qrcode");
        assert_eq!(d.version.as_deref(), Some("1.0.0"));

        let d: PluginDescriptor = "@acme/qrcode".parse().unwrap();
        assert_eq!(d.name, "@acme/qrcode");
        assert!(d.version.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<PluginDescriptor>().is_err());
        assert!("@?x=1".parse::<PluginDescriptor>().is_err());
        assert!("@acme".parse::<PluginDescriptor>().is_err());
        assert!("qrcode@".parse::<PluginDescriptor>().is_err());
    }

    #[test]
    fn test_deserialize() {
        let list: Vec<PluginDescriptor> = serde_json::from_value(json!([
            "livereload",
            {"name": "qrcode", "version": "^1.0.0", "options": {"ui": true}},
            {"name": "local", "path": "./plugins/local", "install": true},
            {"name": "banner", "assets": {"style": ["banner.css"]}}
        ]))
        .unwrap();

        assert_eq!(list[0].name, "livereload");
        assert_eq!(list[1].options.get("ui"), Some(&json!(true)));
        assert!(list[2].install);
        assert_eq!(list[2].path, Some(PathBuf::from("./plugins/local")));
        assert!(!list[2].is_inplace());
        assert!(list[3].is_inplace());
    }

    #[test]
    fn test_inplace_detection() {
        assert!(
            PluginDescriptor::new("a")
                .with_hooks(PluginHooks::new().on_option_change(|_| {}))
                .is_inplace()
        );
        assert!(
            PluginDescriptor::new("b")
                .with_module(PluginModule::new())
                .is_inplace()
        );
        assert!(!PluginDescriptor::new("c").with_path("/x").is_inplace());
    }

    #[test]
    fn test_normalize_plugin_name() {
        assert_eq!(normalize_plugin_name("qrcode", PREFIX), "devserver-plugin-qrcode");
        assert_eq!(
            normalize_plugin_name("devserver-plugin-qrcode", PREFIX),
            "devserver-plugin-qrcode"
        );
        assert_eq!(
            normalize_plugin_name("@acme/qrcode", PREFIX),
            "@acme/devserver-plugin-qrcode"
        );
        assert_eq!(
            normalize_plugin_name("@acme/devserver-plugin-qrcode", PREFIX),
            "@acme/devserver-plugin-qrcode"
        );
    }
}
