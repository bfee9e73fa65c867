//! Built-in suggestion providers and their wire formats.

use serde_json::Value;

/// How a provider's suggestions are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Cross-origin script that calls back into a registered function.
    /// The template carries `{query}` and `{callback}` placeholders.
    RemoteScript { request_template: &'static str },
    /// Same-origin JSON endpoint, possibly proxied
    DirectFetch { proxy_path: &'static str },
}

/// A suggestion provider
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub transport: TransportKind,
    parser: fn(&Value) -> Vec<String>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl ProviderDescriptor {
    /// Extract suggestion strings from a provider payload. Any deviation from
    /// the expected shape yields an empty list.
    pub fn parse_response(&self, data: &Value) -> Vec<String> {
        (self.parser)(data)
    }
}

static PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        name: "Google",
        transport: TransportKind::RemoteScript {
            request_template:
                "https://suggestqueries.google.com/complete/search?client=youtube&q={query}&jsonp={callback}",
        },
        parser: parse_google,
    },
    ProviderDescriptor {
        name: "Baidu",
        transport: TransportKind::RemoteScript {
            request_template: "https://sp0.baidu.com/5a1Fazu8AA54nxGko9WTAnF6hhy/su?wd={query}&cb={callback}",
        },
        parser: parse_baidu,
    },
    ProviderDescriptor {
        name: "Bing",
        transport: TransportKind::RemoteScript {
            request_template:
                "https://api.bing.com/osjson.aspx?query={query}&JsonType=callback&JsonCallback={callback}",
        },
        parser: parse_bing,
    },
    ProviderDescriptor {
        name: "DuckDuckGo",
        transport: TransportKind::RemoteScript {
            request_template: "https://duckduckgo.com/ac/?q={query}&callback={callback}&type=list",
        },
        parser: parse_duckduckgo,
    },
    ProviderDescriptor {
        name: "Bilibili",
        transport: TransportKind::DirectFetch {
            proxy_path: "/api/bilibili",
        },
        parser: parse_bilibili,
    },
];

/// Find a built-in provider by exact name
pub fn lookup(name: &str) -> Option<&'static ProviderDescriptor> {
    PROVIDERS.iter().find(|provider| provider.name == name)
}

pub fn providers() -> &'static [ProviderDescriptor] {
    PROVIDERS
}

pub fn build_remote_script_url(
    descriptor: &ProviderDescriptor,
    query: &str,
    callback_name: &str,
) -> Result<String, RegistryError> {
    let TransportKind::RemoteScript { request_template } = descriptor.transport else {
        return Err(RegistryError::MissingTemplate(descriptor.name));
    };
    Ok(request_template
        .replace("{query}", &urlencoding::encode(query))
        .replace("{callback}", &urlencoding::encode(callback_name)))
}

pub fn build_fetch_url(descriptor: &ProviderDescriptor, query: &str) -> Result<String, RegistryError> {
    let TransportKind::DirectFetch { proxy_path } = descriptor.transport else {
        return Err(RegistryError::MissingProxyPath(descriptor.name));
    };
    Ok(format!("{}?term={}", proxy_path, urlencoding::encode(query)))
}

/// Misconfigured provider descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    MissingTemplate(&'static str),
    MissingProxyPath(&'static str),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::MissingTemplate(name) => {
                write!(f, "Provider {} has no remote script template", name)
            }
            RegistryError::MissingProxyPath(name) => write!(f, "Provider {} has no proxy path", name),
        }
    }
}

impl std::error::Error for RegistryError {}

fn string_items(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::to_string)
        .collect()
}

/// `[query, [suggestion | [suggestion, ...], ...]]`
fn parse_google(data: &Value) -> Vec<String> {
    let Some(items) = data.get(1).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Array(tuple) => tuple.first().and_then(Value::as_str),
            other => other.as_str(),
        })
        .map(str::to_string)
        .collect()
}

/// `{ s: [suggestion, ...] }`
fn parse_baidu(data: &Value) -> Vec<String> {
    match data.as_object().and_then(|object| object.get("s")) {
        Some(list) => string_items(list),
        None => Vec::new(),
    }
}

/// `[query, [suggestion, ...]]`
fn parse_bing(data: &Value) -> Vec<String> {
    if !data.is_array() {
        return Vec::new();
    }
    data.get(1).map(string_items).unwrap_or_default()
}

/// `[{ phrase: suggestion }, ...]`
fn parse_duckduckgo(data: &Value) -> Vec<String> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_object()?.get("phrase")?.as_str())
        .map(str::to_string)
        .collect()
}

/// `{ code: 0, result: { tag: [{ value: suggestion }, ...] } }`
fn parse_bilibili(data: &Value) -> Vec<String> {
    let Some(object) = data.as_object() else {
        return Vec::new();
    };
    if object.get("code").and_then(Value::as_i64) != Some(0) {
        return Vec::new();
    }
    let Some(tags) = object
        .get("result")
        .and_then(Value::as_object)
        .and_then(|result| result.get("tag"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    tags.iter()
        .filter_map(|tag| tag.as_object()?.get("value")?.as_str())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(name: &str, data: Value) -> Vec<String> {
        lookup(name).unwrap().parse_response(&data)
    }

    #[test]
    fn test_lookup_is_case_exact() {
        assert!(lookup("Google").is_some());
        assert!(lookup("google").is_none());
        assert!(lookup("Yahoo").is_none());
        assert_eq!(providers().len(), 5);
    }

    #[test]
    fn test_google_parser() {
        assert_eq!(
            parse("Google", json!(["q", ["a", ["b", 0, []], 5, [7]]])),
            vec!["a", "b"]
        );
        assert!(parse("Google", json!({ "1": ["a"] })).is_empty());
        assert!(parse("Google", json!(["q", "a"])).is_empty());
    }

    #[test]
    fn test_baidu_parser() {
        assert_eq!(parse("Baidu", json!({ "q": "x", "s": ["x1", 2, "x2"] })), vec!["x1", "x2"]);
        assert!(parse("Baidu", json!({ "s": "x" })).is_empty());
        assert!(parse("Baidu", json!(["s"])).is_empty());
    }

    #[test]
    fn test_bing_parser() {
        assert_eq!(parse("Bing", json!(["q", ["a", null, "b"]])), vec!["a", "b"]);
        assert!(parse("Bing", json!({ "1": ["a"] })).is_empty());
    }

    #[test]
    fn test_duckduckgo_parser() {
        assert_eq!(
            parse("DuckDuckGo", json!([{ "phrase": "a" }, { "phrase": 1 }, "b", { "phrase": "c" }])),
            vec!["a", "c"]
        );
        assert!(parse("DuckDuckGo", json!({ "phrase": "a" })).is_empty());
    }

    #[test]
    fn test_bilibili_parser() {
        let ok = json!({ "code": 0, "result": { "tag": [{ "value": "x" }, { "value": 1 }, { "value": "y" }] } });
        assert_eq!(parse("Bilibili", ok), vec!["x", "y"]);

        let failed = json!({ "code": -400, "result": { "tag": [{ "value": "x" }] } });
        assert!(parse("Bilibili", failed).is_empty());
        assert!(parse("Bilibili", json!({ "code": 0, "result": { "tag": {} } })).is_empty());
        assert!(parse("Bilibili", json!({ "code": 0 })).is_empty());
    }

    #[test]
    fn test_remote_script_url() {
        let google = lookup("Google").unwrap();
        let url = build_remote_script_url(google, "a b&c", "jsonp_cb_1_0").unwrap();
        assert_eq!(
            url,
            "https://suggestqueries.google.com/complete/search?client=youtube&q=a%20b%26c&jsonp=jsonp_cb_1_0"
        );

        let bilibili = lookup("Bilibili").unwrap();
        assert_eq!(
            build_remote_script_url(bilibili, "x", "cb"),
            Err(RegistryError::MissingTemplate("Bilibili"))
        );
    }

    #[test]
    fn test_fetch_url() {
        let bilibili = lookup("Bilibili").unwrap();
        assert_eq!(build_fetch_url(bilibili, "原神").unwrap(), "/api/bilibili?term=%E5%8E%9F%E7%A5%9E");

        let bing = lookup("Bing").unwrap();
        assert_eq!(build_fetch_url(bing, "x"), Err(RegistryError::MissingProxyPath("Bing")));
    }
}
