//! サービス間参照の展開
//!
//! 環境変数値に含まれる `{service.port.host}` を、同じ環境（同じスロット）での
//! 参照先サービスのホストポートに置き換えます。
//! 解決できない参照はそのまま残します（タイポが目で見て分かるように）。

use crate::model::ProjectConfig;
use crate::port::host_port;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_-]+)\.([A-Za-z0-9_-]+)\.host\}").expect("valid reference pattern")
});

/// `{service.port.host}` 参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub service: String,
    pub port: String,
}

impl Reference {
    /// カタログ上でこの参照を解決する
    pub fn resolve(&self, config: &ProjectConfig, slot: u32) -> Option<u32> {
        let base = config.service(&self.service)?.port(&self.port)?.base;
        Some(host_port(base, slot, config.ports.offset))
    }
}

/// 文字列に含まれる参照を出現順に列挙
pub fn find_references(value: &str) -> Vec<Reference> {
    REFERENCE_PATTERN
        .captures_iter(value)
        .map(|caps| Reference {
            service: caps[1].to_string(),
            port: caps[2].to_string(),
        })
        .collect()
}

/// すべての参照を1パスで展開
pub fn resolve_references(value: &str, config: &ProjectConfig, slot: u32) -> String {
    REFERENCE_PATTERN
        .replace_all(value, |caps: &Captures| {
            let reference = Reference {
                service: caps[1].to_string(),
                port: caps[2].to_string(),
            };
            match reference.resolve(config, slot) {
                Some(port) => port.to_string(),
                None => {
                    debug!(
                        service = %reference.service,
                        port = %reference.port,
                        "Unresolved service reference left as-is"
                    );
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortSpec, ServiceSource, ServiceSpec};

    fn config() -> ProjectConfig {
        let mut api = ServiceSpec::new("api", ServiceSource::Image("node:20".to_string()));
        api.ports.push(PortSpec {
            name: "main".to_string(),
            base: 3000,
        });
        let mut db = ServiceSpec::new("db", ServiceSource::Image("postgres:16".to_string()));
        db.ports.push(PortSpec {
            name: "main".to_string(),
            base: 5432,
        });
        ProjectConfig {
            services: vec![api, db],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_single_reference() {
        let config = config();

        assert_eq!(
            resolve_references("http://localhost:{api.main.host}", &config, 2),
            "http://localhost:5000"
        );
    }

    #[test]
    fn test_main_slot_resolves_to_base_port() {
        let config = config();

        assert_eq!(resolve_references("{db.main.host}", &config, 0), "5432");
    }

    #[test]
    fn test_multiple_occurrences_in_one_value() {
        let config = config();

        let resolved = resolve_references(
            "api={api.main.host},db={db.main.host},again={api.main.host}",
            &config,
            1,
        );
        assert_eq!(resolved, "api=4000,db=6432,again=4000");
    }

    #[test]
    fn test_unresolvable_reference_left_verbatim() {
        let config = config();

        assert_eq!(
            resolve_references("{web.main.host} {api.debug.host}", &config, 1),
            "{web.main.host} {api.debug.host}"
        );
    }

    #[test]
    fn test_partial_resolution() {
        let config = config();

        assert_eq!(
            resolve_references("{api.main.host}/{nope.main.host}", &config, 1),
            "4000/{nope.main.host}"
        );
    }

    #[test]
    fn test_matches_independent_host_port() {
        let config = config();

        for slot in 0..5 {
            let resolved = resolve_references("{api.main.host}", &config, slot);
            assert_eq!(resolved, host_port(3000, slot, 1000).to_string());
        }
    }

    #[test]
    fn test_non_reference_braces_untouched() {
        let config = config();

        assert_eq!(
            resolve_references("{api.main} {{ VAR }} {api.main.port}", &config, 1),
            "{api.main} {{ VAR }} {api.main.port}"
        );
    }

    #[test]
    fn test_find_references() {
        let refs = find_references("a {api.main.host} b {db.replica.host}");
        assert_eq!(
            refs,
            vec![
                Reference {
                    service: "api".to_string(),
                    port: "main".to_string()
                },
                Reference {
                    service: "db".to_string(),
                    port: "replica".to_string()
                },
            ]
        );
    }
}
