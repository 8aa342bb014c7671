//! ポート計算
//!
//! スロットからホストポートを導出する唯一の関数。
//! 定義ファイル生成・status 表示・env 出力はすべてここを経由する。

use crate::model::{PortPolicy, ProjectConfig};

/// `base_port + slot * offset`
///
/// スロット 0（メイン環境）ではベースポートがそのまま返る。
/// 設定の検証とレジストリの範囲チェックを通った値では飽和しない。
pub fn host_port(base_port: u16, slot: u32, offset: u32) -> u32 {
    u32::from(base_port).saturating_add(slot.saturating_mul(offset))
}

/// ホスト/コンテナのポート対応
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub service: String,
    pub port: String,
    pub container: u16,
    pub host: u32,
}

/// 指定スロットでの全サービスのポート表を作成
pub fn port_table(config: &ProjectConfig, slot: u32) -> Vec<PortMapping> {
    let PortPolicy { offset, .. } = config.ports;
    config
        .services
        .iter()
        .flat_map(|service| {
            service.ports.iter().map(move |port| PortMapping {
                service: service.name.clone(),
                port: port.name.clone(),
                container: port.base,
                host: host_port(port.base, slot, offset),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortSpec, ServiceSource, ServiceSpec};

    #[test]
    fn test_main_slot_is_identity() {
        assert_eq!(host_port(3000, 0, 1000), 3000);
        assert_eq!(host_port(5432, 0, 100), 5432);
    }

    #[test]
    fn test_host_port_examples() {
        assert_eq!(host_port(3000, 1, 1000), 4000);
        assert_eq!(host_port(3000, 2, 1000), 5000);
        assert_eq!(host_port(5432, 3, 10), 5462);
    }

    #[test]
    fn test_strictly_increasing_in_slot() {
        let mut previous = host_port(8080, 0, 7);
        for slot in 1..50 {
            let current = host_port(8080, slot, 7);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_huge_slot_does_not_overflow() {
        assert_eq!(host_port(3000, 5_000_000, 1000), u32::MAX);
        assert_eq!(host_port(u16::MAX, u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_port_table() {
        let mut api = ServiceSpec::new("api", ServiceSource::Image("node:20".to_string()));
        api.ports = vec![
            PortSpec {
                name: "main".to_string(),
                base: 3000,
            },
            PortSpec {
                name: "debug".to_string(),
                base: 9229,
            },
        ];
        let config = ProjectConfig {
            services: vec![api],
            ..Default::default()
        };

        let table = port_table(&config, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].host, 5000);
        assert_eq!(table[0].container, 3000);
        assert_eq!(table[1].port, "debug");
        assert_eq!(table[1].host, 11229);
    }
}
