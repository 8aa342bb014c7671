use super::*;
use crate::model::{
    BindMount, NamedVolume, PortSpec, ProjectInfo, ServiceSource, ServiceSpec,
};
use crate::parser::parse_config_string;
use std::path::PathBuf;

fn shop_config() -> ProjectConfig {
    let mut api = ServiceSpec::new("api", ServiceSource::Image("node:20".to_string()));
    api.ports.push(PortSpec {
        name: "main".to_string(),
        base: 3000,
    });
    api.environment.insert(
        "CORS_ORIGIN".to_string(),
        "http://localhost:{web.main.host}".to_string(),
    );

    let mut web = ServiceSpec::new(
        "web",
        ServiceSource::Build {
            context: PathBuf::from("./web"),
            dockerfile: None,
        },
    );
    web.ports.push(PortSpec {
        name: "main".to_string(),
        base: 5173,
    });
    web.environment.insert(
        "API_URL".to_string(),
        "http://localhost:{api.main.host}".to_string(),
    );

    ProjectConfig {
        project: ProjectInfo {
            name: "shop".to_string(),
            ..Default::default()
        },
        services: vec![api, web],
        ..Default::default()
    }
}

#[test]
fn test_namespace() {
    let config = shop_config();

    assert_eq!(namespace(&config, None), "shop");
    assert_eq!(namespace(&config, Some("feature-x")), "shop-wt-feature-x");
}

#[test]
fn test_end_to_end_ports_and_references() {
    let config = shop_config();

    let compose = generate_definition(&config, Some("feature-x"), 1);

    let api = compose.service("api").unwrap();
    assert_eq!(api.container_name, "shop-wt-feature-x-api");
    assert_eq!(api.ports, vec!["4000:3000"]);
    assert_eq!(api.environment["CORS_ORIGIN"], "http://localhost:6173");

    let web = compose.service("web").unwrap();
    assert_eq!(web.ports, vec!["6173:5173"]);
    assert_eq!(web.environment["API_URL"], "http://localhost:4000");
}

#[test]
fn test_second_slot_ports() {
    let config = shop_config();

    let compose = generate_definition(&config, Some("bugfix"), 2);
    assert_eq!(compose.service("api").unwrap().ports, vec!["5000:3000"]);
}

#[test]
fn test_main_uses_base_ports() {
    let config = shop_config();

    let compose = generate_definition(&config, None, 0);
    assert_eq!(compose.name, "shop");
    assert_eq!(compose.service("api").unwrap().ports, vec!["3000:3000"]);
    assert_eq!(compose.service("api").unwrap().container_name, "shop-api");
    assert_eq!(
        compose.service("web").unwrap().environment["API_URL"],
        "http://localhost:3000"
    );
}

#[test]
fn test_services_follow_catalog_order() {
    let config = shop_config();

    let compose = generate_definition(&config, Some("x"), 1);
    let names: Vec<_> = compose.services.names().collect();
    assert_eq!(names, vec!["api", "web"]);
}

#[test]
fn test_generation_is_deterministic() {
    let config = shop_config();

    let first = generate_definition(&config, Some("x"), 3).to_yaml().unwrap();
    let second = generate_definition(&config, Some("x"), 3).to_yaml().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_build_source_defaults_dockerfile() {
    let config = shop_config();

    let compose = generate_definition(&config, Some("x"), 1);
    let web = compose.service("web").unwrap();
    assert!(web.image.is_none());
    let build = web.build.as_ref().unwrap();
    assert_eq!(build.context, "./web");
    assert_eq!(build.dockerfile, DEFAULT_DOCKERFILE);
}

#[test]
fn test_network_is_namespace_only() {
    let config = shop_config();

    let compose = generate_definition(&config, Some("x"), 1);
    assert_eq!(compose.service("api").unwrap().networks, vec!["shop-wt-x"]);
    let network = &compose.networks["shop-wt-x"];
    assert_eq!(network.name, "shop-wt-x");
    assert_eq!(network.driver, "bridge");
    assert_eq!(compose.networks.len(), 1);
}

#[test]
fn test_named_volumes_are_qualified_once() {
    let mut config = shop_config();
    for service in &mut config.services {
        service.volumes.push(NamedVolume {
            name: "cache".to_string(),
            container: "/cache".to_string(),
        });
    }
    config.services[0].mounts.push(BindMount {
        host: "./api".to_string(),
        container: "/app".to_string(),
    });

    let compose = generate_definition(&config, Some("x"), 1);

    assert_eq!(
        compose.service("api").unwrap().volumes,
        vec!["./api:/app", "shop-wt-x-cache:/cache"]
    );
    assert_eq!(compose.volumes.len(), 1);
    assert_eq!(compose.volumes["shop-wt-x-cache"].name, "shop-wt-x-cache");
}

#[test]
fn test_main_volumes_stay_unqualified() {
    let mut config = shop_config();
    config.services[0].volumes.push(NamedVolume {
        name: "pgdata".to_string(),
        container: "/var/lib/postgresql/data".to_string(),
    });

    let compose = generate_definition(&config, None, 0);
    assert_eq!(
        compose.service("api").unwrap().volumes,
        vec!["pgdata:/var/lib/postgresql/data"]
    );
    assert!(compose.volumes.contains_key("pgdata"));
}

#[test]
fn test_http_healthcheck_uses_container_port() {
    let mut config = shop_config();
    config.services[0].healthcheck = Some(HealthCheckSpec {
        path: Some("/health".to_string()),
        ..Default::default()
    });

    let compose = generate_definition(&config, Some("x"), 2);
    let hc = compose.service("api").unwrap().healthcheck.as_ref().unwrap();

    assert_eq!(
        hc.test,
        vec!["CMD", "curl", "-f", "http://localhost:3000/health"]
    );
    assert_eq!(hc.interval, DEFAULT_HEALTH_INTERVAL);
    assert_eq!(hc.retries, DEFAULT_HEALTH_RETRIES);
    assert_eq!(hc.start_period, DEFAULT_HEALTH_START_PERIOD);
    assert!(hc.timeout.is_none());
}

#[test]
fn test_shell_healthcheck_with_overrides() {
    let mut config = shop_config();
    config.services[0].ports.clear();
    config.services[0].healthcheck = Some(HealthCheckSpec {
        path: Some("/health".to_string()),
        test: Some("pg_isready -U postgres".to_string()),
        interval: Some("5s".to_string()),
        timeout: Some("3s".to_string()),
        retries: Some(10),
        start_period: Some("1m".to_string()),
    });

    let compose = generate_definition(&config, Some("x"), 1);
    let hc = compose.service("api").unwrap().healthcheck.as_ref().unwrap();

    // main ポートがないので path は使えない
    assert_eq!(hc.test, vec!["CMD-SHELL", "pg_isready -U postgres"]);
    assert_eq!(hc.interval, "5s");
    assert_eq!(hc.timeout.as_deref(), Some("3s"));
    assert_eq!(hc.retries, 10);
    assert_eq!(hc.start_period, "1m");
}

#[test]
fn test_healthcheck_without_probe_is_omitted() {
    let mut config = shop_config();
    config.services[0].ports.clear();
    config.services[0].healthcheck = Some(HealthCheckSpec {
        path: Some("/health".to_string()),
        ..Default::default()
    });

    let compose = generate_definition(&config, Some("x"), 1);
    assert!(compose.service("api").unwrap().healthcheck.is_none());
}

#[test]
fn test_depends_on_conditions() {
    let config = parse_config_string(
        r#"
project "shop"
service "db" {
    image "postgres:16"
}
service "api" {
    image "node:20"
    depends_on {
        db "service_healthy"
    }
}
"#,
    )
    .unwrap();

    let compose = generate_definition(&config, Some("x"), 1);
    let api = compose.service("api").unwrap();
    assert_eq!(api.depends_on["db"].condition, "service_healthy");
}

#[test]
fn test_yaml_output_shape() {
    let config = shop_config();

    let yaml = generate_definition(&config, Some("x"), 1).to_yaml().unwrap();
    assert!(yaml.contains("name: shop-wt-x"));
    assert!(yaml.contains("container_name: shop-wt-x-api"));
    assert!(yaml.contains("4000:3000"));
    assert!(yaml.contains("driver: bridge"));
    assert!(!yaml.contains("{api.main.host}"));
}
