//! Dashboard configuration for the browser build
//!
//! The defaults ship inside the binary. `?seed=` and `?floor_plan=` on the
//! page URL override the matching entries.

use securewave_core::DashboardConfig;

const EMBEDDED_CONFIG: &str = include_str!("../securewave.toml");

/// Embedded configuration with URL overrides applied
pub fn load_settings() -> DashboardConfig {
    let mut config = match DashboardConfig::from_toml_str(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "Embedded configuration invalid, using defaults");
            DashboardConfig::default()
        }
    };

    apply_query(&mut config, &browser_query());
    config
}

/// Apply `seed` and `floor_plan` query parameters
pub fn apply_query(config: &mut DashboardConfig, search: &str) {
    if let Some(seed) = parse_query_param(search, "seed") {
        match seed.parse::<u64>() {
            Ok(seed) => {
                tracing::info!(seed, "Using simulation seed from URL parameter");
                config.simulation.seed = Some(seed);
            }
            Err(err) => tracing::warn!(%err, value = %seed, "Ignoring invalid seed parameter"),
        }
    }

    if let Some(path) = parse_query_param(search, "floor_plan") {
        if path.is_empty() {
            tracing::warn!("Ignoring empty floor_plan parameter");
        } else {
            tracing::info!(%path, "Using floor plan from URL parameter");
            config.floor_plan.path = path;
        }
    }
}

/// Parse a query parameter from a URL search string
fn parse_query_param(search: &str, param: &str) -> Option<String> {
    let search = search.trim_start_matches('?');
    for pair in search.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if key == param {
                return Some(value.replace("%3A", ":").replace("%2F", "/"));
            }
        }
    }
    None
}

#[cfg(target_arch = "wasm32")]
fn browser_query() -> String {
    web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn browser_query() -> String {
    String::new()
}
