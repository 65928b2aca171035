use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub holds: HoldConfig,
    pub sweeper: SweeperConfig,
    pub adjacency: AdjacencyConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки временных броней
#[derive(Debug, Clone, Deserialize)]
pub struct HoldConfig {
    /// TTL брони по умолчанию, если клиент не прислал свой.
    pub default_ttl_seconds: i64,
    /// Потолок жизни брони: продления не выводят её за created_at + max_ttl.
    pub max_ttl_seconds: i64,
    /// Сколько раз повторять цикл "прочитать-проверить-закоммитить"
    /// при проигрыше гонки за места.
    pub cas_retries: u32,
}

// Настройки фонового уборщика просроченных броней
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    pub interval_seconds: u64,
}

// Настройки подбора соседних мест
#[derive(Debug, Clone, Deserialize)]
pub struct AdjacencyConfig {
    /// Порог геометрического соседства (в пикселях схемы зала)
    /// для мест без метаданных ряда.
    pub distance_threshold: f64,
    /// Верхняя граница обхода в ширину.
    pub max_visited: usize,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_analytics: bool,
    pub enable_admin: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "tablebook=debug,tower_http=debug".to_string()),
            },
            holds: HoldConfig {
                default_ttl_seconds: env::var("HOLD_TTL_SECONDS")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()
                    .expect("HOLD_TTL_SECONDS must be a valid number"),
                max_ttl_seconds: env::var("HOLD_MAX_TTL_SECONDS")
                    .unwrap_or_else(|_| "7200".to_string())
                    .parse()
                    .expect("HOLD_MAX_TTL_SECONDS must be a valid number"),
                cas_retries: env::var("HOLD_CAS_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("HOLD_CAS_RETRIES must be a valid number"),
            },
            sweeper: SweeperConfig {
                interval_seconds: env::var("SWEEPER_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("SWEEPER_INTERVAL_SECONDS must be a valid number"),
            },
            adjacency: AdjacencyConfig {
                distance_threshold: env::var("ADJACENCY_DISTANCE_THRESHOLD")
                    .unwrap_or_else(|_| "60.0".to_string())
                    .parse()
                    .expect("ADJACENCY_DISTANCE_THRESHOLD must be a valid number"),
                max_visited: env::var("ADJACENCY_MAX_VISITED")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .expect("ADJACENCY_MAX_VISITED must be a valid number"),
            },
            features: FeatureFlags {
                enable_analytics: env::var("ENABLE_ANALYTICS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .expect("ENABLE_ANALYTICS must be true or false"),
                enable_admin: env::var("ENABLE_ADMIN")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .expect("ENABLE_ADMIN must be true or false"),
            },
        }
    }
}

impl Default for Config {
    // Дефолты для тестов, без чтения окружения.
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "test".to_string(),
                rust_log: "tablebook=debug".to_string(),
            },
            holds: HoldConfig {
                default_ttl_seconds: 900,
                max_ttl_seconds: 7200,
                cas_retries: 3,
            },
            sweeper: SweeperConfig {
                interval_seconds: 5,
            },
            adjacency: AdjacencyConfig {
                distance_threshold: 60.0,
                max_visited: 256,
            },
            features: FeatureFlags {
                enable_analytics: true,
                enable_admin: true,
            },
        }
    }
}
