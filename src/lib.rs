pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use services::adjacency::AdjacencyFinder;
use services::booking::BookingService;
use services::holds::HoldManager;
use services::pricing::PricingService;
use store::Store;

// Shared state для всего приложения
pub struct AppState {
    pub store: Arc<Store>,
    pub pricing: Arc<PricingService>,
    pub holds: HoldManager,
    pub bookings: BookingService,
    pub adjacency: AdjacencyFinder,
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Arc<Self> {
        let store = Arc::new(Store::new());
        let pricing = Arc::new(PricingService::new());
        let holds = HoldManager::new(store.clone(), pricing.clone(), config.holds.clone());
        let bookings = BookingService::new(store.clone());
        let adjacency = AdjacencyFinder::new(config.adjacency.clone());

        Arc::new(Self {
            store,
            pricing,
            holds,
            bookings,
            adjacency,
            config,
        })
    }
}
