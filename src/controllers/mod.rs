pub mod admin;
pub mod analytics;
pub mod bookings;
pub mod charts;
pub mod holds;

use axum::Router;
use std::sync::Arc;

pub fn routes(state: &crate::AppState) -> Router<Arc<crate::AppState>> {
    let mut router = Router::new()
        .merge(charts::routes())
        .merge(holds::routes())
        .merge(bookings::routes());

    // Необязательные поверхности включаются флагами конфигурации.
    if state.config.features.enable_analytics {
        router = router.merge(analytics::routes());
    }
    if state.config.features.enable_admin {
        router = router.merge(admin::routes());
    }

    router
}
