mod admin;
mod agents;
mod balance;
mod error;
mod events;
mod health;
mod mining;
pub mod models;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(mining::get_info)
            .service(mining::post_commit_hash)
            .service(mining::post_search_nonce)
            .service(mining::post_commit)
            .service(mining::post_reveal)
            .service(mining::post_force_advance)
            .service(mining::post_emergency_reset)
            .service(admin::post_pause)
            .service(admin::post_unpause)
            .service(agents::register_agent)
            .service(agents::transfer_agent)
            .service(agents::get_agent)
            .service(balance::get_balance)
            .service(events::get_events)
            .service(wallet::create_wallet),
    );
}
