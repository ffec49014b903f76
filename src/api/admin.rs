use actix_web::{HttpResponse, Responder, post, web};

use super::error::{envelope_error, mining_error};
use super::models::{AppState, Empty, PauseResponse, Signed};
use crate::mining::Address;

#[post("/admin/pause/")]
pub async fn post_pause(state: web::Data<AppState>, req: web::Json<Signed>) -> impl Responder {
    let (caller, Empty {}): (Address, Empty) = match req.open("pause") {
        Ok(v) => v,
        Err(e) => return envelope_error("pause", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.pause(&ctx) {
        Ok(()) => HttpResponse::Ok().json(PauseResponse { paused: true }),
        Err(e) => mining_error("pause", &e),
    }
}

#[post("/admin/unpause/")]
pub async fn post_unpause(state: web::Data<AppState>, req: web::Json<Signed>) -> impl Responder {
    let (caller, Empty {}): (Address, Empty) = match req.open("unpause") {
        Ok(v) => v,
        Err(e) => return envelope_error("unpause", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.unpause(&ctx) {
        Ok(()) => HttpResponse::Ok().json(PauseResponse { paused: false }),
        Err(e) => mining_error("unpause", &e),
    }
}
