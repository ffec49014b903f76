use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};
use crate::ledger::BalanceLedger;
use crate::mining::Address;

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address: Address = match path.into_inner().0.parse() {
        Ok(a) => a,
        Err(msg) => return HttpResponse::BadRequest().body(msg),
    };

    let miner = state.miner.lock().expect("mutex poisoned");
    let ledger = miner.ledger();
    HttpResponse::Ok().json(BalanceResponse {
        address,
        balance: ledger.balance_of(&address),
        total_supply: ledger.total_supply(),
        decimals: ledger.decimals(),
    })
}
