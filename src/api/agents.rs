use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::error::envelope_error;
use super::models::{
    AgentStatsResponse, AppState, RegisterAgentRequest, RegisterAgentResponse, Signed,
    TransferAgentBody,
};
use crate::ledger::OwnershipRegistry;
use crate::mining::{AgentId, Address};

/// DEV registry: issue a new agent identity to `owner`.
/// Stands in for the external identity contract.
#[post("/agents/")]
pub async fn register_agent(
    state: web::Data<AppState>,
    body: web::Json<RegisterAgentRequest>,
) -> impl Responder {
    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.registry_mut().issue(body.owner) {
        Ok(agent_id) => {
            info!("AGENT - issued {} to {}", agent_id, body.owner);
            HttpResponse::Ok().json(RegisterAgentResponse {
                agent_id,
                owner: body.owner,
            })
        }
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// DEV registry: the current owner hands the agent to another account.
#[post("/agents/{id}/transfer/")]
pub async fn transfer_agent(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
    req: web::Json<Signed>,
) -> impl Responder {
    let agent_id = match parse_agent_id(&path.into_inner().0) {
        Some(id) => id,
        None => return HttpResponse::BadRequest().body("invalid agent id"),
    };
    let (caller, body): (Address, TransferAgentBody) = match req.open("transfer_agent") {
        Ok(v) => v,
        Err(e) => return envelope_error("transfer_agent", e),
    };

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.registry().owner_of(agent_id) {
        Ok(owner) if owner == caller => {}
        Ok(_) => return HttpResponse::Forbidden().body("caller does not own this agent"),
        Err(e) => return HttpResponse::NotFound().body(e.to_string()),
    }
    match miner.registry_mut().transfer(agent_id, body.to) {
        Ok(()) => {
            info!("AGENT - {} moved from {} to {}", agent_id, caller, body.to);
            HttpResponse::Ok().json(RegisterAgentResponse {
                agent_id,
                owner: body.to,
            })
        }
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

#[get("/agents/{id}/")]
pub async fn get_agent(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let raw = path.into_inner().0;
    let agent_id = match parse_agent_id(&raw) {
        Some(id) => id,
        None => return HttpResponse::BadRequest().body("invalid agent id"),
    };

    let miner = state.miner.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(AgentStatsResponse {
        agent_id,
        owner: miner.registry().owner_of(agent_id).ok(),
        stats: miner.agent_stats(agent_id),
        pending_commitment: miner.commitment(agent_id).cloned(),
    })
}

/// Decimal, or hex with a `0x` prefix.
fn parse_agent_id(raw: &str) -> Option<AgentId> {
    match raw.strip_prefix("0x") {
        Some(hex) => AgentId::from_str_radix(hex, 16).ok(),
        None => AgentId::from_dec_str(raw).ok(),
    }
}
