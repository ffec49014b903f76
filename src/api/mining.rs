use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::error::{envelope_error, mining_error};
use super::models::{
    AppState, CommitBody, CommitHashRequest, CommitHashResponse, CommitResponse, Empty, NodeMiner,
    RevealBody, RoundResponse, SearchNonceRequest, SearchNonceResponse, Signed,
};
use crate::mining::Address;

/// Upper bound on one nonce search request; the engine lock is held meanwhile.
const MAX_SEARCH_TRIES: u64 = 100_000;

/// Round, difficulty, target, reward and supply in one snapshot.
#[get("/mining/info/")]
pub async fn get_info(state: web::Data<AppState>) -> impl Responder {
    let miner = state.miner.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(miner.mining_info())
}

/// Pure helper: the commit hash the engine expects for (agent, secret, account).
/// Computed locally; nothing is stored.
#[post("/mining/commit-hash/")]
pub async fn post_commit_hash(req: web::Json<CommitHashRequest>) -> impl Responder {
    HttpResponse::Ok().json(CommitHashResponse {
        commit_hash: NodeMiner::commit_hash(req.agent_id, &req.secret, &req.account),
    })
}

/// DEV helper for local miners: search nonces against the open round.
/// Nothing is stored; the secret never leaves this request.
#[post("/mining/search-nonce/")]
pub async fn post_search_nonce(
    state: web::Data<AppState>,
    req: web::Json<SearchNonceRequest>,
) -> impl Responder {
    let tries = req.max_tries.unwrap_or(MAX_SEARCH_TRIES).min(MAX_SEARCH_TRIES);
    let miner = state.miner.lock().expect("mutex poisoned");
    let found = miner.search_nonce(req.agent_id, &req.secret, req.start, tries);
    debug!(
        "POST /mining/search-nonce/ - agent={} tries={} found={}",
        req.agent_id,
        tries,
        found.is_some()
    );
    HttpResponse::Ok().json(SearchNonceResponse {
        round: miner.current_round(),
        nonce: found.map(|(n, _)| n),
        hash: found.map(|(_, h)| h),
    })
}

#[post("/mining/commit/")]
pub async fn post_commit(state: web::Data<AppState>, req: web::Json<Signed>) -> impl Responder {
    let (caller, body): (Address, CommitBody) = match req.open("commit") {
        Ok(v) => v,
        Err(e) => return envelope_error("commit", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    if let Err(e) = miner.commit(&ctx, body.agent_id, body.commit_hash) {
        return mining_error("commit", &e);
    }
    debug!(
        "POST /mining/commit/ - agent={} caller={} block={}",
        body.agent_id, caller, ctx.block.number
    );

    HttpResponse::Ok().json(CommitResponse {
        round: miner.current_round(),
        agent_id: body.agent_id,
        committer: caller,
        reveal_from_block: ctx.block.number + miner.config().reveal_cooldown_blocks,
    })
}

/// Reveal a secret and nonce. Finalizes the round on success.
#[post("/mining/reveal/")]
pub async fn post_reveal(state: web::Data<AppState>, req: web::Json<Signed>) -> impl Responder {
    let (caller, body): (Address, RevealBody) = match req.open("reveal") {
        Ok(v) => v,
        Err(e) => return envelope_error("reveal", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.reveal(&ctx, body.agent_id, body.nonce, body.secret) {
        Ok(outcome) => {
            info!(
                "POST /mining/reveal/ - round {} won by agent {} (next round {})",
                outcome.round, body.agent_id, outcome.next_round
            );
            HttpResponse::Ok().json(outcome)
        }
        Err(e) => mining_error("reveal", &e),
    }
}

/// Anyone may close a round whose reveal deadline has passed.
#[post("/mining/force-advance/")]
pub async fn post_force_advance(
    state: web::Data<AppState>,
    req: web::Json<Signed>,
) -> impl Responder {
    let (caller, Empty {}): (Address, Empty) = match req.open("force_advance") {
        Ok(v) => v,
        Err(e) => return envelope_error("force_advance", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.force_advance(&ctx) {
        Ok(round) => HttpResponse::Ok().json(RoundResponse {
            round,
            difficulty: miner.difficulty(),
        }),
        Err(e) => mining_error("force_advance", &e),
    }
}

/// Anyone may reset a stalled epoch's difficulty to the floor, even while paused.
#[post("/mining/emergency-reset/")]
pub async fn post_emergency_reset(
    state: web::Data<AppState>,
    req: web::Json<Signed>,
) -> impl Responder {
    let (caller, Empty {}): (Address, Empty) = match req.open("emergency_reset") {
        Ok(v) => v,
        Err(e) => return envelope_error("emergency_reset", e),
    };
    let ctx = state.call_context(caller);

    let mut miner = state.miner.lock().expect("mutex poisoned");
    match miner.emergency_reset(&ctx) {
        Ok(()) => HttpResponse::Ok().json(RoundResponse {
            round: miner.current_round(),
            difficulty: miner.difficulty(),
        }),
        Err(e) => mining_error("emergency_reset", &e),
    }
}
