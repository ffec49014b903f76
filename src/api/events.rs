use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, EventEntry, EventsQuery, EventsResponse};

/// Lifecycle notifications, oldest first. `?since=<seq>` to page.
#[get("/events/")]
pub async fn get_events(state: web::Data<AppState>, query: web::Query<EventsQuery>) -> impl Responder {
    let miner = state.miner.lock().expect("mutex poisoned");
    let log = miner.events();
    let events = log
        .since(query.since.unwrap_or(0))
        .map(|(seq, event)| EventEntry {
            seq: *seq,
            event: event.clone(),
        })
        .collect();
    HttpResponse::Ok().json(EventsResponse {
        next_seq: log.next_seq(),
        events,
    })
}
