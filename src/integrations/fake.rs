//! In-process stand-in for the participant REST API, used by tests.

use std::collections::HashMap;

use serde_json::json;
use warp::{http::StatusCode, reply::Response, Filter, Reply};

use crate::core::participant::{Participant, ParticipantInput};

fn not_found() -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({ "detail": "Participante não encontrado" })),
        StatusCode::NOT_FOUND,
    )
    .into_response()
}

fn echo(id: i64, input: ParticipantInput) -> Participant {
    Participant {
        id,
        name: input.name,
        phone: input.phone,
        birth_date: input.birth_date,
        photo_path: input.photo_path,
        ..Default::default()
    }
}

/// Starts the fake API on an ephemeral port and returns its base URL.
///
/// Creating a participant named "Fail" answers 500 with a detail message. Ids 404
/// and 500 answer with those statuses.
pub fn spawn_fake_api() -> String {
    let list = warp::path!("api" / "participants")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(|query: HashMap<String, String>| {
            let field = |k: &str| query.get(k).cloned().unwrap_or_default();
            let name = format!(
                "skip={} limit={} search={}",
                field("skip"),
                field("limit"),
                field("search")
            );
            warp::reply::json(&json!({
                "participants": [{ "id": 1, "name": name }],
                "total": 1
            }))
        });

    let get = warp::path!("api" / "participants" / i64)
        .and(warp::get())
        .map(|id: i64| match id {
            404 => not_found(),
            _ => warp::reply::json(&Participant {
                id,
                name: "Maria Silva".to_owned(),
                birth_date: Some("2005-03-09".to_owned()),
                phone: Some("11987654321".to_owned()),
                ecc_participant: Some(true),
                ecc_info: Some("Parents in 2001".to_owned()),
                ..Default::default()
            })
            .into_response(),
        });

    let create = warp::path!("api" / "participants")
        .and(warp::post())
        .and(warp::body::json())
        .map(|input: ParticipantInput| {
            if input.name == "Fail" {
                warp::reply::with_status(
                    warp::reply::json(&json!({ "detail": "Database unavailable" })),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response()
            } else {
                warp::reply::with_status(warp::reply::json(&echo(42, input)), StatusCode::CREATED)
                    .into_response()
            }
        });

    let update = warp::path!("api" / "participants" / i64)
        .and(warp::put())
        .and(warp::body::json())
        .map(|id: i64, input: ParticipantInput| match id {
            404 => not_found(),
            _ => warp::reply::json(&echo(id, input)).into_response(),
        });

    let delete = warp::path!("api" / "participants" / i64)
        .and(warp::delete())
        .map(|id: i64| match id {
            404 => not_found(),
            500 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            _ => StatusCode::NO_CONTENT.into_response(),
        });

    let upload_photo = warp::path!("api" / "photos" / "upload")
        .and(warp::post())
        .and(warp::header::<String>("content-type"))
        .and(warp::body::bytes())
        .map(|content_type: String, body: warp::hyper::body::Bytes| {
            let body = String::from_utf8_lossy(&body);
            if content_type.starts_with("multipart/form-data") && body.contains("name=\"file\"") {
                warp::reply::json(&json!({ "filename": "photo.png", "path": "photos/photo.png" }))
                    .into_response()
            } else {
                StatusCode::BAD_REQUEST.into_response()
            }
        });

    let upload_logo = warp::path!("api" / "logo" / "upload")
        .and(warp::post())
        .map(|| warp::reply::json(&json!({ "filename": "logo.png", "path": "logo.png" })));

    let logo = warp::path!("api" / "logo")
        .and(warp::get())
        .map(|| b"LOGO".to_vec());

    let delete_logo = warp::path!("api" / "logo")
        .and(warp::delete())
        .map(|| warp::reply::json(&json!({ "message": "removed" })));

    let individual_pdf = warp::path!("api" / "pdf" / "participant" / i64)
        .and(warp::get())
        .map(|id: i64| format!("%PDF-{}", id).into_bytes());

    let complete_pdf = warp::path!("api" / "pdf" / "complete")
        .and(warp::get())
        .map(|| StatusCode::SERVICE_UNAVAILABLE);

    let health = warp::path!("api" / "health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    let routes = list
        .or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(upload_photo)
        .or(upload_logo)
        .or(logo)
        .or(delete_logo)
        .or(individual_pdf)
        .or(complete_pdf)
        .or(health);

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    format!("http://{}/api", addr)
}
