use std::collections::HashMap;

use serde::Serialize;
use tracing::{Level, event, instrument};

use crate::store::Store;
use crate::types::question::QuestionItem;
use crate::types::session::{ClassId, NewSession, Session, SessionUpdate};

use handle_errors::Error;

#[derive(Serialize, Debug)]
struct SessionReply<'a> {
    ok: bool,
    session: &'a Session,
}

#[derive(Serialize, Debug)]
struct CreatedReply<'a> {
    ok: bool,
    #[serde(rename = "classId")]
    class_id: &'a ClassId,
    session: &'a Session,
}

#[derive(Serialize, Debug)]
struct StudentReply<'a> {
    ok: bool,
    item: &'a QuestionItem,
    #[serde(rename = "hintSpeech", skip_serializing_if = "Option::is_none")]
    hint_speech: Option<String>,
}

fn extract_class_id(params: &HashMap<String, String>) -> Result<ClassId, Error> {
    match params.get("classId").map(|id| id.trim()) {
        Some(id) if !id.is_empty() => Ok(ClassId(id.to_string())),
        _ => Err(Error::MissingParameters("classId")),
    }
}

fn extract_student_number(params: &HashMap<String, String>) -> Result<u32, Error> {
    let raw = params
        .get("student")
        .ok_or(Error::MissingParameters("student"))?;
    let student = raw.parse::<u32>().map_err(Error::ParseError)?;
    if student == 0 {
        return Err(Error::MissingParameters("student"));
    }
    Ok(student)
}

pub async fn create_session(
    store: Store,
    new_session: NewSession,
) -> Result<impl warp::Reply, warp::Rejection> {
    event!(target: "classtalk", Level::INFO, topic = %new_session.topic, "creating session");
    match store.create_session(new_session).await {
        Ok(session) => Ok(warp::reply::json(&CreatedReply {
            ok: true,
            class_id: &session.class_id,
            session: &session,
        })),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn get_session(
    params: HashMap<String, String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    let class_id = match extract_class_id(&params) {
        Ok(class_id) => class_id,
        Err(e) => return Err(warp::reject::custom(e)),
    };
    match store.get_session(&class_id).await {
        Ok(session) => Ok(warp::reply::json(&SessionReply {
            ok: true,
            session: &session,
        })),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

/// Read-modify-write with no version check: two simultaneous writers race
/// and the last SET wins, same as a single teacher re-saving their edits.
pub async fn update_session(
    params: HashMap<String, String>,
    store: Store,
    update: SessionUpdate,
) -> Result<impl warp::Reply, warp::Rejection> {
    let class_id = match extract_class_id(&params) {
        Ok(class_id) => class_id,
        Err(e) => return Err(warp::reject::custom(e)),
    };

    let mut session = match store.get_session(&class_id).await {
        Ok(session) => session,
        Err(e) => return Err(warp::reject::custom(e)),
    };

    session.apply(update);

    match store.put_session(&session).await {
        Ok(_) => Ok(warp::reply::json(&SessionReply {
            ok: true,
            session: &session,
        })),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip(store))]
pub async fn student_question(
    params: HashMap<String, String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    let class_id = match extract_class_id(&params) {
        Ok(class_id) => class_id,
        Err(e) => return Err(warp::reject::custom(e)),
    };
    let student = match extract_student_number(&params) {
        Ok(student) => student,
        Err(e) => return Err(warp::reject::custom(e)),
    };

    let session = match store.get_session(&class_id).await {
        Ok(session) => session,
        Err(e) => return Err(warp::reject::custom(e)),
    };

    match session.question_for_student(student) {
        Some(item) => Ok(warp::reply::json(&StudentReply {
            ok: true,
            item,
            hint_speech: item.hint_speech(),
        })),
        None => Err(warp::reject::custom(Error::NoQuestions)),
    }
}
