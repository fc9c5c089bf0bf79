//! Design documents (views and update functions) installed into the database.

use serde_json::{Value, json};

pub const LECTURES: &str = "lectures";
pub const USERS: &str = "users";

pub mod views {
    pub const GET_LECTURES: &str = "get-lectures";
    pub const QUESTIONS_BY_LECTURE: &str = "get-questions-by-lecture";
    pub const ANSWERS_BY_QUESTION: &str = "get-answers-by-question";
    pub const QUESTION_COUNT_BY_LECTURE: &str = "get-number-of-questions-by-lecture";
    pub const ANSWER_COUNT_BY_QUESTION: &str = "get-number-of-answers-by-question";
    pub const ATTENDED_LECTURES: &str = "get-attended-lectures";
    pub const DISPLAY_NAMES_BY_ID: &str = "get-display-names-by-id";
    pub const USERS_BY_USERNAME: &str = "get-users-by-username";
}

pub const ATTEND_LECTURE: &str = "attend-lecture";

const ATTEND_LECTURE_FN: &str = r#"function (doc, req) {
  function reject(reason) {
    return [null, { code: 400, json: { error: 'missed', reason: reason } }];
  }
  if (!doc) return reject('no document');
  if (doc.docType !== 'user') return reject('invalid document type');
  if (typeof req.body !== 'string') return reject('invalid request body');
  if (doc.attendedLectures.indexOf(req.body) === -1)
    doc.attendedLectures.push(req.body);
  return [doc, { json: { status: 'ok' } }];
}"#;

fn emit_for(doc_type: &str, key: &str, value: &str) -> String {
    format!(
        "function (doc) {{ if (doc.docType === '{}') emit({}, {}); }}",
        doc_type, key, value
    )
}

/// `(document id, body)` pairs, in installation order.
pub fn documents() -> Vec<(String, Value)> {
    vec![
        (format!("_design/{}", LECTURES), lectures()),
        (format!("_design/{}", USERS), users()),
    ]
}

fn lectures() -> Value {
    json!({
        "language": "javascript",
        "views": {
            "get-lectures": {
                "map": emit_for("lecture", "doc._id", "doc")
            },
            "get-questions-by-lecture": {
                "map": emit_for("question", "doc.lectureId", "doc")
            },
            "get-answers-by-question": {
                "map": emit_for("answer", "doc.questionId", "doc")
            },
            "get-number-of-questions-by-lecture": {
                "map": emit_for("question", "doc.lectureId", "1"),
                "reduce": "_sum"
            },
            "get-number-of-answers-by-question": {
                "map": emit_for("answer", "doc.questionId", "1"),
                "reduce": "_sum"
            }
        }
    })
}

fn users() -> Value {
    json!({
        "language": "javascript",
        "views": {
            "get-attended-lectures": {
                "map": "function (doc) { if (doc.docType === 'user') { for (var i = 0; i < doc.attendedLectures.length; i++) { emit(doc._id, { _id: doc.attendedLectures[i] }); } } }"
            },
            "get-display-names-by-id": {
                "map": "function (doc) { if (doc.docType === 'user' && doc.displayName != null) emit(doc._id, doc.displayName); }"
            },
            "get-users-by-username": {
                "map": "function (doc) { if (doc.docType === 'user') emit(doc.username.toLowerCase(), doc); }"
            }
        },
        "updates": {
            "attend-lecture": ATTEND_LECTURE_FN
        }
    })
}
