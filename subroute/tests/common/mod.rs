#![allow(dead_code)]

use std::time::Duration;
use subroute::{
    Rank, Request, SubjectMsg,
    testing::{Invocation, RecordingHandler},
};

// ============================================================================
// Test Messages
// ============================================================================

pub fn msg(subject: &str) -> SubjectMsg {
    SubjectMsg::from_subject(subject)
}

/// A transport message with a body, like the ones a pub/sub client hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub body: Vec<u8>,
    pub reply_to: Option<String>,
}

pub fn delivery(subject: &str, body: &[u8]) -> SubjectMsg<Delivery> {
    SubjectMsg::new(
        subject,
        Delivery {
            body: body.to_vec(),
            reply_to: None,
        },
    )
}

pub fn rank(n: u32) -> Rank {
    Rank::new(n).unwrap()
}

// ============================================================================
// Waiting on spawned handlers
// ============================================================================

/// Receive the next invocation or fail the test after a second.
pub async fn next_call(recorder: &RecordingHandler) -> Invocation {
    tokio::time::timeout(Duration::from_secs(1), recorder.recv())
        .await
        .expect("handler was not invoked in time")
        .expect("recorder closed")
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn noop(_req: Request<SubjectMsg>) {}
