// Open-door response classification
//
// The directed-opendoor endpoint answers HTTP 200 with a free-text body
// ("OK puerta abierta", "KO", "Door opened", ...) instead of a structured
// status. The word lists below are the whole policy.

/// Outcome of a 200 response from the open-door endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorResponse {
    /// The body confirms the relay was triggered.
    Success,
    /// The body reports a refusal or an error.
    Failure,
    /// Neither; the request was accepted but the outcome is unknown.
    Ambiguous,
}

/// Words that confirm the door opened. Matched as whole words, or as word
/// prefixes for stems of four letters or more.
const AFFIRMATIVE: &[&str] = &[
    "ok", "success", "open", "abiert", "exito", "éxito", "correct", "done",
];

/// Words that report a failure. Checked before [`AFFIRMATIVE`] so that
/// "failed to open" and "could not be opened" are failures.
const NEGATIVE: &[&str] = &[
    "ko", "error", "fail", "fallo", "bloque", "deneg", "denied", "invalid", "rechaz",
    "no", "not", "cannot", "unable",
];

/// Classify the body of a 200 open-door response.
pub fn classify_response(body: &str) -> DoorResponse {
    let lowered = body.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if contains_token(&words, NEGATIVE) {
        DoorResponse::Failure
    } else if contains_token(&words, AFFIRMATIVE) {
        DoorResponse::Success
    } else {
        DoorResponse::Ambiguous
    }
}

fn contains_token(words: &[&str], tokens: &[&str]) -> bool {
    words.iter().any(|word| {
        tokens
            .iter()
            .any(|token| *word == *token || (token.chars().count() >= 4 && word.starts_with(token)))
    })
}
