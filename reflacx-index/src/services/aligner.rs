//! Sentence / fixation temporal alignment
//!
//! Correlates the spoken report with the gaze stream of one session.
//!
//! **Algorithm:**
//! 1. Split the transcript text on `.` into sentence fragments
//! 2. Walk the word-timestamp tokens; every `.` token closes a timing window
//!    and pairs it with the next unused fragment
//! 3. Walk the on-image fixations with a forward-only sentence pointer,
//!    assigning each to the sentence whose end bounds it
//! 4. Fixations before the first sentence / after the last one are collected
//!    into `_pre_transcript` / `_post_transcript` sentinels
//!
//! **Ordering:** tokens and fixations must already be in non-decreasing time
//! order. This is the caller's responsibility; out-of-order fixations are
//! logged but not rejected, and their assignment is unspecified.

use crate::error::AlignError;
use crate::models::{Fixation, SentenceKind, TimedSentence, WordToken};
use tracing::{debug, warn};

/// Sentence fragments of a transcript, in order
///
/// Fragments are trimmed of spaces and newlines; empty ones are dropped.
pub fn split_sentences(transcript: &str) -> Vec<String> {
    transcript
        .split('.')
        .map(|fragment| fragment.trim_matches(|c| c == ' ' || c == '\n' || c == '\r'))
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive sentence time intervals from the word tokens
///
/// A window opens at the first token and at the token after each boundary;
/// its end follows the latest token seen before the boundary. Tokens after
/// the final boundary belong to no sentence.
///
/// A token stream without any boundary is accepted as one implicit sentence
/// spanning every token, provided the transcript has exactly one fragment.
pub fn time_sentences(
    fragments: &[String],
    tokens: &[WordToken],
) -> Result<Vec<TimedSentence>, AlignError> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AlignError::EmptyTranscript),
    };

    let boundaries = tokens.iter().filter(|t| t.is_boundary()).count();

    if boundaries == 0 {
        if fragments.len() != 1 {
            return Err(AlignError::FragmentMismatch {
                boundaries,
                fragments: fragments.len(),
            });
        }
        debug!("No boundary tokens, treating transcript as a single sentence");
        return Ok(vec![TimedSentence::spoken(
            first.timestamp_start_word,
            last.timestamp_end_word,
            fragments[0].clone(),
        )]);
    }

    if boundaries != fragments.len() {
        return Err(AlignError::FragmentMismatch {
            boundaries,
            fragments: fragments.len(),
        });
    }

    let mut sentences = Vec::with_capacity(boundaries);
    let mut remaining = fragments.iter();
    let mut start_t = 0.0;
    let mut end_t = 0.0;
    let mut new_sentence = true;

    for token in tokens {
        if new_sentence {
            start_t = token.timestamp_start_word;
            end_t = token.timestamp_end_word;
            new_sentence = false;
        }

        if token.is_boundary() {
            // counts were checked above, so a fragment is always left here
            if let Some(text) = remaining.next() {
                sentences.push(TimedSentence::spoken(start_t, end_t, text.clone()));
            }
            new_sentence = true;
        }

        end_t = token.timestamp_end_word;
    }

    let trailing = tokens
        .iter()
        .rev()
        .take_while(|t| !t.is_boundary())
        .count();
    if trailing > 0 {
        debug!(trailing, "Ignoring tokens after the final sentence boundary");
    }

    Ok(sentences)
}

/// Distribute fixations over already-timed sentences
///
/// Invalid (off-image) fixations are skipped. A fixation ending exactly at a
/// sentence's end stays in that sentence. Sentinels are added only when they
/// receive fixations.
pub fn assign_fixations(mut sentences: Vec<TimedSentence>, fixations: &[Fixation]) -> Vec<TimedSentence> {
    if sentences.is_empty() {
        return sentences;
    }

    let mut pre_transcript = Vec::new();
    let mut post_transcript = Vec::new();
    let mut current = 0;
    let mut previous_start = f64::NEG_INFINITY;

    for fixation in fixations.iter().filter(|f| f.is_valid()) {
        if fixation.start() < previous_start {
            warn!(
                start = fixation.start(),
                previous_start, "Fixations are not in time order; assignment may be wrong"
            );
        }
        previous_start = fixation.start();

        if current == 0 && fixation.start() < sentences[0].start_t {
            pre_transcript.push(fixation.clone());
            continue;
        }

        while fixation.end() > sentences[current].end_t && current + 1 < sentences.len() {
            current += 1;
        }

        if fixation.end() > sentences[current].end_t {
            post_transcript.push(fixation.clone());
        } else {
            sentences[current].fixations.push(fixation.clone());
        }
    }

    debug!(
        sentences = sentences.len(),
        pre = pre_transcript.len(),
        post = post_transcript.len(),
        "Assigned fixations to sentences"
    );

    if let Some(pre) = TimedSentence::sentinel(SentenceKind::PreTranscript, pre_transcript) {
        sentences.insert(0, pre);
    }
    if let Some(post) = TimedSentence::sentinel(SentenceKind::PostTranscript, post_transcript) {
        sentences.push(post);
    }

    sentences
}

/// Full alignment: transcript text + word tokens + fixations → timed sentences
pub fn align(
    transcript: &str,
    tokens: &[WordToken],
    fixations: &[Fixation],
) -> Result<Vec<TimedSentence>, AlignError> {
    let fragments = split_sentences(transcript);
    let sentences = time_sentences(&fragments, tokens)?;
    Ok(assign_fixations(sentences, fixations))
}
