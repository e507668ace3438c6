//! Overlap reconciliation for finalized recognizer chunks
//!
//! Recognizers re-finalize short windows of audio, so a new final chunk often
//! restates the tail of what has already been accumulated. [`merge`] strips
//! that restated overlap and formats whatever is genuinely new.

/// Longest overlap considered between the accumulated tail and a new chunk, in characters
pub const MAX_OVERLAP_CHARS: usize = 50;

/// Characters that already close an utterance, so no period is inserted after them
const UTTERANCE_TERMINATORS: [char; 5] = ['.', '?', '!', ':', '\n'];

/// Merge a newly finalized chunk into the accumulated transcript
///
/// Returns `accumulated` unchanged when the chunk is blank or already present
/// at the end of the transcript. When the chunk's head restates the tail of
/// `accumulated`, only the remainder is appended, verbatim, continuing the
/// current sentence. Otherwise the chunk starts a new sentence: its first
/// letter is capitalized and it is separated by `".\n"`, or by `"\n"` when the
/// transcript already ends in `. ? ! :` or a newline.
///
/// # Example
/// ```
/// use dictation_engine::dictation::merge;
///
/// let merged = merge("the patient reports pain", "reports pain in the chest");
/// assert_eq!(merged, "the patient reports pain in the chest");
/// ```
pub fn merge(accumulated: &str, new_final_chunk: &str) -> String {
    let chunk = new_final_chunk.trim();
    if chunk.is_empty() || ends_with_words(accumulated.trim_end(), chunk) {
        return accumulated.to_string();
    }

    let overlap = overlap_len(accumulated.trim_end(), chunk);
    let remainder = chunk.get(overlap..).unwrap_or_default();
    if remainder.trim().is_empty() {
        return accumulated.to_string();
    }

    if overlap > 0 {
        // Trailing whitespace on the transcript already separates the words
        if accumulated.ends_with(char::is_whitespace) {
            return format!("{}{}", accumulated, remainder.trim_start());
        }
        return format!("{}{}", accumulated, remainder);
    }

    format!(
        "{}{}{}",
        accumulated,
        separator_for(accumulated),
        capitalize_first(remainder.trim())
    )
}

/// Byte length of the longest word-aligned prefix of `chunk` that restates the tail of `accumulated`
fn overlap_len(accumulated: &str, chunk: &str) -> usize {
    let max = MAX_OVERLAP_CHARS
        .min(accumulated.chars().count())
        .min(chunk.chars().count());

    for k in (1..=max).rev() {
        let head_end = chunk
            .char_indices()
            .nth(k)
            .map_or(chunk.len(), |(idx, _)| idx);
        let Some(head) = chunk.get(..head_end) else {
            continue;
        };
        let Some(tail_idx) = tail_start(accumulated, k) else {
            continue;
        };
        let Some(tail) = accumulated.get(tail_idx..) else {
            continue;
        };

        let splits_before = accumulated
            .get(..tail_idx)
            .and_then(|before| before.chars().last())
            .is_some_and(char::is_alphanumeric);
        let splits_after = chunk
            .get(head_end..)
            .and_then(|after| after.chars().next())
            .is_some_and(char::is_alphanumeric);

        if !splits_before
            && !splits_after
            && head.chars().any(char::is_alphanumeric)
            && eq_ignore_case(head, tail)
        {
            return head_end;
        }
    }

    0
}

/// Whether `haystack` ends with `needle` as whole words, ignoring case
fn ends_with_words(haystack: &str, needle: &str) -> bool {
    let len = needle.chars().count();
    let Some(start) = tail_start(haystack, len) else {
        return false;
    };
    let splits_word = haystack
        .get(..start)
        .and_then(|before| before.chars().last())
        .is_some_and(char::is_alphanumeric);
    !splits_word
        && haystack
            .get(start..)
            .is_some_and(|tail| eq_ignore_case(tail, needle))
}

/// Byte index where the last `chars` characters of `s` begin
fn tail_start(s: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(s.len());
    }
    s.char_indices().rev().nth(chars - 1).map(|(idx, _)| idx)
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Separator placed between the transcript and a chunk that starts a new sentence
fn separator_for(accumulated: &str) -> &'static str {
    match accumulated.trim_end_matches([' ', '\t']).chars().last() {
        None => "",
        Some(c) if UTTERANCE_TERMINATORS.contains(&c) => "\n",
        Some(_) => ".\n",
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
