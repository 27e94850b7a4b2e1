//! Sentence chunker.
//!
//! The synthesis engine only accepts a bounded amount of text per call, so
//! input is cut at sentence boundaries into chunks of at most `budget`
//! characters.  Sentences that cannot fit on their own fall back to greedy
//! word packing.

/// Initial chunk size budget, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn terminate(mut piece: String) -> String {
    if !piece.ends_with('.') {
        piece.push('.');
    }
    piece
}

/// Greedily pack the words of `text` into space-joined groups.
///
/// Every word costs its length plus one separator, so a group never exceeds
/// `budget - 1` characters.  A word longer than the budget becomes a group of
/// its own.  No punctuation is added.
pub fn pack_words(text: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_size = 0;

    for word in text.split_whitespace() {
        let word_size = char_len(word) + 1;
        if current_size + word_size > budget && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_size = 0;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        current_size += word_size;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Split `text` into period-terminated chunks of at most `budget` characters.
///
/// Sentences are accumulated (space-joined) until the next one would overflow
/// the budget.  A sentence longer than the budget is word-packed into chunks of
/// its own which never merge with their neighbours; output order always
/// follows input order.
pub fn chunk_text(text: &str, budget: usize) -> Vec<String> {
    let text = text.replace('\n', " ");
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for sentence in text.split('.') {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence = format!("{sentence}.");
        let size = char_len(&sentence);

        if size > budget {
            // Flush first so the sentences before it keep their place.
            if !buffer.is_empty() {
                chunks.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }
            chunks.extend(pack_words(&sentence, budget).into_iter().map(terminate));
            continue;
        }

        if !buffer.is_empty() && buffer_len + 1 + size > budget {
            chunks.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }
        if !buffer.is_empty() {
            buffer.push(' ');
            buffer_len += 1;
        }
        buffer.push_str(&sentence);
        buffer_len += size;
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }
    chunks
}
