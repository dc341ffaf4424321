const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

pub const MASK: &str = "****";

/// Replace denylisted words with [`MASK`]. Words are split on single spaces
/// and compared case-insensitively; everything else is kept as written.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
