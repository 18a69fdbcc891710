use rand::Rng;

pub const PREFIX: &str = "1Z";
pub const BODY_LEN: usize = 16;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `1Z` followed by 16 characters from `[0-9A-Z]`. Uniqueness is the store's job.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut tracking = String::with_capacity(PREFIX.len() + BODY_LEN);
    tracking.push_str(PREFIX);

    for _ in 0..BODY_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        tracking.push(ALPHABET[idx] as char);
    }

    tracking
}

pub fn is_well_formed(tracking_number: &str) -> bool {
    match tracking_number.strip_prefix(PREFIX) {
        Some(body) => {
            body.len() == BODY_LEN
                && body
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        }
        None => false,
    }
}

/// Lookup form of a user-supplied tracking number.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}
