use rand::seq::IndexedRandom;

/// Characters drawn from when generating a viewer passphrase
pub const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*-_";
/// Length used when the creator does not ask for one
pub const DEFAULT_PASSWORD_LENGTH: usize = 20;

/// Generate a random password of `length` characters, uniform over
///  [`PASSWORD_CHARSET`].
///
/// Uses the thread-local CSPRNG (ChaCha, seeded from the OS).
pub fn generate_random_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| PASSWORD_CHARSET.choose(&mut rng))
        .map(|b| *b as char)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_length_and_charset() {
        for length in [0, 1, DEFAULT_PASSWORD_LENGTH, 128] {
            let password = generate_random_password(length);
            assert_eq!(password.chars().count(), length);
            assert!(password.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_passwords_differ() {
        let a = generate_random_password(DEFAULT_PASSWORD_LENGTH);
        let b = generate_random_password(DEFAULT_PASSWORD_LENGTH);
        assert_ne!(a, b);
    }
}
