//! 세션 코드 / 참가자 ID 생성

use rand::Rng;

/// 혼동되는 문자(0/O, 1/I)를 뺀 32자 알파벳
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;

const PARTICIPANT_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PARTICIPANT_ID_LENGTH: usize = 7;

/// 6자리 세션 코드
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// `p_` 접두사를 가진 참가자 ID
pub fn generate_participant_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..PARTICIPANT_ID_LENGTH)
        .map(|_| PARTICIPANT_ID_ALPHABET[rng.gen_range(0..PARTICIPANT_ID_ALPHABET.len())] as char)
        .collect();
    format!("p_{}", suffix)
}

/// 입력 코드 정규화 (대소문자 무시)
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn alphabet_has_32_unambiguous_symbols() {
        let set: HashSet<u8> = CODE_ALPHABET.iter().copied().collect();
        assert_eq!(set.len(), 32);
        for ambiguous in [b'0', b'O', b'1', b'I'] {
            assert!(!set.contains(&ambiguous));
        }
    }

    #[test]
    fn codes_are_six_uppercase_symbols() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn participant_ids_have_prefix() {
        let mut rng = StdRng::seed_from_u64(11);
        let id = generate_participant_id(&mut rng);
        assert!(id.starts_with("p_"));
        assert_eq!(id.len(), 2 + PARTICIPANT_ID_LENGTH);
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  abc23x "), "ABC23X");
    }
}
