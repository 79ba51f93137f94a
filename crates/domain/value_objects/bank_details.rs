use serde::{Deserialize, Serialize};

const IBAN_MIN_LEN: usize = 15;
const IBAN_MAX_LEN: usize = 34;

/// Payee routing details shown to a customer on the deposit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub iban: String,
    pub bic: Option<String>,
}

impl BankDetails {
    /// Builds payee details only when the IBAN is well-formed. The BIC is
    /// carried along normalized but never gates the result.
    pub fn from_raw(iban: Option<&str>, bic: Option<&str>) -> Option<Self> {
        let iban = normalize_iban(iban?)?;
        let bic = bic
            .map(|b| b.split_whitespace().collect::<String>().to_ascii_uppercase())
            .filter(|b| !b.is_empty());

        Some(Self { iban, bic })
    }
}

/// Strips whitespace, upper-cases and validates per ISO 13616.
pub fn normalize_iban(raw: &str) -> Option<String> {
    let iban: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if !(IBAN_MIN_LEN..=IBAN_MAX_LEN).contains(&iban.len()) {
        return None;
    }
    if !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let bytes = iban.as_bytes();
    if !bytes[0].is_ascii_alphabetic() || !bytes[1].is_ascii_alphabetic() {
        return None;
    }
    if !bytes[2].is_ascii_digit() || !bytes[3].is_ascii_digit() {
        return None;
    }

    if iban_checksum(&iban) == 1 {
        Some(iban)
    } else {
        None
    }
}

// Moves the first four characters to the end and folds the digit
// expansion (A=10 .. Z=35) through mod 97 without big integers.
fn iban_checksum(iban: &str) -> u32 {
    let (head, tail) = iban.split_at(4);

    tail.chars().chain(head.chars()).fold(0u32, |rem, c| {
        if let Some(digit) = c.to_digit(10) {
            (rem * 10 + digit) % 97
        } else {
            let value = c as u32 - 'A' as u32 + 10;
            (rem * 100 + value) % 97
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_iban_with_spaces_and_lowercase() {
        assert_eq!(
            normalize_iban("be68 5390 0754 7034"),
            Some("BE68539007547034".to_string())
        );
        assert_eq!(
            normalize_iban("DE89 3704 0044 0532 0130 00"),
            Some("DE89370400440532013000".to_string())
        );
    }

    #[test]
    fn rejects_bad_check_digits_and_shapes() {
        assert_eq!(normalize_iban("BE68539007547035"), None);
        assert_eq!(normalize_iban("BE6853900754"), None);
        assert_eq!(normalize_iban("1268539007547034"), None);
        assert_eq!(normalize_iban("BE68-5390-0754-7034"), None);
        assert_eq!(normalize_iban(""), None);
    }

    #[test]
    fn from_raw_requires_iban_but_not_bic() {
        let details = BankDetails::from_raw(Some("BE68539007547034"), Some(" gebabebb ")).unwrap();
        assert_eq!(details.bic.as_deref(), Some("GEBABEBB"));

        let no_bic = BankDetails::from_raw(Some("BE68539007547034"), Some("  ")).unwrap();
        assert_eq!(no_bic.bic, None);

        assert_eq!(BankDetails::from_raw(None, Some("GEBABEBB")), None);
        assert_eq!(BankDetails::from_raw(Some("not-an-iban"), None), None);
    }
}
