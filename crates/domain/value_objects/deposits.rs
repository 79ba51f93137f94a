use crate::domain::{
    entities::{profiles::ProfileEntity, slots::SlotEntity},
    value_objects::bank_details::BankDetails,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositDecision {
    pub required: bool,
    pub amount_minor: i32,
    pub payee: Option<BankDetails>,
    pub use_deposit: bool,
}

/// Decides whether reserving `slot` goes through the deposit path.
///
/// A slot-level amount wins over the provider default when positive. When any
/// of amount or payee is missing the booking falls back to the direct path.
pub fn decide(slot: &SlotEntity, provider: &ProfileEntity) -> DepositDecision {
    let required = slot.deposit_required || provider.deposit_enabled;

    let amount_minor = match slot.deposit_amount_minor {
        Some(amount) if amount > 0 => amount,
        _ if provider.deposit_amount_minor > 0 => provider.deposit_amount_minor,
        _ => 0,
    };

    let payee = BankDetails::from_raw(provider.iban.as_deref(), provider.bic.as_deref());
    let use_deposit = required && amount_minor > 0 && payee.is_some();

    DepositDecision {
        required,
        amount_minor,
        payee,
        use_deposit,
    }
}
