pub mod deposit_holds;
