//! Moves funds between the parties and the custodial escrow account.

use crate::{
    abiencode::types::{Address, U256},
    token::{self, TokenLedger},
};

/// Escrow accountant: every deposit lands on the custodian account, every
/// payout leaves it. Fund movement either completes or returns the token
/// ledger's error with no other effect, which is what lets the registry
/// abort an operation before committing any state transition.
#[derive(Debug)]
pub struct EscrowAccountant<T: TokenLedger> {
    ledger: T,
    custodian: Address,
}

impl<T: TokenLedger> EscrowAccountant<T> {
    pub fn new(ledger: T, custodian: Address) -> Self {
        EscrowAccountant { ledger, custodian }
    }

    /// The account holding all escrowed funds. Depositors must approve this
    /// address before open/join can pull their deposit.
    pub fn custodian(&self) -> Address {
        self.custodian
    }

    /// Pull `amount` of `token` from `from` into escrow.
    pub fn collect(&mut self, token: Address, from: Address, amount: U256) -> Result<(), token::Error> {
        self.ledger
            .transfer_from(token, from, self.custodian, self.custodian, amount)
    }

    /// Pay `amount` of `token` out of escrow to `to`.
    pub fn disburse(&mut self, token: Address, to: Address, amount: U256) -> Result<(), token::Error> {
        self.ledger.transfer(token, self.custodian, to, amount)
    }

    /// Custodial balance for `token`, across all channels using it.
    pub fn held(&self, token: Address) -> U256 {
        self.ledger.balance_of(token, self.custodian)
    }

    pub fn ledger(&self) -> &T {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut T {
        &mut self.ledger
    }
}
