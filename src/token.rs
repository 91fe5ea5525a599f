//! Interface to the external fungible-token ledger used for escrow.
//!
//! The channel registry only ever pulls deposits via [transfer_from]
//! [TokenLedger::transfer_from] (which requires a prior allowance from the
//! payer) and pays out via [transfer][TokenLedger::transfer]. The token
//! ledger's own implementation is a collaborator, not part of this crate;
//! tests run against the in-memory [testing::TestToken].

use crate::abiencode::types::{Address, U256};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// `transfer_from` exceeds what `owner` approved for `spender`.
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
    /// The paying account does not hold the transferred amount.
    InsufficientBalance { token: Address, from: Address },
}

/// Fungible-token collaborator with `balanceOf` / `approve` / `transfer` /
/// `transferFrom` semantics, keyed by token identifier.
///
/// There is no ambient caller here, so the acting account is always an
/// explicit parameter.
pub trait TokenLedger {
    fn balance_of(&self, token: Address, account: Address) -> U256;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    /// Authorize `spender` to pull up to `amount` from `owner`.
    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256);

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;

    /// Move `amount` from `owner` to `to` on behalf of `spender`, debiting
    /// the allowance. Fails before any balance changes.
    fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::{Error, TokenLedger};
    use crate::abiencode::types::{Address, U256};

    /// In-memory token ledger with a faucet, standing in for the real token
    /// collaborator in tests.
    #[derive(Debug, Default)]
    pub(crate) struct TestToken {
        balances: HashMap<(Address, Address), U256>,
        allowances: HashMap<(Address, Address, Address), U256>,
    }

    impl TestToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn faucet(&mut self, token: Address, account: Address, amount: U256) {
            let balance = self.balances.entry((token, account)).or_default();
            *balance = *balance + amount;
        }
    }

    impl TokenLedger for TestToken {
        fn balance_of(&self, token: Address, account: Address) -> U256 {
            self.balances
                .get(&(token, account))
                .copied()
                .unwrap_or_default()
        }

        fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
            self.allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or_default()
        }

        fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
            self.allowances.insert((token, owner, spender), amount);
        }

        fn transfer(
            &mut self,
            token: Address,
            from: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), Error> {
            let from_balance = self.balance_of(token, from);
            let from_balance = from_balance
                .checked_sub(amount)
                .ok_or(Error::InsufficientBalance { token, from })?;

            self.balances.insert((token, from), from_balance);
            let to_balance = self.balances.entry((token, to)).or_default();
            *to_balance = *to_balance + amount;
            Ok(())
        }

        fn transfer_from(
            &mut self,
            token: Address,
            owner: Address,
            spender: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), Error> {
            let allowance = self.allowance(token, owner, spender);
            let remaining =
                allowance
                    .checked_sub(amount)
                    .ok_or(Error::InsufficientAllowance {
                        token,
                        owner,
                        spender,
                    })?;

            self.transfer(token, owner, to, amount)?;
            self.allowances.insert((token, owner, spender), remaining);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const TOKEN: Address = Address([0xee; 20]);

        #[test]
        fn faucet_and_transfer() {
            let mut ledger = TestToken::new();
            let (a, b) = (Address([1; 20]), Address([2; 20]));
            ledger.faucet(TOKEN, a, U256::from(100));

            ledger.transfer(TOKEN, a, b, U256::from(30)).unwrap();
            assert_eq!(ledger.balance_of(TOKEN, a), U256::from(70));
            assert_eq!(ledger.balance_of(TOKEN, b), U256::from(30));
        }

        #[test]
        fn transfer_from_requires_and_debits_allowance() {
            let mut ledger = TestToken::new();
            let (owner, spender, sink) =
                (Address([1; 20]), Address([2; 20]), Address([3; 20]));
            ledger.faucet(TOKEN, owner, U256::from(100));

            assert_eq!(
                ledger.transfer_from(TOKEN, owner, spender, sink, U256::from(10)),
                Err(Error::InsufficientAllowance {
                    token: TOKEN,
                    owner,
                    spender,
                })
            );

            ledger.approve(TOKEN, owner, spender, U256::from(25));
            ledger
                .transfer_from(TOKEN, owner, spender, sink, U256::from(10))
                .unwrap();
            assert_eq!(ledger.allowance(TOKEN, owner, spender), U256::from(15));
            assert_eq!(ledger.balance_of(TOKEN, sink), U256::from(10));

            // Allowance left but not enough for another 20.
            assert!(ledger
                .transfer_from(TOKEN, owner, spender, sink, U256::from(20))
                .is_err());
        }

        #[test]
        fn overdraw_leaves_balances_untouched() {
            let mut ledger = TestToken::new();
            let (a, b) = (Address([1; 20]), Address([2; 20]));
            ledger.faucet(TOKEN, a, U256::from(5));

            assert_eq!(
                ledger.transfer(TOKEN, a, b, U256::from(6)),
                Err(Error::InsufficientBalance { token: TOKEN, from: a })
            );
            assert_eq!(ledger.balance_of(TOKEN, a), U256::from(5));
            assert_eq!(ledger.balance_of(TOKEN, b), U256::zero());
        }
    }
}
