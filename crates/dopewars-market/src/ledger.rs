//! The user ledger: every player account, plus checked balance moves.
//!
//! [`debit`] and [`credit`] operate on a single [`UserAccount`] so the turn
//! orchestrator can stage changes on a copy and commit the copy only once
//! every step of the turn has succeeded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dopewars_types::{ItemId, UserAccount, UserId};

use crate::MarketError;

/// Keyed store of player accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    accounts: BTreeMap<UserId, UserAccount>,
}

impl UserLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
        }
    }

    /// Look up an existing account.
    pub fn get(&self, user: UserId) -> Option<&UserAccount> {
        self.accounts.get(&user)
    }

    /// A copy of the account, or a fresh one holding `starting_money`.
    ///
    /// The fresh account is not stored; it becomes persistent only when
    /// passed back through [`UserLedger::commit`].
    pub fn snapshot_or_new(&self, user: UserId, starting_money: u64) -> UserAccount {
        self.accounts
            .get(&user)
            .cloned()
            .unwrap_or_else(|| UserAccount::with_money(starting_money))
    }

    /// Store an account, replacing any previous state.
    pub fn commit(&mut self, user: UserId, account: UserAccount) {
        self.accounts.insert(user, account);
    }

    /// Overwrite a player's currency balance, creating the account if needed.
    pub fn set_money(&mut self, user: UserId, money: u64) {
        self.accounts
            .entry(user)
            .and_modify(|account| account.money = money)
            .or_insert_with(|| UserAccount::with_money(money));
    }

    /// Number of known accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no account exists.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts in user order.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &UserAccount)> + '_ {
        self.accounts.iter().map(|(&user, account)| (user, account))
    }
}

/// Remove `amount` of an asset from an account.
///
/// Item 0 is the currency. Fails without mutating if the account holds
/// less than `amount`.
pub fn debit(account: &mut UserAccount, item: ItemId, amount: u64) -> Result<(), MarketError> {
    let held = account.balance(item);
    let remaining = held
        .checked_sub(amount)
        .ok_or(MarketError::InsufficientBalance {
            item,
            held,
            requested: amount,
        })?;
    store(account, item, remaining);
    Ok(())
}

/// Add `amount` of an asset to an account.
///
/// Item 0 is the currency. Fails without mutating on `u64` overflow.
pub fn credit(account: &mut UserAccount, item: ItemId, amount: u64) -> Result<(), MarketError> {
    let total = account
        .balance(item)
        .checked_add(amount)
        .ok_or(MarketError::ArithmeticOverflow {
            context: "account balance after credit",
        })?;
    store(account, item, total);
    Ok(())
}

fn store(account: &mut UserAccount, item: ItemId, amount: u64) {
    if item.is_currency() {
        account.money = amount;
    } else {
        account.set_item_balance(item, amount);
    }
}
