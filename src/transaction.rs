//! Unsigned standard-transaction construction.
//!
//! One coin of the batch (the *primary*, lowest coin id) creates every output
//! and an announcement committing to all inputs and outputs. Every other coin
//! only asserts that announcement, so the batch is spent together or not at all.

use std::collections::HashSet;

use chia::protocol::{Bytes32, Coin, CoinSpend};
use chia_wallet_sdk::driver::SpendContext;
use plotnft_wallet::KeyRegistry;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::conditions::{build_solution, standard_puzzle, Announcement, Condition};
use crate::error::{DriverError, DriverResult};

/// The coin of a batch that creates the outputs: the one with the lowest id.
pub fn primary_coin(coins: &[Coin]) -> DriverResult<Coin> {
    coins
        .iter()
        .min_by_key(|coin| coin.coin_id().to_bytes())
        .copied()
        .ok_or(DriverError::NoCoins)
}

/// An extra output created alongside the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Payment {
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl Payment {
    pub fn new(puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            puzzle_hash,
            amount,
        }
    }
}

/// What a transaction should pay, and where the rest goes.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub target_puzzle_hash: Bytes32,
    pub amount: u64,
    pub change_puzzle_hash: Bytes32,
    pub fee: u64,
    /// Announcement ids from other spends that must be present for this one to be valid.
    pub announcements_to_assert: Vec<Bytes32>,
    /// Outputs created before the target.
    pub primaries: Vec<Payment>,
}

impl TransactionRequest {
    pub fn new(target_puzzle_hash: Bytes32, amount: u64, change_puzzle_hash: Bytes32) -> Self {
        Self {
            target_puzzle_hash,
            amount,
            change_puzzle_hash,
            fee: 0,
            announcements_to_assert: Vec::new(),
            primaries: Vec::new(),
        }
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn assert_announcement(mut self, announcement_id: Bytes32) -> Self {
        self.announcements_to_assert.push(announcement_id);
        self
    }

    pub fn with_primary(mut self, payment: Payment) -> Self {
        self.primaries.push(payment);
        self
    }

    fn required(&self) -> u128 {
        self.primaries
            .iter()
            .map(|p| p.amount as u128)
            .sum::<u128>()
            + self.amount as u128
            + self.fee as u128
    }
}

/// The conditions chosen for one input coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendPlan {
    pub coin: Coin,
    pub conditions: Vec<Condition>,
}

/// Built but unsigned spends, with the plan they were built from.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub coin_spends: Vec<CoinSpend>,
    pub plans: Vec<SpendPlan>,
    /// Announcement created by the primary coin and asserted by the others.
    pub primary_announcement: Announcement,
    pub change: u64,
}

impl UnsignedTransaction {
    pub fn primary(&self) -> &SpendPlan {
        &self.plans[0]
    }
}

/// Builds standard-puzzle spends for coins controlled by a [`KeyRegistry`].
pub struct TransactionBuilder<'a> {
    keys: &'a mut KeyRegistry,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(keys: &'a mut KeyRegistry) -> Self {
        Self { keys }
    }

    /// Decide the conditions for every input coin.
    ///
    /// Pure: touches neither the key registry nor a spend context.
    pub fn plan(coins: &[Coin], request: &TransactionRequest) -> DriverResult<UnsignedPlan> {
        let mut coins = coins.to_vec();
        coins.sort_by_key(|coin| coin.coin_id().to_bytes());
        coins.dedup_by_key(|coin| coin.coin_id());

        let primary = primary_coin(&coins)?;

        let spend_value: u128 = coins.iter().map(|coin| coin.amount as u128).sum();
        let required = request.required();
        if spend_value < required {
            return Err(DriverError::InsufficientFunds {
                available: spend_value,
                required,
            });
        }
        let change = spend_value - required;
        let change = u64::try_from(change).map_err(|_| DriverError::AmountOverflow(change))?;

        let mut seen = HashSet::new();
        for payment in request
            .primaries
            .iter()
            .copied()
            .chain([Payment::new(request.target_puzzle_hash, request.amount)])
        {
            if !seen.insert(payment) {
                return Err(DriverError::DuplicateOutputs {
                    puzzle_hash: payment.puzzle_hash,
                    amount: payment.amount,
                });
            }
        }

        let mut outputs: Vec<Payment> = request.primaries.clone();
        outputs.push(Payment::new(request.target_puzzle_hash, request.amount));
        if change > 0 {
            outputs.push(Payment::new(request.change_puzzle_hash, change));
        }

        let primary_id = primary.coin_id();
        let mut hasher = Sha256::new();
        for coin in &coins {
            hasher.update(coin.coin_id());
        }
        for output in &outputs {
            hasher.update(Coin::new(primary_id, output.puzzle_hash, output.amount).coin_id());
        }
        let message = Bytes32::new(hasher.finalize().into());
        let primary_announcement = Announcement::new(primary_id, message);

        let mut primary_conditions: Vec<Condition> = outputs
            .iter()
            .map(|output| Condition::CreateCoin {
                puzzle_hash: output.puzzle_hash,
                amount: output.amount,
            })
            .collect();
        if request.fee > 0 {
            primary_conditions.push(Condition::ReserveFee(request.fee));
        }
        primary_conditions.push(Condition::CreateCoinAnnouncement(message));
        primary_conditions.extend(
            request
                .announcements_to_assert
                .iter()
                .map(|id| Condition::AssertCoinAnnouncement(*id)),
        );

        let mut plans = Vec::with_capacity(coins.len());
        plans.push(SpendPlan {
            coin: primary,
            conditions: primary_conditions,
        });
        for coin in coins.iter().skip(1) {
            plans.push(SpendPlan {
                coin: *coin,
                conditions: vec![Condition::AssertCoinAnnouncement(primary_announcement.id())],
            });
        }

        Ok(UnsignedPlan {
            plans,
            primary_announcement,
            change,
        })
    }

    /// Build the unsigned spends moving `coins` according to `request`.
    ///
    /// The synthetic key of every input is cached in the registry for signing.
    #[instrument(skip_all, fields(coins = coins.len(), amount = request.amount, fee = request.fee))]
    pub fn build(
        &mut self,
        ctx: &mut SpendContext,
        coins: &[Coin],
        request: &TransactionRequest,
    ) -> DriverResult<UnsignedTransaction> {
        let UnsignedPlan {
            plans,
            primary_announcement,
            change,
        } = Self::plan(coins, request)?;

        let mut coin_spends = Vec::with_capacity(plans.len());
        for plan in &plans {
            let synthetic_key = self.keys.synthetic_secret_key(&plan.coin.puzzle_hash)?;
            let puzzle_reveal = standard_puzzle(ctx, synthetic_key)?;
            let solution = build_solution(ctx, &plan.conditions)?;
            coin_spends.push(CoinSpend::new(plan.coin, puzzle_reveal, solution));
        }

        debug!(
            spends = coin_spends.len(),
            change,
            announcement = %hex::encode(primary_announcement.id()),
            "built unsigned transaction"
        );

        Ok(UnsignedTransaction {
            coin_spends,
            plans,
            primary_announcement,
            change,
        })
    }
}

/// Output of [`TransactionBuilder::plan`].
#[derive(Debug, Clone)]
pub struct UnsignedPlan {
    pub plans: Vec<SpendPlan>,
    pub primary_announcement: Announcement,
    pub change: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clvm_utils::tree_hash_from_bytes;
    use plotnft_wallet::{Network, Signer, DEFAULT_KEY_COUNT};

    fn registry() -> KeyRegistry {
        KeyRegistry::derive(&[21u8; 64], DEFAULT_KEY_COUNT).unwrap()
    }

    fn coin(keys: &KeyRegistry, index: u32, parent: u8, amount: u64) -> Coin {
        Coin::new(Bytes32::new([parent; 32]), keys.wallet_puzzle_hash(index), amount)
    }

    fn created(plans: &[SpendPlan]) -> Vec<(Bytes32, u64)> {
        plans
            .iter()
            .flat_map(|plan| plan.conditions.iter())
            .filter_map(|condition| match condition {
                Condition::CreateCoin {
                    puzzle_hash,
                    amount,
                } => Some((*puzzle_hash, *amount)),
                _ => None,
            })
            .collect()
    }

    fn reserved(plans: &[SpendPlan]) -> u64 {
        plans
            .iter()
            .flat_map(|plan| plan.conditions.iter())
            .map(|condition| match condition {
                Condition::ReserveFee(fee) => *fee,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_scenario_two_coins_fund_one_mojo() {
        let mut keys = registry();
        let coins = [coin(&keys, 0, 1, 1000), coin(&keys, 0, 2, 1)];
        let target = Bytes32::new([0xee; 32]);
        let change_ph = keys.payout_puzzle_hash();

        let ctx = &mut SpendContext::new();
        let tx = TransactionBuilder::new(&mut keys)
            .build(ctx, &coins, &TransactionRequest::new(target, 1, change_ph))
            .unwrap();

        assert_eq!(tx.coin_spends.len(), 2);
        assert_eq!(tx.change, 1000);
        assert_eq!(created(&tx.plans), vec![(target, 1), (change_ph, 1000)]);
        assert_eq!(created(std::slice::from_ref(tx.primary())).len(), 2);
        assert_eq!(reserved(&tx.plans), 0);
    }

    #[test]
    fn test_conservation_with_fee_and_primaries() {
        let mut keys = registry();
        let coins = [
            coin(&keys, 0, 1, 500),
            coin(&keys, 3, 2, 700),
            coin(&keys, 5, 3, 40),
        ];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 300, keys.payout_puzzle_hash())
            .with_fee(25)
            .with_primary(Payment::new(Bytes32::new([0xbb; 32]), 100));

        let ctx = &mut SpendContext::new();
        let tx = TransactionBuilder::new(&mut keys).build(ctx, &coins, &request).unwrap();

        let inputs: u64 = coins.iter().map(|c| c.amount).sum();
        let outputs: u64 = created(&tx.plans).iter().map(|(_, amount)| amount).sum();
        assert_eq!(inputs, outputs + reserved(&tx.plans));
        assert_eq!(reserved(&tx.plans), 25);
        assert_eq!(tx.change, 1240 - 300 - 100 - 25);

        // extra primaries come before the target
        assert_eq!(created(&tx.plans)[0], (Bytes32::new([0xbb; 32]), 100));
        assert_eq!(created(&tx.plans)[1], (Bytes32::new([0xaa; 32]), 300));
    }

    #[test]
    fn test_exact_amount_emits_no_change() {
        let mut keys = registry();
        let coins = [coin(&keys, 0, 1, 60), coin(&keys, 1, 2, 40)];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 90, keys.payout_puzzle_hash()).with_fee(10);

        let ctx = &mut SpendContext::new();
        let tx = TransactionBuilder::new(&mut keys).build(ctx, &coins, &request).unwrap();

        assert_eq!(tx.change, 0);
        assert_eq!(created(&tx.plans), vec![(Bytes32::new([0xaa; 32]), 90)]);
    }

    #[test]
    fn test_non_primary_spends_only_assert_primary_announcement() {
        let keys = registry();
        let coins = [
            coin(&keys, 0, 1, 10),
            coin(&keys, 1, 2, 10),
            coin(&keys, 2, 3, 10),
        ];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 25, keys.payout_puzzle_hash());
        let plan = TransactionBuilder::plan(&coins, &request).unwrap();

        let primary = &plan.plans[0];
        assert_eq!(plan.primary_announcement.origin_coin_id, primary.coin.coin_id());
        assert!(primary
            .conditions
            .contains(&Condition::CreateCoinAnnouncement(plan.primary_announcement.message)));

        for other in &plan.plans[1..] {
            assert_eq!(
                other.conditions,
                vec![Condition::AssertCoinAnnouncement(plan.primary_announcement.id())]
            );
        }
    }

    #[test]
    fn test_removing_primary_leaves_assertions_unsatisfied() {
        let keys = registry();
        let coins = [coin(&keys, 0, 1, 10), coin(&keys, 1, 2, 10)];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 5, keys.payout_puzzle_hash());
        let plan = TransactionBuilder::plan(&coins, &request).unwrap();

        let announced = |plans: &[SpendPlan]| -> HashSet<Bytes32> {
            plans
                .iter()
                .flat_map(|p| {
                    p.conditions.iter().filter_map(move |c| match c {
                        Condition::CreateCoinAnnouncement(message) => {
                            Some(Announcement::new(p.coin.coin_id(), *message).id())
                        }
                        _ => None,
                    })
                })
                .collect()
        };

        let asserted = plan.primary_announcement.id();
        assert!(announced(&plan.plans).contains(&asserted));
        assert!(!announced(&plan.plans[1..]).contains(&asserted));
    }

    #[test]
    fn test_primary_is_lowest_coin_id_and_message_commits_to_batch() {
        let keys = registry();
        let mut coins = vec![coin(&keys, 0, 1, 10), coin(&keys, 1, 2, 10), coin(&keys, 2, 3, 10)];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 30, keys.payout_puzzle_hash());

        let plan = TransactionBuilder::plan(&coins, &request).unwrap();
        coins.reverse();
        let reversed = TransactionBuilder::plan(&coins, &request).unwrap();
        assert_eq!(plan.plans, reversed.plans);

        let mut ids: Vec<Bytes32> = coins.iter().map(|c| c.coin_id()).collect();
        ids.sort_by_key(|id| id.to_bytes());
        assert_eq!(plan.plans[0].coin.coin_id(), ids[0]);

        let mut hasher = Sha256::new();
        for id in &ids {
            hasher.update(id);
        }
        hasher.update(Coin::new(ids[0], Bytes32::new([0xaa; 32]), 30).coin_id());
        let expected = Bytes32::new(hasher.finalize().into());
        assert_eq!(plan.primary_announcement.message, expected);
    }

    #[test]
    fn test_external_announcements_asserted_by_primary() {
        let keys = registry();
        let coins = [coin(&keys, 0, 1, 10)];
        let external = Bytes32::new([0x77; 32]);
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 1, keys.payout_puzzle_hash())
            .assert_announcement(external);

        let plan = TransactionBuilder::plan(&coins, &request).unwrap();
        assert_eq!(
            plan.plans[0].conditions.last(),
            Some(&Condition::AssertCoinAnnouncement(external))
        );
    }

    #[test]
    fn test_duplicate_outputs_rejected() {
        let keys = registry();
        let coins = [coin(&keys, 0, 1, 1000)];
        let target = Bytes32::new([0xaa; 32]);
        let request = TransactionRequest::new(target, 10, keys.payout_puzzle_hash())
            .with_primary(Payment::new(target, 10));

        let err = TransactionBuilder::plan(&coins, &request).unwrap_err();
        assert!(matches!(err, DriverError::DuplicateOutputs { amount: 10, .. }));

        // same puzzle hash, different amount is fine
        let request = TransactionRequest::new(target, 10, keys.payout_puzzle_hash())
            .with_primary(Payment::new(target, 11));
        assert!(TransactionBuilder::plan(&coins, &request).is_ok());
    }

    #[test]
    fn test_insufficient_funds_and_no_coins() {
        let keys = registry();
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 100, keys.payout_puzzle_hash()).with_fee(1);

        let err = TransactionBuilder::plan(&[coin(&keys, 0, 1, 100)], &request).unwrap_err();
        assert!(matches!(
            err,
            DriverError::InsufficientFunds {
                available: 100,
                required: 101
            }
        ));

        let err = TransactionBuilder::plan(&[], &request).unwrap_err();
        assert!(matches!(err, DriverError::NoCoins));
    }

    #[test]
    fn test_unknown_puzzle_hash_fails_build() {
        let mut keys = registry();
        let foreign = Coin::new(Bytes32::new([1; 32]), Bytes32::new([0x99; 32]), 100);
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 1, keys.payout_puzzle_hash());

        let ctx = &mut SpendContext::new();
        let err = TransactionBuilder::new(&mut keys)
            .build(ctx, &[foreign], &request)
            .unwrap_err();
        assert!(matches!(err, DriverError::UnknownPuzzleHash(ph) if ph == foreign.puzzle_hash));
    }

    #[test]
    fn test_puzzle_reveals_match_coins_and_spends_sign() {
        let mut keys = registry();
        let coins = [coin(&keys, 4, 1, 50), coin(&keys, 9, 2, 50)];
        let request = TransactionRequest::new(Bytes32::new([0xaa; 32]), 60, keys.payout_puzzle_hash());

        let ctx = &mut SpendContext::new();
        let tx = TransactionBuilder::new(&mut keys).build(ctx, &coins, &request).unwrap();

        for spend in &tx.coin_spends {
            let puzzle_hash = tree_hash_from_bytes(spend.puzzle_reveal.as_ref()).unwrap();
            assert_eq!(Bytes32::from(puzzle_hash), spend.coin.puzzle_hash);
        }
        assert_eq!(keys.secret_key_store().len(), 2);

        let signature = Signer::new(Network::Testnet11).sign(&mut keys, &tx.coin_spends);
        assert!(signature.is_ok());
    }
}
