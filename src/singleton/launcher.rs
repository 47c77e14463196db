//! Plot-NFT launch: the singleton launcher spend plus the standard spends
//! funding it.

use chia::bls::Signature;
use chia::protocol::{Bytes32, Coin, CoinSpend, SpendBundle};
use chia_wallet_sdk::driver::SpendContext;
use plotnft_wallet::{KeyRegistry, Signer};
use tracing::{info, instrument};

use crate::conditions::Announcement;
use crate::error::{DriverError, DriverResult};
use crate::pool::{launcher_id_to_p2_puzzle_hash, PoolInnerPuzzle, PoolState};
use crate::puzzle::SINGLETON_LAUNCHER;
use crate::singleton::types::{LaunchedPlotNft, LauncherSolution, PoolExtraData};
use crate::transaction::{primary_coin, TransactionBuilder, TransactionRequest};

/// Singletons are created with a single mojo.
pub const SINGLETON_AMOUNT: u64 = 1;

/// Everything needed to launch one plot-NFT.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub funding_coins: Vec<Coin>,
    pub pool_state: PoolState,
    pub delay_time: u64,
    pub delay_puzzle_hash: Bytes32,
    pub change_puzzle_hash: Bytes32,
    pub fee: u64,
}

/// Builds the signed bundle that creates a pool singleton.
pub struct LauncherSpendBuilder<'a> {
    keys: &'a mut KeyRegistry,
    signer: Signer,
}

impl<'a> LauncherSpendBuilder<'a> {
    pub fn new(keys: &'a mut KeyRegistry, signer: Signer) -> Self {
        Self { keys, signer }
    }

    /// Build, sign and aggregate the launch.
    ///
    /// The launcher's parent is the funding coin with the lowest id, which is
    /// also the coin that creates the launcher in the funding transaction.
    #[instrument(skip_all, fields(coins = request.funding_coins.len(), fee = request.fee))]
    pub fn build(
        &mut self,
        ctx: &mut SpendContext,
        request: &LaunchRequest,
    ) -> DriverResult<LaunchedPlotNft> {
        let parent = primary_coin(&request.funding_coins)?;
        let launcher_coin = Coin::new(
            parent.coin_id(),
            SINGLETON_LAUNCHER.mod_hash().into(),
            SINGLETON_AMOUNT,
        );
        let launcher_id = launcher_coin.coin_id();

        let inner_puzzle = PoolInnerPuzzle::for_state(
            &request.pool_state,
            launcher_id,
            self.signer.network().genesis_challenge(),
            request.delay_time,
            request.delay_puzzle_hash,
        )?;
        let singleton_puzzle_hash = inner_puzzle.singleton_puzzle_hash(launcher_id);

        let launcher_solution = LauncherSolution {
            singleton_puzzle_hash,
            amount: SINGLETON_AMOUNT,
            key_value_list: PoolExtraData::new(
                request.pool_state.to_bytes(),
                request.delay_time,
                request.delay_puzzle_hash,
            ),
        };
        let solution_ptr = ctx
            .alloc(&launcher_solution)
            .map_err(|e| DriverError::Alloc(format!("launcher solution: {:?}", e)))?;
        let announcement = Announcement::new(launcher_id, ctx.tree_hash(solution_ptr).into());

        let funding_request = TransactionRequest::new(
            launcher_coin.puzzle_hash,
            SINGLETON_AMOUNT,
            request.change_puzzle_hash,
        )
        .with_fee(request.fee)
        .assert_announcement(announcement.id());

        let funding = TransactionBuilder::new(&mut *self.keys).build(
            ctx,
            &request.funding_coins,
            &funding_request,
        )?;
        let funding_signature = self.signer.sign(&mut *self.keys, &funding.coin_spends)?;

        let launcher_ptr = SINGLETON_LAUNCHER.load(ctx)?;
        let launcher_spend = CoinSpend::new(
            launcher_coin,
            ctx.serialize(&launcher_ptr)
                .map_err(|e| DriverError::Serialize(format!("{:?}", e)))?,
            ctx.serialize(&solution_ptr)
                .map_err(|e| DriverError::Serialize(format!("{:?}", e)))?,
        );

        let spend_bundle = SpendBundle::aggregate(&[
            SpendBundle::new(funding.coin_spends, funding_signature),
            SpendBundle::new(vec![launcher_spend], Signature::default()),
        ]);

        info!(
            launcher_id = %hex::encode(launcher_id),
            singleton_puzzle_hash = %hex::encode(singleton_puzzle_hash),
            waiting_room = inner_puzzle.is_waiting_room(),
            "built plot-NFT launch"
        );

        Ok(LaunchedPlotNft {
            spend_bundle,
            launcher_id,
            launcher_coin,
            singleton_puzzle_hash,
            p2_singleton_puzzle_hash: launcher_id_to_p2_puzzle_hash(
                launcher_id,
                request.delay_time,
                request.delay_puzzle_hash,
            ),
            inner_puzzle,
            change: funding.change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::Condition;
    use crate::pool::{PoolSingletonState, DEFAULT_DELAY_TIME};
    use chia::puzzles::Proof;
    use clvm_traits::FromClvm;
    use clvm_utils::tree_hash_from_bytes;
    use clvmr::serde::node_from_bytes;
    use clvmr::Allocator;
    use plotnft_wallet::{Network, DEFAULT_KEY_COUNT};

    fn registry() -> KeyRegistry {
        KeyRegistry::derive(&[33u8; 64], DEFAULT_KEY_COUNT).unwrap()
    }

    fn request(keys: &KeyRegistry, state: PoolSingletonState, coins: Vec<Coin>) -> LaunchRequest {
        let owner = keys.owner_public_key(0);
        let pool_state = match state {
            PoolSingletonState::SelfPooling => PoolState::self_pooling(owner, keys.payout_puzzle_hash()),
            other => PoolState::new(
                other,
                Bytes32::new([0x44; 32]),
                owner,
                Some("https://pool.example".into()),
                100,
            ),
        };
        LaunchRequest {
            funding_coins: coins,
            pool_state,
            delay_time: DEFAULT_DELAY_TIME,
            delay_puzzle_hash: keys.delay_puzzle_hash(),
            change_puzzle_hash: keys.payout_puzzle_hash(),
            fee: 0,
        }
    }

    fn launch(state: PoolSingletonState, coins: impl Fn(&KeyRegistry) -> Vec<Coin>) -> LaunchedPlotNft {
        let mut keys = registry();
        let request = request(&keys, state, coins(&keys));
        let ctx = &mut SpendContext::new();
        LauncherSpendBuilder::new(&mut keys, Signer::new(Network::Testnet11))
            .build(ctx, &request)
            .unwrap()
    }

    fn one_coin(keys: &KeyRegistry) -> Vec<Coin> {
        vec![Coin::new(Bytes32::new([1; 32]), keys.first_puzzle_hash(), 1000)]
    }

    #[test]
    fn test_launcher_coin_and_singleton() {
        let launched = launch(PoolSingletonState::SelfPooling, one_coin);
        let parent = Coin::new(Bytes32::new([1; 32]), registry().first_puzzle_hash(), 1000);

        assert_eq!(launched.launcher_coin.parent_coin_info, parent.coin_id());
        assert_eq!(launched.launcher_coin.amount, 1);
        assert_eq!(launched.launcher_id, launched.launcher_coin.coin_id());
        assert_eq!(
            launched.singleton_puzzle_hash,
            launched.inner_puzzle.singleton_puzzle_hash(launched.launcher_id)
        );
        assert_eq!(launched.singleton_coin().parent_coin_info, launched.launcher_id);
        assert_eq!(launched.change, 999);
        assert!(matches!(
            launched.eve_proof(),
            Proof::Eve(proof) if proof.parent_parent_coin_info == parent.coin_id() && proof.parent_amount == 1
        ));
    }

    #[test]
    fn test_inner_puzzle_follows_state() {
        assert!(launch(PoolSingletonState::SelfPooling, one_coin).inner_puzzle.is_waiting_room());
        assert!(launch(PoolSingletonState::LeavingPool, one_coin).inner_puzzle.is_waiting_room());
        assert!(!launch(PoolSingletonState::FarmingToPool, one_coin).inner_puzzle.is_waiting_room());
    }

    #[test]
    fn test_invalid_state_byte_rejected() {
        let mut keys = registry();
        let mut request = request(&keys, PoolSingletonState::SelfPooling, one_coin(&keys));
        request.pool_state.state = 7;

        let ctx = &mut SpendContext::new();
        let err = LauncherSpendBuilder::new(&mut keys, Signer::default())
            .build(ctx, &request)
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidInitialState(_)));
    }

    #[test]
    fn test_bundle_links_funding_and_launcher() {
        let launched = launch(PoolSingletonState::FarmingToPool, |keys| {
            vec![
                Coin::new(Bytes32::new([1; 32]), keys.first_puzzle_hash(), 1000),
                Coin::new(Bytes32::new([2; 32]), keys.wallet_puzzle_hash(3), 1),
            ]
        });
        let spends = &launched.spend_bundle.coin_spends;
        assert_eq!(spends.len(), 3);

        let launcher_spend = spends
            .iter()
            .find(|spend| spend.coin == launched.launcher_coin)
            .unwrap();
        assert_eq!(
            tree_hash_from_bytes(launcher_spend.puzzle_reveal.as_ref()).unwrap(),
            SINGLETON_LAUNCHER.mod_hash()
        );

        let mut allocator = Allocator::new();
        let ptr = node_from_bytes(&mut allocator, launcher_spend.solution.as_ref()).unwrap();
        let solution = LauncherSolution::<PoolExtraData>::from_clvm(&allocator, ptr).unwrap();
        assert_eq!(solution.singleton_puzzle_hash, launched.singleton_puzzle_hash);
        assert_eq!(solution.amount, 1);
        assert_eq!(solution.key_value_list.pool_state.0.as_ref(), b"p");
        assert_eq!(solution.key_value_list.delay_time, (b"t".to_vec().into(), DEFAULT_DELAY_TIME));
        assert_eq!(solution.key_value_list.delay_puzzle_hash.1, registry().delay_puzzle_hash());

        let message = tree_hash_from_bytes(launcher_spend.solution.as_ref()).unwrap();
        let expected = Announcement::new(launched.launcher_id, message.into()).id();

        // the primary funding coin creates the launcher and asserts its announcement
        let primary = spends
            .iter()
            .find(|spend| spend.coin.coin_id() == launched.launcher_coin.parent_coin_info)
            .unwrap();
        let plan = TransactionBuilder::plan(
            &[spends[0].coin, spends[1].coin],
            &TransactionRequest::new(
                launched.launcher_coin.puzzle_hash,
                1,
                registry().payout_puzzle_hash(),
            )
            .assert_announcement(expected),
        )
        .unwrap();
        assert_eq!(plan.plans[0].coin, primary.coin);
        assert!(plan.plans[0]
            .conditions
            .contains(&Condition::AssertCoinAnnouncement(expected)));

        let ctx = &mut SpendContext::new();
        let rebuilt = crate::conditions::build_solution(ctx, &plan.plans[0].conditions).unwrap();
        assert_eq!(rebuilt, primary.solution);
    }

    #[test]
    fn test_signature_covers_funding_spends() {
        let mut keys = registry();
        let request = request(&keys, PoolSingletonState::SelfPooling, one_coin(&keys));
        let signer = Signer::new(Network::Testnet11);

        let ctx = &mut SpendContext::new();
        let launched = LauncherSpendBuilder::new(&mut keys, signer).build(ctx, &request).unwrap();

        let funding: Vec<CoinSpend> = launched
            .spend_bundle
            .coin_spends
            .iter()
            .filter(|spend| spend.coin != launched.launcher_coin)
            .cloned()
            .collect();
        let expected = signer.sign(&mut keys, &funding).unwrap();
        assert_eq!(launched.spend_bundle.aggregated_signature, expected);
    }

    #[test]
    fn test_no_funding_coins() {
        let mut keys = registry();
        let request = request(&keys, PoolSingletonState::SelfPooling, Vec::new());
        let ctx = &mut SpendContext::new();
        let err = LauncherSpendBuilder::new(&mut keys, Signer::default())
            .build(ctx, &request)
            .unwrap_err();
        assert!(matches!(err, DriverError::NoCoins));
    }
}
