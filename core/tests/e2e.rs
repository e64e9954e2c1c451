use proptest::prelude::*;
use split_escrow_core::{
    AssetBook, AssetRef, EscrowError, EscrowLedger, FungibleAsset, Identity, MemoryAssets, Recipient,
    Result, Role, TransferError,
};

fn assert_err<T, E>(res: Result<T>, expected: E)
where
    E: std::fmt::Debug + PartialEq<E>,
    EscrowError: Into<E> + PartialEq<E>,
{
    match res {
        Err(e) => assert_eq!(e.into(), expected),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

/// Accounts of a 70/30 escrow plus two tokens, mirroring a fresh deployment.
struct World {
    owner: Identity,
    fulfiller: Identity,
    r1: Identity,
    r2: Identity,
    outsider: Identity,
    dai: AssetRef,
    bat: AssetRef,
    book: MemoryAssets,
    escrow: EscrowLedger,
}

impl World {
    fn new() -> Self {
        let owner = Identity::from_bytes([1; 20]);
        let fulfiller = Identity::from_bytes([2; 20]);
        let r1 = Identity::from_bytes([3; 20]);
        let r2 = Identity::from_bytes([4; 20]);
        let outsider = Identity::from_bytes([5; 20]);
        let dai = AssetRef::new(Identity::from_bytes([0xda; 20])).with_symbol("DAI");
        let bat = AssetRef::new(Identity::from_bytes([0xba; 20])).with_symbol("BAT");

        let mut book = MemoryAssets::default();
        book.deploy(dai.clone());
        book.deploy(bat.clone());

        let escrow = EscrowLedger::new(
            &owner,
            vec![
                Recipient::new(r1.clone(), 70),
                Recipient::new(r2.clone(), 30),
            ],
            fulfiller.clone(),
        )
        .unwrap();

        Self {
            owner,
            fulfiller,
            r1,
            r2,
            outsider,
            dai,
            bat,
            book,
            escrow,
        }
    }

    fn mint(&mut self, asset: &AssetRef, amount: u128) {
        let owner = self.owner.clone();
        self.book.deploy(asset.clone()).mint(&owner, amount).unwrap();
    }

    fn deposit(&mut self, asset: &AssetRef, amount: u128) {
        let (owner, escrow) = (self.owner.clone(), self.escrow.address().clone());
        self.book
            .deploy(asset.clone())
            .transfer(&owner, &escrow, amount)
            .unwrap();
    }

    fn set_asset(&mut self, asset: &AssetRef) {
        let owner = self.owner.clone();
        self.escrow
            .set_asset_reference(&owner, asset.clone())
            .unwrap();
    }

    fn fulfill(&mut self) {
        let fulfiller = self.fulfiller.clone();
        self.escrow.fulfill_conditions(&fulfiller).unwrap();
    }

    fn claim(&mut self) -> Result<u128> {
        let caller = self.outsider.clone();
        self.escrow
            .claim(&caller, &mut self.book)
            .map(|receipt| receipt.distributed())
    }

    fn balance(&self, asset: &AssetRef, holder: &Identity) -> u128 {
        self.book.balance_of(asset, holder)
    }
}

#[test]
fn distributes_after_conditions_fulfilled() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 1000);
    w.deposit(&dai, 1000);
    w.set_asset(&dai);
    w.fulfill();
    assert_eq!(w.claim().unwrap(), 1000);

    assert_eq!(w.balance(&dai, &w.r1), 700);
    assert_eq!(w.balance(&dai, &w.r2), 300);
    assert_eq!(w.balance(&dai, w.escrow.address()), 0);
}

#[test]
fn fulfilling_before_asset_is_set() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 2000);
    w.deposit(&dai, 1000);
    w.fulfill();
    assert_err(w.claim(), EscrowError::AssetNotConfigured);
    w.set_asset(&dai);
    w.claim().unwrap();

    assert_eq!(w.balance(&dai, &w.r1), 700);
    assert_eq!(w.balance(&dai, &w.r2), 300);
}

#[test]
fn multiple_claims() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 3000);
    w.deposit(&dai, 1000);
    w.deposit(&dai, 1000);
    w.fulfill();
    w.set_asset(&dai);
    assert_eq!(w.claim().unwrap(), 2000);
    // nothing new arrived
    assert_eq!(w.claim().unwrap(), 0);
    w.deposit(&dai, 1000);
    assert_eq!(w.claim().unwrap(), 1000);

    assert_eq!(w.balance(&dai, &w.r1), 2100);
    assert_eq!(w.balance(&dai, &w.r2), 900);
}

#[test]
fn asset_changed_several_times() {
    let mut w = World::new();
    let (dai, bat) = (w.dai.clone(), w.bat.clone());
    w.mint(&dai, 3000);
    w.mint(&bat, 1000);

    w.deposit(&dai, 1000);
    w.fulfill();
    w.set_asset(&dai);
    w.deposit(&dai, 1000);

    // escrow holds no BAT: nothing moves, DAI stays put
    w.set_asset(&bat);
    assert_eq!(w.claim().unwrap(), 0);
    assert_eq!(w.balance(&dai, w.escrow.address()), 2000);
    assert_eq!(w.balance(&bat, &w.r1), 0);

    w.set_asset(&dai);
    assert_eq!(w.claim().unwrap(), 2000);
    assert_eq!(w.balance(&dai, &w.r1), 1400);
    assert_eq!(w.balance(&dai, &w.r2), 600);

    w.deposit(&dai, 1000);
    w.set_asset(&bat);
    w.set_asset(&dai);
    w.claim().unwrap();
    assert_eq!(w.balance(&dai, &w.r1), 2100);
    assert_eq!(w.balance(&dai, &w.r2), 900);
    assert_eq!(w.balance(&bat, &w.owner), 1000);
}

#[test]
fn no_distribution_before_fulfilment() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 1000);
    w.deposit(&dai, 1000);
    w.set_asset(&dai);

    let res = w.claim();
    assert_eq!(
        res.as_ref().unwrap_err().to_string(),
        "conditions are not yet fulfilled"
    );
    assert_err(res, EscrowError::ConditionsNotFulfilled);
    assert_eq!(w.balance(&dai, w.escrow.address()), 1000);
}

#[test]
fn outsiders_cannot_fulfil_conditions() {
    let mut w = World::new();
    let outsider = w.outsider.clone();
    assert_err(
        w.escrow.fulfill_conditions(&outsider),
        EscrowError::Unauthorized(Role::ConditionsFulfiller),
    );
    assert!(!w.escrow.conditions_fulfilled());
}

#[test]
fn outsiders_cannot_set_asset() {
    let mut w = World::new();
    let (outsider, dai) = (w.outsider.clone(), w.dai.clone());
    assert_err(
        w.escrow.set_asset_reference(&outsider, dai),
        EscrowError::Unauthorized(Role::Owner),
    );
    assert!(w.escrow.current_asset().is_none());
}

#[test]
fn no_claim_before_asset_is_set() {
    let mut w = World::new();
    let res = w.claim();
    assert_eq!(
        res.as_ref().unwrap_err().to_string(),
        "token address is not set"
    );
    assert_err(res, EscrowError::AssetNotConfigured);
}

#[test]
fn remainder_carries_to_next_claim() {
    let owner = Identity::from_bytes([1; 20]);
    let fulfiller = Identity::from_bytes([2; 20]);
    let recipients: Vec<Identity> = (10u8..13).map(|n| Identity::from_bytes([n; 20])).collect();
    let mut escrow = EscrowLedger::new(
        &owner,
        vec![
            Recipient::new(recipients[0].clone(), 33),
            Recipient::new(recipients[1].clone(), 33),
            Recipient::new(recipients[2].clone(), 34),
        ],
        fulfiller.clone(),
    )
    .unwrap();
    let dai = AssetRef::new(Identity::from_bytes([0xda; 20]));
    let mut book = MemoryAssets::default();
    book.deploy(dai.clone()).mint(escrow.address(), 10).unwrap();
    escrow.set_asset_reference(&owner, dai.clone()).unwrap();
    escrow.fulfill_conditions(&fulfiller).unwrap();

    let first = escrow.claim(&owner, &mut book).unwrap();
    assert_eq!(first.remainder, 1);
    assert_eq!(book.balance_of(&dai, escrow.address()), 1);

    book.deploy(dai.clone()).mint(escrow.address(), 90).unwrap();
    let second = escrow.claim(&owner, &mut book).unwrap();
    assert_eq!(second.balance, 91);
    assert_eq!(second.remainder, 1);

    let got: Vec<u128> = recipients
        .iter()
        .map(|r| book.balance_of(&dai, r))
        .collect();
    // 3+30, 3+30, 3+30
    assert_eq!(got, vec![33, 33, 33]);
}

#[test]
fn rejected_transfer_aborts_whole_claim() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 1000);
    w.deposit(&dai, 1000);
    w.set_asset(&dai);
    w.fulfill();
    let r2 = w.r2.clone();
    w.book.deploy(dai.clone()).reject_transfers_to(r2.clone());
    w.escrow.take_events();

    assert_err(
        w.claim(),
        EscrowError::Transfer(TransferError::Rejected {
            recipient: r2.clone(),
        }),
    );
    assert_eq!(w.balance(&dai, &w.r1), 0);
    assert_eq!(w.balance(&dai, w.escrow.address()), 1000);
    assert!(w.escrow.take_events().is_empty());

    // retry later once the recipient accepts again
    w.book.deploy(dai.clone()).accept_transfers_to(&r2);
    assert_eq!(w.claim().unwrap(), 1000);
    assert_eq!(w.balance(&dai, &w.r1), 700);
}

#[test]
fn preview_matches_claim() {
    let mut w = World::new();
    let dai = w.dai.clone();
    w.mint(&dai, 999);
    w.deposit(&dai, 999);
    w.set_asset(&dai);
    w.fulfill();

    let preview = w.escrow.preview_claim(&w.book).unwrap();
    assert_eq!(w.balance(&dai, w.escrow.address()), 999);
    let outsider = w.outsider.clone();
    let receipt = w.escrow.claim(&outsider, &mut w.book).unwrap();
    assert_eq!(preview, receipt);
    assert_eq!(receipt.payouts[0].amount, 699);
    assert_eq!(receipt.payouts[1].amount, 299);
    assert_eq!(receipt.remainder, 1);
}

#[derive(Debug, Clone)]
enum Op {
    Deposit(u128),
    Claim,
    Switch,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u128..1_000_000).prop_map(Op::Deposit),
        Just(Op::Claim),
        Just(Op::Switch),
    ]
}

proptest! {
    /// Property: paid out plus still held always equals everything deposited.
    #[test]
    fn conservation(ops in prop::collection::vec(op(), 1..40)) {
        let mut w = World::new();
        let (dai, bat) = (w.dai.clone(), w.bat.clone());
        w.mint(&dai, u64::MAX as u128);
        w.fulfill();
        w.set_asset(&dai);

        let mut deposited = 0u128;
        let mut on_dai = true;
        for op in ops {
            match op {
                Op::Deposit(amount) => {
                    w.deposit(&dai, amount);
                    deposited += amount;
                }
                Op::Claim => {
                    w.claim().unwrap();
                }
                Op::Switch => {
                    on_dai = !on_dai;
                    w.set_asset(if on_dai { &dai } else { &bat });
                }
            }
            let paid = w.balance(&dai, &w.r1) + w.balance(&dai, &w.r2);
            let held = w.balance(&dai, w.escrow.address());
            prop_assert_eq!(paid + held, deposited);
        }
    }

    /// Property: the order of fulfilment and asset selection does not matter.
    #[test]
    fn readiness_order_independent(amount in 0u128..1_000_000_000, fulfil_first in any::<bool>()) {
        let mut w = World::new();
        let dai = w.dai.clone();
        w.mint(&dai, amount);
        w.deposit(&dai, amount);
        if fulfil_first {
            w.fulfill();
            w.set_asset(&dai);
        } else {
            w.set_asset(&dai);
            w.fulfill();
        }
        w.claim().unwrap();
        prop_assert_eq!(w.balance(&dai, &w.r1), amount / 100 * 70 + amount % 100 * 70 / 100);
        prop_assert_eq!(w.balance(&dai, &w.r2), amount / 100 * 30 + amount % 100 * 30 / 100);
    }
}
