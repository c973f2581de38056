//! End-to-end flows: quote a market, price bets and parlays, track
//! submissions, and read reputation, all against the mock ledger.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration as StdDuration;

use zkpredict_engine::engine::poller::{OddsPoller, WatchedMarket};
use zkpredict_engine::engine::submissions::{SubmissionState, SubmissionTracker};
use zkpredict_engine::engine::{ReputationSource, TransactionRequest, TxStatus};
use zkpredict_engine::pricing::{OddsEngine, ParlayPricer, ParlaySlip, ReturnCalculator};
use zkpredict_engine::reputation::{DisclosureRequest, ReputationStateMachine, ReputationSummary};
use zkpredict_engine::storage::{save_snapshot, ChainSnapshot, SnapshotFile};
use zkpredict_engine::types::{Market, ParlayLeg, Reputation, ReputationTier, ValidationError};

use crate::mock_ledger::MockLedger;

fn open_market(id: &str, outcomes: u8) -> Market {
    Market::new(id, outcomes, Utc::now() + Duration::days(7), 1_000).unwrap()
}

// ---------------------------------------------------------------------------
// Worked examples
// ---------------------------------------------------------------------------

#[test]
fn test_binary_market_example() {
    let book = OddsEngine::quote(&[3_500_000, 6_500_000]).unwrap();
    assert_eq!(book.total_pool, 10_000_000);
    assert_eq!(book.quotes[0].pool_share, dec!(35.0));
    assert_eq!(book.quotes[0].odds, dec!(2.86));
    assert_eq!(book.quotes[1].pool_share, dec!(65.0));
    assert_eq!(book.quotes[1].odds, dec!(1.54));

    let payout = ReturnCalculator::default()
        .quote_bet(&book, 1, dec!(1_000_000))
        .unwrap();
    assert_eq!(payout.gross_return, dec!(1_540_000));
    assert_eq!(payout.fee, dec!(30_800));
    assert_eq!(payout.net_return, dec!(1_509_200));
    // 50.92% before display rounding
    assert_eq!(payout.roi, dec!(50.9));
}

#[test]
fn test_expert_three_leg_parlay_example() {
    let mut slip = ParlaySlip::new(ReputationTier::Expert);
    for (i, outcome) in [1u8, 0, 1].into_iter().enumerate() {
        slip.add_market_leg(&open_market(&format!("m{i}"), 2), outcome)
            .unwrap();
    }
    let (quote, payout) = ParlayPricer::default()
        .price_slip(&slip, dec!(1_000_000))
        .unwrap();
    assert_eq!(quote.base_odds, dec!(7.0));
    assert_eq!(quote.tier_bonus, dec!(1.2));
    assert_eq!(quote.combined_odds, dec!(8.4));
    assert_eq!(payout.gross_return, dec!(8_400_000));
    assert_eq!(payout.fee, dec!(168_000));
    assert_eq!(payout.net_return, dec!(8_232_000));

    // Expert's ceiling is four legs
    slip.add_market_leg(&open_market("m3", 2), 0).unwrap();
    assert_eq!(slip.quote().unwrap().combined_odds, dec!(16.8));
    assert!(slip.add_market_leg(&open_market("m4", 2), 0).is_err());
}

#[test]
fn test_skilled_fourth_leg_rejected_before_submission() {
    let mut slip = ParlaySlip::new(ReputationTier::Skilled);
    for i in 0..3 {
        slip.add_leg(ParlayLeg::new(format!("m{i}"), 0)).unwrap();
    }
    let err = slip.add_leg(ParlayLeg::new("m3", 0)).unwrap_err();
    assert!(matches!(err, ValidationError::TierLegLimit { max_legs: 3, attempted: 4, .. }));
    assert_eq!(slip.len(), 3);
    assert!(TransactionRequest::place_parlay(&slip, 1_000_000).is_ok());
}

#[test]
fn test_resolved_market_cannot_join_parlay() {
    let resolved = open_market("done", 3).resolved_with(2).unwrap();
    let mut slip = ParlaySlip::new(ReputationTier::Oracle);
    assert_eq!(
        slip.add_market_leg(&resolved, 0).unwrap_err(),
        ValidationError::MarketResolved("done".into())
    );
    assert!(slip.is_empty());
}

// ---------------------------------------------------------------------------
// Polling and submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_confirmed_bet_moves_odds_on_next_refresh() {
    let ledger = MockLedger::new();
    ledger.set_pools("btc", vec![3_500_000, 6_500_000]);
    let poller = OddsPoller::new(
        ledger.clone(),
        vec![WatchedMarket::new("btc", 2).unwrap()],
        StdDuration::from_secs(30),
    );

    let before = poller.refresh_once().await;
    let before = before[0].book.as_ref().unwrap().clone();
    assert_eq!(before.quotes[0].odds, dec!(2.86));

    let market = open_market("btc", 2);
    let mut tracker = SubmissionTracker::new();
    let request = TransactionRequest::place_bet(&market, 0, 3_000_000, Utc::now()).unwrap();
    let tx_id = tracker.submit(&ledger, request).await.unwrap();

    // submitted but unconfirmed: nothing changes
    assert_eq!(tracker.refresh(&ledger).await.still_pending, 1);
    let pending_view = poller.refresh_once().await;
    assert_eq!(pending_view[0].book.as_ref().unwrap(), &before);

    ledger.settle(&tx_id, TxStatus::Confirmed);
    ledger.add_stake("btc", 0, 3_000_000);
    let report = tracker.refresh(&ledger).await;
    assert_eq!(report.confirmed, vec![tx_id.clone()]);
    assert_eq!(tracker.get(&tx_id).unwrap().state, SubmissionState::Confirmed);

    let after = poller.refresh_once().await;
    let after = after[0].book.as_ref().unwrap();
    assert_eq!(after.total_pool, 13_000_000);
    assert_eq!(after.quotes[0].pool_share, dec!(50.0));
    assert_eq!(after.quotes[0].odds, dec!(2.0));
    assert_eq!(ledger.submitted().len(), 1);
}

#[tokio::test]
async fn test_unreachable_pool_treated_as_empty() {
    let ledger = MockLedger::new();
    ledger.set_pools("election", vec![1_000_000, 2_000_000, 1_000_000]);
    ledger.break_outcome("election", 1);
    let poller = OddsPoller::new(
        ledger,
        vec![WatchedMarket::new("election", 3).unwrap()],
        StdDuration::from_secs(30),
    );

    let updates = poller.refresh_once().await;
    assert_eq!(updates[0].failed_fetches, 1);
    let book = updates[0].book.as_ref().unwrap();
    assert_eq!(book.total_pool, 2_000_000);
    assert_eq!(book.quotes[1].odds, Decimal::ZERO);
    assert_eq!(book.quotes[0].odds, dec!(2.0));
}

#[tokio::test]
async fn test_claim_only_once() {
    let ledger = MockLedger::new();
    let mut tracker = SubmissionTracker::new();

    let first = tracker
        .submit(&ledger, TransactionRequest::claim("bet-42"))
        .await
        .unwrap();
    assert!(tracker
        .submit(&ledger, TransactionRequest::claim("bet-42"))
        .await
        .is_err());

    ledger.settle(&first, TxStatus::Failed("proof rejected".into()));
    tracker.refresh(&ledger).await;
    assert!(!tracker.is_claimed("bet-42"));

    let retry = tracker
        .submit(&ledger, TransactionRequest::claim("bet-42"))
        .await
        .unwrap();
    ledger.settle(&retry, TxStatus::Confirmed);
    tracker.refresh(&ledger).await;
    assert!(tracker.is_claimed("bet-42"));

    let err = tracker
        .submit(&ledger, TransactionRequest::claim("bet-42"))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::DuplicateClaim("bet-42".into()))
    );
    assert_eq!(ledger.submitted().len(), 2);
}

// ---------------------------------------------------------------------------
// Reputation
// ---------------------------------------------------------------------------

fn skilled_record() -> Reputation {
    let mut rep = Reputation::new("aleo1holder");
    rep.total_bets = 20;
    rep.total_wins = 13;
    rep.total_parlays = 4;
    rep.parlay_wins = 1;
    rep.best_streak = 5;
    rep.total_wagered = 20_000_000;
    rep.total_won = 25_000_000;
    rep.tier = ReputationTier::Skilled;
    rep
}

#[tokio::test]
async fn test_reputation_drives_parlay_limits() {
    let ledger = MockLedger::new();
    ledger.set_reputation(skilled_record());

    let rep = ledger.fetch_reputation("aleo1holder").await.unwrap().unwrap();
    let summary = ReputationSummary::from_record(&rep).unwrap();
    assert_eq!(summary.accuracy, dec!(65.0));
    assert_eq!(summary.parlay_accuracy, dec!(25.0));
    assert_eq!(summary.net_profit, dec!(5));
    assert_eq!(summary.profit_percent, dec!(25.0));
    assert_eq!(summary.max_parlay_legs, 3);
    assert_eq!(summary.parlay_bonus, dec!(1.1));

    let progress = summary.progress;
    assert_eq!(progress.next_tier, Some(ReputationTier::Expert));
    assert_eq!(progress.wins_remaining, 3);
    assert_eq!(progress.progress_percent, dec!(81.3));
    assert!(!progress.ready_to_advance);

    assert!(ledger.fetch_reputation("aleo1nobody").await.unwrap().is_none());
}

#[test]
fn test_qualifying_tier_tracks_thresholds() {
    assert_eq!(ReputationStateMachine::qualifying_tier(5, 5), ReputationTier::Novice);
    assert_eq!(ReputationStateMachine::qualifying_tier(6, 10), ReputationTier::Skilled);
    assert_eq!(ReputationStateMachine::qualifying_tier(16, 22), ReputationTier::Expert);
    assert_eq!(ReputationStateMachine::qualifying_tier(31, 38), ReputationTier::Oracle);
    // wins alone are not enough
    assert_eq!(ReputationStateMachine::qualifying_tier(40, 100), ReputationTier::Novice);
}

#[test]
fn test_disclosure_bounded_by_record() {
    let rep = skilled_record();
    assert!(DisclosureRequest::strongest(&rep).validate_against(&rep).is_ok());
    assert!(DisclosureRequest::tier_only(ReputationTier::Expert)
        .validate_against(&rep)
        .is_err());
}

// ---------------------------------------------------------------------------
// Snapshot-backed sources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_snapshot_file_feeds_poller() {
    let mut path = std::env::temp_dir();
    path.push(format!("zkpredict_it_{}.json", uuid::Uuid::new_v4()));

    let mut snapshot = ChainSnapshot::default();
    snapshot.markets.insert("m1".into(), vec![0, 4_000_000]);
    snapshot.reputations.insert("aleo1holder".into(), skilled_record());
    save_snapshot(&snapshot, &path).unwrap();

    let file = SnapshotFile::new(&path);
    let rep = file.fetch_reputation("aleo1holder").await.unwrap().unwrap();
    assert_eq!(rep.tier, ReputationTier::Skilled);

    let poller = OddsPoller::new(
        file,
        vec![WatchedMarket::new("m1", 2).unwrap()],
        StdDuration::from_secs(30),
    );
    let updates = poller.refresh_once().await;
    let book = updates[0].book.as_ref().unwrap();
    assert_eq!(book.favorite().unwrap().outcome_index, 1);
    assert_eq!(book.quotes[1].odds, Decimal::ONE);

    std::fs::remove_file(&path).unwrap();
}
