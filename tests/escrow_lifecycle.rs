//! Escrow state machine behavior under the mock RPC node.

mod common;

use chain_payments::payments::processor::Settlement;
use chain_payments::payments::{EscrowStatus, PaymentRequest, PaymentStage};
use chain_payments::wallet::LAMPORTS_PER_UNIT;

use common::{start_stack, TestStack, BUYER, SELLER};

fn escrow_request(amount: u64, duration_secs: Option<u64>) -> PaymentRequest {
    PaymentRequest {
        order_id: Some("order-2001".to_string()),
        sender: BUYER.to_string(),
        recipient: SELLER.to_string(),
        amount,
        memo: None,
        escrow: true,
        escrow_duration_secs: duration_secs,
    }
}

async fn open_escrow(stack: &TestStack, amount: u64, duration_secs: Option<u64>) -> String {
    let result = stack
        .processor
        .process_payment(&escrow_request(amount, duration_secs))
        .await;
    assert!(result.success, "escrow open failed: {:?}", result.error);
    result.escrow_address.expect("escrow address present")
}

async fn status_of(stack: &TestStack, id: &str) -> EscrowStatus {
    stack
        .processor
        .escrows()
        .snapshot(id)
        .await
        .expect("escrow exists")
        .status
}

#[tokio::test]
async fn release_pays_seller_and_is_final() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 5 * LAMPORTS_PER_UNIT);
    stack.ledger.fund(SELLER, 0);

    let amount = 5 * LAMPORTS_PER_UNIT / 2;
    let id = open_escrow(&stack, amount, Some(86_400)).await;

    // Funds left the buyer and sit in the escrow account.
    assert_eq!(stack.ledger.balance(BUYER), 5 * LAMPORTS_PER_UNIT - amount);
    assert_eq!(stack.ledger.balance(&id), amount);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Active);

    let release = stack.processor.release_escrow(&id).await;
    assert!(release.success, "release failed: {:?}", release.error);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Released);
    assert_eq!(stack.ledger.balance(SELLER), amount);
    assert_eq!(stack.ledger.balance(&id), 0);

    // Released is terminal; a refund afterwards must not move funds.
    let refund = stack.processor.refund_escrow(&id).await;
    assert!(!refund.success);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Released);
    assert_eq!(stack.ledger.balance(SELLER), amount);
}

#[tokio::test]
async fn refund_returns_funds_to_buyer() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);

    let amount = LAMPORTS_PER_UNIT;
    let id = open_escrow(&stack, amount, None).await;
    assert_eq!(stack.ledger.balance(BUYER), LAMPORTS_PER_UNIT);

    let refund = stack.processor.refund_escrow(&id).await;
    assert!(refund.success, "refund failed: {:?}", refund.error);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Refunded);
    assert_eq!(stack.ledger.balance(BUYER), 2 * LAMPORTS_PER_UNIT);
    assert_eq!(stack.ledger.balance(&id), 0);
}

#[tokio::test]
async fn concurrent_release_and_refund_settle_exactly_once() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 4 * LAMPORTS_PER_UNIT);
    stack.ledger.fund(SELLER, 0);

    let amount = LAMPORTS_PER_UNIT;
    let id = open_escrow(&stack, amount, Some(3_600)).await;

    let (release, refund) = tokio::join!(
        stack.processor.release_escrow(&id),
        stack.processor.refund_escrow(&id),
    );

    assert_ne!(
        release.success, refund.success,
        "exactly one settlement must win: release={:?} refund={:?}",
        release.error, refund.error
    );

    let status = status_of(&stack, &id).await;
    if release.success {
        assert_eq!(status, EscrowStatus::Released);
        assert_eq!(stack.ledger.balance(SELLER), amount);
    } else {
        assert_eq!(status, EscrowStatus::Refunded);
        assert_eq!(stack.ledger.balance(BUYER), 4 * LAMPORTS_PER_UNIT);
    }
    // Funds moved out of escrow exactly once either way.
    assert_eq!(stack.ledger.balance(&id), 0);
}

#[tokio::test]
async fn disputed_escrow_only_settles_through_resolution() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);
    stack.ledger.fund(SELLER, 0);

    let amount = LAMPORTS_PER_UNIT;
    let id = open_escrow(&stack, amount, Some(3_600)).await;

    stack
        .processor
        .dispute_escrow(&id, "item not received")
        .await
        .unwrap();
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Disputed);

    // The plain release path requires an active escrow.
    let release = stack.processor.release_escrow(&id).await;
    assert!(!release.success);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Disputed);

    let resolved = stack
        .processor
        .resolve_dispute(&id, Settlement::Release)
        .await;
    assert!(resolved.success, "resolution failed: {:?}", resolved.error);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Released);
    assert_eq!(stack.ledger.balance(SELLER), amount);
}

#[tokio::test]
async fn expiry_sweep_marks_once_and_refunds() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);

    let amount = LAMPORTS_PER_UNIT;
    let id = open_escrow(&stack, amount, Some(0)).await;
    assert_eq!(stack.ledger.balance(BUYER), LAMPORTS_PER_UNIT);

    let swept = stack.processor.expire_due().await;
    assert_eq!(swept, 1);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Expired);
    // Default policy returns held funds to the buyer.
    assert_eq!(stack.ledger.balance(BUYER), 2 * LAMPORTS_PER_UNIT);
    assert_eq!(stack.ledger.balance(&id), 0);

    // A second sweep finds nothing; the mark happens exactly once.
    assert_eq!(stack.processor.expire_due().await, 0);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Expired);
    assert_eq!(stack.ledger.balance(BUYER), 2 * LAMPORTS_PER_UNIT);
}

#[tokio::test]
async fn disputed_escrow_is_exempt_from_expiry() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);

    let id = open_escrow(&stack, LAMPORTS_PER_UNIT, Some(0)).await;
    stack
        .processor
        .dispute_escrow(&id, "carrier lost the package")
        .await
        .unwrap();

    assert_eq!(stack.processor.expire_due().await, 0);
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Disputed);
    assert_eq!(stack.ledger.balance(&id), LAMPORTS_PER_UNIT);
}

#[tokio::test]
async fn funding_landing_after_deadline_is_reconciled() {
    let stack = start_stack(|config| {
        config.transaction.confirm_timeout_secs = 1;
    })
    .await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);
    stack.ledger.fund(SELLER, 0);
    // Funding transfer stays unconfirmed past the deadline.
    stack.ledger.set_on_submit_status("processed");

    let amount = LAMPORTS_PER_UNIT;
    let result = stack
        .processor
        .process_payment(&escrow_request(amount, Some(3_600)))
        .await;
    assert!(!result.success);
    let signature = result.signature.expect("funding was submitted");
    let address = result.escrow_address.expect("escrow address derived");

    // No record yet: the funds are not known to be held.
    assert!(stack.processor.escrows().snapshot(&address).await.is_none());

    // The transfer lands later; reconciliation materializes the escrow so
    // release and refund stay possible.
    stack.ledger.set_status(&signature, "confirmed", None);
    assert_eq!(stack.processor.reconcile_pending().await, 1);
    assert_eq!(status_of(&stack, &address).await, EscrowStatus::Active);
    // Reconciliation is one-shot per funding.
    assert_eq!(stack.processor.reconcile_pending().await, 0);

    stack.ledger.set_on_submit_status("confirmed");
    let release = stack.processor.release_escrow(&address).await;
    assert!(release.success, "release failed: {:?}", release.error);
    assert_eq!(stack.ledger.balance(SELLER), amount);
}

#[tokio::test]
async fn failed_settlement_submission_keeps_escrow_active() {
    let stack = start_stack(|_| {}).await;
    stack.ledger.fund(BUYER, 2 * LAMPORTS_PER_UNIT);

    let id = open_escrow(&stack, LAMPORTS_PER_UNIT, None).await;

    // Drain the escrow account behind the processor's back so the
    // settlement submission is rejected by the node.
    stack.ledger.fund(&id, 0);

    let release = stack.processor.release_escrow(&id).await;
    assert!(!release.success);
    assert_eq!(release.failed_stage, Some(PaymentStage::Submission));
    assert_eq!(status_of(&stack, &id).await, EscrowStatus::Active);
}
